//! Line-based prompts on top of any reader/writer pair, so a whole interactive
//! session can be scripted in tests.

use crate::errors::{Error, Result};
use std::io::{self, BufRead, Write};

pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<io::StdinLock<'static>, io::Stdout> {
    /// A prompt reading from stdin and writing to stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// The writer prompts are printed to; the session writes its previews here too.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Asks for free text. An empty answer yields `default`.
    ///
    /// End of input is an error, so a closed stdin cannot loop on an invalid default.
    pub fn text(&mut self, message: &str, default: Option<&str>) -> Result<String> {
        match default {
            Some(d) if !d.is_empty() => write!(self.output, "{message} [{d}]: ")?,
            _ => write!(self.output, "{message}: ")?,
        }
        let answer = self.read_line()?.ok_or_else(|| closed(message))?;
        if answer.trim().is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }

    /// Asks a yes/no question, repeating until the answer is recognised.
    ///
    /// End of input counts as "no", whatever the default.
    pub fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            write!(self.output, "{message} [{hint}]: ")?;
            let Some(answer) = self.read_line()? else {
                writeln!(self.output)?;
                return Ok(false);
            };
            match answer.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    /// Asks the user to pick one of `choices`, by number or by exact name.
    pub fn select(&mut self, message: &str, choices: &[String]) -> Result<usize> {
        if choices.is_empty() {
            return Err(format!("{message}: nothing to choose from").into());
        }
        writeln!(self.output, "{message}")?;
        for (i, choice) in choices.iter().enumerate() {
            writeln!(self.output, "  {}) {choice}", i + 1)?;
        }
        loop {
            write!(self.output, "Choice [1-{}]: ", choices.len())?;
            let Some(answer) = self.read_line()? else {
                return Err(closed(message));
            };
            let answer = answer.trim();
            if let Ok(n) = answer.parse::<usize>() {
                if (1..=choices.len()).contains(&n) {
                    return Ok(n - 1);
                }
            }
            if let Some(i) = choices.iter().position(|c| c == answer) {
                return Ok(i);
            }
            writeln!(self.output, "Invalid choice {answer:?}.")?;
        }
    }
}

fn closed(message: &str) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("input closed at prompt {message:?}"),
    ))
}
