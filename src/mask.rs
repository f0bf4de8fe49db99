//! Mask compilation: turning a template such as `"image%s.img"` into an
//! [`Extractor`] that pulls the sequence number out of a filename, and a
//! [`Generator`] that writes a sequence number back into a new filename.
//!
//! Masks are matched literally. The only special text in a mask is the
//! placeholder, which must appear exactly once.

use crate::errors::{Error, MaskProblem, Result};
use regex::Regex;
use std::sync::LazyLock;

/// The placeholder token used when no other is configured.
pub const DEFAULT_PLACEHOLDER: &str = "%s";

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run pattern is valid"));

/// A mask split around its single placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    source: String,
    prefix: String,
    suffix: String,
}

impl Mask {
    /// Parses `mask`, which must contain `placeholder` exactly once.
    pub fn parse(mask: &str, placeholder: &str) -> Result<Self> {
        if placeholder.is_empty() {
            return Err("placeholder token cannot be empty".into());
        }

        let count = mask.matches(placeholder).count();
        let problem = match count {
            0 => Some(MaskProblem::MissingPlaceholder {
                placeholder: placeholder.to_string(),
            }),
            1 => None,
            n => Some(MaskProblem::TooManyPlaceholders {
                placeholder: placeholder.to_string(),
                count: n,
            }),
        };
        if let Some(problem) = problem {
            return Err(Error::InvalidMask {
                mask: mask.to_string(),
                problem,
            });
        }

        // Exactly one occurrence, so the split cannot fail.
        let (prefix, suffix) = mask.split_once(placeholder).unwrap_or((mask, ""));
        Ok(Self {
            source: mask.to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// The mask text as given.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

/// Pulls the sequence-number token out of a filename.
///
/// An extractor is either compiled from an explicit mask or inferred from a
/// sample filename. Both produce the same prefix/suffix matcher, so callers
/// never need to know which one they hold.
#[derive(Debug, Clone)]
pub struct Extractor {
    mask: Mask,
    inferred: bool,
}

impl Extractor {
    /// Compiles an explicit extractor mask.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMask`] when the mask does not contain exactly one
    /// `placeholder`.
    pub fn compile(mask: &str, placeholder: &str) -> Result<Self> {
        Ok(Self {
            mask: Mask::parse(mask, placeholder)?,
            inferred: false,
        })
    }

    /// Builds an extractor from a sample filename, treating its longest run of
    /// ASCII digits as the sequence number. When several runs share the longest
    /// length, the leftmost one wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMatch`] when `sample` contains no digits.
    pub fn infer(sample: &str, placeholder: &str) -> Result<Self> {
        let mask = infer_mask(sample, placeholder).ok_or_else(|| Error::NoMatch {
            file_name: sample.to_string(),
            mask: "<auto>".to_string(),
        })?;
        let mut extractor = Self::compile(&mask, placeholder)?;
        extractor.inferred = true;
        Ok(extractor)
    }

    /// Returns the text between the mask's literal prefix and suffix.
    ///
    /// The match is anchored at both ends and the token must be non-empty.
    pub fn extract<'a>(&self, file_name: &'a str) -> Result<&'a str> {
        file_name
            .strip_prefix(self.mask.prefix())
            .and_then(|rest| rest.strip_suffix(self.mask.suffix()))
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::NoMatch {
                file_name: file_name.to_string(),
                mask: self.mask.as_str().to_string(),
            })
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// `true` if this extractor was built by [`Extractor::infer`].
    pub fn is_inferred(&self) -> bool {
        self.inferred
    }
}

/// Writes a token into an output mask.
#[derive(Debug, Clone)]
pub struct Generator {
    mask: Mask,
}

impl Generator {
    /// Compiles an output mask.
    ///
    /// Besides the placeholder count check shared with [`Extractor::compile`],
    /// output masks may not contain a path separator.
    pub fn compile(mask: &str, placeholder: &str) -> Result<Self> {
        let mask = Mask::parse(mask, placeholder)?;
        if mask.as_str().chars().any(std::path::is_separator) {
            return Err(Error::InvalidMask {
                mask: mask.as_str().to_string(),
                problem: MaskProblem::PathSeparator,
            });
        }
        Ok(Self { mask })
    }

    pub fn generate(&self, token: &str) -> String {
        let mut name =
            String::with_capacity(self.mask.prefix().len() + token.len() + self.mask.suffix().len());
        name.push_str(self.mask.prefix());
        name.push_str(token);
        name.push_str(self.mask.suffix());
        name
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }
}

/// Builds the mask text [`Extractor::infer`] would use for `sample`, or `None`
/// when the sample has no digits.
pub fn infer_mask(sample: &str, placeholder: &str) -> Option<String> {
    // max_by_key keeps the last maximum, so compare on (len, Reverse(start)).
    let run = DIGIT_RUN
        .find_iter(sample)
        .max_by_key(|m| (m.len(), std::cmp::Reverse(m.start())))?;
    Some(format!(
        "{}{}{}",
        &sample[..run.start()],
        placeholder,
        &sample[run.end()..]
    ))
}

/// The default output mask offered for a folder: `"<folder> - %s"`.
pub fn guess_output_mask(folder_name: &str, placeholder: &str) -> String {
    format!("{folder_name} - {placeholder}")
}
