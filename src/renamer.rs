use crate::config::{Config, ConfigLoader};
use crate::errors::{Error, Result};
use crate::mask::{Extractor, Generator, guess_output_mask, infer_mask};
use crate::planner::{MatchScope, Padding, Plan, Planner, list_files, split_extension};
use crate::preview::{PreviewFormat, PreviewFormatter};
use crate::prompt::Prompt;
use crate::transaction::{self, FolderRename, RenameTransaction};
use ignore::WalkBuilder;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything a rename run needs from the command line.
#[derive(Debug, Clone, Default)]
pub struct RenameRequest {
    /// The target folder with `direct`, otherwise its parent.
    pub path: PathBuf,
    pub direct: bool,
    /// Explicit extractor mask. When absent it is inferred or asked for.
    pub extract: Option<String>,
    /// Infer the extractor without asking.
    pub auto: bool,
    pub output: Option<String>,
    pub folder_name: Option<String>,
    /// Confirm without asking; also suppresses every other prompt.
    pub yes: bool,
    pub dry_run: bool,
    pub stem: bool,
    pub hidden: bool,
    pub pad: Option<Padding>,
    pub format: Option<PreviewFormat>,
}

impl RenameRequest {
    /// Layers the command-line flags over the loaded configuration.
    pub fn settings(&self, mut config: Config) -> Config {
        if self.stem {
            config.scope = MatchScope::Stem;
        }
        config.include_hidden |= self.hidden;
        if let Some(pad) = self.pad {
            config.padding = pad;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        config
    }
}

/// How a session ended.
#[derive(Debug)]
pub enum Outcome {
    /// The folder had no files, or no file needed a new name.
    NothingToRename,
    /// `dry_run` was set; the plan was shown and nothing was touched.
    DryRun(Plan),
    /// The renames were kept.
    Committed { files: usize, folder: bool },
    /// The user declined and every rename was reversed.
    Reverted { files: usize, folder: bool },
}

/// Runs one interactive rename session.
///
/// The steps are: pick the folder, list its files, optionally rename the folder,
/// settle both masks, plan, preview, apply, then confirm or undo. Nothing is
/// renamed before the plan has been built and shown, and a declined preview
/// restores every name including the folder's.
///
/// Listings, plans and reports go to `out`; questions go to the prompt's writer.
pub fn run_session<R: BufRead, W: Write, O: Write>(
    request: &RenameRequest,
    config: &Config,
    prompt: &mut Prompt<R, W>,
    out: &mut O,
) -> Result<Outcome> {
    let formatter = PreviewFormatter::new(config.format, config.preview_limit);
    let text = config.format == PreviewFormat::Text;

    let target = resolve_target(&request.path, request.direct, prompt)?;
    let files = list_files(&target, config.include_hidden)?;
    if files.is_empty() {
        if text {
            writeln!(out, "No files found in {}.", target.display())?;
        }
        return Ok(Outcome::NothingToRename);
    }
    if text {
        formatter.write_listing(out, &target, &files)?;
    }

    let folder = folder_rename(request, &target, prompt)?;
    let extractor = extractor(request, config, &files, prompt)?;
    let folder_label = match &folder {
        Some(f) => display_name(&f.to),
        None => display_name(&target),
    };
    let extension = match config.scope {
        MatchScope::FileName => mask_extension(extractor.mask().suffix()),
        MatchScope::Stem => None,
    };
    let generator = generator(request, config, &folder_label, extension, prompt)?;

    let plan = Planner::new(&extractor, &generator)
        .scope(config.scope)
        .padding(config.padding)
        .plan_files(&target, &files)?;
    formatter.write_plan(out, &plan)?;

    if plan.is_empty() && folder.is_none() {
        if text {
            writeln!(out, "Nothing to rename.")?;
        }
        return Ok(Outcome::NothingToRename);
    }
    if request.dry_run {
        if text {
            writeln!(out, "Dry run: nothing was renamed.")?;
        }
        return Ok(Outcome::DryRun(plan));
    }

    let tx = transaction::apply_with_folder(&plan.entries, folder.as_ref())?;
    let files = tx.file_count();
    let folder = tx.folder().is_some();

    // Any failure between apply and the answer counts as a decline.
    let decision = formatter.write_transaction(out, &tx).and_then(|()| {
        if request.yes {
            Ok(true)
        } else {
            prompt.confirm("Confirm changes (n to undo changes)", true)
        }
    });

    match decision {
        Ok(true) => {
            tx.commit();
            if text {
                writeln!(out, "Completed!")?;
            }
            Ok(Outcome::Committed { files, folder })
        }
        Ok(false) => {
            warn!(files, folder, "changes declined, undoing");
            tx.undo()?;
            if text {
                writeln!(
                    out,
                    "Files and folders have been renamed back to their original names."
                )?;
            }
            Ok(Outcome::Reverted { files, folder })
        }
        Err(e) => {
            warn!(%e, "no confirmation, undoing");
            Err(undo_after(tx, e))
        }
    }
}

/// Undoes `tx` after `cause` interrupted the session, keeping `cause` as the
/// trigger if the undo itself fails.
fn undo_after(tx: RenameTransaction, cause: Error) -> Error {
    match tx.undo() {
        Ok(()) => cause,
        Err(Error::UndoFailure { unreversed, .. }) => Error::UndoFailure {
            unreversed,
            trigger: Some(Box::new(cause)),
        },
        Err(other) => other,
    }
}

/// Loads the configuration for a request.
///
/// The local `.seqren.yaml` is looked up in the PATH given on the command line:
/// the folder itself with `--direct`, otherwise the parent the folder is picked from.
pub fn load_settings(request: &RenameRequest, config_path: Option<&Path>) -> Result<Config> {
    Ok(request.settings(ConfigLoader::resolve(config_path, &request.path)?))
}

/// A prompt on stdin whose questions go to stdout for text previews and to
/// stderr otherwise, so structured output on stdout stays parseable.
fn session_prompt(format: PreviewFormat) -> Prompt<io::StdinLock<'static>, Box<dyn Write>> {
    let output: Box<dyn Write> = match format {
        PreviewFormat::Text => Box::new(io::stdout()),
        PreviewFormat::Json | PreviewFormat::Csv => Box::new(io::stderr()),
    };
    Prompt::new(io::stdin().lock(), output)
}

/// The main entry point for the `rename` command.
pub fn run_rename(request: RenameRequest, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_settings(&request, config_path.as_deref())?;
    let mut prompt = session_prompt(config.format);
    let outcome = run_session(&request, &config, &mut prompt, &mut io::stdout())?;
    info!(?outcome, "session finished");
    Ok(())
}

/// The main entry point for the `guess` command.
///
/// Prints the extractor mask inferred from the folder's files and the default
/// output mask for the folder.
pub fn run_guess(request: RenameRequest, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_settings(&request, config_path.as_deref())?;
    let mut prompt = Prompt::stdio();
    let target = resolve_target(&request.path, request.direct, &mut prompt)?;
    let files = list_files(&target, config.include_hidden)?;

    let out = prompt.output();
    match guess_extractor(&files, config.scope, &config.placeholder) {
        Some(mask) => writeln!(out, "Extractor: {mask}")?,
        None => writeln!(out, "Extractor: <none, no file name contains digits>")?,
    }
    writeln!(
        out,
        "Output:    {}",
        guess_output_mask(&display_name(&target), &config.placeholder)
    )?;
    Ok(())
}

/// The inferred extractor mask for the first file whose name contains digits.
pub fn guess_extractor(files: &[PathBuf], scope: MatchScope, placeholder: &str) -> Option<String> {
    inference_sample(files, scope, placeholder).and_then(|s| infer_mask(s, placeholder))
}

/// The masked part of the first file name that auto-inference can work with.
fn inference_sample<'f>(files: &'f [PathBuf], scope: MatchScope, placeholder: &str) -> Option<&'f str> {
    files
        .iter()
        .filter_map(|f| f.file_name().and_then(|n| n.to_str()))
        .map(|name| subject(name, scope))
        .find(|s| infer_mask(s, placeholder).is_some())
}

fn subject(name: &str, scope: MatchScope) -> &str {
    match scope {
        MatchScope::FileName => name,
        MatchScope::Stem => split_extension(name).0,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn resolve_target<R: BufRead, W: Write>(
    path: &Path,
    direct: bool,
    prompt: &mut Prompt<R, W>,
) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(format!("{} is not a directory", path.display()).into());
    }
    let path = path.canonicalize()?;
    if direct {
        return Ok(path);
    }

    let folders = list_folders(&path)?;
    let names: Vec<String> = folders.iter().map(|f| display_name(f)).collect();
    if names.is_empty() {
        return Err(format!(
            "{} has no folders to choose from; use --direct to rename inside it",
            path.display()
        )
        .into());
    }
    let choice = prompt.select("Select folder to rename", &names)?;
    Ok(folders[choice].clone())
}

fn list_folders(parent: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(parent)
        .standard_filters(false)
        .max_depth(Some(1))
        .build();
    let mut folders = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.depth() == 1 && entry.path().is_dir() {
            folders.push(entry.into_path());
        }
    }
    folders.sort();
    Ok(folders)
}

fn folder_rename<R: BufRead, W: Write>(
    request: &RenameRequest,
    target: &Path,
    prompt: &mut Prompt<R, W>,
) -> Result<Option<FolderRename>> {
    let name = match &request.folder_name {
        Some(name) => name.clone(),
        None if request.yes => String::new(),
        None => prompt.text("[Optional] Rename target folder", None)?,
    };
    let name = name.trim();
    if name.is_empty() || name == display_name(target) {
        return Ok(None);
    }
    FolderRename::new(target, name).map(Some)
}

fn extractor<R: BufRead, W: Write>(
    request: &RenameRequest,
    config: &Config,
    files: &[PathBuf],
    prompt: &mut Prompt<R, W>,
) -> Result<Extractor> {
    if let Some(mask) = &request.extract {
        return Extractor::compile(mask, &config.placeholder);
    }

    if request.auto || request.yes {
        let sample = match inference_sample(files, config.scope, &config.placeholder) {
            Some(sample) => sample.to_string(),
            None => files.first().map(|f| display_name(f)).unwrap_or_default(),
        };
        let extractor = Extractor::infer(&sample, &config.placeholder)?;
        info!(mask = extractor.mask().as_str(), "inferred extractor");
        return Ok(extractor);
    }

    let guessed = guess_extractor(files, config.scope, &config.placeholder);
    writeln!(
        prompt.output(),
        "Enter the original name format, with the sequence number replaced by {}.",
        config.placeholder
    )?;
    loop {
        let mask = prompt.text("Original name format", guessed.as_deref())?;
        match Extractor::compile(&mask, &config.placeholder) {
            Ok(extractor) => return Ok(extractor),
            Err(e @ Error::InvalidMask { .. }) => writeln!(prompt.output(), "{e}")?,
            Err(e) => return Err(e),
        }
    }
}

/// The trailing `.ext` of an extractor suffix, carried into the default output mask.
fn mask_extension(suffix: &str) -> Option<&str> {
    let dot = suffix.rfind('.')?;
    let ext = &suffix[dot..];
    (ext.len() > 1 && !ext.contains(char::is_whitespace)).then_some(ext)
}

fn generator<R: BufRead, W: Write>(
    request: &RenameRequest,
    config: &Config,
    folder_name: &str,
    extension: Option<&str>,
    prompt: &mut Prompt<R, W>,
) -> Result<Generator> {
    if let Some(mask) = &request.output {
        return Generator::compile(mask, &config.placeholder);
    }

    let mut default = guess_output_mask(folder_name, &config.placeholder);
    default.push_str(extension.unwrap_or_default());
    if request.yes {
        return Generator::compile(&default, &config.placeholder);
    }

    writeln!(
        prompt.output(),
        "Enter the output name format, with {} as the sequence number.",
        config.placeholder
    )?;
    loop {
        let mask = prompt.text("Output name format", Some(&default))?;
        match Generator::compile(&mask, &config.placeholder) {
            Ok(generator) => return Ok(generator),
            Err(e @ Error::InvalidMask { .. }) => writeln!(prompt.output(), "{e}")?,
            Err(e) => return Err(e),
        }
    }
}
