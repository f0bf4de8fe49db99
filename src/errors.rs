use crate::transaction::RenameKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in `seqren`.
///
/// Only `NoMatch` is recoverable: the planner collects it as a skip. Every other
/// variant aborts the current phase.
#[derive(Error, Debug)]
pub enum Error {
    /// An error related to file system I/O outside of a planned rename.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A mask that cannot be compiled.
    #[error("Invalid mask {mask:?}: {problem}")]
    InvalidMask { mask: String, problem: MaskProblem },

    /// A filename that does not fit the extractor mask.
    #[error("Could not extract a sequence number from {file_name:?} using mask {mask:?}")]
    NoMatch { file_name: String, mask: String },

    /// Two or more files would receive the same new name.
    #[error("Name collision, nothing was renamed:\n{}", format_collisions(.collisions))]
    Collision { collisions: Vec<Collision> },

    /// A single rename failed. Any renames already performed were reversed.
    #[error("Could not rename {kind} {} -> {}: {source}", .from.display(), .to.display())]
    Rename {
        kind: RenameKind,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Reversing renames failed; the listed entries are still in their renamed state.
    #[error("{}", format_undo_failure(.unreversed, .trigger))]
    UndoFailure {
        unreversed: Vec<Unreversed>,
        trigger: Option<Box<Error>>,
    },

    /// An error that occurred while parsing a YAML configuration file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A general configuration-related error.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from the `ignore` crate while listing the target folder.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// An error related to JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error related to CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a mask string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskProblem {
    /// The mask contains no placeholder.
    MissingPlaceholder { placeholder: String },
    /// The mask contains the placeholder more than once.
    TooManyPlaceholders { placeholder: String, count: usize },
    /// An output mask would place files outside the target folder.
    PathSeparator,
}

impl fmt::Display for MaskProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskProblem::MissingPlaceholder { placeholder } => {
                write!(f, "expected exactly one {placeholder}, found none")
            }
            MaskProblem::TooManyPlaceholders { placeholder, count } => {
                write!(f, "expected exactly one {placeholder}, found {count}")
            }
            MaskProblem::PathSeparator => write!(f, "output names cannot contain a path separator"),
        }
    }
}

/// One proposed name claimed by several originals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub proposed: PathBuf,
    pub originals: Vec<PathBuf>,
}

/// An applied rename that could not be reversed.
#[derive(Debug)]
pub struct Unreversed {
    pub kind: RenameKind,
    /// The path the entry was renamed from, and should have been restored to.
    pub from: PathBuf,
    /// The path the entry currently lives at.
    pub to: PathBuf,
    pub source: std::io::Error,
}

fn format_collisions(collisions: &[Collision]) -> String {
    collisions
        .iter()
        .map(|c| {
            let originals: Vec<String> = c
                .originals
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            format!("  {} <- {}", c.proposed.display(), originals.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_undo_failure(unreversed: &[Unreversed], trigger: &Option<Box<Error>>) -> String {
    let mut out = String::new();
    if let Some(trigger) = trigger {
        out.push_str(&format!("{trigger}\n"));
    }
    out.push_str(&format!(
        "Undo failed for {} entr{}; restore manually:",
        unreversed.len(),
        if unreversed.len() == 1 { "y" } else { "ies" }
    ));
    for u in unreversed {
        out.push_str(&format!(
            "\n  {} {} -> {}: {}",
            u.kind,
            u.to.display(),
            u.from.display(),
            u.source
        ));
    }
    out
}

/// A convenient type alias for `Result<T, seqren::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}
