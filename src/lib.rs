//! `seqren` renames a folder of numbered files while keeping their sequence numbers.
//!
//! It provides the core logic for the `seqren` command-line tool but can also be used
//! as a standalone library. The main components are:
//!
//! - `mask`: compiles masks such as `"image%s.img"` into an `Extractor` and a
//!   `Generator`, and infers an extractor from a sample file name.
//! - `planner`: turns a folder and a pair of masks into an ordered `Plan`,
//!   skipping files that do not match and rejecting name collisions.
//! - `transaction`: applies a plan as a `RenameTransaction` that is fully
//!   reverted on failure and can be undone when the preview is declined.
//! - `renamer`: the interactive session that ties these together.
//! - `config`: loads defaults from YAML files.
//!
//! Everything runs on a single thread; renames are applied one at a time so the
//! undo log can always be unwound in reverse.

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod mask;
pub mod planner;
pub mod preview;
pub mod prompt;
pub mod renamer;
pub mod transaction;

// Re-export main types for easier access by library users.
pub use errors::{Error, Result};
pub use mask::{Extractor, Generator};
pub use planner::{Plan, Planner, RenamePlanEntry, plan};
pub use transaction::{RenameTransaction, apply, apply_with_folder, undo};
