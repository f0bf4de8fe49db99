use crate::errors::{Error, Result, Unreversed};
use crate::planner::RenamePlanEntry;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// What a transaction entry renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameKind {
    File,
    Folder,
}

impl fmt::Display for RenameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameKind::File => f.write_str("file"),
            RenameKind::Folder => f.write_str("folder"),
        }
    }
}

/// A rename of the target folder itself, performed before the file renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl FolderRename {
    /// Renames `folder` to `new_name` within the same parent directory.
    pub fn new(folder: &Path, new_name: &str) -> Result<Self> {
        if new_name.is_empty()
            || new_name == "."
            || new_name == ".."
            || new_name.chars().any(std::path::is_separator)
        {
            return Err(format!("Invalid folder name {new_name:?}").into());
        }
        Ok(Self {
            from: folder.to_path_buf(),
            to: folder.with_file_name(new_name),
        })
    }
}

/// One rename that has actually been performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRename {
    pub kind: RenameKind,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// The ordered record of renames performed by [`apply`].
///
/// Dropping a transaction leaves the renames in place. Call [`RenameTransaction::undo`]
/// to reverse them, or [`RenameTransaction::commit`] to make the intent explicit.
#[derive(Debug, Default)]
#[must_use = "a transaction must be committed or undone"]
pub struct RenameTransaction {
    applied: Vec<AppliedRename>,
}

impl RenameTransaction {
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppliedRename> {
        self.applied.iter()
    }

    /// Number of file entries, not counting a folder rename.
    pub fn file_count(&self) -> usize {
        self.applied
            .iter()
            .filter(|r| r.kind == RenameKind::File)
            .count()
    }

    /// The folder rename, if this transaction carries one.
    pub fn folder(&self) -> Option<&AppliedRename> {
        self.applied.iter().find(|r| r.kind == RenameKind::Folder)
    }

    /// Accepts the renames.
    pub fn commit(self) {
        info!(renames = self.applied.len(), "transaction committed");
    }

    /// Reverses every rename in reverse order. See [`undo`].
    pub fn undo(self) -> Result<()> {
        undo(self)
    }
}

/// Renames every plan entry from its original to its proposed path, in order.
///
/// If any rename fails, the renames already performed are reversed in reverse
/// order and the failing [`Error::Rename`] is returned. The directory is then
/// exactly as it was before the call. If that reversal itself fails, the result
/// is [`Error::UndoFailure`] carrying the original error as its trigger.
pub fn apply(entries: &[RenamePlanEntry]) -> Result<RenameTransaction> {
    apply_with_folder(entries, None)
}

/// Like [`apply`], but first renames the folder the entries live in.
///
/// The folder rename is the first entry of the transaction, so it is undone
/// last. Entry paths under `folder.from` are rebased onto `folder.to` before
/// the files are renamed.
pub fn apply_with_folder(
    entries: &[RenamePlanEntry],
    folder: Option<&FolderRename>,
) -> Result<RenameTransaction> {
    let mut tx = RenameTransaction::default();

    if let Some(folder) = folder {
        tx.step(RenameKind::Folder, &folder.from, &folder.to)?;
    }

    for entry in entries {
        let (from, to) = match folder {
            Some(folder) => (
                rebase(&entry.original_path, folder),
                rebase(&entry.proposed_path, folder),
            ),
            None => (entry.original_path.clone(), entry.proposed_path.clone()),
        };

        if let Err(e) = tx.step(RenameKind::File, &from, &to) {
            error!(%e, done = tx.len(), "rename failed, reverting");
            let unreversed = unwind(&tx.applied);
            if unreversed.is_empty() {
                return Err(e);
            }
            return Err(Error::UndoFailure {
                unreversed,
                trigger: Some(Box::new(e)),
            });
        }
    }

    info!(
        files = tx.file_count(),
        folder = tx.folder().is_some(),
        "renames applied"
    );
    Ok(tx)
}

/// Reverses every rename of `tx`, newest first.
///
/// A reversal that fails does not stop the remaining ones. All failures are
/// collected into [`Error::UndoFailure`] so they can be fixed by hand.
pub fn undo(tx: RenameTransaction) -> Result<()> {
    let unreversed = unwind(&tx.applied);
    if unreversed.is_empty() {
        info!(renames = tx.applied.len(), "transaction undone");
        Ok(())
    } else {
        Err(Error::UndoFailure {
            unreversed,
            trigger: None,
        })
    }
}

impl RenameTransaction {
    fn step(&mut self, kind: RenameKind, from: &Path, to: &Path) -> Result<()> {
        rename_exclusive(from, to).map_err(|source| Error::Rename {
            kind,
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;
        debug!(%kind, from = %from.display(), to = %to.display(), "renamed");
        self.applied.push(AppliedRename {
            kind,
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }
}

/// Reverses `applied` newest first, returning the entries left in place.
///
/// The folder is only moved back once every file inside it has been restored,
/// so the paths reported for stuck files stay valid.
fn unwind(applied: &[AppliedRename]) -> Vec<Unreversed> {
    let mut unreversed: Vec<Unreversed> = Vec::new();
    for rename in applied.iter().rev() {
        if rename.kind == RenameKind::Folder && !unreversed.is_empty() {
            warn!(
                path = %rename.to.display(),
                stuck = unreversed.len(),
                "leaving folder renamed, files inside it were not restored"
            );
            unreversed.push(Unreversed {
                kind: rename.kind,
                from: rename.from.clone(),
                to: rename.to.clone(),
                source: io::Error::other("files inside it could not be restored"),
            });
            continue;
        }
        match rename_exclusive(&rename.to, &rename.from) {
            Ok(()) => debug!(
                kind = %rename.kind,
                from = %rename.to.display(),
                to = %rename.from.display(),
                "reverted"
            ),
            Err(source) => {
                warn!(
                    kind = %rename.kind,
                    path = %rename.to.display(),
                    %source,
                    "could not revert"
                );
                unreversed.push(Unreversed {
                    kind: rename.kind,
                    from: rename.from.clone(),
                    to: rename.to.clone(),
                    source,
                });
            }
        }
    }
    unreversed
}

/// `fs::rename` that refuses to replace an existing destination.
fn rename_exclusive(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(to).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination already exists",
        ));
    }
    fs::rename(from, to)
}

fn rebase(path: &Path, folder: &FolderRename) -> PathBuf {
    match path.strip_prefix(&folder.from) {
        Ok(rest) => folder.to.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
