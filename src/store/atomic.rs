//! Crash-safe file replacement
//!
//! The new content is staged in a temporary file created next to the target
//! so that the final `rename` never crosses a filesystem boundary. Until that
//! rename the target is never opened for writing, so an interrupted save
//! always leaves either the old or the new document in place, never a torn
//! one.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

/// Progress of a single save attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitStage {
    Received,
    Validated,
    TempWritten,
    Synced,
    Renamed,
}

impl fmt::Display for CommitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitStage::Received => "received",
            CommitStage::Validated => "validated",
            CommitStage::TempWritten => "temp-written",
            CommitStage::Synced => "synced",
            CommitStage::Renamed => "renamed",
        };
        f.write_str(name)
    }
}

/// Watches a save as it moves through [`CommitStage`]s
///
/// Called once per stage reached before the rename. Returning an error
/// aborts the save at that point exactly as an I/O failure there would:
/// the staged file is removed and the target is left untouched.
pub trait CommitObserver {
    fn stage_reached(&mut self, stage: CommitStage) -> io::Result<()>;
}

/// The no-op observer used by plain commits
impl CommitObserver for () {
    fn stage_reached(&mut self, _stage: CommitStage) -> io::Result<()> {
        Ok(())
    }
}

impl<F> CommitObserver for F
where
    F: FnMut(CommitStage) -> io::Result<()>,
{
    fn stage_reached(&mut self, stage: CommitStage) -> io::Result<()> {
        self(stage)
    }
}

/// Directory holding `target`, `.` for a bare file name
fn parent_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

fn temp_prefix(target: &Path) -> String {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hooks".to_string());
    format!(".{name}.")
}

/// Replace `target` with `content` atomically
///
/// Reports `TempWritten` and `Synced` to `observer`; the caller is expected
/// to have reported the earlier stages itself.
pub(crate) fn replace_file(
    target: &Path,
    content: &[u8],
    observer: &mut dyn CommitObserver,
) -> AppResult<()> {
    let dir = parent_dir(target);
    let fail = |stage: CommitStage, operation: &str| {
        let operation = operation.to_string();
        move |e: io::Error| AppError::commit(target, stage, operation, e)
    };

    let mut staged: NamedTempFile = Builder::new()
        .prefix(&temp_prefix(target))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(fail(CommitStage::Validated, "create temporary file"))?;
    debug!(temp = %staged.path().display(), "Staging hook configuration");

    staged
        .write_all(content)
        .map_err(fail(CommitStage::Validated, "write temporary file"))?;
    observer
        .stage_reached(CommitStage::TempWritten)
        .map_err(fail(CommitStage::TempWritten, "continue after writing"))?;

    copy_existing_permissions(target, staged.as_file())
        .map_err(fail(CommitStage::TempWritten, "copy permissions of existing file"))?;

    staged
        .as_file()
        .sync_all()
        .map_err(fail(CommitStage::TempWritten, "sync temporary file to disk"))?;
    observer
        .stage_reached(CommitStage::Synced)
        .map_err(fail(CommitStage::Synced, "continue after syncing"))?;

    // Close the handle before renaming; the TempPath still deletes on drop.
    let staged_path = staged.into_temp_path();
    staged_path.persist(target).map_err(|e| {
        // e.path is dropped with the error, removing the staged file.
        AppError::commit(target, CommitStage::Synced, "replace configuration file", e.error)
    })?;

    if let Err(e) = sync_dir(dir) {
        warn!(dir = %dir.display(), error = %e, "Could not sync directory after rename");
    }
    Ok(())
}

fn copy_existing_permissions(target: &Path, staged: &File) -> io::Result<()> {
    match fs::metadata(target) {
        Ok(meta) => staged.set_permissions(meta.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
