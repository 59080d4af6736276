//! Uploaded script placement
//!
//! Scripts referenced by a hook's `execute-command` are uploaded into one
//! destination directory. Placing a file means: reduce the requested name to
//! a bare file name, move the uploaded bytes into the directory (copying when
//! a rename is impossible, e.g. across volumes), and mark the result
//! executable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult, ErrorContextExt};

/// Mode given to placed scripts and to a freshly created destination directory
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Result of a successful [`ScriptStore::place`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedScript {
    pub path: PathBuf,
    pub file_name: String,
    /// True when the bytes had to be copied instead of renamed
    pub copied: bool,
    /// Non-fatal problem, such as failing to set the executable bit
    pub warning: Option<String>,
}

/// One entry of the destination directory
#[derive(Debug, Clone, Serialize)]
pub struct ScriptEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

/// The directory uploaded scripts are placed in
#[derive(Debug, Clone)]
pub struct ScriptStore {
    dest_dir: PathBuf,
}

impl ScriptStore {
    pub fn new(dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
        }
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Check that `name` is a bare file name and return it
    ///
    /// Names containing path separators, NUL bytes, or consisting of `.`
    /// or `..` are refused rather than silently truncated.
    pub fn sanitize_file_name(name: &str) -> AppResult<String> {
        if name.trim().is_empty() {
            return Err(AppError::invalid_file_name(name, "name is empty"));
        }
        if name == "." || name == ".." {
            return Err(AppError::invalid_file_name(name, "name refers to a directory"));
        }
        if name.contains(['/', '\\']) {
            return Err(AppError::invalid_file_name(name, "name contains a path separator"));
        }
        if name.contains('\0') {
            return Err(AppError::invalid_file_name(name, "name contains a NUL byte"));
        }
        Ok(name.to_string())
    }

    /// Move the uploaded file at `source` into the destination directory
    ///
    /// `name` defaults to the file name of `source`. An existing script with
    /// the same name is replaced.
    pub fn place(&self, source: &Path, name: Option<&str>) -> AppResult<PlacedScript> {
        let requested = match name {
            Some(name) => name.to_string(),
            None => {
                let fallback = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                warn!(source = %source.display(), name = %fallback, "No file name given, using the upload's own name");
                fallback
            }
        };
        let file_name = Self::sanitize_file_name(&requested)?;

        self.ensure_dest_dir()?;
        let dest = self.dest_dir.join(&file_name);

        let copied = match fs::rename(source, &dest) {
            Ok(()) => false,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(e).in_upload(&file_name, "find uploaded file");
            }
            Err(e) => {
                debug!(error = %e, cross_device = is_cross_device(&e), "Rename failed, copying instead");
                self.copy_into_place(source, &dest, &file_name)?;
                if let Err(e) = fs::remove_file(source) {
                    warn!(source = %source.display(), error = %e, "Could not remove uploaded temporary file");
                }
                true
            }
        };

        let warning = match set_executable(&dest) {
            Ok(()) => None,
            Err(e) => {
                warn!(path = %dest.display(), error = %e, "Could not set executable permissions");
                Some(format!("could not set executable permissions: {}", e))
            }
        };

        info!(path = %dest.display(), copied, "Script placed");
        Ok(PlacedScript {
            path: dest,
            file_name,
            copied,
            warning,
        })
    }

    /// Directory contents, directories first, then by name
    ///
    /// A missing destination directory lists as empty.
    pub fn list(&self) -> AppResult<Vec<ScriptEntry>> {
        let entries = match fs::read_dir(&self.dest_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).in_file_operation(&self.dest_dir, "list upload directory"),
        };

        let mut scripts = Vec::new();
        for entry in entries {
            let entry = entry.in_file_operation(&self.dest_dir, "read directory entry")?;
            let meta = entry
                .metadata()
                .in_file_operation(&entry.path(), "read file metadata")?;
            scripts.push(ScriptEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: meta.is_dir(),
                size: meta.len(),
                modified: meta.modified().ok().map(DateTime::<Local>::from),
            });
        }

        scripts.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
        Ok(scripts)
    }

    fn ensure_dest_dir(&self) -> AppResult<()> {
        if self.dest_dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.dest_dir)
            .in_file_operation(&self.dest_dir, "create upload directory")?;
        set_mode(&self.dest_dir, EXECUTABLE_MODE)
            .in_file_operation(&self.dest_dir, "set upload directory permissions")
    }

    /// Copy `source` to `dest` through a synced temp file in the same directory
    fn copy_into_place(&self, source: &Path, dest: &Path, file_name: &str) -> AppResult<()> {
        let mut reader = fs::File::open(source).in_upload(file_name, "open uploaded file")?;
        let mut staged = Builder::new()
            .prefix(".upload-")
            .tempfile_in(&self.dest_dir)
            .in_upload(file_name, "create temporary file")?;

        io::copy(&mut reader, &mut staged).in_upload(file_name, "copy file contents")?;
        staged
            .as_file()
            .sync_all()
            .in_upload(file_name, "sync file to disk")?;
        staged
            .into_temp_path()
            .persist(dest)
            .map_err(|e| e.error)
            .in_upload(file_name, "move copy into place")
    }
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}

fn set_executable(path: &Path) -> io::Result<()> {
    set_mode(path, EXECUTABLE_MODE)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
