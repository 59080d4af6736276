//! Hook configuration store
//!
//! The only component that touches the hook file. Every read parses the file
//! afresh; every write replaces the whole document through
//! [`atomic::replace_file`]. There is no locking: concurrent writers race at
//! the final rename and the last one wins. Callers needing stronger
//! guarantees must serialize saves themselves.

pub mod atomic;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{AppError, AppResult};
use crate::hooks::{self, HookSet};

pub use atomic::{CommitObserver, CommitStage};

/// Document handed to editors when no hook file exists yet
pub const EMPTY_DOCUMENT: &str = "[]\n";

/// Loads, validates and atomically saves the hook file at one path
///
/// # Example
///
/// ```rust,no_run
/// use webhook_admin::store::ConfigStore;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = ConfigStore::new("/etc/webhook/hooks.yaml");
///     store.commit("- id: deploy\n  execute-command: /srv/deploy.sh\n")?;
///     assert_eq!(store.load()?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the hook file
    ///
    /// A missing file is the first-run state and yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Load`] if the file exists but cannot be read or
    /// does not parse as a hook list.
    pub fn load(&self) -> AppResult<HookSet> {
        let Some(raw) = self.read_existing()? else {
            debug!(path = %self.path.display(), "Hook file not found, starting with empty config");
            return Ok(HookSet::default());
        };

        hooks::parse(&raw).map_err(|e| AppError::Load {
            path: self.path.clone(),
            location: e.location(),
            message: e.to_string(),
        })
    }

    /// The file's text exactly as stored, for manual editing
    ///
    /// Returns [`EMPTY_DOCUMENT`] when the file does not exist.
    pub fn read_raw(&self) -> AppResult<String> {
        Ok(self
            .read_existing()?
            .unwrap_or_else(|| EMPTY_DOCUMENT.to_string()))
    }

    /// Check that `raw` is well-formed YAML
    ///
    /// Only syntax is checked, not the hook schema, so documents written for
    /// a newer dispatcher are never refused.
    pub fn validate(&self, raw: &str) -> AppResult<()> {
        validate_syntax(raw)
    }

    /// Replace the hook file with `raw`
    ///
    /// # Errors
    ///
    /// - [`AppError::EmptyInput`] when `raw` is empty; storage is not touched
    /// - [`AppError::Validation`] when `raw` is not well-formed YAML
    /// - [`AppError::Commit`] for any I/O failure while staging or renaming
    ///
    /// In every error case the previous file content is left intact.
    pub fn commit(&self, raw: &str) -> AppResult<()> {
        self.commit_observed(raw, &mut ())
    }

    /// [`commit`](Self::commit) reporting each stage to `observer`
    pub fn commit_observed(&self, raw: &str, observer: &mut dyn CommitObserver) -> AppResult<()> {
        if raw.is_empty() {
            return Err(AppError::EmptyInput);
        }
        self.advance(observer, CommitStage::Received)?;

        validate_syntax(raw)?;
        self.advance(observer, CommitStage::Validated)?;

        atomic::replace_file(&self.path, raw.as_bytes(), observer)?;

        info!(
            path = %self.path.display(),
            bytes = raw.len(),
            stage = %CommitStage::Renamed,
            "Hook configuration saved"
        );
        Ok(())
    }

    fn advance(&self, observer: &mut dyn CommitObserver, stage: CommitStage) -> AppResult<()> {
        debug!(path = %self.path.display(), %stage, "Commit stage reached");
        observer
            .stage_reached(stage)
            .map_err(|e| AppError::commit(&self.path, stage, format!("continue after {stage}"), e))
    }

    fn read_existing(&self) -> AppResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Load {
                path: self.path.clone(),
                message: format!("cannot read file: {}", e),
                location: None,
            }),
        }
    }
}

/// Syntax-only YAML check shared by [`ConfigStore::validate`] and commit
pub fn validate_syntax(raw: &str) -> AppResult<()> {
    if hooks::codec::is_blank_document(raw) {
        return Ok(());
    }
    // Multi-document streams are accepted, as the dispatcher's parser does.
    for document in serde_yaml::Deserializer::from_str(raw) {
        IgnoredAny::deserialize(document)
            .map(|_| ())
            .map_err(|e| AppError::validation(&e))?;
    }
    Ok(())
}
