//! Error types for the webhook-admin crate
//!
//! Every failure the store, rule model and script store can produce is a
//! variant of [`AppError`]. Callers that need to show an operator what went
//! wrong use [`AppError::category`] together with the `Display` output.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::store::CommitStage;

/// A position inside a YAML document, both components 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLocation {
    pub line: usize,
    pub column: usize,
}

impl TextLocation {
    pub(crate) fn from_yaml(err: &serde_yaml::Error) -> Option<Self> {
        err.location().map(|loc| Self {
            line: loc.line(),
            column: loc.column(),
        })
    }
}

impl fmt::Display for TextLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // Rule model errors
    #[error("Failed to parse hook document: {message}")]
    Parse {
        message: String,
        location: Option<TextLocation>,
        #[source]
        source: Option<serde_yaml::Error>,
    },

    #[error("Failed to serialize hooks: {message}")]
    Serialize {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Config store errors
    #[error("Failed to load hook configuration from '{path}': {message}")]
    Load {
        path: PathBuf,
        message: String,
        location: Option<TextLocation>,
    },

    #[error("YAML syntax error: {message}")]
    Validation {
        message: String,
        location: Option<TextLocation>,
    },

    #[error("Failed to {operation} while saving '{path}' (reached {stage}): {source}")]
    Commit {
        path: PathBuf,
        stage: CommitStage,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No configuration content was supplied")]
    EmptyInput,

    // Script store errors
    #[error("Invalid script file name '{name}': {reason}")]
    InvalidFileName {
        name: String,
        reason: String,
    },

    #[error("Failed to place script '{name}': {operation}")]
    Upload {
        name: String,
        operation: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Settings errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // I/O errors
    #[error("File I/O error for '{path}': {operation}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Build a Parse error from a serde_yaml failure
    pub fn parse(err: serde_yaml::Error) -> Self {
        Self::Parse {
            message: err.to_string(),
            location: TextLocation::from_yaml(&err),
            source: Some(err),
        }
    }

    /// Build a Validation error from a serde_yaml syntax failure
    pub fn validation(err: &serde_yaml::Error) -> Self {
        Self::Validation {
            message: err.to_string(),
            location: TextLocation::from_yaml(err),
        }
    }

    pub fn commit(
        path: impl Into<PathBuf>,
        stage: CommitStage,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Commit {
            path: path.into(),
            stage,
            operation: operation.into(),
            source,
        }
    }

    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new Config error with source
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_file_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFileName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn upload_with_source(
        name: impl Into<String>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Upload {
            name: name.into(),
            operation: operation.into(),
            source: Some(source),
        }
    }

    /// Create a new I/O error with source
    pub fn io_with_source(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source: Some(source),
        }
    }

    /// Error category shown to operators and used in log fields
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::Serialize { .. } => "serialize",
            Self::Load { .. } => "load",
            Self::Validation { .. } => "validation",
            Self::Commit { .. } => "commit",
            Self::EmptyInput => "empty-input",
            Self::InvalidFileName { .. } | Self::Upload { .. } => "upload",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
        }
    }

    /// Source location inside the offending document, when one is known
    pub fn location(&self) -> Option<TextLocation> {
        match self {
            Self::Parse { location, .. }
            | Self::Load { location, .. }
            | Self::Validation { location, .. } => *location,
            _ => None,
        }
    }
}
