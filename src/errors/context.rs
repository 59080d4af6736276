//! Error context helpers
//!
//! Attaches the file path and the operation being attempted to raw
//! `std::io::Error`s so that every I/O failure reaching an operator names the
//! file involved.

use std::path::Path;

use super::types::{AppError, AppResult};

/// Extension trait for adding file context to I/O results
pub trait ErrorContextExt<T> {
    /// Wrap the error as [`AppError::Io`] naming the file and operation
    fn in_file_operation(self, path: &Path, operation: &str) -> AppResult<T>;

    /// Wrap the error as [`AppError::Upload`] naming the script being placed
    fn in_upload(self, name: &str, operation: &str) -> AppResult<T>;
}

impl<T> ErrorContextExt<T> for std::io::Result<T> {
    fn in_file_operation(self, path: &Path, operation: &str) -> AppResult<T> {
        self.map_err(|e| AppError::io_with_source(path, operation, e))
    }

    fn in_upload(self, name: &str, operation: &str) -> AppResult<T> {
        self.map_err(|e| AppError::upload_with_source(name, operation, e))
    }
}
