//! Centralized error handling module
//!
//! All fallible operations in the crate return [`AppResult`]; the binary
//! converts the final error into `anyhow::Error` for reporting.

pub mod types;
pub mod context;

pub use types::{AppError, AppResult, TextLocation};
pub use context::ErrorContextExt;
