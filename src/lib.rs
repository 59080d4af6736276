//! Webhook Admin Library
//!
//! Data model, validation and crash-safe persistence for the hook definition
//! file of a webhook dispatcher, plus placement of the scripts those hooks
//! run.

pub mod cli;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod scripts;
pub mod store;

// Re-export commonly used types for convenience
pub use config::{Settings, SettingsManager};
pub use errors::{AppError, AppResult};
pub use hooks::{Hook, HookSet, TriggerRule};
pub use scripts::ScriptStore;
pub use store::{CommitObserver, CommitStage, ConfigStore};
