//! CLI Context for dependency injection and shared state
//!
//! Resolves where the hook file and upload directory live (flag or
//! environment, then settings file, then built-in default) and owns logging
//! setup, so handlers only ever see final paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::SettingsManager;
use crate::scripts::ScriptStore;
use crate::store::ConfigStore;

use super::Cli;

/// CLI execution context containing shared dependencies and configuration
#[derive(Clone)]
pub struct CliContext {
    pub hooks_file: PathBuf,
    pub upload_dir: PathBuf,
    pub verbose: bool,
    pub settings: Arc<SettingsManager>,
}

impl CliContext {
    /// Build the context from parsed arguments
    pub fn new(cli: &Cli) -> Result<Self> {
        let settings = SettingsManager::new(cli.settings.clone())
            .context("Failed to load webhook-admin settings")?;
        Ok(Self::with_settings(
            settings,
            cli.hooks_file.clone(),
            cli.upload_dir.clone(),
            cli.verbose,
        ))
    }

    pub fn with_settings(
        settings: SettingsManager,
        hooks_file: Option<PathBuf>,
        upload_dir: Option<PathBuf>,
        verbose: bool,
    ) -> Self {
        Self {
            hooks_file: settings.hooks_file(hooks_file),
            upload_dir: settings.upload_dir(upload_dir),
            verbose,
            settings: Arc::new(settings),
        }
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(&self.hooks_file)
    }

    pub fn script_store(&self) -> ScriptStore {
        ScriptStore::new(&self.upload_dir)
    }

    /// Effective log filter directive
    pub fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.settings.settings().logging.level
        }
    }

    /// Initialize logging to stderr, plus the audit file when one is configured
    ///
    /// The returned guard flushes the file writer on drop and must be held
    /// until the command has finished.
    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        use tracing_subscriber::prelude::*;

        let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
            self.log_level()
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        );
        let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        let (file_layer, guard) = match &self.settings.settings().logging.file {
            Some(log_path) => {
                let (dir, file_name) = split_log_path(log_path);
                std::fs::create_dir_all(dir).context("Failed to create log directory")?;

                let file_appender = tracing_appender::rolling::daily(dir, file_name);
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        if self.verbose {
            tracing::debug!("Verbose logging enabled");
            tracing::debug!(settings = ?self.settings.settings_path(), "Settings source");
            tracing::debug!(hooks_file = %self.hooks_file.display(), upload_dir = %self.upload_dir.display(), "Resolved locations");
        }

        Ok(guard)
    }
}

fn split_log_path(log_path: &Path) -> (&Path, &std::ffi::OsStr) {
    let dir = match log_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = log_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("webhook-admin.log"));
    (dir, file_name)
}
