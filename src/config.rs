use crate::errors::{AppError, AppResult};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Hook file used when nothing else names one
pub const DEFAULT_HOOKS_FILE: &str = "/etc/webhook/hooks.yaml";
/// Upload directory used when nothing else names one
pub const DEFAULT_UPLOAD_DIR: &str = "/etc/webhook/scripts/upload_destination/";

/// Operator settings for webhook-admin
///
/// Every section is optional in the TOML file; absent values fall back to
/// the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub scripts: ScriptSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub hooks_file: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            hooks_file: PathBuf::from(DEFAULT_HOOKS_FILE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    pub upload_dir: PathBuf,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Optional audit log, rolled daily
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Loaded settings together with the file they came from
///
/// # Example
///
/// ```rust,no_run
/// use webhook_admin::config::SettingsManager;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let manager = SettingsManager::new(None)?;
///     let hooks_file = manager.hooks_file(None);
///     println!("Editing {}", hooks_file.display());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_path: Option<PathBuf>,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from `explicit`, or from the default location
    ///
    /// # Errors
    ///
    /// An explicitly named file must exist and parse. The default file is
    /// optional, but if present it must parse too.
    pub fn new(explicit: Option<PathBuf>) -> AppResult<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(AppError::config(format!(
                    "Settings file '{}' does not exist",
                    path.display()
                )));
            }
            let settings = Self::load(&path)?;
            return Ok(Self {
                settings_path: Some(path),
                settings,
            });
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                let settings = Self::load(&path)?;
                Ok(Self {
                    settings_path: Some(path),
                    settings,
                })
            }
            _ => Ok(Self::from_settings(Settings::default())),
        }
    }

    pub fn from_settings(settings: Settings) -> Self {
        Self {
            settings_path: None,
            settings,
        }
    }

    /// `<config_dir>/webhook-admin/settings.toml`, when a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.config_dir().join("webhook-admin").join("settings.toml"))
    }

    fn load(path: &Path) -> AppResult<Settings> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::io_with_source(path, "read settings file", e))?;
        toml::from_str(&content)
            .map_err(|e| AppError::config_with_source("Failed to parse settings file", e))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// File the settings were read from; `None` means built-in defaults
    pub fn settings_path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    /// Hook file to operate on
    ///
    /// `from_cli` carries both the flag and the `HOOKS` environment
    /// variable, which outrank the settings file.
    pub fn hooks_file(&self, from_cli: Option<PathBuf>) -> PathBuf {
        from_cli.unwrap_or_else(|| self.settings.store.hooks_file.clone())
    }

    /// Upload directory, with the same precedence as [`hooks_file`](Self::hooks_file)
    pub fn upload_dir(&self, from_cli: Option<PathBuf>) -> PathBuf {
        from_cli.unwrap_or_else(|| self.settings.scripts.upload_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.store.hooks_file, PathBuf::from(DEFAULT_HOOKS_FILE));
        assert_eq!(settings.scripts.upload_dir, PathBuf::from(DEFAULT_UPLOAD_DIR));
        assert_eq!(settings.logging.level, "info");
        assert!(settings.logging.file.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[store]\nhooks_file = \"/srv/hooks.yaml\"\n").unwrap();

        let manager = SettingsManager::new(Some(path.clone())).unwrap();
        assert_eq!(manager.settings_path(), Some(path.as_path()));
        assert_eq!(manager.hooks_file(None), PathBuf::from("/srv/hooks.yaml"));
        assert_eq!(manager.upload_dir(None), PathBuf::from(DEFAULT_UPLOAD_DIR));
    }

    #[test]
    fn test_cli_value_wins() {
        let manager = SettingsManager::from_settings(Settings::default());
        assert_eq!(
            manager.hooks_file(Some(PathBuf::from("/tmp/h.yaml"))),
            PathBuf::from("/tmp/h.yaml")
        );
        assert_eq!(
            manager.upload_dir(Some(PathBuf::from("/tmp/up"))),
            PathBuf::from("/tmp/up")
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = SettingsManager::new(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[store\nhooks_file = 3").unwrap();

        let err = SettingsManager::new(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse settings file"));
    }

    #[test]
    fn test_logging_section() {
        let settings: Settings =
            toml::from_str("[logging]\nlevel = \"warn\"\nfile = \"/var/log/webhook-admin/audit.log\"\n")
                .unwrap();
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(
            settings.logging.file,
            Some(PathBuf::from("/var/log/webhook-admin/audit.log"))
        );
    }
}
