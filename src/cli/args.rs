//! Argument processing for commands that take a hook document
//!
//! `check` and `save` accept the document from a file, from an inline
//! argument, or from stdin. This module turns those options into text.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::PathBuf;

/// Where a command's document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentInput {
    File(PathBuf),
    Inline(String),
    Stdin,
}

impl DocumentInput {
    /// Pick the source from the command's options; stdin when neither is set
    pub fn from_options(file: Option<PathBuf>, content: Option<String>) -> Self {
        match (file, content) {
            (Some(path), _) => Self::File(path),
            (None, Some(text)) => Self::Inline(text),
            (None, None) => Self::Stdin,
        }
    }

    /// Human-readable name used in command output
    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Inline(_) => "inline content".to_string(),
            Self::Stdin => "stdin".to_string(),
        }
    }

    pub fn read(self) -> Result<String> {
        self.read_from(std::io::stdin())
    }

    fn read_from<R: Read>(self, mut stdin: R) -> Result<String> {
        match self {
            Self::File(path) => std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read document from {}", path.display())),
            Self::Inline(text) => Ok(text),
            Self::Stdin => {
                let mut buffer = String::new();
                stdin
                    .read_to_string(&mut buffer)
                    .context("Failed to read document from stdin")?;
                Ok(buffer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_selection() {
        assert_eq!(DocumentInput::from_options(None, None), DocumentInput::Stdin);
        assert_eq!(
            DocumentInput::from_options(None, Some("[]".to_string())),
            DocumentInput::Inline("[]".to_string())
        );
        assert_eq!(
            DocumentInput::from_options(Some(PathBuf::from("h.yaml")), None),
            DocumentInput::File(PathBuf::from("h.yaml"))
        );
    }

    #[test]
    fn test_read_each_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hooks.yaml");
        std::fs::write(&path, "- id: from-file\n").unwrap();

        let from_file = DocumentInput::File(path).read_from(std::io::empty()).unwrap();
        assert_eq!(from_file, "- id: from-file\n");

        let from_stdin = DocumentInput::Stdin
            .read_from("- id: piped\n".as_bytes())
            .unwrap();
        assert_eq!(from_stdin, "- id: piped\n");

        let inline = DocumentInput::Inline("[]".to_string())
            .read_from(std::io::empty())
            .unwrap();
        assert_eq!(inline, "[]");
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = DocumentInput::File(PathBuf::from("/nonexistent/hooks.yaml"))
            .read_from(std::io::empty())
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/hooks.yaml"));
    }
}
