//! Common test utilities and helpers
//!
//! This module provides reusable test helpers to reduce code duplication
//! across integration tests.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test command builder for the webhook-admin CLI
pub struct TestCommand {
    cmd: Command,
}

impl TestCommand {
    /// Create a new test command with no location variables inherited
    pub fn new() -> Self {
        let mut cmd = Command::cargo_bin("webhook-admin")
            .expect("Failed to find webhook-admin binary");
        cmd.env_remove("HOOKS").env_remove("UPLOAD_DEST_DIR").env_remove("RUST_LOG");
        Self { cmd }
    }

    /// Add arguments to the command
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    /// Add a single argument to the command
    pub fn arg<S: AsRef<std::ffi::OsStr>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Set environment variable
    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<std::ffi::OsStr>,
        V: AsRef<std::ffi::OsStr>,
    {
        self.cmd.env(key, val);
        self
    }

    /// Write stdin input
    pub fn stdin<S: AsRef<str>>(mut self, input: S) -> Self {
        self.cmd.write_stdin(input.as_ref());
        self
    }

    /// Execute and expect success
    pub fn expect_success(mut self) -> TestAssertion {
        let assert = self.cmd.assert().success();
        TestAssertion { assert }
    }

    /// Execute and expect failure
    pub fn expect_failure(mut self) -> TestAssertion {
        let assert = self.cmd.assert().failure();
        TestAssertion { assert }
    }
}

impl Default for TestCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Test assertion wrapper with convenient methods
pub struct TestAssertion {
    assert: assert_cmd::assert::Assert,
}

impl TestAssertion {
    /// Assert stdout contains text
    pub fn stdout_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Assert stderr contains text
    pub fn stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stderr(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Assert multiple stdout patterns
    pub fn stdout_contains_all<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.assert = self.assert.stdout(predicate::str::contains(pattern.as_ref()));
        }
        Self { assert: self.assert }
    }

    /// Finish the assertion
    pub fn done(self) -> assert_cmd::assert::Assert {
        self.assert
    }
}

/// A hook file, upload directory and config home inside one temp directory
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub hooks_file: PathBuf,
    pub upload_dir: PathBuf,
}

impl TestEnvironment {
    /// Create a new test environment with temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let hooks_file = temp_dir.path().join("hooks.yaml");
        let upload_dir = temp_dir.path().join("scripts");

        Self {
            temp_dir,
            hooks_file,
            upload_dir,
        }
    }

    /// Seed the hook file
    pub fn write_hooks(&self, content: &str) {
        std::fs::write(&self.hooks_file, content).expect("Failed to write hook file");
    }

    pub fn read_hooks(&self) -> String {
        std::fs::read_to_string(&self.hooks_file).expect("Failed to read hook file")
    }

    /// Create a file outside the upload directory, as a finished upload would be
    pub fn staged_upload(&self, name: &str, content: &str) -> PathBuf {
        let staging = self.temp_dir.path().join("incoming");
        std::fs::create_dir_all(&staging).expect("Failed to create staging dir");
        let path = staging.join(name);
        std::fs::write(&path, content).expect("Failed to write staged upload");
        path
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a command configured for this environment
    ///
    /// The config home points into the temp directory so no real settings
    /// file is picked up.
    pub fn command(&self) -> TestCommand {
        TestCommand::new()
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("HOME", self.path())
            .arg("--hooks-file")
            .arg(&self.hooks_file)
            .arg("--upload-dir")
            .arg(&self.upload_dir)
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample documents shared by the integration tests
pub mod fixtures {
    pub const DEPLOY_HOOK: &str = r#"- id: deploy
  execute-command: /srv/scripts/deploy.sh
  command-working-directory: /srv
  trigger-rule:
    match:
      type: value
      value: refs/heads/main
      parameter:
        source: payload
        name: ref
"#;

    pub const TWO_NEW_HOOKS: &str = r#"- id: deploy
  execute-command: /srv/scripts/deploy.sh
- id: build
  execute-command: /srv/scripts/build.sh
  trigger-rule:
    and:
      - match: {type: value, value: main, parameter: {source: payload, name: ref}}
      - match: {type: regex, regex: "^v[0-9]+", parameter: {source: query, name: tag}}
- id: notify
  execute-command: /srv/scripts/notify.sh
"#;
}
