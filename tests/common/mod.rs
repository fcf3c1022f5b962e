//! Common test utilities for integration tests.
//!
//! This module provides shared fixtures used across the integration tests:
//! Gitfile contents, a temporary working directory, and a scripted `git`
//! double that answers every command without touching the network.
//!
//! # Usage
//!
//! In your test file, add:
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use git_get::error::Result;
use git_get::exec::{CommandOutput, CommandRunner, CommandSpec};

/// Prelude module for convenient imports in test files.
pub mod prelude {
    pub use super::{configs, ScriptedGit, TestFixture};
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;
}

/// Gitfile contents for tests.
pub mod configs {
    /// Nothing declared.
    pub const EMPTY: &str = "[]\n";

    /// Two repositories tracking `main`.
    pub const TWO_REPOS: &str = r#"
- url: git@example.com:acme/alpha.git
  ref: main
- url: git@example.com:acme/beta.git
  ref: main
"#;

    /// Three repositories, one of them listed in [`IGNORE_BETA`].
    pub const THREE_REPOS: &str = r#"
- url: git@example.com:acme/alpha.git
  ref: main
- url: git@example.com:acme/beta.git
  ref: main
- url: git@example.com:acme/gamma.git
  ref: main
"#;

    /// Ignores `beta`.
    pub const IGNORE_BETA: &str = r#"
- url: git@example.com:acme/beta.git
"#;

    /// Not a list of records.
    pub const INVALID_YAML: &str = "- url: [unterminated";
}

/// A temporary working directory holding Gitfiles.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        let target = self.temp_dir.path().join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&target, content).expect("Failed to write file");
        self
    }

    /// Add a `Gitfile` with the given content.
    pub fn with_gitfile(self, content: &str) -> Self {
        self.with_file("Gitfile", content)
    }

    /// Create a directory, e.g. to make a repository look already cloned.
    #[allow(dead_code)]
    pub fn with_dir(self, path: &str) -> Self {
        fs::create_dir_all(self.temp_dir.path().join(path)).expect("Failed to create directory");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path of a file inside the fixture.
    pub fn join(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// Create a command running in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("git-get");
        cmd.current_dir(self.path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Scripted `git` double.
///
/// Every repository sits on `main` with a clean work tree and a `main`
/// branch. `clone` creates the target directory so that later filesystem
/// checks see it. Calls are recorded for assertions and the number of calls
/// in flight is tracked to observe concurrency.
pub struct ScriptedGit {
    calls: Mutex<Vec<CommandSpec>>,
    failing: HashMap<String, String>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl ScriptedGit {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: HashMap::new(),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        }
    }

    /// Fails every command whose arguments mention `needle` with `stderr`.
    #[allow(dead_code)]
    pub fn failing_for(mut self, needle: &str, stderr: &str) -> Self {
        self.failing.insert(needle.to_string(), stderr.to_string());
        self
    }

    /// Every recorded command as its joined argument list.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.args.join(" "))
            .collect()
    }

    /// Recorded commands whose argument list starts with `prefix`.
    pub fn matching(&self, prefix: &[&str]) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                c.args
                    .iter()
                    .map(String::as_str)
                    .take(prefix.len())
                    .eq(prefix.iter().copied())
            })
            .cloned()
            .collect()
    }

    /// Highest number of commands observed running at the same time.
    #[allow(dead_code)]
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    fn answer(&self, command: &CommandSpec) -> CommandOutput {
        let joined = command.args.join(" ");
        if let Some(stderr) = self
            .failing
            .iter()
            .find(|(needle, _)| joined.contains(needle.as_str()))
            .map(|(_, stderr)| stderr)
        {
            return CommandOutput::failed(stderr.clone());
        }

        match command.subcommand().unwrap_or_default() {
            "clone" => {
                if let Some(target) = command.args.last() {
                    fs::create_dir_all(target).expect("Failed to create clone target");
                }
                CommandOutput::ok("")
            }
            "rev-parse" => CommandOutput::ok("main\n"),
            "show-ref" if joined.ends_with("refs/heads/main") => CommandOutput::ok(""),
            "show-ref" => CommandOutput::failed(""),
            _ => CommandOutput::ok(""),
        }
    }
}

impl Default for ScriptedGit {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ScriptedGit {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        if command.subcommand() == Some("clone") {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        let output = self.answer(command);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_gitfile() {
        let fixture = TestFixture::new().with_gitfile(configs::TWO_REPOS);
        assert!(fixture.join("Gitfile").exists());
    }

    #[test]
    fn test_configs_are_valid_yaml() {
        for config in [
            configs::EMPTY,
            configs::TWO_REPOS,
            configs::THREE_REPOS,
            configs::IGNORE_BETA,
        ] {
            serde_yaml::from_str::<serde_yaml::Value>(config).expect("Config should be valid YAML");
        }
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<Vec<git_get::config::RepositorySpec>>(
            configs::INVALID_YAML,
        );
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}
