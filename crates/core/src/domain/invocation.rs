// Invocation: one child process to run, consumed once

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A command line plus the context it runs in.
///
/// `argv[0]` is the program; the rest are its arguments. When `env` is set it
/// fully replaces the inherited environment instead of being merged into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
    cwd: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl Invocation {
    /// Create an invocation from a full argument vector
    ///
    /// # Example
    /// ```
    /// use devhost_core::domain::Invocation;
    ///
    /// let inv = Invocation::new(["git", "status", "--short"]);
    /// assert_eq!(inv.program(), Some("git"));
    /// assert_eq!(inv.args(), ["status", "--short"]);
    /// ```
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: None,
            env: None,
        }
    }

    /// Run in `dir` instead of the caller's working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Replace the whole environment with `env`
    pub fn env_replace<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            env.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// `None` means "inherit the current process environment"
    pub fn env(&self) -> Option<&HashMap<String, String>> {
        self.env.as_ref()
    }
}
