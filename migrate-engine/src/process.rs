//! Subprocess descriptions and blocking execution.

use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::error::MigrateError;

/// Whether a subprocess shares the terminal or runs silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoMode {
    Inherit,
    #[default]
    Silent,
}

/// A program, its argv and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Parse a whitespace-separated command line, e.g. `"npm install"`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).args(parts))
    }

    /// Run to completion in `cwd`, blocking the caller.
    pub fn run(&self, cwd: &Path, io: IoMode) -> Result<ExitStatus, MigrateError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(cwd);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        if io == IoMode::Silent {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }
        tracing::debug!("running {self}");
        command.status().map_err(|source| MigrateError::Spawn {
            command: self.to_string(),
            source,
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_program_and_args() {
        let spec = CommandSpec::parse("npm  install --no-audit").unwrap();
        assert_eq!(spec.program, "npm");
        assert_eq!(spec.args, vec!["install", "--no-audit"]);
        assert_eq!(spec.to_string(), "npm install --no-audit");
    }

    #[test]
    fn parse_blank_is_none() {
        assert!(CommandSpec::parse("   ").is_none());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = CommandSpec::new("definitely-not-a-real-binary-4242")
            .run(dir.path(), IoMode::Silent)
            .unwrap_err();
        assert!(matches!(err, MigrateError::Spawn { .. }));
    }
}
