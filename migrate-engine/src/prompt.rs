//! Interactive input capability.
//!
//! The engine never talks to the terminal directly; the CLI supplies a
//! terminal-backed [`Prompter`] and non-interactive runs use [`NonInteractive`].

use crate::error::MigrateError;

pub trait Prompter {
    /// Yes/no question.
    fn confirm(&self, message: &str, default: bool) -> Result<bool, MigrateError>;

    /// Free-text question; an empty answer yields `default`.
    fn input(&self, message: &str, default: &str) -> Result<String, MigrateError>;

    /// Suspend until the user is ready to continue. Declining aborts the run.
    fn pause(&self, message: &str) -> Result<(), MigrateError> {
        if self.confirm(message, true)? {
            Ok(())
        } else {
            Err(MigrateError::Prompt("migration aborted by user".to_string()))
        }
    }
}

/// Answers every question with its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, MigrateError> {
        tracing::debug!("{message} -> {default}");
        Ok(default)
    }

    fn input(&self, message: &str, default: &str) -> Result<String, MigrateError> {
        tracing::debug!("{message} -> {default}");
        Ok(default.to_string())
    }

    fn pause(&self, _message: &str) -> Result<(), MigrateError> {
        Ok(())
    }
}
