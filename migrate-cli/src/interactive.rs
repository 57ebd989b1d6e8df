//! Terminal-backed [`Prompter`].

use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use migrate_engine::{MigrateError, Prompter};

pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, MigrateError> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|e| MigrateError::Prompt(e.to_string()))
    }

    fn input(&self, message: &str, default: &str) -> Result<String, MigrateError> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .default(default.to_string())
            .interact_text()
            .map_err(|e| MigrateError::Prompt(e.to_string()))
    }
}
