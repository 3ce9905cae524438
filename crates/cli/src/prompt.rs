//! Terminal prompter
//!
//! Implements the core [`Prompter`] capability with dialoguer widgets.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};

use azb_core::{Error, Prompter, Result};

/// Prompter that asks on the controlling terminal
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_terminal(&self, message: &str) -> Result<()> {
        if console::user_attended() {
            Ok(())
        } else {
            Err(Error::Prompt(format!(
                "'{message}' needs an interactive terminal; pass the value as a flag instead"
            )))
        }
    }
}

impl Prompter for TerminalPrompter {
    fn select(&self, message: &str, options: &[&str], default: usize) -> Result<usize> {
        self.ensure_terminal(message)?;
        Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(options)
            .default(default)
            .interact()
            .map_err(|e| Error::Prompt(format!("selection error: {e}")))
    }

    fn input(&self, message: &str, default: Option<&str>) -> Result<String> {
        self.ensure_terminal(message)?;
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(message);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input
            .interact_text()
            .map_err(|e| Error::Prompt(format!("input error: {e}")))
    }
}
