//! dialoguer-backed implementation of the `Prompter` port.

use anyhow::{Context, Result};

use crate::application::ports::Prompter;

/// Interactive terminal prompter.
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn input(&self, label: &str) -> Result<String> {
        let value: String = dialoguer::Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .with_context(|| format!("reading {label}"))?;
        Ok(value.trim().to_string())
    }

    fn secret(&self, label: &str) -> Result<String> {
        let value = dialoguer::Password::new()
            .with_prompt(label)
            .allow_empty_password(true)
            .interact()
            .with_context(|| format!("reading {label}"))?;
        Ok(value)
    }
}
