//! Terminal-backed prompter for the upgrade engine

use cms_nova_projects::upgrade::Prompter;
use cms_nova_projects::{Error, Result};
use dialoguer::{Confirm, Input};

use crate::output;

/// Reads answers from the attached terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(question)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| Error::prompt(e.to_string()))
    }

    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
            .map_err(|e| Error::prompt(e.to_string()))
    }

    fn show(&mut self, text: &str) {
        if text.starts_with("diff --git") {
            println!("{}", output::diff(text));
        } else {
            println!("{}", text);
        }
    }
}
