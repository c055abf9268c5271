//! Interactive prompts.

use std::io::{self, IsTerminal};
use std::path::Path;

use dialoguer::{theme::ColorfulTheme, Confirm, FuzzySelect, Input};

use crate::sync;

fn into_io(err: dialoguer::Error) -> io::Error {
    match err {
        dialoguer::Error::IO(e) => e,
    }
}

/// Whether stdin and stdout are both terminals.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

/// Pick one item; `None` if the user escapes.
pub fn select<T: ToString>(prompt: &str, items: &[T]) -> io::Result<Option<usize>> {
    FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact_opt()
        .map_err(into_io)
}

pub fn confirm(prompt: &str, default: bool) -> io::Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(into_io)
}

/// Free-text input. Empty input is returned as an empty string.
pub fn input(prompt: &str) -> io::Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map(|s| s.trim().to_string())
        .map_err(into_io)
}

/// Conflict confirmation on the terminal.
pub struct TerminalConfirm;

impl sync::Confirm for TerminalConfirm {
    fn confirm_overwrite(&self, path: &Path) -> io::Result<bool> {
        if !is_interactive() {
            return Ok(false);
        }
        eprintln!(
            "⚠️  {} has changes that haven't been saved to the server.",
            path.display()
        );
        confirm("Discard local changes and load the server's models?", false)
    }
}
