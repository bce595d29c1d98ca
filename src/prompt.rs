use std::fmt::Display;

use inquire::{Confirm, Editor, InquireError, Password, Select};
use miette::Diagnostic;

pub(crate) fn select<T: Display>(items: Vec<T>, prompt: &str) -> Result<T, Error> {
    Select::new(prompt, items).prompt().map_err(Error)
}

pub(crate) fn select_with_default<T: Display>(
    items: Vec<T>,
    default: usize,
    prompt: &str,
) -> Result<T, Error> {
    Select::new(prompt, items)
        .with_starting_cursor(default)
        .prompt()
        .map_err(Error)
}

pub(crate) fn get_secret(prompt: &str, help: &str) -> Result<String, Error> {
    Password::new(prompt)
        .with_help_message(help)
        .with_display_toggle_enabled()
        .without_confirmation()
        .prompt()
        .map_err(Error)
}

/// Opens the user's editor, for multi-line markdown.
pub(crate) fn get_long_text(prompt: &str, predefined: &str) -> Result<String, Error> {
    Editor::new(prompt)
        .with_predefined_text(predefined)
        .with_file_extension(".md")
        .prompt()
        .map_err(Error)
}

pub(crate) fn confirm(prompt: &str) -> Result<bool, Error> {
    Confirm::new(prompt)
        .with_default(true)
        .prompt()
        .map_err(Error)
}

#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("Failed to get user input")]
#[diagnostic(
    code(prompt),
    help("This command needs user input when options are missing. Pass them as flags to run non-interactively.")
)]
pub(crate) struct Error(#[from] InquireError);
