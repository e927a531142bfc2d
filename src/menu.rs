//! Menu text and selection parsing for the interactive front end.
//!
//! Parsers return validation errors for anything the menu does not offer;
//! the caller reports them and redisplays the menu.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::settings::{Settings, SettingsField};

/// Line that ends multi-line text entry, compared case-insensitively.
pub const DONE_LINE: &str = "DONE";

/// A main menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainChoice {
    NewConversation,
    LoadConversation,
    ManagePrompts,
    ToggleStreaming,
    Settings,
    Exit,
}

impl MainChoice {
    /// Parse a selection.  Loading is only offered when conversations exist.
    pub fn parse(input: &str, have_conversations: bool) -> Result<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" => Ok(MainChoice::NewConversation),
            "2" if have_conversations => Ok(MainChoice::LoadConversation),
            "p" => Ok(MainChoice::ManagePrompts),
            "s" => Ok(MainChoice::ToggleStreaming),
            "c" => Ok(MainChoice::Settings),
            "0" => Ok(MainChoice::Exit),
            _ => Err(invalid_choice()),
        }
    }
}

/// A system prompt menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Create,
    View,
    Edit,
    Delete,
    Back,
}

impl PromptChoice {
    /// Parse a selection.  View, edit and delete need at least one prompt.
    pub fn parse(input: &str, have_prompts: bool) -> Result<Self> {
        match input.trim() {
            "1" => Ok(PromptChoice::Create),
            "2" if have_prompts => Ok(PromptChoice::View),
            "3" if have_prompts => Ok(PromptChoice::Edit),
            "4" if have_prompts => Ok(PromptChoice::Delete),
            "0" => Ok(PromptChoice::Back),
            _ => Err(invalid_choice()),
        }
    }
}

/// A settings menu selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChoice {
    Edit(SettingsField),
    Back,
}

impl SettingsChoice {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input == "0" {
            return Ok(SettingsChoice::Back);
        }
        let index = parse_index(input, SettingsField::ALL.len()).map_err(|_| invalid_choice())?;
        Ok(SettingsChoice::Edit(SettingsField::ALL[index]))
    }
}

/// Parse a 1-based item number into a 0-based index below `len`.
pub fn parse_index(input: &str, len: usize) -> Result<usize> {
    let number: usize = input
        .trim()
        .parse()
        .map_err(|_| Error::validation("Please enter a valid number.", None))?;
    if number == 0 || number > len {
        return Err(Error::validation(
            format!("Invalid number: choose 1 to {len}."),
            None,
        ));
    }
    Ok(number - 1)
}

/// Parse a system prompt selection where `0` means none.
pub fn parse_optional_index(input: &str, len: usize) -> Result<Option<usize>> {
    if input.trim() == "0" {
        return Ok(None);
    }
    parse_index(input, len).map(Some)
}

/// True only for an explicit yes.
pub fn parse_yes_no(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// True for the line that ends multi-line entry.
pub fn is_done_line(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(DONE_LINE)
}

fn invalid_choice() -> Error {
    Error::validation("Invalid choice.", None)
}

fn numbered(out: &mut String, items: &[String]) {
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "   {}. {item}", i + 1);
    }
}

/// The main menu.
pub fn main_menu(conversations: &[String], streaming: bool) -> String {
    let mut out = String::from("\n===== Claude Chat Application =====\n1. New Conversation\n");
    if !conversations.is_empty() {
        out.push_str("2. Load Conversation\n");
        numbered(&mut out, conversations);
    }
    out.push_str("\nP. Manage System Prompts\n");
    let _ = writeln!(
        out,
        "S. Toggle Streaming Mode (Currently {})",
        if streaming { "ON" } else { "OFF" }
    );
    out.push_str("C. Configure Settings\n0. Exit");
    out
}

/// The system prompt menu.
pub fn prompt_menu(prompts: &[String]) -> String {
    let mut out = String::from("\n===== System Prompts Management =====\n1. Create new system prompt\n");
    if !prompts.is_empty() {
        out.push_str("2. View system prompt\n3. Edit system prompt\n4. Delete system prompt\n");
        out.push_str("\nAvailable system prompts:\n");
        numbered(&mut out, prompts);
    }
    out.push_str("0. Back to main menu");
    out
}

/// The settings menu, showing current values.
pub fn settings_menu(settings: &Settings) -> String {
    let mut out = String::from("\n===== Configuration =====\n");
    for (i, field) in SettingsField::ALL.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {field} (current: {})",
            i + 1,
            settings.display_value(*field)
        );
    }
    out.push_str("0. Back");
    out
}
