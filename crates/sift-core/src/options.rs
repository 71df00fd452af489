//! Activation options and the invocation argument grammar.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::MatcherKind;

/// Prompt input mode at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Insert,
    Normal,
}

impl InputMode {
    pub fn toggled(&self) -> Self {
        match self {
            InputMode::Insert => InputMode::Normal,
            InputMode::Normal => InputMode::Insert,
        }
    }
}

/// Where the list surface opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    #[default]
    Bottom,
    Top,
    Tab,
}

/// Immutable snapshot of one activation's options. `matcher` and `mode`
/// are the only fields a running session mutates in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    pub matcher: MatcherKind,
    pub ignore_case: bool,
    pub sort: bool,
    pub interactive: bool,
    pub mode: InputMode,
    pub position: Position,
    pub number_select: bool,
    pub auto_preview: bool,
    pub no_quit: bool,
    pub first: bool,
    pub reverse: bool,
    pub input: String,
    pub height: Option<u16>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            matcher: MatcherKind::Fuzzy,
            ignore_case: false,
            sort: true,
            interactive: false,
            mode: InputMode::Insert,
            position: Position::Bottom,
            number_select: false,
            auto_preview: false,
            no_quit: false,
            first: false,
            reverse: false,
            input: String::new(),
            height: None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("invalid option \"{0}\"")]
    InvalidOption(String),
    #[error("invalid height \"{0}\"")]
    InvalidHeight(String),
    #[error("no list name given")]
    MissingName,
}

/// A fully parsed invocation: flags, the list name, and trailing
/// provider arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArgs {
    pub name: String,
    pub options: ListOptions,
    pub args: Vec<String>,
}

/// Parse an invocation. Flags must precede the list name; everything
/// after the name is passed through to the provider untouched.
pub fn parse_args<S: AsRef<str>>(tokens: &[S]) -> Result<ParsedArgs, OptionsError> {
    let mut options = ListOptions::default();
    let mut iter = tokens.iter().map(|t| t.as_ref());
    let name = loop {
        let token = iter.next().ok_or(OptionsError::MissingName)?;
        if !token.starts_with('-') {
            break token.to_string();
        }
        match token {
            "--normal" => options.mode = InputMode::Normal,
            "--auto-preview" | "-A" => options.auto_preview = true,
            "--regex" | "-R" => options.matcher = MatcherKind::Regex,
            "--strict" | "--strictMatch" | "-S" => options.matcher = MatcherKind::Strict,
            "--interactive" | "-I" => options.interactive = true,
            "--number-select" | "-N" => options.number_select = true,
            "--ignore-case" => options.ignore_case = true,
            "--top" => options.position = Position::Top,
            "--tab" => options.position = Position::Tab,
            "--no-sort" => options.sort = false,
            "--no-quit" => options.no_quit = true,
            "--first" => options.first = true,
            "--reverse" => options.reverse = true,
            _ => {
                if let Some(value) = token.strip_prefix("--input=") {
                    options.input = value.to_string();
                } else if let Some(value) = token.strip_prefix("--height=") {
                    let height: u16 = value
                        .parse()
                        .map_err(|_| OptionsError::InvalidHeight(value.to_string()))?;
                    options.height = Some(height);
                } else {
                    return Err(OptionsError::InvalidOption(token.to_string()));
                }
            }
        }
    };
    let args = iter.map(str::to_string).collect();
    Ok(ParsedArgs {
        name,
        options,
        args,
    })
}
