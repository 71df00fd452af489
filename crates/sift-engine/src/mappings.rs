//! Key-to-directive resolution: user tables first, then built-in defaults.
//!
//! Keys are named strings ("Enter", "C-u", "j"); the host converts its key
//! events into these names before asking for a directive.

use std::collections::HashMap;

use sift_core::config::Config;
use sift_core::directive::{Directive, DirectiveError};
use sift_core::options::InputMode;

pub struct Mappings {
    insert_user: HashMap<String, String>,
    normal_user: HashMap<String, String>,
    insert_defaults: HashMap<&'static str, Directive>,
    normal_defaults: HashMap<&'static str, Directive>,
}

fn defaults(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, Directive> {
    pairs
        .iter()
        .filter_map(|(key, value)| Directive::parse(value).ok().map(|d| (*key, d)))
        .collect()
}

fn insert_defaults() -> HashMap<&'static str, Directive> {
    defaults(&[
        ("Enter", "do:defaultaction"),
        ("Esc", "do:exit"),
        ("C-c", "do:stop"),
        ("C-l", "do:refresh"),
        ("C-o", "do:togglemode"),
        ("C-s", "do:switch"),
        ("Tab", "do:toggle"),
        ("Down", "do:next"),
        ("Up", "do:previous"),
        ("C-n", "prompt:next"),
        ("C-p", "prompt:previous"),
        ("C-a", "prompt:start"),
        ("C-e", "prompt:end"),
        ("C-b", "prompt:left"),
        ("Left", "prompt:left"),
        ("C-f", "prompt:right"),
        ("Right", "prompt:right"),
        ("Backspace", "prompt:deletebackward"),
        ("C-h", "prompt:deletebackward"),
        ("C-d", "prompt:deleteforward"),
        ("C-k", "prompt:removetail"),
        ("C-u", "prompt:removeahead"),
        ("C-w", "prompt:removeword"),
    ])
}

fn normal_defaults() -> HashMap<&'static str, Directive> {
    defaults(&[
        ("Enter", "do:defaultaction"),
        ("Esc", "do:exit"),
        ("q", "do:exit"),
        ("C-c", "do:stop"),
        ("C-l", "do:refresh"),
        ("i", "do:togglemode"),
        ("a", "do:togglemode"),
        ("C-s", "do:switch"),
        ("Space", "do:toggle"),
        ("C-a", "do:selectall"),
        ("j", "do:next"),
        ("Down", "do:next"),
        ("k", "do:previous"),
        ("Up", "do:previous"),
    ])
}

impl Mappings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            insert_user: config.insert_mappings.clone(),
            normal_user: config.normal_mappings.clone(),
            insert_defaults: insert_defaults(),
            normal_defaults: normal_defaults(),
        }
    }

    /// Look up `key` for `mode`. `None` means unmapped; a bad user entry
    /// comes back as the parse error so it can be reported when pressed.
    pub fn resolve(
        &self,
        mode: InputMode,
        key: &str,
    ) -> Option<Result<Directive, DirectiveError>> {
        let (user, builtin) = match mode {
            InputMode::Insert => (&self.insert_user, &self.insert_defaults),
            InputMode::Normal => (&self.normal_user, &self.normal_defaults),
        };
        if let Some(raw) = user.get(key) {
            return Some(Directive::parse(raw));
        }
        builtin.get(key).cloned().map(Ok)
    }
}
