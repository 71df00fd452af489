//! Configuration file types and loading for the list engine.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ── TOML deserialization types ──

#[derive(Deserialize, Serialize, Default)]
pub struct TomlConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<TomlSettings>,
    /// Key → directive string, applied in insert mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert: Option<HashMap<String, String>>,
    /// Key → directive string, applied in normal mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal: Option<HashMap<String, String>>,
}

#[derive(Deserialize, Serialize, Default)]
pub struct TomlSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive_debounce_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_search: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_sign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<String>,
}

// ── Resolved configuration ──

/// Settings with defaults applied. Mapping values stay raw strings here;
/// they are parsed into directives at dispatch time so a bad entry only
/// surfaces when its key is pressed.
#[derive(Debug, Clone)]
pub struct Config {
    pub interactive_debounce_ms: u64,
    pub extended_search: bool,
    pub max_height: u16,
    pub selected_sign: String,
    pub indicator: String,
    pub insert_mappings: HashMap<String, String>,
    pub normal_mappings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interactive_debounce_ms: 100,
            extended_search: true,
            max_height: 10,
            selected_sign: "*".to_string(),
            indicator: ">".to_string(),
            insert_mappings: HashMap::new(),
            normal_mappings: HashMap::new(),
        }
    }
}

/// Path to the config file: `~/.config/sift/config.toml`
pub fn config_path() -> Option<PathBuf> {
    let config_dir = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(|| {
            env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })?;
    Some(config_dir.join("sift").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let path = match config_path() {
            Some(p) => p,
            None => return Self::default(),
        };
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Self {
        let toml_config: TomlConfig = toml::from_str(content).unwrap_or_default();
        Self::resolve(toml_config)
    }

    pub fn resolve(config: TomlConfig) -> Self {
        let mut resolved = Self::default();
        if let Some(settings) = config.settings {
            if let Some(ms) = settings.interactive_debounce_ms {
                resolved.interactive_debounce_ms = ms;
            }
            if let Some(extended) = settings.extended_search {
                resolved.extended_search = extended;
            }
            if let Some(height) = settings.max_height {
                resolved.max_height = height.max(1);
            }
            if let Some(sign) = settings.selected_sign {
                resolved.selected_sign = sign;
            }
            if let Some(indicator) = settings.indicator {
                resolved.indicator = indicator;
            }
        }
        if let Some(insert) = config.insert {
            resolved.insert_mappings = insert;
        }
        if let Some(normal) = config.normal {
            resolved.normal_mappings = normal;
        }
        resolved
    }
}
