pub mod ansi;
pub mod config;
pub mod directive;
pub mod history;
pub mod item;
pub mod matcher;
pub mod options;
