//! Per-list, per-directory MRU of past prompt inputs.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::matcher::fuzzy_match;

pub const MAX_ENTRIES: usize = 200;

/// Input history for one (list name, working directory) pair, backed by a
/// shared JSON file. Entries are stored oldest first.
#[derive(Debug)]
pub struct History {
    path: PathBuf,
    key: String,
    entries: Vec<String>,
    /// Entries narrowed by the prompt input at activation.
    working: Vec<String>,
    index: Option<usize>,
}

fn default_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("sift")
        .join("history.json")
}

fn read_store(path: &Path) -> HashMap<String, Vec<String>> {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

impl History {
    pub fn load(name: &str, cwd: &Path) -> Self {
        Self::load_from(default_path(), name, cwd)
    }

    pub fn load_from(path: PathBuf, name: &str, cwd: &Path) -> Self {
        let key = format!("{name}:{}", cwd.display());
        let entries = read_store(&path).remove(&key).unwrap_or_default();
        Self {
            path,
            key,
            entries,
            working: Vec::new(),
            index: None,
        }
    }

    /// Narrow to entries that start with or fuzzy-match `input`, and reset
    /// the cycle cursor.
    pub fn filter(&mut self, input: &str) {
        self.index = None;
        self.working = self
            .entries
            .iter()
            .filter(|e| input.is_empty() || e.starts_with(input) || fuzzy_match(e, input).is_some())
            .cloned()
            .collect();
    }

    /// Cycle backwards: most recent first, wrapping at the oldest entry.
    pub fn previous(&mut self) -> Option<&str> {
        if self.working.is_empty() {
            return None;
        }
        let next = match self.index {
            None | Some(0) => self.working.len() - 1,
            Some(i) => i - 1,
        };
        self.index = Some(next);
        Some(&self.working[next])
    }

    /// Cycle forwards: oldest first, wrapping at the most recent entry.
    pub fn next(&mut self) -> Option<&str> {
        if self.working.is_empty() {
            return None;
        }
        let next = match self.index {
            None => 0,
            Some(i) if i + 1 >= self.working.len() => 0,
            Some(i) => i + 1,
        };
        self.index = Some(next);
        Some(&self.working[next])
    }

    /// Record a just-used input: dedup to the most-recent slot, trim to the
    /// bound. Inputs shorter than two characters are not worth keeping.
    pub fn add(&mut self, input: &str) {
        if input.chars().count() < 2 {
            return;
        }
        self.entries.retain(|e| e != input);
        self.entries.push(input.to_string());
        if self.entries.len() > MAX_ENTRIES {
            let excess = self.entries.len() - MAX_ENTRIES;
            self.entries.drain(..excess);
        }
    }

    /// Write this history's entries back into the shared store.
    pub fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut store = read_store(&self.path);
        store.insert(self.key.clone(), self.entries.clone());
        let text = serde_json::to_string(&store).map_err(io::Error::other)?;
        fs::write(&self.path, text)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(dir: &tempfile::TempDir) -> History {
        History::load_from(dir.path().join("history.json"), "files", Path::new("/tmp/project"))
    }

    #[test]
    fn add_then_cycle_surfaces_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = fresh(&dir);
        history.add("foo");
        history.filter("");
        assert_eq!(history.previous(), Some("foo"));
    }

    #[test]
    fn short_inputs_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = fresh(&dir);
        history.add("f");
        assert!(history.entries().is_empty());
    }

    #[test]
    fn add_dedups_to_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = fresh(&dir);
        history.add("foo");
        history.add("bar");
        history.add("foo");
        assert_eq!(history.entries(), ["bar", "foo"]);
    }

    #[test]
    fn previous_wraps_and_next_reverses() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = fresh(&dir);
        history.add("aa");
        history.add("bb");
        history.filter("");
        assert_eq!(history.previous(), Some("bb"));
        assert_eq!(history.previous(), Some("aa"));
        assert_eq!(history.previous(), Some("bb"));
        assert_eq!(history.next(), Some("aa"));
    }

    #[test]
    fn filter_narrows_by_prefix_or_fuzzy() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = fresh(&dir);
        history.add("foobar");
        history.add("xyz");
        history.filter("fb");
        assert_eq!(history.previous(), Some("foobar"));
        assert_eq!(history.previous(), Some("foobar"));
    }

    #[test]
    fn round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = fresh(&dir);
        history.add("persisted");
        history.save().unwrap();

        let mut reloaded = fresh(&dir);
        assert_eq!(reloaded.entries(), ["persisted"]);
        // other keys are untouched
        let other = History::load_from(
            dir.path().join("history.json"),
            "grep",
            Path::new("/tmp/project"),
        );
        assert!(other.entries().is_empty());
        reloaded.add("second");
        reloaded.save().unwrap();
        let again = fresh(&dir);
        assert_eq!(again.entries(), ["persisted", "second"]);
    }

    #[test]
    fn trims_to_bound() {
        let dir = tempfile::tempdir().unwrap();
        let mut history = fresh(&dir);
        for i in 0..(MAX_ENTRIES + 10) {
            history.add(&format!("entry-{i}"));
        }
        assert_eq!(history.entries().len(), MAX_ENTRIES);
        assert_eq!(history.entries()[0], "entry-10");
    }
}
