//! Selectable list items and their highlight spans.

use serde::{Deserialize, Serialize};

use crate::ansi;

/// Highlight group applied to matched characters.
pub const SEARCH_GROUP: &str = "SiftSearch";

/// Labels longer than this are cut before filtering; a longer label never
/// fits a list line anyway and only slows the matcher down.
pub const MAX_LABEL_LEN: usize = 1000;

/// A contiguous byte range of an item label, with an optional style group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
    pub group: Option<String>,
}

impl Highlight {
    pub fn new(start: usize, end: usize, group: impl Into<String>) -> Self {
        Self {
            start,
            end,
            group: Some(group.into()),
        }
    }
}

/// One selectable entry of a list.
///
/// Items are produced by a provider and normalized exactly once by the
/// worker (`convert_label`); after that only the worker mutates highlights
/// and only the session flips `resolved`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    /// Display text, a single line after normalization.
    pub label: String,
    /// Text used for matching; falls back to `label` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_text: Option<String>,
    /// Overrides lexical tie-breaking when sorting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_text: Option<String>,
    /// Opaque location reference for the provider's actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<serde_json::Value>,
    /// Opaque provider payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Set by the session once `resolve_item` enriched this entry.
    #[serde(default)]
    pub resolved: bool,
    /// Style spans: ANSI-derived plus the current search highlights.
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    /// Precomputed recency score used as a sort tie-breaker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_score: Option<f64>,
    /// Label normalization already happened.
    #[serde(skip)]
    pub converted: bool,
}

impl Item {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Text the matcher runs against.
    pub fn filter_label(&self) -> &str {
        match &self.filter_text {
            Some(text) if !text.is_empty() => text,
            _ => &self.label,
        }
    }

    /// Items with an explicitly empty `filter_text` opt out of matching
    /// entirely (separator rows and the like).
    pub fn filterable(&self) -> bool {
        self.filter_text.as_deref() != Some("")
    }

    /// Normalize the label in place: flatten embedded newlines, extract
    /// ANSI styling into highlight spans, cut over-long labels. Idempotent.
    pub fn convert_label(&mut self) {
        if self.converted {
            return;
        }
        if self.label.contains('\n') {
            self.label = self.label.replace("\r\n", " ").replace('\n', " ");
        }
        if self.label.contains('\x1b') {
            let parsed = ansi::parse_highlights(&self.label);
            self.label = parsed.text;
            if self.highlights.is_empty() {
                self.highlights = parsed.highlights;
            }
        }
        if self.label.chars().count() > MAX_LABEL_LEN {
            self.label = self.label.chars().take(MAX_LABEL_LEN).collect();
        }
        self.converted = true;
    }

    /// Drop previous search highlights, keeping ANSI ones.
    pub fn clear_search_highlights(&mut self) {
        self.highlights
            .retain(|h| h.group.as_deref() != Some(SEARCH_GROUP));
    }
}

/// Merge adjacent matched character indices into byte-range highlights
/// tagged with [`SEARCH_GROUP`]. `indices` must be sorted ascending.
pub fn spans_from_indices(text: &str, indices: &[usize]) -> Vec<Highlight> {
    if indices.is_empty() {
        return Vec::new();
    }
    // byte offset of every char, plus the total length as a sentinel
    let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    offsets.push(text.len());
    let valid = |i: usize| i + 1 < offsets.len();

    let mut spans = Vec::new();
    let mut start = indices[0];
    let mut prev = indices[0];
    for &idx in &indices[1..] {
        if idx == prev + 1 {
            prev = idx;
            continue;
        }
        if valid(prev) {
            spans.push(Highlight::new(offsets[start], offsets[prev + 1], SEARCH_GROUP));
        }
        start = idx;
        prev = idx;
    }
    if valid(prev) {
        spans.push(Highlight::new(offsets[start], offsets[prev + 1], SEARCH_GROUP));
    }
    spans
}
