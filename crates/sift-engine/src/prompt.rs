//! Prompt line state: text buffer, character cursor, input mode.
//!
//! Mutators return whether the text changed; the session reacts by
//! re-filtering or reloading. The cursor is a character offset and every
//! operation leaves it within `[0, len]`.

use sift_core::options::InputMode;

#[derive(Debug)]
pub struct Prompt {
    buffer: String,
    cursor: usize,
    mode: InputMode,
}

impl Prompt {
    pub fn new(mode: InputMode) -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            mode,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Display-only, raises no input change.
    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_at(&self, char_offset: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_offset)
            .map(|(i, _)| i)
            .unwrap_or(self.buffer.len())
    }

    /// Replace the whole text, cursor to the end.
    pub fn set_text(&mut self, text: &str) -> bool {
        let changed = self.buffer != text;
        self.buffer = text.to_string();
        self.cursor = self.len();
        changed
    }

    pub fn insert(&mut self, ch: char) -> bool {
        let at = self.byte_at(self.cursor);
        self.buffer.insert(at, ch);
        self.cursor += 1;
        true
    }

    pub fn delete_backward(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let start = self.byte_at(self.cursor - 1);
        let end = self.byte_at(self.cursor);
        self.buffer.replace_range(start..end, "");
        self.cursor -= 1;
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        let start = self.byte_at(self.cursor);
        let end = self.byte_at(self.cursor + 1);
        self.buffer.replace_range(start..end, "");
        true
    }

    /// Delete from cursor to end of line.
    pub fn remove_tail(&mut self) -> bool {
        let at = self.byte_at(self.cursor);
        if at >= self.buffer.len() {
            return false;
        }
        self.buffer.truncate(at);
        true
    }

    /// Delete from start of line to cursor.
    pub fn remove_ahead(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let at = self.byte_at(self.cursor);
        self.buffer.replace_range(..at, "");
        self.cursor = 0;
        true
    }

    /// Delete the word before the cursor, plus any trailing spaces.
    pub fn remove_word(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let chars: Vec<char> = self.buffer.chars().collect();
        let mut new_cursor = self.cursor;
        while new_cursor > 0 && chars[new_cursor - 1].is_whitespace() {
            new_cursor -= 1;
        }
        while new_cursor > 0 && !chars[new_cursor - 1].is_whitespace() {
            new_cursor -= 1;
        }
        let start = self.byte_at(new_cursor);
        let end = self.byte_at(self.cursor);
        self.buffer.replace_range(start..end, "");
        self.cursor = new_cursor;
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.len();
    }
}
