//! Single-line text buffer with emacs-style editing

use super::input::Key;

/// Text plus a cursor measured in chars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
    cursor: usize,
}

/// What an editing key did to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Text changed
    Changed,
    /// Only the cursor moved
    Moved,
    /// Key is not an editing key
    Ignored,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

impl LineBuffer {
    /// Creates a buffer with the cursor at the end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let at = self.byte_index(self.cursor - 1);
        self.text.remove(at);
        self.cursor -= 1;
        true
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    /// Drops everything from the cursor to the end.
    pub fn kill_to_end(&mut self) {
        let at = self.byte_index(self.cursor);
        self.text.truncate(at);
    }

    /// Deletes the word before the cursor, skipping trailing separators first.
    pub fn delete_word_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }

        let chars: Vec<char> = self.text.chars().collect();
        let mut start = self.cursor;
        while start > 0 && !is_word_char(chars[start - 1]) {
            start -= 1;
        }
        while start > 0 && is_word_char(chars[start - 1]) {
            start -= 1;
        }

        let from = self.byte_index(start);
        let to = self.byte_index(self.cursor);
        self.text.replace_range(from..to, "");
        self.cursor = start;
        true
    }

    /// Applies a line-editing key. `accept` decides which chars may be typed.
    pub fn apply(&mut self, key: Key, accept: impl Fn(char) -> bool) -> Edit {
        match key {
            k if k.is_backspace() => {
                if self.backspace() {
                    Edit::Changed
                } else {
                    Edit::Moved
                }
            }
            Key::Ctrl('a') => {
                self.move_start();
                Edit::Moved
            }
            Key::Ctrl('e') => {
                self.move_end();
                Edit::Moved
            }
            Key::Ctrl('b') => {
                self.move_left();
                Edit::Moved
            }
            Key::Ctrl('f') => {
                self.move_right();
                Edit::Moved
            }
            Key::Ctrl('k') => {
                self.kill_to_end();
                Edit::Changed
            }
            Key::Ctrl('w') => {
                if self.delete_word_back() {
                    Edit::Changed
                } else {
                    Edit::Moved
                }
            }
            Key::Char(c) if accept(c) => {
                self.insert(c);
                Edit::Changed
            }
            _ => Edit::Ignored,
        }
    }
}
