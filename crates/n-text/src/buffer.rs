// SPDX-License-Identifier: MIT

//! Text buffer: a rope plus the marks that float on it.
//!
//! A `Buffer` wraps a [`ropey::Rope`] with char-offset editing and keeps
//! its [`MarkTable`] in sync with every mutation. Offsets count Unicode
//! scalar values; byte offsets never leak into the public API.
//!
//! Only `\n` terminates a line. A buffer ending in `\n` has a trailing
//! empty line, the same line model the modal engine expects.

use std::fs;
use std::io;
use std::path::Path;

use ropey::Rope;

use crate::error::{Result, SurfaceError};
use crate::marks::{Gravity, MarkId, MarkTable};

// ---------------------------------------------------------------------------
// Buffer
// ---------------------------------------------------------------------------

/// Rope-backed text with edit-tracking marks.
#[derive(Debug, Default)]
pub struct Buffer {
    rope: Rope,
    marks: MarkTable,
}

impl Buffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer from a string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            marks: MarkTable::new(),
        }
    }

    /// Load a buffer from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not UTF-8.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    // -- Text access --------------------------------------------------------

    /// The underlying rope.
    #[inline]
    #[must_use]
    pub const fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Total character count.
    #[inline]
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of lines; an empty buffer has one.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Character at `offset`, `'\0'` at or past the end.
    #[must_use]
    pub fn char_at(&self, offset: usize) -> char {
        self.rope.get_char(offset).unwrap_or('\0')
    }

    /// Text in `start..end`, clamped to the buffer.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> String {
        let len = self.len_chars();
        let (a, b) = (start.min(len), end.min(len));
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        self.rope.slice(a..b).to_string()
    }

    /// Whole contents as a `String`.
    #[must_use]
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    /// Line containing `offset` (clamped to the last line).
    #[must_use]
    pub fn line_of_offset(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.len_chars()))
    }

    /// Offset of the first char of `line` (clamped to the last line).
    #[must_use]
    pub fn line_start_offset(&self, line: usize) -> usize {
        let line = line.min(self.line_count().saturating_sub(1));
        self.rope.line_to_char(line)
    }

    /// Length of `line` in chars, excluding its `\n`.
    #[must_use]
    pub fn line_len(&self, line: usize) -> usize {
        if line >= self.line_count() {
            return 0;
        }
        let slice = self.rope.line(line);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    // -- Editing ------------------------------------------------------------

    /// Insert `text` at `at`, shifting marks.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::OutOfRange`] if `at` is past the end.
    pub fn insert(&mut self, at: usize, text: &str) -> Result<usize> {
        let len = self.len_chars();
        if at > len {
            return Err(SurfaceError::OutOfRange { start: at, end: at, len });
        }
        let count = text.chars().count();
        self.rope.insert(at, text);
        self.marks.adjust_insert(at, count);
        Ok(count)
    }

    /// Remove `start..end`, returning the removed text.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::OutOfRange`] if the range is inverted or past the end.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<String> {
        let len = self.len_chars();
        if start > end || end > len {
            return Err(SurfaceError::OutOfRange { start, end, len });
        }
        let removed = self.rope.slice(start..end).to_string();
        self.rope.remove(start..end);
        self.marks.adjust_delete(start, end);
        Ok(removed)
    }

    /// Replace the whole contents, collapsing marks to the new length.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.marks.clamp(self.rope.len_chars());
    }

    // -- Marks --------------------------------------------------------------

    /// Create a mark; the offset is clamped into the buffer.
    pub fn create_mark(&mut self, offset: usize, gravity: Gravity) -> MarkId {
        self.marks.create(offset.min(self.len_chars()), gravity)
    }

    pub fn move_mark(&mut self, id: MarkId, offset: usize) {
        let offset = offset.min(self.len_chars());
        self.marks.set(id, offset);
    }

    #[must_use]
    pub fn mark_offset(&self, id: MarkId) -> Option<usize> {
        self.marks.get(id)
    }

    pub fn delete_mark(&mut self, id: MarkId) {
        self.marks.remove(id);
    }

    /// The mark table, for inspection in tests.
    #[must_use]
    pub const fn marks(&self) -> &MarkTable {
        &self.marks
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_model_uses_lf_only() {
        let buf = Buffer::from_text("ab\ncd\n");
        assert_eq!(buf.line_count(), 3);
        assert_eq!(buf.line_len(0), 2);
        assert_eq!(buf.line_len(2), 0);
        assert_eq!(buf.line_start_offset(1), 3);
        assert_eq!(buf.line_of_offset(6), 2);
    }

    #[test]
    fn char_at_end_is_nul() {
        let buf = Buffer::from_text("a");
        assert_eq!(buf.char_at(0), 'a');
        assert_eq!(buf.char_at(1), '\0');
    }

    #[test]
    fn insert_and_delete_track_marks() {
        let mut buf = Buffer::from_text("hello world");
        let m = buf.create_mark(6, Gravity::Left);
        buf.insert(0, ">> ").unwrap();
        assert_eq!(buf.mark_offset(m), Some(9));
        let removed = buf.delete(0, 3).unwrap();
        assert_eq!(removed, ">> ");
        assert_eq!(buf.mark_offset(m), Some(6));
    }

    #[test]
    fn out_of_range_edits_fail() {
        let mut buf = Buffer::from_text("abc");
        assert!(buf.insert(4, "x").is_err());
        assert!(buf.delete(2, 9).is_err());
        assert!(buf.delete(2, 1).is_err());
        assert_eq!(buf.contents(), "abc");
    }

    #[test]
    fn slice_clamps_and_orders() {
        let buf = Buffer::from_text("abcdef");
        assert_eq!(buf.slice(4, 2), "cd");
        assert_eq!(buf.slice(4, 99), "ef");
    }
}
