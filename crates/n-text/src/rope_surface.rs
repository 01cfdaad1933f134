// SPDX-License-Identifier: MIT

//! `RopeSurface`: a headless [`TextSurface`] over a [`Buffer`].
//!
//! Used by the driver binary and by every engine test. Edits go through
//! the buffer (so marks follow them) and are recorded in a [`History`];
//! the cursor and selection bound are right-gravity marks. Clipboards
//! are plain in-memory strings.

use std::time::Duration;

use crate::buffer::Buffer;
use crate::error::Result;
use crate::history::History;
use crate::marks::{Gravity, MarkId};
use crate::options::EditorOptions;
use crate::surface::{Clipboard, TextSurface};
use crate::viewport::Viewport;

/// In-memory document plus view state.
#[derive(Debug)]
pub struct RopeSurface {
    buffer: Buffer,
    history: History,
    insert: MarkId,
    bound: MarkId,
    overwrite: bool,
    editable: bool,
    highlight: bool,
    viewport: Viewport,
    options: EditorOptions,
    clipboard: Option<String>,
    primary: Option<String>,
}

impl Default for RopeSurface {
    fn default() -> Self {
        Self::from_buffer(Buffer::new())
    }
}

impl RopeSurface {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self::from_buffer(Buffer::from_text(text))
    }

    /// Wrap an existing buffer; the cursor starts at offset 0.
    #[must_use]
    pub fn from_buffer(mut buffer: Buffer) -> Self {
        let insert = buffer.create_mark(0, Gravity::Right);
        let bound = buffer.create_mark(0, Gravity::Right);
        Self {
            buffer,
            history: History::new(),
            insert,
            bound,
            overwrite: false,
            editable: true,
            highlight: false,
            viewport: Viewport::default(),
            options: EditorOptions::default(),
            clipboard: None,
            primary: None,
        }
    }

    /// Builder-style viewport height.
    #[must_use]
    pub fn with_height(mut self, height: usize) -> Self {
        self.viewport = Viewport::new(self.viewport.top_line, height);
        self
    }

    #[must_use]
    pub const fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub const fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Replace the whole text. Not undoable; the cursor goes to 0.
    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.history = History::new();
        self.select(0, 0);
    }
}

impl TextSurface for RopeSurface {
    // -- Text ---------------------------------------------------------------

    fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    fn char_at(&self, offset: usize) -> char {
        self.buffer.char_at(offset)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.buffer.slice(start, end)
    }

    fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    fn line_of_offset(&self, offset: usize) -> usize {
        self.buffer.line_of_offset(offset)
    }

    fn line_start_offset(&self, line: usize) -> usize {
        self.buffer.line_start_offset(line)
    }

    fn line_len(&self, line: usize) -> usize {
        self.buffer.line_len(line)
    }

    fn text(&self) -> String {
        self.buffer.contents()
    }

    // -- Cursor -------------------------------------------------------------

    fn cursor(&self) -> usize {
        self.buffer.mark_offset(self.insert).unwrap_or(0)
    }

    fn selection_bound(&self) -> usize {
        self.buffer.mark_offset(self.bound).unwrap_or(0)
    }

    fn select(&mut self, insert: usize, bound: usize) {
        self.buffer.move_mark(self.insert, insert);
        self.buffer.move_mark(self.bound, bound);
    }

    // -- Editing ------------------------------------------------------------

    fn insert(&mut self, at: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.buffer.insert(at, text) {
            Ok(_) => {
                let cursor = self.cursor();
                self.history.record_insert(at, text, cursor);
            }
            Err(err) => tracing::warn!(%err, "insert rejected"),
        }
    }

    fn delete(&mut self, start: usize, end: usize) {
        let (start, end) = (start.min(end), start.max(end).min(self.len_chars()));
        if start >= end {
            return;
        }
        match self.buffer.delete(start, end) {
            Ok(removed) => {
                let cursor = self.cursor();
                self.history.record_delete(start, &removed, cursor);
            }
            Err(err) => tracing::warn!(%err, "delete rejected"),
        }
    }

    fn begin_user_action(&mut self) {
        let cursor = self.cursor();
        self.history.begin(cursor);
    }

    fn end_user_action(&mut self) {
        let cursor = self.cursor();
        self.history.end(cursor);
    }

    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) {
        if let Some(cursor) = self.history.undo(&mut self.buffer) {
            self.place_cursor(cursor.min(self.len_chars()));
        }
    }

    fn redo(&mut self) {
        if let Some(cursor) = self.history.redo(&mut self.buffer) {
            self.place_cursor(cursor.min(self.len_chars()));
        }
    }

    fn is_editable(&self) -> bool {
        self.editable
    }

    fn overwrite(&self) -> bool {
        self.overwrite
    }

    fn set_overwrite(&mut self, overwrite: bool) {
        self.overwrite = overwrite;
    }

    // -- Marks --------------------------------------------------------------

    fn create_mark(&mut self, offset: usize, gravity: Gravity) -> MarkId {
        self.buffer.create_mark(offset, gravity)
    }

    fn move_mark(&mut self, id: MarkId, offset: usize) {
        self.buffer.move_mark(id, offset);
    }

    fn mark_offset(&self, id: MarkId) -> Option<usize> {
        self.buffer.mark_offset(id)
    }

    fn delete_mark(&mut self, id: MarkId) {
        if id != self.insert && id != self.bound {
            self.buffer.delete_mark(id);
        }
    }

    // -- Search and view ----------------------------------------------------

    fn search_highlight(&self) -> bool {
        self.highlight
    }

    fn set_search_highlight(&mut self, highlight: bool) {
        self.highlight = highlight;
    }

    fn viewport(&self) -> Viewport {
        self.viewport.clamped(self.line_count())
    }

    fn set_top_line(&mut self, line: usize) {
        let top = line.min(self.line_count().saturating_sub(1));
        self.viewport = Viewport::new(top, self.viewport.height);
    }

    fn options(&self) -> &EditorOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut EditorOptions {
        &mut self.options
    }

    // -- Clipboard ----------------------------------------------------------

    fn read_clipboard(&mut self, which: Clipboard, _timeout: Duration) -> Result<Option<String>> {
        Ok(match which {
            Clipboard::Clipboard => self.clipboard.clone(),
            Clipboard::Primary => self.primary.clone(),
        })
    }

    fn write_clipboard(&mut self, which: Clipboard, text: &str) {
        let slot = match which {
            Clipboard::Clipboard => &mut self.clipboard,
            Clipboard::Primary => &mut self.primary,
        };
        *slot = Some(text.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::search::SearchSettings;
    use crate::surface::CaseChange;

    fn surface(text: &str) -> RopeSurface {
        RopeSurface::new(text)
    }

    // -- Cursor and marks ---------------------------------------------------

    #[test]
    fn cursor_has_right_gravity() {
        let mut s = surface("abc");
        s.place_cursor(1);
        s.insert(1, "XY");
        assert_eq!(s.cursor(), 3);
        assert_eq!(s.text(), "aXYbc");
    }

    #[test]
    fn selection_tracks_both_ends() {
        let mut s = surface("hello");
        s.select(4, 1);
        assert!(s.has_selection());
        assert_eq!((s.cursor(), s.selection_bound()), (4, 1));
        s.place_cursor(2);
        assert!(!s.has_selection());
    }

    // -- Undo grouping ------------------------------------------------------

    #[test]
    fn user_action_undoes_as_one() {
        let mut s = surface("one");
        s.begin_user_action();
        s.insert(3, " two");
        s.delete(0, 1);
        s.end_user_action();
        assert_eq!(s.text(), "ne two");
        s.undo();
        assert_eq!(s.text(), "one");
        assert!(s.can_redo());
        s.redo();
        assert_eq!(s.text(), "ne two");
    }

    // -- Visual columns -----------------------------------------------------

    #[test]
    fn visual_column_expands_tabs() {
        let mut s = surface("\tab\n  x");
        s.options_mut().set_tab_width(4);
        assert_eq!(s.visual_column(1), 4);
        assert_eq!(s.visual_column(2), 5);
        assert_eq!(s.offset_at_visual_column(0, 2), 0);
        assert_eq!(s.offset_at_visual_column(0, 5), 2);
        assert_eq!(s.offset_at_visual_column(0, 40), 3);
    }

    #[test]
    fn wide_chars_take_two_columns() {
        let s = surface("漢字x");
        assert_eq!(s.visual_column(2), 4);
        assert_eq!(s.offset_at_visual_column(0, 3), 1);
    }

    // -- Indentation --------------------------------------------------------

    #[test]
    fn indent_skips_blank_lines() {
        let mut s = surface("a\n\nb\nc");
        s.options_mut().insert_spaces = true;
        s.options_mut().set_indent_width(2);
        // Ending at the start of "c" leaves that line alone.
        s.indent_lines(0, 5);
        assert_eq!(s.text(), "  a\n\n  b\nc");
    }

    #[test]
    fn unindent_counts_tab_stops() {
        let mut s = surface("\t\tx\n   y");
        s.options_mut().set_tab_width(4);
        s.unindent_lines(0, s.len_chars());
        assert_eq!(s.text(), "\tx\ny");
    }

    #[test]
    fn reindent_copies_previous_nonblank_line() {
        let mut s = surface("    a\n\n b");
        s.reindent_line(2);
        assert_eq!(s.text(), "    a\n\n    b");
    }

    #[test]
    fn new_line_indentation_stops_at_offset() {
        let s = surface("\t  foo");
        assert_eq!(s.new_line_indentation(6), "\t  ");
        assert_eq!(s.new_line_indentation(2), "\t ");
    }

    // -- Transforms ---------------------------------------------------------

    #[test]
    fn change_case_variants() {
        let mut s = surface("hello World");
        assert_eq!(s.change_case(0, 5, CaseChange::Upper), (0, 5));
        assert_eq!(s.text(), "HELLO World");
        s.change_case(0, 11, CaseChange::Toggle);
        assert_eq!(s.text(), "hello wORLD");
        s.change_case(0, 11, CaseChange::Title);
        assert_eq!(s.text(), "Hello World");
    }

    #[test]
    fn join_two_lines_with_indent() {
        let mut s = surface("foo  \n    bar\nbaz");
        s.join_lines(0, 6);
        assert_eq!(s.text(), "foo bar\nbaz");
    }

    #[test]
    fn join_before_blank_line_adds_no_space() {
        let mut s = surface("foo\n\nbar");
        s.join_lines(0, 4);
        assert_eq!(s.text(), "foo\nbar");
    }

    #[test]
    fn join_is_one_undo_step() {
        let mut s = surface("a\nb\nc");
        s.join_lines(0, 4);
        assert_eq!(s.text(), "a b c");
        s.undo();
        assert_eq!(s.text(), "a\nb\nc");
    }

    #[test]
    fn sort_lines_in_range() {
        let mut s = surface("c\nb\na\nz");
        s.sort_lines(0, 5);
        assert_eq!(s.text(), "a\nb\nc\nz");
    }

    #[test]
    fn sort_range_ending_at_line_start_excludes_it() {
        let mut s = surface("b\na\n0");
        s.sort_lines(0, 4);
        assert_eq!(s.text(), "a\nb\n0");
    }

    #[test]
    fn sort_last_line_keeps_missing_newline() {
        let mut s = surface("y\nx");
        s.sort_lines(0, 3);
        assert_eq!(s.text(), "x\ny");
    }

    // -- Search -------------------------------------------------------------

    #[test]
    fn default_search_and_replace() {
        let mut s = surface("cat hat cat");
        let settings = SearchSettings {
            pattern: "(c)at".into(),
            ..SearchSettings::default()
        };
        let m = s.find_forward(&settings, 1).unwrap().unwrap();
        assert_eq!((m.start, m.end), (8, 11));
        let end = s.replace_match(&settings, &m, r"\1ow").unwrap();
        assert_eq!(s.text(), "cat hat cow");
        assert_eq!(end, 11);
        let back = s.find_backward(&settings, 7).unwrap().unwrap();
        assert_eq!(back.start, 0);
    }

    #[test]
    fn empty_pattern_finds_nothing() {
        let s = surface("abc");
        assert!(s.find_forward(&SearchSettings::default(), 0).unwrap().is_none());
    }

    // -- Viewport and clipboard ---------------------------------------------

    #[test]
    fn top_line_is_clamped() {
        let mut s = surface("a\nb\nc").with_height(2);
        s.set_top_line(10);
        assert_eq!(s.viewport().top_line, 2);
    }

    #[test]
    fn clipboards_are_separate() {
        let mut s = surface("");
        s.write_clipboard(Clipboard::Primary, "sel");
        let timeout = Duration::from_millis(10);
        assert_eq!(s.read_clipboard(Clipboard::Primary, timeout).unwrap(), Some("sel".into()));
        assert_eq!(s.read_clipboard(Clipboard::Clipboard, timeout).unwrap(), None);
    }
}
