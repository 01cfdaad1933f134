// SPDX-License-Identifier: MIT

//! The `TextSurface` trait: everything the modal engine may ask of a
//! document and its view.
//!
//! Positions are char offsets into the document; lines are terminated by
//! `\n` only. The cursor ("insert") and the selection bound behave like
//! right-gravity marks, so text inserted at the cursor ends up before it.
//!
//! Required methods cover storage, selection, undo grouping, marks, the
//! viewport and options. Everything else (search, indentation, case
//! changes, joining and sorting lines) has a default implementation in
//! terms of those primitives, which a richer host can override.

use std::time::Duration;

use unicode_width::UnicodeWidthChar;

use crate::error::{Result, SurfaceError};
use crate::marks::{Gravity, MarkId};
use crate::options::EditorOptions;
use crate::search::{self, SearchMatch, SearchSettings};
use crate::viewport::Viewport;

/// Case transformation for [`TextSurface::change_case`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseChange {
    Upper,
    Lower,
    Toggle,
    Title,
}

/// Which system clipboard a register maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clipboard {
    /// The regular clipboard (`"+`).
    Clipboard,
    /// The primary selection (`"*`).
    Primary,
}

/// A document plus view, as seen by the modal engine.
pub trait TextSurface {
    // ---------------------------------------------------------------------
    // Text
    // ---------------------------------------------------------------------

    /// Total number of chars.
    fn len_chars(&self) -> usize;

    /// Char at `offset`; `'\0'` at or past the end.
    fn char_at(&self, offset: usize) -> char;

    /// Text in `start..end` (clamped, order-insensitive).
    fn slice(&self, start: usize, end: usize) -> String;

    /// Number of lines; an empty document has one.
    fn line_count(&self) -> usize;

    /// Line containing `offset`.
    fn line_of_offset(&self, offset: usize) -> usize;

    /// Offset of the first char of `line`, clamped to the last line.
    fn line_start_offset(&self, line: usize) -> usize;

    /// Chars in `line`, not counting its `\n`.
    fn line_len(&self, line: usize) -> usize;

    /// Whole document text.
    fn text(&self) -> String {
        self.slice(0, self.len_chars())
    }

    /// Offset of the `\n` (or document end) that closes `line`.
    fn line_end_offset(&self, line: usize) -> usize {
        self.line_start_offset(line) + self.line_len(line)
    }

    // ---------------------------------------------------------------------
    // Cursor and selection
    // ---------------------------------------------------------------------

    /// Offset of the cursor (the insert mark).
    fn cursor(&self) -> usize;

    /// Offset of the other end of the selection.
    fn selection_bound(&self) -> usize;

    /// Place the cursor at `insert` and the selection bound at `bound`.
    fn select(&mut self, insert: usize, bound: usize);

    fn has_selection(&self) -> bool {
        self.cursor() != self.selection_bound()
    }

    /// Collapse the selection onto `offset`.
    fn place_cursor(&mut self, offset: usize) {
        self.select(offset, offset);
    }

    // ---------------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------------

    /// Insert `text` at `at`.
    fn insert(&mut self, at: usize, text: &str);

    /// Remove `start..end` (order-insensitive).
    fn delete(&mut self, start: usize, end: usize);

    /// Open an undo group. Groups nest; the outermost one counts.
    fn begin_user_action(&mut self);

    /// Close an undo group.
    fn end_user_action(&mut self);

    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
    fn undo(&mut self);
    fn redo(&mut self);

    /// False for read-only documents; editing commands then do nothing.
    fn is_editable(&self) -> bool {
        true
    }

    /// Overwrite (replace) mode flag of the view.
    fn overwrite(&self) -> bool;
    fn set_overwrite(&mut self, overwrite: bool);

    // ---------------------------------------------------------------------
    // Marks
    // ---------------------------------------------------------------------

    fn create_mark(&mut self, offset: usize, gravity: Gravity) -> MarkId;
    fn move_mark(&mut self, id: MarkId, offset: usize);
    /// `None` once the mark has been deleted.
    fn mark_offset(&self, id: MarkId) -> Option<usize>;
    fn delete_mark(&mut self, id: MarkId);

    // ---------------------------------------------------------------------
    // Search
    // ---------------------------------------------------------------------

    /// First match at or after `from`.
    ///
    /// # Errors
    ///
    /// Fails when the pattern does not compile.
    fn find_forward(&self, settings: &SearchSettings, from: usize) -> Result<Option<SearchMatch>> {
        if settings.pattern.is_empty() {
            return Ok(None);
        }
        let re = search::compile(settings)?;
        Ok(search::find_forward(&self.text(), &re, from, settings.wrap_around))
    }

    /// Last match at or before `from`.
    ///
    /// # Errors
    ///
    /// Fails when the pattern does not compile.
    fn find_backward(&self, settings: &SearchSettings, from: usize) -> Result<Option<SearchMatch>> {
        if settings.pattern.is_empty() {
            return Ok(None);
        }
        let re = search::compile(settings)?;
        Ok(search::find_backward(&self.text(), &re, from, settings.wrap_around))
    }

    /// Replace a match found with `settings`; returns the offset just
    /// past the inserted replacement.
    ///
    /// # Errors
    ///
    /// Fails when the pattern does not compile.
    fn replace_match(
        &mut self,
        settings: &SearchSettings,
        found: &SearchMatch,
        replacement: &str,
    ) -> Result<usize> {
        let re = search::compile(settings)?;
        let text = search::expand_replacement(&self.text(), &re, found.start, replacement, settings.regex);
        self.begin_user_action();
        self.delete(found.start, found.end);
        self.insert(found.start, &text);
        self.end_user_action();
        Ok(found.start + text.chars().count())
    }

    fn search_highlight(&self) -> bool;
    fn set_search_highlight(&mut self, highlight: bool);

    // ---------------------------------------------------------------------
    // Viewport
    // ---------------------------------------------------------------------

    fn viewport(&self) -> Viewport;

    /// Scroll so that `line` is the first visible line.
    fn set_top_line(&mut self, line: usize);

    /// Screen column of `offset` within its line, expanding tabs.
    fn visual_column(&self, offset: usize) -> usize {
        let tab = self.options().tab_width.max(1) as usize;
        let start = self.line_start_offset(self.line_of_offset(offset));
        let mut column = 0;
        for pos in start..offset {
            column += char_columns(self.char_at(pos), column, tab);
        }
        column
    }

    /// Offset on `line` covering screen column `column`, or the line end.
    fn offset_at_visual_column(&self, line: usize, column: usize) -> usize {
        let tab = self.options().tab_width.max(1) as usize;
        let end = self.line_end_offset(line);
        let mut pos = self.line_start_offset(line);
        let mut visual = 0;
        while pos < end {
            visual += char_columns(self.char_at(pos), visual, tab);
            if visual > column {
                break;
            }
            pos += 1;
        }
        pos
    }

    // ---------------------------------------------------------------------
    // Options
    // ---------------------------------------------------------------------

    fn options(&self) -> &EditorOptions;
    fn options_mut(&mut self) -> &mut EditorOptions;

    /// Switch the syntax language; false if the id is unknown.
    fn set_language(&mut self, id: &str) -> bool {
        self.options_mut().language = Some(id.to_string());
        true
    }

    /// Switch the style scheme; false if the id is unknown.
    fn set_style_scheme(&mut self, id: &str) -> bool {
        self.options_mut().style_scheme = Some(id.to_string());
        true
    }

    // ---------------------------------------------------------------------
    // Indentation
    // ---------------------------------------------------------------------

    /// Add one indentation level to every non-empty line in the range.
    /// A range ending at column 0 of a later line excludes that line.
    fn indent_lines(&mut self, start: usize, end: usize) {
        let (first, last) = line_span(self, start, end);
        let unit = self.options().indent_unit();

        self.begin_user_action();
        for line in first..=last {
            if self.line_len(line) == 0 {
                continue;
            }
            let mut at = self.line_start_offset(line);
            while self.char_at(at) == '\t' {
                at += 1;
            }
            self.insert(at, &unit);
        }
        self.end_user_action();
    }

    /// Remove up to one indentation level from every line in the range.
    fn unindent_lines(&mut self, start: usize, end: usize) {
        let (first, last) = line_span(self, start, end);
        let tab = self.options().tab_width.max(1) as usize;
        let width = self.options().real_indent_width() as usize;

        self.begin_user_action();
        for line in first..=last {
            let begin = self.line_start_offset(line);
            let line_end = self.line_end_offset(line);
            let mut pos = begin;
            let mut equiv = 0;
            while pos < line_end && equiv < width {
                match self.char_at(pos) {
                    '\t' => equiv += tab - equiv % tab,
                    ' ' => equiv += 1,
                    _ => break,
                }
                pos += 1;
            }
            if pos > begin {
                self.delete(begin, pos);
            }
        }
        self.end_user_action();
    }

    /// Indentation to insert after a newline typed at `offset`: the
    /// leading whitespace of that line, up to `offset`.
    fn new_line_indentation(&self, offset: usize) -> String {
        let start = self.line_start_offset(self.line_of_offset(offset));
        let mut indent = String::new();
        for pos in start..offset {
            match self.char_at(pos) {
                ch @ (' ' | '\t') => indent.push(ch),
                _ => break,
            }
        }
        indent
    }

    /// Give `line` the indentation of the nearest non-blank line above it.
    /// Blank lines are left alone.
    fn reindent_line(&mut self, line: usize) {
        let blank = |s: &Self, l: usize| {
            let start = s.line_start_offset(l);
            (start..s.line_end_offset(l)).all(|pos| s.char_at(pos).is_whitespace())
        };

        if blank(&*self, line) {
            return;
        }
        let indent = (0..line)
            .rev()
            .find(|&l| !blank(&*self, l))
            .map(|l| self.new_line_indentation(self.line_end_offset(l)))
            .unwrap_or_default();

        let begin = self.line_start_offset(line);
        let mut pos = begin;
        while matches!(self.char_at(pos), ' ' | '\t') {
            pos += 1;
        }
        if self.slice(begin, pos) != indent {
            self.begin_user_action();
            self.delete(begin, pos);
            self.insert(begin, &indent);
            self.end_user_action();
        }
    }

    // ---------------------------------------------------------------------
    // Text transforms
    // ---------------------------------------------------------------------

    /// Rewrite `start..end` with its case changed. Returns the new span.
    fn change_case(&mut self, start: usize, end: usize, case: CaseChange) -> (usize, usize) {
        let (start, end) = (start.min(end), start.max(end));
        let old = self.slice(start, end);
        let new = convert_case(&old, case);
        if new != old {
            self.begin_user_action();
            self.delete(start, end);
            self.insert(start, &new);
            self.end_user_action();
        }
        (start, start + new.chars().count())
    }

    /// Join the lines spanned by `start..end`: each line break and the
    /// indentation after it collapse into a single space (none before a
    /// blank line), trailing whitespace is trimmed.
    fn join_lines(&mut self, start: usize, end: usize) {
        let (start, end) = (start.min(end), start.max(end));
        let end_mark = self.create_mark(end, Gravity::Right);

        self.begin_user_action();
        let mut pos = line_text_end(self, start);
        let mut end = self.line_end_offset(self.line_of_offset(end));

        while pos < end {
            let len = self.len_chars();
            let mut scan = pos;
            while scan < len && self.char_at(scan).is_whitespace() {
                scan += 1;
                if scan >= end {
                    break;
                }
            }

            if scan >= len {
                break;
            }
            self.delete(pos, scan);
            let line = self.line_of_offset(pos);
            if pos != self.line_end_offset(line) {
                self.insert(pos, " ");
            }

            pos = line_text_end(self, pos);
            end = self.mark_offset(end_mark).unwrap_or(pos);
        }
        self.end_user_action();
        self.delete_mark(end_mark);
    }

    /// Sort the lines spanned by `start..end` by plain string order.
    fn sort_lines(&mut self, start: usize, end: usize) {
        let (start, end) = (start.min(end), start.max(end));
        let first = self.line_of_offset(start);
        let mut last = self.line_of_offset(end);
        let end_at_line_start = self.line_start_offset(last) == end;

        if end_at_line_start {
            last = first.max(last.saturating_sub(1));
        }
        if first == last {
            return;
        }

        let mut lines: Vec<String> = (first..=last)
            .map(|l| self.slice(self.line_start_offset(l), self.line_end_offset(l)))
            .collect();
        lines.sort();

        let begin = self.line_start_offset(first);
        let had_newline = last + 1 < self.line_count();
        let stop = if had_newline {
            self.line_start_offset(last + 1)
        } else {
            self.len_chars()
        };

        let mut replacement = lines.join("\n");
        if had_newline {
            replacement.push('\n');
        }

        self.begin_user_action();
        self.delete(begin, stop);
        self.insert(begin, &replacement);
        self.end_user_action();
    }

    // ---------------------------------------------------------------------
    // Clipboard
    // ---------------------------------------------------------------------

    /// Read a system clipboard, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::ClipboardUnavailable`] by default; hosts report
    /// [`SurfaceError::ClipboardTimeout`] when the owner does not answer.
    fn read_clipboard(&mut self, which: Clipboard, timeout: Duration) -> Result<Option<String>> {
        let _ = (which, timeout);
        Err(SurfaceError::ClipboardUnavailable)
    }

    /// Publish text to a system clipboard.
    fn write_clipboard(&mut self, which: Clipboard, text: &str) {
        let _ = (which, text);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Screen columns taken by `ch` when drawn at `column`.
fn char_columns(ch: char, column: usize, tab: usize) -> usize {
    if ch == '\t' {
        tab - column % tab
    } else {
        ch.width().unwrap_or(1)
    }
}

/// First and last line touched by `start..end`, where an `end` sitting at
/// the start of a later line does not count that line.
fn line_span<S: TextSurface + ?Sized>(surface: &S, start: usize, end: usize) -> (usize, usize) {
    let (start, end) = (start.min(end), start.max(end));
    let first = surface.line_of_offset(start);
    let mut last = surface.line_of_offset(end);
    if last > first && surface.line_start_offset(last) == end {
        last -= 1;
    }
    (first, last)
}

/// End of the text on the line holding `offset`, before trailing blanks.
fn line_text_end<S: TextSurface + ?Sized>(surface: &S, offset: usize) -> usize {
    let line = surface.line_of_offset(offset);
    let start = surface.line_start_offset(line);
    let mut pos = surface.line_end_offset(line);
    while pos > start && surface.char_at(pos - 1).is_whitespace() {
        pos -= 1;
    }
    pos
}

/// Apply a [`CaseChange`] to a string.
#[must_use]
pub fn convert_case(text: &str, case: CaseChange) -> String {
    match case {
        CaseChange::Upper => text.to_uppercase(),
        CaseChange::Lower => text.to_lowercase(),
        CaseChange::Toggle => text
            .chars()
            .flat_map(|c| {
                if c.is_lowercase() {
                    c.to_uppercase().collect::<Vec<_>>()
                } else if c.is_uppercase() {
                    c.to_lowercase().collect()
                } else {
                    vec![c]
                }
            })
            .collect(),
        CaseChange::Title => {
            let mut out = String::with_capacity(text.len());
            let mut at_word_start = true;
            for c in text.chars() {
                if c.is_alphanumeric() {
                    if at_word_start {
                        out.extend(c.to_uppercase());
                    } else {
                        out.extend(c.to_lowercase());
                    }
                    at_word_start = false;
                } else {
                    out.push(c);
                    at_word_start = true;
                }
            }
            out
        }
    }
}
