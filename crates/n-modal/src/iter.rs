// SPDX-License-Identifier: MIT

//! Cursor-like iteration over a [`TextSurface`].
//!
//! [`TextIter`] is a borrowed surface plus a char offset with the stepping
//! rules every motion and text object is written against:
//!
//! - `forward_char` refuses to move at the end and reports `false` when
//!   the step lands on the end, so the end position is reachable but never
//!   "dereferenced";
//! - `ends_line` holds on a `\n` and at the end of the document;
//! - line stepping snaps to line starts.
//!
//! The free functions below are the Vim-flavoured scans built on top:
//! word classes, sentences, paragraphs, bracket blocks and quotes.

use n_text::TextSurface;

// ---------------------------------------------------------------------------
// TextIter
// ---------------------------------------------------------------------------

/// A position in a surface.
pub struct TextIter<'a, S: ?Sized> {
    surface: &'a S,
    offset: usize,
}

impl<S: ?Sized> Clone for TextIter<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for TextIter<'_, S> {}

impl<S: ?Sized> std::fmt::Debug for TextIter<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TextIter").field(&self.offset).finish()
    }
}

impl<'a, S: TextSurface + ?Sized> TextIter<'a, S> {
    /// Iterator at `offset`, clamped to the document.
    pub fn new(surface: &'a S, offset: usize) -> Self {
        Self {
            surface,
            offset: offset.min(surface.len_chars()),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset.min(self.surface.len_chars());
    }

    pub const fn surface(&self) -> &'a S {
        self.surface
    }

    /// Char under the iterator; `'\0'` at the end.
    #[must_use]
    pub fn char(&self) -> char {
        self.surface.char_at(self.offset)
    }

    #[must_use]
    pub fn is_space(&self) -> bool {
        self.char().is_whitespace()
    }

    #[must_use]
    pub const fn is_start(&self) -> bool {
        self.offset == 0
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.offset >= self.surface.len_chars()
    }

    #[must_use]
    pub fn starts_line(&self) -> bool {
        self.offset == 0 || self.surface.char_at(self.offset - 1) == '\n'
    }

    #[must_use]
    pub fn ends_line(&self) -> bool {
        self.is_end() || self.char() == '\n'
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.surface.line_of_offset(self.offset)
    }

    /// Chars between the line start and the iterator.
    #[must_use]
    pub fn line_offset(&self) -> usize {
        self.offset - self.surface.line_start_offset(self.line())
    }

    /// Move to the start of the current line.
    pub fn set_line_start(&mut self) {
        self.offset = self.surface.line_start_offset(self.line());
    }

    /// Move to the start of `line`, clamped to the last line.
    pub fn set_line(&mut self, line: usize) {
        self.offset = self.surface.line_start_offset(line);
    }

    /// Step one char forward. False if already at the end or if the step
    /// landed on the end.
    pub fn forward_char(&mut self) -> bool {
        let len = self.surface.len_chars();
        if self.offset >= len {
            return false;
        }
        self.offset += 1;
        self.offset < len
    }

    /// Step one char back. False at the start.
    pub fn backward_char(&mut self) -> bool {
        if self.offset == 0 {
            return false;
        }
        self.offset -= 1;
        true
    }

    /// Start of the next line. On the last line, go to the end and
    /// return false.
    pub fn forward_line(&mut self) -> bool {
        let line = self.line();
        if line + 1 < self.surface.line_count() {
            self.offset = self.surface.line_start_offset(line + 1);
            !self.is_end()
        } else {
            self.offset = self.surface.len_chars();
            false
        }
    }

    /// Start of the previous line. On the first line, snap to its start
    /// and report whether that moved.
    pub fn backward_line(&mut self) -> bool {
        if self.offset == 0 {
            return false;
        }
        let line = self.line();
        self.offset = self.surface.line_start_offset(line.saturating_sub(1));
        true
    }

    /// To the `\n` closing this line; already there, the one closing the
    /// next line. False when the result is the end.
    pub fn forward_to_line_end(&mut self) -> bool {
        let end = self.surface.line_end_offset(self.line());
        if self.offset < end {
            self.offset = end;
            return !self.is_end();
        }
        if self.forward_line() {
            if !self.ends_line() {
                self.forward_to_line_end();
            }
            !self.is_end()
        } else {
            false
        }
    }

    /// Step forward until `pred` accepts the char under the iterator. The
    /// end is never tested.
    pub fn forward_find_char(&mut self, mut pred: impl FnMut(char) -> bool, limit: Option<usize>) -> bool {
        while limit != Some(self.offset) && self.forward_char() {
            if pred(self.char()) {
                return true;
            }
        }
        false
    }

    /// Step backward until `pred` accepts the char under the iterator.
    pub fn backward_find_char(&mut self, mut pred: impl FnMut(char) -> bool, limit: Option<usize>) -> bool {
        while limit != Some(self.offset) && self.backward_char() {
            if pred(self.char()) {
                return true;
            }
        }
        false
    }

    /// Skip blanks forward without leaving the line.
    pub fn skip_blanks(&mut self) {
        while !self.ends_line() && self.is_space() {
            if !self.forward_char() {
                break;
            }
        }
    }
}

/// A line holding nothing but its `\n` (or the empty last line).
pub fn line_is_empty<S: TextSurface + ?Sized>(it: &TextIter<'_, S>) -> bool {
    it.starts_line() && it.ends_line()
}

// ---------------------------------------------------------------------------
// Words
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Unset,
    Newline,
    Space,
    Special,
    Word,
}

/// `word` splits keyword chars from punctuation; `WORD` only splits on
/// whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    Word,
    BigWord,
}

const fn char_class(ch: char) -> Class {
    match ch {
        ' ' | '\t' | '\n' => Class::Space,
        '"' | '\'' | '(' | ')' | '{' | '}' | '[' | ']' | '<' | '>' | '-' | '+' | '*' | '/' | '!' | '@'
        | '#' | '$' | '%' | '^' | '&' | ':' | ';' | '?' | '|' | '=' | '\\' | '.' | ',' => Class::Special,
        _ => Class::Word,
    }
}

/// Class of the char under `it`; an empty line is a class of its own so
/// word motions stop on it.
fn classify<S: TextSurface + ?Sized>(it: &TextIter<'_, S>, kind: WordKind) -> Class {
    if line_is_empty(it) {
        return Class::Newline;
    }
    let ch = it.char();
    match kind {
        WordKind::Word => char_class(ch),
        WordKind::BigWord if ch.is_whitespace() => Class::Space,
        WordKind::BigWord => Class::Word,
    }
}

/// `w` / `W`.
pub fn forward_word_start<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>, kind: WordKind) -> bool {
    let mut begin = classify(it, kind);

    if begin == Class::Space {
        loop {
            if !it.forward_char() {
                return false;
            }
            if classify(it, kind) != Class::Space {
                return true;
            }
        }
    }

    while it.forward_char() {
        let cur = classify(it, kind);
        if cur == Class::Space {
            begin = Class::Unset;
            continue;
        }
        if cur != begin || cur == Class::Newline {
            return true;
        }
    }
    false
}

/// `e` / `E`.
pub fn forward_word_end<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>, kind: WordKind) -> bool {
    if !it.forward_char() {
        return false;
    }

    if classify(it, kind) == Class::Space && !forward_word_start(it, kind) {
        return false;
    }

    let begin = classify(it, kind);
    if begin == Class::Newline {
        it.backward_char();
        return true;
    }

    loop {
        if !it.forward_char() {
            return false;
        }
        let cur = classify(it, kind);
        if cur != begin || cur == Class::Newline {
            it.backward_char();
            return true;
        }
    }
}

/// `ge` / `gE`.
pub fn backward_word_end<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>, kind: WordKind) -> bool {
    let mut begin = classify(it, kind);

    if begin == Class::Newline {
        it.forward_char();
        return true;
    }

    loop {
        if !it.backward_char() {
            return false;
        }
        let cur = classify(it, kind);
        if cur == Class::Newline {
            it.forward_char();
            return true;
        }
        if cur == Class::Space {
            begin = Class::Space;
        }
        if cur != begin && cur != Class::Space {
            return true;
        }
    }
}

/// `b` / `B`.
pub fn backward_word_start<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>, kind: WordKind) -> bool {
    if !it.backward_char() {
        return false;
    }

    if classify(it, kind) == Class::Space && !backward_word_end(it, kind) {
        return false;
    }

    let begin = classify(it, kind);
    loop {
        if !it.backward_char() {
            return false;
        }
        let cur = classify(it, kind);
        if cur != begin || cur == Class::Newline {
            it.forward_char();
            return true;
        }
    }
}

/// True on the first char of a word. A blank line counts as a word.
pub fn starts_word<S: TextSurface + ?Sized>(it: &TextIter<'_, S>, kind: WordKind) -> bool {
    if it.starts_line() {
        return it.ends_line() || !it.is_space();
    }
    if it.ends_line() || it.is_space() {
        return false;
    }
    let mut prev = *it;
    prev.backward_char();
    match kind {
        WordKind::Word => char_class(it.char()) != char_class(prev.char()),
        WordKind::BigWord => prev.is_space(),
    }
}

/// True on the last char of a word. A blank line counts as a word.
pub fn ends_word<S: TextSurface + ?Sized>(it: &TextIter<'_, S>, kind: WordKind) -> bool {
    if it.ends_line() {
        return it.starts_line();
    }
    if it.is_space() {
        return false;
    }
    let mut next = *it;
    let more = next.forward_char();
    match kind {
        WordKind::Word => char_class(it.char()) != char_class(next.char()),
        WordKind::BigWord => !more || next.is_space(),
    }
}

// ---------------------------------------------------------------------------
// Sentences
// ---------------------------------------------------------------------------

const fn ends_sentence_char(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

const fn can_trail_sentence(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '\'' | '"' | ')' | ']')
}

/// Walk off the sentence punctuation, then over the blanks after it.
/// False if the end was reached first.
fn skip_sentence_gap<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) -> bool {
    while !it.is_space() {
        if !it.forward_char() {
            return false;
        }
    }
    while it.is_space() {
        if !it.forward_char() {
            return false;
        }
    }
    true
}

/// `)`: start of the next sentence. A paragraph break (two newlines in
/// a row) also ends a sentence.
pub fn forward_sentence_start<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) -> bool {
    let before = it.offset();
    let mut newlines = 0;

    let found = if matches!(it.char(), '.' | '!' | '?' | '\n') {
        skip_sentence_gap(it)
    } else {
        let mut found = false;
        while it.forward_char() {
            match it.char() {
                '\n' => {
                    newlines += 1;
                    if newlines > 1 {
                        found = skip_sentence_gap(it);
                        break;
                    }
                }
                '.' | '!' | '?' => {
                    found = skip_sentence_gap(it);
                    break;
                }
                _ => {}
            }
        }
        found
    };

    if found {
        return true;
    }
    if it.is_end() && !it.starts_line() {
        it.backward_char();
    }
    it.offset() != before
}

/// Back to the punctuation that closed the previous sentence.
fn backward_sentence_end<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) -> bool {
    let before = it.offset();

    if line_is_empty(it) {
        while it.backward_char() {
            if !it.is_space() {
                break;
            }
        }
    } else {
        while it.backward_char() {
            match it.char() {
                '.' | '!' | '?' => break,
                '\n' if it.starts_line() => {
                    while it.backward_char() {
                        if !it.is_space() {
                            break;
                        }
                    }
                    break;
                }
                _ => {}
            }
        }
    }

    if it.is_end() && !it.starts_line() {
        it.backward_char();
    }
    it.offset() != before
}

/// `(`: the closest earlier sentence or paragraph start, else the start
/// of the document.
pub fn backward_sentence_start<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) -> bool {
    let origin = *it;

    let mut para = origin;
    backward_paragraph_start(&mut para);

    let mut sentence = origin;
    backward_sentence_end(&mut sentence);
    forward_sentence_start(&mut sentence);

    let mut two = origin;
    backward_sentence_end(&mut two);
    backward_sentence_end(&mut two);
    forward_sentence_start(&mut two);

    let winner = [para, sentence, two]
        .into_iter()
        .filter(|c| c.offset() < origin.offset())
        .min_by_key(|c| origin.offset() - c.offset());

    it.set_offset(winner.map_or(0, |w| w.offset()));
    it.offset() != origin.offset()
}

/// On the last char of a sentence, trailing quotes and brackets included.
pub fn ends_sentence<S: TextSurface + ?Sized>(it: &TextIter<'_, S>) -> bool {
    if !can_trail_sentence(it.char()) {
        return false;
    }

    let mut next = *it;
    if next.forward_char() && !next.ends_line() && !next.is_space() {
        return false;
    }

    let mut cur = *it;
    while !ends_sentence_char(cur.char()) && can_trail_sentence(cur.char()) {
        if !cur.backward_char() {
            break;
        }
    }
    ends_sentence_char(cur.char())
}

/// Forward to the last char of the sentence (text-object flavour: an
/// empty line is a sentence of its own).
pub fn forward_sentence_close<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) -> bool {
    if it.is_end() || !it.forward_char() {
        return false;
    }

    loop {
        if line_is_empty(it) {
            return true;
        }
        if ends_sentence_char(it.char()) {
            let mut next = *it;
            while next.forward_char() {
                if !can_trail_sentence(next.char()) {
                    break;
                }
                *it = next;
            }
            return true;
        }
        if !it.forward_char() {
            return false;
        }
    }
}

// ---------------------------------------------------------------------------
// Paragraphs
// ---------------------------------------------------------------------------

/// `}`: the next empty line after this paragraph.
pub fn forward_paragraph_end<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) -> bool {
    let before = it.offset();

    while line_is_empty(it) {
        if !it.forward_line() {
            return false;
        }
    }
    while !line_is_empty(it) {
        if !it.forward_line() {
            return false;
        }
    }

    if it.is_end() && !it.starts_line() {
        it.backward_char();
    }
    it.offset() != before
}

/// `{`: the empty line before this paragraph, or the start.
pub fn backward_paragraph_start<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) -> bool {
    let before = it.offset();

    'scan: {
        while line_is_empty(it) {
            if !it.backward_line() {
                break 'scan;
            }
        }
        while !line_is_empty(it) {
            if !it.backward_line() {
                break 'scan;
            }
        }
    }

    it.offset() != before
}

/// The end of the document or an empty line.
pub fn is_paragraph_break<S: TextSurface + ?Sized>(it: &TextIter<'_, S>) -> bool {
    it.is_end() || line_is_empty(it)
}

/// Back to the first char of the paragraph (text-object flavour).
pub fn backward_paragraph_open<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) -> bool {
    while !line_is_empty(it) {
        if it.is_start() {
            return true;
        }
        it.backward_line();
        if line_is_empty(it) {
            it.forward_char();
            break;
        }
    }
    true
}

/// Forward to the `\n` ending the paragraph's last line (text-object
/// flavour).
pub fn forward_paragraph_close<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) -> bool {
    it.forward_char();
    while !line_is_empty(it) {
        if it.is_end() {
            return true;
        }
        it.forward_line();
        if line_is_empty(it) {
            it.backward_char();
            return true;
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Blocks and quotes
// ---------------------------------------------------------------------------

/// Nesting-aware scan: `opposite` opens a level, `target` closes one,
/// and the scan stops when the level count hits zero.
fn nesting(target: char, opposite: char) -> impl FnMut(char) -> bool {
    let mut depth = 1_i32;
    move |ch| {
        if ch == opposite {
            depth += 1;
        } else if ch == target {
            depth -= 1;
        }
        depth == 0
    }
}

/// Back to the `open` enclosing the iterator (or on it).
pub fn backward_block_start<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>, open: char, close: char) -> bool {
    if it.char() == open {
        return true;
    }
    it.backward_find_char(nesting(open, close), None)
}

/// Forward to the `close` enclosing the iterator (or on it).
pub fn forward_block_end<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>, close: char, open: char) -> bool {
    if it.char() == close {
        return true;
    }
    it.forward_find_char(nesting(close, open), None)
}

/// Back to the previous `quote` on this line.
pub fn backward_quote_start<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>, quote: char) -> bool {
    let mut limit = *it;
    limit.set_line_start();
    it.backward_find_char(|ch| ch == quote, Some(limit.offset()))
}

/// Forward to the next `quote` on this line.
pub fn forward_quote_end<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>, quote: char) -> bool {
    let mut limit = *it;
    if !limit.ends_line() {
        limit.forward_to_line_end();
    }
    it.forward_find_char(|ch| ch == quote, Some(limit.offset()))
}

/// On a `quote` that closes one opened earlier on the line.
pub fn ends_quote<S: TextSurface + ?Sized>(it: &TextIter<'_, S>, quote: char) -> bool {
    if it.char() != quote || it.starts_line() {
        return false;
    }
    let mut alt = *it;
    backward_quote_start(&mut alt, quote)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
