// SPDX-License-Identifier: MIT

//! Jumplist: cursor history for `Ctrl-O` / `Ctrl-I`.
//!
//! A "jump" is any motion that moves the cursor far in one step (`G`,
//! `gg`, `%`, `n`, searches, `:N`). Before such a motion the origin is
//! pushed here. Entries are surface marks, so they follow edits.
//!
//! The list is two queues around the present: `back` (older positions,
//! newest at the tail) and `forward` (positions left by `Ctrl-O`, nearest
//! at the head). A new jump drops everything in `forward`. Only one
//! entry per line is kept; pushing a position on a line that already has
//! an entry removes the old one first.

use std::collections::VecDeque;

use n_text::{Gravity, MarkId, TextSurface};

/// Default number of jumps kept.
pub const DEFAULT_MAX_JUMPS: usize = 100;

#[derive(Debug)]
pub struct Jumplist {
    back: VecDeque<MarkId>,
    forward: VecDeque<MarkId>,
    max: usize,
}

impl Default for Jumplist {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_JUMPS)
    }
}

impl Jumplist {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            back: VecDeque::new(),
            forward: VecDeque::new(),
            max: max.max(1),
        }
    }

    /// Number of entries in both directions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.back.len() + self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record `offset` as a jump origin, forgetting any positions that
    /// `Ctrl-O` stepped back over.
    pub fn push<S: TextSurface + ?Sized>(&mut self, surface: &mut S, offset: usize) {
        for mark in self.forward.drain(..) {
            surface.delete_mark(mark);
        }
        self.record(surface, offset);
    }

    fn record<S: TextSurface + ?Sized>(&mut self, surface: &mut S, offset: usize) {
        let line = surface.line_of_offset(offset);

        // One entry per line: the newest back entry wins over forward ones.
        if let Some(i) = self.back.iter().rposition(|&m| same_line(surface, m, line)) {
            if let Some(old) = self.back.remove(i) {
                surface.delete_mark(old);
            }
        } else if let Some(i) = self.forward.iter().position(|&m| same_line(surface, m, line)) {
            if let Some(old) = self.forward.remove(i) {
                surface.delete_mark(old);
            }
        }

        if self.len() >= self.max {
            let dropped = if self.back.is_empty() {
                self.forward.pop_back()
            } else {
                self.back.pop_front()
            };
            if let Some(old) = dropped {
                surface.delete_mark(old);
            }
        }

        let mark = surface.create_mark(offset, Gravity::Left);
        self.back.push_back(mark);
    }

    /// `Ctrl-O`: the previous jump on another line than the cursor.
    pub fn previous<S: TextSurface + ?Sized>(&mut self, surface: &mut S) -> Option<usize> {
        let cursor = surface.cursor();
        let line = surface.line_of_offset(cursor);
        self.record(surface, cursor);

        while let Some(mark) = self.back.pop_back() {
            self.forward.push_front(mark);
            if !same_line(surface, mark, line) {
                return surface.mark_offset(mark);
            }
        }
        None
    }

    /// `Ctrl-I`: the next jump on another line than the cursor.
    pub fn next<S: TextSurface + ?Sized>(&mut self, surface: &mut S) -> Option<usize> {
        let cursor = surface.cursor();
        let line = surface.line_of_offset(cursor);
        self.record(surface, cursor);

        while let Some(mark) = self.forward.pop_front() {
            self.back.push_back(mark);
            if !same_line(surface, mark, line) {
                return surface.mark_offset(mark);
            }
        }
        None
    }

    /// Drop every entry and release its mark.
    pub fn clear<S: TextSurface + ?Sized>(&mut self, surface: &mut S) {
        for mark in self.back.drain(..).chain(self.forward.drain(..)) {
            surface.delete_mark(mark);
        }
    }
}

fn same_line<S: TextSurface + ?Sized>(surface: &S, mark: MarkId, line: usize) -> bool {
    surface
        .mark_offset(mark)
        .is_some_and(|offset| surface.line_of_offset(offset) == line)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use n_text::RopeSurface;
    use pretty_assertions::assert_eq;

    use super::*;

    fn lines(n: usize) -> RopeSurface {
        let text: String = (0..n).map(|i| format!("line {i}\n")).collect();
        RopeSurface::new(&text)
    }

    fn line_of(s: &RopeSurface, offset: usize) -> usize {
        s.line_of_offset(offset)
    }

    #[test]
    fn back_and_forth() {
        let mut s = lines(10);
        let mut j = Jumplist::default();

        let at = s.line_start_offset(1);
        j.push(&mut s, at);
        let at = s.line_start_offset(5);
        j.push(&mut s, at);
        s.place_cursor(s.line_start_offset(8));

        let prev = j.previous(&mut s).unwrap();
        assert_eq!(line_of(&s, prev), 5);
        s.place_cursor(prev);

        let prev = j.previous(&mut s).unwrap();
        assert_eq!(line_of(&s, prev), 1);
        s.place_cursor(prev);

        let next = j.next(&mut s).unwrap();
        assert_eq!(line_of(&s, next), 5);
        s.place_cursor(next);

        let next = j.next(&mut s).unwrap();
        assert_eq!(line_of(&s, next), 8);
    }

    #[test]
    fn one_entry_per_line() {
        let mut s = lines(4);
        let mut j = Jumplist::default();
        let at = s.line_start_offset(2);
        j.push(&mut s, at);
        let at = s.line_start_offset(2) + 3;
        j.push(&mut s, at);
        assert_eq!(j.len(), 1);
    }

    #[test]
    fn bounded() {
        let mut s = lines(20);
        let mut j = Jumplist::new(3);
        for line in 0..10 {
            let at = s.line_start_offset(line);
            j.push(&mut s, at);
        }
        assert_eq!(j.len(), 3);
    }

    #[test]
    fn new_jump_drops_forward_entries() {
        let mut s = lines(10);
        let mut j = Jumplist::default();
        let at = s.line_start_offset(1);
        j.push(&mut s, at);
        let at = s.line_start_offset(5);
        j.push(&mut s, at);
        s.place_cursor(s.line_start_offset(8));

        let prev = j.previous(&mut s).unwrap();
        s.place_cursor(prev);
        let prev = j.previous(&mut s).unwrap();
        assert_eq!(line_of(&s, prev), 1);
        s.place_cursor(prev);

        let at = s.line_start_offset(3);
        j.push(&mut s, at);
        assert_eq!(j.next(&mut s), None);

        let prev = j.previous(&mut s).unwrap();
        assert_eq!(line_of(&s, prev), 3);
    }

    #[test]
    fn nothing_to_go_back_to() {
        let mut s = lines(3);
        let mut j = Jumplist::default();
        assert_eq!(j.previous(&mut s), None);
        assert_eq!(j.next(&mut s), None);
    }
}
