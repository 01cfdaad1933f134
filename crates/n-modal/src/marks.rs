// SPDX-License-Identifier: MIT

//! Named marks (`ma`, `` `a ``, `'a`).
//!
//! Each name maps to a left-gravity surface mark, so a mark stays glued
//! to its text while the document is edited around it. `<` and `>` are
//! not stored: they always resolve to the lower and upper end of the live
//! selection, which is what `:'<,'>` ranges need.

use std::collections::HashMap;

use n_text::{Gravity, MarkId, TextSurface};

/// Per-document mark table.
#[derive(Debug, Default)]
pub struct Marks {
    marks: HashMap<char, MarkId>,
}

impl Marks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of mark `name`, or `None` if it was never set.
    #[must_use]
    pub fn get<S: TextSurface + ?Sized>(&self, surface: &S, name: char) -> Option<usize> {
        let (insert, bound) = (surface.cursor(), surface.selection_bound());
        match name {
            '<' => Some(insert.min(bound)),
            '>' => Some(insert.max(bound)),
            _ => self.marks.get(&name).and_then(|&id| surface.mark_offset(id)),
        }
    }

    /// Set (or move) mark `name` to `offset`. Selection marks are derived
    /// and cannot be set.
    pub fn set<S: TextSurface + ?Sized>(&mut self, surface: &mut S, name: char, offset: usize) {
        if matches!(name, '<' | '>') {
            return;
        }
        match self.marks.get(&name) {
            Some(&id) => surface.move_mark(id, offset),
            None => {
                let id = surface.create_mark(offset, Gravity::Left);
                self.marks.insert(name, id);
            }
        }
    }

    /// Forget mark `name`.
    pub fn remove<S: TextSurface + ?Sized>(&mut self, surface: &mut S, name: char) {
        if let Some(id) = self.marks.remove(&name) {
            surface.delete_mark(id);
        }
    }

    /// Release every surface mark.
    pub fn clear<S: TextSurface + ?Sized>(&mut self, surface: &mut S) {
        for (_, id) in self.marks.drain() {
            surface.delete_mark(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use n_text::RopeSurface;

    use super::*;

    #[test]
    fn set_get_and_follow_edits() {
        let mut s = RopeSurface::new("hello world");
        let mut marks = Marks::new();
        marks.set(&mut s, 'a', 6);
        assert_eq!(marks.get(&s, 'a'), Some(6));

        s.insert(0, ">> ");
        assert_eq!(marks.get(&s, 'a'), Some(9));

        marks.set(&mut s, 'a', 1);
        assert_eq!(marks.get(&s, 'a'), Some(1));
        assert_eq!(marks.get(&s, 'b'), None);
    }

    #[test]
    fn selection_marks_are_ordered() {
        let mut s = RopeSurface::new("abcdef");
        let marks = Marks::new();
        s.select(4, 1);
        assert_eq!(marks.get(&s, '<'), Some(1));
        assert_eq!(marks.get(&s, '>'), Some(4));
    }

    #[test]
    fn remove_releases() {
        let mut s = RopeSurface::new("abc");
        let mut marks = Marks::new();
        marks.set(&mut s, 'x', 2);
        marks.remove(&mut s, 'x');
        assert_eq!(marks.get(&s, 'x'), None);
    }
}
