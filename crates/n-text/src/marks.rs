// SPDX-License-Identifier: MIT

//! Floating positions that follow edits.
//!
//! A mark is a char offset that the document keeps valid across
//! insertions and deletions. Gravity decides what happens when text is
//! inserted exactly at the mark: a left-gravity mark stays before the new
//! text, a right-gravity mark ends up after it. Deleting a range that
//! contains a mark collapses it to the start of the range.
//!
//! Marks are addressed through [`MarkId`], a generational key, so a stale
//! id (mark already deleted) is detected instead of aliasing a new mark.

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Handle to a mark created by [`MarkTable::create`].
    pub struct MarkId;
}

/// Which side of an insertion at the mark's own offset it ends up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    /// Stay before text inserted at the mark.
    #[default]
    Left,
    /// Move after text inserted at the mark.
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    offset: usize,
    gravity: Gravity,
}

// ---------------------------------------------------------------------------
// MarkTable
// ---------------------------------------------------------------------------

/// Every live mark of one document.
#[derive(Debug, Default)]
pub struct MarkTable {
    marks: SlotMap<MarkId, Mark>,
}

impl MarkTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mark at `offset`.
    pub fn create(&mut self, offset: usize, gravity: Gravity) -> MarkId {
        self.marks.insert(Mark { offset, gravity })
    }

    /// Move an existing mark. Unknown ids are ignored.
    pub fn set(&mut self, id: MarkId, offset: usize) {
        if let Some(mark) = self.marks.get_mut(id) {
            mark.offset = offset;
        }
    }

    /// Current offset of a mark, `None` once it has been deleted.
    #[must_use]
    pub fn get(&self, id: MarkId) -> Option<usize> {
        self.marks.get(id).map(|m| m.offset)
    }

    /// Remove a mark. Deleting twice is harmless.
    pub fn remove(&mut self, id: MarkId) {
        self.marks.remove(id);
    }

    /// Number of live marks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    // -- Edit tracking ------------------------------------------------------

    /// Shift marks for `len` chars inserted at `at`.
    pub fn adjust_insert(&mut self, at: usize, len: usize) {
        for mark in self.marks.values_mut() {
            if mark.offset > at || (mark.offset == at && mark.gravity == Gravity::Right) {
                mark.offset += len;
            }
        }
    }

    /// Shift marks for the chars in `start..end` being removed.
    pub fn adjust_delete(&mut self, start: usize, end: usize) {
        let len = end - start;
        for mark in self.marks.values_mut() {
            if mark.offset >= end {
                mark.offset -= len;
            } else if mark.offset > start {
                mark.offset = start;
            }
        }
    }

    /// Clamp every mark into `0..=len`.
    pub fn clamp(&mut self, len: usize) {
        for mark in self.marks.values_mut() {
            mark.offset = mark.offset.min(len);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_gravity_stays_before_insert() {
        let mut t = MarkTable::new();
        let m = t.create(3, Gravity::Left);
        t.adjust_insert(3, 2);
        assert_eq!(t.get(m), Some(3));
    }

    #[test]
    fn right_gravity_moves_after_insert() {
        let mut t = MarkTable::new();
        let m = t.create(3, Gravity::Right);
        t.adjust_insert(3, 2);
        assert_eq!(t.get(m), Some(5));
    }

    #[test]
    fn insert_before_shifts_both() {
        let mut t = MarkTable::new();
        let a = t.create(5, Gravity::Left);
        let b = t.create(5, Gravity::Right);
        t.adjust_insert(1, 4);
        assert_eq!(t.get(a), Some(9));
        assert_eq!(t.get(b), Some(9));
    }

    #[test]
    fn delete_collapses_inside_and_shifts_after() {
        let mut t = MarkTable::new();
        let inside = t.create(4, Gravity::Left);
        let after = t.create(10, Gravity::Left);
        let before = t.create(1, Gravity::Left);
        t.adjust_delete(2, 6);
        assert_eq!(t.get(inside), Some(2));
        assert_eq!(t.get(after), Some(6));
        assert_eq!(t.get(before), Some(1));
    }

    #[test]
    fn removed_mark_is_gone() {
        let mut t = MarkTable::new();
        let m = t.create(0, Gravity::Left);
        t.remove(m);
        t.remove(m);
        assert_eq!(t.get(m), None);
        assert!(t.is_empty());
    }
}
