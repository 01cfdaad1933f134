// SPDX-License-Identifier: MIT

//! Undo/redo history with nested user actions.
//!
//! Records every buffer mutation as a reversible [`Edit`] grouped into
//! [`Transaction`]s. A transaction is the atomic unit of undo/redo and
//! corresponds to one outermost user action:
//!
//! ```text
//! history.begin(cursor);       // depth 1, transaction opens
//! history.begin(cursor);       // depth 2, same transaction
//! history.record_insert(pos, text);
//! history.end(cursor);         // depth 1
//! history.end(cursor);         // depth 0, transaction commits
//! ```
//!
//! Edits recorded while no user action is open become a transaction of
//! their own. Empty transactions are discarded.

use crate::buffer::Buffer;

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

/// A single reversible buffer edit, in char offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    /// Text was inserted at `pos`. Undo = delete it.
    Insert { pos: usize, text: String },

    /// Text was deleted starting at `pos`. Undo = insert it back.
    Delete { pos: usize, text: String },
}

impl Edit {
    fn apply(&self, buf: &mut Buffer) {
        let result = match self {
            Self::Insert { pos, text } => buf.insert(*pos, text).map(drop),
            Self::Delete { pos, text } => buf.delete(*pos, pos + text.chars().count()).map(drop),
        };
        if let Err(err) = result {
            tracing::warn!(%err, "history edit no longer applies");
        }
    }

    fn inverse(&self) -> Self {
        match self {
            Self::Insert { pos, text } => Self::Delete {
                pos: *pos,
                text: text.clone(),
            },
            Self::Delete { pos, text } => Self::Insert {
                pos: *pos,
                text: text.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A group of edits that undo/redo as one unit, with the cursor on
/// either side of it.
#[derive(Debug, Clone)]
struct Transaction {
    edits: Vec<Edit>,
    cursor_before: usize,
    cursor_after: usize,
}

impl Transaction {
    fn undo(&self, buf: &mut Buffer) {
        for edit in self.edits.iter().rev() {
            edit.inverse().apply(buf);
        }
    }

    fn redo(&self, buf: &mut Buffer) {
        for edit in &self.edits {
            edit.apply(buf);
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Undo/redo stacks for one buffer.
///
/// Any new committed edit clears the redo stack; branching history is not
/// kept.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<Transaction>,
    redo_stack: Vec<Transaction>,
    pending: Option<Transaction>,
    depth: usize,
}

impl History {
    /// Create an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            pending: None,
            depth: 0,
        }
    }

    /// Open a user action. Nested calls join the outermost transaction.
    pub fn begin(&mut self, cursor: usize) {
        if self.depth == 0 {
            self.pending = Some(Transaction {
                edits: Vec::new(),
                cursor_before: cursor,
                cursor_after: cursor,
            });
        }
        self.depth += 1;
    }

    /// Close a user action; the outermost close commits.
    pub fn end(&mut self, cursor: usize) {
        if self.depth == 0 {
            tracing::warn!("end_user_action without matching begin");
            return;
        }
        self.depth -= 1;
        if self.depth == 0 {
            self.commit(cursor);
        }
    }

    /// True while a user action is open.
    #[must_use]
    pub const fn in_user_action(&self) -> bool {
        self.depth > 0
    }

    /// Record text inserted at `pos` (after performing the insert).
    pub fn record_insert(&mut self, pos: usize, text: &str, cursor: usize) {
        self.record(Edit::Insert {
            pos,
            text: text.to_string(),
        }, cursor);
    }

    /// Record text deleted at `pos` (the removed text).
    pub fn record_delete(&mut self, pos: usize, text: &str, cursor: usize) {
        self.record(Edit::Delete {
            pos,
            text: text.to_string(),
        }, cursor);
    }

    fn record(&mut self, edit: Edit, cursor: usize) {
        if let Some(txn) = &mut self.pending {
            txn.edits.push(edit);
        } else {
            // Outside any user action every edit is its own step.
            self.pending = Some(Transaction {
                edits: vec![edit],
                cursor_before: cursor,
                cursor_after: cursor,
            });
            self.commit(cursor);
        }
    }

    fn commit(&mut self, cursor: usize) {
        if let Some(mut txn) = self.pending.take() {
            if txn.edits.is_empty() {
                return;
            }
            txn.cursor_after = cursor;
            self.redo_stack.clear();
            self.undo_stack.push(txn);
        }
    }

    /// Undo the last transaction. Returns the cursor to restore.
    pub fn undo(&mut self, buf: &mut Buffer) -> Option<usize> {
        if self.depth > 0 {
            tracing::warn!("undo inside an open user action; closing it first");
            self.depth = 0;
            let cursor = self.pending.as_ref().map_or(0, |t| t.cursor_after);
            self.commit(cursor);
        }

        let txn = self.undo_stack.pop()?;
        txn.undo(buf);
        let cursor = txn.cursor_before;
        self.redo_stack.push(txn);
        Some(cursor)
    }

    /// Redo the last undone transaction. Returns the cursor to restore.
    pub fn redo(&mut self, buf: &mut Buffer) -> Option<usize> {
        let txn = self.redo_stack.pop()?;
        txn.redo(buf);
        let cursor = txn.cursor_after;
        self.undo_stack.push(txn);
        Some(cursor)
    }

    /// True if there are transactions that can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
            || self
                .pending
                .as_ref()
                .is_some_and(|t| !t.edits.is_empty())
    }

    /// True if there are transactions that can be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of transactions on the undo stack.
    #[must_use]
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(buf: &mut Buffer, h: &mut History, pos: usize, text: &str) {
        buf.insert(pos, text).unwrap();
        h.record_insert(pos, text, pos);
    }

    fn delete(buf: &mut Buffer, h: &mut History, start: usize, end: usize) {
        let removed = buf.delete(start, end).unwrap();
        h.record_delete(start, &removed, start);
    }

    // -- Basic undo ---------------------------------------------------------

    #[test]
    fn undo_single_insert() {
        let mut buf = Buffer::from_text("");
        let mut h = History::new();

        h.begin(0);
        insert(&mut buf, &mut h, 0, "hello");
        h.end(5);

        assert_eq!(buf.contents(), "hello");
        assert_eq!(h.undo(&mut buf), Some(0));
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn undo_single_delete() {
        let mut buf = Buffer::from_text("hello");
        let mut h = History::new();

        h.begin(4);
        delete(&mut buf, &mut h, 4, 5);
        h.end(3);

        assert_eq!(buf.contents(), "hell");
        assert_eq!(h.undo(&mut buf), Some(4));
        assert_eq!(buf.contents(), "hello");
    }

    // -- Redo ---------------------------------------------------------------

    #[test]
    fn redo_after_undo() {
        let mut buf = Buffer::from_text("");
        let mut h = History::new();

        h.begin(0);
        insert(&mut buf, &mut h, 0, "abc");
        h.end(3);

        h.undo(&mut buf);
        assert!(h.can_redo());
        assert_eq!(h.redo(&mut buf), Some(3));
        assert_eq!(buf.contents(), "abc");
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut buf = Buffer::from_text("");
        let mut h = History::new();

        insert(&mut buf, &mut h, 0, "a");
        h.undo(&mut buf);
        insert(&mut buf, &mut h, 0, "b");
        assert!(!h.can_redo());
    }

    // -- Grouping -----------------------------------------------------------

    #[test]
    fn nested_actions_form_one_transaction() {
        let mut buf = Buffer::from_text("");
        let mut h = History::new();

        h.begin(0);
        insert(&mut buf, &mut h, 0, "a");
        h.begin(1);
        insert(&mut buf, &mut h, 1, "b");
        h.end(2);
        insert(&mut buf, &mut h, 2, "c");
        h.end(3);

        assert_eq!(h.undo_count(), 1);
        h.undo(&mut buf);
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn edits_outside_actions_are_separate_steps() {
        let mut buf = Buffer::from_text("");
        let mut h = History::new();

        insert(&mut buf, &mut h, 0, "a");
        insert(&mut buf, &mut h, 1, "b");
        assert_eq!(h.undo_count(), 2);
        h.undo(&mut buf);
        assert_eq!(buf.contents(), "a");
    }

    #[test]
    fn empty_transaction_is_discarded() {
        let mut h = History::new();
        h.begin(0);
        h.end(0);
        assert!(!h.can_undo());
    }

    #[test]
    fn unbalanced_end_is_ignored() {
        let mut h = History::new();
        h.end(0);
        assert!(!h.in_user_action());
    }
}
