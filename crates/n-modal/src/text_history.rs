// SPDX-License-Identifier: MIT

//! Recording of one insert session for `.` and the `.` register.
//!
//! Insert mode reports every edit it makes. Edits that continue at the
//! recorded cursor are kept as operations; an edit anywhere else starts
//! the recording over, so only the last contiguous run is replayed.
//!
//! | Edit                               | Recorded as      |
//! |------------------------------------|------------------|
//! | text inserted at the cursor        | `Insert(text)`   |
//! | chars removed after the cursor     | `Delete(n)`      |
//! | chars removed before the cursor    | `Backspace(n)`   |

use n_text::TextSurface;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Insert(String),
    Delete(usize),
    Backspace(usize),
}

/// Operations of the running (or last finished) insert session.
#[derive(Debug, Default, Clone)]
pub struct TextHistory {
    ops: Vec<Op>,
    cursor: usize,
    recording: bool,
}

impl TextHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording with the cursor at `cursor`.
    pub fn begin(&mut self, cursor: usize) {
        self.ops.clear();
        self.cursor = cursor;
        self.recording = true;
    }

    /// Stop recording and return the net inserted text, which becomes
    /// the `.` register. `None` if nothing was recording.
    pub fn end(&mut self) -> Option<String> {
        if !std::mem::take(&mut self.recording) {
            return None;
        }

        let mut inserted = String::new();
        for op in &self.ops {
            match op {
                Op::Insert(text) => inserted.push_str(text),
                Op::Backspace(n) => {
                    for _ in 0..*n {
                        if inserted.pop().is_none() {
                            break;
                        }
                    }
                }
                Op::Delete(_) => {}
            }
        }
        Some(inserted)
    }

    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.recording
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// `text` was inserted at `at`.
    pub fn record_insert(&mut self, at: usize, text: &str) {
        if !self.recording || text.is_empty() {
            return;
        }
        if at != self.cursor {
            self.ops.clear();
        }
        let len = text.chars().count();
        match self.ops.last_mut() {
            Some(Op::Insert(prev)) => prev.push_str(text),
            _ => self.ops.push(Op::Insert(text.to_owned())),
        }
        self.cursor = at + len;
    }

    /// The chars in `start..end` were deleted.
    pub fn record_delete(&mut self, start: usize, end: usize) {
        if !self.recording || start == end {
            return;
        }
        let (a, b) = (start.min(end), start.max(end));
        let len = b - a;

        if a == self.cursor {
            self.ops.push(Op::Delete(len));
        } else if b == self.cursor {
            self.ops.push(Op::Backspace(len));
        } else {
            self.ops.clear();
        }
        self.cursor = a;
    }

    /// Apply the recorded operations at the surface cursor.
    pub fn replay<S: TextSurface + ?Sized>(&self, surface: &mut S) {
        let mut at = surface.cursor();
        for op in &self.ops {
            match op {
                Op::Insert(text) => {
                    surface.insert(at, text);
                    at += text.chars().count();
                }
                Op::Delete(n) => {
                    let end = (at + n).min(surface.len_chars());
                    surface.delete(at, end);
                }
                Op::Backspace(n) => {
                    let start = at.saturating_sub(*n);
                    surface.delete(start, at);
                    at = start;
                }
            }
        }
        surface.place_cursor(at);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use n_text::RopeSurface;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn typed_text_with_backspace() {
        let mut h = TextHistory::new();
        h.begin(0);
        h.record_insert(0, "a");
        h.record_insert(1, "b");
        h.record_insert(2, "c");
        h.record_delete(2, 3);
        h.record_insert(2, "d");
        assert_eq!(h.end().as_deref(), Some("abd"));
        assert_eq!(h.end(), None);
    }

    #[test]
    fn edit_elsewhere_starts_over() {
        let mut h = TextHistory::new();
        h.begin(0);
        h.record_insert(0, "abc");
        h.record_insert(10, "xy");
        assert_eq!(h.end().as_deref(), Some("xy"));
    }

    #[test]
    fn forward_delete_is_kept_but_not_text() {
        let mut h = TextHistory::new();
        h.begin(3);
        h.record_delete(3, 5);
        h.record_insert(3, "Z");
        assert_eq!(h.end().as_deref(), Some("Z"));

        let mut s = RopeSurface::new("0123456");
        s.place_cursor(1);
        h.replay(&mut s);
        assert_eq!(s.text(), "0Z3456");
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn replay_backspace() {
        let mut h = TextHistory::new();
        h.begin(4);
        h.record_delete(2, 4);
        h.record_insert(2, "ok");
        h.end();

        let mut s = RopeSurface::new("abcdef");
        s.place_cursor(6);
        h.replay(&mut s);
        assert_eq!(s.text(), "abcdok");
    }

    #[test]
    fn idle_history_ignores_edits() {
        let mut h = TextHistory::new();
        h.record_insert(0, "x");
        assert!(h.is_empty());
        assert!(!h.is_recording());
    }
}
