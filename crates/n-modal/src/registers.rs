// SPDX-License-Identifier: MIT

//! Registers: named storage for yanked, deleted and inserted text.
//!
//! Every yank and delete lands in a register, paste reads from one. The
//! store is owned by the engine [`Context`](crate::Context) behind an
//! `Rc<RefCell<_>>` so that several documents can share it the way Vim
//! shares registers across buffers.
//!
//! | Name        | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | `"`         | Unnamed: the last yank, delete or explicit write      |
//! | `0`         | Last yank into the unnamed register                   |
//! | `1`–`9`     | Delete ring, `1` most recent, shifted on every delete |
//! | `a`–`z`     | Named; the unnamed register is left untouched         |
//! | `A`–`Z`     | Append to the lowercase register                      |
//! | `.`         | Last inserted text                                    |
//! | `+` / `*`   | System clipboard / primary selection                  |
//! | `_`         | Black hole: writes are discarded                      |
//!
//! `0`–`9`, `%`, `.`, `#` and `:` are read-only to users. Values longer
//! than the configured capacity are dropped and leave the register unset.
//!
//! The clipboard registers only cache text here; the engine publishes
//! writes to the surface and refreshes the cache on reads.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

/// Default register capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Slots in the numbered ring, `0` included.
const RING: usize = 10;

/// Why text is being stored; decides which numbered slot follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    /// Yanked text: the unnamed write also lands in `0`.
    Yank,
    /// Deleted or changed text: the unnamed write shifts the `1`–`9` ring.
    Delete,
    /// Plain assignment with no numbered side effect.
    Plain,
}

/// True for registers users cannot write.
#[must_use]
pub const fn is_read_only(name: char) -> bool {
    matches!(name, '0'..='9' | '%' | '.' | '#' | ':')
}

/// The register store.
#[derive(Debug, Clone)]
pub struct Registers {
    values: HashMap<char, Rc<str>>,
    /// `numbered[0]` is the yank register, `numbered[1..]` the delete ring.
    numbered: [Option<Rc<str>>; RING],
    capacity: usize,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Registers {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            values: HashMap::new(),
            numbered: Default::default(),
            capacity,
        }
    }

    /// Read a register. `None` and `"` both name the unnamed register;
    /// an uppercase name reads its lowercase register.
    #[must_use]
    pub fn get(&self, name: Option<char>) -> Option<Rc<str>> {
        match name.unwrap_or('"') {
            d @ '0'..='9' => self.numbered[digit(d)].clone(),
            ch @ 'A'..='Z' => self.values.get(&ch.to_ascii_lowercase()).cloned(),
            ch => self.values.get(&ch).cloned(),
        }
    }

    /// Store `text` into `name` as a yank, delete or plain write.
    ///
    /// Returns `false` when the register is read-only or the black hole.
    pub fn record(&mut self, name: Option<char>, text: &str, write: RegisterWrite) -> bool {
        let name = name.unwrap_or('"');

        if is_read_only(name) {
            debug!(register = %name, "refusing write to read-only register");
            return false;
        }

        let value = self.admit(text);

        match name {
            '_' => return false,
            '"' => {
                self.put('"', value.clone());
                match write {
                    RegisterWrite::Yank => self.numbered[0] = value,
                    RegisterWrite::Delete => self.shift_ring(value),
                    RegisterWrite::Plain => {}
                }
            }
            'A'..='Z' => {
                let lower = name.to_ascii_lowercase();
                let joined = match (self.values.get(&lower), value) {
                    (Some(old), Some(new)) => self.admit(&format!("{old}{new}")),
                    (Some(old), None) => Some(old.clone()),
                    (None, new) => new,
                };
                self.put(lower, joined);
            }
            _ => self.put(name, value),
        }

        true
    }

    /// Overwrite a register without the unnamed/numbered side effects.
    /// Used for `.` and for refreshing the clipboard caches.
    pub fn set_raw(&mut self, name: char, text: Option<&str>) {
        let value = text.and_then(|t| self.admit(t));
        match name {
            d @ '0'..='9' => self.numbered[digit(d)] = value,
            ch => self.put(ch, value),
        }
    }

    /// Record the text of the last insert in `.`.
    pub fn set_last_insert(&mut self, text: &str) {
        self.set_raw('.', Some(text));
    }

    /// Forget every register.
    pub fn clear(&mut self) {
        self.values.clear();
        self.numbered = Default::default();
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Names that currently hold a value, in a stable order.
    #[must_use]
    pub fn names(&self) -> Vec<char> {
        let mut names: Vec<char> = self.values.keys().copied().collect();
        names.extend(
            self.numbered
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_some())
                .filter_map(|(i, _)| char::from_digit(u32::try_from(i).ok()?, 10)),
        );
        names.sort_unstable();
        names
    }

    // ── internals ──────────────────────────────────────────────────────────

    fn admit(&self, text: &str) -> Option<Rc<str>> {
        if text.len() > self.capacity {
            debug!(len = text.len(), capacity = self.capacity, "register value dropped");
            None
        } else {
            Some(Rc::from(text))
        }
    }

    fn put(&mut self, name: char, value: Option<Rc<str>>) {
        match value {
            Some(v) => {
                self.values.insert(name, v);
            }
            None => {
                self.values.remove(&name);
            }
        }
    }

    fn shift_ring(&mut self, value: Option<Rc<str>>) {
        self.numbered[1..].rotate_right(1);
        self.numbered[1] = value;
    }
}

fn digit(d: char) -> usize {
    d.to_digit(10).map_or(0, |n| n as usize)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn text(r: &Registers, name: char) -> Option<String> {
        r.get(Some(name)).map(|v| v.to_string())
    }

    // ── unnamed and numbered ─────────────────────────────────────────────

    #[test]
    fn yank_fills_unnamed_and_zero() {
        let mut r = Registers::default();
        assert!(r.record(None, "word", RegisterWrite::Yank));
        assert_eq!(r.get(None).as_deref(), Some("word"));
        assert_eq!(text(&r, '0').as_deref(), Some("word"));
        assert_eq!(text(&r, '1'), None);
    }

    #[test]
    fn deletes_shift_the_ring() {
        let mut r = Registers::default();
        for i in 0..12 {
            r.record(None, &format!("d{i}"), RegisterWrite::Delete);
        }
        assert_eq!(text(&r, '1').as_deref(), Some("d11"));
        assert_eq!(text(&r, '2').as_deref(), Some("d10"));
        assert_eq!(text(&r, '9').as_deref(), Some("d3"));
        assert_eq!(text(&r, '0'), None);
    }

    #[test]
    fn ring_never_exceeds_ten_entries() {
        let mut r = Registers::default();
        r.record(None, "y", RegisterWrite::Yank);
        for i in 0..30 {
            r.record(None, &i.to_string(), RegisterWrite::Delete);
        }
        let numbered = r.names().into_iter().filter(char::is_ascii_digit).count();
        assert!(numbered <= 10);
        assert_eq!(text(&r, '0').as_deref(), Some("y"));
    }

    // ── named ────────────────────────────────────────────────────────────

    #[test]
    fn named_write_leaves_unnamed_and_ring_alone() {
        let mut r = Registers::default();
        r.record(None, "before", RegisterWrite::Yank);
        r.record(Some('a'), "alpha", RegisterWrite::Delete);
        assert_eq!(text(&r, 'a').as_deref(), Some("alpha"));
        assert_eq!(r.get(None).as_deref(), Some("before"));
        assert_eq!(text(&r, '1'), None);
    }

    #[test]
    fn uppercase_appends() {
        let mut r = Registers::default();
        r.record(Some('a'), "foo", RegisterWrite::Yank);
        r.record(Some('A'), "bar", RegisterWrite::Yank);
        assert_eq!(text(&r, 'a').as_deref(), Some("foobar"));
        assert_eq!(text(&r, 'A').as_deref(), Some("foobar"));
    }

    #[test]
    fn read_only_and_black_hole_refuse() {
        let mut r = Registers::default();
        assert!(!r.record(Some('.'), "x", RegisterWrite::Plain));
        assert!(!r.record(Some('3'), "x", RegisterWrite::Plain));
        assert!(!r.record(Some('_'), "x", RegisterWrite::Delete));
        assert_eq!(r.get(None), None);
        assert!(is_read_only('%'));
        assert!(!is_read_only('a'));
    }

    // ── limits ───────────────────────────────────────────────────────────

    #[test]
    fn oversized_value_unsets() {
        let mut r = Registers::new(4);
        r.record(Some('a'), "abc", RegisterWrite::Yank);
        r.record(Some('a'), "abcdef", RegisterWrite::Yank);
        assert_eq!(text(&r, 'a'), None);
        r.record(None, "abcdef", RegisterWrite::Yank);
        assert_eq!(r.get(None), None);
    }

    #[test]
    fn last_insert_is_raw() {
        let mut r = Registers::default();
        r.set_last_insert("typed");
        assert_eq!(text(&r, '.').as_deref(), Some("typed"));
        assert_eq!(r.get(None), None);
    }
}
