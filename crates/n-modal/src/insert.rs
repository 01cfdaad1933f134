// SPDX-License-Identifier: MIT

//! Text entry states: Insert, Replace, InsertLiteral and CharPending.
//!
//! Insert is entered with an optional positioning plan: a text object or
//! a motion (plus a selection motion) whose span is deleted into the
//! current register, a suffix and a prefix to insert, and whether to
//! indent. The plan runs on enter and again for every counted replay
//! and for `.`, so `3ihi<Esc>`, `cw` and `o` all repeat faithfully.
//!
//! | Key (Insert)          | Effect                                        |
//! |-----------------------|-----------------------------------------------|
//! | `Esc` `^[` `^C`       | leave                                         |
//! | `^U`                  | delete back to the first non-blank            |
//! | `^V`                  | insert the next key literally                 |
//! | `Insert`              | switch to Replace (leaving it leaves Insert)  |
//! | `Enter`               | newline, auto-indented                        |
//! | `Tab`                 | tab, or spaces with `expandtab`               |
//! | `BS` / `Del`          | delete before / after the cursor              |
//! | arrows `Home` `End`   | move without editing                          |
//! | printable             | insert                                        |

use n_keys::{KeyCode, KeyEvent};
use n_text::TextSurface;
use tracing::debug;

use crate::host::Host;
use crate::iter::TextIter;
use crate::motion::Motion;
use crate::registers::RegisterWrite;
use crate::scroll;
use crate::state::{Kind, KindTag, StateId, keep_on_char};
use crate::text_history::TextHistory;
use crate::text_object::TextObject;
use crate::vim::Vim;

// ---------------------------------------------------------------------------
// Insert
// ---------------------------------------------------------------------------

/// Where the cursor goes after the positioning motion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum InsertAt {
    #[default]
    Here,
    /// One char right unless on a line end (`a`, `A`, `o`).
    AfterChar,
}

/// Insert mode.
#[derive(Debug, Default)]
pub(crate) struct Insert {
    history: TextHistory,
    motion: Option<Motion>,
    selection_motion: Option<Motion>,
    text_object: Option<TextObject>,
    prefix: Option<String>,
    suffix: Option<String>,
    at: InsertAt,
    indent: bool,
}

impl Insert {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_motion(mut self, motion: Motion, at: InsertAt) -> Self {
        self.motion = Some(motion);
        self.at = at;
        self
    }

    pub(crate) fn with_selection_motion(mut self, motion: Motion) -> Self {
        self.selection_motion = Some(motion);
        self
    }

    pub(crate) const fn with_text_object(mut self, text_object: TextObject) -> Self {
        self.text_object = Some(text_object);
        self
    }

    pub(crate) fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_owned());
        self
    }

    pub(crate) fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_owned());
        self
    }

    pub(crate) const fn with_indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    pub(crate) const fn has_motion(&self) -> bool {
        self.motion.is_some()
    }
}

// ---------------------------------------------------------------------------
// Replace, InsertLiteral, CharPending
// ---------------------------------------------------------------------------

/// Replace mode: typed chars overwrite.
#[derive(Debug, Default)]
pub(crate) struct Replace {
    /// Text typed so far, replayed by counts and `.`.
    typed: String,
}

impl Replace {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

/// Waits for one key and keeps what it types.
#[derive(Debug, Clone, Default)]
pub(crate) struct CharPending {
    character: Option<char>,
    string: String,
}

impl CharPending {
    /// The typed char, `None` after Escape or a key with no text.
    pub(crate) const fn character(&self) -> Option<char> {
        self.character
    }

    pub(crate) fn string(&self) -> &str {
        &self.string
    }
}

// ---------------------------------------------------------------------------
// Editing helpers shared by the text entry states
// ---------------------------------------------------------------------------

impl<S: TextSurface, H: Host> Vim<S, H> {
    /// Nearest Insert at or above `id`, whose history records the edits.
    fn recording_insert(&self, id: StateId) -> Option<StateId> {
        self.tree.find_ancestor(id, KindTag::Insert)
    }

    /// Insert `text` at the cursor and leave the cursor after it.
    fn type_text(&mut self, id: StateId, text: &str) {
        if text.is_empty() {
            return;
        }
        let at = self.surface.cursor();
        self.surface.insert(at, text);
        self.surface.place_cursor(at + text.chars().count());
        if let Some(insert) = self.recording_insert(id).and_then(|ins| self.tree.insert_state_mut(ins)) {
            insert.history.record_insert(at, text);
        }
    }

    /// Delete `start..end`, recording it.
    fn erase(&mut self, id: StateId, start: usize, end: usize) {
        let (start, end) = (start.min(end), start.max(end).min(self.surface.len_chars()));
        if start == end {
            return;
        }
        self.surface.delete(start, end);
        self.surface.place_cursor(start);
        if let Some(insert) = self.recording_insert(id).and_then(|ins| self.tree.insert_state_mut(ins)) {
            insert.history.record_delete(start, end);
        }
    }

    /// Overwrite the char under the cursor with `text` unless at a line
    /// end, where `text` is inserted.
    fn overwrite_text(&mut self, id: StateId, text: &str) {
        for ch in text.chars() {
            let cursor = self.surface.cursor();
            if ch != '\n' && !TextIter::new(&self.surface, cursor).ends_line() {
                self.erase(id, cursor, cursor + 1);
            }
            let mut buf = [0; 4];
            self.type_text(id, ch.encode_utf8(&mut buf));
        }
    }

    fn cursor_to(&mut self, offset: usize) {
        self.surface.place_cursor(offset.min(self.surface.len_chars()));
    }

    /// Arrow-style movement inside the text entry states.
    fn move_key(&mut self, key: &KeyEvent) -> bool {
        let cursor = self.surface.cursor();
        let line = self.surface.line_of_offset(cursor);
        let column = self.surface.visual_column(cursor);
        match key.code {
            KeyCode::Left => {
                if !TextIter::new(&self.surface, cursor).starts_line() {
                    self.cursor_to(cursor - 1);
                }
            }
            KeyCode::Right => {
                if !TextIter::new(&self.surface, cursor).ends_line() {
                    self.cursor_to(cursor + 1);
                }
            }
            KeyCode::Home => self.cursor_to(self.surface.line_start_offset(line)),
            KeyCode::End => self.cursor_to(self.surface.line_end_offset(line)),
            KeyCode::Up if line > 0 => {
                let target = self.surface.offset_at_visual_column(line - 1, column);
                self.cursor_to(target);
            }
            KeyCode::Down if line + 1 < self.surface.line_count() => {
                let target = self.surface.offset_at_visual_column(line + 1, column);
                self.cursor_to(target);
            }
            KeyCode::Up | KeyCode::Down => {}
            _ => return false,
        }
        true
    }

    /// Indentation for a line opened at `at`: copied from the line above
    /// when `from_above`, else from the line below.
    fn indent_opened_line(&mut self, id: StateId, at: usize, from_above: bool) {
        let line = self.surface.line_of_offset(at);
        let source = if from_above {
            line.checked_sub(1)
        } else {
            (line + 1 < self.surface.line_count()).then_some(line + 1)
        };
        let Some(source) = source else {
            return;
        };
        let indent = self.surface.new_line_indentation(self.surface.line_end_offset(source));
        self.cursor_to(at);
        self.type_text(id, &indent);
    }

    // -----------------------------------------------------------------------
    // Insert lifecycle
    // -----------------------------------------------------------------------

    /// Position the cursor, delete the covered span, add prefix/suffix.
    fn insert_prepare(&mut self, id: StateId) {
        let Some(insert) = self.tree.insert_state(id) else {
            return;
        };
        let text_object = insert.text_object;
        let motion = insert.motion.clone();
        let selection_motion = insert.selection_motion.clone();
        let prefix = insert.prefix.clone();
        let suffix = insert.suffix.clone();
        let at = insert.at;
        let indent = insert.indent;

        let column = self.visual_column(id);
        let mut iter = self.surface.cursor();
        let mut selection = self.surface.selection_bound();

        if let Some(object) = text_object {
            selection = iter;
            if let Some((begin, end)) = object.select(&self.surface, iter) {
                iter = begin;
                selection = end;
            }
        } else {
            if let Some(motion) = &motion {
                motion.apply(&mut self.surface, &mut self.ctx, &mut iter, column, selection_motion.is_some());
                if at == InsertAt::AfterChar && !TextIter::new(&self.surface, iter).ends_line() {
                    iter += 1;
                }
                if selection_motion.is_none() {
                    selection = iter;
                }
            }
            if let Some(selection_motion) = &selection_motion {
                selection_motion.apply(&mut self.surface, &mut self.ctx, &mut selection, column, true);
                if at == InsertAt::AfterChar && !TextIter::new(&self.surface, selection).ends_line() {
                    selection += 1;
                }
            }
        }

        self.surface.select(iter, selection);

        if iter != selection {
            let (begin, end) = (iter.min(selection), iter.max(selection));
            let mut removed = self.surface.slice(begin, end);
            let linewise = text_object.is_some_and(|object| object.is_linewise())
                || motion.as_ref().is_some_and(Motion::is_linewise);
            if linewise {
                removed.push('\n');
            }
            self.set_register_value(id, &removed, RegisterWrite::Delete);
            self.erase(id, begin, end);
            iter = begin;
        }

        if let Some(suffix) = suffix.filter(|suffix| !suffix.is_empty()) {
            self.cursor_to(iter);
            self.type_text(id, &suffix);
            self.cursor_to(iter);
        }

        if let Some(prefix) = &prefix {
            self.cursor_to(iter);
            self.type_text(id, prefix);
            iter = self.surface.cursor();
        }

        if indent && self.surface.options().auto_indent {
            self.indent_opened_line(id, iter, prefix.is_some());
        }
    }

    pub(crate) fn insert_enter(&mut self, id: StateId) {
        self.tree.set_can_repeat(id, true);
        self.surface.begin_user_action();
        self.surface.set_overwrite(false);
        self.insert_prepare(id);
        let cursor = self.surface.cursor();
        if let Some(insert) = self.tree.insert_state_mut(id) {
            insert.history.begin(cursor);
        }
        scroll::scroll_cursor_onscreen(&mut self.surface);
    }

    pub(crate) fn insert_leave(&mut self, id: StateId) {
        let inserted = self.tree.insert_state_mut(id).and_then(|insert| insert.history.end());
        if let Some(text) = inserted {
            self.ctx.registers_mut().set_last_insert(&text);
        }

        for _ in 1..self.tree.count(id) {
            self.insert_replay_once(id);
        }

        self.surface.end_user_action();
    }

    fn insert_replay_once(&mut self, id: StateId) {
        self.insert_prepare(id);
        let history = self.tree.insert_state(id).map(|insert| insert.history.clone());
        if let Some(history) = history {
            history.replay(&mut self.surface);
        }
    }

    pub(crate) fn insert_repeat(&mut self, id: StateId) {
        self.surface.begin_user_action();
        for _ in 0..self.tree.count(id) {
            self.insert_replay_once(id);
        }
        self.surface.end_user_action();
    }

    pub(crate) fn insert_resume(&mut self, id: StateId, from: StateId) {
        self.surface.set_overwrite(false);

        match self.tag_of(from) {
            KindTag::Motion if self.tree.insert_state(id).is_some_and(|insert| !insert.has_motion()) => {
                let motion = self.finished_motion(from);
                self.unparent(from);
                let Some(motion) = motion else {
                    debug!("change motion failed, leaving insert");
                    self.pop(id);
                    return;
                };
                if let Some(insert) = self.tree.insert_state_mut(id) {
                    insert.motion = Some(motion);
                    insert.history.end();
                }
                self.insert_prepare(id);
                let cursor = self.surface.cursor();
                if let Some(insert) = self.tree.insert_state_mut(id) {
                    insert.history.begin(cursor);
                }
            }
            KindTag::Replace => {
                self.unparent(from);
                self.pop(id);
            }
            _ => self.unparent(from),
        }
    }

    pub(crate) fn insert_keypress(&mut self, id: StateId, key: &KeyEvent) -> bool {
        if key.is_escape() || key.is_ctrl_char('c') {
            self.pop(id);
            return true;
        }

        if key.is_ctrl() {
            return match key.as_char() {
                Some('u') => {
                    self.clear_to_first_char(id);
                    true
                }
                Some('v') => {
                    let literal = self.create(Kind::InsertLiteral);
                    self.push(id, literal);
                    true
                }
                _ => false,
            };
        }
        if key.has_command_modifier() {
            return false;
        }

        let cursor = self.surface.cursor();
        match key.code {
            KeyCode::Insert => {
                let replace = self.create(Kind::Replace(Replace::new()));
                self.push(id, replace);
            }
            KeyCode::Enter => {
                let mut text = String::from("\n");
                if self.surface.options().auto_indent {
                    text.push_str(&self.surface.new_line_indentation(cursor));
                }
                self.type_text(id, &text);
            }
            KeyCode::Tab => {
                let options = self.surface.options();
                let text = if options.insert_spaces {
                    let width = options.real_indent_width().max(1) as usize;
                    " ".repeat(width - self.surface.visual_column(cursor) % width)
                } else {
                    "\t".to_owned()
                };
                self.type_text(id, &text);
            }
            KeyCode::Backspace => {
                if self.surface.has_selection() {
                    let bound = self.surface.selection_bound();
                    self.erase(id, cursor, bound);
                } else if cursor > 0 {
                    self.erase(id, cursor - 1, cursor);
                }
            }
            KeyCode::Delete => self.erase(id, cursor, cursor + 1),
            KeyCode::Char(ch) => {
                let mut buf = [0; 4];
                self.type_text(id, ch.encode_utf8(&mut buf));
            }
            _ => return self.move_key(key),
        }
        true
    }

    /// `^U`: delete back to the first non-blank, or to the line start when
    /// already there.
    fn clear_to_first_char(&mut self, id: StateId) {
        let cursor = self.surface.cursor();
        let mut begin = TextIter::new(&self.surface, cursor);
        begin.set_line_start();
        let line_start = begin.offset();
        while begin.offset() < cursor && begin.is_space() {
            begin.forward_char();
        }
        let begin = if begin.offset() == cursor { line_start } else { begin.offset() };
        self.erase(id, begin, cursor);
    }

    // -----------------------------------------------------------------------
    // Replace
    // -----------------------------------------------------------------------

    pub(crate) fn replace_enter(&mut self, id: StateId) {
        self.tree.set_can_repeat(id, true);
        self.surface.set_overwrite(true);
        self.surface.begin_user_action();
    }

    pub(crate) fn replace_leave(&mut self, id: StateId) {
        let typed = self.tree.replace(id).map(|replace| replace.typed.clone()).unwrap_or_default();
        for _ in 1..self.tree.count(id) {
            self.overwrite_text(id, &typed);
        }
        self.surface.end_user_action();
    }

    pub(crate) fn replace_resume(&mut self, _id: StateId, from: StateId) {
        self.surface.set_overwrite(true);
        self.unparent(from);
    }

    pub(crate) fn replace_repeat(&mut self, id: StateId) {
        let typed = self.tree.replace(id).map(|replace| replace.typed.clone()).unwrap_or_default();
        self.surface.begin_user_action();
        for _ in 0..self.tree.count(id) {
            self.overwrite_text(id, &typed);
        }
        self.surface.end_user_action();
    }

    pub(crate) fn replace_keypress(&mut self, id: StateId, key: &KeyEvent) -> bool {
        if key.is_escape() || key.is_ctrl_char('c') {
            self.pop(id);
            return true;
        }

        if key.is_ctrl() {
            return match key.as_char() {
                Some('u') => {
                    let line = self.surface.line_of_offset(self.surface.cursor());
                    self.cursor_to(self.surface.line_start_offset(line));
                    true
                }
                Some('v') => {
                    let literal = self.create(Kind::InsertLiteral);
                    self.push(id, literal);
                    true
                }
                _ => false,
            };
        }
        if key.has_command_modifier() {
            return false;
        }

        let text = match key.code {
            KeyCode::Char(ch) => ch.to_string(),
            KeyCode::Enter => "\n".to_owned(),
            KeyCode::Tab => "\t".to_owned(),
            KeyCode::Backspace => {
                let cursor = self.surface.cursor();
                if !TextIter::new(&self.surface, cursor).starts_line() {
                    self.cursor_to(cursor - 1);
                    if let Some(replace) = self.tree.replace_mut(id) {
                        replace.typed.pop();
                    }
                }
                return true;
            }
            _ => return self.move_key(key),
        };

        self.overwrite_text(id, &text);
        if let Some(replace) = self.tree.replace_mut(id) {
            replace.typed.push_str(&text);
        }
        true
    }

    // -----------------------------------------------------------------------
    // InsertLiteral and CharPending
    // -----------------------------------------------------------------------

    pub(crate) fn insert_literal_keypress(&mut self, id: StateId, key: &KeyEvent) -> bool {
        let text = key.unescaped();
        if !text.is_empty() {
            let cursor = self.surface.cursor();
            if self.surface.overwrite() && cursor + 1 < self.surface.len_chars() {
                self.erase(id, cursor, cursor + 1);
            }
            self.type_text(id, &text);

            if let Some(parent) = self.tree.parent(id) {
                if let Some(replace) = self.tree.replace_mut(parent) {
                    replace.typed.push_str(&text);
                }
            }
        }
        self.pop(id);
        true
    }

    pub(crate) fn char_pending_keypress(&mut self, id: StateId, key: &KeyEvent) -> bool {
        if !key.is_escape() {
            if let Some(pending) = self.tree.char_pending_mut(id) {
                pending.string = key.unescaped();
                pending.character = pending.string.chars().next();
            }
        }
        self.pop(id);
        true
    }

    /// Normal keeps the cursor on a char after text entry.
    pub(crate) fn leave_text_entry(&mut self) {
        let cursor = self.surface.cursor();
        if !TextIter::new(&self.surface, cursor).starts_line() {
            self.cursor_to(cursor - 1);
        }
        keep_on_char(&mut self.surface);
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

    fn vim(text: &str) -> Vim<RopeSurface> {
        Vim::new(RopeSurface::new(text))
    }

    #[test]
    fn typed_text_lands_in_dot_register() {
        let mut vim = vim("");
        vim.feed("ione<BS>e two<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "one two");
        assert_eq!(vim.context().registers().get(Some('.')).as_deref(), Some("one two"));
    }

    #[test]
    fn counted_insert_replays() {
        let mut vim = vim("\n");
        vim.feed("3iab<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "ababab\n");
    }

    #[test]
    fn append_then_repeat() {
        let mut vim = vim("");
        vim.feed("ahi<Esc>.").unwrap();
        assert_eq!(vim.surface().text(), "hihi");
    }

    #[test]
    fn insert_then_repeat_lands_before_the_cursor_char() {
        let mut vim = vim("");
        vim.feed("ihi<Esc>.").unwrap();
        assert_eq!(vim.surface().text(), "hhii");
    }

    #[test]
    fn open_line_below_keeps_indentation() {
        let mut vim = vim("    one\ntwo\n");
        vim.surface_mut().options_mut().auto_indent = true;
        vim.feed("ox<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "    one\n    x\ntwo\n");
    }

    #[test]
    fn open_line_above() {
        let mut vim = vim("one\ntwo\n");
        vim.feed("jOmid<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "one\nmid\ntwo\n");
    }

    #[test]
    fn ctrl_u_clears_to_first_non_blank() {
        let mut vim = vim("  \n");
        vim.feed("Aabc<C-u>x<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "  x\n");
    }

    #[test]
    fn literal_insert() {
        let mut vim = vim("");
        vim.feed("i<C-v><Tab>x<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "\tx");
    }

    #[test]
    fn enter_auto_indents() {
        let mut vim = vim("\tab\n");
        vim.surface_mut().options_mut().auto_indent = true;
        vim.feed("A<CR>c<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "\tab\n\tc\n");
    }

    #[test]
    fn replace_mode_overwrites_and_counts() {
        let mut once = vim("abcdef\n");
        once.feed("Rxy<Esc>").unwrap();
        assert_eq!(once.surface().text(), "xycdef\n");

        let mut twice = vim("abcdef\n");
        twice.feed("2Rxy<Esc>").unwrap();
        assert_eq!(twice.surface().text(), "xyxyef\n");
    }

    #[test]
    fn replace_at_line_end_appends() {
        let mut vim = vim("ab\n");
        vim.feed("lRxyz<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "axyz\n");
    }

    #[test]
    fn insert_key_switches_to_replace_and_escape_leaves_both() {
        let mut vim = vim("abc\n");
        vim.feed("i<Insert>XY<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "XYc\n");
        assert_eq!(vim.mode(), crate::vim::Mode::Normal);
    }

    #[test]
    fn char_pending_keeps_the_typed_text() {
        let mut vim = vim("abc\n");
        let pending = vim.create(Kind::CharPending(CharPending::default()));
        vim.char_pending_keypress(pending, &KeyEvent::ctrl('l'));
        let pending = vim.tree.char_pending(pending).cloned().unwrap_or_default();
        assert_eq!(pending.string(), "\x0c");
        assert_eq!(pending.character(), Some('\x0c'));

        let escaped = vim.create(Kind::CharPending(CharPending::default()));
        vim.char_pending_keypress(escaped, &KeyEvent::key(KeyCode::Escape));
        assert_eq!(vim.tree.char_pending(escaped).and_then(CharPending::character), None);
    }
}
