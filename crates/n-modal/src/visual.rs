// SPDX-License-Identifier: MIT

//! Visual mode.
//!
//! Two surface marks hold the selection: where Visual started and the
//! cursor end. Motions move the cursor mark and the surface selection is
//! re-derived from both after every step, charwise or linewise. Block
//! mode is tracked charwise.
//!
//! Operators run as a [`Command`] over the live selection. The Visual
//! keeps the command and the chain of motions it saw, so `.` can rebuild
//! a selection of the same shape at the new cursor and run it again.

use n_keys::KeyEvent;
use n_text::{Gravity, MarkId, TextSurface};
use tracing::debug;

use crate::command::Command;
use crate::command_bar::CommandBar;
use crate::ex::CommandName;
use crate::host::Host;
use crate::insert::{CharPending, Insert, InsertAt};
use crate::iter::TextIter;
use crate::motion::{Motion, MotionState};
use crate::registers::RegisterWrite;
use crate::scroll;
use crate::state::{Kind, KindTag, StateId, select_linewise};
use crate::vim::Vim;

/// Shape of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualMode {
    Char,
    Line,
    Block,
}

impl VisualMode {
    /// Command-bar label while the mode is active.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Char => "-- VISUAL --",
            Self::Line => "-- VISUAL LINE --",
            Self::Block => "-- VISUAL BLOCK --",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Handler {
    #[default]
    Initial,
    Z,
    Register,
    G,
}

#[derive(Debug)]
pub(crate) struct Visual {
    mode: VisualMode,
    /// Every motion made so far, replayed by `.`.
    motion: Option<Motion>,
    /// The operator that ended this Visual.
    pub(crate) command: Option<StateId>,
    handler: Handler,
    /// `[started_at, cursor]`, empty until entered.
    marks: Vec<MarkId>,
    count: usize,
    ignore_command: bool,
}

impl Visual {
    pub(crate) const fn new(mode: VisualMode) -> Self {
        Self {
            mode,
            motion: None,
            command: None,
            handler: Handler::Initial,
            marks: Vec::new(),
            count: 0,
            ignore_command: false,
        }
    }

    pub(crate) const fn mode(&self) -> VisualMode {
        self.mode
    }

    pub(crate) fn marks(&self) -> &[MarkId] {
        &self.marks
    }

    /// Keep Visual active when the command bar closes (a search moved
    /// the selection instead of running an operator).
    pub(crate) fn ignore_command(&mut self) {
        self.ignore_command = true;
    }

    fn started_mark(&self) -> Option<MarkId> {
        self.marks.first().copied()
    }

    fn cursor_mark(&self) -> Option<MarkId> {
        self.marks.get(1).copied()
    }
}

/// Selection shape captured before an operator runs.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    cursor_after_start: bool,
    column: usize,
    linewise: bool,
}

impl<S: TextSurface, H: Host> Vim<S, H> {
    /// `(started_at, cursor)` offsets.
    fn visual_offsets(&self, id: StateId) -> Option<(usize, usize)> {
        let visual = self.tree.visual(id)?;
        let started = self.surface.mark_offset(visual.started_mark()?)?;
        let cursor = self.surface.mark_offset(visual.cursor_mark()?)?;
        Some((started, cursor))
    }

    fn visual_mode(&self, id: StateId) -> VisualMode {
        self.tree.visual(id).map_or(VisualMode::Char, Visual::mode)
    }

    fn set_visual_handler(&mut self, id: StateId, handler: Handler) {
        if let Some(visual) = self.tree.visual_mut(id) {
            visual.handler = handler;
        }
    }

    // -----------------------------------------------------------------------
    // Selection tracking
    // -----------------------------------------------------------------------

    /// Select so that the chars under both marks are included.
    fn visual_track_char(&mut self, started: usize, cursor: usize) {
        let mut started = started;
        let mut cursor = cursor;
        let cursor_it = TextIter::new(&self.surface, cursor);

        if cursor == started {
            if cursor_it.starts_line() && cursor_it.ends_line() {
                // Empty line: nothing but the newline to select.
            } else if cursor_it.ends_line() {
                started -= 1;
            } else {
                cursor += 1;
            }
        } else if started < cursor {
            if !cursor_it.ends_line() {
                cursor += 1;
            }
        } else if !TextIter::new(&self.surface, started).ends_line() {
            started += 1;
        }

        self.surface.select(cursor, started);
    }

    /// Re-derive the surface selection from the marks.
    pub(crate) fn visual_track(&mut self, id: StateId) {
        let Some((started, cursor)) = self.visual_offsets(id) else {
            return;
        };
        match self.visual_mode(id) {
            VisualMode::Line => select_linewise(&mut self.surface, cursor, started),
            VisualMode::Char | VisualMode::Block => self.visual_track_char(started, cursor),
        }
        scroll::scroll_cursor_onscreen(&mut self.surface);
    }

    /// Remember the column of the cursor mark for `j`/`k`.
    fn visual_track_column(&mut self, id: StateId) {
        if let Some((_, cursor)) = self.visual_offsets(id) {
            let column = self.surface.visual_column(cursor);
            self.set_visual_column(id, Some(column));
        }
    }

    /// Move the cursor end of the selection to `offset`.
    pub(crate) fn visual_warp(&mut self, id: StateId, offset: usize) {
        if let Some(mark) = self.tree.visual(id).and_then(Visual::cursor_mark) {
            self.surface.move_mark(mark, offset);
        }
        self.visual_track_column(id);
        self.visual_track(id);
    }

    /// A detached Visual with the same mode and selection as `id`.
    pub(crate) fn visual_clone(&mut self, id: StateId) -> Option<StateId> {
        let mode = self.visual_mode(id);
        let (started, cursor) = self.visual_offsets(id)?;
        let mut visual = Visual::new(mode);
        visual.marks = vec![
            self.surface.create_mark(started, Gravity::Left),
            self.surface.create_mark(cursor, Gravity::Right),
        ];
        Some(self.create(Kind::Visual(visual)))
    }

    /// A detached charwise Visual covering the surface's current
    /// selection, for selections made outside the engine.
    pub(crate) fn visual_from_selection(&mut self) -> StateId {
        let cursor = self.surface.cursor();
        let bound = self.surface.selection_bound();
        // Tracking re-adds the char under the far end.
        let (bound, cursor) = match cursor.cmp(&bound) {
            std::cmp::Ordering::Greater => (bound, cursor - 1),
            std::cmp::Ordering::Less => (bound - 1, cursor),
            std::cmp::Ordering::Equal => (bound, cursor),
        };
        let mut visual = Visual::new(VisualMode::Char);
        visual.marks = vec![
            self.surface.create_mark(bound, Gravity::Left),
            self.surface.create_mark(cursor, Gravity::Right),
        ];
        self.create(Kind::Visual(visual))
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub(crate) fn visual_enter(&mut self, id: StateId) {
        let count = self.tree.count(id);
        let count_set = self.tree.count_set(id);
        self.tree.set_count(id, 0);

        if self.tree.visual(id).is_some_and(|visual| visual.marks.is_empty()) {
            let cursor = self.surface.cursor();
            let marks = vec![
                self.surface.create_mark(cursor, Gravity::Left),
                self.surface.create_mark(cursor, Gravity::Right),
            ];
            if let Some(visual) = self.tree.visual_mut(id) {
                visual.marks = marks;
            }
        }
        if let Some(visual) = self.tree.visual_mut(id) {
            visual.count = if count_set { count } else { 0 };
        }

        self.visual_track_column(id);
        self.visual_track(id);
    }

    pub(crate) fn visual_leave(&mut self, id: StateId) {
        if !self.surface.has_selection() {
            return;
        }
        if let Some((_, cursor)) = self.visual_offsets(id) {
            self.surface.select(cursor, cursor);
        }
    }

    pub(crate) fn visual_resume(&mut self, id: StateId, from: StateId) {
        self.set_visual_handler(id, Handler::Initial);
        let command = self.tree.visual(id).and_then(|visual| visual.command);

        match self.tag_of(from) {
            KindTag::Motion => {
                if let Some(mut motion) = self.finished_motion(from) {
                    if motion.invalidates_visual_column() {
                        self.visual_track_column(id);
                    }
                    self.visual_track(id);
                    motion.set_mark(None);
                    if let Some(visual) = self.tree.visual_mut(id) {
                        visual.motion = Some(Motion::chained(visual.motion.take(), motion));
                    }
                } else {
                    self.visual_track(id);
                }
                self.unparent(from);
            }
            KindTag::CommandBar => self.visual_resume_from_bar(id, from),
            tag if Some(from) == command => {
                if matches!(tag, KindTag::Insert | KindTag::Replace) {
                    self.leave_text_entry();
                } else if let Some((started, cursor)) = self.visual_offsets(id) {
                    let start = started.min(cursor).min(self.surface.len_chars());
                    self.surface.select(start, start);
                }
                self.pop(id);
            }
            _ => self.unparent(from),
        }
    }

    fn visual_resume_from_bar(&mut self, id: StateId, bar: StateId) {
        let ignoring = self
            .tree
            .visual_mut(id)
            .is_some_and(|visual| std::mem::take(&mut visual.ignore_command));
        let command = if ignoring {
            None
        } else {
            self.tree.command_bar_mut(bar).and_then(|bar| bar.command.take())
        };
        self.unparent(bar);

        let Some(command) = command else {
            // Cancelled, or a search moved the selection.
            self.visual_track(id);
            return;
        };

        if let Some(old) = self.tree.visual_mut(id).and_then(|visual| visual.command.take()) {
            self.unparent(old);
        }
        self.adopt(id, command);
        if let Some(visual) = self.tree.visual_mut(id) {
            visual.command = Some(command);
        }
        self.pop(id);
    }

    /// `.` on a finished Visual: rebuild the selection from the cursor
    /// with the recorded motions and rerun the command.
    pub(crate) fn visual_repeat(&mut self, id: StateId) {
        let Some(visual) = self.tree.visual(id) else {
            return;
        };
        let (Some(started), Some(cursor_mark)) = (visual.started_mark(), visual.cursor_mark()) else {
            return;
        };
        let motion = visual.motion.clone();
        let command = visual.command;
        let count = self.tree.count(id);

        let cursor = self.surface.cursor();
        self.surface.move_mark(started, cursor);
        self.surface.move_mark(cursor_mark, cursor);
        self.visual_track(id);

        for _ in 0..count {
            if let Some(mut motion) = motion.clone() {
                motion.set_mark(Some(cursor_mark));
                let column = self.visual_column(id);
                motion.repeat(&mut self.surface, &mut self.ctx, column);
                self.visual_track(id);
            }
            let Some(command) = command else {
                continue;
            };
            let snapshot = self.visual_snapshot(id);
            self.repeat_state(command);
            if self.tag_of(command) == KindTag::Command {
                self.visual_restore_cursor(id, snapshot);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Operators
    // -----------------------------------------------------------------------

    fn visual_snapshot(&self, id: StateId) -> Snapshot {
        let (started, cursor) = self.visual_offsets(id).unwrap_or_default();
        Snapshot {
            cursor_after_start: cursor > started,
            column: self.surface.visual_column(cursor),
            linewise: self.visual_mode(id) == VisualMode::Line,
        }
    }

    /// Cursor after an operator: the start of the selection, keeping the
    /// column in a linewise selection made upward.
    fn visual_restore_cursor(&mut self, id: StateId, snapshot: Snapshot) {
        let Some((started, cursor)) = self.visual_offsets(id) else {
            return;
        };
        let len = self.surface.len_chars();
        let start = started.min(cursor).min(len);
        let target = if snapshot.linewise {
            let line = self.surface.line_of_offset(start);
            let column = if snapshot.cursor_after_start { 0 } else { snapshot.column };
            self.surface.offset_at_visual_column(line, column)
        } else {
            start
        };
        let target = target.min(len);
        self.surface.select(target, target);
    }

    /// Run `name` over the selection and leave Visual.
    fn visual_begin_command(&mut self, id: StateId, name: CommandName, restore: bool) -> bool {
        let count = self.tree.visual_mut(id).map_or(0, |visual| std::mem::take(&mut visual.count));
        if let Some(old) = self.tree.visual_mut(id).and_then(|visual| visual.command.take()) {
            self.unparent(old);
        }

        let snapshot = self.visual_snapshot(id);
        let command = self.create_command(Command::new(name).with_linewise(snapshot.linewise));
        self.tree.set_count(command, count);
        self.adopt(id, command);
        if let Some(visual) = self.tree.visual_mut(id) {
            visual.command = Some(command);
        }

        self.repeat_state(command);
        let can_repeat = self.tree.can_repeat(command);
        self.tree.set_can_repeat(id, can_repeat);

        if restore {
            self.visual_restore_cursor(id, snapshot);
        }
        self.pop(id);
        true
    }

    /// `c`, `s`, `C`, `S`: replace the selection with typed text.
    fn visual_begin_insert(&mut self, id: StateId) -> bool {
        let mut insert = Insert::new()
            .with_motion(Motion::none(), InsertAt::Here)
            .with_selection_motion(Motion::none());
        if self.visual_mode(id) == VisualMode::Line {
            insert = insert.with_suffix("\n");
        }
        self.visual_push_command(id, Kind::Insert(insert))
    }

    /// `I` / `A`: collapse to one end of the selection and insert there.
    fn visual_insert_at_edge(&mut self, id: StateId, end: bool) -> bool {
        let (begin, finish) = {
            let cursor = self.surface.cursor();
            let bound = self.surface.selection_bound();
            (cursor.min(bound), cursor.max(bound))
        };
        let target = if self.visual_mode(id) == VisualMode::Line {
            let mut it = TextIter::new(&self.surface, if end { finish.saturating_sub(1) } else { begin });
            if end {
                if !it.ends_line() {
                    it.forward_to_line_end();
                }
            } else {
                it.set_line_start();
            }
            it.offset()
        } else if end {
            finish
        } else {
            begin
        };
        self.surface.select(target, target);
        self.visual_push_command(id, Kind::Insert(Insert::new()))
    }

    /// `r{c}`: replace every selected char.
    fn visual_replace(&mut self, id: StateId) -> bool {
        let command = Kind::Command(Command::new(CommandName::ReplaceOne));
        self.visual_push_command(id, command);
        if let Some(command) = self.tree.visual(id).and_then(|visual| visual.command) {
            let pending = self.create(Kind::CharPending(CharPending::default()));
            self.push(command, pending);
        }
        true
    }

    /// Push `kind` as the repeatable command of this Visual.
    fn visual_push_command(&mut self, id: StateId, kind: Kind) -> bool {
        if let Some(old) = self.tree.visual_mut(id).and_then(|visual| visual.command.take()) {
            self.unparent(old);
        }
        let command = self.create(kind);
        self.tree.set_can_repeat(command, true);
        self.tree.set_can_repeat(id, true);
        if let Some(visual) = self.tree.visual_mut(id) {
            visual.command = Some(command);
        }
        self.push(id, command);
        true
    }

    /// `p` / `P`: replace the selection with a register, keeping the
    /// replaced text in the unnamed register.
    fn visual_paste(&mut self, id: StateId) -> bool {
        let Some(text) = self.register_value(id) else {
            self.host.beep();
            self.pop(id);
            return true;
        };
        if !self.surface.is_editable() {
            self.pop(id);
            return true;
        }

        let cursor = self.surface.cursor();
        let bound = self.surface.selection_bound();
        let (begin, end) = (cursor.min(bound), cursor.max(bound));
        let replaced = self.surface.slice(begin, end);

        self.surface.begin_user_action();
        self.surface.delete(begin, end);
        self.surface.insert(begin, &text);
        self.surface.end_user_action();

        self.set_register_value(id, &replaced, RegisterWrite::Delete);

        let inserted = text.chars().count();
        let target = if text.ends_with('\n') || inserted == 0 { begin } else { begin + inserted - 1 };
        self.surface.select(target, target);
        self.pop(id);
        true
    }

    fn visual_motion(&mut self, id: StateId, keys: &[KeyEvent]) -> bool {
        let Some(visual) = self.tree.visual_mut(id) else {
            return false;
        };
        let count = std::mem::take(&mut visual.count);
        let mark = visual.cursor_mark();

        let motion = self.create(Kind::Motion(MotionState::new().with_mark(mark)));
        self.tree.set_count(motion, count);
        self.push(id, motion);
        for key in keys {
            self.synthesize(motion, *key);
        }
        true
    }

    fn visual_set_mode(&mut self, id: StateId, mode: VisualMode) -> bool {
        if self.visual_mode(id) == mode {
            self.pop(id);
            return true;
        }
        if let Some(visual) = self.tree.visual_mut(id) {
            visual.mode = mode;
        }
        self.visual_track(id);
        true
    }

    /// `o`: jump to the other end of the selection.
    fn visual_swap_ends(&mut self, id: StateId) -> bool {
        let Some(visual) = self.tree.visual(id) else {
            return false;
        };
        let (Some(started_mark), Some(cursor_mark)) = (visual.started_mark(), visual.cursor_mark()) else {
            return false;
        };
        if let Some((started, cursor)) = self.visual_offsets(id) {
            self.surface.move_mark(started_mark, cursor);
            self.surface.move_mark(cursor_mark, started);
        }
        self.visual_track_column(id);
        self.visual_track(id);
        true
    }

    fn visual_command_bar(&mut self, id: StateId, text: &str) -> bool {
        let bar = self.create(Kind::CommandBar(CommandBar::with_text(text)));
        self.push(id, bar);
        true
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    pub(crate) fn visual_keypress(&mut self, id: StateId, key: &KeyEvent, string: &str) -> bool {
        if key.is_escape() {
            self.pop(id);
            return true;
        }

        let handler = self.tree.visual(id).map_or(Handler::Initial, |visual| visual.handler);
        let plain = (!key.has_command_modifier()).then(|| key.as_char()).flatten();

        match handler {
            Handler::Z => {
                self.set_visual_handler(id, Handler::Initial);
                let yalign = match plain {
                    Some('z') => 0.5,
                    Some('b') => 1.0,
                    Some('t') => 0.0,
                    _ => return true,
                };
                scroll::z_scroll(&mut self.surface, yalign);
                true
            }
            Handler::Register => {
                self.set_visual_handler(id, Handler::Initial);
                if let Some(name) = string.chars().next() {
                    self.set_current_register(id, Some(name));
                }
                true
            }
            Handler::G => {
                self.set_visual_handler(id, Handler::Initial);
                match plain {
                    Some('?') => self.visual_begin_command(id, CommandName::Rot13, true),
                    Some('q') => self.visual_begin_command(id, CommandName::Format, false),
                    _ => self.visual_motion(id, &[KeyEvent::char('g'), *key]),
                }
            }
            Handler::Initial => self.visual_initial(id, key, plain),
        }
    }

    fn visual_initial(&mut self, id: StateId, key: &KeyEvent, plain: Option<char>) -> bool {
        use CommandName as C;

        if key.is_ctrl() {
            return match key.as_char() {
                Some('y' | 'e' | 'b' | 'f' | 'u' | 'd') => self.visual_motion(id, &[*key]),
                Some('v') => self.visual_set_mode(id, VisualMode::Block),
                _ => false,
            };
        }

        let count = self.tree.visual(id).map_or(0, |visual| visual.count);
        if let Some(digit) = plain.and_then(|ch| ch.to_digit(10)) {
            if digit != 0 || count != 0 {
                if let Some(visual) = self.tree.visual_mut(id) {
                    visual.count = visual.count * 10 + digit as usize;
                }
                return true;
            }
        }

        match plain {
            Some('z') => {
                self.set_visual_handler(id, Handler::Z);
                true
            }
            Some('"') => {
                self.set_visual_handler(id, Handler::Register);
                true
            }
            Some('g') => {
                self.set_visual_handler(id, Handler::G);
                true
            }
            Some('d' | 'x') => self.visual_begin_command(id, C::Delete, true),
            Some('y') => self.visual_begin_command(id, C::Yank, true),
            Some('U') => self.visual_begin_command(id, C::Upcase, true),
            Some('u') => self.visual_begin_command(id, C::Downcase, true),
            Some('~') => self.visual_begin_command(id, C::ToggleCase, true),
            Some('>') => self.visual_begin_command(id, C::Indent, false),
            Some('<') => self.visual_begin_command(id, C::Unindent, false),
            Some('=') => self.visual_begin_command(id, C::Filter, false),
            Some('J') => self.visual_begin_command(id, C::Join, false),
            Some('v') => self.visual_set_mode(id, VisualMode::Char),
            Some('V') => self.visual_set_mode(id, VisualMode::Line),
            Some('o') => self.visual_swap_ends(id),
            Some('c' | 'C' | 's' | 'S') => self.visual_begin_insert(id),
            Some('I') => self.visual_insert_at_edge(id, false),
            Some('A') => self.visual_insert_at_edge(id, true),
            Some('r') => self.visual_replace(id),
            Some('p' | 'P') => self.visual_paste(id),
            Some(':') => self.visual_command_bar(id, ":'<,'>"),
            Some('/') => self.visual_command_bar(id, "/"),
            Some('?') => self.visual_command_bar(id, "?"),
            _ => {
                debug!(key = %key.to_vim_string().escape_debug(), "visual motion");
                self.visual_motion(id, &[*key])
            }
        }
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
    use crate::vim::Mode;

    fn vim(text: &str) -> Vim<RopeSurface> {
        Vim::new(RopeSurface::new(text))
    }

    fn selected(vim: &Vim<RopeSurface>) -> String {
        let (a, b) = (vim.surface().cursor(), vim.surface().selection_bound());
        vim.surface().slice(a.min(b), a.max(b))
    }

    #[test]
    fn labels() {
        assert_eq!(VisualMode::Char.label(), "-- VISUAL --");
        assert_eq!(VisualMode::Line.label(), "-- VISUAL LINE --");
        assert_eq!(VisualMode::Block.label(), "-- VISUAL BLOCK --");
    }

    #[test]
    fn charwise_selection_includes_the_cursor_char() {
        let mut vim = vim("hello world\n");
        vim.feed("v").unwrap();
        assert_eq!(selected(&vim), "h");
        vim.feed("e").unwrap();
        assert_eq!(selected(&vim), "hello");
        assert_eq!(vim.command_bar_text(), "-- VISUAL --");
    }

    #[test]
    fn backward_selection_keeps_the_start_char() {
        let mut vim = vim("hello world\n");
        vim.feed("wvb").unwrap();
        assert_eq!(selected(&vim), "hello w");
    }

    #[test]
    fn linewise_selection() {
        let mut vim = vim("one\ntwo\nthree\n");
        vim.feed("Vj").unwrap();
        assert_eq!(selected(&vim), "one\ntwo\n");
        assert_eq!(vim.mode(), Mode::Visual(VisualMode::Line));
    }

    #[test]
    fn delete_selection() {
        let mut vim = vim("hello world\n");
        vim.feed("vlld").unwrap();
        assert_eq!(vim.surface().text(), "lo world\n");
        assert_eq!(vim.mode(), Mode::Normal);
        assert_eq!(vim.surface().cursor(), 0);
        assert_eq!(vim.context().registers().get(None).as_deref(), Some("hel"));
    }

    #[test]
    fn delete_lines_then_repeat() {
        let mut vim = vim("a\nb\nc\nd\ne\n");
        vim.feed("Vjd").unwrap();
        assert_eq!(vim.surface().text(), "c\nd\ne\n");
        vim.feed(".").unwrap();
        assert_eq!(vim.surface().text(), "e\n");
    }

    #[test]
    fn delete_last_lines_without_a_final_newline() {
        let mut vim = vim("a\nb\nc");
        vim.feed("jVjd").unwrap();
        assert_eq!(vim.surface().text(), "a");
    }

    #[test]
    fn yank_restores_cursor_to_the_start() {
        let mut vim = vim("abc def\n");
        vim.feed("wvby").unwrap();
        assert_eq!(vim.surface().cursor(), 0);
        assert_eq!(vim.context().registers().get(None).as_deref(), Some("abc d"));
        assert!(!vim.surface().has_selection());
    }

    #[test]
    fn case_operators() {
        let mut vim = vim("abc def\n");
        vim.feed("veU").unwrap();
        assert_eq!(vim.surface().text(), "ABC def\n");
        vim.feed("wveu").unwrap();
        assert_eq!(vim.surface().text(), "ABC def\n");
        vim.feed("0veu").unwrap();
        assert_eq!(vim.surface().text(), "abc def\n");
    }

    #[test]
    fn change_selection() {
        let mut vim = vim("abc def\n");
        vim.feed("vecxyz<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "xyz def\n");
        assert_eq!(vim.mode(), Mode::Normal);
        assert_eq!(vim.surface().cursor(), 2);
    }

    #[test]
    fn replace_selection_chars() {
        let mut vim = vim("abcd\n");
        vim.feed("vlrx").unwrap();
        assert_eq!(vim.surface().text(), "xxcd\n");
        assert_eq!(vim.mode(), Mode::Normal);
    }

    #[test]
    fn swap_ends() {
        let mut vim = vim("abcdef\n");
        vim.feed("vllo").unwrap();
        assert_eq!(selected(&vim), "abc");
        vim.feed("l").unwrap();
        assert_eq!(selected(&vim), "bc");
    }

    #[test]
    fn switch_between_modes() {
        let mut vim = vim("one\ntwo\n");
        vim.feed("vV").unwrap();
        assert_eq!(vim.mode(), Mode::Visual(VisualMode::Line));
        assert_eq!(selected(&vim), "one\n");
        vim.feed("V").unwrap();
        assert_eq!(vim.mode(), Mode::Normal);
    }

    #[test]
    fn paste_over_selection_swaps_with_register() {
        let mut vim = vim("foo bar\n");
        vim.feed("yewvep").unwrap();
        assert_eq!(vim.surface().text(), "foo foo\n");
        assert_eq!(vim.context().registers().get(None).as_deref(), Some("bar"));
    }

    #[test]
    fn ex_range_over_selection() {
        let mut vim = vim("a\nb\nc\n");
        vim.feed("Vj:d\n").unwrap();
        assert_eq!(vim.surface().text(), "c\n");
        assert_eq!(vim.mode(), Mode::Normal);
    }

    #[test]
    fn counted_motion() {
        let mut vim = vim("a b c d\n");
        vim.feed("v2w").unwrap();
        assert_eq!(selected(&vim), "a b c");
    }

    #[test]
    fn search_extends_the_selection() {
        let mut vim = vim("one two three\n");
        vim.feed("v/thr\n").unwrap();
        assert_eq!(vim.mode(), Mode::Visual(VisualMode::Char));
        assert_eq!(selected(&vim), "one two t");
    }

    #[test]
    fn insert_before_selection() {
        let mut vim = vim("abc\n");
        vim.feed("lvlI-<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "a-bc\n");
    }

    #[test]
    fn escape_collapses_to_the_cursor_end() {
        let mut vim = vim("abcdef\n");
        vim.feed("vll<Esc>").unwrap();
        assert!(!vim.surface().has_selection());
        assert_eq!(vim.surface().cursor(), 2);
    }
}
