// SPDX-License-Identifier: MIT

//! Commands: named actions over a span.
//!
//! A [`Command`] defines its span with a motion, a text object, the live
//! selection or an ex range, then runs one body from the table in
//! [`CommandName`]. Operators in Normal (`d`, `y`, `>`…) push a command
//! with a pending motion child; Visual and the command bar build one
//! and repeat it directly.
//!
//! Running a command:
//!
//! 1. remember the cursor in a left-gravity mark;
//! 2. select the span (linewise if either motion is linewise);
//! 3. run the body;
//! 4. put the cursor back on the mark unless the body placed it.

use n_text::options::{SetDirective, parse_set};
use n_text::{CaseChange, Gravity, MarkId, SearchSettings, TextSurface};
use regex::Regex;
use tracing::debug;

use crate::ex::{self, CommandName, Position, Range};
use crate::host::Host;
use crate::iter::TextIter;
use crate::motion::Motion;
use crate::registers::RegisterWrite;
use crate::scroll::{self, SEARCH_MARGIN};
use crate::state::{Kind, KindTag, StateId, select_linewise};
use crate::text_object::TextObject;
use crate::vim::Vim;

/// `:set ft=` names that differ from language ids.
const FILETYPES: &[(&str, &str)] = &[
    ("cs", "c-sharp"),
    ("docbk", "docbook"),
    ("javascript", "js"),
    ("lhaskell", "haskell-literate"),
    ("spec", "rpmspec"),
    ("tex", "latex"),
    ("xhtml", "html"),
];

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A command node.
#[derive(Debug)]
pub(crate) struct Command {
    name: CommandName,
    motion: Option<Motion>,
    selection_motion: Option<Motion>,
    text_object: Option<TextObject>,
    options: Option<String>,
    char_pending: Option<String>,
    /// Ex range, begin (left gravity) and end (right gravity).
    range: Option<(MarkId, MarkId)>,
    /// Built from a command line rather than a key.
    from_ex: bool,
    /// Runs over a selection that is already whole lines (Visual line).
    linewise: bool,
    /// A motion it waited for failed.
    cancelled: bool,
}

impl Command {
    pub(crate) const fn new(name: CommandName) -> Self {
        Self {
            name,
            motion: None,
            selection_motion: None,
            text_object: None,
            options: None,
            char_pending: None,
            range: None,
            from_ex: false,
            linewise: false,
            cancelled: false,
        }
    }

    pub(crate) fn with_motion(mut self, motion: Option<Motion>) -> Self {
        self.motion = motion;
        self
    }

    pub(crate) fn with_selection_motion(mut self, motion: Option<Motion>) -> Self {
        self.selection_motion = motion;
        self
    }

    pub(crate) const fn with_text_object(mut self, text_object: TextObject) -> Self {
        self.text_object = Some(text_object);
        self
    }

    pub(crate) const fn with_linewise(mut self, linewise: bool) -> Self {
        self.linewise = linewise;
        self
    }

    pub(crate) const fn has_motion(&self) -> bool {
        self.motion.is_some()
    }

    /// Surface marks owned by the command.
    pub(crate) fn range_marks(&self) -> Vec<MarkId> {
        self.range.map(|(begin, end)| vec![begin, end]).unwrap_or_default()
    }
}

/// Whether the body left the cursor where it wants it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Restore,
    Placed,
}

/// Everything a body reads, copied out of the node.
#[derive(Debug, Clone)]
struct Invocation {
    name: CommandName,
    options: Option<String>,
    char_pending: Option<String>,
    range: Option<(MarkId, MarkId)>,
    charwise_motion: bool,
    linewise: bool,
}

impl Invocation {
    fn trimmed_options(&self) -> Option<&str> {
        self.options.as_deref().map(str::trim).filter(|options| !options.is_empty())
    }
}

/// ROT13 over ASCII letters.
fn rot13(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'a'..='m' | 'A'..='M' => char::from(ch as u8 + 13),
            'n'..='z' | 'N'..='Z' => char::from(ch as u8 - 13),
            _ => ch,
        })
        .collect()
}

/// Every char but newlines replaced with `with`.
fn replace_chars(text: &str, with: &str) -> String {
    text.chars()
        .map(|ch| if ch == '\n' { "\n" } else { with })
        .collect()
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

// ---------------------------------------------------------------------------
// Construction from a command line
// ---------------------------------------------------------------------------

impl<S: TextSurface, H: Host> Vim<S, H> {
    pub(crate) fn create_command(&mut self, command: Command) -> StateId {
        self.create(Kind::Command(command))
    }

    /// Resolve one end of an ex range to an offset.
    fn resolve_position(&self, position: Position) -> Option<usize> {
        let cursor = self.surface.cursor();
        let lines = self.surface.line_count();
        let offset = match position {
            Position::Mark(name) => {
                let mut it = TextIter::new(&self.surface, self.ctx.marks.get(&self.surface, name)?);
                if name == '<' && !it.starts_line() {
                    it.set_line_start();
                } else if name == '>' && !it.ends_line() && it.starts_line() {
                    it.backward_char();
                }
                it.offset()
            }
            Position::CursorLine => self.surface.line_start_offset(self.surface.line_of_offset(cursor)),
            Position::End => self.surface.len_chars(),
            Position::Below(n) => {
                let line = self.surface.line_of_offset(cursor) + n;
                if line < lines {
                    self.surface.line_end_offset(line)
                } else {
                    self.surface.len_chars()
                }
            }
            Position::Line(line) if line < lines => self.surface.line_start_offset(line),
            Position::Line(_) => self.surface.len_chars(),
        };
        Some(offset)
    }

    /// Build a detached command from a command line such as `:1,2d`.
    /// Lines that name no command give `None`.
    pub(crate) fn parse_command(&mut self, line: &str) -> Option<StateId> {
        let Some(parsed) = ex::parse_line(line) else {
            debug!(line, "not a command line");
            return None;
        };

        let range = match parsed.range {
            Some(Range::Whole) => Some((0, self.surface.len_chars())),
            Some(Range::Between(begin, end)) => {
                let Some(span) = self.resolve_position(begin).zip(self.resolve_position(end)) else {
                    debug!(line, "range names an unset mark");
                    return None;
                };
                Some(span)
            }
            None => None,
        };

        let mut command = Command::new(parsed.name);
        command.options = parsed.options;
        command.from_ex = true;
        command.range = range.map(|(begin, end)| {
            (
                self.surface.create_mark(begin, Gravity::Left),
                self.surface.create_mark(end, Gravity::Right),
            )
        });
        Some(self.create_command(command))
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub(crate) fn command_leave(&mut self, id: StateId) {
        self.command_repeat(id);
    }

    pub(crate) fn command_resume(&mut self, id: StateId, from: StateId) {
        match self.tag_of(from) {
            KindTag::Motion if self.tree.command(id).is_some_and(|command| !command.has_motion()) => {
                let motion = self.finished_motion(from);
                self.unparent(from);

                let count = self.tree.count(id);
                if let Some(command) = self.tree.command_mut(id) {
                    match motion {
                        Some(motion) => {
                            let total = motion.count() * count;
                            command.motion = Some(motion.with_count(total));
                        }
                        None => {
                            debug!(command = %command.name, "motion failed, command cancelled");
                            command.cancelled = true;
                        }
                    }
                }
                self.tree.set_count(id, 0);
                self.pop(id);
            }
            KindTag::CharPending => {
                let pending = self.tree.char_pending(from).cloned().unwrap_or_default();
                self.unparent(from);
                if let Some(command) = self.tree.command_mut(id) {
                    if pending.character().is_some() && !pending.string().is_empty() {
                        command.char_pending = Some(pending.string().to_owned());
                    }
                }
                self.pop(id);
            }
            _ => self.unparent(from),
        }
    }

    /// Select the span and run the body.
    pub(crate) fn command_repeat(&mut self, id: StateId) {
        let Some(command) = self.tree.command(id) else {
            return;
        };
        if command.cancelled {
            return;
        }

        let mut invocation = Invocation {
            name: command.name,
            options: command.options.clone(),
            char_pending: command.char_pending.clone(),
            range: command.range,
            charwise_motion: command.motion.as_ref().is_some_and(|motion| !motion.is_linewise()),
            linewise: command.linewise,
        };
        let motion = command.motion.clone();
        let selection_motion = command.selection_motion.clone();
        let text_object = command.text_object;
        let from_ex = command.from_ex;

        let column = self.visual_column(id);
        let mut iter = self.surface.cursor();
        let mut selection = self.surface.selection_bound();
        let mark = self.surface.create_mark(iter, Gravity::Left);
        let mut linewise = false;

        if let Some(object) = text_object {
            selection = iter;
            if let Some((begin, end)) = object.select(&self.surface, iter) {
                iter = begin;
                selection = end;
            }
        } else if motion.is_some() || selection_motion.is_some() {
            if let Some(motion) = &motion {
                motion.apply(&mut self.surface, &mut self.ctx, &mut iter, column, true);
                linewise |= motion.is_linewise();
            }
            if let Some(motion) = &selection_motion {
                motion.apply(&mut self.surface, &mut self.ctx, &mut selection, column, true);
                linewise |= motion.is_linewise();
            }
        } else if let Some((begin, end)) = invocation.range {
            let offset = |mark| self.surface.mark_offset(mark).unwrap_or(iter);
            (iter, selection) = (offset(begin), offset(end));
            linewise = true;
        } else if from_ex {
            (iter, selection, linewise) = self.default_ex_span(invocation.name, iter);
        }

        if linewise {
            select_linewise(&mut self.surface, iter, selection);
            invocation.linewise = true;
        } else {
            self.surface.select(iter, selection);
        }

        debug!(command = %invocation.name, "run");
        let cursor = self.run_command(id, &invocation);

        if cursor == Cursor::Restore {
            if let Some(offset) = self.surface.mark_offset(mark) {
                self.surface.select(offset, offset);
            }
        }
        self.surface.delete_mark(mark);
    }

    /// Span of an ex command typed without a range.
    fn default_ex_span(&self, name: CommandName, cursor: usize) -> (usize, usize, bool) {
        let line = self.surface.line_of_offset(cursor);
        match name {
            CommandName::Delete | CommandName::Yank => (cursor, cursor, true),
            CommandName::Join => {
                let next = (line + 1).min(self.surface.line_count().saturating_sub(1));
                (self.surface.line_start_offset(line), self.surface.line_end_offset(next), false)
            }
            CommandName::Sort => (0, self.surface.len_chars(), false),
            _ => (cursor, self.surface.selection_bound(), false),
        }
    }

    fn run_command(&mut self, id: StateId, invocation: &Invocation) -> Cursor {
        use CommandName as C;

        match invocation.name {
            C::Delete => self.command_delete(id, invocation),
            C::Yank => self.command_yank(id),
            C::Join => self.command_join(id),
            C::Undo => self.command_undo(id, false),
            C::Redo => self.command_undo(id, true),
            C::Nohl => {
                self.surface.set_search_highlight(false);
                Cursor::Restore
            }
            C::Set => self.command_set(invocation),
            C::Colorscheme => {
                if let Some(scheme) = invocation.trimmed_options() {
                    if !self.surface.set_style_scheme(scheme) {
                        debug!(scheme, "unknown style scheme");
                    }
                }
                Cursor::Restore
            }
            C::Sort => self.command_sort(id),
            C::Write => {
                self.host.write(invocation.trimmed_options());
                Cursor::Restore
            }
            C::Edit => {
                self.host.edit(invocation.trimmed_options());
                Cursor::Restore
            }
            C::PasteAfter => self.command_paste(id, true),
            C::PasteBefore => self.command_paste(id, false),
            C::ToggleCase => self.command_toggle_case(id),
            C::Upcase => self.command_change_case(id, CaseChange::Upper),
            C::Downcase => self.command_change_case(id, CaseChange::Lower),
            C::Rot13 => self.command_rot13(id),
            C::ReplaceOne => self.command_replace_one(invocation),
            C::Indent => self.command_shift(id, true),
            C::Unindent => self.command_shift(id, false),
            C::Filter => self.command_filter(id),
            C::Format => self.command_format(),
            C::LineNumber => self.command_line_number(invocation),
            C::Search => self.command_search(id, invocation, false),
            C::SearchReverse => self.command_search(id, invocation, true),
            C::SearchReplace => self.command_search_replace(invocation),
            C::JumpBackward => self.command_jump(false),
            C::JumpForward => self.command_jump(true),
        }
    }

    fn ordered_selection(&self) -> (usize, usize) {
        ordered(self.surface.cursor(), self.surface.selection_bound())
    }

    /// Text of the selection for a register; a span touching the end of
    /// the buffer is stored linewise.
    fn selection_for_register(&self) -> (usize, usize, String) {
        let (begin, end) = self.ordered_selection();
        let mut text = self.surface.slice(begin, end);
        let len = self.surface.len_chars();
        if (begin == len || end == len) && !text.ends_with('\n') {
            text.push('\n');
        }
        (begin, end, text)
    }

    /// First non-blank of the line holding `offset`.
    fn first_non_blank(&self, offset: usize) -> usize {
        let mut it = TextIter::new(&self.surface, offset);
        it.set_line_start();
        while !it.ends_line() && it.is_space() {
            it.forward_char();
        }
        it.offset()
    }

    fn cursor_at(&mut self, offset: usize) -> Cursor {
        self.surface.select(offset, offset);
        Cursor::Placed
    }

    // -----------------------------------------------------------------------
    // Bodies
    // -----------------------------------------------------------------------

    fn command_delete(&mut self, id: StateId, invocation: &Invocation) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        self.tree.set_can_repeat(id, true);

        let (mut begin, end, text) = self.selection_for_register();
        self.set_register_value(id, &text, RegisterWrite::Delete);

        // Whole lines up to a final line with no newline: take the newline
        // before them too, so no empty line is left behind.
        if invocation.linewise
            && begin > 0
            && end == self.surface.len_chars()
            && !self.surface.slice(begin, end).ends_with('\n')
        {
            begin -= 1;
        }

        self.surface.begin_user_action();
        self.surface.delete(begin, end);
        self.surface.end_user_action();
        Cursor::Restore
    }

    fn command_yank(&mut self, id: StateId) -> Cursor {
        let (_, _, text) = self.selection_for_register();
        self.set_register_value(id, &text, RegisterWrite::Yank);
        Cursor::Restore
    }

    fn command_join(&mut self, id: StateId) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }

        let (begin, mut end) = self.ordered_selection();
        // A linewise span ends on the start of the line after it.
        if end > begin
            && TextIter::new(&self.surface, end).starts_line()
            && self.surface.line_of_offset(end) > self.surface.line_of_offset(begin) + 1
        {
            end -= 1;
        }

        let mut first_end = TextIter::new(&self.surface, begin);
        if !first_end.ends_line() {
            first_end.forward_to_line_end();
        }
        let offset = first_end.offset();

        self.surface.begin_user_action();
        self.surface.join_lines(begin, end);
        self.surface.place_cursor(offset.min(self.surface.len_chars()));
        self.surface.end_user_action();

        self.tree.set_can_repeat(id, true);
        Cursor::Placed
    }

    fn command_undo(&mut self, id: StateId, redo: bool) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        for _ in 0..self.tree.count(id) {
            if redo {
                if !self.surface.can_redo() {
                    break;
                }
                self.surface.redo();
            } else {
                if !self.surface.can_undo() {
                    break;
                }
                self.surface.undo();
            }
        }
        Cursor::Placed
    }

    fn command_set(&mut self, invocation: &Invocation) -> Cursor {
        let Some(options) = invocation.trimmed_options() else {
            return Cursor::Restore;
        };

        for directive in parse_set(options) {
            match directive {
                SetDirective::On(name) => self.set_bool_option(&name, true),
                SetDirective::Off(name) => self.set_bool_option(&name, false),
                SetDirective::Assign(name, value) => self.set_value_option(&name, &value),
            }
        }
        Cursor::Restore
    }

    fn set_bool_option(&mut self, name: &str, on: bool) {
        match name {
            "hls" | "hlsearch" => self.surface.set_search_highlight(on),
            "et" | "expandtab" => self.surface.options_mut().insert_spaces = on,
            "nu" | "number" => self.surface.options_mut().show_line_numbers = on,
            "wrap" => self.surface.options_mut().wrap = on,
            "ai" | "autoindent" => self.surface.options_mut().auto_indent = on,
            "is" | "incsearch" => {}
            _ => debug!(option = name, "unknown :set option"),
        }
    }

    fn set_value_option(&mut self, name: &str, value: &str) {
        match name {
            "ts" | "tabstop" => match value.parse::<i64>() {
                Ok(width) => self
                    .surface
                    .options_mut()
                    .set_tab_width(u32::try_from(width.clamp(0, 32)).unwrap_or(0)),
                Err(_) => debug!(value, "bad tabstop"),
            },
            "sw" | "shiftwidth" => match value.parse::<i64>() {
                Ok(width) => self
                    .surface
                    .options_mut()
                    .set_indent_width(u32::try_from(width.clamp(0, 32)).unwrap_or(0)),
                Err(_) => debug!(value, "bad shiftwidth"),
            },
            "ft" | "filetype" => {
                let language = FILETYPES
                    .iter()
                    .find(|(ft, _)| *ft == value)
                    .map_or(value, |(_, id)| *id);
                if !self.surface.set_language(language) {
                    debug!(language, "unknown language");
                }
            }
            _ => debug!(option = name, "unknown :set option"),
        }
    }

    fn command_sort(&mut self, id: StateId) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        let (begin, end) = self.ordered_selection();
        self.surface.begin_user_action();
        self.surface.sort_lines(begin, end);
        self.surface.end_user_action();
        self.tree.set_can_repeat(id, true);
        Cursor::Restore
    }

    fn command_paste(&mut self, id: StateId, after: bool) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        let Some(text) = self.register_value(id) else {
            return Cursor::Restore;
        };
        let count = self.tree.count(id);
        let (begin, end) = self.ordered_selection();

        self.surface.begin_user_action();
        let cursor = if let Some(line) = text.strip_suffix('\n') {
            if after {
                let mut at = end;
                let mut first = None;
                for _ in 0..count {
                    let mut it = TextIter::new(&self.surface, at);
                    if !it.ends_line() {
                        it.forward_to_line_end();
                    }
                    at = it.offset();
                    self.surface.insert(at, "\n");
                    at += 1;
                    first.get_or_insert(at);
                    self.surface.insert(at, line);
                    at += line.chars().count();
                }
                first
            } else {
                let mut it = TextIter::new(&self.surface, begin);
                it.set_line_start();
                let start = it.offset();
                for _ in 0..count {
                    self.surface.insert(start, &text);
                }
                Some(start)
            }
        } else {
            let mut at = if after { end } else { begin };
            if after && !TextIter::new(&self.surface, at).ends_line() {
                at += 1;
            }
            for _ in 0..count {
                self.surface.insert(at, &text);
                at += text.chars().count();
            }
            None
        };
        self.surface.end_user_action();

        match cursor {
            Some(offset) => self.cursor_at(offset),
            None => Cursor::Restore,
        }
    }

    fn command_toggle_case(&mut self, id: StateId) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        let iter = self.surface.cursor();
        let bound = self.surface.selection_bound();
        self.surface.change_case(iter, bound, CaseChange::Toggle);
        self.tree.set_can_repeat(id, true);

        let it = TextIter::new(&self.surface, iter);
        let target = if it.ends_line() && !it.starts_line() { iter - 1 } else { iter };
        self.cursor_at(target)
    }

    fn command_change_case(&mut self, id: StateId, case: CaseChange) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        let (begin, end) = self.ordered_selection();
        self.surface.change_case(begin, end, case);
        self.tree.set_can_repeat(id, true);
        self.cursor_at(begin)
    }

    fn command_rot13(&mut self, id: StateId) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        let (begin, end) = self.ordered_selection();
        let text = rot13(&self.surface.slice(begin, end));

        self.surface.begin_user_action();
        self.surface.delete(begin, end);
        self.surface.insert(begin, &text);
        self.surface.end_user_action();

        self.tree.set_can_repeat(id, true);
        Cursor::Restore
    }

    fn command_replace_one(&mut self, invocation: &Invocation) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        let Some(with) = invocation.char_pending.as_deref() else {
            return Cursor::Restore;
        };
        let (begin, end) = self.ordered_selection();
        let text = replace_chars(&self.surface.slice(begin, end), with);

        self.surface.begin_user_action();
        self.surface.delete(begin, end);
        self.surface.insert(begin, &text);
        self.surface.end_user_action();

        let new_end = begin + text.chars().count();
        if invocation.charwise_motion && new_end > 0 {
            return self.cursor_at(new_end - 1);
        }
        Cursor::Restore
    }

    fn command_shift(&mut self, id: StateId, indent: bool) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        self.tree.set_can_repeat(id, true);

        let (begin, end) = self.ordered_selection();
        let end_mark = self.surface.create_mark(end, Gravity::Right);

        self.surface.begin_user_action();
        for _ in 0..self.tree.count(id) {
            let end = self.surface.mark_offset(end_mark).unwrap_or(end);
            if indent {
                self.surface.indent_lines(begin, end);
            } else {
                self.surface.unindent_lines(begin, end);
            }
        }
        self.surface.end_user_action();
        self.surface.delete_mark(end_mark);

        let target = self.first_non_blank(begin.min(self.surface.len_chars()));
        self.cursor_at(target)
    }

    /// Re-indent every line of the selection.
    fn reindent_selection(&mut self) {
        let (begin, end) = self.ordered_selection();
        let first = self.surface.line_of_offset(begin);
        let mut last = self.surface.line_of_offset(end);
        if last > first && self.surface.line_start_offset(last) == end {
            last -= 1;
        }

        self.surface.begin_user_action();
        for line in first..=last {
            self.surface.reindent_line(line);
        }
        self.surface.end_user_action();
    }

    fn command_filter(&mut self, id: StateId) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        self.tree.set_can_repeat(id, true);

        let (begin, end) = self.ordered_selection();
        self.surface.begin_user_action();
        if !self.host.filter(begin, end) {
            self.reindent_selection();
        }
        self.surface.end_user_action();

        let target = self.first_non_blank(begin.min(self.surface.len_chars()));
        self.cursor_at(target)
    }

    fn command_format(&mut self) -> Cursor {
        if !self.surface.is_editable() {
            return Cursor::Restore;
        }
        let (begin, end) = self.ordered_selection();
        self.surface.begin_user_action();
        if !self.host.format(begin, end) {
            self.reindent_selection();
        }
        self.surface.end_user_action();
        self.cursor_at(begin.min(self.surface.len_chars()))
    }

    fn command_line_number(&mut self, invocation: &Invocation) -> Cursor {
        let Some(number) = invocation.trimmed_options().and_then(|n| n.parse::<usize>().ok()) else {
            return Cursor::Restore;
        };
        let line = number.saturating_sub(1).min(self.surface.line_count().saturating_sub(1));

        self.push_jump(self.surface.cursor());
        let target = self.first_non_blank(self.surface.line_start_offset(line));
        scroll::scroll_to_offset(&mut self.surface, target, SEARCH_MARGIN);
        self.cursor_at(target)
    }

    fn command_jump(&mut self, forward: bool) -> Cursor {
        let target = if forward {
            self.ctx.jumplist.next(&mut self.surface)
        } else {
            self.ctx.jumplist.previous(&mut self.surface)
        };
        match target {
            Some(offset) => self.cursor_at(offset),
            None => Cursor::Restore,
        }
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    fn command_search(&mut self, id: StateId, invocation: &Invocation, reverse: bool) -> Cursor {
        let pattern = invocation.options.clone().unwrap_or_default();
        self.ctx.reverse_search = reverse;
        self.ctx.search = SearchSettings {
            regex: Regex::new(&pattern).is_ok(),
            pattern,
            case_sensitive: true,
            at_word_boundaries: false,
            ..self.ctx.search.clone()
        };
        self.surface.set_search_highlight(true);

        let cursor = self.surface.cursor();
        let found = if reverse {
            self.surface.find_backward(&self.ctx.search, cursor)
        } else {
            self.surface.find_forward(&self.ctx.search, cursor + 1)
        };

        let found = match found {
            Ok(found) => found,
            Err(err) => {
                debug!(%err, "search failed");
                None
            }
        };
        let Some(found) = found else {
            self.surface.set_search_highlight(false);
            return Cursor::Restore;
        };

        self.push_jump(cursor);
        match self.tree.find_ancestor(id, KindTag::Visual) {
            Some(visual) => {
                self.visual_warp(visual, found.start);
                if let Some(visual) = self.tree.visual_mut(visual) {
                    visual.ignore_command();
                }
            }
            None => self.surface.select(found.start, found.start),
        }
        scroll::scroll_to_offset(&mut self.surface, found.start, SEARCH_MARGIN);
        Cursor::Placed
    }

    fn command_search_replace(&mut self, invocation: &Invocation) -> Cursor {
        let Some(parts) = invocation.options.as_deref().and_then(ex::parse_substitution) else {
            debug!("malformed substitution");
            return Cursor::Restore;
        };
        let Some(search) = parts.search.clone().filter(|search| !search.is_empty()) else {
            return Cursor::Restore;
        };
        let replace = parts.replace.clone().unwrap_or_default();
        let all = parts.has_flag('g');

        self.ctx.reverse_search = false;
        self.ctx.search = SearchSettings {
            pattern: search,
            regex: true,
            case_sensitive: !parts.has_flag('i'),
            at_word_boundaries: false,
            ..self.ctx.search.clone()
        };
        self.surface.set_search_highlight(false);

        let range = invocation.range;
        let mut from = match range {
            Some((begin, _)) => self.surface.mark_offset(begin).unwrap_or(0),
            None => self.ordered_selection().0,
        };
        let line = self.surface.line_of_offset(from);
        let mut last_line = None;
        let mut jumped = false;

        self.surface.begin_user_action();
        loop {
            let found = match self.surface.find_forward(&self.ctx.search, from) {
                Ok(Some(found)) if !found.wrapped => found,
                Ok(_) => break,
                Err(err) => {
                    debug!(%err, "substitution pattern rejected");
                    break;
                }
            };

            if !jumped {
                jumped = true;
                self.push_jump(self.surface.cursor());
            }

            let match_line = self.surface.line_of_offset(found.start);
            match range {
                Some((_, end)) if found.start >= self.surface.mark_offset(end).unwrap_or(0) => break,
                None if match_line != line => break,
                _ => {}
            }

            let end = if last_line == Some(match_line) && !all {
                found.end
            } else {
                last_line = Some(match_line);
                match self.surface.replace_match(&self.ctx.search, &found, &replace) {
                    Ok(end) => end,
                    Err(err) => {
                        debug!(%err, "replacement failed");
                        break;
                    }
                }
            };
            from = if end == found.start { end + 1 } else { end };
            if from > self.surface.len_chars() {
                break;
            }
        }
        self.surface.end_user_action();

        match last_line {
            Some(line) => {
                let target = self.first_non_blank(self.surface.line_start_offset(line));
                self.cursor_at(target)
            }
            None => Cursor::Restore,
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

    fn vim(text: &str) -> Vim<RopeSurface> {
        Vim::new(RopeSurface::new(text))
    }

    #[test]
    fn rot13_only_touches_ascii_letters() {
        assert_eq!(rot13("Hello, World! é"), "Uryyb, Jbeyq! é");
        assert_eq!(rot13(&rot13("round trip")), "round trip");
    }

    #[test]
    fn replace_chars_keeps_newlines() {
        assert_eq!(replace_chars("ab\ncd", "x"), "xx\nxx");
    }

    #[test]
    fn ex_range_delete() {
        let mut vim = vim("a\nb\nc\n");
        vim.execute_command(":1,2d");
        assert_eq!(vim.surface().text(), "c\n");
        assert_eq!(vim.context().registers().get(None).as_deref(), Some("a\nb\n"));
    }

    #[test]
    fn ex_delete_without_range_takes_the_cursor_line() {
        let mut vim = vim("a\nb\nc\n");
        vim.feed("j").unwrap();
        vim.execute_command("d");
        assert_eq!(vim.surface().text(), "a\nc\n");
    }

    #[test]
    fn ex_range_with_unset_mark_is_ignored() {
        let mut vim = vim("a\nb\n");
        vim.execute_command(":'q,'rd");
        assert_eq!(vim.surface().text(), "a\nb\n");
    }

    #[test]
    fn substitute_first_or_all_on_the_cursor_line() {
        let mut first = vim("aa aa\naa\n");
        first.execute_command(":s/aa/b/");
        assert_eq!(first.surface().text(), "b aa\naa\n");

        let mut all = vim("aa aa\naa\n");
        all.execute_command(":s/aa/b/g");
        assert_eq!(all.surface().text(), "b b\naa\n");
    }

    #[test]
    fn substitute_whole_buffer_with_groups() {
        let mut vim = vim("foo=1\n  bar=2\n");
        vim.execute_command(r":%s/(\w+)=(\d)/\2=\1/");
        assert_eq!(vim.surface().text(), "1=foo\n  2=bar\n");
        assert_eq!(vim.surface().cursor(), 8);
    }

    #[test]
    fn substitute_case_insensitive() {
        let mut vim = vim("ABC abc\n");
        vim.execute_command(":s/abc/x/gi");
        assert_eq!(vim.surface().text(), "x x\n");
    }

    #[test]
    fn set_applies_options() {
        let mut vim = vim("");
        vim.execute_command(":set ts=4 sw=2 et nu ai nohls ft=cs");
        let options = vim.surface().options();
        assert_eq!(options.tab_width, 4);
        assert_eq!(options.indent_width, Some(2));
        assert!(options.insert_spaces && options.show_line_numbers && options.auto_indent);
        assert_eq!(options.language.as_deref(), Some("c-sharp"));
        assert!(!vim.surface().search_highlight());

        vim.execute_command(":set ts=99 noet");
        assert_eq!(vim.surface().options().tab_width, 32);
        assert!(!vim.surface().options().insert_spaces);
    }

    #[test]
    fn colorscheme_is_trimmed() {
        let mut vim = vim("");
        vim.execute_command(":colorscheme  oblivion ");
        assert_eq!(vim.surface().options().style_scheme.as_deref(), Some("oblivion"));
    }

    #[test]
    fn line_number_goes_to_first_non_blank() {
        let mut vim = vim("a\n  b\nc\n");
        vim.execute_command(":2");
        assert_eq!(vim.surface().cursor(), 4);
        vim.execute_command(":99");
        assert_eq!(vim.surface().line_of_offset(vim.surface().cursor()), 3);
    }

    #[test]
    fn search_forward_skips_the_match_under_the_cursor() {
        let mut vim = vim("foo bar foo\n");
        vim.execute_command("/foo");
        assert_eq!(vim.surface().cursor(), 8);
        assert!(vim.surface().search_highlight());
        vim.execute_command("?bar");
        assert_eq!(vim.surface().cursor(), 4);
        assert!(vim.context().reverse_search);
    }

    #[test]
    fn invalid_regex_searches_literally() {
        let mut vim = vim("x a(b\n");
        vim.execute_command("/a(");
        assert_eq!(vim.surface().cursor(), 2);
        assert!(!vim.context().search.regex);
    }

    #[test]
    fn failed_search_turns_highlight_off() {
        let mut vim = vim("abc\n");
        vim.execute_command("/zzz");
        assert_eq!(vim.surface().cursor(), 0);
        assert!(!vim.surface().search_highlight());
    }

    #[test]
    fn join_range_and_default() {
        let mut ranged = vim("a\n  b\nc\n");
        ranged.execute_command(":1,2j");
        assert_eq!(ranged.surface().text(), "a b\nc\n");
        assert_eq!(ranged.surface().cursor(), 1);

        let mut plain = vim("a\nb\nc\n");
        plain.execute_command(":j");
        assert_eq!(plain.surface().text(), "a b\nc\n");
    }

    #[test]
    fn sort_defaults_to_the_whole_buffer() {
        let mut vim = vim("c\na\nb\n");
        vim.execute_command(":sort");
        assert_eq!(vim.surface().text(), "a\nb\nc\n");
    }

    #[test]
    fn undo_and_redo_commands() {
        let mut vim = vim("abc\n");
        vim.feed("x").unwrap();
        assert_eq!(vim.surface().text(), "bc\n");
        vim.execute_command(":u");
        assert_eq!(vim.surface().text(), "abc\n");
        vim.execute_command(":redo");
        assert_eq!(vim.surface().text(), "bc\n");
    }
}
