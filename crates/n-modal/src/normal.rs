// SPDX-License-Identifier: MIT

//! Normal mode: the root interactive state.
//!
//! Keys run through a small handler table. The initial handler routes a
//! key to a prefix handler (`d`, `c`, `g`, `z`, `"`, …) or straight to a
//! child state: a motion, an operator command, Insert, Visual or the
//! command bar.
//!
//! | Keys                     | Result                                         |
//! |--------------------------|------------------------------------------------|
//! | `1`-`9` then digits      | count                                          |
//! | `"x`                     | register for the next command                  |
//! | motion keys              | [`MotionState`] child moving the cursor        |
//! | `d{motion}` `dd` `d{obj}`| `:delete`                                      |
//! | `y{motion}` `yy` `Y`     | `:yank`                                        |
//! | `c{motion}` `cc` `c{obj}`| Insert replacing the span                      |
//! | `i I a A o O`            | Insert                                         |
//! | `R`                      | Replace                                        |
//! | `x s S C D J ~ p P`      | one-shot commands                              |
//! | `>>` `<<` `=`            | indent / unindent / filter                     |
//! | `g? gq gv gg ge gE`      | rot13, format, reselect, `g` motions           |
//! | `r{c}`                   | replace chars under the cursor                 |
//! | `u` `^R`                 | undo / redo                                    |
//! | `.`                      | repeat the last change                         |
//! | `v` `V` `^V`             | Visual                                         |
//! | `:` `/` `?`              | command bar                                    |
//! | `m{a-z}`                 | set mark                                       |
//! | `^O` `^I`                | jumplist back / forward                        |
//! | `zz zt zb`, `^D ^U ^E ^Y ^F ^B` | viewport                                |
//! | `^W{c,v,s,w}`            | window split, delegated to the host            |

use n_keys::{KeyCode, KeyEvent};
use n_text::TextSurface;
use tracing::debug;

use crate::command::Command;
use crate::command_bar::CommandBar;
use crate::ex::CommandName;
use crate::host::{Host, Split};
use crate::insert::{CharPending, Insert, InsertAt, Replace};
use crate::iter::{self, TextIter, WordKind};
use crate::motion::{Motion, MotionState};
use crate::scroll::{self, Direction};
use crate::state::{Kind, KindTag, StateId, keep_on_char};
use crate::text_object::TextObject;
use crate::vim::Vim;
use crate::visual::{Visual, VisualMode};

/// Which table the next key goes through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Handler {
    #[default]
    Initial,
    Count,
    Command,
    Z,
    Viewport,
    C,
    CWithModifier,
    D,
    DWithModifier,
    Shift,
    Search,
    Register,
    Split,
    Increment,
    G,
    Motion,
    Mark,
}

/// Normal mode.
#[derive(Debug, Default)]
pub(crate) struct Normal {
    handler: Handler,
    /// Typed count, 0 when none.
    count: usize,
    has_count: bool,
    /// `i` or `a` after `c`/`d`.
    modifier: Option<char>,
    command_text: String,
    /// Last finished state that `.` replays.
    repeat: Option<StateId>,
    /// Last Visual, for `gv`.
    last_visual: Option<StateId>,
}

impl Normal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn command_text(&self) -> &str {
        &self.command_text
    }

    /// Nodes held in the `.` and `gv` slots.
    pub(crate) fn retained_states(&self) -> Vec<StateId> {
        let mut states: Vec<StateId> = self.repeat.into_iter().collect();
        if self.last_visual != self.repeat {
            states.extend(self.last_visual);
        }
        states
    }

    /// Clear every slot holding `id`.
    pub(crate) fn forget(&mut self, id: StateId) {
        if self.repeat == Some(id) {
            self.repeat = None;
        }
        if self.last_visual == Some(id) {
            self.last_visual = None;
        }
    }

    /// No key of a command typed yet.
    pub(crate) fn is_idle(&self) -> bool {
        self.handler == Handler::Initial && self.command_text.is_empty() && self.count == 0
    }

    fn take_count(&mut self) -> usize {
        std::mem::take(&mut self.count)
    }

    fn reset(&mut self) {
        self.handler = Handler::Initial;
        self.count = 0;
        self.has_count = false;
        self.modifier = None;
        self.command_text.clear();
    }
}

/// `plain` char of a key without Ctrl/Alt/Super.
fn plain(key: &KeyEvent) -> Option<char> {
    (!key.has_command_modifier()).then(|| key.as_char()).flatten()
}

/// Keys that start a motion from the initial handler.
fn is_motion_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace
        | KeyCode::Down
        | KeyCode::Up
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::End
        | KeyCode::Home
        | KeyCode::Enter => true,
        _ => matches!(
            plain(key),
            Some(
                '0' | '\'' | '^' | '*' | 'b' | '|' | 'B' | '{' | '}' | '[' | ']' | '$' | 'e' | 'E' | 'f' | 'F' | '`'
                    | 'G' | 'h' | 'H' | 'j' | 'k' | 'l' | 'L' | 'M' | 'n' | '#' | 'N' | '(' | ')' | '%' | ' ' | '_'
                    | 'w' | 'W' | 't' | 'T'
            )
        ),
    }
}

impl<S: TextSurface, H: Host> Vim<S, H> {
    fn with_normal<T>(&mut self, id: StateId, f: impl FnOnce(&mut Normal) -> T) -> Option<T> {
        self.tree.normal_mut(id).map(f)
    }

    /// Back to the initial handler; tells the host Normal is ready.
    pub(crate) fn normal_clear(&mut self, id: StateId) {
        self.with_normal(id, Normal::reset);
        self.host.ready();
    }

    /// Abort the typed command with a beep.
    fn normal_bail(&mut self, id: StateId) -> bool {
        debug!(command = self.tree.normal(id).map_or("", Normal::command_text), "normal bail");
        self.host.beep();
        self.set_current_register(id, None);
        self.normal_clear(id);
        true
    }

    fn normal_count(&self, id: StateId) -> usize {
        self.tree.normal(id).map_or(0, |normal| normal.count)
    }

    fn set_handler(&mut self, id: StateId, handler: Handler) {
        self.with_normal(id, |normal| normal.handler = handler);
    }

    // -----------------------------------------------------------------------
    // Starting child states
    // -----------------------------------------------------------------------

    /// Push an operator command. With no motion, the count goes on the
    /// command and a `linewise_key` (`dd`, `yy`, `==`) waits for a motion.
    fn begin_command(
        &mut self,
        id: StateId,
        motion: Option<Motion>,
        selection_motion: Option<Motion>,
        name: CommandName,
        linewise_key: Option<char>,
    ) -> StateId {
        let count = self.with_normal(id, Normal::take_count).unwrap_or(0);
        let has_motion = motion.is_some();
        let command = Command::new(name)
            .with_motion(motion.map(|motion| motion.with_count(count.max(1))))
            .with_selection_motion(selection_motion.map(|motion| motion.with_count(count.max(1))));
        let command = self.create_command(command);
        self.push(id, command);

        if !has_motion {
            self.tree.set_count(command, count);
            if linewise_key.is_some() {
                let motion = self.create(Kind::Motion(MotionState::deferred().with_linewise_keyval(linewise_key)));
                self.push(command, motion);
                return command;
            }
        }
        self.pop(command);
        command
    }

    /// `g?` / `gq`: a command over a motion still to be typed.
    fn begin_command_requiring_motion(&mut self, id: StateId, name: CommandName) -> bool {
        let count = self.with_normal(id, Normal::take_count).unwrap_or(0);
        let command = self.create_command(Command::new(name).with_selection_motion(Some(Motion::none())));
        self.tree.set_count(command, count);
        self.push(id, command);
        let motion = self.create(Kind::Motion(MotionState::deferred()));
        self.push(command, motion);
        true
    }

    fn begin_insert(&mut self, id: StateId, insert: Insert) -> bool {
        let count = self.normal_count(id);
        let insert = self.create(Kind::Insert(insert));
        self.tree.set_count(insert, count);
        self.push(id, insert);
        true
    }

    /// `C`, `s`, `S`, `cc`: Insert that first deletes a span.
    fn begin_change(&mut self, id: StateId, motion: Motion, selection_motion: Motion) -> bool {
        let count = self.with_normal(id, Normal::take_count).unwrap_or(0).max(1);
        let insert = Insert::new()
            .with_motion(motion.with_count(count), InsertAt::Here)
            .with_selection_motion(selection_motion.with_count(count));
        let insert = self.create(Kind::Insert(insert));
        self.push(id, insert);
        true
    }

    fn begin_visual(&mut self, id: StateId, mode: VisualMode) -> bool {
        let count = self.with_normal(id, Normal::take_count).unwrap_or(0);
        let visual = self.create(Kind::Visual(Visual::new(mode)));
        self.tree.set_count(visual, count);
        self.normal_clear(id);
        self.push(id, visual);
        true
    }

    fn begin_motion(&mut self, id: StateId, keys: &[KeyEvent]) -> bool {
        let count = self.normal_count(id);
        let motion = self.create(Kind::Motion(MotionState::new()));
        self.tree.set_count(motion, count);
        self.push(id, motion);
        for key in keys {
            self.synthesize(motion, *key);
        }
        true
    }

    /// `r{c}`: replace `count` chars with the next key.
    fn replace_one(&mut self, id: StateId) -> bool {
        let count = self.with_normal(id, Normal::take_count).unwrap_or(0).max(1);
        let command = Command::new(CommandName::ReplaceOne)
            .with_motion(Some(Motion::forward_char().with_count(count)))
            .with_selection_motion(Some(Motion::none()));
        let command = self.create_command(command);
        self.push(id, command);
        let pending = self.create(Kind::CharPending(CharPending::default()));
        self.push(command, pending);
        true
    }

    fn push_command_bar(&mut self, id: StateId, text: &str) -> bool {
        let bar = self.create(Kind::CommandBar(CommandBar::with_text(text)));
        self.push(id, bar);
        true
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub(crate) fn normal_enter(&mut self) {
        self.surface.set_overwrite(true);
    }

    /// Store `from` in the `.` or `gv` slot, dropping whatever it
    /// replaces unless the other slot still holds it.
    fn normal_store(&mut self, id: StateId, from: StateId, last_visual: bool) {
        self.adopt(id, from);
        let replaced = self.with_normal(id, |normal| {
            let (slot, other) = if last_visual {
                (&mut normal.last_visual, normal.repeat)
            } else {
                (&mut normal.repeat, normal.last_visual)
            };
            let old = slot.replace(from);
            old.filter(|&old| old != from && Some(old) != other)
        });
        if let Some(old) = replaced.flatten() {
            self.unparent(old);
        }
    }

    pub(crate) fn normal_resume(&mut self, id: StateId, from: StateId) {
        self.normal_clear(id);
        self.surface.set_overwrite(true);
        self.set_current_register(id, None);

        let mut drop_from = true;
        match self.tag_of(from) {
            KindTag::Insert | KindTag::Replace => self.leave_text_entry(),
            KindTag::Visual => {
                self.normal_store(id, from, true);
                drop_from = false;
            }
            KindTag::Motion if self.finished_motion(from).is_some_and(|m| !m.invalidates_visual_column()) => {}
            _ => self.track_visual_column(id),
        }

        keep_on_char(&mut self.surface);
        scroll::scroll_cursor_onscreen(&mut self.surface);

        if self.tree.can_repeat(from) {
            self.normal_store(id, from, false);
            drop_from = false;
        }
        if drop_from {
            self.unparent(from);
        }
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    pub(crate) fn normal_keypress(&mut self, id: StateId, key: &KeyEvent, string: &str) -> bool {
        let Some(handler) = self.with_normal(id, |normal| {
            normal.command_text.push_str(string);
            normal.handler
        }) else {
            return false;
        };

        if key.is_escape() {
            self.normal_clear(id);
            return true;
        }

        self.normal_handle(id, handler, key, string)
    }

    fn normal_handle(&mut self, id: StateId, handler: Handler, key: &KeyEvent, string: &str) -> bool {
        match handler {
            Handler::Initial => self.normal_initial(id, key, string),
            Handler::Count => self.normal_count_key(id, key, string),
            Handler::Command => self.normal_command(id, key),
            Handler::Z => self.normal_z(id, key),
            Handler::Viewport => self.normal_viewport(id, key),
            Handler::C => self.normal_c(id, key),
            Handler::CWithModifier => self.normal_c_with_modifier(id, key),
            Handler::D => self.normal_d(id, key),
            Handler::DWithModifier => self.normal_d_with_modifier(id, key),
            Handler::Shift => self.normal_shift(id, key),
            Handler::Search => self.normal_search(id, key),
            Handler::Register => self.normal_register(id, string),
            Handler::Split => self.normal_split(id, key),
            Handler::Increment => {
                self.normal_clear(id);
                true
            }
            Handler::G => self.normal_g(id, key),
            Handler::Motion => self.normal_motion(id, key, string),
            Handler::Mark => self.normal_mark(id, string),
        }
    }

    fn normal_initial(&mut self, id: StateId, key: &KeyEvent, string: &str) -> bool {
        let next = if key.is_ctrl() {
            match key.as_char() {
                Some('a' | 'x') => Handler::Increment,
                Some('d' | 'u' | 'e' | 'y' | 'f' | 'b') => Handler::Viewport,
                Some('v') => return self.begin_visual(id, VisualMode::Block),
                Some('w') => {
                    self.set_handler(id, Handler::Split);
                    return true;
                }
                Some('r') => Handler::Command,
                Some('o') => {
                    self.begin_command(id, None, None, CommandName::JumpBackward, None);
                    return true;
                }
                Some('i') => {
                    self.begin_command(id, None, None, CommandName::JumpForward, None);
                    return true;
                }
                _ => Handler::Initial,
            }
        } else if is_motion_key(key) {
            Handler::Motion
        } else {
            let has_count = self.tree.normal(id).is_some_and(|normal| normal.has_count);
            match plain(key) {
                Some('1'..='9') if !has_count => Handler::Count,
                Some(
                    'a' | '~' | 'A' | 'C' | 'D' | 'i' | 'I' | 'J' | 'o' | 'O' | 'p' | 'P' | '.' | 'R' | 's' | 'S' | 'u'
                    | 'x' | '=' | 'Y',
                ) => Handler::Command,
                Some('/' | '?') => Handler::Search,
                Some(ch) => {
                    let prefix = match ch {
                        'm' => Handler::Mark,
                        '"' => Handler::Register,
                        'd' => Handler::D,
                        'c' => Handler::C,
                        'g' => Handler::G,
                        'z' => Handler::Z,
                        '>' | '<' => Handler::Shift,
                        'y' => {
                            self.begin_command(id, None, Some(Motion::none()), CommandName::Yank, Some('y'));
                            return true;
                        }
                        'r' => return self.replace_one(id),
                        ':' => return self.push_command_bar(id, ":"),
                        'v' => return self.begin_visual(id, VisualMode::Char),
                        'V' => return self.begin_visual(id, VisualMode::Line),
                        _ => Handler::Initial,
                    };
                    if prefix != Handler::Initial {
                        if prefix == Handler::Shift {
                            self.with_normal(id, |normal| normal.modifier = Some(ch));
                        }
                        self.set_handler(id, prefix);
                        return true;
                    }
                    Handler::Initial
                }
                None => Handler::Initial,
            }
        };

        if next == Handler::Initial {
            if key.has_command_modifier() || string.is_empty() {
                self.with_normal(id, |normal| {
                    let keep = normal.command_text.len().saturating_sub(string.len());
                    normal.command_text.truncate(keep);
                });
                return false;
            }
            return self.normal_bail(id);
        }

        self.set_handler(id, next);
        self.normal_handle(id, next, key, string)
    }

    fn normal_count_key(&mut self, id: StateId, key: &KeyEvent, string: &str) -> bool {
        self.with_normal(id, |normal| normal.has_count = true);
        match plain(key).and_then(|ch| ch.to_digit(10)) {
            Some(digit) => {
                self.with_normal(id, |normal| normal.count = normal.count * 10 + digit as usize);
                true
            }
            None => {
                self.set_handler(id, Handler::Initial);
                self.normal_initial(id, key, string)
            }
        }
    }

    fn normal_command(&mut self, id: StateId, key: &KeyEvent) -> bool {
        use CommandName as C;

        if key.is_ctrl_char('r') {
            self.begin_command(id, None, None, C::Redo, None);
            return true;
        }

        let count = self.normal_count(id);
        match plain(key) {
            Some('R') => {
                let replace = self.create(Kind::Replace(Replace::new()));
                self.tree.set_count(replace, count);
                self.push(id, replace);
                true
            }
            Some('i') => self.begin_insert(id, Insert::new().with_motion(Motion::none(), InsertAt::Here)),
            Some('I') => self.begin_insert(id, Insert::new().with_motion(Motion::first_char(), InsertAt::Here)),
            Some('a') => self.begin_insert(id, Insert::new().with_motion(Motion::none(), InsertAt::AfterChar)),
            Some('A') => self.begin_insert(id, Insert::new().with_motion(Motion::line_end(), InsertAt::AfterChar)),
            Some('o') => self.begin_insert(
                id,
                Insert::new()
                    .with_motion(Motion::line_end(), InsertAt::AfterChar)
                    .with_prefix("\n")
                    .with_indent(true),
            ),
            Some('O') => self.begin_insert(
                id,
                Insert::new()
                    .with_motion(Motion::line_start(), InsertAt::Here)
                    .with_suffix("\n")
                    .with_indent(true),
            ),
            Some('C') if count != 0 => self.normal_bail(id),
            Some('C') => self.begin_change(id, Motion::line_end(), Motion::none()),
            Some('D') if count != 0 => self.normal_bail(id),
            Some('D') => {
                self.begin_command(id, Some(Motion::line_end()), Some(Motion::none()), C::Delete, None);
                true
            }
            Some('x') => {
                self.begin_command(id, Some(Motion::forward_char()), Some(Motion::none()), C::Delete, None);
                true
            }
            Some('S') => self.begin_change(id, Motion::line_end(), Motion::first_char()),
            Some('s') => self.begin_change(id, Motion::forward_char(), Motion::none()),
            Some('J') => {
                self.begin_command(
                    id,
                    Some(Motion::next_line_end_with_nl()),
                    Some(Motion::line_start()),
                    C::Join,
                    None,
                );
                true
            }
            Some('u') => {
                self.begin_command(id, None, None, C::Undo, None);
                true
            }
            Some('.') => self.normal_repeat_last(id),
            Some('Y') => {
                self.begin_command(id, Some(Motion::down(-1)), Some(Motion::none()), C::Yank, None);
                true
            }
            Some('p') => {
                self.begin_command(id, None, None, C::PasteAfter, None);
                true
            }
            Some('P') => {
                self.begin_command(id, None, None, C::PasteBefore, None);
                true
            }
            Some('~') => {
                self.begin_command(id, Some(Motion::forward_char()), None, C::ToggleCase, None);
                true
            }
            Some('=') => {
                self.begin_command(id, None, Some(Motion::none()), C::Filter, Some('='));
                true
            }
            _ => self.normal_bail(id),
        }
    }

    /// `.`: replay the last change `max(1, count)` times as one undo step.
    fn normal_repeat_last(&mut self, id: StateId) -> bool {
        let Some(repeat) = self.tree.normal(id).and_then(|normal| normal.repeat) else {
            return self.normal_bail(id);
        };
        let count = self.normal_count(id).max(1);

        self.surface.begin_user_action();
        for _ in 0..count {
            if !self.tree.contains(repeat) {
                break;
            }
            self.repeat_state(repeat);
        }
        self.surface.end_user_action();

        self.normal_clear(id);
        keep_on_char(&mut self.surface);
        true
    }

    fn normal_z(&mut self, id: StateId, key: &KeyEvent) -> bool {
        let yalign = match plain(key) {
            Some('z') => 0.5,
            Some('b') => 1.0,
            Some('t') => 0.0,
            _ => return self.normal_bail(id),
        };
        scroll::z_scroll(&mut self.surface, yalign);
        self.normal_clear(id);
        true
    }

    fn normal_viewport(&mut self, id: StateId, key: &KeyEvent) -> bool {
        if !key.is_ctrl() {
            return self.normal_bail(id);
        }
        let count = self.normal_count(id).max(1);
        match key.as_char() {
            Some('d') => scroll::scroll_half_page(&mut self.surface, Direction::Down, count),
            Some('u') => scroll::scroll_half_page(&mut self.surface, Direction::Up, count),
            Some('e') => scroll::scroll_line(&mut self.surface, Direction::Down, count),
            Some('y') => scroll::scroll_line(&mut self.surface, Direction::Up, count),
            Some('f') => scroll::scroll_page(&mut self.surface, Direction::Down, count),
            Some('b') => scroll::scroll_page(&mut self.surface, Direction::Up, count),
            _ => return self.normal_bail(id),
        }
        self.normal_clear(id);
        true
    }

    fn normal_c(&mut self, id: StateId, key: &KeyEvent) -> bool {
        match plain(key) {
            Some('c') => self.begin_change(id, Motion::line_end_with_nl(), Motion::line_start()),
            Some(modifier @ ('i' | 'a')) => {
                self.with_normal(id, |normal| {
                    normal.modifier = Some(modifier);
                    normal.handler = Handler::CWithModifier;
                });
                true
            }
            other => {
                // `cw` on a word changes to the end of that word, like `ce`.
                let mut key = *key;
                if let Some(kind) = match other {
                    Some('w') => Some(WordKind::Word),
                    Some('W') => Some(WordKind::BigWord),
                    _ => None,
                } {
                    let it = TextIter::new(&self.surface, self.surface.cursor());
                    if !it.is_space() && !it.ends_line() {
                        let single = self.tree.normal(id).is_none_or(|normal| normal.count <= 1);
                        if single && iter::ends_word(&it, kind) {
                            return self.begin_change(id, Motion::forward_char(), Motion::none());
                        }
                        key = KeyEvent::char(if kind == WordKind::Word { 'e' } else { 'E' });
                    }
                }

                let count = self.with_normal(id, Normal::take_count).unwrap_or(0);
                let insert = self.create(Kind::Insert(Insert::new().with_selection_motion(Motion::none())));
                self.push(id, insert);
                let motion = self.create(Kind::Motion(MotionState::deferred()));
                self.tree.set_count(motion, count);
                self.push(insert, motion);
                self.synthesize(motion, key);
                self.normal_clear(id);
                true
            }
        }
    }

    fn text_object_for(&mut self, id: StateId, key: &KeyEvent) -> Option<TextObject> {
        let modifier = self.tree.normal(id)?.modifier?;
        let object = TextObject::from_keys(modifier, plain(key)?)?;
        let count = self.with_normal(id, Normal::take_count).unwrap_or(0);
        Some(object.with_count(count))
    }

    fn normal_c_with_modifier(&mut self, id: StateId, key: &KeyEvent) -> bool {
        let Some(object) = self.text_object_for(id, key) else {
            return self.normal_bail(id);
        };
        self.begin_insert(id, Insert::new().with_text_object(object));
        self.normal_clear(id);
        true
    }

    fn normal_d(&mut self, id: StateId, key: &KeyEvent) -> bool {
        match plain(key) {
            Some(modifier @ ('i' | 'a')) => {
                self.with_normal(id, |normal| {
                    normal.modifier = Some(modifier);
                    normal.handler = Handler::DWithModifier;
                });
                true
            }
            _ => {
                self.begin_command(id, None, Some(Motion::none()), CommandName::Delete, Some('d'));
                let current = self.current();
                self.synthesize(current, *key);
                true
            }
        }
    }

    fn normal_d_with_modifier(&mut self, id: StateId, key: &KeyEvent) -> bool {
        let Some(object) = self.text_object_for(id, key) else {
            return self.normal_bail(id);
        };
        self.normal_clear(id);
        let command = self.create_command(Command::new(CommandName::Delete).with_text_object(object));
        self.push(id, command);
        self.pop(command);
        true
    }

    /// Second key of `>>` / `<<`.
    fn normal_shift(&mut self, id: StateId, key: &KeyEvent) -> bool {
        let first = self.tree.normal(id).and_then(|normal| normal.modifier);
        let name = match plain(key) {
            Some('>') if first == Some('>') => CommandName::Indent,
            Some('<') if first == Some('<') => CommandName::Unindent,
            _ => return self.normal_bail(id),
        };
        self.begin_command(id, None, None, name, None);
        true
    }

    fn normal_search(&mut self, id: StateId, key: &KeyEvent) -> bool {
        match plain(key) {
            Some('/') => self.push_command_bar(id, "/"),
            Some('?') => self.push_command_bar(id, "?"),
            _ => self.normal_bail(id),
        }
    }

    fn normal_register(&mut self, id: StateId, string: &str) -> bool {
        let Some(name) = string.chars().next() else {
            return self.normal_bail(id);
        };
        self.set_current_register(id, Some(name));
        self.set_handler(id, Handler::Initial);
        true
    }

    fn normal_split(&mut self, id: StateId, key: &KeyEvent) -> bool {
        let Some(split) = key.as_char().and_then(Split::from_key) else {
            self.normal_clear(id);
            return false;
        };
        let text = self.tree.normal(id).map(|normal| normal.command_text.clone()).unwrap_or_default();
        if !self.host.execute_command(&text) {
            self.host.split(split);
        }
        self.normal_clear(id);
        true
    }

    fn normal_g(&mut self, id: StateId, key: &KeyEvent) -> bool {
        match plain(key) {
            Some('?') => self.begin_command_requiring_motion(id, CommandName::Rot13),
            Some('q') => self.begin_command_requiring_motion(id, CommandName::Format),
            Some('g' | 'e' | 'E') => self.begin_motion(id, &[KeyEvent::char('g'), *key]),
            Some('v') => {
                let Some(last) = self.tree.normal(id).and_then(|normal| normal.last_visual) else {
                    return self.normal_bail(id);
                };
                let Some(visual) = self.visual_clone(last) else {
                    return self.normal_bail(id);
                };
                self.push(id, visual);
                true
            }
            _ => self.normal_bail(id),
        }
    }

    fn normal_motion(&mut self, id: StateId, key: &KeyEvent, string: &str) -> bool {
        self.with_normal(id, |normal| {
            let keep = normal.command_text.len().saturating_sub(string.len());
            normal.command_text.truncate(keep);
        });
        self.begin_motion(id, &[*key])
    }

    fn normal_mark(&mut self, id: StateId, string: &str) -> bool {
        match string.chars().next() {
            Some(name) if name.is_ascii_alphabetic() => {
                let cursor = self.surface.cursor();
                self.ctx.marks.set(&mut self.surface, name, cursor);
                self.normal_clear(id);
                true
            }
            _ => self.normal_bail(id),
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

    fn unnamed(vim: &Vim<RopeSurface>) -> Option<String> {
        vim.context().registers().get(None).map(|text| text.to_string())
    }

    #[test]
    fn delete_word() {
        let mut vim = vim("hello world\n");
        vim.feed("dw").unwrap();
        assert_eq!(vim.surface().text(), "world\n");
        assert_eq!(unnamed(&vim).as_deref(), Some("hello "));
    }

    #[test]
    fn counted_line_delete_fills_numbered_register() {
        let mut vim = vim("foo\nbar\nbaz\n");
        vim.feed("2dd").unwrap();
        assert_eq!(vim.surface().text(), "baz\n");
        assert_eq!(unnamed(&vim).as_deref(), Some("foo\nbar\n"));
        assert_eq!(vim.context().registers().get(Some('1')).as_deref(), Some("foo\nbar\n"));
    }

    #[test]
    fn operator_and_motion_counts_multiply() {
        let mut vim = vim("a b c d e f g\n");
        vim.feed("2d2w").unwrap();
        assert_eq!(vim.surface().text(), "e f g\n");
    }

    #[test]
    fn delete_text_object() {
        let mut vim = vim("one two three\n");
        vim.feed("daw").unwrap();
        assert_eq!(vim.surface().text(), "two three\n");
    }

    #[test]
    fn x_and_dot() {
        let mut vim = vim("abcdef\n");
        vim.feed("2x.").unwrap();
        assert_eq!(vim.surface().text(), "ef\n");
        vim.feed("u").unwrap();
        assert_eq!(vim.surface().text(), "cdef\n");
    }

    #[test]
    fn dot_with_nothing_to_repeat_is_harmless() {
        let mut vim = vim("abc\n");
        vim.feed("..").unwrap();
        assert_eq!(vim.surface().text(), "abc\n");
        assert_eq!(vim.mode(), Mode::Normal);
    }

    #[test]
    fn yank_line_and_paste() {
        let mut vim = vim("one\ntwo\n");
        vim.feed("yyjp").unwrap();
        assert_eq!(vim.surface().text(), "one\ntwo\none\n");
        assert_eq!(vim.surface().cursor(), 8);

        vim.feed("ggYP").unwrap();
        assert_eq!(vim.surface().text(), "one\none\ntwo\none\n");
    }

    #[test]
    fn charwise_paste_after_cursor() {
        let mut vim = vim("ab\n");
        vim.feed("ylp").unwrap();
        assert_eq!(vim.surface().text(), "aab\n");
    }

    #[test]
    fn named_register() {
        let mut vim = vim("alpha beta\n");
        vim.feed("\"ayw").unwrap();
        assert_eq!(vim.context().registers().get(Some('a')).as_deref(), Some("alpha "));
        assert_eq!(vim.command_text(), "");
    }

    #[test]
    fn change_to_word_end_enters_insert() {
        let mut vim = vim("foo bar\n");
        vim.feed("cebaz<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "baz bar\n");
        assert_eq!(vim.mode(), Mode::Normal);
    }

    #[test]
    fn change_inner_quote() {
        let mut vim = vim("say \"hi\" now\n");
        vim.feed("fhci\"yo<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "say \"yo\" now\n");
    }

    #[test]
    fn change_line_keeps_the_line() {
        let mut vim = vim("one\ntwo\n");
        vim.feed("ccxx<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "xx\ntwo\n");
    }

    #[test]
    fn capital_d_and_c_refuse_counts() {
        let mut vim = vim("abc def\n");
        vim.feed("w2D").unwrap();
        assert_eq!(vim.surface().text(), "abc def\n");
        vim.feed("D").unwrap();
        assert_eq!(vim.surface().text(), "abc \n");
    }

    #[test]
    fn join_lines() {
        let mut vim = vim("a\n  b\nc\n");
        vim.feed("J").unwrap();
        assert_eq!(vim.surface().text(), "a b\nc\n");
    }

    #[test]
    fn replace_chars() {
        let mut vim = vim("abcd\n");
        vim.feed("2rx").unwrap();
        assert_eq!(vim.surface().text(), "xxcd\n");
        assert_eq!(vim.surface().cursor(), 1);
    }

    #[test]
    fn toggle_case_advances() {
        let mut vim = vim("abc\n");
        vim.feed("~~").unwrap();
        assert_eq!(vim.surface().text(), "ABc\n");
        assert_eq!(vim.surface().cursor(), 2);
    }

    #[test]
    fn rot13_over_motion() {
        let mut vim = vim("abc def\n");
        vim.feed("g?w").unwrap();
        assert_eq!(vim.surface().text(), "nop def\n");
    }

    #[test]
    fn indent_line() {
        let mut vim = vim("abc\n");
        vim.surface_mut().options_mut().insert_spaces = true;
        vim.surface_mut().options_mut().set_indent_width(2);
        vim.feed(">>").unwrap();
        assert_eq!(vim.surface().text(), "  abc\n");
        vim.feed("<lt><lt>").unwrap();
        assert_eq!(vim.surface().text(), "abc\n");
    }

    #[test]
    fn marks_and_jumps() {
        let mut vim = vim("one\ntwo\nthree\n");
        vim.feed("jmaG'a").unwrap();
        assert_eq!(vim.surface().cursor(), 4);
        // `G` lands on the empty line after the final newline.
        vim.feed("<C-o>").unwrap();
        assert_eq!(vim.surface().line_of_offset(vim.surface().cursor()), 3);
    }

    #[test]
    fn unknown_key_bails_and_clears_the_preview() {
        let mut vim = vim("abc\n");
        vim.feed("2\"aQ").unwrap();
        assert_eq!(vim.command_text(), "");
        assert_eq!(vim.mode(), Mode::Normal);
        vim.feed("x").unwrap();
        assert_eq!(vim.surface().text(), "bc\n");
        assert_eq!(vim.context().registers().get(Some('a')), None);
    }

    #[test]
    fn pending_command_preview() {
        let mut vim = vim("abc\n");
        vim.feed("2d").unwrap();
        assert_eq!(vim.command_text(), "2d");
        assert_eq!(vim.mode(), Mode::Pending);
        vim.feed("<Esc>").unwrap();
        assert_eq!(vim.mode(), Mode::Normal);
    }

    #[test]
    fn ctrl_chords_pass_through() {
        let mut vim = vim("abc\n");
        assert!(!vim.handle_event(&KeyEvent::ctrl('q')));
        assert_eq!(vim.command_text(), "");
    }

    #[test]
    fn visual_reselect() {
        let mut vim = vim("abcdef\n");
        vim.feed("vl<Esc>").unwrap();
        vim.feed("gv").unwrap();
        assert_eq!(vim.mode(), Mode::Visual(VisualMode::Char));
        assert_eq!(vim.surface().slice(0, 2), "ab");
        assert!(vim.surface().has_selection());
    }

    #[test]
    fn counted_insert_with_dot() {
        let mut vim = vim("\n");
        vim.feed("2ax<Esc>.").unwrap();
        assert_eq!(vim.surface().text(), "xxxx\n");
    }

    #[test]
    fn open_line_repeats() {
        let mut vim = vim("a\n");
        vim.feed("ob<Esc>.").unwrap();
        assert_eq!(vim.surface().text(), "a\nb\nb\n");
    }

    #[test]
    fn change_word_stops_at_the_word_end_and_repeats() {
        let mut vim = vim("one two three\n");
        vim.feed("cwX<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "X two three\n");
        vim.feed("w.").unwrap();
        assert_eq!(vim.surface().text(), "X X three\n");
    }

    #[test]
    fn change_word_on_a_one_char_word() {
        let mut vim = vim("a bc\n");
        vim.feed("cwX<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "X bc\n");
    }

    #[test]
    fn change_word_from_blanks_takes_the_blanks() {
        let mut vim = vim("a   b\n");
        vim.feed("lcw-<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "a-b\n");
    }

    #[test]
    fn replace_mode_repeats() {
        let mut vim = vim("abcdef\n");
        vim.feed("Rxy<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "xycdef\n");
        vim.feed("l.").unwrap();
        assert_eq!(vim.surface().text(), "xyxyef\n");
    }

    #[test]
    fn delete_to_mark_through_an_unterminated_last_line() {
        let mut vim = vim("1\n2\n3\n42");
        vim.feed("jmzjjd'z").unwrap();
        assert_eq!(vim.surface().text(), "1");
        assert_eq!(unnamed(&vim).as_deref(), Some("2\n3\n42\n"));
    }

    #[test]
    fn delete_to_end_through_an_unterminated_last_line() {
        let mut vim = vim("1\n2\n3\n42");
        vim.feed("jdG").unwrap();
        assert_eq!(vim.surface().text(), "1");
    }

    #[test]
    fn delete_last_line_takes_the_newline_before_it() {
        let mut vim = vim("abc\nxyz");
        vim.feed("Gdd").unwrap();
        assert_eq!(vim.surface().text(), "abc");
        assert_eq!(unnamed(&vim).as_deref(), Some("xyz\n"));
    }

    #[test]
    fn charwise_delete_of_the_last_line_keeps_the_newline() {
        let mut vim = vim("abc\nxyz");
        vim.feed("jd$").unwrap();
        assert_eq!(vim.surface().text(), "abc\n");
    }
}
