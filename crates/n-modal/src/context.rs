// SPDX-License-Identifier: MIT

//! Engine context: everything that outlives a single state.
//!
//! | Field            | Scope                                              |
//! |------------------|----------------------------------------------------|
//! | `config`         | Tunables, see [`Config`]                           |
//! | registers        | Shared across documents through `Rc<RefCell<_>>`   |
//! | `marks`          | Per document                                       |
//! | `jumplist`       | Per document                                       |
//! | `search`         | Last search pattern and how to run it             |
//! | `reverse_search` | Last search went backward (`?`, `#`)              |
//! | command history  | Lines entered in the command bar                  |

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use n_text::{Clipboard, SearchSettings, TextSurface};
use tracing::debug;

use crate::config::Config;
use crate::jumplist::Jumplist;
use crate::marks::Marks;
use crate::registers::{RegisterWrite, Registers};

/// State shared by every node of one engine.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    registers: Rc<RefCell<Registers>>,
    pub marks: Marks,
    pub jumplist: Jumplist,
    pub search: SearchSettings,
    pub reverse_search: bool,
    command_history: Vec<String>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Context {
    /// Context with a private register store.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let registers = Rc::new(RefCell::new(Registers::new(config.register_capacity)));
        Self::with_registers(config, registers)
    }

    /// Context reading and writing `registers`, which other engines may
    /// hold too.
    #[must_use]
    pub fn with_registers(config: Config, registers: Rc<RefCell<Registers>>) -> Self {
        Self {
            jumplist: Jumplist::new(config.max_jumps),
            config,
            registers,
            marks: Marks::new(),
            search: SearchSettings::default(),
            reverse_search: false,
            command_history: Vec::new(),
        }
    }

    /// Handle to the register store, for sharing with another engine.
    #[must_use]
    pub fn shared_registers(&self) -> Rc<RefCell<Registers>> {
        Rc::clone(&self.registers)
    }

    #[must_use]
    pub fn registers(&self) -> Ref<'_, Registers> {
        self.registers.borrow()
    }

    pub fn registers_mut(&self) -> RefMut<'_, Registers> {
        self.registers.borrow_mut()
    }

    /// Command-bar history, oldest first.
    #[must_use]
    pub fn command_history(&self) -> &[String] {
        &self.command_history
    }

    /// Append a command-bar line, dropping the oldest past the limit.
    pub(crate) fn push_history(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        self.command_history.push(line.to_owned());
        let limit = self.config.command_history;
        if self.command_history.len() > limit {
            let excess = self.command_history.len() - limit;
            self.command_history.drain(..excess);
        }
    }

    // -----------------------------------------------------------------------
    // Registers with clipboard round trips
    // -----------------------------------------------------------------------

    /// Read register `name` (`None` is the unnamed register). `+` and `*`
    /// are refreshed from the surface clipboard first; on failure the
    /// cached value is returned.
    pub fn register_value<S: TextSurface + ?Sized>(&self, surface: &mut S, name: Option<char>) -> Option<Rc<str>> {
        if let Some(which) = name.and_then(clipboard_of) {
            match surface.read_clipboard(which, self.config.clipboard_timeout) {
                Ok(text) => {
                    if let Some(name) = name {
                        self.registers_mut().set_raw(name, text.as_deref());
                    }
                }
                Err(err) => debug!(%err, "clipboard read failed, keeping cached register"),
            }
        }
        self.registers().get(name)
    }

    /// Store `text` into register `name`; `+` and `*` also publish to
    /// the surface clipboard.
    pub fn set_register_value<S: TextSurface + ?Sized>(
        &self,
        surface: &mut S,
        name: Option<char>,
        text: &str,
        write: RegisterWrite,
    ) {
        if !self.registers_mut().record(name, text, write) {
            return;
        }
        if let Some(which) = name.and_then(clipboard_of) {
            surface.write_clipboard(which, text);
        }
    }
}

const fn clipboard_of(name: char) -> Option<Clipboard> {
    match name {
        '+' => Some(Clipboard::Clipboard),
        '*' => Some(Clipboard::Primary),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use n_text::RopeSurface;

    use super::*;

    #[test]
    fn history_is_bounded() {
        let mut ctx = Context::new(Config {
            command_history: 2,
            ..Config::default()
        });
        ctx.push_history(":a");
        ctx.push_history(":b");
        ctx.push_history(":c");
        ctx.push_history("");
        assert_eq!(ctx.command_history(), [":b", ":c"]);
    }

    #[test]
    fn shared_registers_are_visible_to_both_contexts() {
        let first = Context::default();
        let second = Context::with_registers(Config::default(), first.shared_registers());
        let mut s = RopeSurface::new("");

        first.set_register_value(&mut s, Some('a'), "shared", RegisterWrite::Plain);
        assert_eq!(second.register_value(&mut s, Some('a')).as_deref(), Some("shared"));
    }

    #[test]
    fn clipboard_register_round_trips_through_surface() {
        let ctx = Context::default();
        let mut s = RopeSurface::new("");

        ctx.set_register_value(&mut s, Some('+'), "copied", RegisterWrite::Yank);
        ctx.registers_mut().set_raw('+', None);
        assert_eq!(ctx.register_value(&mut s, Some('+')).as_deref(), Some("copied"));
    }
}
