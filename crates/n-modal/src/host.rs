// SPDX-License-Identifier: MIT

//! Hooks into the application embedding the engine.
//!
//! The engine never talks to windows, files or formatters itself. It
//! asks the [`Host`], and every hook has a default that declines, so a
//! bare engine (tests, the headless driver) runs with [`NoHost`].

use std::fmt;

/// Window layout requests from `Ctrl-W` chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// `Ctrl-W c`
    Close,
    /// `Ctrl-W v`
    Vertical,
    /// `Ctrl-W s`
    Horizontal,
    /// `Ctrl-W w`
    Cycle,
}

impl Split {
    #[must_use]
    pub const fn from_key(ch: char) -> Option<Self> {
        match ch {
            'c' => Some(Self::Close),
            'v' => Some(Self::Vertical),
            's' => Some(Self::Horizontal),
            'w' => Some(Self::Cycle),
            _ => None,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Close => "close",
            Self::Vertical => "vsplit",
            Self::Horizontal => "split",
            Self::Cycle => "cycle",
        })
    }
}

/// Application callbacks. All methods default to "not handled".
pub trait Host {
    /// Offered every command-bar line and `Ctrl-W` chord before the
    /// engine parses it. Return `true` to claim it.
    fn execute_command(&mut self, command: &str) -> bool {
        let _ = command;
        false
    }

    /// Format the char range `begin..end` (`gq`). Return `false` to let
    /// the engine re-indent instead.
    fn format(&mut self, begin: usize, end: usize) -> bool {
        let _ = (begin, end);
        false
    }

    /// Filter the char range `begin..end` (`=`). Return `false` to let
    /// the engine re-indent instead.
    fn filter(&mut self, begin: usize, end: usize) -> bool {
        let _ = (begin, end);
        false
    }

    fn split(&mut self, split: Split) {
        let _ = split;
    }

    /// `:w [path]`
    fn write(&mut self, path: Option<&str>) {
        let _ = path;
    }

    /// `:e [path]`
    fn edit(&mut self, path: Option<&str>) {
        let _ = path;
    }

    fn beep(&mut self) {}

    /// After every key: its printable form and whether the engine is back
    /// in an idle Normal state.
    fn on_key(&mut self, key: &str, reset: bool) {
        let _ = (key, reset);
    }

    /// Normal mode finished a command and waits for the next one.
    fn ready(&mut self) {}

    /// The pending-command preview (`"2d"`, `"\"ay"`) changed.
    fn command_text_changed(&mut self, text: &str) {
        let _ = text;
    }

    /// The command-bar line (or mode label) changed.
    fn command_bar_text_changed(&mut self, text: &str) {
        let _ = text;
    }
}

/// Host that declines everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHost;

impl Host for NoHost {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keys() {
        assert_eq!(Split::from_key('v'), Some(Split::Vertical));
        assert_eq!(Split::from_key('x'), None);
        assert_eq!(Split::Horizontal.to_string(), "split");
    }
}
