// SPDX-License-Identifier: MIT

//! The `:` / `/` / `?` line editor.

use n_keys::{KeyCode, KeyEvent};
use n_text::TextSurface;
use tracing::debug;

use crate::host::Host;
use crate::state::StateId;
use crate::vim::Vim;

/// Completion candidates for Tab.
const COMPLETIONS: &[&str] = &[":colorscheme", ":write", ":quit", ":edit", ":open", ":file", ":set"];

#[derive(Debug, Default)]
pub(crate) struct CommandBar {
    text: String,
    /// What was typed before Up/Down started cycling.
    typed: Option<String>,
    history_pos: Option<usize>,
    /// Command parsed from the executed line, for the parent to adopt.
    pub(crate) command: Option<StateId>,
}

impl CommandBar {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_text(text: &str) -> Self {
        Self { text: text.to_owned(), ..Self::new() }
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    fn complete(&mut self) {
        if let Some(found) = COMPLETIONS.iter().find(|command| command.starts_with(self.text.as_str())) {
            self.text = format!("{found} ");
        }
    }

    /// Step through `history` entries matching the typed prefix,
    /// wrapping at either end.
    fn cycle(&mut self, history: &[String], up: bool) {
        let prefix = self.typed.get_or_insert_with(|| self.text.clone()).clone();
        let matches: Vec<usize> = history
            .iter()
            .enumerate()
            .filter(|(_, line)| line.starts_with(&prefix))
            .map(|(index, _)| index)
            .collect();
        let (Some(&first), Some(&last)) = (matches.first(), matches.last()) else {
            return;
        };

        let next = match (self.history_pos, up) {
            (None, true) => last,
            (None, false) => first,
            (Some(pos), true) => matches.iter().rev().find(|&&index| index < pos).copied().unwrap_or(last),
            (Some(pos), false) => matches.iter().find(|&&index| index > pos).copied().unwrap_or(first),
        };
        self.history_pos = Some(next);
        self.text.clone_from(&history[next]);
    }

    fn reset_navigation(&mut self) {
        self.typed = None;
        self.history_pos = None;
    }
}

impl<S: TextSurface, H: Host> Vim<S, H> {
    pub(crate) fn command_bar_enter(&mut self, id: StateId) {
        if let Some(bar) = self.tree.command_bar_mut(id) {
            if bar.text.is_empty() {
                bar.text.push(':');
            }
            bar.reset_navigation();
        }
    }

    pub(crate) fn command_bar_leave(&mut self, id: StateId) {
        if let Some(bar) = self.tree.command_bar_mut(id) {
            bar.text.clear();
        }
    }

    /// Run a finished line: the host may claim it, otherwise it is
    /// parsed and kept on the bar for the parent.
    fn command_bar_execute(&mut self, id: StateId, line: &str) {
        self.ctx.push_history(line);
        if self.host.execute_command(line) {
            debug!(line, "command claimed by host");
            return;
        }
        let Some(command) = self.parse_command(line) else {
            return;
        };
        self.adopt(id, command);
        if let Some(bar) = self.tree.command_bar_mut(id) {
            bar.command = Some(command);
        }
        self.repeat_state(command);
    }

    pub(crate) fn command_bar_keypress(&mut self, id: StateId, key: &KeyEvent, string: &str) -> bool {
        if key.is_escape() {
            self.command_bar_leave(id);
            self.pop(id);
            return true;
        }

        if key.code == KeyCode::Enter {
            let line = self.tree.command_bar_mut(id).map(|bar| std::mem::take(&mut bar.text)).unwrap_or_default();
            self.command_bar_execute(id, &line);
            self.pop(id);
            return true;
        }

        let history = match key.code {
            KeyCode::Up | KeyCode::Down => self.ctx.command_history().to_vec(),
            _ => Vec::new(),
        };
        let Some(bar) = self.tree.command_bar_mut(id) else {
            return false;
        };

        match key.code {
            KeyCode::Up => bar.cycle(&history, true),
            KeyCode::Down => bar.cycle(&history, false),
            KeyCode::Tab => {
                bar.complete();
                bar.reset_navigation();
            }
            KeyCode::Backspace => {
                if bar.text.chars().count() > 1 {
                    bar.text.pop();
                }
                bar.reset_navigation();
            }
            _ if key.is_ctrl_char('u') => {
                let first = bar.text.chars().next();
                bar.text.clear();
                bar.text.extend(first);
                bar.reset_navigation();
            }
            _ if !string.is_empty() && !key.is_ctrl() => {
                bar.text.push_str(string);
                bar.reset_navigation();
            }
            _ => {}
        }
        true
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

    #[test]
    fn typing_updates_the_bar_text() {
        let mut vim = vim("abc\n");
        vim.feed(":se").unwrap();
        assert_eq!(vim.mode(), Mode::CommandBar);
        assert_eq!(vim.command_bar_text(), ":se");
        vim.feed("<BS><BS><BS>").unwrap();
        assert_eq!(vim.command_bar_text(), ":");
    }

    #[test]
    fn ctrl_u_keeps_the_leading_char() {
        let mut vim = vim("abc\n");
        vim.feed("/abc<C-u>").unwrap();
        assert_eq!(vim.command_bar_text(), "/");
    }

    #[test]
    fn tab_completes() {
        let mut vim = vim("abc\n");
        vim.feed(":colo<Tab>").unwrap();
        assert_eq!(vim.command_bar_text(), ":colorscheme ");
        vim.feed("<Esc>").unwrap();
        assert_eq!(vim.mode(), Mode::Normal);
        assert_eq!(vim.command_bar_text(), "");
    }

    #[test]
    fn history_cycles_through_matching_lines() {
        let mut vim = vim("a\nb\nc\nd\n");
        vim.feed(":2\n:set ts=4\n:3\n").unwrap();
        assert_eq!(vim.context().command_history(), [":2", ":set ts=4", ":3"]);

        vim.feed(":<Up>").unwrap();
        assert_eq!(vim.command_bar_text(), ":3");
        vim.feed("<Up>").unwrap();
        assert_eq!(vim.command_bar_text(), ":set ts=4");
        vim.feed("<Esc>:s<Up>").unwrap();
        assert_eq!(vim.command_bar_text(), ":set ts=4");
        vim.feed("<Up>").unwrap();
        assert_eq!(vim.command_bar_text(), ":set ts=4");
        vim.feed("<Esc>:<Down>").unwrap();
        assert_eq!(vim.command_bar_text(), ":2");
    }

    #[test]
    fn enter_runs_the_line() {
        let mut vim = vim("a\nb\nc\n");
        vim.feed(":3\n").unwrap();
        assert_eq!(vim.surface().cursor(), 4);
        assert_eq!(vim.mode(), Mode::Normal);
    }

    #[test]
    fn search_lines_are_recorded() {
        let mut vim = vim("foo bar foo\n");
        vim.feed("/foo\n").unwrap();
        assert_eq!(vim.surface().cursor(), 8);
        assert_eq!(vim.context().command_history(), ["/foo"]);
    }

    #[test]
    fn host_can_claim_a_line() {
        #[derive(Default)]
        struct Claim(Vec<String>);

        impl Host for Claim {
            fn execute_command(&mut self, command: &str) -> bool {
                self.0.push(command.to_owned());
                true
            }
        }

        let mut vim = Vim::with_host(RopeSurface::new("a\nb\n"), Claim::default());
        vim.feed(":2\n").unwrap();
        assert_eq!(vim.host().0, [":2"]);
        assert_eq!(vim.surface().cursor(), 0);
    }
}
