// SPDX-License-Identifier: MIT

//! The engine facade.
//!
//! [`Vim`] owns the surface, the host, the [`Context`] and the state tree.
//! Embedders feed it keys with [`Vim::handle_event`] (or a notation
//! script with [`Vim::feed`]) and read back the mode, the pending-command
//! preview and the command-bar line.

use std::cell::Ref;
use std::fmt;

use n_keys::{KeyCode, KeyEvent, parse_keys};
use n_text::TextSurface;
use tracing::{debug, trace};

use crate::context::Context;
use crate::error::Result;
use crate::host::{Host, NoHost};
use crate::normal::Normal;
use crate::registers::Registers;
use crate::state::{Kind, KindTag, StateId, Tree, keep_on_char};
use crate::visual::{Visual, VisualMode};

/// Coarse mode of the engine, from its innermost state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
    Replace,
    Visual(VisualMode),
    CommandBar,
    /// Part of a Normal command typed (`2d`, `"a`, `gq`).
    Pending,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Insert => "insert",
            Self::Replace => "replace",
            Self::Visual(VisualMode::Char) => "visual",
            Self::Visual(VisualMode::Line) => "visual-line",
            Self::Visual(VisualMode::Block) => "visual-block",
            Self::CommandBar => "command-bar",
            Self::Pending => "pending",
        })
    }
}

/// A Vim engine driving one [`TextSurface`].
pub struct Vim<S, H = NoHost> {
    pub(crate) surface: S,
    pub(crate) host: H,
    pub(crate) ctx: Context,
    pub(crate) tree: Tree,
    pub(crate) root: StateId,
    command_text: String,
    command_bar_text: String,
}

impl<S: TextSurface> Vim<S> {
    /// Engine with default configuration and no host.
    pub fn new(surface: S) -> Self {
        Self::with_host(surface, NoHost)
    }
}

impl<S: TextSurface, H: Host> Vim<S, H> {
    pub fn with_host(surface: S, host: H) -> Self {
        Self::build(surface, host, Context::default())
    }

    /// Engine over an existing context, for sharing registers between
    /// documents.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`](crate::Error::InvalidConfig) when the
    /// context's configuration is unusable.
    pub fn with_context(surface: S, host: H, ctx: Context) -> Result<Self> {
        ctx.config.validate()?;
        Ok(Self::build(surface, host, ctx))
    }

    fn build(surface: S, host: H, ctx: Context) -> Self {
        let mut tree = Tree::default();
        let root = tree.insert(Kind::Root);
        let mut vim = Self {
            surface,
            host,
            ctx,
            tree,
            root,
            command_text: String::new(),
            command_bar_text: String::new(),
        };

        let cursor = vim.surface.cursor();
        vim.push_jump(cursor);
        let normal = vim.create(Kind::Normal(Normal::new()));
        vim.push(root, normal);
        keep_on_char(&mut vim.surface);
        vim
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Route one key to the innermost state. Returns `false` when the key
    /// was not consumed (a chord the host should handle).
    pub fn handle_event(&mut self, key: &KeyEvent) -> bool {
        if key.is_modifier_only() {
            return false;
        }

        let current = self.current();
        let handled = self.dispatch(current, key);
        self.refresh_texts();

        let reset = self.is_idle();
        self.host.on_key(&key.to_vim_string(), reset);
        handled
    }

    /// Handle every key of a notation script such as `"d2w"` or
    /// `"ihello<Esc>"`. A raw newline, tab or escape char stands for its
    /// key.
    ///
    /// # Errors
    ///
    /// [`Error::Keys`](crate::Error::Keys) when the script is malformed;
    /// no key is handled then.
    pub fn feed(&mut self, keys: &str) -> Result<()> {
        let keys = parse_keys(keys)?;
        for key in keys {
            let key = match key.code {
                KeyCode::Char('\n' | '\r') => KeyEvent::key(KeyCode::Enter),
                KeyCode::Char('\t') => KeyEvent::key(KeyCode::Tab),
                KeyCode::Char('\x1b') => KeyEvent::key(KeyCode::Escape),
                _ => key,
            };
            self.handle_event(&key);
        }
        Ok(())
    }

    /// Run an ex line (`:1,2d`, `s/a/b/g`) as if typed into the command
    /// bar, without recording it in the history. Returns `false` when the
    /// line names no command.
    pub fn execute_command(&mut self, line: &str) -> bool {
        if self.host.execute_command(line) {
            return true;
        }
        let Some(command) = self.parse_command(line) else {
            return false;
        };

        let parent = self
            .tree
            .find_ancestor(self.current(), KindTag::Normal)
            .unwrap_or(self.root);
        self.adopt(parent, command);
        self.repeat_state(command);
        self.unparent(command);

        keep_on_char(&mut self.surface);
        self.refresh_texts();
        true
    }

    /// Abandon whatever is in progress and return to a fresh Normal.
    pub fn reset(&mut self) {
        let Some(normal) = self.tree.child(self.root) else {
            return;
        };
        while let Some(child) = self.tree.child(normal) {
            self.pop(child);
        }
        self.set_current_register(normal, None);
        self.normal_clear(normal);
        self.refresh_texts();
    }

    /// Tell the engine the surface cursor or selection changed outside it
    /// (a mouse click, an embedder's command).
    pub fn cursor_moved(&mut self) {
        let current = self.current();
        match self.tag_of(current) {
            KindTag::Visual => {
                let cursor = self.surface.cursor();
                self.visual_warp(current, cursor);
            }
            KindTag::Normal if self.surface.has_selection() => {
                debug!("external selection, entering visual");
                let visual = self.visual_from_selection();
                self.normal_clear(current);
                self.push(current, visual);
                self.refresh_texts();
            }
            KindTag::Normal => keep_on_char(&mut self.surface),
            _ => {}
        }
    }

    /// Recompute the preview and command-bar texts, notifying the host of
    /// changes.
    fn refresh_texts(&mut self) {
        let mut command_text = String::new();
        self.append_command(self.root, &mut command_text);
        if command_text != self.command_text {
            trace!(command_text, "command text");
            self.host.command_text_changed(&command_text);
            self.command_text = command_text;
        }

        let current = self.current();
        let bar_text = match self.tree.command_bar(current) {
            Some(bar) => bar.text().to_owned(),
            None => self
                .tree
                .ancestors(current)
                .find_map(|id| self.label(id))
                .unwrap_or_default()
                .to_owned(),
        };
        if bar_text != self.command_bar_text {
            self.host.command_bar_text_changed(&bar_text);
            self.command_bar_text = bar_text;
        }
    }

    /// Back in a Normal with nothing typed.
    fn is_idle(&self) -> bool {
        self.tree.normal(self.current()).is_some_and(Normal::is_idle)
    }

    pub(crate) fn root_resume(&mut self, from: StateId) {
        self.surface.set_overwrite(false);
        self.unparent(from);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub const fn surface(&self) -> &S {
        &self.surface
    }

    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub const fn host(&self) -> &H {
        &self.host
    }

    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    pub const fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    /// The register store shared through the context.
    pub fn registers(&self) -> Ref<'_, Registers> {
        self.ctx.registers()
    }

    /// Pending-command preview, such as `2d` or `"ay`.
    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    /// The command-bar line while it is open, else the mode label.
    pub fn command_bar_text(&self) -> &str {
        &self.command_bar_text
    }

    pub fn mode(&self) -> Mode {
        let current = self.current();
        for id in self.tree.ancestors(current) {
            match self.tree.get(id).map(|node| &node.kind) {
                Some(Kind::Insert(_)) => return Mode::Insert,
                Some(Kind::Replace(_)) => return Mode::Replace,
                Some(Kind::Visual(visual)) if id == current => return Mode::Visual(Visual::mode(visual)),
                Some(Kind::CommandBar(_)) => return Mode::CommandBar,
                Some(Kind::Normal(normal)) if id == current && normal.is_idle() => return Mode::Normal,
                Some(Kind::InsertLiteral) => {}
                Some(Kind::Root) | None => return Mode::Normal,
                Some(_) => return Mode::Pending,
            }
        }
        Mode::Normal
    }
}

impl<S: fmt::Debug, H> fmt::Debug for Vim<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vim")
            .field("surface", &self.surface)
            .field("states", &self.tree.len())
            .field("command_text", &self.command_text)
            .finish_non_exhaustive()
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

    #[derive(Debug, Default)]
    struct Recorder {
        keys: Vec<(String, bool)>,
        previews: Vec<String>,
        bars: Vec<String>,
        beeps: usize,
    }

    impl Host for Recorder {
        fn on_key(&mut self, key: &str, reset: bool) {
            self.keys.push((key.to_owned(), reset));
        }

        fn command_text_changed(&mut self, text: &str) {
            self.previews.push(text.to_owned());
        }

        fn command_bar_text_changed(&mut self, text: &str) {
            self.bars.push(text.to_owned());
        }

        fn beep(&mut self) {
            self.beeps += 1;
        }
    }

    #[test]
    fn delete_word_fills_unnamed_register() {
        let mut vim = vim("hello world\n");
        vim.feed("dw").unwrap();
        assert_eq!(vim.surface().text(), "world\n");
        assert_eq!(vim.registers().get(None).as_deref(), Some("hello "));
    }

    #[test]
    fn counted_dd() {
        let mut vim = vim("foo\nbar\nbaz\n");
        vim.feed("2dd").unwrap();
        assert_eq!(vim.surface().text(), "baz\n");
        assert_eq!(vim.registers().get(None).as_deref(), Some("foo\nbar\n"));
        assert_eq!(vim.registers().get(Some('1')).as_deref(), Some("foo\nbar\n"));
    }

    #[test]
    fn visual_delete_to_line_end() {
        let mut vim = vim("abc\n");
        vim.feed("vll").unwrap();
        let (a, b) = (vim.surface().cursor(), vim.surface().selection_bound());
        assert_eq!((a.min(b), a.max(b)), (0, 3));
        vim.feed("d").unwrap();
        assert_eq!(vim.surface().text(), "\n");
    }

    #[test]
    fn delete_a_word() {
        let mut vim = vim("one two three\n");
        vim.feed("daw").unwrap();
        assert_eq!(vim.surface().text(), "two three\n");
    }

    #[test]
    fn ex_range_delete() {
        let mut vim = vim("a\nb\nc\n");
        assert!(vim.execute_command(":1,2d"));
        assert_eq!(vim.surface().text(), "c\n");
        assert!(vim.context().command_history().is_empty());
    }

    #[test]
    fn insert_replay_inserts_before_the_cursor_char() {
        let mut vim = vim("");
        vim.feed("ihi<Esc>").unwrap();
        assert_eq!(vim.surface().text(), "hi");
        // Escape stepped back onto the `i`, so the replay goes in front of it.
        vim.feed(".").unwrap();
        assert_eq!(vim.surface().text(), "hhii");
    }

    #[test]
    fn append_replay_doubles_the_text() {
        let mut vim = vim("");
        vim.feed("ahi<Esc>.").unwrap();
        assert_eq!(vim.surface().text(), "hihi");
    }

    #[test]
    fn unknown_line_is_refused() {
        let mut vim = vim("abc\n");
        assert!(!vim.execute_command("frobnicate"));
        assert_eq!(vim.surface().text(), "abc\n");
    }

    #[test]
    fn modes_follow_the_innermost_state() {
        let mut vim = vim("abc\n");
        assert_eq!(vim.mode(), Mode::Normal);
        vim.feed("i").unwrap();
        assert_eq!(vim.mode(), Mode::Insert);
        assert_eq!(vim.command_bar_text(), "-- INSERT --");
        vim.feed("<C-v>").unwrap();
        assert_eq!(vim.mode(), Mode::Insert);
        vim.feed("x<Esc>R").unwrap();
        assert_eq!(vim.mode(), Mode::Replace);
        vim.feed("<Esc>\"a").unwrap();
        assert_eq!(vim.mode(), Mode::Pending);
        vim.feed("<Esc>V").unwrap();
        assert_eq!(vim.mode(), Mode::Visual(VisualMode::Line));
        assert_eq!(vim.mode().to_string(), "visual-line");
    }

    #[test]
    fn host_sees_keys_previews_and_labels() {
        let mut vim = Vim::with_host(RopeSurface::new("abc def ghi\n"), Recorder::default());
        vim.feed("2dw").unwrap();
        assert_eq!(vim.surface().text(), "ghi\n");

        let host = vim.host();
        assert_eq!(
            host.keys,
            [("2".to_owned(), false), ("d".to_owned(), false), ("w".to_owned(), true)]
        );
        assert_eq!(host.previews, ["2", "2d", ""]);

        vim.feed("i<Esc>Q").unwrap();
        let host = vim.host();
        assert_eq!(host.bars, ["-- INSERT --", ""]);
        assert_eq!(host.beeps, 1);
    }

    #[test]
    fn reset_abandons_pending_input() {
        let mut vim = vim("abc\n");
        vim.feed("\"a2d").unwrap();
        assert_eq!(vim.command_text(), "\"a2d");
        vim.reset();
        assert_eq!(vim.mode(), Mode::Normal);
        assert_eq!(vim.command_text(), "");
        vim.feed("x").unwrap();
        assert_eq!(vim.surface().text(), "bc\n");
        assert_eq!(vim.registers().get(Some('a')), None);
    }

    #[test]
    fn reset_leaves_insert() {
        let mut vim = vim("abc\n");
        vim.feed("Axy").unwrap();
        vim.reset();
        assert_eq!(vim.mode(), Mode::Normal);
        assert_eq!(vim.surface().text(), "abcxy\n");
    }

    #[test]
    fn external_selection_enters_visual() {
        let mut vim = vim("hello world\n");
        vim.surface_mut().select(5, 0);
        vim.cursor_moved();
        assert_eq!(vim.mode(), Mode::Visual(VisualMode::Char));
        vim.feed("d").unwrap();
        assert_eq!(vim.surface().text(), " world\n");
    }

    #[test]
    fn cursor_moved_keeps_normal_off_the_newline() {
        let mut vim = vim("abc\n");
        vim.surface_mut().place_cursor(3);
        vim.cursor_moved();
        assert_eq!(vim.surface().cursor(), 2);
    }

    #[test]
    fn malformed_script_is_an_error() {
        let mut vim = vim("abc\n");
        assert!(vim.feed("<Nope>").is_err());
        assert_eq!(vim.surface().text(), "abc\n");
    }

    #[test]
    fn invalid_context_is_rejected() {
        let mut ctx = Context::default();
        ctx.config.max_jumps = 0;
        assert!(Vim::with_context(RopeSurface::new(""), NoHost, ctx).is_err());
    }
}
