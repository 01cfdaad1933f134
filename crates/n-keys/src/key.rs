// SPDX-License-Identifier: MIT
//
// Key events as the modal engine sees them.
//
// A key is a `KeyCode` plus a set of `Modifiers`. Hosts translate their
// native events (terminal bytes, toolkit key events, test scripts) into
// `KeyEvent` values and hand them to the engine one at a time.
//
// Two string renderings exist because the engine needs both:
//
// - `to_vim_string` is the printable form used for the command preview
//   and for matching command keys (`^R` for Ctrl-R, `^[` for Escape,
//   `\n` for Return).
// - `unescaped` is the literal text a key stands for when inserted
//   verbatim (Ctrl-V in insert mode): Tab is a real tab, Return is a
//   real newline, Escape is the ESC control byte.

use std::fmt;

use bitflags::bitflags;

// ─── Key Types ──────────────────────────────────────────────────────────────

/// A single key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Which key was pressed.
    pub code: KeyCode,
    /// Active modifier keys (Shift, Alt, Ctrl, etc.).
    pub modifiers: Modifiers,
}

/// Identity of a key.
///
/// Printable characters use [`Char`](KeyCode::Char) and carry their
/// shifted form (`'A'`, not `'a'` + Shift). Function keys F1–F35 use
/// [`F`](KeyCode::F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A Unicode character (printable).
    Char(char),
    // ── Named keys ──────────────────────────────────────────────
    Enter,
    Tab,
    /// Shift-Tab as reported by most toolkits (`ISO_Left_Tab`).
    BackTab,
    Backspace,
    Escape,
    Delete,
    Insert,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    // ── Function keys ───────────────────────────────────────────
    /// F1 through F35.
    F(u8),
    // ── Modifier and lock keys ──────────────────────────────────
    /// A modifier key pressed on its own (Shift, Control, ...).
    Modifier(ModifierKey),
    CapsLock,
    ScrollLock,
    NumLock,
}

/// Keys that only change the modifier state.
///
/// The engine ignores these entirely: pressing Shift before `A` must not
/// abort a pending operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    Shift,
    Control,
    Alt,
    Meta,
    Super,
    Hyper,
    IsoLevel3Shift,
}

bitflags! {
    /// Keyboard modifier flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
        const SUPER = 0b0000_1000;
        const HYPER = 0b0001_0000;
        const META  = 0b0010_0000;
    }
}

// ─── Constructors ───────────────────────────────────────────────────────────

impl KeyEvent {
    /// Build a key event from a code and modifiers.
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// A named key with no modifiers.
    #[must_use]
    pub const fn key(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }

    /// A printable character with no modifiers.
    #[must_use]
    pub const fn char(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), Modifiers::empty())
    }

    /// Ctrl + character (`ctrl('r')` is `<C-r>`).
    #[must_use]
    pub const fn ctrl(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), Modifiers::CTRL)
    }

    // ─── Queries ────────────────────────────────────────────────────────

    /// The character carried by the key, if it is a [`KeyCode::Char`].
    #[must_use]
    pub const fn as_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch) => Some(ch),
            _ => None,
        }
    }

    /// True if Control is held.
    #[must_use]
    pub const fn is_ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// True if this is exactly Ctrl + `ch`.
    #[must_use]
    pub fn is_ctrl_char(&self, ch: char) -> bool {
        self.is_ctrl() && self.code == KeyCode::Char(ch)
    }

    /// True if the plain character `ch` was typed (Shift allowed, since
    /// shifted characters already carry their case).
    #[must_use]
    pub fn is_char(&self, ch: char) -> bool {
        self.code == KeyCode::Char(ch)
            && !self
                .modifiers
                .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::SUPER)
    }

    /// True if any of Ctrl, Alt or Super is held.
    #[must_use]
    pub const fn has_command_modifier(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::CTRL.union(Modifiers::ALT).union(Modifiers::SUPER))
    }

    /// True for keys that only change modifier or lock state.
    #[must_use]
    pub const fn is_modifier_only(&self) -> bool {
        matches!(
            self.code,
            KeyCode::Modifier(_) | KeyCode::CapsLock | KeyCode::NumLock | KeyCode::ScrollLock
        )
    }

    /// True for Escape and its Ctrl-[ alias.
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.code == KeyCode::Escape || self.is_ctrl_char('[')
    }

    // ─── String forms ───────────────────────────────────────────────────

    /// Printable form of the key for command previews and matching.
    ///
    /// Control chords render as `^X` with the letter upper-cased, Escape
    /// as `^[`, Backspace as `^H`, Tab as `\t` and Return as `\n` (both
    /// as two visible characters). Keys with no printable form render as
    /// an empty string (or a bare `^` when Control is held).
    #[must_use]
    pub fn to_vim_string(&self) -> String {
        let mut out = String::new();

        if self.is_ctrl() {
            out.push('^');
        }

        match self.code {
            KeyCode::Escape => out.push_str("^["),
            KeyCode::Backspace => out.push_str("^H"),
            KeyCode::Tab | KeyCode::BackTab => out.push_str("\\t"),
            KeyCode::Enter => out.push_str("\\n"),
            KeyCode::Char(ch) if self.is_ctrl() => out.extend(ch.to_uppercase()),
            KeyCode::Char(ch) => out.push(ch),
            _ => {}
        }

        out
    }

    /// Literal text the key produces when inserted verbatim.
    #[must_use]
    pub fn unescaped(&self) -> String {
        match self.code {
            KeyCode::Escape => return "\x1b".to_string(),
            KeyCode::Char('l') if self.is_ctrl() => return "\x0c".to_string(),
            KeyCode::Char('a') if self.is_ctrl() => return "\x07".to_string(),
            KeyCode::Tab | KeyCode::BackTab => return "\t".to_string(),
            KeyCode::Backspace => return "\x08".to_string(),
            KeyCode::Enter => return "\n".to_string(),
            _ => {}
        }

        self.to_vim_string()
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::key(code)
    }
}

impl From<char> for KeyEvent {
    fn from(ch: char) -> Self {
        Self::char(ch)
    }
}

// ─── Display ────────────────────────────────────────────────────────────────

/// Renders the key in Vim notation (`a`, `<C-r>`, `<Esc>`, `<lt>`), the
/// inverse of [`crate::parse_keys`].
impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: String = match self.code {
            KeyCode::Char('<') => "lt".to_string(),
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(ch) => ch.to_string(),
            KeyCode::Enter => "CR".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "S-Tab".to_string(),
            KeyCode::Backspace => "BS".to_string(),
            KeyCode::Escape => "Esc".to_string(),
            KeyCode::Delete => "Del".to_string(),
            KeyCode::Insert => "Insert".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Modifier(m) => format!("{m:?}"),
            KeyCode::CapsLock => "CapsLock".to_string(),
            KeyCode::ScrollLock => "ScrollLock".to_string(),
            KeyCode::NumLock => "NumLock".to_string(),
        };

        let mut prefix = String::new();
        if self.modifiers.contains(Modifiers::CTRL) {
            prefix.push_str("C-");
        }
        if self.modifiers.contains(Modifiers::ALT) {
            prefix.push_str("A-");
        }
        if self.modifiers.contains(Modifiers::SUPER) {
            prefix.push_str("D-");
        }

        let plain_char = matches!(self.code, KeyCode::Char(ch) if ch != '<' && ch != ' ');
        if prefix.is_empty() && plain_char {
            f.write_str(&name)
        } else {
            write!(f, "<{prefix}{name}>")
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vim_string_plain_char() {
        assert_eq!(KeyEvent::char('w').to_vim_string(), "w");
        assert_eq!(KeyEvent::char('W').to_vim_string(), "W");
    }

    #[test]
    fn vim_string_ctrl_is_caret_upper() {
        assert_eq!(KeyEvent::ctrl('r').to_vim_string(), "^R");
        assert_eq!(KeyEvent::ctrl('[').to_vim_string(), "^[");
    }

    #[test]
    fn vim_string_named_keys() {
        assert_eq!(KeyEvent::key(KeyCode::Escape).to_vim_string(), "^[");
        assert_eq!(KeyEvent::key(KeyCode::Backspace).to_vim_string(), "^H");
        assert_eq!(KeyEvent::key(KeyCode::Tab).to_vim_string(), "\\t");
        assert_eq!(KeyEvent::key(KeyCode::Enter).to_vim_string(), "\\n");
        assert_eq!(KeyEvent::key(KeyCode::Up).to_vim_string(), "");
    }

    #[test]
    fn unescaped_control_bytes() {
        assert_eq!(KeyEvent::key(KeyCode::Tab).unescaped(), "\t");
        assert_eq!(KeyEvent::key(KeyCode::Enter).unescaped(), "\n");
        assert_eq!(KeyEvent::key(KeyCode::Escape).unescaped(), "\x1b");
        assert_eq!(KeyEvent::ctrl('l').unescaped(), "\x0c");
        assert_eq!(KeyEvent::char('x').unescaped(), "x");
    }

    #[test]
    fn escape_aliases() {
        assert!(KeyEvent::key(KeyCode::Escape).is_escape());
        assert!(KeyEvent::ctrl('[').is_escape());
        assert!(!KeyEvent::char('[').is_escape());
    }

    #[test]
    fn modifier_only_keys() {
        assert!(KeyEvent::key(KeyCode::Modifier(ModifierKey::Shift)).is_modifier_only());
        assert!(KeyEvent::key(KeyCode::CapsLock).is_modifier_only());
        assert!(!KeyEvent::char('a').is_modifier_only());
    }

    #[test]
    fn is_char_ignores_shift_but_not_ctrl() {
        let shifted = KeyEvent::new(KeyCode::Char('A'), Modifiers::SHIFT);
        assert!(shifted.is_char('A'));
        assert!(!KeyEvent::ctrl('a').is_char('a'));
    }

    #[test]
    fn display_round_trips_notation() {
        assert_eq!(KeyEvent::char('d').to_string(), "d");
        assert_eq!(KeyEvent::ctrl('r').to_string(), "<C-r>");
        assert_eq!(KeyEvent::char('<').to_string(), "<lt>");
        assert_eq!(KeyEvent::key(KeyCode::Escape).to_string(), "<Esc>");
    }
}
