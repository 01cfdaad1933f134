// SPDX-License-Identifier: MIT
//
// Vim key notation parser.
//
// Turns strings such as `d2w`, `ihello<Esc>` or `<C-r>` into a sequence
// of `KeyEvent`s. This is what tests, scripts and the headless driver use
// to talk to the engine.
//
// Grammar:
//
//   keys      := (plain | special)*
//   plain     := any char except '<'
//   special   := '<' modifier* name '>'
//   modifier  := ('C' | 'S' | 'A' | 'M' | 'D') '-'
//
// Names are case-insensitive (`<esc>` == `<Esc>`). A literal `<` is
// written `<lt>`. A single printable name keeps its case, so `<C-v>` and
// `<C-V>` are different keys.

use thiserror::Error;

use crate::key::{KeyCode, KeyEvent, Modifiers};

/// Failure to parse a key notation string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    /// `<` without a closing `>`.
    #[error("unterminated key notation starting at byte {0}")]
    Unterminated(usize),

    /// A `<...>` whose name is not a known key.
    #[error("unknown key name `<{0}>`")]
    UnknownKey(String),

    /// A modifier prefix other than C, S, A, M or D.
    #[error("unknown modifier `{modifier}` in `<{notation}>`")]
    UnknownModifier { modifier: char, notation: String },
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Parse a whole notation string into key events.
///
/// # Errors
///
/// Returns a [`KeyParseError`] for unterminated `<`, unknown key names,
/// or unknown modifiers.
pub fn parse_keys(input: &str) -> Result<Vec<KeyEvent>, KeyParseError> {
    let mut keys = Vec::new();
    let mut rest = input;
    let mut offset = 0;

    while let Some(ch) = rest.chars().next() {
        if ch == '<' {
            let close = rest.find('>').ok_or(KeyParseError::Unterminated(offset))?;
            let inner = &rest[1..close];
            keys.push(parse_special(inner)?);
            offset += close + 1;
            rest = &rest[close + 1..];
        } else {
            keys.push(plain_key(ch));
            offset += ch.len_utf8();
            rest = &rest[ch.len_utf8()..];
        }
    }

    Ok(keys)
}

/// Parse the inside of a single `<...>` group, without the brackets.
///
/// # Errors
///
/// Same as [`parse_keys`].
pub fn parse_special(inner: &str) -> Result<KeyEvent, KeyParseError> {
    let mut modifiers = Modifiers::empty();
    let mut name = inner;

    // Peel `X-` prefixes. A name of `-` itself (`<C-->`) stays a name.
    while name.len() > 2 && name.as_bytes()[1] == b'-' {
        let modifier = name.as_bytes()[0] as char;
        modifiers |= match modifier.to_ascii_uppercase() {
            'C' => Modifiers::CTRL,
            'S' => Modifiers::SHIFT,
            'A' | 'M' => Modifiers::ALT,
            'D' => Modifiers::SUPER,
            _ => {
                return Err(KeyParseError::UnknownModifier {
                    modifier,
                    notation: inner.to_string(),
                });
            }
        };
        name = &name[2..];
    }

    let code = named_code(name).ok_or_else(|| KeyParseError::UnknownKey(inner.to_string()))?;

    let code = match code {
        KeyCode::Tab if modifiers.contains(Modifiers::SHIFT) => KeyCode::BackTab,
        other => other,
    };

    if let KeyCode::Char(ch) = code {
        if ch.is_uppercase() {
            modifiers |= Modifiers::SHIFT;
        }
    }

    Ok(KeyEvent::new(code, modifiers))
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn plain_key(ch: char) -> KeyEvent {
    let modifiers = if ch.is_uppercase() {
        Modifiers::SHIFT
    } else {
        Modifiers::empty()
    };
    KeyEvent::new(KeyCode::Char(ch), modifiers)
}

fn named_code(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(ch));
    }

    let lower = name.to_ascii_lowercase();
    let code = match lower.as_str() {
        "esc" | "escape" => KeyCode::Escape,
        "cr" | "enter" | "return" => KeyCode::Enter,
        "bs" | "backspace" => KeyCode::Backspace,
        "tab" => KeyCode::Tab,
        "del" | "delete" => KeyCode::Delete,
        "ins" | "insert" => KeyCode::Insert,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "lt" => KeyCode::Char('<'),
        "gt" => KeyCode::Char('>'),
        "space" => KeyCode::Char(' '),
        "bar" => KeyCode::Char('|'),
        "bslash" => KeyCode::Char('\\'),
        _ => {
            let n: u8 = lower.strip_prefix('f')?.parse().ok()?;
            if (1..=35).contains(&n) {
                KeyCode::F(n)
            } else {
                return None;
            }
        }
    };

    Some(code)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_characters() {
        let keys = parse_keys("d2w").unwrap();
        assert_eq!(
            keys,
            vec![KeyEvent::char('d'), KeyEvent::char('2'), KeyEvent::char('w')]
        );
    }

    #[test]
    fn uppercase_carries_shift() {
        let keys = parse_keys("G").unwrap();
        assert_eq!(keys, vec![KeyEvent::new(KeyCode::Char('G'), Modifiers::SHIFT)]);
    }

    #[test]
    fn special_names_are_case_insensitive() {
        assert_eq!(parse_keys("<esc>").unwrap(), parse_keys("<Esc>").unwrap());
        assert_eq!(
            parse_keys("<CR>").unwrap(),
            vec![KeyEvent::key(KeyCode::Enter)]
        );
    }

    #[test]
    fn ctrl_chords() {
        assert_eq!(parse_keys("<C-r>").unwrap(), vec![KeyEvent::ctrl('r')]);
        assert_eq!(
            parse_keys("<C-V>").unwrap(),
            vec![KeyEvent::new(
                KeyCode::Char('V'),
                Modifiers::CTRL | Modifiers::SHIFT
            )]
        );
    }

    #[test]
    fn literal_lt_and_mixed_text() {
        let keys = parse_keys("ia<lt>b<Esc>").unwrap();
        assert_eq!(keys.len(), 5);
        assert_eq!(keys[2], KeyEvent::char('<'));
        assert_eq!(keys[4], KeyEvent::key(KeyCode::Escape));
    }

    #[test]
    fn shift_tab_is_backtab() {
        assert_eq!(
            parse_keys("<S-Tab>").unwrap()[0].code,
            KeyCode::BackTab
        );
    }

    #[test]
    fn function_keys() {
        assert_eq!(parse_keys("<F5>").unwrap()[0].code, KeyCode::F(5));
        assert!(parse_keys("<F99>").is_err());
    }

    #[test]
    fn unterminated_is_an_error() {
        assert_eq!(parse_keys("ab<Esc"), Err(KeyParseError::Unterminated(2)));
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert_eq!(
            parse_keys("<Foo>"),
            Err(KeyParseError::UnknownKey("Foo".to_string()))
        );
    }

    #[test]
    fn unknown_modifier_is_an_error() {
        assert!(matches!(
            parse_keys("<X-a>"),
            Err(KeyParseError::UnknownModifier { modifier: 'X', .. })
        ));
    }

    #[test]
    fn display_is_parse_inverse() {
        for text in ["<C-r>", "<Esc>", "<lt>", "x", "<CR>"] {
            let keys = parse_keys(text).unwrap();
            let rendered: String = keys.iter().map(ToString::to_string).collect();
            assert_eq!(rendered, text);
        }
    }
}
