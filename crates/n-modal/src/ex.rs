// SPDX-License-Identifier: MIT

//! Ex command-line parsing.
//!
//! A command line is `[range]command`. Parsing is pure: positions are
//! returned symbolically and resolved against the surface by the
//! command that runs them, and nothing here ever fails loudly. A line
//! that matches no form yields `None`.
//!
//! | Range part | Meaning                                  |
//! |------------|------------------------------------------|
//! | `%`        | the whole buffer                         |
//! | `'x`       | mark `x` (`'<` / `'>` snap to lines)     |
//! | `.`        | start of the cursor line                 |
//! | `$`        | end of the buffer                        |
//! | `+N`       | end of the line N lines below the cursor |
//! | `N`        | start of line N (1-based)                |
//!
//! | Command form  | Result                            |
//! |---------------|-----------------------------------|
//! | `name`        | a table command                   |
//! | `name args`   | a table command with options      |
//! | `/pat` `?pat` | search / search-reverse           |
//! | `N`           | line-number                       |
//! | `s/a/b/flags` | search-replace                    |

use std::fmt;

// ---------------------------------------------------------------------------
// Command names
// ---------------------------------------------------------------------------

/// Every command the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Delete,
    Yank,
    Join,
    Undo,
    Redo,
    Nohl,
    Set,
    Colorscheme,
    Sort,
    Write,
    Edit,
    PasteAfter,
    PasteBefore,
    ToggleCase,
    Upcase,
    Downcase,
    Rot13,
    ReplaceOne,
    Indent,
    Unindent,
    Filter,
    Format,
    LineNumber,
    Search,
    SearchReverse,
    SearchReplace,
    JumpBackward,
    JumpForward,
}

impl CommandName {
    /// Look up a name typed on the command line (without the `:`).
    #[must_use]
    pub fn from_ex(name: &str) -> Option<Self> {
        Some(match name {
            "delete" | "d" => Self::Delete,
            "yank" | "y" => Self::Yank,
            "join" | "j" => Self::Join,
            "undo" | "u" => Self::Undo,
            "redo" => Self::Redo,
            "nohl" => Self::Nohl,
            "set" => Self::Set,
            "colorscheme" => Self::Colorscheme,
            "sort" => Self::Sort,
            "write" | "w" => Self::Write,
            "edit" | "e" => Self::Edit,
            _ => return None,
        })
    }

    /// Names reachable from the command line are shown with a `:`.
    #[must_use]
    pub const fn is_ex(self) -> bool {
        matches!(
            self,
            Self::Delete
                | Self::Yank
                | Self::Join
                | Self::Undo
                | Self::Redo
                | Self::Nohl
                | Self::Set
                | Self::Colorscheme
                | Self::Sort
                | Self::Write
                | Self::Edit
        )
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Yank => "yank",
            Self::Join => "join",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Nohl => "nohl",
            Self::Set => "set",
            Self::Colorscheme => "colorscheme",
            Self::Sort => "sort",
            Self::Write => "write",
            Self::Edit => "edit",
            Self::PasteAfter => "paste-after",
            Self::PasteBefore => "paste-before",
            Self::ToggleCase => "toggle-case",
            Self::Upcase => "upcase",
            Self::Downcase => "downcase",
            Self::Rot13 => "rot13",
            Self::ReplaceOne => "replace-one",
            Self::Indent => "indent",
            Self::Unindent => "unindent",
            Self::Filter => "filter",
            Self::Format => "format",
            Self::LineNumber => "line-number",
            Self::Search => "search",
            Self::SearchReverse => "search-reverse",
            Self::SearchReplace => "search-replace",
            Self::JumpBackward => "jump-backward",
            Self::JumpForward => "jump-forward",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ex() {
            f.write_str(":")?;
        }
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

/// One end of a range, still unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Mark(char),
    CursorLine,
    End,
    /// Lines below the cursor line.
    Below(usize),
    /// 0-based line.
    Line(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Whole,
    Between(Position, Position),
}

fn split_number(s: &str) -> (usize, &str) {
    let digits = s.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(s.len());
    let number = s[..digits]
        .bytes()
        .fold(0_usize, |n, b| n.saturating_mul(10).saturating_add(usize::from(b - b'0')));
    (number, &s[digits..])
}

/// Parse one position off the front of `s`.
#[must_use]
pub fn parse_position(s: &str) -> Option<(Position, &str)> {
    let mut chars = s.chars();
    match chars.next()? {
        '\'' => {
            let name = chars.next()?;
            Some((Position::Mark(name), chars.as_str()))
        }
        '.' => Some((Position::CursorLine, chars.as_str())),
        '$' => Some((Position::End, chars.as_str())),
        '+' if chars.as_str().starts_with(|ch: char| ch.is_ascii_digit()) => {
            let (number, rest) = split_number(chars.as_str());
            Some((Position::Below(number), rest))
        }
        ch if ch.is_ascii_digit() => {
            let (number, rest) = split_number(s);
            Some((Position::Line(number.saturating_sub(1)), rest))
        }
        _ => None,
    }
}

/// Parse `%` or `pos,pos`. On failure nothing is consumed.
#[must_use]
pub fn parse_range(s: &str) -> (Option<Range>, &str) {
    if let Some(rest) = s.strip_prefix('%') {
        return (Some(Range::Whole), rest);
    }
    let parsed = parse_position(s).and_then(|(begin, rest)| {
        let rest = rest.strip_prefix(',')?;
        let (end, rest) = parse_position(rest)?;
        Some((Range::Between(begin, end), rest))
    });
    match parsed {
        Some((range, rest)) => (Some(range), rest),
        None => (None, s),
    }
}

// ---------------------------------------------------------------------------
// Command lines
// ---------------------------------------------------------------------------

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExLine {
    pub range: Option<Range>,
    pub name: CommandName,
    pub options: Option<String>,
}

/// Parse a full command line such as `:1,2d` or `:%s/a/b/g`.
#[must_use]
pub fn parse_line(line: &str) -> Option<ExLine> {
    let line = line.strip_prefix(':').unwrap_or(line);
    let (range, rest) = parse_range(line);

    let found = |name, options: Option<&str>| {
        Some(ExLine {
            range,
            name,
            options: options.map(str::to_owned),
        })
    };

    if let Some(name) = CommandName::from_ex(rest) {
        return found(name, None);
    }
    if let Some(pattern) = rest.strip_prefix('/') {
        return found(CommandName::Search, Some(pattern));
    }
    if let Some(pattern) = rest.strip_prefix('?') {
        return found(CommandName::SearchReverse, Some(pattern));
    }
    if let Some((name, args)) = rest.split_once(' ') {
        if let Some(name) = CommandName::from_ex(name) {
            return found(name, Some(args));
        }
    }
    if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
        return found(CommandName::LineNumber, Some(rest));
    }
    if let Some(args) = rest.strip_prefix('s') {
        return found(CommandName::SearchReplace, Some(args));
    }
    None
}

// ---------------------------------------------------------------------------
// Substitution
// ---------------------------------------------------------------------------

/// The parts of `/search/replace/flags`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    pub search: Option<String>,
    pub replace: Option<String>,
    pub flags: Option<String>,
}

impl Substitution {
    #[must_use]
    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.as_deref().is_some_and(|flags| flags.contains(flag))
    }
}

/// Read one separated field. `Ok((field, Some(rest)))` when the
/// separator closed it, `Ok((field, None))` at end of input, `Err` on a
/// dangling backslash.
fn take_field(s: &str, sep: char) -> Result<(String, Option<&str>), ()> {
    let mut field = String::new();
    let mut escaped = false;
    for (at, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            if ch == sep {
                field.pop();
            }
        } else if ch == '\\' {
            escaped = true;
        } else if ch == sep {
            return Ok((field, Some(&s[at + ch.len_utf8()..])));
        }
        field.push(ch);
    }
    if escaped { Err(()) } else { Ok((field, None)) }
}

/// Split `s` on its first char as separator. `\sep` is a literal
/// separator; other escapes are kept as typed. Trailing separators may
/// be left out. A dangling backslash makes the whole thing invalid.
#[must_use]
pub fn parse_substitution(s: &str) -> Option<Substitution> {
    let mut chars = s.chars();
    let sep = chars.next()?;
    let mut out = Substitution::default();

    let rest = chars.as_str();
    if rest.is_empty() {
        return Some(out);
    }

    let (search, rest) = take_field(rest, sep).ok()?;
    out.search = Some(search);
    let Some(rest) = rest.filter(|rest| !rest.is_empty()) else {
        return Some(out);
    };

    let (replace, rest) = take_field(rest, sep).ok()?;
    out.replace = Some(replace);
    if let Some(flags) = rest.filter(|rest| !rest.is_empty()) {
        out.flags = Some(flags.to_owned());
    }
    Some(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sub(search: Option<&str>, replace: Option<&str>, flags: Option<&str>) -> Substitution {
        Substitution {
            search: search.map(str::to_owned),
            replace: replace.map(str::to_owned),
            flags: flags.map(str::to_owned),
        }
    }

    #[test]
    fn substitution_fields() {
        assert_eq!(parse_substitution("/a/b/g"), Some(sub(Some("a"), Some("b"), Some("g"))));
        assert_eq!(parse_substitution("/a/b"), Some(sub(Some("a"), Some("b"), None)));
        assert_eq!(parse_substitution("/a"), Some(sub(Some("a"), None, None)));
        assert_eq!(parse_substitution("/"), Some(sub(None, None, None)));
        assert_eq!(parse_substitution(""), None);
    }

    #[test]
    fn substitution_escapes() {
        assert_eq!(parse_substitution(r"/a\/b/c"), Some(sub(Some("a/b"), Some("c"), None)));
        assert_eq!(parse_substitution(r"/a\db/c"), Some(sub(Some(r"a\db"), Some("c"), None)));
        assert_eq!(parse_substitution(r"#x#\1#"), Some(sub(Some("x"), Some(r"\1"), None)));
        assert_eq!(parse_substitution(r"/a\"), None);
    }

    #[test]
    fn positions() {
        assert_eq!(parse_position("'a,"), Some((Position::Mark('a'), ",")));
        assert_eq!(parse_position(".d"), Some((Position::CursorLine, "d")));
        assert_eq!(parse_position("$"), Some((Position::End, "")));
        assert_eq!(parse_position("+12y"), Some((Position::Below(12), "y")));
        assert_eq!(parse_position("3"), Some((Position::Line(2), "")));
        assert_eq!(parse_position("0"), Some((Position::Line(0), "")));
        assert_eq!(parse_position("+x"), None);
    }

    #[test]
    fn ranges_consume_only_on_success() {
        assert_eq!(parse_range("%s/a/b"), (Some(Range::Whole), "s/a/b"));
        assert_eq!(
            parse_range("1,2d"),
            (Some(Range::Between(Position::Line(0), Position::Line(1))), "d")
        );
        assert_eq!(parse_range("12"), (None, "12"));
        assert_eq!(parse_range("1,x"), (None, "1,x"));
    }

    #[test]
    fn command_lines() {
        let line = parse_line(":1,2d").unwrap();
        assert_eq!(line.name, CommandName::Delete);
        assert!(line.range.is_some());

        assert_eq!(parse_line(":set ts=4").unwrap().options.as_deref(), Some("ts=4"));
        assert_eq!(parse_line(":42").unwrap().name, CommandName::LineNumber);
        assert_eq!(parse_line("/foo").unwrap().name, CommandName::Search);
        assert_eq!(parse_line(":?foo").unwrap().options.as_deref(), Some("foo"));

        let replace = parse_line(":'<,'>s/a/b/").unwrap();
        assert_eq!(replace.name, CommandName::SearchReplace);
        assert_eq!(replace.options.as_deref(), Some("/a/b/"));

        assert_eq!(parse_line(":bogus"), None);
        assert_eq!(parse_line(":bogus arg"), None);
    }

    #[test]
    fn names_display_with_colon_when_typed() {
        assert_eq!(CommandName::Delete.to_string(), ":delete");
        assert_eq!(CommandName::PasteAfter.to_string(), "paste-after");
    }
}
