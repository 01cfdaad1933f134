// SPDX-License-Identifier: MIT

//! Editor options and the `:set` parsing layer.
//!
//! [`EditorOptions`] holds the view settings a surface exposes to the
//! modal engine. [`parse_set`] turns the argument string of `:set` into
//! [`SetDirective`]s; applying them is up to the caller, because some
//! directives (`hls`, `ft=`) reach beyond plain option values.
//!
//! | Full name     | Abbrev | Type    | Default |
//! |---------------|--------|---------|---------|
//! | `tabstop`     | `ts`   | integer | 8       |
//! | `shiftwidth`  | `sw`   | integer | -1      |
//! | `expandtab`   | `et`   | bool    | false   |
//! | `number`      | `nu`   | bool    | false   |
//! | `wrap`        |        | bool    | false   |
//! | `autoindent`  | `ai`   | bool    | false   |
//! | `hlsearch`    | `hls`  | bool    | true    |
//! | `incsearch`   | `is`   | bool    | true    |
//! | `filetype`    | `ft`   | string  | none    |

/// Largest accepted tab or indent width.
pub const MAX_WIDTH: u32 = 32;

// ---------------------------------------------------------------------------
// EditorOptions
// ---------------------------------------------------------------------------

/// View settings the engine reads and `:set` changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// Display width of a tab character, `1..=32`.
    pub tab_width: u32,
    /// Width of one indentation level; `None` means "same as tab width".
    pub indent_width: Option<u32>,
    /// Insert spaces instead of tabs when indenting.
    pub insert_spaces: bool,
    pub show_line_numbers: bool,
    pub wrap: bool,
    /// Copy the previous line's indentation on newline.
    pub auto_indent: bool,
    /// Language id set through `:set ft=`.
    pub language: Option<String>,
    /// Style scheme id set through `:colorscheme`.
    pub style_scheme: Option<String>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            tab_width: 8,
            indent_width: None,
            insert_spaces: false,
            show_line_numbers: false,
            wrap: false,
            auto_indent: false,
            language: None,
            style_scheme: None,
        }
    }
}

impl EditorOptions {
    /// Effective indentation width in columns.
    #[must_use]
    pub fn real_indent_width(&self) -> u32 {
        self.indent_width.unwrap_or(self.tab_width)
    }

    /// Set the tab width. Zero is rejected; larger values are clamped.
    pub fn set_tab_width(&mut self, width: u32) {
        if width > 0 {
            self.tab_width = width.min(MAX_WIDTH);
        }
    }

    /// Set the indent width. Zero means "follow the tab width".
    pub fn set_indent_width(&mut self, width: u32) {
        self.indent_width = (width > 0).then(|| width.min(MAX_WIDTH));
    }

    /// The text one level of indentation inserts.
    #[must_use]
    pub fn indent_unit(&self) -> String {
        let width = self.real_indent_width() as usize;
        if self.insert_spaces {
            " ".repeat(width)
        } else if self.indent_width.is_some() && self.real_indent_width() != self.tab_width {
            let tab = self.tab_width as usize;
            let mut unit = "\t".repeat(width / tab);
            unit.push_str(&" ".repeat(width % tab));
            unit
        } else {
            "\t".to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// :set parsing
// ---------------------------------------------------------------------------

/// A parsed `:set` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    /// `:set option`: enable a boolean option.
    On(String),

    /// `:set nooption`: disable a boolean option.
    Off(String),

    /// `:set option=value`: assign a value.
    Assign(String, String),
}

/// Returns `true` if `name` is a known boolean option (full name or abbreviation).
#[must_use]
pub fn is_bool_option(name: &str) -> bool {
    matches!(
        name,
        "number"
            | "nu"
            | "expandtab"
            | "et"
            | "wrap"
            | "autoindent"
            | "ai"
            | "hlsearch"
            | "hls"
            | "incsearch"
            | "is"
    )
}

/// Parse the full `:set` arguments into directives, one per
/// space-separated word. Empty words are skipped.
#[must_use]
pub fn parse_set(args: &str) -> Vec<SetDirective> {
    args.split(' ')
        .filter(|arg| !arg.is_empty())
        .map(parse_set_arg)
        .collect()
}

/// Parse a single `:set` argument into a directive.
#[must_use]
pub fn parse_set_arg(arg: &str) -> SetDirective {
    if let Some((name, value)) = arg.split_once('=') {
        return SetDirective::Assign(name.to_string(), value.to_string());
    }

    // `nonu` is Off("nu"), but `number` is not Off("mber").
    if let Some(name) = arg.strip_prefix("no") {
        if is_bool_option(name) {
            return SetDirective::Off(name.to_string());
        }
    }

    SetDirective::On(arg.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_set_arg ─────────────────────────────────────────────────────

    #[test]
    fn parse_boolean_on() {
        assert_eq!(parse_set_arg("nu"), SetDirective::On("nu".into()));
        assert_eq!(parse_set_arg("number"), SetDirective::On("number".into()));
    }

    #[test]
    fn parse_boolean_off() {
        assert_eq!(parse_set_arg("nonu"), SetDirective::Off("nu".into()));
        assert_eq!(
            parse_set_arg("noexpandtab"),
            SetDirective::Off("expandtab".into())
        );
    }

    #[test]
    fn parse_assignment() {
        assert_eq!(
            parse_set_arg("ts=4"),
            SetDirective::Assign("ts".into(), "4".into())
        );
        assert_eq!(
            parse_set_arg("ft=rust"),
            SetDirective::Assign("ft".into(), "rust".into())
        );
    }

    #[test]
    fn parse_many_skips_blanks() {
        assert_eq!(
            parse_set("et  sw=2"),
            vec![
                SetDirective::On("et".into()),
                SetDirective::Assign("sw".into(), "2".into())
            ]
        );
    }

    // ── EditorOptions ─────────────────────────────────────────────────────

    #[test]
    fn widths_are_clamped() {
        let mut o = EditorOptions::default();
        o.set_tab_width(0);
        assert_eq!(o.tab_width, 8);
        o.set_tab_width(99);
        assert_eq!(o.tab_width, MAX_WIDTH);
        o.set_indent_width(0);
        assert_eq!(o.indent_width, None);
        assert_eq!(o.real_indent_width(), MAX_WIDTH);
    }

    #[test]
    fn indent_unit_variants() {
        let mut o = EditorOptions::default();
        assert_eq!(o.indent_unit(), "\t");

        o.insert_spaces = true;
        o.set_indent_width(4);
        assert_eq!(o.indent_unit(), "    ");

        o.insert_spaces = false;
        o.set_tab_width(4);
        o.set_indent_width(6);
        assert_eq!(o.indent_unit(), "\t  ");
    }
}
