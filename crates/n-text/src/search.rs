// SPDX-License-Identifier: MIT

//! Pattern search over document text.
//!
//! Searches run on a flat `&str` snapshot of the document and report
//! matches in char offsets. Patterns are regular expressions (the
//! `regex` crate dialect) unless [`SearchSettings::regex`] is off, in
//! which case the text is matched literally.
//!
//! Forward search finds the first match starting at or after the origin;
//! backward search finds the last match ending at or before it. With
//! wrap-around enabled a miss continues from the other end of the
//! document and the match is flagged as [`SearchMatch::wrapped`].

use regex::{Captures, Regex, RegexBuilder};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Settings and matches
// ---------------------------------------------------------------------------

/// How to interpret and run a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// The pattern text.
    pub pattern: String,
    /// Interpret `pattern` as a regular expression.
    pub regex: bool,
    pub case_sensitive: bool,
    /// Only match whole words.
    pub at_word_boundaries: bool,
    /// Continue from the other end of the document on a miss.
    pub wrap_around: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            regex: true,
            case_sensitive: true,
            at_word_boundaries: false,
            wrap_around: true,
        }
    }
}

/// A match in char offsets, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
    /// The search went past one end of the document to find this.
    pub wrapped: bool,
}

impl SearchMatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Build the regex that implements `settings`.
///
/// # Errors
///
/// Returns [`SurfaceError::Pattern`](crate::SurfaceError::Pattern) when
/// the pattern does not compile.
pub fn compile(settings: &SearchSettings) -> Result<Regex> {
    let body = if settings.regex {
        settings.pattern.clone()
    } else {
        regex::escape(&settings.pattern)
    };

    let pattern = if settings.at_word_boundaries {
        format!(r"\b(?:{body})\b")
    } else {
        body
    };

    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(!settings.case_sensitive)
        .multi_line(true)
        .build()?)
}

// ---------------------------------------------------------------------------
// Searching
// ---------------------------------------------------------------------------

/// Char-offset view of a text snapshot.
struct Offsets<'a> {
    text: &'a str,
}

impl<'a> Offsets<'a> {
    const fn new(text: &'a str) -> Self {
        Self { text }
    }

    fn byte_of(&self, char_offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_offset)
            .map_or(self.text.len(), |(b, _)| b)
    }

    fn char_of(&self, byte: usize) -> usize {
        self.text[..byte].chars().count()
    }

    fn to_match(&self, start: usize, end: usize, wrapped: bool) -> SearchMatch {
        let s = self.char_of(start);
        let len = self.text[start..end].chars().count();
        SearchMatch {
            start: s,
            end: s + len,
            wrapped,
        }
    }
}

/// First match starting at or after char offset `from`.
#[must_use]
pub fn find_forward(text: &str, re: &Regex, from: usize, wrap_around: bool) -> Option<SearchMatch> {
    let offsets = Offsets::new(text);
    let from_byte = offsets.byte_of(from);

    if let Some(m) = re.find_at(text, from_byte) {
        return Some(offsets.to_match(m.start(), m.end(), false));
    }

    if wrap_around {
        if let Some(m) = re.find(text) {
            if m.start() < from_byte {
                return Some(offsets.to_match(m.start(), m.end(), true));
            }
        }
    }

    None
}

/// Last match ending at or before char offset `from`.
#[must_use]
pub fn find_backward(text: &str, re: &Regex, from: usize, wrap_around: bool) -> Option<SearchMatch> {
    let offsets = Offsets::new(text);
    let from_byte = offsets.byte_of(from);

    let mut before = None;
    let mut last = None;
    for m in re.find_iter(text) {
        if m.end() <= from_byte {
            before = Some((m.start(), m.end()));
        }
        last = Some((m.start(), m.end()));
    }

    if let Some((s, e)) = before {
        return Some(offsets.to_match(s, e, false));
    }

    if wrap_around {
        if let Some((s, e)) = last {
            if s > from_byte {
                return Some(offsets.to_match(s, e, true));
            }
        }
    }

    None
}

/// Expand a replacement template against the match at char offset
/// `start`.
///
/// With `regex` on, `\0`..`\9` insert capture groups, `\n` and `\t` are a
/// newline and a tab, and `\\` is a backslash. Without it the template is
/// inserted verbatim.
#[must_use]
pub fn expand_replacement(text: &str, re: &Regex, start: usize, template: &str, regex: bool) -> String {
    if !regex {
        return template.to_string();
    }

    let offsets = Offsets::new(text);
    let Some(caps) = re.captures_at(text, offsets.byte_of(start)) else {
        return template.to_string();
    };

    expand_with(&caps, template)
}

fn expand_with(caps: &Captures<'_>, template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(d @ '0'..='9') => {
                let group = d as usize - '0' as usize;
                if let Some(m) = caps.get(group) {
                    out.push_str(m.as_str());
                }
            }
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pattern: &str) -> SearchSettings {
        SearchSettings {
            pattern: pattern.to_string(),
            ..SearchSettings::default()
        }
    }

    #[test]
    fn forward_finds_at_origin() {
        let re = compile(&settings("foo")).unwrap();
        let m = find_forward("foo bar foo", &re, 0, true).unwrap();
        assert_eq!((m.start, m.end, m.wrapped), (0, 3, false));
    }

    #[test]
    fn forward_wraps() {
        let re = compile(&settings("foo")).unwrap();
        let m = find_forward("foo bar", &re, 1, true).unwrap();
        assert_eq!((m.start, m.wrapped), (0, true));
        assert!(find_forward("foo bar", &re, 1, false).is_none());
    }

    #[test]
    fn backward_finds_at_or_before() {
        let re = compile(&settings("o")).unwrap();
        let m = find_backward("foo bar foo", &re, 8, true).unwrap();
        assert_eq!(m.start, 2);
        let m = find_backward("foo bar foo", &re, 0, true).unwrap();
        assert_eq!((m.start, m.wrapped), (10, true));
    }

    #[test]
    fn offsets_are_chars_not_bytes() {
        let re = compile(&settings("b")).unwrap();
        let m = find_forward("ééb", &re, 0, false).unwrap();
        assert_eq!((m.start, m.end), (2, 3));
    }

    #[test]
    fn literal_mode_escapes() {
        let mut s = settings("a.c");
        s.regex = false;
        let re = compile(&s).unwrap();
        assert!(find_forward("abc", &re, 0, false).is_none());
        assert!(find_forward("a.c", &re, 0, false).is_some());
    }

    #[test]
    fn word_boundaries_and_case() {
        let mut s = settings("foo");
        s.at_word_boundaries = true;
        s.case_sensitive = false;
        let re = compile(&s).unwrap();
        let m = find_forward("foobar FOO", &re, 0, false).unwrap();
        assert_eq!(m.start, 7);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(compile(&settings("(")).is_err());
    }

    #[test]
    fn replacement_groups_and_escapes() {
        let re = compile(&settings("(a)(b)")).unwrap();
        let text = "xab";
        assert_eq!(expand_replacement(text, &re, 1, r"\2\1\n", true), "ba\n");
        assert_eq!(expand_replacement(text, &re, 1, r"\2", false), r"\2");
    }
}
