// SPDX-License-Identifier: MIT

//! Text objects (`iw`, `a(`, `i"`, `ap`, …).
//!
//! Selection runs in three steps from the origin:
//!
//! 1. find the inner end (stay put if already on one);
//! 2. walk back from there to the inner start;
//! 3. extend the inner range into the "a" range with per-family rules.
//!
//! | Keys              | Object            | Extension                           |
//! |-------------------|-------------------|-------------------------------------|
//! | `w` `W`           | word / WORD       | trailing blanks, else leading ones  |
//! | `s`               | sentence          | trailing blanks                     |
//! | `p`               | paragraph         | surrounding empty lines (linewise)  |
//! | `(` `)` `b`       | paren block       | the delimiters                      |
//! | `{` `}` `B`       | brace block       | the delimiters                      |
//! | `[` `]`           | bracket block     | the delimiters                      |
//! | `<` `>`           | angle block       | the delimiters                      |
//! | `"` `'` `` ` ``   | quoted string     | the quotes                          |

use std::fmt;

use n_text::TextSurface;

use crate::iter::{
    TextIter, WordKind, backward_block_start, backward_paragraph_open, backward_quote_start,
    backward_sentence_start, backward_word_start, ends_quote, ends_sentence, ends_word, forward_block_end,
    forward_paragraph_close, forward_quote_end, forward_sentence_close, forward_word_end, is_paragraph_break,
    line_is_empty, starts_word,
};

/// What a text object covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Word,
    BigWord,
    Sentence,
    Paragraph,
    Paren,
    Brace,
    Bracket,
    Angle,
    DoubleQuote,
    SingleQuote,
    Grave,
}

impl ObjectKind {
    /// Kind for the key typed after `i` / `a`.
    #[must_use]
    pub const fn from_key(key: char) -> Option<Self> {
        Some(match key {
            'w' => Self::Word,
            'W' => Self::BigWord,
            's' => Self::Sentence,
            'p' => Self::Paragraph,
            '(' | ')' | 'b' => Self::Paren,
            '{' | '}' | 'B' => Self::Brace,
            '[' | ']' => Self::Bracket,
            '<' | '>' => Self::Angle,
            '"' => Self::DoubleQuote,
            '\'' => Self::SingleQuote,
            '`' => Self::Grave,
            _ => return None,
        })
    }

    const fn delimiters(self) -> Option<(char, char)> {
        match self {
            Self::Paren => Some(('(', ')')),
            Self::Brace => Some(('{', '}')),
            Self::Bracket => Some(('[', ']')),
            Self::Angle => Some(('<', '>')),
            _ => None,
        }
    }

    const fn quote(self) -> Option<char> {
        match self {
            Self::DoubleQuote => Some('"'),
            Self::SingleQuote => Some('\''),
            Self::Grave => Some('`'),
            _ => None,
        }
    }

    const fn word_kind(self) -> Option<WordKind> {
        match self {
            Self::Word => Some(WordKind::Word),
            Self::BigWord => Some(WordKind::BigWord),
            _ => None,
        }
    }
}

/// A text object bound to `inner` / `a` and a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextObject {
    pub kind: ObjectKind,
    pub inner: bool,
    pub count: usize,
}

impl TextObject {
    #[must_use]
    pub const fn new(kind: ObjectKind, inner: bool) -> Self {
        Self { kind, inner, count: 1 }
    }

    /// `i`/`a` followed by an object key.
    #[must_use]
    pub const fn from_keys(modifier: char, key: char) -> Option<Self> {
        let inner = match modifier {
            'i' => true,
            'a' => false,
            _ => return None,
        };
        match ObjectKind::from_key(key) {
            Some(kind) => Some(Self::new(kind, inner)),
            None => None,
        }
    }

    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = if count == 0 { 1 } else { count };
        self
    }

    /// Paragraphs select whole lines.
    #[must_use]
    pub const fn is_linewise(&self) -> bool {
        matches!(self.kind, ObjectKind::Paragraph)
    }

    /// Range `(start, end)` the object covers around `origin`, or `None`
    /// when there is no such object there.
    pub fn select<S: TextSurface + ?Sized>(&self, surface: &S, origin: usize) -> Option<(usize, usize)> {
        let origin = TextIter::new(surface, origin);

        let mut inner_end = origin;
        if !self.ends(&inner_end) && !self.forward_end(&mut inner_end) {
            return None;
        }

        let mut inner_begin = inner_end;
        if !self.starts(&inner_begin) && !self.backward_start(&mut inner_begin) {
            return None;
        }

        for _ in 1..self.count {
            if !self.forward_end(&mut inner_end) {
                return None;
            }
        }

        let mut range = Range {
            inner_begin,
            inner_end,
            a_begin: inner_begin,
            a_end: inner_end,
        };
        if !self.extend(&origin, &mut range) {
            return None;
        }

        Some(if self.inner {
            (range.inner_begin.offset(), range.inner_end.offset())
        } else {
            (range.a_begin.offset(), range.a_end.offset())
        })
    }

    fn ends<S: TextSurface + ?Sized>(&self, it: &TextIter<'_, S>) -> bool {
        if let Some(kind) = self.kind.word_kind() {
            return ends_word(it, kind);
        }
        if let Some((_, close)) = self.kind.delimiters() {
            return it.char() == close;
        }
        if let Some(quote) = self.kind.quote() {
            return ends_quote(it, quote);
        }
        match self.kind {
            ObjectKind::Sentence => ends_sentence(it),
            _ => is_paragraph_break(it),
        }
    }

    fn starts<S: TextSurface + ?Sized>(&self, it: &TextIter<'_, S>) -> bool {
        if let Some(kind) = self.kind.word_kind() {
            return starts_word(it, kind);
        }
        if let Some((open, _)) = self.kind.delimiters() {
            return it.char() == open;
        }
        match self.kind {
            ObjectKind::Paragraph => is_paragraph_break(it),
            _ => false,
        }
    }

    fn forward_end<S: TextSurface + ?Sized>(&self, it: &mut TextIter<'_, S>) -> bool {
        if let Some(kind) = self.kind.word_kind() {
            // Hitting the end still leaves a usable word end.
            forward_word_end(it, kind);
            return true;
        }
        if let Some((open, close)) = self.kind.delimiters() {
            return forward_block_end(it, close, open);
        }
        if let Some(quote) = self.kind.quote() {
            return forward_quote_end(it, quote);
        }
        match self.kind {
            ObjectKind::Sentence => forward_sentence_close(it),
            _ => forward_paragraph_close(it),
        }
    }

    fn backward_start<S: TextSurface + ?Sized>(&self, it: &mut TextIter<'_, S>) -> bool {
        if let Some(kind) = self.kind.word_kind() {
            backward_word_start(it, kind);
            return true;
        }
        if let Some((open, close)) = self.kind.delimiters() {
            return backward_block_start(it, open, close);
        }
        if let Some(quote) = self.kind.quote() {
            return backward_quote_start(it, quote);
        }
        match self.kind {
            ObjectKind::Sentence => backward_sentence_start(it),
            _ => backward_paragraph_open(it),
        }
    }

    fn extend<S: TextSurface + ?Sized>(&self, origin: &TextIter<'_, S>, r: &mut Range<'_, S>) -> bool {
        match self.kind {
            ObjectKind::Word | ObjectKind::BigWord => {
                extend_word(origin, r);
                true
            }
            ObjectKind::Sentence => {
                extend_sentence(r);
                true
            }
            ObjectKind::Paragraph => extend_paragraph(r, self.inner),
            _ => {
                extend_one(r);
                true
            }
        }
    }
}

impl fmt::Display for TextObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.kind {
            ObjectKind::Word => 'w',
            ObjectKind::BigWord => 'W',
            ObjectKind::Sentence => 's',
            ObjectKind::Paragraph => 'p',
            ObjectKind::Paren => '(',
            ObjectKind::Brace => '{',
            ObjectKind::Bracket => '[',
            ObjectKind::Angle => '<',
            ObjectKind::DoubleQuote => '"',
            ObjectKind::SingleQuote => '\'',
            ObjectKind::Grave => '`',
        };
        write!(f, "{}{key}", if self.inner { 'i' } else { 'a' })
    }
}

// ---------------------------------------------------------------------------
// Extension rules
// ---------------------------------------------------------------------------

struct Range<'a, S: ?Sized> {
    inner_begin: TextIter<'a, S>,
    inner_end: TextIter<'a, S>,
    a_begin: TextIter<'a, S>,
    a_end: TextIter<'a, S>,
}

fn backward_to_first_space<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) {
    while !it.starts_line() {
        it.backward_char();
        if !it.is_space() {
            it.forward_char();
            return;
        }
    }
}

fn forward_to_nonspace<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>) {
    while !it.ends_line() && it.is_space() {
        it.forward_char();
    }
}

/// `aw` takes the blanks after the word; when the origin sat in the
/// blanks before it, those are taken instead.
fn extend_word<S: TextSurface + ?Sized>(origin: &TextIter<'_, S>, r: &mut Range<'_, S>) {
    if !r.inner_end.ends_line() {
        r.inner_end.forward_char();
    }

    r.a_begin = r.inner_begin;
    r.a_end = r.inner_end;

    if origin.offset() < r.inner_begin.offset() {
        backward_to_first_space(&mut r.a_begin);
        r.inner_end = r.inner_begin;
        r.inner_begin = r.a_begin;
    } else {
        forward_to_nonspace(&mut r.a_end);
    }
}

/// Delimited objects: inner drops the delimiters, "a" keeps them.
fn extend_one<S: TextSurface + ?Sized>(r: &mut Range<'_, S>) {
    r.a_begin = r.inner_begin;
    r.inner_begin.forward_char();
    r.a_end = r.inner_end;
    r.a_end.forward_char();
}

fn extend_sentence<S: TextSurface + ?Sized>(r: &mut Range<'_, S>) {
    if line_is_empty(&r.inner_begin) {
        while line_is_empty(&r.a_end) {
            if !r.a_end.forward_line() {
                break;
            }
        }
    } else if !r.inner_end.ends_line() {
        r.inner_end.forward_char();
        r.a_end = r.inner_end;
        while !r.a_end.ends_line() && r.a_end.is_space() {
            r.a_end.forward_char();
        }
    }
}

fn extend_paragraph<S: TextSurface + ?Sized>(r: &mut Range<'_, S>, inner: bool) -> bool {
    let started_on_empty = line_is_empty(&r.inner_begin);

    if line_is_empty(&r.a_begin) {
        let mut prev = r.a_begin;
        while prev.backward_line() || prev.is_start() {
            if !line_is_empty(&prev) {
                prev.forward_to_line_end();
                prev.forward_char();
                r.a_begin = prev;
                break;
            } else if prev.is_start() {
                r.a_begin = prev;
                break;
            }
        }
    }

    let mut next = r.a_end;
    while next.forward_line() || next.is_end() {
        if !line_is_empty(&next) {
            break;
        }
        r.a_end = next;
        if next.is_end() {
            break;
        }
    }

    if started_on_empty {
        r.inner_begin = r.a_begin;
        r.inner_end = r.a_end;

        // From an empty line, `ap` runs on to the end of the next paragraph.
        let mut next = r.a_end;
        next.forward_line();
        while !line_is_empty(&next) && !next.is_end() {
            next.forward_line();
        }
        if next.offset() > r.a_end.offset() {
            next.backward_char();
        }
        r.a_end = next;
    }

    // `ap` over nothing but empty lines finds no paragraph.
    inner || !started_on_empty || r.a_end.offset() != r.inner_end.offset()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use n_text::RopeSurface;
    use pretty_assertions::assert_eq;

    use super::*;

    fn run(object: TextObject, text: &str, position: usize) -> Option<String> {
        let s = RopeSurface::new(text);
        object.select(&s, position).map(|(a, b)| s.slice(a, b))
    }

    fn inner(kind: ObjectKind) -> TextObject {
        TextObject::new(kind, true)
    }

    fn a(kind: ObjectKind) -> TextObject {
        TextObject::new(kind, false)
    }

    fn check(object: TextObject, text: &str, position: usize, expected: Option<&str>) {
        assert_eq!(
            run(object, text, position).as_deref(),
            expected,
            "{object} on {text:?} at {position}"
        );
    }

    #[test]
    fn word() {
        use ObjectKind::Word;
        check(inner(Word), "", 0, Some(""));
        check(inner(Word), "this is some- text to modify\n", 8, Some("some"));
        check(inner(Word), "something  here\n", 10, Some("  "));
        check(inner(Word), "something  here", 9, Some("  "));
        check(inner(Word), "a", 0, Some("a"));
        check(inner(Word), "a b", 1, Some(" "));
        check(inner(Word), "+ -", 1, Some(" "));
        check(inner(Word), "z a", 2, Some("a"));
        check(a(Word), "a b", 1, Some(" b"));
        check(a(Word), "+ -", 1, Some(" -"));
        check(a(Word), "a b", 2, Some("b"));
        check(a(Word), "a b c", 2, Some("b "));
        check(inner(Word), "\n    \n\n", 2, Some("    "));
        check(a(Word), "\n    \n\n", 2, Some("    "));
    }

    #[test]
    fn big_word() {
        use ObjectKind::BigWord;
        check(inner(BigWord), "this is some- text to modify\n", 8, Some("some-"));
        check(inner(BigWord), "something  here\n", 10, Some("  "));
        check(inner(BigWord), "\n    \n\n", 2, Some("    "));
        check(a(BigWord), "\n    \n\n", 2, Some("    "));
    }

    #[test]
    fn blocks() {
        use ObjectKind::{Angle, Bracket, Paren};
        let call = "this_is_a_function (some stuff\n  and some more)\ntrailing";
        check(a(Paren), call, 23, Some("(some stuff\n  and some more)"));
        check(inner(Paren), call, 23, Some("some stuff\n  and some more"));
        check(inner(Paren), "(should not match\n", 5, None);
        for position in 0..3 {
            check(inner(Paren), "(m)", position, Some("m"));
            check(a(Paren), "(m)", position, Some("(m)"));
        }
        check(inner(Paren), "(m)", 3, None);
        check(inner(Paren), "()", 2, None);
        check(inner(Paren), "()", 1, Some(""));
        check(inner(Paren), "()", 0, Some(""));
        check(a(Paren), "() ", 1, Some("()"));
        check(a(Paren), "() ", 0, Some("()"));

        check(a(Angle), "<a></a>", 0, Some("<a>"));
        check(inner(Angle), "<a>", 2, Some("a"));
        check(inner(Angle), "<a></a>", 1, Some("a"));
        check(inner(Angle), "<a></a>", 3, Some("/a"));

        let nested = "[a[b[c]]]";
        let expected = ["a[b[c]]", "a[b[c]]", "b[c]", "b[c]", "c", "c", "c", "b[c]", "a[b[c]]"];
        for (position, want) in expected.iter().enumerate() {
            check(inner(Bracket), nested, position, Some(want));
        }
        check(inner(Bracket), nested, 9, None);
    }

    #[test]
    fn quotes() {
        use ObjectKind::DoubleQuote;
        check(inner(DoubleQuote), "\"this is a string.\"", 0, Some("this is a string."));
        check(a(DoubleQuote), "\"this is a string.\"", 0, Some("\"this is a string.\""));
        check(inner(DoubleQuote), "\"this is a string.\n", 0, None);
        check(inner(DoubleQuote), "\"this \"is a string.\"", 6, Some("this "));
        check(a(DoubleQuote), "\"this \"is a string.\"", 6, Some("\"this \""));
        check(inner(DoubleQuote), "\"this \"is a string.\"", 7, Some("is a string."));
        check(inner(DoubleQuote), "\"\"", 0, Some(""));
        check(inner(DoubleQuote), "\"\"", 1, Some(""));
        check(inner(DoubleQuote), " \"\"", 2, Some(""));
        check(inner(DoubleQuote), "\"a\" \"", 1, Some("a"));
        check(a(DoubleQuote), "\"\"", 1, Some("\"\""));
        check(a(DoubleQuote), "\"a\"b\"", 2, Some("\"a\""));
        check(a(DoubleQuote), "\"a\"b\"", 3, Some("\"b\""));
    }

    #[test]
    fn sentences() {
        use ObjectKind::Sentence;
        let text = "a. b! c?";
        check(inner(Sentence), text, 0, Some("a."));
        check(inner(Sentence), text, 1, Some("a."));
        check(inner(Sentence), text, 2, Some("b!"));
        check(inner(Sentence), text, 4, Some("b!"));
        check(inner(Sentence), "\n a. b! c?", 1, Some("a."));
        check(inner(Sentence), "\n a. b! c?", 2, Some("a."));

        check(a(Sentence), text, 0, Some("a. "));
        check(a(Sentence), " a. b! c?", 0, Some(" a. "));
    }

    #[test]
    fn paragraphs() {
        use ObjectKind::Paragraph;
        check(inner(Paragraph), "testing this.\n\n\n", 0, Some("testing this."));
        check(inner(Paragraph), "testing this.\n", 5, Some("testing this."));
        check(inner(Paragraph), "what\nwill\n we\n\nfind\nhere.", 1, Some("what\nwill\n we"));
        check(inner(Paragraph), "\tword;\n\n\tanother;\n\n\tthird;\n", 9, Some("\tanother;"));

        check(a(Paragraph), "testing this.\n", 5, Some("testing this.\n"));
        check(a(Paragraph), "what\nwill\n we\n\nfind\nhere.", 1, Some("what\nwill\n we\n"));
        check(a(Paragraph), "\tword;\n\n\tanother;\n\n\tthird;\n", 9, Some("\tanother;\n"));
        check(a(Paragraph), "\n", 0, None);

        check(inner(Paragraph).with_count(2), "t\n\nt", 0, Some("t\n"));
        assert!(inner(Paragraph).is_linewise());
        assert!(!inner(ObjectKind::Word).is_linewise());
    }

    #[test]
    fn keys() {
        assert_eq!(TextObject::from_keys('i', 'b'), Some(inner(ObjectKind::Paren)));
        assert_eq!(TextObject::from_keys('a', 'B'), Some(a(ObjectKind::Brace)));
        assert_eq!(TextObject::from_keys('a', '>'), Some(a(ObjectKind::Angle)));
        assert_eq!(TextObject::from_keys('x', 'w'), None);
        assert_eq!(TextObject::from_keys('i', 'z'), None);
        assert_eq!(inner(ObjectKind::DoubleQuote).to_string(), "i\"");
    }
}
