// SPDX-License-Identifier: MIT

//! Motions: where a key sequence moves a position.
//!
//! A [`MotionState`] node collects the keys of one motion (`3w`, `f;`,
//! `'a`, `gg`). When its grammar completes it pops and its parent takes
//! the finished [`Motion`] value: Normal applies it to the cursor,
//! operators apply it to define a range, Visual chains it.
//!
//! | Keys                      | Kind                     | Incl. | Linewise | Jump |
//! |---------------------------|--------------------------|-------|----------|------|
//! | `0` `Home` `\|`           | `LineStart`              | incl  |          |      |
//! | `^` `_`                   | `LineFirstChar`          | incl  |          |      |
//! | `$` `End`                 | `LineEnd`                | incl  |          |      |
//! | space / `BS`              | `ForwardChar` / `BackwardChar` | excl / incl | |   |
//! | `l` `Right` / `h` `Left`  | same-line char steps     | excl / incl |    |      |
//! | `Enter`                   | `NextLineFirstChar`      | excl  | yes      |      |
//! | `j` `Down` / `k` `Up`     | visual-column line steps | excl / incl | yes |     |
//! | `G` / `{n}G` / `gg`       | last line / line n / first line | incl | yes | yes |
//! | `H` `M` `L`               | screen top/middle/bottom | incl  | yes      | yes  |
//! | `w W` / `b B` / `e E` / `ge gE` | word scans         | excl / incl / incl / incl | | |
//! | `f F` / `t T`             | find / till a char       | incl  |          |      |
//! | `(` `)` / `{` `}`         | sentence / paragraph     | incl / excl |    |      |
//! | `*` `#` / `n` `N`         | word search / repeat     | excl, incl / incl | | n N |
//! | `[(` `[{` `])` `]}`       | enclosing block          | incl  |          | yes  |
//! | `%`                       | matching bracket         | excl  |          | yes  |
//! | `` `x `` / `'x`           | mark / mark line         | excl / incl | `'` | yes |
//! | `^F ^B ^D ^U ^E ^Y`       | scroll                   | incl  | yes      |      |

use n_keys::{KeyCode, KeyEvent};
use n_text::{MarkId, TextSurface};
use tracing::debug;

use crate::context::Context;
use crate::host::Host;
use crate::insert::CharPending;
use crate::iter::{self, TextIter, WordKind};
use crate::scroll::{self, Direction};
use crate::state::{Kind, KindTag, StateId};
use crate::vim::Vim;

// ---------------------------------------------------------------------------
// Motion kinds
// ---------------------------------------------------------------------------

/// The step a motion repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    /// Stays put; used where an operator needs "no movement".
    None,
    LineStart,
    LineFirstChar,
    LineEnd,
    /// To the newline `count - 1` lines down.
    LineEndWithNewline,
    /// To the newline `count` lines down (`J`).
    NextLineEndWithNewline,
    ForwardChar,
    /// One char right, allowed onto the newline.
    ForwardCharEolOkay,
    BackwardChar,
    ForwardCharSameLine,
    BackwardCharSameLine,
    PreviousLineEnd,
    NextLineFirstChar,
    NextLineVisualColumn,
    PrevLineVisualColumn,
    LastLineFirstChar,
    LineNumber,
    BufferStartFirstChar,
    ScreenTop,
    ScreenMiddle,
    ScreenBottom,
    ForwardWordStart(WordKind),
    ForwardWordEnd(WordKind),
    BackwardWordStart(WordKind),
    BackwardWordEnd(WordKind),
    FindForward,
    FindBackward,
    TillForward,
    TillBackward,
    ForwardSentenceStart,
    BackwardSentenceStart,
    ForwardParagraphEnd,
    BackwardParagraphStart,
    SearchWordForward,
    SearchWordBackward,
    NextSearch,
    PrevSearch,
    /// `[(` / `[{` with `f_char` holding the bracket.
    BracketBackward,
    /// `])` / `]}` with `f_char` holding the bracket.
    BracketForward,
    MatchingChar,
    Mark,
    MarkLine,
    NextScrollPage,
    PrevScrollPage,
    NextScrollHalfPage,
    PrevScrollHalfPage,
    NextScrollLine,
    PrevScrollLine,
    /// Replays `chain` in order.
    Chain,
}

/// Whether the char under the final position belongs to the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusivity {
    Inclusive,
    Exclusive,
}

/// Whether an operator over the motion acts on whole lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wise {
    Charwise,
    Linewise,
}

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// A complete motion, ready to apply.
#[derive(Debug, Clone)]
pub struct Motion {
    kind: MotionKind,
    inclusivity: Inclusivity,
    wise: Wise,
    count: usize,
    alter_count: isize,
    f_char: Option<char>,
    mark: Option<MarkId>,
    chain: Vec<Motion>,
    apply_on_leave: bool,
    is_jump: bool,
}

impl Default for Motion {
    fn default() -> Self {
        Self::none()
    }
}

/// Per-application inputs of a step.
#[derive(Debug, Clone, Copy)]
struct Step {
    /// 1 on the first application of the step.
    applied: usize,
    count: isize,
    column: usize,
    inclusive: bool,
}

impl Motion {
    const fn with(kind: MotionKind, inclusivity: Inclusivity, wise: Wise) -> Self {
        Self {
            kind,
            inclusivity,
            wise,
            count: 1,
            alter_count: 0,
            f_char: None,
            mark: None,
            chain: Vec::new(),
            apply_on_leave: true,
            is_jump: false,
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self::with(MotionKind::None, Inclusivity::Inclusive, Wise::Charwise)
    }

    #[must_use]
    pub const fn first_char() -> Self {
        Self::with(MotionKind::LineFirstChar, Inclusivity::Inclusive, Wise::Charwise)
    }

    #[must_use]
    pub const fn line_end() -> Self {
        Self::with(MotionKind::LineEnd, Inclusivity::Inclusive, Wise::Charwise)
    }

    #[must_use]
    pub const fn line_start() -> Self {
        Self::with(MotionKind::LineStart, Inclusivity::Inclusive, Wise::Charwise)
    }

    #[must_use]
    pub const fn previous_line_end() -> Self {
        Self::with(MotionKind::PreviousLineEnd, Inclusivity::Exclusive, Wise::Charwise)
    }

    /// One char right, stopping on (not past) the newline.
    #[must_use]
    pub const fn forward_char() -> Self {
        Self::with(MotionKind::ForwardCharEolOkay, Inclusivity::Exclusive, Wise::Charwise)
    }

    #[must_use]
    pub const fn line_end_with_nl() -> Self {
        Self::with(MotionKind::LineEndWithNewline, Inclusivity::Exclusive, Wise::Charwise)
    }

    #[must_use]
    pub const fn next_line_end_with_nl() -> Self {
        Self::with(MotionKind::NextLineEndWithNewline, Inclusivity::Exclusive, Wise::Charwise)
    }

    /// `j` with the count shifted by `alter_count` (`-1` makes `Y` cover
    /// just the current line).
    #[must_use]
    pub const fn down(alter_count: isize) -> Self {
        let mut motion = Self::with(MotionKind::NextLineVisualColumn, Inclusivity::Exclusive, Wise::Linewise);
        motion.alter_count = alter_count;
        motion
    }

    const fn new_chain() -> Self {
        Self::with(MotionKind::Chain, Inclusivity::Inclusive, Wise::Charwise)
    }

    /// Append `other` to `chain`, starting a chain when there is none.
    #[must_use]
    pub fn chained(chain: Option<Self>, other: Self) -> Self {
        let mut chain = match chain {
            Some(chain) if chain.kind == MotionKind::Chain => chain,
            Some(single) => {
                let mut chain = Self::new_chain();
                chain.add(single);
                chain
            }
            None => Self::new_chain(),
        };
        chain.add(other);
        chain
    }

    /// Add a sub-motion, folding it into the last one when they repeat
    /// the same step.
    fn add(&mut self, mut other: Self) {
        if let Some(last) = self.chain.last_mut() {
            if last.kind == other.kind && last.inclusivity == other.inclusivity && last.f_char == other.f_char {
                last.count += other.count;
                return;
            }
        }
        other.mark = None;
        self.chain.push(other);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn kind(&self) -> MotionKind {
        self.kind
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    pub const fn set_count(&mut self, count: usize) {
        self.count = if count == 0 { 1 } else { count };
    }

    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.set_count(count);
        self
    }

    #[must_use]
    pub const fn is_inclusive(&self) -> bool {
        matches!(self.inclusivity, Inclusivity::Inclusive)
    }

    #[must_use]
    pub const fn is_linewise(&self) -> bool {
        matches!(self.wise, Wise::Linewise)
    }

    #[must_use]
    pub const fn is_jump(&self) -> bool {
        self.is_jump
    }

    #[must_use]
    pub const fn f_char(&self) -> Option<char> {
        self.f_char
    }

    #[must_use]
    pub const fn mark(&self) -> Option<MarkId> {
        self.mark
    }

    pub const fn set_mark(&mut self, mark: Option<MarkId>) {
        self.mark = mark;
    }

    #[must_use]
    pub const fn apply_on_leave(&self) -> bool {
        self.apply_on_leave
    }

    pub const fn set_apply_on_leave(&mut self, apply_on_leave: bool) {
        self.apply_on_leave = apply_on_leave;
    }

    /// `j`/`k` keep the remembered column; everything else resets it.
    #[must_use]
    pub const fn invalidates_visual_column(&self) -> bool {
        !matches!(
            self.kind,
            MotionKind::NextLineVisualColumn | MotionKind::PrevLineVisualColumn
        )
    }

    const fn adjusted_count(&self) -> isize {
        #[allow(clippy::cast_possible_wrap)]
        let count = self.count as isize;
        count + self.alter_count
    }

    // -----------------------------------------------------------------------
    // Applying
    // -----------------------------------------------------------------------

    /// Move `pos` by the motion, repeating the step `count` times and
    /// stopping at the first step that cannot move. With `inclusive`, an
    /// inclusive motion that moved forward (or an exclusive one that moved
    /// back) takes one more char so the result is an exclusive range end.
    ///
    /// Returns `false` if a step failed.
    pub fn apply<S: TextSurface + ?Sized>(
        &self,
        surface: &mut S,
        ctx: &mut Context,
        pos: &mut usize,
        column: usize,
        inclusive: bool,
    ) -> bool {
        let begin = *pos;
        let count = self.adjusted_count();
        let mut remaining = count;
        let mut applied = 0;
        let mut ok = true;

        loop {
            applied += 1;
            let step = Step {
                applied,
                count,
                column,
                inclusive,
            };
            if !self.step(surface, ctx, pos, step) {
                ok = false;
                break;
            }
            remaining -= 1;
            if remaining <= 0 {
                break;
            }
        }

        if inclusive {
            let mut it = TextIter::new(&*surface, *pos);
            let end = it.offset();
            let ends_line = it.ends_line();
            let moved_forward = end > begin || (end == begin && self.kind == MotionKind::LineEnd);
            if !ends_line
                && ((self.is_inclusive() && moved_forward) || (!self.is_inclusive() && end < begin))
            {
                it.forward_char();
            }
            *pos = it.offset();
        }

        ok
    }

    /// Apply once from the motion's mark (or the cursor) and store the
    /// result back into the mark (or move the cursor there).
    pub fn repeat<S: TextSurface + ?Sized>(&self, surface: &mut S, ctx: &mut Context, column: usize) {
        let mut pos = self
            .mark
            .and_then(|mark| surface.mark_offset(mark))
            .unwrap_or_else(|| surface.cursor());

        self.apply(surface, ctx, &mut pos, column, false);

        match self.mark {
            Some(mark) => surface.move_mark(mark, pos),
            None => surface.select(pos, pos),
        }
    }

    fn step<S: TextSurface + ?Sized>(&self, surface: &mut S, ctx: &mut Context, pos: &mut usize, step: Step) -> bool {
        use MotionKind as K;

        match self.kind {
            K::NextScrollPage => return scroll_step(surface, pos, step, |s, n| scroll::scroll_page(s, Direction::Down, n)),
            K::PrevScrollPage => return scroll_step(surface, pos, step, |s, n| scroll::scroll_page(s, Direction::Up, n)),
            K::NextScrollHalfPage => {
                return scroll_step(surface, pos, step, |s, n| scroll::scroll_half_page(s, Direction::Down, n));
            }
            K::PrevScrollHalfPage => {
                return scroll_step(surface, pos, step, |s, n| scroll::scroll_half_page(s, Direction::Up, n));
            }
            K::NextScrollLine => return scroll_step(surface, pos, step, |s, n| scroll::scroll_line(s, Direction::Down, n)),
            K::PrevScrollLine => return scroll_step(surface, pos, step, |s, n| scroll::scroll_line(s, Direction::Up, n)),
            K::SearchWordForward => return search_word(surface, ctx, pos, step, false),
            K::SearchWordBackward => return search_word(surface, ctx, pos, step, true),
            K::NextSearch => return search_again(surface, ctx, pos, false),
            K::PrevSearch => return search_again(surface, ctx, pos, true),
            K::Chain => {
                let before = *pos;
                for motion in &self.chain {
                    motion.apply(surface, ctx, pos, step.column, step.inclusive);
                }
                return *pos != before;
            }
            K::Mark | K::MarkLine => {
                let Some(target) = self.f_char.and_then(|name| ctx.marks.get(&*surface, name)) else {
                    return false;
                };
                let mut it = TextIter::new(&*surface, target);
                if self.kind == K::MarkLine {
                    it.set_line_start();
                    it.skip_blanks();
                }
                *pos = it.offset();
                return true;
            }
            _ => {}
        }

        let mut it = TextIter::new(&*surface, *pos);
        let moved = self.text_step(&mut it, step);
        *pos = it.offset();
        moved
    }

    /// Steps that only look at the text.
    fn text_step<S: TextSurface + ?Sized>(&self, it: &mut TextIter<'_, S>, step: Step) -> bool {
        use MotionKind as K;

        let before = it.offset();
        match self.kind {
            K::None => true,
            K::LineStart => {
                if it.starts_line() {
                    return false;
                }
                it.set_line_start();
                true
            }
            K::LineFirstChar => {
                it.set_line_start();
                while !it.ends_line() && it.is_space() {
                    if !it.forward_char() {
                        return false;
                    }
                }
                true
            }
            K::LineEnd => {
                if !it.ends_line() {
                    it.forward_to_line_end();
                }
                if !it.starts_line() {
                    it.backward_char();
                }
                it.offset() != before
            }
            K::LineEndWithNewline => line_end_with_nl(it, step.applied, step.count),
            K::NextLineEndWithNewline => line_end_with_nl(it, step.applied, step.count + 1),
            K::ForwardChar => {
                it.forward_char();
                if it.ends_line() && !it.starts_line() {
                    if it.is_end() {
                        it.backward_char();
                    } else {
                        it.forward_char();
                    }
                }
                it.offset() != before
            }
            K::ForwardCharEolOkay => !it.ends_line() && it.forward_char(),
            K::BackwardChar => {
                if it.backward_char() && it.ends_line() && !it.starts_line() {
                    it.backward_char();
                }
                it.offset() != before
            }
            K::ForwardCharSameLine => {
                if step.applied != 1 {
                    return false;
                }
                for _ in 0..step.count.max(1) {
                    if it.ends_line() || !it.forward_char() {
                        break;
                    }
                }
                if it.ends_line() && !it.starts_line() {
                    it.backward_char();
                }
                true
            }
            K::BackwardCharSameLine => !it.starts_line() && it.backward_char(),
            K::PreviousLineEnd => {
                let line = it.line();
                if line == 0 {
                    it.set_offset(0);
                    return true;
                }
                it.set_line(line - 1);
                if !it.ends_line() {
                    it.forward_to_line_end();
                }
                if !it.starts_line() {
                    it.backward_char();
                }
                true
            }
            K::NextLineFirstChar => {
                let line = it.line();
                if !it.ends_line() {
                    it.forward_to_line_end();
                }
                it.forward_char();
                if it.line() == line {
                    if !it.ends_line() {
                        it.forward_to_line_end();
                    }
                    if !it.starts_line() {
                        it.backward_char();
                    }
                } else {
                    it.skip_blanks();
                }
                it.offset() != before
            }
            K::NextLineVisualColumn | K::PrevLineVisualColumn => {
                if step.applied != 1 || step.count <= 0 {
                    return false;
                }
                let delta = step.count.unsigned_abs();
                let line = if self.kind == K::NextLineVisualColumn {
                    it.line() + delta
                } else {
                    it.line().saturating_sub(delta)
                };
                let surface = it.surface();
                let line = line.min(surface.line_count().saturating_sub(1));
                it.set_offset(surface.offset_at_visual_column(line, step.column));
                if !it.starts_line() && it.ends_line() {
                    it.backward_char();
                }
                true
            }
            K::LastLineFirstChar => {
                it.set_offset(it.surface().len_chars());
                it.set_line_start();
                while !it.is_end() && it.is_space() {
                    it.forward_char();
                }
                true
            }
            K::LineNumber => {
                if step.applied != 1 {
                    return false;
                }
                it.set_line(step.count.unsigned_abs().saturating_sub(1));
                it.skip_blanks();
                true
            }
            K::BufferStartFirstChar => {
                it.set_offset(0);
                it.skip_blanks();
                it.offset() != before
            }
            K::ScreenTop | K::ScreenMiddle | K::ScreenBottom => {
                let surface = it.surface();
                let lines = surface.line_count();
                let view = surface.viewport().clamped(lines);
                let line = match self.kind {
                    K::ScreenTop => view.top_line,
                    K::ScreenMiddle => view.middle_line(lines),
                    _ => view.bottom_line(lines),
                };
                it.set_line(line);
                it.skip_blanks();
                true
            }
            K::ForwardWordStart(kind) => iter::forward_word_start(it, kind),
            K::ForwardWordEnd(kind) => iter::forward_word_end(it, kind),
            K::BackwardWordStart(kind) => iter::backward_word_start(it, kind),
            K::BackwardWordEnd(kind) => iter::backward_word_end(it, kind),
            K::FindForward | K::TillForward => {
                let Some(target) = self.f_char else {
                    return false;
                };
                let mut scan = *it;
                if self.kind == K::TillForward {
                    scan.forward_char();
                }
                while !scan.ends_line() {
                    if !scan.forward_char() {
                        break;
                    }
                    if scan.char() == target {
                        if self.kind == K::TillForward {
                            scan.backward_char();
                        }
                        *it = scan;
                        return it.offset() != before;
                    }
                }
                false
            }
            K::FindBackward | K::TillBackward => {
                let Some(target) = self.f_char else {
                    return false;
                };
                let mut scan = *it;
                if self.kind == K::TillBackward {
                    scan.backward_char();
                }
                while !scan.starts_line() {
                    if !scan.backward_char() {
                        break;
                    }
                    if scan.char() == target {
                        if self.kind == K::TillBackward {
                            scan.forward_char();
                        }
                        *it = scan;
                        return it.offset() != before;
                    }
                }
                false
            }
            K::ForwardSentenceStart => iter::forward_sentence_start(it),
            K::BackwardSentenceStart => iter::backward_sentence_start(it),
            K::ForwardParagraphEnd => iter::forward_paragraph_end(it),
            K::BackwardParagraphStart => iter::backward_paragraph_start(it),
            K::BracketBackward => {
                let mut scan = *it;
                scan.backward_char();
                let found = match self.f_char {
                    Some('(') => iter::backward_block_start(&mut scan, '(', ')'),
                    Some('{') => iter::backward_block_start(&mut scan, '{', '}'),
                    _ => false,
                };
                if found {
                    *it = scan;
                }
                found
            }
            K::BracketForward => {
                let mut scan = *it;
                let found = match self.f_char {
                    Some(')') => iter::forward_block_end(&mut scan, ')', '('),
                    Some('}') => iter::forward_block_end(&mut scan, '}', '{'),
                    _ => false,
                };
                if found {
                    *it = scan;
                }
                found
            }
            K::MatchingChar => {
                let mut scan = *it;
                let found = match it.char() {
                    '(' => iter::forward_block_end(&mut scan, ')', '('),
                    ')' => iter::backward_block_start(&mut scan, '(', ')'),
                    '[' => iter::forward_block_end(&mut scan, ']', '['),
                    ']' => iter::backward_block_start(&mut scan, '[', ']'),
                    '{' => iter::forward_block_end(&mut scan, '}', '{'),
                    '}' => iter::backward_block_start(&mut scan, '{', '}'),
                    _ => false,
                };
                if found {
                    *it = scan;
                }
                found
            }
            // Handled in `step`.
            K::NextScrollPage
            | K::PrevScrollPage
            | K::NextScrollHalfPage
            | K::PrevScrollHalfPage
            | K::NextScrollLine
            | K::PrevScrollLine
            | K::SearchWordForward
            | K::SearchWordBackward
            | K::NextSearch
            | K::PrevSearch
            | K::Mark
            | K::MarkLine
            | K::Chain => false,
        }
    }
}

/// To the newline `count - 1` lines below, in one application.
fn line_end_with_nl<S: TextSurface + ?Sized>(it: &mut TextIter<'_, S>, applied: usize, count: isize) -> bool {
    if applied != 1 {
        return false;
    }
    if count <= 1 {
        if it.ends_line() {
            return true;
        }
        return it.forward_to_line_end();
    }
    it.set_line(it.line() + count.unsigned_abs() - 1);
    if !it.ends_line() {
        it.forward_to_line_end();
    }
    true
}

/// Scroll the view, then continue from wherever the cursor ended up.
fn scroll_step<S: TextSurface + ?Sized>(
    surface: &mut S,
    pos: &mut usize,
    step: Step,
    scroll: impl FnOnce(&mut S, usize),
) -> bool {
    if step.applied != 1 {
        return false;
    }
    scroll(surface, step.count.unsigned_abs());
    *pos = surface.cursor();
    true
}

/// The word under or after `offset` and where it starts, as `*` sees it.
fn word_under_cursor<S: TextSurface + ?Sized>(surface: &S, offset: usize) -> Option<(usize, String)> {
    let mut end = TextIter::new(surface, offset);
    if !iter::ends_word(&end, WordKind::Word) && !iter::forward_word_end(&mut end, WordKind::Word) {
        return None;
    }
    let mut begin = end;
    if !iter::starts_word(&begin, WordKind::Word) {
        iter::backward_word_start(&mut begin, WordKind::Word);
    }
    end.forward_char();

    let word = surface.slice(begin.offset(), end.offset());
    let word = word.trim();
    (!word.is_empty()).then(|| (begin.offset(), word.to_owned()))
}

/// `*` / `#`: search for the word under the cursor at word boundaries.
fn search_word<S: TextSurface + ?Sized>(
    surface: &mut S,
    ctx: &mut Context,
    pos: &mut usize,
    step: Step,
    reverse: bool,
) -> bool {
    if step.applied != 1 {
        return false;
    }
    ctx.reverse_search = reverse;

    let Some((begin, word)) = word_under_cursor(&*surface, *pos) else {
        return false;
    };
    ctx.search.pattern = word;
    ctx.search.regex = false;
    ctx.search.at_word_boundaries = true;

    let len = surface.len_chars();
    let mut at = if reverse { begin } else { (*pos + 1).min(len) };
    let mut found = false;

    for _ in 0..step.count.max(1) {
        let result = if reverse {
            surface.find_backward(&ctx.search, at)
        } else {
            surface.find_forward(&ctx.search, at)
        };
        match result {
            Ok(Some(hit)) => {
                *pos = hit.start;
                at = if reverse { hit.start } else { (hit.start + 1).min(len) };
                found = true;
            }
            Ok(None) => break,
            Err(err) => {
                debug!(%err, "word search failed");
                break;
            }
        }
    }

    surface.set_search_highlight(found);
    found
}

/// `n` / `N`: the next match after, or the last match before, `pos`.
fn search_again<S: TextSurface + ?Sized>(surface: &mut S, ctx: &Context, pos: &mut usize, backward: bool) -> bool {
    let result = if backward {
        surface.find_backward(&ctx.search, *pos)
    } else {
        surface.find_forward(&ctx.search, (*pos + 1).min(surface.len_chars()))
    };

    let found = match result {
        Ok(Some(hit)) => {
            *pos = hit.start;
            true
        }
        Ok(None) => false,
        Err(err) => {
            debug!(%err, "search failed");
            false
        }
    };
    surface.set_search_highlight(found);
    found
}

// ---------------------------------------------------------------------------
// MotionState: the grammar node
// ---------------------------------------------------------------------------

/// Keys still expected after a prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Pending {
    #[default]
    None,
    /// After `g`.
    G,
    /// After `[` (`true`) or `]`.
    Bracket(bool),
    /// After `` ` `` (`false`) or `'` (`true`).
    Mark(bool),
}

/// A motion being typed.
#[derive(Debug)]
pub(crate) struct MotionState {
    motion: Motion,
    complete: bool,
    failed: bool,
    pending: Pending,
    /// The operator key that, typed again, means "this line" (`dd`, `yy`).
    linewise_keyval: Option<char>,
    command_text: String,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            motion: Motion::none(),
            complete: false,
            failed: false,
            pending: Pending::None,
            linewise_keyval: None,
            command_text: String::new(),
        }
    }
}

impl MotionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Motion that is only recorded, not applied, when it completes.
    pub(crate) fn deferred() -> Self {
        let mut state = Self::new();
        state.motion.apply_on_leave = false;
        state
    }

    pub(crate) fn with_linewise_keyval(mut self, key: Option<char>) -> Self {
        self.linewise_keyval = key;
        self
    }

    pub(crate) fn with_mark(mut self, mark: Option<MarkId>) -> Self {
        self.motion.mark = mark;
        self
    }

    pub(crate) fn command_text(&self) -> &str {
        &self.command_text
    }

    /// The finished motion carrying `count`, if the grammar completed.
    pub(crate) fn finished(&self, count: usize) -> Option<Motion> {
        (self.complete && !self.failed).then(|| self.motion.clone().with_count(count))
    }
}

impl<S: TextSurface, H: Host> Vim<S, H> {
    /// The motion a popped [`MotionState`] produced.
    pub(crate) fn finished_motion(&self, id: StateId) -> Option<Motion> {
        self.tree.motion(id)?.finished(self.tree.count(id))
    }

    fn motion_complete(&mut self, id: StateId, kind: MotionKind, inclusivity: Inclusivity, wise: Wise) -> bool {
        if let Some(state) = self.tree.motion_mut(id) {
            state.motion.kind = kind;
            state.motion.inclusivity = inclusivity;
            state.motion.wise = wise;
            state.complete = true;
            state.command_text.clear();
        }
        self.pop(id);
        true
    }

    fn motion_jump(&mut self, id: StateId, kind: MotionKind, inclusivity: Inclusivity, wise: Wise) -> bool {
        if let Some(state) = self.tree.motion_mut(id) {
            state.motion.is_jump = true;
        }
        self.motion_complete(id, kind, inclusivity, wise)
    }

    fn motion_bail(&mut self, id: StateId) -> bool {
        debug!("motion grammar bailed");
        if let Some(state) = self.tree.motion_mut(id) {
            state.command_text.clear();
            state.failed = true;
        }
        self.pop(id);
        true
    }

    fn motion_char_pending(&mut self, id: StateId, kind: MotionKind) -> bool {
        if let Some(state) = self.tree.motion_mut(id) {
            state.motion.kind = kind;
            state.motion.inclusivity = Inclusivity::Inclusive;
            state.motion.wise = Wise::Charwise;
        }
        let pending = self.create(Kind::CharPending(CharPending::default()));
        self.push(id, pending);
        true
    }

    pub(crate) fn motion_keypress(&mut self, id: StateId, key: &KeyEvent, string: &str) -> bool {
        use Inclusivity::{Exclusive, Inclusive};
        use MotionKind as K;
        use Wise::{Charwise, Linewise};

        let Some(state) = self.tree.motion_mut(id) else {
            return false;
        };
        state.command_text.push_str(string);
        let pending = std::mem::take(&mut state.pending);
        let linewise_keyval = state.linewise_keyval;

        let plain = (!key.has_command_modifier()).then(|| key.as_char()).flatten();

        match pending {
            Pending::G => {
                return match plain {
                    Some('g') if self.tree.count_set(id) => self.motion_jump(id, K::LineNumber, Inclusive, Linewise),
                    Some('g') => self.motion_jump(id, K::BufferStartFirstChar, Inclusive, Linewise),
                    Some('e') => self.motion_complete(id, K::BackwardWordEnd(WordKind::Word), Inclusive, Charwise),
                    Some('E') => self.motion_complete(id, K::BackwardWordEnd(WordKind::BigWord), Inclusive, Charwise),
                    _ => self.motion_bail(id),
                };
            }
            Pending::Bracket(left) => {
                return match plain {
                    Some(ch @ ('(' | ')' | '{' | '}')) => {
                        if let Some(state) = self.tree.motion_mut(id) {
                            state.motion.f_char = Some(ch);
                        }
                        let kind = if left { K::BracketBackward } else { K::BracketForward };
                        self.motion_jump(id, kind, Inclusive, Charwise)
                    }
                    _ => self.motion_bail(id),
                };
            }
            Pending::Mark(linewise) => {
                let Some(name) = plain else {
                    return self.motion_bail(id);
                };
                if self.ctx.marks.get(&self.surface, name).is_none() {
                    return self.motion_bail(id);
                }
                if let Some(state) = self.tree.motion_mut(id) {
                    state.motion.f_char = Some(name);
                }
                return if linewise {
                    self.motion_jump(id, K::MarkLine, Inclusive, Linewise)
                } else {
                    self.motion_jump(id, K::Mark, Exclusive, Charwise)
                };
            }
            Pending::None => {}
        }

        if let Some(digit) = plain.and_then(|ch| ch.to_digit(10)) {
            let count_set = self.tree.count_set(id);
            if count_set || digit != 0 {
                let count = if count_set { self.tree.count(id) * 10 } else { 0 } + digit as usize;
                self.tree.set_count(id, count);
                return true;
            }
        }

        if key.is_ctrl() {
            let kind = match key.as_char() {
                Some('f') => Some(K::NextScrollPage),
                Some('b') => Some(K::PrevScrollPage),
                Some('e') => Some(K::NextScrollLine),
                Some('y') => Some(K::PrevScrollLine),
                Some('u') => Some(K::PrevScrollHalfPage),
                Some('d') => Some(K::NextScrollHalfPage),
                _ => None,
            };
            return match kind {
                Some(kind) => self.motion_complete(id, kind, Inclusive, Linewise),
                None => self.motion_bail(id),
            };
        }

        if plain.is_some() && plain == linewise_keyval {
            if let Some(state) = self.tree.motion_mut(id) {
                state.motion.alter_count = -1;
            }
            return self.motion_complete(id, K::NextLineVisualColumn, Exclusive, Linewise);
        }

        match (key.code, plain) {
            (KeyCode::Home, _) | (_, Some('0' | '|')) => self.motion_complete(id, K::LineStart, Inclusive, Charwise),
            (_, Some('^' | '_')) => self.motion_complete(id, K::LineFirstChar, Inclusive, Charwise),
            (_, Some(' ')) => self.motion_complete(id, K::ForwardChar, Exclusive, Charwise),
            (KeyCode::Backspace, _) => self.motion_complete(id, K::BackwardChar, Inclusive, Charwise),
            (KeyCode::Left, _) | (_, Some('h')) => self.motion_complete(id, K::BackwardCharSameLine, Inclusive, Charwise),
            (KeyCode::Right, _) | (_, Some('l')) => self.motion_complete(id, K::ForwardCharSameLine, Exclusive, Charwise),
            (KeyCode::Enter, _) => self.motion_complete(id, K::NextLineFirstChar, Exclusive, Linewise),
            (KeyCode::End, _) | (_, Some('$')) => self.motion_complete(id, K::LineEnd, Inclusive, Charwise),
            (KeyCode::Down, _) | (_, Some('j')) => self.motion_complete(id, K::NextLineVisualColumn, Exclusive, Linewise),
            (KeyCode::Up, _) | (_, Some('k')) => self.motion_complete(id, K::PrevLineVisualColumn, Inclusive, Linewise),
            (_, Some('G')) if self.tree.count_set(id) => self.motion_jump(id, K::LineNumber, Inclusive, Linewise),
            (_, Some('G')) => self.motion_jump(id, K::LastLineFirstChar, Inclusive, Linewise),
            (_, Some('H')) => self.motion_jump(id, K::ScreenTop, Inclusive, Linewise),
            (_, Some('M')) => self.motion_jump(id, K::ScreenMiddle, Inclusive, Linewise),
            (_, Some('L')) => self.motion_jump(id, K::ScreenBottom, Inclusive, Linewise),
            (_, Some('w')) => self.motion_complete(id, K::ForwardWordStart(WordKind::Word), Exclusive, Charwise),
            (_, Some('W')) => self.motion_complete(id, K::ForwardWordStart(WordKind::BigWord), Exclusive, Charwise),
            (_, Some('b')) => self.motion_complete(id, K::BackwardWordStart(WordKind::Word), Inclusive, Charwise),
            (_, Some('B')) => self.motion_complete(id, K::BackwardWordStart(WordKind::BigWord), Inclusive, Charwise),
            (_, Some('e')) => self.motion_complete(id, K::ForwardWordEnd(WordKind::Word), Inclusive, Charwise),
            (_, Some('E')) => self.motion_complete(id, K::ForwardWordEnd(WordKind::BigWord), Inclusive, Charwise),
            (_, Some('f')) => self.motion_char_pending(id, K::FindForward),
            (_, Some('F')) => self.motion_char_pending(id, K::FindBackward),
            (_, Some('t')) => self.motion_char_pending(id, K::TillForward),
            (_, Some('T')) => self.motion_char_pending(id, K::TillBackward),
            (_, Some('(')) => self.motion_complete(id, K::BackwardSentenceStart, Inclusive, Charwise),
            (_, Some(')')) => self.motion_complete(id, K::ForwardSentenceStart, Exclusive, Charwise),
            (_, Some('{')) => self.motion_complete(id, K::BackwardParagraphStart, Inclusive, Charwise),
            (_, Some('}')) => self.motion_complete(id, K::ForwardParagraphEnd, Exclusive, Charwise),
            (_, Some('*')) => self.motion_complete(id, K::SearchWordForward, Exclusive, Charwise),
            (_, Some('#')) => self.motion_complete(id, K::SearchWordBackward, Inclusive, Charwise),
            (_, Some(ch @ ('n' | 'N'))) => {
                let backward = self.ctx.reverse_search == (ch == 'n');
                let kind = if backward { K::PrevSearch } else { K::NextSearch };
                self.motion_jump(id, kind, Inclusive, Charwise)
            }
            (_, Some(ch @ ('[' | ']'))) => {
                self.set_motion_pending(id, Pending::Bracket(ch == '['));
                true
            }
            (_, Some('g')) => {
                self.set_motion_pending(id, Pending::G);
                true
            }
            (_, Some('%')) => self.motion_jump(id, K::MatchingChar, Exclusive, Charwise),
            (_, Some(ch @ ('`' | '\''))) => {
                self.set_motion_pending(id, Pending::Mark(ch == '\''));
                true
            }
            _ => self.motion_bail(id),
        }
    }

    fn set_motion_pending(&mut self, id: StateId, pending: Pending) {
        if let Some(state) = self.tree.motion_mut(id) {
            state.pending = pending;
        }
    }

    /// A CharPending child delivered the `f`/`t` target.
    pub(crate) fn motion_resume(&mut self, id: StateId, from: StateId) {
        if self.tag_of(from) != KindTag::CharPending {
            self.unparent(from);
            return;
        }

        let pending = self.tree.char_pending(from).cloned().unwrap_or_default();
        self.unparent(from);

        let Some(ch) = pending.character() else {
            self.motion_bail(id);
            return;
        };
        if let Some(state) = self.tree.motion_mut(id) {
            state.motion.f_char = Some(ch);
            state.command_text.push_str(pending.string());
            state.complete = true;
        }
        self.pop(id);
    }

    pub(crate) fn motion_leave(&mut self, id: StateId) {
        let Some(motion) = self.finished_motion(id) else {
            return;
        };
        if !motion.apply_on_leave() {
            return;
        }
        if motion.is_jump() {
            self.push_jump(self.surface.cursor());
        }
        let column = self.visual_column(id);
        motion.repeat(&mut self.surface, &mut self.ctx, column);
    }

    pub(crate) fn motion_repeat(&mut self, id: StateId) {
        if let Some(motion) = self.finished_motion(id) {
            let column = self.visual_column(id);
            motion.repeat(&mut self.surface, &mut self.ctx, column);
        }
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

    fn run(motion: &Motion, text: &str, from: usize, inclusive: bool) -> (usize, bool) {
        let mut s = RopeSurface::new(text);
        let mut ctx = Context::default();
        let mut pos = from;
        let column = s.visual_column(from);
        let ok = motion.apply(&mut s, &mut ctx, &mut pos, column, inclusive);
        (pos, ok)
    }

    fn kind(kind: MotionKind, inclusivity: Inclusivity) -> Motion {
        Motion::with(kind, inclusivity, Wise::Charwise)
    }

    #[test]
    fn word_start_counts_fold() {
        let w = kind(MotionKind::ForwardWordStart(WordKind::Word), Inclusivity::Exclusive);
        assert_eq!(run(&w, "one two three\n", 0, false), (4, true));
        assert_eq!(run(&w.clone().with_count(2), "one two three\n", 0, false), (8, true));
    }

    #[test]
    fn inclusive_motion_takes_one_more_char() {
        let e = kind(MotionKind::ForwardWordEnd(WordKind::Word), Inclusivity::Inclusive);
        assert_eq!(run(&e, "one two\n", 0, false).0, 2);
        assert_eq!(run(&e, "one two\n", 0, true).0, 3);
    }

    #[test]
    fn line_end_covers_last_char_when_inclusive() {
        assert_eq!(run(&Motion::line_end(), "abc\n", 0, false).0, 2);
        assert_eq!(run(&Motion::line_end(), "abc\n", 0, true).0, 3);
        assert_eq!(run(&Motion::line_end(), "abc\n", 2, true).0, 3);
    }

    #[test]
    fn same_line_steps_stop_at_line_edges() {
        let l = kind(MotionKind::ForwardCharSameLine, Inclusivity::Exclusive).with_count(10);
        assert_eq!(run(&l, "abc\ndef\n", 0, false), (2, false));
        let h = kind(MotionKind::BackwardCharSameLine, Inclusivity::Inclusive).with_count(3);
        assert_eq!(run(&h, "abc\ndef\n", 5, false), (4, false));
    }

    #[test]
    fn down_keeps_column_and_backs_off_newline() {
        let j = Motion::down(0);
        assert_eq!(run(&j, "abcd\nxy\n", 3, false).0, 6);
        assert_eq!(run(&j.clone().with_count(2), "ab\ncd\nef\n", 1, false).0, 7);
    }

    #[test]
    fn down_with_altered_count_zero_stays() {
        assert_eq!(run(&Motion::down(-1), "ab\ncd\n", 1, true), (1, false));
    }

    #[test]
    fn find_and_till() {
        let mut f = kind(MotionKind::FindForward, Inclusivity::Inclusive);
        f.f_char = Some(',');
        assert_eq!(run(&f, "a, b, c\n", 0, false).0, 1);
        assert_eq!(run(&f.clone().with_count(2), "a, b, c\n", 0, false).0, 4);

        let mut t = kind(MotionKind::TillForward, Inclusivity::Inclusive);
        t.f_char = Some(',');
        assert_eq!(run(&t, "ab, c\n", 0, false).0, 1);

        let mut big_t = kind(MotionKind::TillBackward, Inclusivity::Inclusive);
        big_t.f_char = Some('a');
        assert_eq!(run(&big_t, "xab, c\n", 5, false).0, 2);
    }

    #[test]
    fn find_fails_without_target_on_line() {
        let mut f = kind(MotionKind::FindForward, Inclusivity::Inclusive);
        f.f_char = Some('z');
        assert_eq!(run(&f, "abc\nz\n", 0, false), (0, false));
    }

    #[test]
    fn line_end_with_newline_spans_count_lines() {
        assert_eq!(run(&Motion::line_end_with_nl(), "ab\ncd\nef\n", 0, false).0, 2);
        assert_eq!(run(&Motion::line_end_with_nl().with_count(2), "ab\ncd\nef\n", 0, false).0, 5);
        assert_eq!(run(&Motion::next_line_end_with_nl(), "ab\ncd\nef\n", 0, false).0, 5);
    }

    #[test]
    fn gg_and_g() {
        let gg = kind(MotionKind::BufferStartFirstChar, Inclusivity::Inclusive);
        assert_eq!(run(&gg, "  a\nb\n", 5, false).0, 2);
        let big_g = kind(MotionKind::LastLineFirstChar, Inclusivity::Inclusive);
        assert_eq!(run(&big_g, "a\n  b", 0, false).0, 4);
        let line = kind(MotionKind::LineNumber, Inclusivity::Inclusive).with_count(2);
        assert_eq!(run(&line, "a\n  b\nc\n", 0, false).0, 4);
    }

    #[test]
    fn matching_bracket() {
        let percent = kind(MotionKind::MatchingChar, Inclusivity::Exclusive);
        assert_eq!(run(&percent, "(a (b) c)\n", 0, false).0, 8);
        assert_eq!(run(&percent, "(a (b) c)\n", 8, false).0, 0);
        assert_eq!(run(&percent, "abc\n", 0, false), (0, false));
    }

    #[test]
    fn chain_coalesces_repeated_steps() {
        let j = Motion::down(0);
        let chain = Motion::chained(Some(j.clone()), j);
        assert_eq!(chain.chain.len(), 1);
        assert_eq!(chain.chain[0].count(), 2);

        let l = kind(MotionKind::ForwardCharSameLine, Inclusivity::Exclusive);
        let chain = Motion::chained(Some(chain), l);
        assert_eq!(chain.chain.len(), 2);
        assert_eq!(run(&chain, "abc\nabc\nabc\n", 0, false).0, 9);
    }

    #[test]
    fn word_search_sets_context() {
        let mut s = RopeSurface::new("foo bar foo\n");
        let mut ctx = Context::default();
        let mut pos = 0;
        let star = kind(MotionKind::SearchWordForward, Inclusivity::Exclusive);
        assert!(star.apply(&mut s, &mut ctx, &mut pos, 0, false));
        assert_eq!(pos, 8);
        assert_eq!(ctx.search.pattern, "foo");
        assert!(ctx.search.at_word_boundaries);
        assert!(!ctx.reverse_search);
        assert!(s.search_highlight());

        let n = kind(MotionKind::NextSearch, Inclusivity::Inclusive);
        assert!(n.apply(&mut s, &mut ctx, &mut pos, 0, false));
        assert_eq!(pos, 0);
    }

    #[test]
    fn only_vertical_steps_keep_the_column() {
        assert!(!Motion::down(0).invalidates_visual_column());
        assert!(Motion::line_end().invalidates_visual_column());
    }
}
