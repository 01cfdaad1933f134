// SPDX-License-Identifier: MIT

//! Viewport scrolling shared by motions (`Ctrl-E`, `Ctrl-D`, `Ctrl-F`, …)
//! and by Normal/Visual `z` commands.
//!
//! All arithmetic runs on the surface [`Viewport`](n_text::Viewport):
//! scroll the top line, then pull the cursor back on screen the way Vim
//! does (first non-blank of the nearest visible line).

use n_text::TextSurface;

use crate::iter::TextIter;

/// Which way to scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Fraction of the viewport kept free above and below a search hit.
pub const SEARCH_MARGIN: f64 = 0.25;

/// `Ctrl-E` / `Ctrl-Y`: move the view by `count` lines (0 reads as 1).
pub fn scroll_line<S: TextSurface + ?Sized>(surface: &mut S, direction: Direction, count: usize) {
    let count = count.max(1);
    let top = surface.viewport().top_line;
    let top = match direction {
        Direction::Down => top + count,
        Direction::Up => top.saturating_sub(count),
    };
    surface.set_top_line(top);
    place_cursor_onscreen(surface);
}

/// `Ctrl-D` / `Ctrl-U`: move the view by half a screen `count` times,
/// keeping the cursor on the same screen row.
pub fn scroll_half_page<S: TextSurface + ?Sized>(surface: &mut S, direction: Direction, count: usize) {
    let cursor = surface.cursor();
    let column = surface.visual_column(cursor);
    let row = surface
        .line_of_offset(cursor)
        .saturating_sub(surface.viewport().top_line);

    for _ in 0..count.max(1) {
        let view = surface.viewport();
        let middle = view.top_line + view.height / 2;
        let top = match direction {
            Direction::Down => middle,
            Direction::Up => middle.saturating_sub(view.height - 1),
        };
        surface.set_top_line(top);
    }

    let line = (surface.viewport().top_line + row).min(surface.line_count().saturating_sub(1));
    let offset = surface.offset_at_visual_column(line, column);
    surface.place_cursor(offset);
    place_cursor_onscreen(surface);
}

/// `Ctrl-F` / `Ctrl-B`: move the view by a whole screen `count` times.
pub fn scroll_page<S: TextSurface + ?Sized>(surface: &mut S, direction: Direction, count: usize) {
    for _ in 0..count.max(1) {
        let view = surface.viewport();
        let top = match direction {
            Direction::Down => view.top_line + view.height,
            Direction::Up => view.top_line.saturating_sub(view.height - 1),
        };
        surface.set_top_line(top);
    }
    place_cursor_onscreen(surface);
}

/// Move a cursor that scrolled out of view to the first non-blank of the
/// nearest visible line.
pub fn place_cursor_onscreen<S: TextSurface + ?Sized>(surface: &mut S) {
    let line_count = surface.line_count();
    let view = surface.viewport();
    let line = surface.line_of_offset(surface.cursor());

    let target = if line < view.top_line {
        view.top_line
    } else if line > view.bottom_line(line_count) {
        view.bottom_line(line_count)
    } else {
        return;
    };

    let mut it = TextIter::new(&*surface, surface.line_start_offset(target));
    it.skip_blanks();
    let offset = it.offset();
    surface.place_cursor(offset);
}

/// `zt` / `zz` / `zb`: put the cursor line at `yalign` of the view.
pub fn z_scroll<S: TextSurface + ?Sized>(surface: &mut S, yalign: f64) {
    let line = surface.line_of_offset(surface.cursor());
    let top = surface.viewport().top_for_alignment(line, yalign);
    surface.set_top_line(top);
}

/// Smallest scroll that shows the cursor.
pub fn scroll_cursor_onscreen<S: TextSurface + ?Sized>(surface: &mut S) {
    let line = surface.line_of_offset(surface.cursor());
    let view = surface.viewport();
    let scrolled = view.scrolled_to_contain(line);
    if scrolled != view {
        surface.set_top_line(scrolled.top_line);
    }
}

/// Scroll so `offset` sits inside the view with `margin` (a fraction of
/// the height) free above and below it.
pub fn scroll_to_offset<S: TextSurface + ?Sized>(surface: &mut S, offset: usize, margin: f64) {
    let line = surface.line_of_offset(offset);
    let view = surface.viewport();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let keep = ((view.height as f64 * margin.clamp(0.0, 0.5)) as usize).min(view.height.saturating_sub(1) / 2);

    let top = if line < view.top_line + keep {
        line.saturating_sub(keep)
    } else if line + keep >= view.top_line + view.height {
        (line + keep + 1).saturating_sub(view.height)
    } else {
        return;
    };
    surface.set_top_line(top);
}

#[cfg(test)]
mod tests {
    use n_text::RopeSurface;

    use super::*;

    fn numbered(lines: usize, height: usize) -> RopeSurface {
        let text: String = (0..lines).map(|i| format!("  l{i}\n")).collect();
        RopeSurface::new(&text).with_height(height)
    }

    #[test]
    fn line_scroll_drags_cursor_along() {
        let mut s = numbered(50, 10);
        scroll_line(&mut s, Direction::Down, 3);
        assert_eq!(s.viewport().top_line, 3);
        assert_eq!(s.line_of_offset(s.cursor()), 3);
        assert_eq!(s.char_at(s.cursor()), 'l');

        scroll_line(&mut s, Direction::Up, 0);
        assert_eq!(s.viewport().top_line, 2);
    }

    #[test]
    fn page_scroll() {
        let mut s = numbered(50, 10);
        scroll_page(&mut s, Direction::Down, 2);
        assert_eq!(s.viewport().top_line, 20);
        scroll_page(&mut s, Direction::Up, 1);
        assert_eq!(s.viewport().top_line, 11);
        assert_eq!(s.line_of_offset(s.cursor()), 20);
    }

    #[test]
    fn half_page_keeps_screen_row() {
        let mut s = numbered(50, 10);
        s.place_cursor(s.line_start_offset(2) + 2);
        scroll_half_page(&mut s, Direction::Down, 1);
        assert_eq!(s.viewport().top_line, 5);
        assert_eq!(s.line_of_offset(s.cursor()), 7);
    }

    #[test]
    fn z_alignment() {
        let mut s = numbered(50, 11);
        s.place_cursor(s.line_start_offset(20));
        z_scroll(&mut s, 0.0);
        assert_eq!(s.viewport().top_line, 20);
        z_scroll(&mut s, 0.5);
        assert_eq!(s.viewport().top_line, 15);
        z_scroll(&mut s, 1.0);
        assert_eq!(s.viewport().top_line, 10);
    }

    #[test]
    fn cursor_onscreen_scrolls_minimally() {
        let mut s = numbered(50, 10);
        s.place_cursor(s.line_start_offset(30));
        scroll_cursor_onscreen(&mut s);
        assert_eq!(s.viewport().top_line, 21);
    }

    #[test]
    fn search_margin() {
        let mut s = numbered(100, 20);
        let target = s.line_start_offset(60);
        scroll_to_offset(&mut s, target, SEARCH_MARGIN);
        assert_eq!(s.viewport().top_line, 46);
    }
}
