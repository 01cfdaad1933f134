// SPDX-License-Identifier: MIT

//! The visible window onto a document, measured in lines.
//!
//! Surfaces report their viewport as a top line and a height. The modal
//! engine does all of its screen arithmetic (`H`/`M`/`L`, page and
//! half-page scrolling, `zz`/`zt`/`zb`) on this model, so a headless
//! surface and a real widget behave the same.

/// Visible line range of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible line (0-indexed).
    pub top_line: usize,
    /// Number of visible lines, at least 1.
    pub height: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 24)
    }
}

impl Viewport {
    #[must_use]
    pub const fn new(top_line: usize, height: usize) -> Self {
        Self {
            top_line,
            height: if height == 0 { 1 } else { height },
        }
    }

    /// Last visible line, limited by the document's `line_count`.
    #[must_use]
    pub fn bottom_line(&self, line_count: usize) -> usize {
        let last = line_count.saturating_sub(1);
        (self.top_line + self.height - 1).min(last).max(self.top_line.min(last))
    }

    /// Middle visible line (`M`).
    #[must_use]
    pub fn middle_line(&self, line_count: usize) -> usize {
        let top = self.top_line.min(line_count.saturating_sub(1));
        let bottom = self.bottom_line(line_count);
        top + (bottom - top) / 2
    }

    /// True if `line` is on screen.
    #[must_use]
    pub fn contains(&self, line: usize, line_count: usize) -> bool {
        line >= self.top_line && line <= self.bottom_line(line_count)
    }

    /// Clamp the top line so it names an existing line.
    #[must_use]
    pub fn clamped(self, line_count: usize) -> Self {
        Self::new(self.top_line.min(line_count.saturating_sub(1)), self.height)
    }

    /// Top line that places `line` at `yalign` (0.0 top, 0.5 middle,
    /// 1.0 bottom) of the viewport.
    #[must_use]
    pub fn top_for_alignment(&self, line: usize, yalign: f64) -> usize {
        let rows = self.height.saturating_sub(1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let offset = (yalign.clamp(0.0, 1.0) * rows as f64).round() as usize;
        line.saturating_sub(offset)
    }

    /// Smallest scroll that brings `line` on screen.
    #[must_use]
    pub fn scrolled_to_contain(self, line: usize) -> Self {
        if line < self.top_line {
            Self::new(line, self.height)
        } else if line >= self.top_line + self.height {
            Self::new(line + 1 - self.height, self.height)
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_is_limited_by_document() {
        let v = Viewport::new(0, 10);
        assert_eq!(v.bottom_line(100), 9);
        assert_eq!(v.bottom_line(4), 3);
    }

    #[test]
    fn middle_line() {
        let v = Viewport::new(10, 11);
        assert_eq!(v.middle_line(100), 15);
        assert_eq!(Viewport::new(0, 10).middle_line(3), 1);
    }

    #[test]
    fn alignment() {
        let v = Viewport::new(0, 11);
        assert_eq!(v.top_for_alignment(50, 0.0), 50);
        assert_eq!(v.top_for_alignment(50, 0.5), 45);
        assert_eq!(v.top_for_alignment(50, 1.0), 40);
        assert_eq!(v.top_for_alignment(2, 1.0), 0);
    }

    #[test]
    fn minimal_scroll() {
        let v = Viewport::new(10, 5);
        assert_eq!(v.scrolled_to_contain(12), v);
        assert_eq!(v.scrolled_to_contain(3).top_line, 3);
        assert_eq!(v.scrolled_to_contain(20).top_line, 16);
    }

    #[test]
    fn zero_height_becomes_one() {
        assert_eq!(Viewport::new(0, 0).height, 1);
    }
}
