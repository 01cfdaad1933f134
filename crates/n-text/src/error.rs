// SPDX-License-Identifier: MIT
//
// Errors raised by text surfaces.
//
// The modal engine treats every surface failure as "nothing happened":
// it logs the error and carries on. These types exist so that the
// rope-backed surface and host implementations can say precisely what
// went wrong.

use std::time::Duration;

use thiserror::Error;

/// Failure of a [`TextSurface`](crate::TextSurface) operation.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// A char range that does not fit inside the document.
    #[error("range {start}..{end} is outside the document (length {len})")]
    OutOfRange { start: usize, end: usize, len: usize },

    /// The search pattern did not compile.
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The clipboard owner did not answer in time.
    #[error("clipboard read timed out after {0:?}")]
    ClipboardTimeout(Duration),

    /// The requested clipboard is not available on this surface.
    #[error("clipboard is not available")]
    ClipboardUnavailable,
}

/// Result alias for surface operations.
pub type Result<T> = std::result::Result<T, SurfaceError>;
