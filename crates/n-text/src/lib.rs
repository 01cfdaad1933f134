// SPDX-License-Identifier: MIT
//
// n-text: the document side of n-vim.
//
//   surface      → TextSurface, the trait the modal engine edits through
//   rope_surface → RopeSurface, a headless surface over a rope
//   buffer       → Buffer, rope text plus floating marks
//   marks        → MarkId / MarkTable with gravity
//   history      → undo/redo grouped by user action
//   search       → regex search in char offsets, replacement templates
//   options      → EditorOptions and :set parsing
//   viewport     → visible line range arithmetic

pub mod buffer;
pub mod error;
pub mod history;
pub mod marks;
pub mod options;
pub mod rope_surface;
pub mod search;
pub mod surface;
pub mod viewport;

pub use buffer::Buffer;
pub use error::{Result, SurfaceError};
pub use history::History;
pub use marks::{Gravity, MarkId, MarkTable};
pub use options::{EditorOptions, SetDirective};
pub use rope_surface::RopeSurface;
pub use search::{SearchMatch, SearchSettings};
pub use surface::{CaseChange, Clipboard, TextSurface, convert_case};
pub use viewport::Viewport;
