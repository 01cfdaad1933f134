// SPDX-License-Identifier: MIT
//
// n-keys: key events and Vim key notation.
//
//   key      → KeyEvent, KeyCode, Modifiers and their string renderings
//   notation → parse_keys("d2w<Esc>") for tests, scripts and the driver

pub mod key;
pub mod notation;

pub use key::{KeyCode, KeyEvent, ModifierKey, Modifiers};
pub use notation::{KeyParseError, parse_keys, parse_special};
