// SPDX-License-Identifier: MIT
//
// n-modal: the Vim modal editing engine of n-vim.
//
//   vim          → Vim, the facade: keys in, mode and preview texts out
//   state        → the state tree and its push/pop/resume lifecycle
//   normal       → Normal mode grammar, `.` and `gv`
//   visual       → charwise/linewise Visual selections and operators
//   insert       → Insert, Replace, literal insert and pending-char states
//   motion       → Motion values and the motion grammar
//   command      → operator and ex command bodies
//   command_bar  → the `:` / `/` / `?` line editor
//   ex           → ex command-line parsing
//   text_object  → iw/aw/ip/i(/i" … selections
//   iter         → char iteration and word/sentence/paragraph boundaries
//   text_history → typed-text capture for Insert replay
//   registers    → unnamed, named, numbered and special registers
//   marks        → a-z and `'<` `'>` marks
//   jumplist     → Ctrl-O / Ctrl-I history
//   scroll       → viewport scrolling
//   context      → state shared by every node of an engine
//   host         → callbacks into the embedding application
//   config       → engine tunables
//   error        → Error / Result

mod command;
mod command_bar;
pub mod config;
pub mod context;
pub mod error;
pub mod ex;
pub mod host;
mod insert;
pub mod iter;
pub mod jumplist;
pub mod marks;
pub mod motion;
mod normal;
pub mod registers;
pub mod scroll;
mod state;
pub mod text_history;
pub mod text_object;
mod vim;
mod visual;

pub use config::{Config, VisualBlock};
pub use context::Context;
pub use error::{Error, Result};
pub use ex::CommandName;
pub use host::{Host, NoHost, Split};
pub use jumplist::Jumplist;
pub use marks::Marks;
pub use motion::Motion;
pub use registers::{RegisterWrite, Registers};
pub use state::KindTag;
pub use text_object::TextObject;
pub use vim::{Mode, Vim};
pub use visual::VisualMode;
