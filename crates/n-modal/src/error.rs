// SPDX-License-Identifier: MIT
//
// Errors of the modal engine's public API.
//
// Keystrokes never fail: a key the grammar does not accept beeps and
// resets, and a broken precondition is logged and corrected. The only
// fallible entry points are configuration and key-notation feeding.

use thiserror::Error;

/// Failure of a modal-engine API call.
#[derive(Debug, Error)]
pub enum Error {
    /// A [`Config`](crate::Config) field holds a value the engine cannot use.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    /// A key script passed to [`Vim::feed`](crate::Vim::feed) is malformed.
    #[error(transparent)]
    Keys(#[from] n_keys::KeyParseError),
}

/// Result alias for the modal engine.
pub type Result<T> = std::result::Result<T, Error>;
