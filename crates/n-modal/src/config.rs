// SPDX-License-Identifier: MIT

//! Engine configuration.
//!
//! | Field               | Default   | Meaning                                   |
//! |---------------------|-----------|-------------------------------------------|
//! | `register_capacity` | 64 KiB    | Larger register values are dropped        |
//! | `command_history`   | 25        | Lines kept by the command bar             |
//! | `max_jumps`         | 100       | Jumplist entries (back + forward)         |
//! | `clipboard_timeout` | 500 ms    | Wait for `"+` / `"*` reads                |
//! | `visual_block`      | charwise  | How Ctrl-V selections are derived         |

use std::time::Duration;

use crate::error::{Error, Result};

/// How a Visual Block (Ctrl-V) selection is derived from its two ends.
///
/// Rectangular selections need multi-cursor support from the surface,
/// which the [`TextSurface`](n_text::TextSurface) boundary does not
/// offer, so block mode selects like charwise Visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisualBlock {
    #[default]
    Charwise,
}

/// Tunables for one engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Largest register value in bytes; anything longer unsets the register.
    pub register_capacity: usize,
    /// Command-bar history length.
    pub command_history: usize,
    /// Jumplist length across both directions.
    pub max_jumps: usize,
    /// Maximum wait for a clipboard register read.
    pub clipboard_timeout: Duration,
    pub visual_block: VisualBlock,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            register_capacity: 64 * 1024,
            command_history: 25,
            max_jumps: 100,
            clipboard_timeout: Duration::from_millis(500),
            visual_block: VisualBlock::Charwise,
        }
    }
}

impl Config {
    /// Check that every field is usable.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] naming the first bad field.
    pub const fn validate(&self) -> Result<()> {
        if self.register_capacity == 0 {
            return Err(Error::InvalidConfig {
                field: "register_capacity",
                reason: "must be greater than zero",
            });
        }
        if self.command_history == 0 {
            return Err(Error::InvalidConfig {
                field: "command_history",
                reason: "must keep at least one line",
            });
        }
        if self.max_jumps == 0 {
            return Err(Error::InvalidConfig {
                field: "max_jumps",
                reason: "must keep at least one jump",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.register_capacity, 65536);
        assert_eq!(config.command_history, 25);
        assert_eq!(config.max_jumps, 100);
        assert_eq!(config.clipboard_timeout, Duration::from_millis(500));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let config = Config {
            max_jumps: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_jumps"));

        let config = Config {
            register_capacity: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
