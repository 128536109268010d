//! System-wide error types for the Virta runtime.

use core::fmt;

/// Rejected port configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigError {
    /// The requested baud rate cannot be represented in the divisor
    /// register.
    BaudOutOfRange {
        /// The rate that was asked for.
        baud: u32,
    },
    /// Contradictory enable flags, such as a receive interrupt on a
    /// disabled receiver.
    InvalidFlags,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BaudOutOfRange { baud } => {
                write!(f, "baud rate {baud} out of divisor range")
            }
            ConfigError::InvalidFlags => write!(f, "contradictory port enable flags"),
        }
    }
}
