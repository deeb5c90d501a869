//! Error types for engine control operations.
//!
//! Nothing inside the synthesis loop returns an error; these are reported by
//! the control-plane calls (binding, scheduling, generation) before playback.

use core::fmt;

/// Errors reported by engine control operations.
///
/// There is no catch-all failure kind. Every control operation fails for one
/// of the reasons below, so callers can match exhaustively on the cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A channel, slot, index, or value is outside its valid range.
    OutOfRange {
        /// Name of the offending parameter.
        what: &'static str,
        /// The rejected value.
        value: i64,
    },
    /// The operation needs a reference that is not bound (e.g. no log on the channel).
    NotBound {
        /// Channel that has nothing bound.
        channel: usize,
    },
    /// A scheduling buffer has no room for the entry; the entry was dropped.
    BufferFull {
        /// Capacity of the buffer that rejected the entry.
        capacity: usize,
    },
    /// Externally supplied data is inconsistent.
    Malformed(&'static str),
}

impl Error {
    /// Shorthand for an [`Error::OutOfRange`] value.
    pub(crate) fn out_of_range(what: &'static str, value: impl TryInto<i64>) -> Self {
        Self::OutOfRange {
            what,
            value: value.try_into().unwrap_or(i64::MAX),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { what, value } => write!(f, "{what} out of range: {value}"),
            Self::NotBound { channel } => write!(f, "nothing bound to channel {channel}"),
            Self::BufferFull { capacity } => {
                write!(f, "scheduling buffer full (capacity {capacity})")
            }
            Self::Malformed(msg) => write!(f, "malformed input: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

/// Convenience result type for engine operations.
pub type Result<T> = core::result::Result<T, Error>;
