#![forbid(unsafe_code)]

//! Error conditions raised by chime collections.
//!
//! Everything else in the workspace is total over its inputs: setters,
//! notifications and runner bookkeeping never fail.

use std::fmt;

/// Errors from indexed or keyed collection access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// An index fell outside the backing sequence.
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length of the sequence at the time of access.
        len: usize,
    },
    /// A keyed lookup found no entry.
    KeyNotFound,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::KeyNotFound => write!(f, "key not found"),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias for chime collection operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build an [`Error::IndexOutOfRange`] for `index` against `len`.
    #[inline]
    #[must_use]
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}
