//! Error types for the photon16-core library.
//!
//! Every failure carries the byte offset at which it was detected so a
//! malformed payload can be located in a capture dump.

use crate::protocol::WireType;
use thiserror::Error;

/// Result type alias for photon16 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all decode, cursor and pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A read went past the logical end of the stream
    #[error("out of bounds at offset {offset}: need {needed} bytes, have {available}")]
    OutOfBounds {
        /// Cursor position when the read was attempted
        offset: usize,
        /// Bytes the read required
        needed: usize,
        /// Bytes that were left
        available: usize,
    },

    /// A seek or position change targeted an invalid position
    #[error("invalid seek to {target}: stream length is {length}")]
    InvalidSeek {
        /// Absolute target position (may be negative)
        target: i64,
        /// Logical length of the stream
        length: usize,
    },

    /// Tag byte that does not name any protocol16 type
    #[error("unknown type tag 0x{tag:02x} at offset {offset}")]
    UnknownType {
        /// The offending tag byte
        tag: u8,
        /// Offset of the tag byte
        offset: usize,
    },

    /// A declared length or element count cannot be satisfied
    #[error("malformed length {length} at offset {offset}: {reason}")]
    MalformedLength {
        /// Offset of the length prefix
        offset: usize,
        /// The declared length as read from the wire
        length: i64,
        /// Why it was rejected
        reason: &'static str,
    },

    /// String payload is not valid UTF-8
    #[error("invalid utf-8 in string at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the first string byte
        offset: usize,
    },

    /// Containers nested deeper than the configured limit
    #[error("nesting depth exceeds {max} at offset {offset}")]
    DepthLimitExceeded {
        /// Offset where the next nesting level would start
        offset: usize,
        /// Configured maximum depth
        max: usize,
    },

    /// Scratch pool had no buffer to hand out
    #[error("scratch pool exhausted: all {capacity} buffers in use")]
    PoolExhaustion {
        /// Pool capacity
        capacity: usize,
    },

    /// The payload holds a different record kind than the caller expected
    #[error("expected {expected} at offset {offset}, found {found}")]
    UnexpectedType {
        /// Kind the caller asked for
        expected: WireType,
        /// Kind found on the wire
        found: WireType,
        /// Offset of the tag byte
        offset: usize,
    },
}

impl Error {
    /// Creates a new out-of-bounds error
    pub fn out_of_bounds(offset: usize, needed: usize, available: usize) -> Self {
        Self::OutOfBounds {
            offset,
            needed,
            available,
        }
    }

    /// Creates a new invalid seek error
    pub fn invalid_seek(target: i64, length: usize) -> Self {
        Self::InvalidSeek { target, length }
    }

    /// Creates a new unknown type error
    pub fn unknown_type(tag: u8, offset: usize) -> Self {
        Self::UnknownType { tag, offset }
    }

    /// Creates a new malformed length error
    pub fn malformed_length(offset: usize, length: i64, reason: &'static str) -> Self {
        Self::MalformedLength {
            offset,
            length,
            reason,
        }
    }

    /// Returns the byte offset the error refers to, if it has one
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::OutOfBounds { offset, .. }
            | Self::UnknownType { offset, .. }
            | Self::MalformedLength { offset, .. }
            | Self::InvalidUtf8 { offset }
            | Self::DepthLimitExceeded { offset, .. }
            | Self::UnexpectedType { offset, .. } => Some(*offset),
            Self::InvalidSeek { .. } | Self::PoolExhaustion { .. } => None,
        }
    }

    /// Returns true if the input simply ended too early.
    ///
    /// A transport that reassembles fragments can retry with more bytes.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}
