//! # photon16-core
//!
//! A decoder for protocol16, the type-tagged binary wire format used by the
//! Photon real-time multiplayer networking protocol.
//!
//! Every value on the wire is preceded by a one-byte type tag. Containers
//! (arrays, dictionaries, events and operations) embed further tagged
//! values, so a payload decodes into a self-describing [`Value`] tree.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`cursor`]: the seekable byte stream everything reads from
//! - [`protocol`]: wire type tags and the decoded value model
//! - [`decoder`]: the recursive-descent decoder and its scratch pool
//! - [`photon`]: transport-side helpers (packet checksum, integer codecs)
//! - [`error`]: error types and handling
//!
//! The library performs no I/O; callers hand it complete payload buffers.
//!
//! ## Example
//!
//! ```
//! use photon16_core::{ByteCursor, Decoder, Value};
//!
//! // Array of two bytes: 'y', count 2, element tag 'b', 1, 2
//! let mut cursor = ByteCursor::from(vec![0x79, 0x00, 0x02, 0x62, 0x01, 0x02]);
//! let value = Decoder::new().decode_tagged(&mut cursor)?;
//!
//! assert_eq!(value, Value::Array(vec![Value::Byte(1), Value::Byte(2)]));
//! # Ok::<(), photon16_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! - [`ValueVisitor`]: walk decoded trees without matching every variant

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod cursor;
pub mod decoder;
pub mod error;
pub mod photon;
pub mod protocol;

// Re-export primary types for convenience
pub use cursor::ByteCursor;
pub use decoder::{Decoder, DecoderConfig, ScratchBuffer, ScratchPool};
pub use error::{Error, Result};
pub use photon::{crc, write_i32_be, Crc};
pub use protocol::{
    walk, Dictionary, EventData, NullVisitor, OperationRequest, OperationResponse, ParamTable,
    StatsVisitor, Value, ValueVisitor, WireType,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
