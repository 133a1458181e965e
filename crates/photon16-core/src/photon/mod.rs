//! Photon transport helpers.
//!
//! Pieces that sit next to the decoder rather than inside it: the packet
//! checksum used by the transport layer, and the offset-advancing integer
//! codecs that framing code uses on raw packet headers.

mod codec;
mod crc;

pub use codec::{read_i16_at, read_i32_at, serialize_i32_at, write_i16_be, write_i32_be};
pub use crc::{crc, Crc};
