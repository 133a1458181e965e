//! Packet checksum.
//!
//! Reflected CRC-32 (polynomial `0xEDB88320`) with an all-ones initial
//! value, returned without the final XOR. That makes it the bitwise
//! complement of the zlib CRC-32 that `crc32fast` computes.

use crc32fast::Hasher;

/// Computes the checksum of `bytes[..length]`.
///
/// `length` is clamped to the slice.
pub fn crc(bytes: &[u8], length: usize) -> u32 {
    !crc32fast::hash(&bytes[..length.min(bytes.len())])
}

/// Streaming form of [`crc`] for checksums over several slices
#[derive(Debug, Clone, Default)]
pub struct Crc {
    hasher: Hasher,
}

impl Crc {
    /// Starts a new checksum
    pub fn new() -> Self {
        Self {
            hasher: Hasher::new(),
        }
    }

    /// Feeds more bytes
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// The checksum of everything fed so far
    pub fn finish(&self) -> u32 {
        !self.hasher.clone().finalize()
    }
}
