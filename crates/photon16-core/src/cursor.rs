//! Seekable, growable byte stream with an explicit cursor.
//!
//! [`ByteCursor`] is what the decoder reads from. Reads are all-or-nothing:
//! asking for `n` bytes when fewer remain fails with
//! [`Error::OutOfBounds`] and leaves the position untouched. The clamped
//! legacy behaviour is still available through
//! [`ByteCursor::read_best_effort`] for callers that want partial reads.
//!
//! Invariant: `0 <= position <= len <= capacity`.

use crate::error::{Error, Result};
use bytes::Bytes;
use std::io::{self, SeekFrom};

/// A byte buffer with a read/write position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteCursor {
    /// Backing storage; its length is the cursor's capacity
    buffer: Vec<u8>,
    position: usize,
    len: usize,
}

impl ByteCursor {
    /// Creates an empty cursor
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cursor with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            position: 0,
            len: 0,
        }
    }

    /// Creates a cursor holding `size` zero bytes, positioned at the start.
    ///
    /// Writes overwrite the zeroed region before extending it.
    pub fn zeroed(size: usize) -> Self {
        Self {
            buffer: vec![0; size],
            position: 0,
            len: size,
        }
    }

    /// Current position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor to an absolute position in `[0, len]`
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.len {
            return Err(Error::invalid_seek(
                i64::try_from(position).unwrap_or(i64::MAX),
                self.len,
            ));
        }
        self.position = position;
        Ok(())
    }

    /// Logical length of the stream
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the stream holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left between the position and the logical end
    pub fn remaining(&self) -> usize {
        self.len - self.position
    }

    /// Size of the backing allocation
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The logical contents as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Copies the logical contents out of the cursor
    pub fn snapshot(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_slice())
    }

    /// Reads exactly `n` bytes and advances past them
    pub fn read_exact(&mut self, n: usize) -> Result<&[u8]> {
        let start = self.position;
        self.check_available(n)?;
        self.position += n;
        Ok(&self.buffer[start..start + n])
    }

    /// Fills `dst` completely from the stream
    pub fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        let src = self.read_exact(dst.len())?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Reads up to `dst.len()` bytes, returning how many were copied.
    ///
    /// Never fails; returns 0 at the end of the stream. Not used by the
    /// decoder, whose primitive reads must be all-or-nothing.
    pub fn read_best_effort(&mut self, dst: &mut [u8]) -> usize {
        let count = dst.len().min(self.remaining());
        dst[..count].copy_from_slice(&self.buffer[self.position..self.position + count]);
        self.position += count;
        count
    }

    /// Reads a single byte
    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self.peek_byte()?;
        self.position += 1;
        Ok(byte)
    }

    /// Returns the next byte without consuming it
    pub fn peek_byte(&self) -> Result<u8> {
        self.check_available(1)?;
        Ok(self.buffer[self.position])
    }

    /// Writes `data` at the position, growing the stream as needed
    pub fn write(&mut self, data: &[u8]) {
        let end = self.position + data.len();
        self.reserve_to(end);
        self.buffer[self.position..end].copy_from_slice(data);
        self.position = end;
        if end > self.len {
            self.len = end;
        }
    }

    /// Moves the cursor relative to the start, the current position or the end
    pub fn seek(&mut self, target: SeekFrom) -> Result<u64> {
        let length = self.len as i64;
        let absolute = match target {
            SeekFrom::Start(offset) => i64::try_from(offset).unwrap_or(i64::MAX),
            SeekFrom::Current(delta) => (self.position as i64).saturating_add(delta),
            SeekFrom::End(delta) => length.saturating_add(delta),
        };

        if absolute < 0 || absolute > length {
            return Err(Error::invalid_seek(absolute, self.len));
        }

        self.position = absolute as usize;
        Ok(absolute as u64)
    }

    fn check_available(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if needed > available {
            return Err(Error::out_of_bounds(self.position, needed, available));
        }
        Ok(())
    }

    /// Grows the backing storage to at least `required` bytes
    fn reserve_to(&mut self, required: usize) {
        let capacity = self.buffer.len();
        if required <= capacity {
            return;
        }
        let grown = required.max(capacity.saturating_mul(2));
        self.buffer.resize(grown, 0);
    }
}

impl From<Vec<u8>> for ByteCursor {
    fn from(buffer: Vec<u8>) -> Self {
        let len = buffer.len();
        Self {
            buffer,
            position: 0,
            len,
        }
    }
}

impl From<&[u8]> for ByteCursor {
    fn from(data: &[u8]) -> Self {
        Self::from(data.to_vec())
    }
}

impl From<Bytes> for ByteCursor {
    fn from(data: Bytes) -> Self {
        Self::from(Vec::from(data))
    }
}

impl io::Read for ByteCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_best_effort(buf))
    }
}

impl io::Write for ByteCursor {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ByteCursor::write(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
