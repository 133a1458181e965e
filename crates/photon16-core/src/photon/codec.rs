//! Big-endian integer helpers.
//!
//! The cursor writers are the encode half of the round-trip tests; the
//! `*_at` helpers work on a plain slice and advance a caller-held offset,
//! the way transport headers are parsed.

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

/// Writes `value` as 4 big-endian bytes at the cursor position
pub fn write_i32_be(value: i32, cursor: &mut ByteCursor) {
    cursor.write(&value.to_be_bytes());
}

/// Writes `value` as 2 big-endian bytes at the cursor position
pub fn write_i16_be(value: i16, cursor: &mut ByteCursor) {
    cursor.write(&value.to_be_bytes());
}

/// Writes `value` big-endian into `target` at `*offset`, advancing it
pub fn serialize_i32_at(value: i32, offset: &mut usize, target: &mut [u8]) -> Result<()> {
    let dst = window_mut(target, *offset, 4)?;
    dst.copy_from_slice(&value.to_be_bytes());
    *offset += 4;
    Ok(())
}

/// Reads a big-endian `i32` from `src` at `*offset`, advancing it
pub fn read_i32_at(src: &[u8], offset: &mut usize) -> Result<i32> {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(window(src, *offset, 4)?);
    *offset += 4;
    Ok(i32::from_be_bytes(bytes))
}

/// Reads a big-endian `i16` from `src` at `*offset`, advancing it
pub fn read_i16_at(src: &[u8], offset: &mut usize) -> Result<i16> {
    let mut bytes = [0u8; 2];
    bytes.copy_from_slice(window(src, *offset, 2)?);
    *offset += 2;
    Ok(i16::from_be_bytes(bytes))
}

fn window(src: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    src.get(offset..offset.saturating_add(len))
        .ok_or_else(|| Error::out_of_bounds(offset, len, src.len().saturating_sub(offset)))
}

fn window_mut(target: &mut [u8], offset: usize, len: usize) -> Result<&mut [u8]> {
    let available = target.len().saturating_sub(offset);
    target
        .get_mut(offset..offset.saturating_add(len))
        .ok_or_else(|| Error::out_of_bounds(offset, len, available))
}
