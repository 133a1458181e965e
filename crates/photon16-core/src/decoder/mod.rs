//! Recursive-descent protocol16 decoder.
//!
//! [`Decoder::decode_tagged`] reads one tag byte and dispatches on the
//! [`WireType`]; containers recurse back into the decoder for their
//! elements. All multi-byte numbers are big-endian on the wire.
//!
//! ## Container layouts
//!
//! - Array: `count:i16, tag:u8, values...` where every element shares
//!   `tag`. Arrays of arrays, arrays of byte arrays and arrays of
//!   dictionaries carry per-element headers and are decoded element by
//!   element.
//! - Dictionary: `key_tag:u8, value_tag:u8, count:i16, pairs...`. A
//!   declared tag of `0` means every key (or value) carries its own tag.
//! - Param table: `count:i16, (code:u8, tag:u8, value)...`
//!
//! ## Bounds
//!
//! Every declared count is checked against the bytes left in the cursor
//! before anything is allocated: a collection of `n` elements whose
//! smallest encoding is `k` bytes needs at least `n * k` bytes.
//!
//! Null elements of a uniform array (and null-typed dictionary pairs)
//! occupy no bytes at all, so they draw on a separate allowance instead:
//! one decode call may produce at most as many of them as its input had
//! bytes. Nesting is bounded by the configured maximum depth.

mod pool;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::protocol::{
    Dictionary, EventData, OperationRequest, OperationResponse, ParamTable, Value, WireType,
};
use bytes::Bytes;
use std::num::NonZeroUsize;
use std::ops::{Deref, DerefMut};
use tracing::{debug, trace};

pub use pool::{ScratchBuffer, ScratchPool, SCRATCH_SIZE};

const DEFAULT_POOL_CAPACITY: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Configuration for the decoder
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum container nesting depth
    pub max_depth: usize,
    /// Maximum declared element count or byte length of any one collection
    pub max_collection_len: usize,
    /// Number of scratch buffers that may be in use at once.
    ///
    /// A decode holds at most one buffer at a time, so this is the number
    /// of threads that can decode through one [`Decoder`] concurrently.
    /// Beyond that, primitive reads fail with [`Error::PoolExhaustion`].
    pub pool_capacity: NonZeroUsize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_collection_len: 1 << 20,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl DecoderConfig {
    /// Creates a new decoder config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the maximum declared collection length
    pub fn max_collection_len(mut self, len: usize) -> Self {
        self.max_collection_len = len;
        self
    }

    /// Sets the scratch pool capacity, i.e. the number of concurrent decodes
    pub fn pool_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}

/// protocol16 decoder.
///
/// A decoder is `Send + Sync`; one instance can serve many threads, each
/// decoding from its own [`ByteCursor`].
#[derive(Debug)]
pub struct Decoder {
    config: DecoderConfig,
    pool: ScratchPool,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Creates a new decoder with default configuration
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Creates a new decoder with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        let pool = ScratchPool::new(config.pool_capacity.get());
        Self { config, pool }
    }

    /// The active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// The scratch pool backing primitive reads
    pub fn pool(&self) -> &ScratchPool {
        &self.pool
    }

    /// Reads a tag byte and the value it announces
    pub fn decode_tagged(&self, cursor: &mut ByteCursor) -> Result<Value> {
        self.tagged(&mut Session::new(cursor), 0)
    }

    /// Decodes a value whose tag the caller has already consumed
    pub fn decode_as(&self, cursor: &mut ByteCursor, wire_type: WireType) -> Result<Value> {
        self.value(&mut Session::new(cursor), wire_type, 0)
    }

    /// Decodes a single tagged value from a byte slice
    pub fn decode_slice(&self, data: &[u8]) -> Result<Value> {
        let mut cursor = ByteCursor::from(data);
        debug!("Decoding {} bytes", data.len());
        let value = self.decode_tagged(&mut cursor)?;
        if cursor.remaining() > 0 {
            debug!(
                "Decoded {} at offset 0, {} trailing bytes left",
                value.type_name(),
                cursor.remaining()
            );
        }
        Ok(value)
    }

    /// Decodes tagged values back to back until the cursor is exhausted
    pub fn decode_all(&self, cursor: &mut ByteCursor) -> Result<Vec<Value>> {
        let mut input = Session::new(cursor);
        let mut values = Vec::new();
        while input.remaining() > 0 {
            values.push(self.tagged(&mut input, 0)?);
        }
        debug!("Decoded {} values from {} bytes", values.len(), input.len());
        Ok(values)
    }

    /// Reads the leading tag and decodes an event, failing on any other kind
    pub fn decode_event(&self, cursor: &mut ByteCursor) -> Result<EventData> {
        let mut input = Session::new(cursor);
        self.expect_tag(&mut input, WireType::EventData)?;
        self.event(&mut input, 0)
    }

    /// Reads the leading tag and decodes an operation request
    pub fn decode_request(&self, cursor: &mut ByteCursor) -> Result<OperationRequest> {
        let mut input = Session::new(cursor);
        self.expect_tag(&mut input, WireType::OperationRequest)?;
        self.request(&mut input, 0)
    }

    /// Reads the leading tag and decodes an operation response
    pub fn decode_response(&self, cursor: &mut ByteCursor) -> Result<OperationResponse> {
        let mut input = Session::new(cursor);
        self.expect_tag(&mut input, WireType::OperationResponse)?;
        self.response(&mut input, 0)
    }

    /// Reads one byte
    pub fn read_byte(&self, cursor: &mut ByteCursor) -> Result<u8> {
        cursor.read_byte()
    }

    /// Reads a boolean; any nonzero byte is `true`
    pub fn read_bool(&self, cursor: &mut ByteCursor) -> Result<bool> {
        Ok(cursor.read_byte()? != 0)
    }

    /// Reads a big-endian `i16`
    pub fn read_short(&self, cursor: &mut ByteCursor) -> Result<i16> {
        self.read_fixed(cursor).map(i16::from_be_bytes)
    }

    /// Reads a big-endian `i32`
    pub fn read_int(&self, cursor: &mut ByteCursor) -> Result<i32> {
        self.read_fixed(cursor).map(i32::from_be_bytes)
    }

    /// Reads a big-endian `i64`
    pub fn read_long(&self, cursor: &mut ByteCursor) -> Result<i64> {
        self.read_fixed(cursor).map(i64::from_be_bytes)
    }

    /// Reads a big-endian IEEE-754 single
    pub fn read_float(&self, cursor: &mut ByteCursor) -> Result<f32> {
        self.read_fixed(cursor).map(f32::from_be_bytes)
    }

    /// Reads a big-endian IEEE-754 double
    pub fn read_double(&self, cursor: &mut ByteCursor) -> Result<f64> {
        self.read_fixed(cursor).map(f64::from_be_bytes)
    }

    /// Reads a string: `i16` byte length followed by UTF-8
    pub fn read_string(&self, cursor: &mut ByteCursor) -> Result<String> {
        let len = self.read_length(cursor, LengthPrefix::Short)?;
        if len == 0 {
            return Ok(String::new());
        }
        let offset = cursor.position();
        let raw = cursor.read_exact(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidUtf8 { offset })
    }

    /// Reads a byte array: `i32` length followed by raw bytes
    pub fn read_byte_array(&self, cursor: &mut ByteCursor) -> Result<Bytes> {
        let len = self.read_length(cursor, LengthPrefix::Int)?;
        let raw = cursor.read_exact(len)?;
        Ok(Bytes::copy_from_slice(raw))
    }

    fn tagged(&self, input: &mut Session<'_>, depth: usize) -> Result<Value> {
        let wire_type = self.read_tag(input)?;
        self.value(input, wire_type, depth)
    }

    fn value(&self, input: &mut Session<'_>, wire_type: WireType, depth: usize) -> Result<Value> {
        trace!("Decoding {} at offset {}", wire_type, input.position());

        let value = match wire_type {
            WireType::Unknown | WireType::Null => Value::Null,
            WireType::Byte => Value::Byte(self.read_byte(input)?),
            WireType::Boolean => Value::Bool(self.read_bool(input)?),
            WireType::Short => Value::Short(self.read_short(input)?),
            WireType::Integer => Value::Int(self.read_int(input)?),
            WireType::Long => Value::Long(self.read_long(input)?),
            WireType::Float => Value::Float(self.read_float(input)?),
            WireType::Double => Value::Double(self.read_double(input)?),
            WireType::String => Value::String(self.read_string(input)?),
            WireType::ByteArray => Value::ByteArray(self.read_byte_array(input)?),
            WireType::IntegerArray => Value::IntArray(self.int_array(input)?),
            WireType::StringArray => Value::StringArray(self.string_array(input)?),
            WireType::Array => self.array(input, depth)?,
            WireType::ObjectArray => Value::ObjectArray(self.object_array(input, depth)?),
            WireType::Dictionary => Value::Dictionary(self.dictionary(input, depth)?),
            WireType::Hashtable => Value::Dictionary(self.hashtable(input, depth)?),
            WireType::EventData => Value::EventData(self.event(input, depth)?),
            WireType::OperationRequest => Value::OperationRequest(self.request(input, depth)?),
            WireType::OperationResponse => Value::OperationResponse(self.response(input, depth)?),
        };

        Ok(value)
    }

    fn read_tag(&self, cursor: &mut ByteCursor) -> Result<WireType> {
        let offset = cursor.position();
        let tag = cursor.read_byte()?;
        WireType::from_u8(tag).ok_or_else(|| Error::unknown_type(tag, offset))
    }

    fn expect_tag(&self, cursor: &mut ByteCursor, expected: WireType) -> Result<()> {
        let offset = cursor.position();
        let found = self.read_tag(cursor)?;
        if found != expected {
            return Err(Error::UnexpectedType {
                expected,
                found,
                offset,
            });
        }
        Ok(())
    }

    /// Stages `N` bytes in a pooled scratch buffer
    fn read_fixed<const N: usize>(&self, cursor: &mut ByteCursor) -> Result<[u8; N]> {
        debug_assert!(N <= SCRATCH_SIZE);
        let mut scratch = self.pool.acquire()?;
        cursor.read_into(&mut scratch[..N])?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&scratch[..N]);
        Ok(bytes)
    }

    /// Reads a byte length prefix. Exceeding the input is left to the read.
    fn read_length(&self, cursor: &mut ByteCursor, prefix: LengthPrefix) -> Result<usize> {
        let offset = cursor.position();
        let declared = match prefix {
            LengthPrefix::Short => i64::from(self.read_short(cursor)?),
            LengthPrefix::Int => i64::from(self.read_int(cursor)?),
        };
        if declared < 0 {
            return Err(Error::malformed_length(offset, declared, "negative length"));
        }
        if declared as u64 > self.config.max_collection_len as u64 {
            return Err(Error::malformed_length(
                offset,
                declared,
                "exceeds configured collection limit",
            ));
        }
        Ok(declared as usize)
    }

    /// Reads an element count and checks the input can hold that many
    /// elements of at least `min_size` bytes each
    fn read_count(
        &self,
        input: &mut Session<'_>,
        prefix: LengthPrefix,
        min_size: usize,
    ) -> Result<usize> {
        let offset = input.position();
        let count = self.read_length(input, prefix)?;
        self.check_count(input, offset, count, min_size)?;
        Ok(count)
    }

    fn check_count(
        &self,
        input: &mut Session<'_>,
        offset: usize,
        count: usize,
        min_size: usize,
    ) -> Result<()> {
        if min_size == 0 {
            return input.take_empty(offset, count);
        }
        let needed = count.saturating_mul(min_size);
        if needed > input.remaining() {
            return Err(Error::malformed_length(
                offset,
                count as i64,
                "count exceeds remaining input",
            ));
        }
        Ok(())
    }

    fn enter(&self, cursor: &ByteCursor, depth: usize) -> Result<usize> {
        if depth >= self.config.max_depth {
            return Err(Error::DepthLimitExceeded {
                offset: cursor.position(),
                max: self.config.max_depth,
            });
        }
        Ok(depth + 1)
    }

    fn int_array(&self, input: &mut Session<'_>) -> Result<Vec<i32>> {
        let count = self.read_count(input, LengthPrefix::Int, 4)?;
        (0..count).map(|_| self.read_int(input)).collect()
    }

    fn string_array(&self, input: &mut Session<'_>) -> Result<Vec<String>> {
        let count = self.read_count(input, LengthPrefix::Short, 2)?;
        (0..count).map(|_| self.read_string(input)).collect()
    }

    fn object_array(&self, input: &mut Session<'_>, depth: usize) -> Result<Vec<Value>> {
        let inner = self.enter(input, depth)?;
        let count = self.read_count(input, LengthPrefix::Short, 1)?;
        (0..count).map(|_| self.tagged(input, inner)).collect()
    }

    fn array(&self, input: &mut Session<'_>, depth: usize) -> Result<Value> {
        let inner = self.enter(input, depth)?;
        let offset = input.position();
        let count = self.read_length(input, LengthPrefix::Short)?;
        let element = self.read_tag(input)?;
        trace!("Array of {} x {} at offset {}", count, element, offset);

        let value = match element {
            WireType::Array => {
                self.check_count(input, offset, count, WireType::Array.min_wire_size())?;
                let items = (0..count)
                    .map(|_| self.array(input, inner))
                    .collect::<Result<_>>()?;
                Value::Array(items)
            }
            WireType::ByteArray => {
                self.check_count(input, offset, count, WireType::ByteArray.min_wire_size())?;
                let items = (0..count)
                    .map(|_| self.read_byte_array(input).map(Value::ByteArray))
                    .collect::<Result<_>>()?;
                Value::Array(items)
            }
            WireType::Dictionary => {
                Value::DictionaryArray(self.dictionary_array(input, offset, count, inner)?)
            }
            other => {
                self.check_count(input, offset, count, other.min_wire_size())?;
                let items = (0..count)
                    .map(|_| self.value(input, other, inner))
                    .collect::<Result<_>>()?;
                Value::Array(items)
            }
        };

        Ok(value)
    }

    fn dictionary(&self, input: &mut Session<'_>, depth: usize) -> Result<Dictionary> {
        let inner = self.enter(input, depth)?;
        let key_type = self.read_tag(input)?;
        let value_type = self.read_tag(input)?;
        let count = self.read_count(
            input,
            LengthPrefix::Short,
            slot_size(key_type) + slot_size(value_type),
        )?;
        trace!(
            "Dictionary of {} entries ({} -> {})",
            count,
            key_type,
            value_type
        );
        self.dictionary_entries(input, count, key_type, value_type, inner)
    }

    /// Same layout as a dictionary, but every key and value carries its own tag
    fn hashtable(&self, input: &mut Session<'_>, depth: usize) -> Result<Dictionary> {
        let inner = self.enter(input, depth)?;
        input.read_exact(2)?;
        let count = self.read_count(input, LengthPrefix::Short, 2)?;
        self.dictionary_entries(input, count, WireType::Unknown, WireType::Unknown, inner)
    }

    fn dictionary_array(
        &self,
        input: &mut Session<'_>,
        offset: usize,
        count: usize,
        depth: usize,
    ) -> Result<Vec<Dictionary>> {
        let key_type = self.read_tag(input)?;
        let value_type = self.read_tag(input)?;
        self.check_count(input, offset, count, 2)?;

        let pair_size = slot_size(key_type) + slot_size(value_type);
        (0..count)
            .map(|_| {
                let entries = self.read_count(input, LengthPrefix::Short, pair_size)?;
                self.dictionary_entries(input, entries, key_type, value_type, depth)
            })
            .collect()
    }

    fn dictionary_entries(
        &self,
        input: &mut Session<'_>,
        count: usize,
        key_type: WireType,
        value_type: WireType,
        depth: usize,
    ) -> Result<Dictionary> {
        let mut dictionary = Dictionary::with_capacity(count.min(input.remaining()));
        for _ in 0..count {
            let key = self.slot(input, key_type, depth)?;
            let value = self.slot(input, value_type, depth)?;
            dictionary.insert(key, value);
        }
        Ok(dictionary)
    }

    /// Decodes a dictionary key or value under its declared type
    fn slot(&self, input: &mut Session<'_>, declared: WireType, depth: usize) -> Result<Value> {
        match declared {
            WireType::Unknown => self.tagged(input, depth),
            declared => self.value(input, declared, depth),
        }
    }

    fn param_table(&self, input: &mut Session<'_>, depth: usize) -> Result<ParamTable> {
        let count = self.read_count(input, LengthPrefix::Short, 2)?;
        let mut params = ParamTable::new();
        for _ in 0..count {
            let code = input.read_byte()?;
            let value = self.tagged(input, depth)?;
            params.insert(code, value);
        }
        Ok(params)
    }

    fn event(&self, input: &mut Session<'_>, depth: usize) -> Result<EventData> {
        let inner = self.enter(input, depth)?;
        let code = input.read_byte()?;
        let params = self.param_table(input, inner)?;
        Ok(EventData { code, params })
    }

    fn request(&self, input: &mut Session<'_>, depth: usize) -> Result<OperationRequest> {
        let inner = self.enter(input, depth)?;
        let code = input.read_byte()?;
        let params = self.param_table(input, inner)?;
        Ok(OperationRequest { code, params })
    }

    fn response(&self, input: &mut Session<'_>, depth: usize) -> Result<OperationResponse> {
        let inner = self.enter(input, depth)?;
        let code = input.read_byte()?;
        let return_code = self.read_short(input)?;
        let debug_message = self.read_string(input)?;
        let params = self.param_table(input, inner)?;
        Ok(OperationResponse {
            code,
            return_code,
            debug_message,
            params,
        })
    }
}

/// Cursor plus the state one public decode call carries through recursion
struct Session<'c> {
    cursor: &'c mut ByteCursor,
    /// Zero-width elements this call may still produce
    empty_allowance: usize,
}

impl<'c> Session<'c> {
    fn new(cursor: &'c mut ByteCursor) -> Self {
        let empty_allowance = cursor.remaining();
        Self {
            cursor,
            empty_allowance,
        }
    }

    /// Charges `count` zero-width elements against the allowance
    fn take_empty(&mut self, offset: usize, count: usize) -> Result<()> {
        match self.empty_allowance.checked_sub(count) {
            Some(left) => {
                self.empty_allowance = left;
                Ok(())
            }
            None => {
                debug!(
                    "Rejecting {} empty elements at offset {} ({} allowed)",
                    count,
                    offset,
                    self.empty_allowance
                );
                Err(Error::malformed_length(
                    offset,
                    count as i64,
                    "too many zero-width elements for input size",
                ))
            }
        }
    }
}

impl Deref for Session<'_> {
    type Target = ByteCursor;

    fn deref(&self) -> &ByteCursor {
        &*self.cursor
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut ByteCursor {
        &mut *self.cursor
    }
}

#[derive(Debug, Clone, Copy)]
enum LengthPrefix {
    Short,
    Int,
}

/// Minimum bytes one dictionary key or value occupies under `declared`
fn slot_size(declared: WireType) -> usize {
    match declared {
        WireType::Unknown => 1,
        declared => declared.min_wire_size(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(bytes: &[u8]) -> Result<Value> {
        Decoder::new().decode_slice(bytes)
    }

    #[test]
    fn test_short() {
        assert_eq!(decode(&[b'k', 0x00, 0x05]).unwrap(), Value::Short(5));
        assert_eq!(decode(&[b'k', 0xFF, 0xFE]).unwrap(), Value::Short(-2));
    }

    #[test]
    fn test_fixed_width_primitives() {
        assert_eq!(decode(&[b'b', 0xC8]).unwrap(), Value::Byte(200));
        assert_eq!(decode(&[b'o', 0x02]).unwrap(), Value::Bool(true));
        assert_eq!(decode(&[b'o', 0x00]).unwrap(), Value::Bool(false));
        assert_eq!(
            decode(&[b'i', 0x80, 0x00, 0x00, 0x01]).unwrap(),
            Value::Int(i32::MIN + 1)
        );
        assert_eq!(
            decode(&[b'l', 0, 0, 0, 0, 0, 0, 0x01, 0x00]).unwrap(),
            Value::Long(256)
        );
        assert_eq!(
            decode(&[b'f', 0x3F, 0xC0, 0x00, 0x00]).unwrap(),
            Value::Float(1.5)
        );
        assert_eq!(
            decode(&[b'd', 0xC0, 0x04, 0, 0, 0, 0, 0, 0]).unwrap(),
            Value::Double(-2.5)
        );
    }

    #[test]
    fn test_null_and_unknown_consume_nothing() {
        let decoder = Decoder::new();
        let mut cursor = ByteCursor::from(vec![b'*', 0x00, b'b', 0x07]);
        assert_eq!(decoder.decode_tagged(&mut cursor).unwrap(), Value::Null);
        assert_eq!(decoder.decode_tagged(&mut cursor).unwrap(), Value::Null);
        assert_eq!(decoder.decode_tagged(&mut cursor).unwrap(), Value::Byte(7));
    }

    #[test]
    fn test_unknown_tag_consumes_only_tag() {
        let decoder = Decoder::new();
        let mut cursor = ByteCursor::from(vec![0xFF, 0x01, 0x02]);
        let err = decoder.decode_tagged(&mut cursor).unwrap_err();
        assert_eq!(err, Error::unknown_type(0xFF, 0));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(decode(&[b's', 0x00, 0x00]).unwrap(), Value::from(""));
    }

    #[test]
    fn test_string() {
        assert_eq!(
            decode(&[b's', 0x00, 0x03, b'a', b'b', b'c']).unwrap(),
            Value::from("abc")
        );
    }

    #[test]
    fn test_string_rejects_invalid_utf8() {
        assert_eq!(
            decode(&[b's', 0x00, 0x02, 0xC3, 0x28]).unwrap_err(),
            Error::InvalidUtf8 { offset: 3 }
        );
    }

    #[test]
    fn test_negative_string_length() {
        let err = decode(&[b's', 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedLength {
                offset: 1,
                length: -1,
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_byte_array() {
        let mut bytes = vec![b'x', 0x00, 0x00, 0x00, 100];
        bytes.extend_from_slice(&[0xAB; 10]);
        assert_eq!(
            decode(&bytes).unwrap_err(),
            Error::out_of_bounds(5, 100, 10)
        );
    }

    #[test]
    fn test_integer_array() {
        let bytes = [b'n', 0, 0, 0, 2, 0, 0, 0, 1, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(decode(&bytes).unwrap(), Value::IntArray(vec![1, -1]));
    }

    #[test]
    fn test_integer_array_count_exceeds_input() {
        let bytes = [b'n', 0x7F, 0xFF, 0xFF, 0xFF, 0, 0, 0, 1];
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            Error::MalformedLength { offset: 1, .. }
        ));
    }

    #[test]
    fn test_string_array() {
        let bytes = [b'a', 0, 2, 0, 1, b'x', 0, 0];
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::StringArray(vec!["x".into(), String::new()])
        );
    }

    #[test]
    fn test_uniform_array() {
        let bytes = [b'y', 0x00, 0x02, b'b', 0x01, 0x02];
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::Array(vec![Value::Byte(1), Value::Byte(2)])
        );
    }

    #[test]
    fn test_empty_array_of_arrays() {
        let bytes = [b'y', 0x00, 0x00, b'y'];
        assert_eq!(decode(&bytes).unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn test_array_of_arrays() {
        // Two sub-arrays with different element types and lengths.
        let bytes = [
            b'y', 0, 2, b'y', //
            0, 1, b'b', 9, //
            0, 2, b'k', 0, 1, 0, 2,
        ];
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::Array(vec![
                Value::Array(vec![Value::Byte(9)]),
                Value::Array(vec![Value::Short(1), Value::Short(2)]),
            ])
        );
    }

    #[test]
    fn test_array_of_byte_arrays() {
        let bytes = [
            b'y', 0, 2, b'x', //
            0, 0, 0, 1, 0xAA, //
            0, 0, 0, 0,
        ];
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::Array(vec![
                Value::ByteArray(Bytes::from_static(&[0xAA])),
                Value::ByteArray(Bytes::new()),
            ])
        );
    }

    #[test]
    fn test_array_of_dictionaries() {
        let bytes = [
            b'y', 0, 2, b'D', b'b', 0, // key byte, value tagged
            0, 1, 1, b'i', 0, 0, 0, 5, //
            0, 0,
        ];
        let first: Dictionary = [(Value::Byte(1), Value::Int(5))].into_iter().collect();
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::DictionaryArray(vec![first, Dictionary::new()])
        );
    }

    #[test]
    fn test_array_unknown_element_tag() {
        let bytes = [b'y', 0, 1, b'?', 0];
        assert_eq!(decode(&bytes).unwrap_err(), Error::unknown_type(b'?', 3));
    }

    #[test]
    fn test_object_array() {
        let bytes = [b'z', 0, 3, b'b', 1, b'*', b's', 0, 1, b'q'];
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::ObjectArray(vec![Value::Byte(1), Value::Null, Value::from("q")])
        );
    }

    #[test]
    fn test_dictionary() {
        let bytes = [
            b'D', 0x73, 0x69, 0x00, 0x01, 0x00, 0x01, b'A', 0x00, 0x00, 0x00, 0x07,
        ];
        let expected: Dictionary = [(Value::from("A"), Value::Int(7))].into_iter().collect();
        assert_eq!(decode(&bytes).unwrap(), Value::Dictionary(expected));
    }

    #[test]
    fn test_dictionary_duplicate_key_last_wins() {
        let bytes = [
            b'D', b'i', b's', 0, 2, //
            0, 0, 0, 1, 0, 1, b'a', //
            0, 0, 0, 1, 0, 1, b'b',
        ];
        let expected: Dictionary = [(Value::Int(1), Value::from("b"))].into_iter().collect();
        assert_eq!(decode(&bytes).unwrap(), Value::Dictionary(expected));
    }

    #[test]
    fn test_dictionary_mixed_types() {
        let bytes = [b'D', 0, 0, 0, 2, b'b', 1, b'o', 1, b's', 0, 1, b'k', b'*'];
        let expected: Dictionary = [
            (Value::Byte(1), Value::Bool(true)),
            (Value::from("k"), Value::Null),
        ]
        .into_iter()
        .collect();
        assert_eq!(decode(&bytes).unwrap(), Value::Dictionary(expected));
    }

    #[test]
    fn test_dictionary_unknown_declared_type() {
        let bytes = [b'D', b'!', b'i', 0, 0];
        assert_eq!(decode(&bytes).unwrap_err(), Error::unknown_type(b'!', 1));
    }

    #[test]
    fn test_hashtable_ignores_declared_types() {
        let bytes = [b'h', b'i', b'i', 0, 1, b'b', 3, b's', 0, 1, b'z'];
        let expected: Dictionary = [(Value::Byte(3), Value::from("z"))].into_iter().collect();
        assert_eq!(decode(&bytes).unwrap(), Value::Dictionary(expected));
    }

    #[test]
    fn test_event_data() {
        let bytes = [b'e', 7, 0, 2, 0, b'b', 1, 5, b's', 0, 2, b'h', b'i'];
        let mut params = ParamTable::new();
        params.insert(0, Value::Byte(1));
        params.insert(5, Value::from("hi"));
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::EventData(EventData { code: 7, params })
        );
    }

    #[test]
    fn test_operation_request() {
        let bytes = [b'q', 2, 0, 1, 9, b'i', 0, 0, 1, 0];
        let mut params = ParamTable::new();
        params.insert(9, Value::Int(256));
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::OperationRequest(OperationRequest { code: 2, params })
        );
    }

    #[test]
    fn test_operation_response() {
        let bytes = [b'p', 4, 0xFF, 0xFF, 0, 2, b'n', b'o', 0, 0];
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::OperationResponse(OperationResponse {
                code: 4,
                return_code: -1,
                debug_message: "no".into(),
                params: ParamTable::new(),
            })
        );
    }

    #[test]
    fn test_decode_event_rejects_other_kinds() {
        let decoder = Decoder::new();
        let mut cursor = ByteCursor::from(vec![b'q', 1, 0, 0]);
        assert_eq!(
            decoder.decode_event(&mut cursor).unwrap_err(),
            Error::UnexpectedType {
                expected: WireType::EventData,
                found: WireType::OperationRequest,
                offset: 0,
            }
        );
    }

    #[test]
    fn test_decode_as_with_known_tag() {
        let decoder = Decoder::new();
        let mut cursor = ByteCursor::from(vec![0x00, 0x2A]);
        assert_eq!(
            decoder.decode_as(&mut cursor, WireType::Short).unwrap(),
            Value::Short(42)
        );
    }

    #[test]
    fn test_child_error_propagates() {
        // Second object-array element is truncated.
        let bytes = [b'z', 0, 2, b'b', 1, b'i', 0, 0];
        assert!(decode(&bytes).unwrap_err().is_truncation());
    }

    #[test]
    fn test_depth_limit() {
        let decoder = Decoder::with_config(DecoderConfig::new().max_depth(2));
        let nested = [b'z', 0, 1, b'z', 0, 1, b'z', 0, 0];
        assert!(matches!(
            decoder.decode_slice(&nested).unwrap_err(),
            Error::DepthLimitExceeded { max: 2, .. }
        ));
        assert!(decoder.decode_slice(&nested[3..]).is_ok());
    }

    #[test]
    fn test_collection_limit() {
        let decoder = Decoder::with_config(DecoderConfig::new().max_collection_len(2));
        let bytes = [b'x', 0, 0, 0, 3, 1, 2, 3];
        assert!(matches!(
            decoder.decode_slice(&bytes).unwrap_err(),
            Error::MalformedLength { length: 3, .. }
        ));
    }

    #[test]
    fn test_null_array_charged_against_input() {
        // Null elements have no body, each one is charged one input byte.
        let bytes = [b'y', 0, 3, b'*'];
        assert_eq!(
            decode(&bytes).unwrap(),
            Value::Array(vec![Value::Null, Value::Null, Value::Null])
        );

        let bytes = [b'y', 0, 5, b'*'];
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            Error::MalformedLength {
                offset: 1,
                length: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_nested_null_arrays_rejected() {
        let mut bytes = vec![b'y', 0, 100, b'y'];
        for _ in 0..100 {
            bytes.extend_from_slice(&[0x7F, 0xFF, b'*']);
        }
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            Error::MalformedLength { length: 32767, .. }
        ));
    }

    #[test]
    fn test_null_allowance_spans_whole_decode() {
        // Every sub-array fits the input on its own, the total does not.
        let mut bytes = vec![b'y', 0, 10, b'y'];
        for _ in 0..10 {
            bytes.extend_from_slice(&[0, 5, b'*']);
        }
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            Error::MalformedLength { length: 5, .. }
        ));

        let mut bytes = vec![b'y', 0, 3, b'y'];
        for _ in 0..3 {
            bytes.extend_from_slice(&[0, 2, b'*']);
        }
        let nested = Value::Array(vec![Value::Null, Value::Null]);
        assert_eq!(decode(&bytes).unwrap(), Value::Array(vec![nested; 3]));
    }

    #[test]
    fn test_null_typed_dictionary_array_rejected() {
        let mut bytes = vec![b'y', 0x07, 0xD0, b'D', b'*', b'*'];
        for _ in 0..2000 {
            bytes.extend_from_slice(&[0x7F, 0xFF]);
        }
        assert!(matches!(
            decode(&bytes).unwrap_err(),
            Error::MalformedLength {
                offset: 6,
                length: 32767,
                ..
            }
        ));
    }

    #[test]
    fn test_null_typed_dictionary() {
        let bytes = [b'D', b'*', b'*', 0, 2];
        let expected: Dictionary = [(Value::Null, Value::Null)].into_iter().collect();
        assert_eq!(decode(&bytes).unwrap(), Value::Dictionary(expected));
    }

    #[test]
    fn test_decode_all_shares_null_allowance() {
        let bytes = vec![b'y', 0, 7, b'*', b'y', 0, 7, b'*', b'b', 1, b'b', 1];

        let decoder = Decoder::new();
        let mut cursor = ByteCursor::from(bytes.clone());
        assert!(decoder.decode_all(&mut cursor).is_err());

        let mut cursor = ByteCursor::from(bytes);
        assert!(decoder.decode_tagged(&mut cursor).is_ok());
        assert!(decoder.decode_tagged(&mut cursor).is_ok());
    }

    #[test]
    fn test_decode_all() {
        let decoder = Decoder::new();
        let mut cursor = ByteCursor::from(vec![b'b', 1, b'k', 0, 2]);
        assert_eq!(
            decoder.decode_all(&mut cursor).unwrap(),
            vec![Value::Byte(1), Value::Short(2)]
        );
    }

    #[test]
    fn test_pool_released_after_decode() {
        let decoder = Decoder::new();
        decoder.decode_slice(&[b'n', 0, 0, 0, 1, 0, 0, 0, 7]).unwrap();
        assert_eq!(decoder.pool().outstanding(), 0);
    }

    #[test]
    fn test_default_pool_capacity() {
        assert_eq!(DecoderConfig::default().pool_capacity.get(), 64);
    }

    #[test]
    fn test_pool_capacity_bounds_concurrent_reads() {
        let one = NonZeroUsize::new(1).unwrap();
        let decoder = Decoder::with_config(DecoderConfig::new().pool_capacity(one));

        let held = decoder.pool().acquire().unwrap();
        assert_eq!(
            decoder.decode_slice(&[b'k', 0x00, 0x05]).unwrap_err(),
            Error::PoolExhaustion { capacity: 1 }
        );

        drop(held);
        assert_eq!(decoder.decode_slice(&[b'k', 0x00, 0x05]).unwrap(), Value::Short(5));
    }
}
