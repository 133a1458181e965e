//! protocol16 type tags.
//!
//! Every value on the wire is preceded by one tag byte. The tags are ASCII
//! letters chosen by the protocol (`i` for integer, `s` for string, ...),
//! plus `0` for the unknown placeholder and `*` for null.
//!
//! Multi-byte integers and floats are big-endian.

use crate::error::{Error, Result};
use std::fmt;

/// protocol16 wire types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// Placeholder; decodes to null without consuming bytes
    Unknown = 0,
    /// Null value, no payload
    Null = b'*',
    /// Typed dictionary
    Dictionary = b'D',
    /// Short count + strings
    StringArray = b'a',
    /// Single byte
    Byte = b'b',
    /// 64-bit IEEE-754
    Double = b'd',
    /// Event record
    EventData = b'e',
    /// 32-bit IEEE-754
    Float = b'f',
    /// Free-form map, every key and value tagged
    Hashtable = b'h',
    /// 32-bit signed integer
    Integer = b'i',
    /// 16-bit signed integer
    Short = b'k',
    /// 64-bit signed integer
    Long = b'l',
    /// Integer count + integers
    IntegerArray = b'n',
    /// Boolean byte
    Boolean = b'o',
    /// Operation response record
    OperationResponse = b'p',
    /// Operation request record
    OperationRequest = b'q',
    /// Short byte length + UTF-8
    String = b's',
    /// Integer length + raw bytes
    ByteArray = b'x',
    /// Short count + one shared element tag
    Array = b'y',
    /// Short count + individually tagged elements
    ObjectArray = b'z',
}

impl WireType {
    /// Looks up the wire type for a tag byte
    pub fn from_u8(tag: u8) -> Option<Self> {
        let wire_type = match tag {
            0 => WireType::Unknown,
            b'*' => WireType::Null,
            b'D' => WireType::Dictionary,
            b'a' => WireType::StringArray,
            b'b' => WireType::Byte,
            b'd' => WireType::Double,
            b'e' => WireType::EventData,
            b'f' => WireType::Float,
            b'h' => WireType::Hashtable,
            b'i' => WireType::Integer,
            b'k' => WireType::Short,
            b'l' => WireType::Long,
            b'n' => WireType::IntegerArray,
            b'o' => WireType::Boolean,
            b'p' => WireType::OperationResponse,
            b'q' => WireType::OperationRequest,
            b's' => WireType::String,
            b'x' => WireType::ByteArray,
            b'y' => WireType::Array,
            b'z' => WireType::ObjectArray,
            _ => return None,
        };
        Some(wire_type)
    }

    /// The tag byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// The tag byte as a character (`'\0'` for [`WireType::Unknown`])
    pub fn as_char(self) -> char {
        char::from(self.as_u8())
    }

    /// Smallest number of bytes a value of this type occupies after its tag.
    ///
    /// Used to reject element counts that the remaining input cannot
    /// possibly hold before anything is allocated. Null and Unknown have no
    /// body; the decoder bounds those separately.
    pub fn min_wire_size(self) -> usize {
        match self {
            WireType::Unknown | WireType::Null => 0,
            WireType::Byte | WireType::Boolean => 1,
            WireType::Short
            | WireType::String
            | WireType::StringArray
            | WireType::ObjectArray => 2,
            WireType::Array | WireType::EventData | WireType::OperationRequest => 3,
            WireType::Integer
            | WireType::Float
            | WireType::ByteArray
            | WireType::IntegerArray
            | WireType::Dictionary
            | WireType::Hashtable => 4,
            WireType::OperationResponse => 7,
            WireType::Long | WireType::Double => 8,
        }
    }

    /// Returns true for types whose payload embeds further values
    pub fn is_container(self) -> bool {
        matches!(
            self,
            WireType::Dictionary
                | WireType::Hashtable
                | WireType::Array
                | WireType::ObjectArray
                | WireType::EventData
                | WireType::OperationRequest
                | WireType::OperationResponse
        )
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            WireType::Unknown => "unknown",
            WireType::Null => "null",
            WireType::Dictionary => "dictionary",
            WireType::StringArray => "string array",
            WireType::Byte => "byte",
            WireType::Double => "double",
            WireType::EventData => "event data",
            WireType::Float => "float",
            WireType::Hashtable => "hashtable",
            WireType::Integer => "integer",
            WireType::Short => "short",
            WireType::Long => "long",
            WireType::IntegerArray => "integer array",
            WireType::Boolean => "boolean",
            WireType::OperationResponse => "operation response",
            WireType::OperationRequest => "operation request",
            WireType::String => "string",
            WireType::ByteArray => "byte array",
            WireType::Array => "array",
            WireType::ObjectArray => "object array",
        }
    }
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        WireType::from_u8(value).ok_or_else(|| Error::unknown_type(value, 0))
    }
}

impl From<WireType> for u8 {
    fn from(wire_type: WireType) -> Self {
        wire_type.as_u8()
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
