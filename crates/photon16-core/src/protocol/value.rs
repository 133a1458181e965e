//! Decoded value model.
//!
//! [`Value`] is a closed union over everything protocol16 can carry.
//! Values compare and hash structurally (floats by bit pattern), so any
//! value, including nested containers, can be a [`Dictionary`] key.

use super::wire::WireType;
use bytes::Bytes;
use std::collections::hash_map::{self, DefaultHasher};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Parameter table carried by events, requests and responses
pub type ParamTable = BTreeMap<u8, Value>;

/// A decoded protocol16 value
#[derive(Debug, Clone)]
pub enum Value {
    /// Null (also produced by the unknown placeholder tag)
    Null,
    /// Boolean
    Bool(bool),
    /// Unsigned byte
    Byte(u8),
    /// 16-bit signed integer
    Short(i16),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// UTF-8 text
    String(String),
    /// Raw bytes
    ByteArray(Bytes),
    /// Integers
    IntArray(Vec<i32>),
    /// Strings
    StringArray(Vec<String>),
    /// Uniformly tagged array (sub-arrays may differ from each other)
    Array(Vec<Value>),
    /// Individually tagged array
    ObjectArray(Vec<Value>),
    /// Mapping between decoded values
    Dictionary(Dictionary),
    /// Array of dictionaries sharing one key/value type declaration
    DictionaryArray(Vec<Dictionary>),
    /// Event record
    EventData(EventData),
    /// Operation request record
    OperationRequest(OperationRequest),
    /// Operation response record
    OperationResponse(OperationResponse),
}

/// Event pushed by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EventData {
    /// Event code
    pub code: u8,
    /// Event parameters
    pub params: ParamTable,
}

/// Operation sent by a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OperationRequest {
    /// Operation code
    pub code: u8,
    /// Operation parameters
    pub params: ParamTable,
}

/// Result of an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OperationResponse {
    /// Operation code
    pub code: u8,
    /// Application return code (0 usually means success)
    pub return_code: i16,
    /// Debug message, empty when absent
    pub debug_message: String,
    /// Response parameters
    pub params: ParamTable,
}

/// Mapping keyed by value equality. Duplicate keys keep the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary(HashMap<Value, Value>);

impl Dictionary {
    /// Creates an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty dictionary with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashMap::with_capacity(capacity))
    }

    /// Inserts an entry, returning the value it replaced
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Looks up a key
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if the key is present
    pub fn contains_key(&self, key: &Value) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in unspecified order
    pub fn iter(&self) -> hash_map::Iter<'_, Value, Value> {
        self.0.iter()
    }
}

impl Hash for Dictionary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Entry hashes are summed so the result does not depend on iteration order.
        let combined = self.0.iter().fold(0u64, |acc, (key, value)| {
            let mut entry = DefaultHasher::new();
            key.hash(&mut entry);
            value.hash(&mut entry);
            acc.wrapping_add(entry.finish())
        });
        state.write_usize(self.0.len());
        state.write_u64(combined);
    }
}

impl FromIterator<(Value, Value)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Dictionary {
    type Item = (Value, Value);
    type IntoIter = hash_map::IntoIter<Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a Value, &'a Value);
    type IntoIter = hash_map::Iter<'a, Value, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Value {
    /// The wire type this value is encoded with
    pub fn wire_type(&self) -> WireType {
        match self {
            Value::Null => WireType::Null,
            Value::Bool(_) => WireType::Boolean,
            Value::Byte(_) => WireType::Byte,
            Value::Short(_) => WireType::Short,
            Value::Int(_) => WireType::Integer,
            Value::Long(_) => WireType::Long,
            Value::Float(_) => WireType::Float,
            Value::Double(_) => WireType::Double,
            Value::String(_) => WireType::String,
            Value::ByteArray(_) => WireType::ByteArray,
            Value::IntArray(_) => WireType::IntegerArray,
            Value::StringArray(_) => WireType::StringArray,
            Value::Array(_) | Value::DictionaryArray(_) => WireType::Array,
            Value::ObjectArray(_) => WireType::ObjectArray,
            Value::Dictionary(_) => WireType::Dictionary,
            Value::EventData(_) => WireType::EventData,
            Value::OperationRequest(_) => WireType::OperationRequest,
            Value::OperationResponse(_) => WireType::OperationResponse,
        }
    }

    /// Short name of the variant
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::DictionaryArray(_) => "dictionary array",
            other => other.wire_type().name(),
        }
    }

    /// Returns true for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer variant widened to `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Either float variant widened to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Byte array payload
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::ByteArray(b) => Some(b),
            _ => None,
        }
    }

    /// Elements of an [`Value::Array`] or [`Value::ObjectArray`]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::ObjectArray(items) => Some(items),
            _ => None,
        }
    }

    /// Dictionary payload
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Event payload
    pub fn as_event(&self) -> Option<&EventData> {
        match self {
            Value::EventData(e) => Some(e),
            _ => None,
        }
    }

    /// Request payload
    pub fn as_request(&self) -> Option<&OperationRequest> {
        match self {
            Value::OperationRequest(r) => Some(r),
            _ => None,
        }
    }

    /// Response payload
    pub fn as_response(&self) -> Option<&OperationResponse> {
        match self {
            Value::OperationResponse(r) => Some(r),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::ByteArray(a), Value::ByteArray(b)) => a == b,
            (Value::IntArray(a), Value::IntArray(b)) => a == b,
            (Value::StringArray(a), Value::StringArray(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::ObjectArray(a), Value::ObjectArray(b)) => a == b,
            (Value::Dictionary(a), Value::Dictionary(b)) => a == b,
            (Value::DictionaryArray(a), Value::DictionaryArray(b)) => a == b,
            (Value::EventData(a), Value::EventData(b)) => a == b,
            (Value::OperationRequest(a), Value::OperationRequest(b)) => a == b,
            (Value::OperationResponse(a), Value::OperationResponse(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Byte(v) => v.hash(state),
            Value::Short(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::ByteArray(v) => v.hash(state),
            Value::IntArray(v) => v.hash(state),
            Value::StringArray(v) => v.hash(state),
            Value::Array(v) | Value::ObjectArray(v) => v.hash(state),
            Value::Dictionary(v) => v.hash(state),
            Value::DictionaryArray(v) => v.hash(state),
            Value::EventData(v) => v.hash(state),
            Value::OperationRequest(v) => v.hash(state),
            Value::OperationResponse(v) => v.hash(state),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    u8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    &str => String,
    Bytes => ByteArray,
    Vec<i32> => IntArray,
    Dictionary => Dictionary,
    EventData => EventData,
    OperationRequest => OperationRequest,
    OperationResponse => OperationResponse,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}b", v),
            Value::Short(v) => write!(f, "{}s", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Float(v) => write!(f, "{}f", v),
            Value::Double(v) => write!(f, "{}d", v),
            Value::String(v) => write!(f, "{:?}", v),
            Value::ByteArray(v) => {
                f.write_str("0x")?;
                for byte in v.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::IntArray(v) => write_list(f, v.iter()),
            Value::StringArray(v) => write_list(f, v.iter().map(|s| format!("{:?}", s))),
            Value::Array(v) => write_list(f, v.iter()),
            Value::ObjectArray(v) => {
                f.write_str("obj")?;
                write_list(f, v.iter())
            }
            Value::Dictionary(d) => write!(f, "{}", d),
            Value::DictionaryArray(v) => write_list(f, v.iter()),
            Value::EventData(e) => {
                write!(f, "event({}) ", e.code)?;
                write_params(f, &e.params)
            }
            Value::OperationRequest(r) => {
                write!(f, "request({}) ", r.code)?;
                write_params(f, &r.params)
            }
            Value::OperationResponse(r) => {
                write!(f, "response({}, return={}", r.code, r.return_code)?;
                if !r.debug_message.is_empty() {
                    write!(f, ", debug={:?}", r.debug_message)?;
                }
                f.write_str(") ")?;
                write_params(f, &r.params)
            }
        }
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render entries sorted so output is stable across runs.
        let mut entries: Vec<String> = self
            .0
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        entries.sort();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

fn write_list<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &ParamTable) -> fmt::Result {
    f.write_str("{")?;
    for (i, (code, value)) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: {}", code, value)?;
    }
    f.write_str("}")
}
