//! Extensible value tree traversal.
//!
//! This module provides the [`ValueVisitor`] trait for inspecting decoded
//! values without matching on every variant by hand, plus [`walk`] which
//! drives a visitor depth-first over a tree.

use super::value::{Dictionary, ParamTable, Value};

/// Callbacks invoked by [`walk`].
///
/// Every method has a no-op default, so implementors only override what
/// they care about.
///
/// # Example
///
/// ```
/// use photon16_core::{walk, Value, ValueVisitor};
///
/// #[derive(Default)]
/// struct StringCollector(Vec<String>);
///
/// impl ValueVisitor for StringCollector {
///     fn visit_scalar(&mut self, value: &Value, _depth: usize) {
///         if let Some(s) = value.as_str() {
///             self.0.push(s.to_string());
///         }
///     }
/// }
///
/// let mut collector = StringCollector::default();
/// walk(&Value::Array(vec!["a".into(), "b".into()]), &mut collector);
/// assert_eq!(collector.0, ["a", "b"]);
/// ```
pub trait ValueVisitor {
    /// Called for null, booleans, numbers, strings and byte arrays
    fn visit_scalar(&mut self, value: &Value, depth: usize) {
        let _ = (value, depth);
    }

    /// Called for integer and string arrays with their element count
    fn visit_primitive_array(&mut self, value: &Value, len: usize, depth: usize) {
        let _ = (value, len, depth);
    }

    /// Called before the elements of an array or object array
    fn enter_array(&mut self, value: &Value, len: usize, depth: usize) {
        let _ = (value, len, depth);
    }

    /// Called before the entries of a dictionary
    fn enter_dictionary(&mut self, dictionary: &Dictionary, depth: usize) {
        let _ = (dictionary, depth);
    }

    /// Called before the parameters of an event, request or response
    fn enter_record(&mut self, value: &Value, params: &ParamTable, depth: usize) {
        let _ = (value, params, depth);
    }
}

/// A visitor that ignores everything
pub struct NullVisitor;

impl ValueVisitor for NullVisitor {}

/// A visitor that collects statistics about a value tree
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsVisitor {
    /// Null, boolean, numeric and string values
    pub scalars: usize,
    /// Byte arrays
    pub byte_arrays: usize,
    /// Total bytes held in byte arrays
    pub byte_array_bytes: usize,
    /// Integer and string arrays
    pub primitive_arrays: usize,
    /// Arrays and object arrays
    pub arrays: usize,
    /// Dictionaries, including members of dictionary arrays
    pub dictionaries: usize,
    /// Events, requests and responses
    pub records: usize,
    /// Deepest nesting level seen (the root is 0)
    pub max_depth: usize,
}

impl StatsVisitor {
    fn saw_depth(&mut self, depth: usize) {
        self.max_depth = self.max_depth.max(depth);
    }
}

impl ValueVisitor for StatsVisitor {
    fn visit_scalar(&mut self, value: &Value, depth: usize) {
        self.saw_depth(depth);
        match value.as_bytes() {
            Some(bytes) => {
                self.byte_arrays += 1;
                self.byte_array_bytes += bytes.len();
            }
            None => self.scalars += 1,
        }
    }

    fn visit_primitive_array(&mut self, _value: &Value, _len: usize, depth: usize) {
        self.saw_depth(depth);
        self.primitive_arrays += 1;
    }

    fn enter_array(&mut self, _value: &Value, _len: usize, depth: usize) {
        self.saw_depth(depth);
        self.arrays += 1;
    }

    fn enter_dictionary(&mut self, _dictionary: &Dictionary, depth: usize) {
        self.saw_depth(depth);
        self.dictionaries += 1;
    }

    fn enter_record(&mut self, _value: &Value, _params: &ParamTable, depth: usize) {
        self.saw_depth(depth);
        self.records += 1;
    }
}

/// Walks `value` depth-first, calling into `visitor`
pub fn walk(value: &Value, visitor: &mut impl ValueVisitor) {
    walk_at(value, visitor, 0);
}

fn walk_at<V: ValueVisitor>(value: &Value, visitor: &mut V, depth: usize) {
    match value {
        Value::IntArray(items) => visitor.visit_primitive_array(value, items.len(), depth),
        Value::StringArray(items) => visitor.visit_primitive_array(value, items.len(), depth),
        Value::Array(items) | Value::ObjectArray(items) => {
            visitor.enter_array(value, items.len(), depth);
            for item in items {
                walk_at(item, visitor, depth + 1);
            }
        }
        Value::Dictionary(dictionary) => walk_dictionary(dictionary, visitor, depth),
        Value::DictionaryArray(dictionaries) => {
            visitor.enter_array(value, dictionaries.len(), depth);
            for dictionary in dictionaries {
                walk_dictionary(dictionary, visitor, depth + 1);
            }
        }
        Value::EventData(event) => walk_record(value, &event.params, visitor, depth),
        Value::OperationRequest(request) => walk_record(value, &request.params, visitor, depth),
        Value::OperationResponse(response) => {
            walk_record(value, &response.params, visitor, depth)
        }
        _ => visitor.visit_scalar(value, depth),
    }
}

fn walk_dictionary<V: ValueVisitor>(dictionary: &Dictionary, visitor: &mut V, depth: usize) {
    visitor.enter_dictionary(dictionary, depth);
    for (key, value) in dictionary {
        walk_at(key, visitor, depth + 1);
        walk_at(value, visitor, depth + 1);
    }
}

fn walk_record<V: ValueVisitor>(value: &Value, params: &ParamTable, visitor: &mut V, depth: usize) {
    visitor.enter_record(value, params, depth);
    for param in params.values() {
        walk_at(param, visitor, depth + 1);
    }
}
