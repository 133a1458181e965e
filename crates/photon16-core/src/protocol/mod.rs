//! protocol16 data model.
//!
//! - [`WireType`]: the closed set of one-byte type tags
//! - [`Value`]: the decoded value tree, with the [`EventData`],
//!   [`OperationRequest`] and [`OperationResponse`] records that ride on it
//! - [`ValueVisitor`]: depth-first traversal of a decoded tree

mod value;
mod visit;
mod wire;

pub use value::{Dictionary, EventData, OperationRequest, OperationResponse, ParamTable, Value};
pub use visit::{walk, NullVisitor, StatsVisitor, ValueVisitor};
pub use wire::WireType;
