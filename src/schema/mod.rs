//! Typed schema module
//!
//! Describes the shape of converted documents and the values that
//! conform to those shapes.
//!
//! # Overview
//!
//! - [`Schema`] - recursive tagged union: primitive kind, array-of, or struct
//!   with fields sorted by name. Every schema carries an `optional` flag.
//! - [`Value`] - a value conforming to a schema, or a schemaless map
//! - [`Struct`] - a record whose field set always matches its schema

mod types;
mod value;

pub use types::{Field, LogicalType, Schema, SchemaKind};
pub use value::{Struct, Value};
