//! Structured value → plain map bridge
//!
//! Used on the write path: record values, typed or schemaless, are unwrapped
//! into plain nested JSON maps that the document store accepts.
//!
//! # Overview
//!
//! - With a struct schema, fields are emitted in schema order and nested
//!   structs and arrays are unwrapped recursively
//! - Without a schema, the value must already be a mapping; nested
//!   structured values inside it are unwrapped
//! - Anything else at the root is an [`crate::Error::UnsupportedRootValue`]

mod unwrap;

pub use unwrap::{to_document_map, unwrap_value};
