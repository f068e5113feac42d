// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # couch-connect
//!
//! Connects a CouchDB-style document store to a streaming platform. The
//! core is a schema inference engine that turns schemaless JSON documents
//! into typed schemas and structured values, and turns structured values
//! back into plain documents.
//!
//! ## Features
//!
//! - **Schema inference**: Narrowest numeric types, sorted struct fields,
//!   merged array element structs
//! - **Two strategies**: Nested structs or flattened dotted paths
//! - **Bridge**: Structured or schemaless values back to document maps
//! - **Envelope codec**: Self-describing `{"schema", "payload"}` JSON
//! - **Arrow Output**: Typed records as Arrow RecordBatches
//! - **Tasks**: Change-feed source and bulk-write sink
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use couch_connect::convert::{Converted, Converter};
//! use couch_connect::envelope::Envelope;
//!
//! let doc = serde_json::json!({"_id": "a", "qty": 3, "tags": ["x"]});
//! if let Converted::Structured { schema, value } = Converter::default().convert(&doc)? {
//!     println!("{}", Envelope::new(Some(schema), value).to_json()?);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   changes    ┌────────────┐  Converter   ┌──────────────┐
//! │ ChangeFeed   │ ───────────▶ │ SourceTask │ ───────────▶ │ SourceRecord │
//! └──────────────┘              └────────────┘              └──────────────┘
//! ┌──────────────┐  bulk_write  ┌────────────┐    bridge    ┌──────────────┐
//! │ DocumentStore│ ◀─────────── │  SinkTask  │ ◀─────────── │  SinkRecord  │
//! └──────────────┘              └────────────┘              └──────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Configuration
pub mod config;

/// Typed schemas and structured values
pub mod schema;

/// JSON to typed value conversion engine
pub mod convert;

/// Structured value to document map bridge
pub mod bridge;

/// Schema + payload envelope codec
pub mod envelope;

/// Arrow output
pub mod output;

/// Document model
pub mod document;

/// Source and sink tasks
pub mod connector;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{ConnectorConfig, ConverterConfig};
pub use convert::{Converted, Converter};
pub use schema::{Schema, Value};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
