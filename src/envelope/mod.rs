//! Schema + payload envelope codec
//!
//! Records travel on the wire as `{"schema": ..., "payload": ...}`. The
//! schema is self-describing (`type`, `optional`, `fields`, `items`, plus
//! `name`/`parameters` for logical types) so a consumer can rebuild the
//! typed value without any registry. A null schema marks a schemaless
//! record whose payload is a plain JSON mapping.

mod codec;
mod types;

pub use codec::{payload_from_json, schema_from_json, schema_to_json, Envelope};
pub use types::SchemaJson;
