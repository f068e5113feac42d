//! Conversion engine
//!
//! Turns parsed JSON documents into typed schemas and structured values.
//!
//! # Overview
//!
//! A single recursive walk classifies every JSON value. Leaves are narrowed
//! and described by a primitive schema; objects and arrays are handled by
//! the strategy chosen at the top:
//!
//! - [`Strategy::Nest`] - objects become structs with fields sorted by name,
//!   arrays become array schemas, merging divergent struct elements
//! - [`Strategy::Flatten`] - every leaf is emitted under a dotted/indexed path
//!   into one flat mapping
//!
//! With `use_structured_schema` disabled the engine produces a schemaless
//! map with narrowed numbers instead.
//!
//! The walk keeps an explicit depth counter so deeply nested input fails
//! with [`Error::DepthExceeded`] instead of exhausting the stack.

mod flatten;
mod merge;
mod nested;
mod numeric;

pub use crate::config::Strategy;
pub use flatten::{FlatEntry, FlatRecord};
pub use merge::{merge_structs, remap};
pub use numeric::{leaf_schema, narrow_integer, narrow_json, narrow_str, narrow_value};
pub(crate) use numeric::parse_decimal;

use crate::config::ConverterConfig;
use crate::error::{Error, Result};
use crate::schema::{Schema, Value};
use crate::types::JsonValue;
use indexmap::IndexMap;

/// Output of converting one document
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    /// Typed schema and a value conforming to it
    Structured { schema: Schema, value: Value },
    /// Flat path → (schema, value) mapping
    Flattened(FlatRecord),
    /// Schemaless value with narrowed numbers
    Schemaless(Value),
}

impl Converted {
    /// Schema and value for the record boundary. Flattened output becomes a
    /// root struct with one field per path; schemaless output has no schema.
    pub fn into_record(self) -> Result<(Option<Schema>, Value)> {
        match self {
            Converted::Structured { schema, value } => Ok((Some(schema), value)),
            Converted::Flattened(flat) => {
                let (schema, value) = flat.into_struct()?;
                Ok((Some(schema), value))
            }
            Converted::Schemaless(value) => Ok((None, value)),
        }
    }
}

/// Stateless converter built from an immutable configuration
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    /// Create a converter
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// The converter's configuration
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert one parsed JSON document
    pub fn convert(&self, document: &JsonValue) -> Result<Converted> {
        if !self.config.use_structured_schema {
            return Ok(Converted::Schemaless(self.schemaless(document, 0)?));
        }

        let mut walk = Walk::new(self.config.strategy(), self.config.max_depth);
        let leaf = self.classify(document, &mut walk)?;

        match walk.strategy {
            Strategy::Nest => {
                let (schema, value) = match leaf {
                    Some(pair) => pair,
                    None => (Schema::NULL_SENTINEL, Value::Null),
                };
                Ok(Converted::Structured { schema, value })
            }
            Strategy::Flatten => {
                if let Some((schema, value)) = leaf {
                    walk.emit(schema, value)?;
                }
                Ok(Converted::Flattened(walk.flat))
            }
        }
    }

    /// Convert a JSON value to a schemaless value with narrowed numbers,
    /// whatever the configured strategy
    pub fn convert_schemaless(&self, json: &JsonValue) -> Result<Value> {
        self.schemaless(json, 0)
    }

    /// Classify one JSON value.
    ///
    /// Returns the leaf or nested (schema, value) pair, or `None` when the
    /// flatten strategy already emitted the value's leaves.
    fn classify(&self, json: &JsonValue, walk: &mut Walk) -> Result<Option<(Schema, Value)>> {
        match json {
            JsonValue::Null => Ok(Some((Schema::NULL_SENTINEL, Value::Null))),
            JsonValue::Bool(b) => leaf(Value::Boolean(*b)),
            JsonValue::Number(n) => leaf(narrow_json(n)?),
            JsonValue::String(s) => leaf(Value::String(s.clone())),
            JsonValue::Array(items) => {
                let optional = !walk.at_root();
                walk.descend()?;
                let out = match walk.strategy {
                    Strategy::Nest => Some(self.nest_array(items, optional, walk)?),
                    Strategy::Flatten => {
                        self.flatten_array(items, walk)?;
                        None
                    }
                };
                walk.ascend();
                Ok(out)
            }
            JsonValue::Object(map) => {
                let optional = !walk.at_root();
                walk.descend()?;
                let out = match walk.strategy {
                    Strategy::Nest => Some(self.nest_object(map, optional, walk)?),
                    Strategy::Flatten => {
                        self.flatten_object(map, walk)?;
                        None
                    }
                };
                walk.ascend();
                Ok(out)
            }
        }
    }

    fn schemaless(&self, json: &JsonValue, depth: usize) -> Result<Value> {
        if matches!(json, JsonValue::Array(_) | JsonValue::Object(_))
            && depth >= self.config.max_depth
        {
            return Err(Error::DepthExceeded {
                max_depth: self.config.max_depth,
            });
        }
        let value = match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(*b),
            JsonValue::Number(n) => narrow_json(n)?,
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.schemaless(item, depth + 1))
                    .collect::<Result<_>>()?,
            ),
            JsonValue::Object(map) => {
                let mut entries = IndexMap::with_capacity(map.len());
                for (key, child) in map {
                    entries.insert(key.clone(), self.schemaless(child, depth + 1)?);
                }
                Value::Map(entries)
            }
        };
        Ok(value)
    }
}

fn leaf(value: Value) -> Result<Option<(Schema, Value)>> {
    let schema = leaf_schema(&value)?;
    Ok(Some((schema, value)))
}

/// Traversal state threaded through the recursive walk
#[derive(Debug)]
struct Walk {
    strategy: Strategy,
    max_depth: usize,
    depth: usize,
    path: Vec<String>,
    flat: FlatRecord,
}

impl Walk {
    fn new(strategy: Strategy, max_depth: usize) -> Self {
        Self {
            strategy,
            max_depth,
            depth: 0,
            path: Vec::new(),
            flat: FlatRecord::new(),
        }
    }

    fn at_root(&self) -> bool {
        self.depth == 0
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::DepthExceeded {
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn push(&mut self, segment: impl Into<String>) {
        self.path.push(segment.into());
    }

    fn pop(&mut self) {
        self.path.pop();
    }

    fn path_string(&self) -> String {
        self.path.join(".")
    }

    /// Path for error messages
    fn location(&self) -> String {
        if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path_string()
        }
    }

    fn emit(&mut self, schema: Schema, value: Value) -> Result<()> {
        let path = self.path_string();
        self.flat.insert(path, schema, value)
    }
}

#[cfg(test)]
mod tests;
