//! Value unwrapping

use crate::error::{Error, Result};
use crate::schema::{LogicalType, Schema, SchemaKind, Struct, Value};
use crate::types::{JsonObject, JsonValue};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use std::str::FromStr;

/// Convert a record value into a plain document map.
///
/// `schema` is the record's value schema, if it has one. Schemaless values
/// must already be maps (or self-describing structs).
pub fn to_document_map(value: &Value, schema: Option<&Schema>) -> Result<JsonObject> {
    match (value, schema) {
        (Value::Map(entries), None) => map_to_object(entries),
        (Value::Struct(record), schema) => {
            let schema = schema.unwrap_or_else(|| record.schema());
            if !schema.is_struct() {
                return Err(Error::unsupported_root(schema.describe()));
            }
            struct_to_object(record, schema)
        }
        (Value::Map(_), Some(schema)) => Err(Error::unhandled(schema.describe(), "map")),
        (other, _) => Err(Error::unsupported_root(other.kind_name())),
    }
}

/// Unwrap any value into plain JSON, checking it against `schema` when given
pub fn unwrap_value(value: &Value, schema: Option<&Schema>) -> Result<JsonValue> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Struct(record) => {
            let schema = match schema {
                Some(schema) if !schema.is_struct() => {
                    return Err(Error::unhandled(schema.describe(), "struct"))
                }
                Some(schema) => schema,
                None => record.schema(),
            };
            Ok(JsonValue::Object(struct_to_object(record, schema)?))
        }
        Value::Array(items) => {
            let element = match schema {
                Some(schema) => Some(
                    schema
                        .element()
                        .ok_or_else(|| Error::unhandled(schema.describe(), "array"))?,
                ),
                None => None,
            };
            let items = items
                .iter()
                .map(|item| unwrap_value(item, element))
                .collect::<Result<Vec<_>>>()?;
            Ok(JsonValue::Array(items))
        }
        Value::Map(entries) => match schema {
            Some(schema) => Err(Error::unhandled(schema.describe(), "map")),
            None => Ok(JsonValue::Object(map_to_object(entries)?)),
        },
        leaf => {
            if let Some(schema) = schema {
                if !fits(leaf, schema) {
                    return Err(Error::unhandled(schema.describe(), leaf.kind_name()));
                }
            }
            leaf_to_json(leaf)
        }
    }
}

fn struct_to_object(record: &Struct, schema: &Schema) -> Result<JsonObject> {
    let mut object = JsonObject::new();
    for field in schema.fields().unwrap_or_default() {
        let value = record.get(&field.name).unwrap_or(&Value::Null);
        object.insert(field.name.clone(), unwrap_value(value, Some(&field.schema))?);
    }
    Ok(object)
}

fn map_to_object(entries: &IndexMap<String, Value>) -> Result<JsonObject> {
    let mut object = JsonObject::new();
    for (key, value) in entries {
        object.insert(key.clone(), unwrap_value(value, None)?);
    }
    Ok(object)
}

/// Check a leaf value against a primitive schema. Narrow numbers fit any
/// wider schema of the same family.
fn fits(value: &Value, schema: &Schema) -> bool {
    match (schema.logical, &schema.kind) {
        (Some(LogicalType::Decimal { .. }), _) => matches!(
            value,
            Value::Decimal(_)
                | Value::BigInt(_)
                | Value::Int8(_)
                | Value::Int16(_)
                | Value::Int32(_)
                | Value::Int64(_)
        ),
        (Some(LogicalType::Timestamp), _) => matches!(value, Value::Timestamp(_)),
        (None, SchemaKind::Boolean) => matches!(value, Value::Boolean(_)),
        (None, SchemaKind::Int8) => matches!(value, Value::Int8(_)),
        (None, SchemaKind::Int16) => matches!(value, Value::Int8(_) | Value::Int16(_)),
        (None, SchemaKind::Int32) => {
            matches!(value, Value::Int8(_) | Value::Int16(_) | Value::Int32(_))
        }
        (None, SchemaKind::Int64) => matches!(
            value,
            Value::Int8(_) | Value::Int16(_) | Value::Int32(_) | Value::Int64(_)
        ),
        (None, SchemaKind::Float32) => matches!(value, Value::Float32(_)),
        (None, SchemaKind::Float64) => matches!(value, Value::Float32(_) | Value::Float64(_)),
        (None, SchemaKind::String) => matches!(value, Value::String(_)),
        (None, SchemaKind::Bytes) => matches!(value, Value::Bytes(_)),
        (None, SchemaKind::Array(_) | SchemaKind::Struct(_)) => false,
    }
}

fn leaf_to_json(value: &Value) -> Result<JsonValue> {
    let json = match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Int8(v) => JsonValue::from(*v),
        Value::Int16(v) => JsonValue::from(*v),
        Value::Int32(v) => JsonValue::from(*v),
        Value::Int64(v) => JsonValue::from(*v),
        // shortest text that round-trips the f32, not its f64 widening
        Value::Float32(v) if v.is_finite() => number(&format!("{v:?}"))?,
        Value::Float64(v) if v.is_finite() => number(&format!("{v:?}"))?,
        Value::Float32(_) | Value::Float64(_) => JsonValue::Null,
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bytes(bytes) => JsonValue::String(STANDARD.encode(bytes)),
        Value::BigInt(v) => number(&v.to_string())?,
        Value::Decimal(v) => number(&v.to_string())?,
        Value::Timestamp(ts) => JsonValue::from(ts.timestamp_millis()),
        Value::Array(_) | Value::Map(_) | Value::Struct(_) => {
            return Err(Error::unhandled("leaf", value.kind_name()))
        }
    };
    Ok(json)
}

fn number(text: &str) -> Result<JsonValue> {
    serde_json::Number::from_str(text)
        .map(JsonValue::Number)
        .map_err(|_| Error::InvalidNumber {
            text: text.to_string(),
        })
}
