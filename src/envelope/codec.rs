//! Envelope encoding and decoding

use super::types::SchemaJson;
use crate::bridge::unwrap_value;
use crate::convert::{parse_decimal, Converter};
use crate::error::{Error, Result};
use crate::schema::{Field, LogicalType, Schema, SchemaKind, Struct, Value};
use crate::types::JsonValue;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

/// Prefix shared by the logical type names this crate understands
const LOGICAL_PREFIX: &str = "org.apache.kafka.connect.data.";

/// Largest decimal scale, either sign, a payload is rescaled to
const MAX_DECIMAL_SCALE: u64 = 1024;

/// A record value with its optional schema, as carried on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub schema: Option<Schema>,
    pub payload: Value,
}

impl Envelope {
    /// Create an envelope
    pub fn new(schema: Option<Schema>, payload: Value) -> Self {
        Self { schema, payload }
    }

    /// Encode as `{"schema": ..., "payload": ...}`
    pub fn to_json(&self) -> Result<JsonValue> {
        let schema = match &self.schema {
            Some(schema) => serde_json::to_value(schema_to_json(schema))?,
            None => JsonValue::Null,
        };
        let payload = unwrap_value(&self.payload, self.schema.as_ref())?;

        let mut object = serde_json::Map::new();
        object.insert("schema".to_string(), schema);
        object.insert("payload".to_string(), payload);
        Ok(JsonValue::Object(object))
    }

    /// Decode an envelope. A null or missing schema decodes the payload
    /// schemalessly, narrowing its numbers.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::unhandled("envelope", json_kind(json)))?;

        let payload = object.get("payload").unwrap_or(&JsonValue::Null);
        match object.get("schema") {
            None | Some(JsonValue::Null) => {
                let value = Converter::default().convert_schemaless(payload)?;
                Ok(Self::new(None, value))
            }
            Some(schema_json) => {
                let wire: SchemaJson = serde_json::from_value(schema_json.clone())?;
                let schema = schema_from_json(&wire)?;
                let value = payload_from_json(payload, &schema)?;
                Ok(Self::new(Some(schema), value))
            }
        }
    }

    /// Parse and decode an envelope from text
    pub fn parse(text: &str) -> Result<Self> {
        let json: JsonValue = serde_json::from_str(text)?;
        Self::from_json(&json)
    }
}

/// Describe a schema in wire form
pub fn schema_to_json(schema: &Schema) -> SchemaJson {
    let mut wire = SchemaJson::new(schema.kind.type_name(), schema.optional);

    match schema.logical {
        Some(LogicalType::Decimal { scale }) => {
            wire.name = Some(LogicalType::DECIMAL_NAME.to_string());
            let mut parameters = BTreeMap::new();
            parameters.insert("scale".to_string(), JsonValue::String(scale.to_string()));
            wire.parameters = Some(parameters);
        }
        Some(LogicalType::Timestamp) => {
            wire.name = Some(LogicalType::TIMESTAMP_NAME.to_string());
        }
        None => {}
    }

    match &schema.kind {
        SchemaKind::Array(element) => wire.items = Some(Box::new(schema_to_json(element))),
        SchemaKind::Struct(fields) => {
            wire.fields = Some(
                fields
                    .iter()
                    .map(|field| {
                        let mut child = schema_to_json(&field.schema);
                        child.field = Some(field.name.clone());
                        child
                    })
                    .collect(),
            );
        }
        _ => {}
    }

    wire
}

/// Build a schema from its wire form
pub fn schema_from_json(wire: &SchemaJson) -> Result<Schema> {
    let kind = match wire.type_name.as_str() {
        "array" => {
            let items = wire
                .items
                .as_deref()
                .ok_or_else(|| Error::missing_field("items"))?;
            SchemaKind::Array(Box::new(schema_from_json(items)?))
        }
        "struct" => {
            let mut fields = Vec::new();
            for child in wire.fields.as_deref().unwrap_or_default() {
                let name = child
                    .field
                    .clone()
                    .ok_or_else(|| Error::missing_field("field"))?;
                fields.push(Field::new(name, schema_from_json(child)?));
            }
            return Ok(Schema::structure(fields, wire.optional));
        }
        other => SchemaKind::primitive_from_name(other)
            .ok_or_else(|| Error::unknown_type(other.to_string()))?,
    };

    let logical = match wire.name.as_deref() {
        Some(LogicalType::DECIMAL_NAME) if kind == SchemaKind::Bytes => {
            Some(LogicalType::Decimal {
                scale: decimal_scale(wire)?,
            })
        }
        Some(LogicalType::TIMESTAMP_NAME) if kind == SchemaKind::Int64 => {
            Some(LogicalType::Timestamp)
        }
        Some(name) if name.starts_with(LOGICAL_PREFIX) => {
            return Err(Error::unknown_type(format!("{name} ({})", wire.type_name)))
        }
        _ => None,
    };

    Ok(Schema {
        kind,
        optional: wire.optional,
        logical,
    })
}

fn decimal_scale(wire: &SchemaJson) -> Result<i64> {
    let scale = wire
        .parameters
        .as_ref()
        .and_then(|p| p.get("scale"))
        .ok_or_else(|| Error::missing_field("parameters.scale"))?;
    let parsed = match scale {
        JsonValue::String(s) => s.parse::<i64>().ok(),
        JsonValue::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::unhandled("decimal scale", json_kind(scale)))
}

/// Decode a payload against its schema
pub fn payload_from_json(json: &JsonValue, schema: &Schema) -> Result<Value> {
    if json.is_null() {
        if schema.optional {
            return Ok(Value::Null);
        }
        return Err(Error::unhandled(schema.describe(), "null"));
    }

    let mismatch = || Error::unhandled(schema.describe(), json_kind(json));

    if let Some(logical) = schema.logical {
        return match logical {
            LogicalType::Decimal { scale } => {
                let text = match json {
                    JsonValue::Number(n) => n.to_string(),
                    JsonValue::String(s) => s.clone(),
                    _ => return Err(mismatch()),
                };
                if scale.unsigned_abs() > MAX_DECIMAL_SCALE {
                    return Err(Error::unhandled(schema.describe(), "decimal scale"));
                }
                let decimal = parse_decimal(&text).map_err(|_| mismatch())?;
                if scale == 0 && decimal.is_integer() {
                    let (int, _) = decimal.with_scale(0).into_bigint_and_exponent();
                    Ok(Value::BigInt(int))
                } else {
                    Ok(Value::Decimal(decimal.with_scale(scale)))
                }
            }
            LogicalType::Timestamp => {
                let millis = json.as_i64().ok_or_else(mismatch)?;
                let ts = Utc
                    .timestamp_millis_opt(millis)
                    .single()
                    .ok_or_else(mismatch)?;
                Ok(Value::Timestamp(ts))
            }
        };
    }

    let value = match &schema.kind {
        SchemaKind::Boolean => Value::Boolean(json.as_bool().ok_or_else(mismatch)?),
        SchemaKind::Int8 => Value::Int8(integer(json).ok_or_else(mismatch)?),
        SchemaKind::Int16 => Value::Int16(integer(json).ok_or_else(mismatch)?),
        SchemaKind::Int32 => Value::Int32(integer(json).ok_or_else(mismatch)?),
        SchemaKind::Int64 => Value::Int64(json.as_i64().ok_or_else(mismatch)?),
        #[allow(clippy::cast_possible_truncation)]
        SchemaKind::Float32 => Value::Float32(json.as_f64().ok_or_else(mismatch)? as f32),
        SchemaKind::Float64 => Value::Float64(json.as_f64().ok_or_else(mismatch)?),
        SchemaKind::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_string()),
        SchemaKind::Bytes => {
            let text = json.as_str().ok_or_else(mismatch)?;
            Value::Bytes(STANDARD.decode(text).map_err(|_| mismatch())?)
        }
        SchemaKind::Array(element) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            Value::Array(
                items
                    .iter()
                    .map(|item| payload_from_json(item, element))
                    .collect::<Result<_>>()?,
            )
        }
        SchemaKind::Struct(fields) => {
            let object = json.as_object().ok_or_else(mismatch)?;
            let mut record = Struct::new(schema.clone())?;
            for field in fields {
                let child = object.get(&field.name).unwrap_or(&JsonValue::Null);
                record.put(&field.name, payload_from_json(child, &field.schema)?)?;
            }
            Value::Struct(record)
        }
    };
    Ok(value)
}

fn integer<T: TryFrom<i64>>(json: &JsonValue) -> Option<T> {
    json.as_i64().and_then(|v| T::try_from(v).ok())
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
