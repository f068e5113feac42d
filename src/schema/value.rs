//! Structured values conforming to a typed schema

use super::types::{Field, Schema};
use crate::error::{Error, Result};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// A value conforming to a typed schema, or a schemaless nested map
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Integer too wide for 64 bits
    BigInt(BigInt),
    /// Arbitrary precision decimal
    Decimal(BigDecimal),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    /// Schemaless mapping, kept in insertion order
    Map(IndexMap<String, Value>),
    Struct(Struct),
}

impl Value {
    /// Name of the value's runtime kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::BigInt(_) => "bigint",
            Value::Decimal(_) => "decimal",
            Value::Timestamp(_) => "timestamp",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Widen a numeric value to a 64-bit float
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int8(v) => Some(f64::from(*v)),
            Value::Int16(v) => Some(f64::from(*v)),
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => Some(*v as f64),
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            Value::BigInt(v) => v.to_f64(),
            Value::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    /// Borrow a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow a struct value
    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow array elements
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// A record of named fields whose field set matches its struct schema.
///
/// Every declared field has a slot; unset fields hold [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub struct Struct {
    schema: Schema,
    values: Vec<Value>,
}

impl Struct {
    /// Create an empty struct for a struct schema
    pub fn new(schema: Schema) -> Result<Self> {
        let len = match schema.fields() {
            Some(fields) => fields.len(),
            None => return Err(Error::unhandled("struct", schema.describe())),
        };
        Ok(Self {
            schema,
            values: vec![Value::Null; len],
        })
    }

    /// Set a field value
    pub fn put(&mut self, name: &str, value: Value) -> Result<()> {
        let index = self
            .schema
            .field_index(name)
            .ok_or_else(|| Error::unhandled(self.schema.describe(), format!("field '{name}'")))?;
        self.values[index] = value;
        Ok(())
    }

    /// Builder-style variant of [`Struct::put`]
    pub fn with(mut self, name: &str, value: Value) -> Result<Self> {
        self.put(name, value)?;
        Ok(self)
    }

    /// Get a field value; `None` if the schema has no such field
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.schema.field_index(name)?;
        self.values.get(index)
    }

    /// The struct's schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Split into the schema and the field values in schema order
    pub fn into_parts(self) -> (Schema, Vec<Value>) {
        (self.schema, self.values)
    }

    /// Iterate over fields and their values in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&Field, &Value)> {
        self.schema
            .fields()
            .unwrap_or_default()
            .iter()
            .zip(self.values.iter())
    }
}
