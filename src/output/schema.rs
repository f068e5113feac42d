//! Typed schema to Arrow schema mapping

use crate::error::{Error, Result};
use crate::schema::{LogicalType, Schema, SchemaKind};
use arrow::datatypes::{
    DataType, Field as ArrowField, Fields, Schema as ArrowSchema, TimeUnit,
};
use std::sync::Arc;

/// Precision used for every decimal column
pub const DECIMAL_PRECISION: u8 = 38;

/// Time zone attached to timestamp columns
pub const TIMESTAMP_ZONE: &str = "UTC";

/// Arrow schema for a batch of records sharing `schema`.
///
/// The root must be a struct; its fields become the batch columns.
pub fn arrow_schema(schema: &Schema) -> Result<ArrowSchema> {
    let fields = schema
        .fields()
        .ok_or_else(|| Error::unsupported_root(schema.describe()))?;
    let columns = fields
        .iter()
        .map(|field| arrow_field(&field.name, &field.schema))
        .collect::<Result<Vec<_>>>()?;
    Ok(ArrowSchema::new(columns))
}

/// Arrow field for one named schema
pub fn arrow_field(name: &str, schema: &Schema) -> Result<ArrowField> {
    Ok(ArrowField::new(name, data_type(schema)?, schema.optional))
}

/// Arrow data type for a schema
pub fn data_type(schema: &Schema) -> Result<DataType> {
    match schema.logical {
        Some(LogicalType::Decimal { scale }) => {
            return Ok(DataType::Decimal128(DECIMAL_PRECISION, decimal_scale(scale)?))
        }
        Some(LogicalType::Timestamp) => {
            return Ok(DataType::Timestamp(
                TimeUnit::Millisecond,
                Some(TIMESTAMP_ZONE.into()),
            ))
        }
        None => {}
    }

    let data_type = match &schema.kind {
        SchemaKind::Boolean => DataType::Boolean,
        SchemaKind::Int8 => DataType::Int8,
        SchemaKind::Int16 => DataType::Int16,
        SchemaKind::Int32 => DataType::Int32,
        SchemaKind::Int64 => DataType::Int64,
        SchemaKind::Float32 => DataType::Float32,
        SchemaKind::Float64 => DataType::Float64,
        SchemaKind::String => DataType::Utf8,
        SchemaKind::Bytes => DataType::Binary,
        SchemaKind::Array(element) => DataType::List(Arc::new(arrow_field("item", element)?)),
        SchemaKind::Struct(fields) => DataType::Struct(Fields::from(
            fields
                .iter()
                .map(|field| arrow_field(&field.name, &field.schema))
                .collect::<Result<Vec<_>>>()?,
        )),
    };
    Ok(data_type)
}

pub(super) fn decimal_scale(scale: i64) -> Result<i8> {
    i8::try_from(scale).map_err(|_| Error::Output {
        message: format!("Decimal scale {scale} does not fit decimal128"),
    })
}
