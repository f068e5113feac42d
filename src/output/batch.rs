//! Structured values to Arrow record batches

use super::schema::{arrow_schema, data_type, decimal_scale, DECIMAL_PRECISION, TIMESTAMP_ZONE};
use crate::error::{Error, Result};
use crate::schema::{LogicalType, Schema, SchemaKind, Value};
use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Decimal128Array, Float32Array, Float64Array,
    Int16Array, Int32Array, Int64Array, Int8Array, ListArray, StringArray, StructArray,
    TimestampMillisecondArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field as ArrowField};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use bigdecimal::BigDecimal;
use std::sync::Arc;

/// Build a record batch from struct values that share `schema`.
///
/// Each row must be a struct value; each column is checked against its
/// field schema and mismatches are reported as
/// [`Error::UnhandledType`].
pub fn to_record_batch(schema: &Schema, rows: &[Value]) -> Result<RecordBatch> {
    let arrow = Arc::new(arrow_schema(schema)?);
    let fields = schema.fields().unwrap_or_default();

    let records = rows
        .iter()
        .map(|row| match row {
            Value::Struct(record) => Ok(record),
            other => Err(Error::unhandled(schema.describe(), other.kind_name())),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.len());
    for field in fields {
        let values: Vec<Option<&Value>> = records.iter().map(|r| r.get(&field.name)).collect();
        columns.push(build_array(&values, &field.schema)?);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    RecordBatch::try_new_with_options(arrow, columns, &options).map_err(|e| Error::Output {
        message: format!("Failed to create RecordBatch: {e}"),
    })
}

/// Build one column. `None` marks a slot with no value (e.g. under a null
/// parent) and always becomes a null.
fn build_array(values: &[Option<&Value>], schema: &Schema) -> Result<ArrayRef> {
    match schema.logical {
        Some(LogicalType::Decimal { scale }) => {
            let data = collect(values, schema, |v| decimal_units(v, scale))?;
            let array = Decimal128Array::from(data)
                .with_precision_and_scale(DECIMAL_PRECISION, decimal_scale(scale)?)?;
            return Ok(Arc::new(array));
        }
        Some(LogicalType::Timestamp) => {
            let data = collect(values, schema, |v| match v {
                Value::Timestamp(ts) => Some(ts.timestamp_millis()),
                _ => None,
            })?;
            let array = TimestampMillisecondArray::from(data).with_timezone(TIMESTAMP_ZONE);
            return Ok(Arc::new(array));
        }
        None => {}
    }

    let array: ArrayRef = match &schema.kind {
        SchemaKind::Boolean => Arc::new(BooleanArray::from(collect(values, schema, |v| {
            match v {
                Value::Boolean(b) => Some(*b),
                _ => None,
            }
        })?)),
        SchemaKind::Int8 => Arc::new(Int8Array::from(collect(values, schema, |v| match v {
            Value::Int8(n) => Some(*n),
            _ => None,
        })?)),
        SchemaKind::Int16 => Arc::new(Int16Array::from(collect(values, schema, |v| match v {
            Value::Int8(n) => Some(i16::from(*n)),
            Value::Int16(n) => Some(*n),
            _ => None,
        })?)),
        SchemaKind::Int32 => Arc::new(Int32Array::from(collect(values, schema, |v| match v {
            Value::Int8(n) => Some(i32::from(*n)),
            Value::Int16(n) => Some(i32::from(*n)),
            Value::Int32(n) => Some(*n),
            _ => None,
        })?)),
        SchemaKind::Int64 => Arc::new(Int64Array::from(collect(values, schema, integer)?)),
        SchemaKind::Float32 => Arc::new(Float32Array::from(collect(values, schema, |v| {
            match v {
                Value::Float32(f) => Some(*f),
                _ => None,
            }
        })?)),
        SchemaKind::Float64 => Arc::new(Float64Array::from(collect(values, schema, |v| {
            match v {
                Value::Float32(f) => Some(f64::from(*f)),
                Value::Float64(f) => Some(*f),
                _ => None,
            }
        })?)),
        SchemaKind::String => {
            let data = collect(values, schema, |v| v.as_str().map(str::to_string))?;
            Arc::new(data.into_iter().collect::<StringArray>())
        }
        SchemaKind::Bytes => {
            let data = collect(values, schema, |v| match v {
                Value::Bytes(bytes) => Some(bytes.clone()),
                _ => None,
            })?;
            Arc::new(data.into_iter().collect::<BinaryArray>())
        }
        SchemaKind::Array(element) => build_list_array(values, schema, element)?,
        SchemaKind::Struct(_) => build_struct_array(values, schema)?,
    };
    Ok(array)
}

/// Build a list array from array values
fn build_list_array(
    values: &[Option<&Value>],
    schema: &Schema,
    element: &Schema,
) -> Result<ArrayRef> {
    let mut all_items: Vec<Option<&Value>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];
    let mut validity = Vec::with_capacity(values.len());

    for value in values {
        match value {
            Some(Value::Array(items)) => {
                all_items.extend(items.iter().map(Some));
                validity.push(true);
            }
            None => validity.push(false),
            Some(Value::Null) => {
                check_null(schema)?;
                validity.push(false);
            }
            Some(other) => return Err(Error::unhandled(schema.describe(), other.kind_name())),
        }
        let offset = i32::try_from(all_items.len()).map_err(|_| Error::Output {
            message: "Array too large for i32 offset".to_string(),
        })?;
        offsets.push(offset);
    }

    let items_array = build_array(&all_items, element)?;
    let item_field = Arc::new(ArrowField::new("item", data_type(element)?, element.optional));
    let list = ListArray::try_new(
        item_field,
        OffsetBuffer::new(offsets.into()),
        items_array,
        null_buffer(validity),
    )?;
    Ok(Arc::new(list))
}

/// Build a struct array from struct values
fn build_struct_array(values: &[Option<&Value>], schema: &Schema) -> Result<ArrayRef> {
    let mut records = Vec::with_capacity(values.len());
    let mut validity = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Some(Value::Struct(record)) => {
                records.push(Some(record));
                validity.push(true);
            }
            None => {
                records.push(None);
                validity.push(false);
            }
            Some(Value::Null) => {
                check_null(schema)?;
                records.push(None);
                validity.push(false);
            }
            Some(other) => return Err(Error::unhandled(schema.describe(), other.kind_name())),
        }
    }

    let DataType::Struct(arrow_fields) = data_type(schema)? else {
        return Err(Error::unhandled("struct", schema.describe()));
    };

    let mut children: Vec<ArrayRef> = Vec::new();
    for field in schema.fields().unwrap_or_default() {
        let child_values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| record.and_then(|r| r.get(&field.name)))
            .collect();
        children.push(build_array(&child_values, &field.schema)?);
    }

    let nulls = null_buffer(validity);
    if children.is_empty() {
        return Ok(Arc::new(StructArray::new_empty_fields(values.len(), nulls)));
    }
    let array = StructArray::try_new(arrow_fields, children, nulls)?;
    Ok(Arc::new(array))
}

/// Extract one typed slot per value, enforcing the schema's nullability
fn collect<T>(
    values: &[Option<&Value>],
    schema: &Schema,
    extract: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<Option<T>>> {
    values
        .iter()
        .map(|value| match value {
            None => Ok(None),
            Some(Value::Null) => check_null(schema).map(|()| None),
            Some(v) => extract(v)
                .map(Some)
                .ok_or_else(|| Error::unhandled(schema.describe(), v.kind_name())),
        })
        .collect()
}

fn check_null(schema: &Schema) -> Result<()> {
    if schema.optional {
        Ok(())
    } else {
        Err(Error::unhandled(schema.describe(), "null"))
    }
}

fn null_buffer(validity: Vec<bool>) -> Option<NullBuffer> {
    if validity.iter().all(|valid| *valid) {
        None
    } else {
        Some(NullBuffer::from(validity))
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Int8(n) => Some(i64::from(*n)),
        Value::Int16(n) => Some(i64::from(*n)),
        Value::Int32(n) => Some(i64::from(*n)),
        Value::Int64(n) => Some(*n),
        _ => None,
    }
}

/// Unscaled decimal128 units of a numeric value at `scale`
fn decimal_units(value: &Value, scale: i64) -> Option<i128> {
    let decimal = match value {
        Value::Decimal(d) => d.clone(),
        Value::BigInt(n) => BigDecimal::from(n.clone()),
        other => BigDecimal::from(integer(other)?),
    };
    let (units, _) = decimal.with_scale(scale).into_bigint_and_exponent();
    i128::try_from(&units).ok()
}
