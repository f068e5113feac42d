//! Struct schema merging for heterogeneous arrays

use crate::error::{Error, Result};
use crate::schema::{Field, Schema, Struct, Value};
use std::collections::BTreeMap;

/// Merge struct schemas into one schema that describes every input.
///
/// Fields are grouped by name. A name seen with one distinct schema keeps
/// it; a name seen with several struct schemas is merged recursively. Any
/// other divergence is a [`Error::ConflictingFieldSchemas`]. `prefix` is the
/// dotted location used in error messages.
pub fn merge_structs(schemas: &[&Schema], prefix: &str) -> Result<Schema> {
    let mut by_name: BTreeMap<&str, Vec<&Schema>> = BTreeMap::new();
    for schema in schemas.iter().copied() {
        let fields = schema
            .fields()
            .ok_or_else(|| Error::unhandled("struct", schema.describe()))?;
        for field in fields {
            let seen = by_name.entry(field.name.as_str()).or_default();
            if !seen.contains(&&field.schema) {
                seen.push(&field.schema);
            }
        }
    }

    let mut fields = Vec::with_capacity(by_name.len());
    for (name, seen) in by_name {
        let location = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        let schema = match seen.as_slice() {
            [only] => (*only).clone(),
            _ if seen.iter().all(|s| s.is_struct()) => merge_structs(&seen, &location)?,
            _ => {
                return Err(Error::ConflictingFieldSchemas {
                    field: location,
                    found: seen
                        .iter()
                        .map(|s| s.describe())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        };
        fields.push(Field::new(name, schema));
    }

    let optional = schemas.iter().any(|s| s.optional);
    Ok(Schema::structure(fields, optional))
}

/// Rebuild a struct value under a merged schema.
///
/// Fields present in the original are carried over, recursing into fields
/// whose nested struct schema was merged; fields the original lacks stay null.
pub fn remap(value: Value, merged: &Schema) -> Result<Value> {
    let original = match value {
        Value::Struct(s) => s,
        Value::Null => return Ok(Value::Null),
        other => return Err(Error::unhandled(merged.describe(), other.kind_name())),
    };

    if original.schema() == merged {
        return Ok(Value::Struct(original));
    }

    let mut rebuilt = Struct::new(merged.clone())?;
    let (schema, values) = original.into_parts();
    let fields = schema.fields().unwrap_or_default();

    for (field, value) in fields.iter().zip(values) {
        let target = merged
            .field(&field.name)
            .ok_or_else(|| Error::unhandled(merged.describe(), format!("field '{}'", field.name)))?;

        let value = if target.schema.is_struct() && target.schema != field.schema {
            remap(value, &target.schema)?
        } else {
            value
        };
        rebuilt.put(&field.name, value)?;
    }

    Ok(Value::Struct(rebuilt))
}
