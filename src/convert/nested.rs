//! Nested strategy: objects to structs, arrays to array schemas

use super::merge::{merge_structs, remap};
use super::{Converter, Walk};
use crate::error::{Error, Result};
use crate::schema::{Field, Schema, Struct, Value};
use crate::types::{JsonObject, JsonValue};

impl Converter {
    /// Build a struct schema and value from a JSON object.
    ///
    /// Fields are sorted by name, so objects with the same keys and value
    /// shapes always produce identical schemas.
    pub(super) fn nest_object(
        &self,
        map: &JsonObject,
        optional: bool,
        walk: &mut Walk,
    ) -> Result<(Schema, Value)> {
        let mut triples: Vec<(String, Schema, Value)> = Vec::with_capacity(map.len());

        for (name, child) in map {
            walk.push(name.as_str());
            let converted = self.classify(child, walk)?;
            walk.pop();

            if let Some((schema, value)) = converted {
                triples.push((name.clone(), schema, value));
            }
        }

        triples.sort_by(|a, b| a.0.cmp(&b.0));

        let fields = triples
            .iter()
            .map(|(name, schema, _)| Field::new(name.clone(), schema.clone()))
            .collect();
        let schema = Schema::structure(fields, optional);

        let mut record = Struct::new(schema.clone())?;
        for (name, _, value) in triples {
            record.put(&name, value)?;
        }

        Ok((schema, Value::Struct(record)))
    }

    /// Build an array schema and value from a JSON array, keeping element order
    pub(super) fn nest_array(
        &self,
        items: &[JsonValue],
        optional: bool,
        walk: &mut Walk,
    ) -> Result<(Schema, Value)> {
        let mut schemas = Vec::with_capacity(items.len());
        let mut values = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            walk.push(index.to_string());
            let converted = self.classify(item, walk)?;
            walk.pop();

            if let Some((schema, value)) = converted {
                schemas.push(schema);
                values.push(value);
            }
        }

        let (element, values) = reconcile(&schemas, values, walk)?;
        Ok((Schema::array(element, optional), Value::Array(values)))
    }
}

/// Pick one element schema for an array, merging struct elements when their
/// schemas diverge.
fn reconcile(
    schemas: &[Schema],
    values: Vec<Value>,
    walk: &Walk,
) -> Result<(Schema, Vec<Value>)> {
    let mut distinct: Vec<&Schema> = Vec::new();
    for schema in schemas {
        if !distinct.contains(&schema) {
            distinct.push(schema);
        }
    }

    match distinct.as_slice() {
        [] => Ok((Schema::NULL_SENTINEL, values)),
        [only] => Ok(((*only).clone(), values)),
        _ if distinct.iter().all(|s| s.is_struct()) => {
            let merged = merge_structs(&distinct, &walk.path_string())?;
            let values = values
                .into_iter()
                .map(|value| remap(value, &merged))
                .collect::<Result<Vec<_>>>()?;
            Ok((merged, values))
        }
        _ => Err(Error::MixedTypeArray {
            path: walk.location(),
            found: distinct
                .iter()
                .map(|s| s.describe())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}
