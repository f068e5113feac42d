//! Flatten strategy: nested structure to one path-keyed mapping

use super::{Converter, Walk};
use crate::error::{Error, Result};
use crate::schema::{Field, Schema, Struct, Value};
use crate::types::{JsonObject, JsonValue};
use indexmap::IndexMap;

/// One flattened leaf
#[derive(Debug, Clone, PartialEq)]
pub struct FlatEntry {
    pub schema: Schema,
    pub value: Value,
}

/// Ordered mapping from `a.b.0.c` style paths to leaf schemas and values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    entries: IndexMap<String, FlatEntry>,
}

impl FlatRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a leaf. A path produced twice (e.g. by a key containing a dot
    /// colliding with a nested key) is an error rather than a silent overwrite.
    pub fn insert(&mut self, path: String, schema: Schema, value: Value) -> Result<()> {
        if self.entries.contains_key(&path) {
            return Err(Error::DuplicatePath { path });
        }
        self.entries.insert(path, FlatEntry { schema, value });
        Ok(())
    }

    /// Look up a path
    pub fn get(&self, path: &str) -> Option<&FlatEntry> {
        self.entries.get(path)
    }

    /// Look up the value at a path
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.entries.get(path).map(|e| &e.value)
    }

    /// Paths in emission order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in emission order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of leaves
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check for no leaves
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Turn the mapping into a root struct with one field per path
    pub fn into_struct(self) -> Result<(Schema, Value)> {
        let fields = self
            .entries
            .iter()
            .map(|(path, entry)| Field::new(path.clone(), entry.schema.clone()))
            .collect();
        let schema = Schema::structure(fields, false);

        let mut record = Struct::new(schema.clone())?;
        for (path, entry) in self.entries {
            record.put(&path, entry.value)?;
        }
        Ok((schema, Value::Struct(record)))
    }
}

impl Converter {
    /// Emit the leaves of an object under `path.key`. Keys are visited in
    /// sorted order.
    pub(super) fn flatten_object(&self, map: &JsonObject, walk: &mut Walk) -> Result<()> {
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();

        for key in keys {
            walk.push(key.as_str());
            if let Some((schema, value)) = self.classify(&map[key.as_str()], walk)? {
                walk.emit(schema, value)?;
            }
            walk.pop();
        }
        Ok(())
    }

    /// Emit the leaves of an array under `path.index`, in index order
    pub(super) fn flatten_array(&self, items: &[JsonValue], walk: &mut Walk) -> Result<()> {
        for (index, item) in items.iter().enumerate() {
            walk.push(index.to_string());
            if let Some((schema, value)) = self.classify(item, walk)? {
                walk.emit(schema, value)?;
            }
            walk.pop();
        }
        Ok(())
    }
}
