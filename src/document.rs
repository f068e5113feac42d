//! Document model
//!
//! Documents read from the change feed are split into their well-known
//! metadata (`_id`, `_rev`, ...) and the remaining dynamic properties.
//! Documents written to the store are built from plain maps produced by
//! the bridge.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, MetadataField};

// ============================================================================
// Metadata
// ============================================================================

/// Well-known document properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata {
    pub id: Option<String>,
    pub rev: Option<String>,
    pub deleted: bool,
    pub conflicts: Vec<String>,
    pub local_seq: Option<JsonValue>,
    pub revisions: Option<JsonValue>,
    pub revs_info: Option<JsonValue>,
    pub attachments: Option<JsonValue>,
}

impl DocumentMetadata {
    fn set(&mut self, field: MetadataField, value: JsonValue) -> Result<()> {
        match field {
            MetadataField::Id => self.id = Some(string(field, value)?),
            MetadataField::Rev => self.rev = Some(string(field, value)?),
            MetadataField::Deleted => {
                self.deleted = value
                    .as_bool()
                    .ok_or_else(|| Error::unhandled(field.name(), json_kind(&value)))?;
            }
            MetadataField::Conflicts => {
                let JsonValue::Array(items) = value else {
                    return Err(Error::unhandled(field.name(), json_kind(&value)));
                };
                self.conflicts = items
                    .into_iter()
                    .map(|item| string(field, item))
                    .collect::<Result<_>>()?;
            }
            MetadataField::LocalSeq => self.local_seq = Some(value),
            MetadataField::Revisions => self.revisions = Some(value),
            MetadataField::RevsInfo => self.revs_info = Some(value),
            MetadataField::Attachments => self.attachments = Some(value),
        }
        Ok(())
    }

    fn get(&self, field: MetadataField) -> Option<JsonValue> {
        match field {
            MetadataField::Id => self.id.clone().map(JsonValue::String),
            MetadataField::Rev => self.rev.clone().map(JsonValue::String),
            MetadataField::Deleted => self.deleted.then_some(JsonValue::Bool(true)),
            MetadataField::Conflicts => (!self.conflicts.is_empty()).then(|| {
                JsonValue::Array(
                    self.conflicts
                        .iter()
                        .cloned()
                        .map(JsonValue::String)
                        .collect(),
                )
            }),
            MetadataField::LocalSeq => self.local_seq.clone(),
            MetadataField::Revisions => self.revisions.clone(),
            MetadataField::RevsInfo => self.revs_info.clone(),
            MetadataField::Attachments => self.attachments.clone(),
        }
    }
}

// ============================================================================
// Inbound Document
// ============================================================================

/// A document as delivered by the change feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub metadata: DocumentMetadata,
    /// Every property that is not well-known metadata
    pub properties: JsonObject,
}

impl Document {
    /// Split a JSON document into metadata and dynamic properties.
    ///
    /// Metadata names are collected first; everything else is kept as is.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::unsupported_root(json_kind(json)))?;

        let mut metadata = DocumentMetadata::default();
        for field in MetadataField::ALL {
            if let Some(value) = object.get(field.name()) {
                metadata.set(field, value.clone())?;
            }
        }

        let properties = object
            .iter()
            .filter(|(key, _)| MetadataField::from_name(key).is_none())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            metadata,
            properties,
        })
    }

    /// Document id, if it has one
    pub fn id(&self) -> Option<&str> {
        self.metadata.id.as_deref()
    }

    /// Whether this document is a deletion tombstone
    pub fn is_deleted(&self) -> bool {
        self.metadata.deleted
    }

    /// Merge metadata and properties back into one object
    pub fn to_object(&self) -> JsonObject {
        let mut object = JsonObject::new();
        for field in MetadataField::ALL {
            if let Some(value) = self.metadata.get(field) {
                object.insert(field.name().to_string(), value);
            }
        }
        for (key, value) in &self.properties {
            object.insert(key.clone(), value.clone());
        }
        object
    }

    /// The merged object as a JSON value
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.to_object())
    }
}

// ============================================================================
// Outbound Document
// ============================================================================

/// A document ready to be written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundDocument {
    body: JsonObject,
}

impl OutboundDocument {
    /// Build a write document from a plain map. `id_override` replaces any
    /// `_id` the map carries.
    pub fn from_map(mut map: JsonObject, id_override: Option<&str>) -> Self {
        if let Some(id) = id_override {
            map.insert(
                MetadataField::Id.name().to_string(),
                JsonValue::String(id.to_string()),
            );
        }
        Self { body: map }
    }

    /// Document id, if it has a string one
    pub fn id(&self) -> Option<&str> {
        self.body
            .get(MetadataField::Id.name())
            .and_then(JsonValue::as_str)
    }

    /// Revision the write is based on, if any
    pub fn rev(&self) -> Option<&str> {
        self.body
            .get(MetadataField::Rev.name())
            .and_then(JsonValue::as_str)
    }

    /// Set the `_id`
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.body.insert(
            MetadataField::Id.name().to_string(),
            JsonValue::String(id.into()),
        );
    }

    /// Set the `_rev`
    pub fn set_rev(&mut self, rev: impl Into<String>) {
        self.body.insert(
            MetadataField::Rev.name().to_string(),
            JsonValue::String(rev.into()),
        );
    }

    pub fn body(&self) -> &JsonObject {
        &self.body
    }

    pub fn into_body(self) -> JsonObject {
        self.body
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.body.clone())
    }
}

fn string(field: MetadataField, value: JsonValue) -> Result<String> {
    match value {
        JsonValue::String(s) => Ok(s),
        other => Err(Error::unhandled(field.name(), json_kind(&other))),
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json_splits_metadata() {
        let doc = Document::from_json(&json!({
            "_id": "order-1",
            "_rev": "2-abc",
            "_conflicts": ["1-xyz"],
            "total": 12,
            "lines": []
        }))
        .unwrap();

        assert_eq!(doc.id(), Some("order-1"));
        assert_eq!(doc.metadata.rev.as_deref(), Some("2-abc"));
        assert_eq!(doc.metadata.conflicts, vec!["1-xyz".to_string()]);
        assert!(!doc.is_deleted());
        assert_eq!(
            doc.properties.keys().collect::<Vec<_>>(),
            vec!["lines", "total"]
        );
    }

    #[test]
    fn test_to_object_merges_back() {
        let original = json!({
            "_id": "a",
            "_deleted": true,
            "_attachments": {"img.png": {"stub": true}},
            "name": "x"
        });
        let doc = Document::from_json(&original).unwrap();
        assert!(doc.is_deleted());
        assert_eq!(doc.to_json(), original);
    }

    #[test]
    fn test_metadata_type_errors() {
        let err = Document::from_json(&json!({"_id": 5})).unwrap_err();
        assert!(matches!(err, Error::UnhandledType { ref expected, .. } if expected == "_id"));

        let err = Document::from_json(&json!({"_conflicts": "1-a"})).unwrap_err();
        assert!(matches!(err, Error::UnhandledType { .. }));

        let err = Document::from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedRootValue { .. }));
    }

    #[test]
    fn test_outbound_id_override() {
        let mut map = JsonObject::new();
        map.insert("_id".to_string(), json!("from-value"));
        map.insert("n".to_string(), json!(1));

        let doc = OutboundDocument::from_map(map.clone(), None);
        assert_eq!(doc.id(), Some("from-value"));

        let doc = OutboundDocument::from_map(map, Some("from-header"));
        assert_eq!(doc.id(), Some("from-header"));
        assert_eq!(doc.to_json(), json!({"_id": "from-header", "n": 1}));
    }
}
