//! Wire types for schema JSON

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema as it appears inside an envelope. Struct fields use the same
/// shape with `field` set to the field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaJson {
    /// Physical type name (`struct`, `array`, `int8`, ...)
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub optional: bool,

    /// Field name, when this schema describes a struct field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Logical type name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Logical type parameters (e.g. decimal scale)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, serde_json::Value>>,

    /// Struct fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<SchemaJson>>,

    /// Array element schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaJson>>,
}

impl SchemaJson {
    pub(super) fn new(type_name: &str, optional: bool) -> Self {
        Self {
            type_name: type_name.to_string(),
            optional,
            field: None,
            name: None,
            parameters: None,
            fields: None,
            items: None,
        }
    }
}
