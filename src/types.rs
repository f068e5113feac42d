//! Common types used throughout couch-connect
//!
//! Shared type aliases and the well-known document metadata names.

use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Metadata Fields
// ============================================================================

/// Document properties with a fixed meaning in the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Id,
    Rev,
    Deleted,
    Conflicts,
    LocalSeq,
    Revisions,
    RevsInfo,
    Attachments,
}

impl MetadataField {
    /// Every well-known field, in collection order
    pub const ALL: [MetadataField; 8] = [
        MetadataField::Id,
        MetadataField::Rev,
        MetadataField::Deleted,
        MetadataField::Conflicts,
        MetadataField::LocalSeq,
        MetadataField::Revisions,
        MetadataField::RevsInfo,
        MetadataField::Attachments,
    ];

    /// Property name as stored in documents
    pub fn name(&self) -> &'static str {
        match self {
            MetadataField::Id => "_id",
            MetadataField::Rev => "_rev",
            MetadataField::Deleted => "_deleted",
            MetadataField::Conflicts => "_conflicts",
            MetadataField::LocalSeq => "_local_seq",
            MetadataField::Revisions => "_revisions",
            MetadataField::RevsInfo => "_revs_info",
            MetadataField::Attachments => "_attachments",
        }
    }

    /// Look up a field by property name
    pub fn from_name(name: &str) -> Option<MetadataField> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
