//! Configuration types for the connector
//!
//! This module contains the configuration structures loaded from YAML
//! (or JSON) that drive the conversion engine and the source/sink tasks.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default bound on document nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default header carrying a document id override on the write path
pub const DEFAULT_ID_HEADER: &str = "couchdb.id";

// ============================================================================
// Converter Config
// ============================================================================

/// How nested objects and arrays are described
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Nested struct and array schemas
    #[default]
    Nest,
    /// One flat mapping keyed by dotted/indexed paths
    Flatten,
}

/// Settings consumed by the conversion engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Emit typed schemas; when false documents become schemaless maps
    #[serde(default = "default_true")]
    pub use_structured_schema: bool,

    /// Flatten nested objects and arrays into dotted paths
    #[serde(default)]
    pub flatten_nested: bool,

    /// Maximum nesting depth accepted before a document is rejected
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            use_structured_schema: true,
            flatten_nested: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ConverterConfig {
    /// Nested structured output (the default)
    pub fn nested() -> Self {
        Self::default()
    }

    /// Flattened structured output
    pub fn flattened() -> Self {
        Self {
            flatten_nested: true,
            ..Self::default()
        }
    }

    /// Schemaless output
    pub fn schemaless() -> Self {
        Self {
            use_structured_schema: false,
            ..Self::default()
        }
    }

    /// Set the maximum nesting depth
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Strategy selected by `flatten_nested`
    pub fn strategy(&self) -> Strategy {
        if self.flatten_nested {
            Strategy::Flatten
        } else {
            Strategy::Nest
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::invalid_value(
                "converter.max_depth",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Source / Sink Config
// ============================================================================

/// Read side: change feed of one database into one topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database to follow
    pub database: String,

    /// Topic receiving converted documents
    pub topic: String,

    /// Maximum change rows fetched per poll
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Fetch full document bodies with each change row
    #[serde(default = "default_true")]
    pub include_docs: bool,
}

/// Write side: records from topics into one database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Database receiving documents
    pub database: String,

    /// Topics consumed; empty consumes every topic
    #[serde(default)]
    pub topics: Vec<String>,

    /// Record header whose value overrides the document `_id`
    #[serde(default = "default_id_header")]
    pub id_header: String,

    /// Maximum documents per bulk write
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    100
}

fn default_id_header() -> String {
    DEFAULT_ID_HEADER.to_string()
}

// ============================================================================
// Top-Level Connector Config
// ============================================================================

/// Complete connector configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Conversion settings
    #[serde(default)]
    pub converter: ConverterConfig,

    /// Source task settings
    #[serde(default)]
    pub source: Option<SourceConfig>,

    /// Sink task settings
    #[serde(default)]
    pub sink: Option<SinkConfig>,
}

impl ConnectorConfig {
    /// Parse and validate a YAML configuration
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ConnectorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ConnectorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file; `.json` files are parsed as JSON,
    /// anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.converter.validate()?;

        if let Some(source) = &self.source {
            if source.database.is_empty() {
                return Err(Error::missing_field("source.database"));
            }
            if source.topic.is_empty() {
                return Err(Error::missing_field("source.topic"));
            }
            if source.batch_size == 0 {
                return Err(Error::invalid_value(
                    "source.batch_size",
                    "must be greater than zero",
                ));
            }
        }

        if let Some(sink) = &self.sink {
            if sink.database.is_empty() {
                return Err(Error::missing_field("sink.database"));
            }
            if sink.id_header.is_empty() {
                return Err(Error::invalid_value("sink.id_header", "cannot be empty"));
            }
            if sink.batch_size == 0 {
                return Err(Error::invalid_value(
                    "sink.batch_size",
                    "must be greater than zero",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_converter_defaults() {
        let config = ConverterConfig::default();
        assert!(config.use_structured_schema);
        assert!(!config.flatten_nested);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.strategy(), Strategy::Nest);
        assert_eq!(ConverterConfig::flattened().strategy(), Strategy::Flatten);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = ConnectorConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.converter, ConverterConfig::default());
        assert!(config.source.is_none());
        assert!(config.sink.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
converter:
  use_structured_schema: true
  flatten_nested: true
  max_depth: 16
source:
  database: orders
  topic: couch.orders
  batch_size: 50
sink:
  database: archive
  topics: [couch.orders, couch.refunds]
"#;

        let config = ConnectorConfig::from_yaml_str(yaml).unwrap();
        assert!(config.converter.flatten_nested);
        assert_eq!(config.converter.max_depth, 16);

        let source = config.source.unwrap();
        assert_eq!(source.database, "orders");
        assert_eq!(source.batch_size, 50);
        assert!(source.include_docs);

        let sink = config.sink.unwrap();
        assert_eq!(sink.topics.len(), 2);
        assert_eq!(sink.id_header, DEFAULT_ID_HEADER);
        assert_eq!(sink.batch_size, 100);
    }

    #[test]
    fn test_empty_sink_topics_accept_everything() {
        let yaml = r#"
sink:
  database: archive
"#;
        let config = ConnectorConfig::from_yaml_str(yaml).unwrap();
        assert!(config.sink.unwrap().topics.is_empty());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ConnectorConfig::from_yaml_str("source: [unclosed").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let err = ConnectorConfig::from_json_str(r#"{"converter": {"max_depth": 0}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "source:\n  database: users\n  topic: couch.users").unwrap();

        let config = ConnectorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.source.unwrap().topic, "couch.users");
    }

    #[test]
    fn test_from_missing_file() {
        let err = ConnectorConfig::from_file("/nonexistent/connector.yaml").unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
