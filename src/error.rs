//! Error types for couch-connect
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for couch-connect
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Conversion Errors
    // ============================================================================
    #[error("Array at '{path}' mixes incompatible element schemas: {found}")]
    MixedTypeArray { path: String, found: String },

    #[error("Field '{field}' has conflicting non-struct schemas across array elements: {found}")]
    ConflictingFieldSchemas { field: String, found: String },

    #[error("No conversion rule for {found} value against {expected} schema")]
    UnhandledType { expected: String, found: String },

    #[error("Unknown type: {type_name}")]
    UnknownType { type_name: String },

    #[error("Document writes require a mapping at the root, got {found}")]
    UnsupportedRootValue { found: String },

    #[error("Nesting depth exceeds the configured maximum of {max_depth}")]
    DepthExceeded { max_depth: usize },

    #[error("Flattened path '{path}' is produced more than once")]
    DuplicatePath { path: String },

    #[error("Invalid decimal number: '{text}'")]
    InvalidNumber { text: String },

    // ============================================================================
    // Output Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Store Errors
    // ============================================================================
    #[error("Document store error: {message}")]
    Store { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unhandled type error
    pub fn unhandled(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnhandledType {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unknown type error
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Create an unsupported root value error
    pub fn unsupported_root(found: impl Into<String>) -> Self {
        Self::UnsupportedRootValue {
            found: found.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Check if this error belongs to a single document or record.
    ///
    /// Batch callers catch these per item and keep going; anything else
    /// aborts the batch.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            Error::MixedTypeArray { .. }
                | Error::ConflictingFieldSchemas { .. }
                | Error::UnhandledType { .. }
                | Error::UnknownType { .. }
                | Error::UnsupportedRootValue { .. }
                | Error::DepthExceeded { .. }
                | Error::DuplicatePath { .. }
                | Error::InvalidNumber { .. }
        )
    }
}

/// Result type alias for couch-connect
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("database");
        assert_eq!(err.to_string(), "Missing required config field: database");

        let err = Error::unsupported_root("int64");
        assert_eq!(
            err.to_string(),
            "Document writes require a mapping at the root, got int64"
        );
    }

    #[test]
    fn test_is_per_record() {
        assert!(Error::MixedTypeArray {
            path: "tags".to_string(),
            found: "string, int8".to_string(),
        }
        .is_per_record());
        assert!(Error::DepthExceeded { max_depth: 4 }.is_per_record());
        assert!(Error::unknown_type("map").is_per_record());
        assert!(Error::unhandled("struct", "string").is_per_record());

        assert!(!Error::store("connection reset").is_per_record());
        assert!(!Error::config("bad").is_per_record());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
