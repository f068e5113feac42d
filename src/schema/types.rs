//! Typed schema definitions

use std::fmt;

/// Logical type layered on top of a physical schema kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// Arbitrary precision decimal, stored as bytes with a fixed scale
    Decimal {
        /// Number of digits after the decimal point
        scale: i64,
    },
    /// Milliseconds since the Unix epoch, stored as int64
    Timestamp,
}

impl LogicalType {
    /// Envelope name of the decimal logical type
    pub const DECIMAL_NAME: &'static str = "org.apache.kafka.connect.data.Decimal";
    /// Envelope name of the timestamp logical type
    pub const TIMESTAMP_NAME: &'static str = "org.apache.kafka.connect.data.Timestamp";

    /// Name used when this logical type is written to an envelope
    pub fn name(&self) -> &'static str {
        match self {
            LogicalType::Decimal { .. } => Self::DECIMAL_NAME,
            LogicalType::Timestamp => Self::TIMESTAMP_NAME,
        }
    }
}

/// Shape of a typed schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    Bytes,
    /// Ordered sequence of values sharing one element schema
    Array(Box<Schema>),
    /// Named fields, sorted by name
    Struct(Vec<Field>),
}

impl SchemaKind {
    /// Short type name, matching the envelope `"type"` strings
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int8 => "int8",
            SchemaKind::Int16 => "int16",
            SchemaKind::Int32 => "int32",
            SchemaKind::Int64 => "int64",
            SchemaKind::Float32 => "float32",
            SchemaKind::Float64 => "float64",
            SchemaKind::String => "string",
            SchemaKind::Bytes => "bytes",
            SchemaKind::Array(_) => "array",
            SchemaKind::Struct(_) => "struct",
        }
    }

    /// Parse a primitive type name. Arrays and structs need their children
    /// and are built by the caller.
    pub fn primitive_from_name(name: &str) -> Option<SchemaKind> {
        let kind = match name {
            "boolean" => SchemaKind::Boolean,
            "int8" => SchemaKind::Int8,
            "int16" => SchemaKind::Int16,
            "int32" => SchemaKind::Int32,
            "int64" => SchemaKind::Int64,
            "float32" => SchemaKind::Float32,
            "float64" => SchemaKind::Float64,
            "string" => SchemaKind::String,
            "bytes" => SchemaKind::Bytes,
            _ => return None,
        };
        Some(kind)
    }
}

/// A named field of a struct schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
}

impl Field {
    /// Create a new field
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// Recursive typed schema
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    pub kind: SchemaKind,
    pub optional: bool,
    pub logical: Option<LogicalType>,
}

impl Schema {
    /// Schema used for `null`, where nothing better can be inferred
    pub const NULL_SENTINEL: Schema = Schema::primitive(SchemaKind::String, true);

    /// Create a primitive schema
    pub const fn primitive(kind: SchemaKind, optional: bool) -> Self {
        Self {
            kind,
            optional,
            logical: None,
        }
    }

    /// Create an optional primitive schema
    pub const fn optional(kind: SchemaKind) -> Self {
        Self::primitive(kind, true)
    }

    /// Create an array schema
    pub fn array(element: Schema, optional: bool) -> Self {
        Self {
            kind: SchemaKind::Array(Box::new(element)),
            optional,
            logical: None,
        }
    }

    /// Create a struct schema, sorting fields by name
    pub fn structure(mut fields: Vec<Field>, optional: bool) -> Self {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            kind: SchemaKind::Struct(fields),
            optional,
            logical: None,
        }
    }

    /// Create a decimal schema with the given scale
    pub fn decimal(scale: i64, optional: bool) -> Self {
        Self {
            kind: SchemaKind::Bytes,
            optional,
            logical: Some(LogicalType::Decimal { scale }),
        }
    }

    /// Create a timestamp schema
    pub fn timestamp(optional: bool) -> Self {
        Self {
            kind: SchemaKind::Int64,
            optional,
            logical: Some(LogicalType::Timestamp),
        }
    }

    /// Struct fields, if this is a struct schema
    pub fn fields(&self) -> Option<&[Field]> {
        match &self.kind {
            SchemaKind::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a struct field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    /// Position of a struct field
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields()?.iter().position(|f| f.name == name)
    }

    /// Element schema, if this is an array schema
    pub fn element(&self) -> Option<&Schema> {
        match &self.kind {
            SchemaKind::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Check if this is a struct schema
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, SchemaKind::Struct(_))
    }

    /// Short description for error messages, including logical types
    pub fn describe(&self) -> String {
        match self.logical {
            Some(LogicalType::Decimal { scale }) => format!("decimal({scale})"),
            Some(LogicalType::Timestamp) => "timestamp".to_string(),
            None => match &self.kind {
                SchemaKind::Array(element) => format!("array<{}>", element.describe()),
                SchemaKind::Struct(fields) => {
                    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                    format!("struct{{{}}}", names.join(","))
                }
                kind => kind.type_name().to_string(),
            },
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())?;
        if self.optional {
            write!(f, "?")?;
        }
        Ok(())
    }
}
