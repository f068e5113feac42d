//! Conversion engine tests

use super::*;
use crate::schema::{Schema, SchemaKind, Value};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::str::FromStr;
use test_case::test_case;

fn nested(doc: &JsonValue) -> (Schema, Value) {
    match Converter::default().convert(doc).unwrap() {
        Converted::Structured { schema, value } => (schema, value),
        other => panic!("expected structured output, got {other:?}"),
    }
}

fn flattened(doc: &JsonValue) -> FlatRecord {
    match Converter::new(ConverterConfig::flattened())
        .convert(doc)
        .unwrap()
    {
        Converted::Flattened(flat) => flat,
        other => panic!("expected flattened output, got {other:?}"),
    }
}

fn field_names(schema: &Schema) -> Vec<&str> {
    schema
        .fields()
        .unwrap()
        .iter()
        .map(|f| f.name.as_str())
        .collect()
}

// ============================================================================
// Numeric Narrowing
// ============================================================================

#[test_case("127", Value::Int8(127) ; "int8 max")]
#[test_case("-128", Value::Int8(-128) ; "int8 min")]
#[test_case("128", Value::Int16(128) ; "just past int8")]
#[test_case("-129", Value::Int16(-129) ; "just below int8")]
#[test_case("40000", Value::Int32(40000) ; "int32")]
#[test_case("9223372036854775807", Value::Int64(i64::MAX) ; "int64 max")]
#[test_case("1.0", Value::Int8(1) ; "integral decimal")]
#[test_case("1e2", Value::Int8(100) ; "integral exponent")]
#[test_case("0.125", Value::Float32(0.125) ; "exact float32")]
#[test_case("-2.5", Value::Float32(-2.5) ; "negative exact float32")]
#[test_case("0.1", Value::Float64(0.1) ; "inexact in float32")]
#[test_case("3.14159265358979", Value::Float64(3.141_592_653_589_79) ; "float64")]
fn test_narrow_str(text: &str, expected: Value) {
    assert_eq!(narrow_str(text).unwrap(), expected);
}

#[test]
fn test_narrow_past_int64_is_big_integer() {
    let value = narrow_str("9223372036854775808").unwrap();
    assert_eq!(
        value,
        Value::BigInt(BigInt::from_str("9223372036854775808").unwrap())
    );
    assert_eq!(leaf_schema(&value).unwrap(), Schema::decimal(0, true));
}

#[test]
fn test_narrow_invalid_number() {
    let err = narrow_str("twelve").unwrap_err();
    assert!(matches!(err, Error::InvalidNumber { ref text } if text == "twelve"));
}

#[test_case("1e100000000" ; "huge exponent")]
#[test_case("-1e100000000" ; "huge negative exponent")]
#[test_case("1e-100000000" ; "tiny exponent")]
#[test_case("1e309" ; "past float64 max")]
#[test_case("1e-325" ; "below float64 subnormal")]
fn test_narrow_rejects_out_of_range_magnitude(text: &str) {
    let err = narrow_str(text).unwrap_err();
    assert!(matches!(err, Error::InvalidNumber { .. }));
    assert!(err.is_per_record());
}

#[test]
fn test_narrow_range_edges() {
    assert_eq!(narrow_str("0e-100000000").unwrap(), Value::Int8(0));
    assert_eq!(narrow_str("1e-300").unwrap(), Value::Float64(1e-300));
    assert!(matches!(narrow_str("1e300").unwrap(), Value::BigInt(_)));
}

#[test]
fn test_huge_exponent_document_fails_fast() {
    let doc: JsonValue = serde_json::from_str(r#"{"n": 1e100000000}"#).unwrap();
    let err = Converter::new(ConverterConfig::nested())
        .convert(&doc)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidNumber { .. }));

    let err = Converter::new(ConverterConfig::schemaless())
        .convert(&doc)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidNumber { .. }));
}

#[test]
fn test_narrow_value_passes_big_values_through() {
    let big = Value::BigInt(BigInt::from_str("123456789012345678901234567890").unwrap());
    assert_eq!(narrow_value(&big), big);

    let decimal = Value::Decimal(BigDecimal::from_str("1.50").unwrap());
    assert_eq!(narrow_value(&decimal), decimal);
}

#[test]
fn test_narrow_value_recurses_into_containers() {
    let mut inner = indexmap::IndexMap::new();
    inner.insert("n".to_string(), Value::Int64(7));
    inner.insert("s".to_string(), Value::from("seven"));

    let input = Value::Array(vec![
        Value::Map(inner),
        Value::Int32(300),
        Value::Float64(0.5),
        Value::Float64(0.1),
    ]);

    let narrowed = narrow_value(&input);

    let mut expected_inner = indexmap::IndexMap::new();
    expected_inner.insert("n".to_string(), Value::Int8(7));
    expected_inner.insert("s".to_string(), Value::from("seven"));
    assert_eq!(
        narrowed,
        Value::Array(vec![
            Value::Map(expected_inner),
            Value::Int16(300),
            Value::Float32(0.5),
            Value::Float64(0.1),
        ])
    );
    // the input is untouched
    assert_eq!(input.as_array().unwrap()[1], Value::Int32(300));
}

#[test]
fn test_narrow_json_keeps_source_text() {
    let doc: JsonValue = serde_json::from_str("[12345678901234567890123]").unwrap();
    let number = match &doc[0] {
        JsonValue::Number(n) => n,
        other => panic!("expected number, got {other}"),
    };
    assert_eq!(
        narrow_json(number).unwrap(),
        Value::BigInt(BigInt::from_str("12345678901234567890123").unwrap())
    );
}

// ============================================================================
// Struct Schema Builder
// ============================================================================

#[test]
fn test_object_to_struct() {
    let (schema, value) = nested(&json!({
        "name": "Ada",
        "age": 36,
        "active": true,
        "nickname": null
    }));

    assert!(!schema.optional);
    assert_eq!(field_names(&schema), vec!["active", "age", "name", "nickname"]);
    assert_eq!(
        schema.field("age").unwrap().schema,
        Schema::optional(SchemaKind::Int8)
    );
    assert_eq!(schema.field("nickname").unwrap().schema, Schema::NULL_SENTINEL);

    let record = value.as_struct().unwrap();
    assert_eq!(record.get("name"), Some(&Value::from("Ada")));
    assert_eq!(record.get("age"), Some(&Value::Int8(36)));
    assert_eq!(record.get("active"), Some(&Value::Boolean(true)));
    assert_eq!(record.get("nickname"), Some(&Value::Null));
}

#[test]
fn test_nested_structs_are_optional() {
    let (schema, value) = nested(&json!({"address": {"city": "Oslo", "zip": 150}}));

    let address = &schema.field("address").unwrap().schema;
    assert!(address.optional);
    assert_eq!(field_names(address), vec!["city", "zip"]);

    let inner = value.as_struct().unwrap().get("address").unwrap();
    assert_eq!(
        inner.as_struct().unwrap().get("zip"),
        Some(&Value::Int16(150))
    );
}

#[test]
fn test_field_order_ignores_key_order() {
    let a: JsonValue =
        serde_json::from_str(r#"{"zeta": 1, "alpha": "x", "mid": {"b": true, "a": 2.5}}"#)
            .unwrap();
    let b: JsonValue =
        serde_json::from_str(r#"{"mid": {"a": 2.5, "b": true}, "alpha": "x", "zeta": 1}"#)
            .unwrap();

    let (schema_a, value_a) = nested(&a);
    let (schema_b, value_b) = nested(&b);
    assert_eq!(schema_a, schema_b);
    assert_eq!(value_a, value_b);
    assert_eq!(field_names(&schema_a), vec!["alpha", "mid", "zeta"]);
}

// ============================================================================
// Array Schema Builder + Merger
// ============================================================================

#[test]
fn test_empty_array() {
    let (schema, value) = nested(&json!([]));
    assert_eq!(schema.element(), Some(&Schema::NULL_SENTINEL));
    assert_eq!(value, Value::Array(vec![]));
}

#[test]
fn test_single_null_array() {
    let (schema, value) = nested(&json!({"list": [null]}));
    let list = &schema.field("list").unwrap().schema;
    assert_eq!(list.element(), Some(&Schema::NULL_SENTINEL));
    assert_eq!(
        value.as_struct().unwrap().get("list"),
        Some(&Value::Array(vec![Value::Null]))
    );
}

#[test]
fn test_homogeneous_array_keeps_order() {
    let (schema, value) = nested(&json!(["c", "a", "b"]));
    assert_eq!(
        schema.element(),
        Some(&Schema::optional(SchemaKind::String))
    );
    assert_eq!(
        value,
        Value::Array(vec![Value::from("c"), Value::from("a"), Value::from("b")])
    );
}

#[test]
fn test_strings_and_nulls_share_a_schema() {
    let (schema, value) = nested(&json!(["a", null]));
    assert_eq!(schema.element(), Some(&Schema::NULL_SENTINEL));
    assert_eq!(value, Value::Array(vec![Value::from("a"), Value::Null]));
}

#[test]
fn test_merge_sparse_struct_elements() {
    let (schema, value) = nested(&json!([{"a": 1, "b": 2}, {"a": 1, "c": 3}]));

    let element = schema.element().unwrap();
    assert_eq!(field_names(element), vec!["a", "b", "c"]);

    let items = value.as_array().unwrap();
    let first = items[0].as_struct().unwrap();
    assert_eq!(first.schema(), element);
    assert_eq!(first.get("a"), Some(&Value::Int8(1)));
    assert_eq!(first.get("b"), Some(&Value::Int8(2)));
    assert_eq!(first.get("c"), Some(&Value::Null));

    let second = items[1].as_struct().unwrap();
    assert_eq!(second.get("b"), Some(&Value::Null));
    assert_eq!(second.get("c"), Some(&Value::Int8(3)));
}

#[test]
fn test_merge_nested_structs_recursively() {
    let (schema, value) = nested(&json!({
        "orders": [
            {"id": 1, "ship": {"city": "Oslo"}},
            {"id": 2, "ship": {"zip": "0150"}}
        ]
    }));

    let element = schema.field("orders").unwrap().schema.element().unwrap();
    let ship = &element.field("ship").unwrap().schema;
    assert_eq!(field_names(ship), vec!["city", "zip"]);

    let orders = value.as_struct().unwrap().get("orders").unwrap();
    let first_ship = orders.as_array().unwrap()[0]
        .as_struct()
        .unwrap()
        .get("ship")
        .unwrap()
        .as_struct()
        .unwrap();
    assert_eq!(first_ship.schema(), ship);
    assert_eq!(first_ship.get("city"), Some(&Value::from("Oslo")));
    assert_eq!(first_ship.get("zip"), Some(&Value::Null));
}

#[test]
fn test_merge_is_deterministic() {
    let a = nested(&json!([{"x": 1}, {"y": "s"}, {"x": 2, "z": true}]));
    let b = nested(&json!([{"x": 1}, {"y": "s"}, {"x": 2, "z": true}]));
    assert_eq!(a, b);
}

#[test]
fn test_mixed_type_array() {
    let err = Converter::default()
        .convert(&json!({"tags": ["a", 1]}))
        .unwrap_err();
    match err {
        Error::MixedTypeArray { path, found } => {
            assert_eq!(path, "tags");
            assert_eq!(found, "string, int8");
        }
        other => panic!("expected MixedTypeArray, got {other}"),
    }
}

#[test]
fn test_mixed_struct_and_primitive_array() {
    let err = Converter::default()
        .convert(&json!([{"a": 1}, "a"]))
        .unwrap_err();
    assert!(matches!(err, Error::MixedTypeArray { .. }));
}

#[test]
fn test_conflicting_field_schemas() {
    let err = Converter::default()
        .convert(&json!({"rows": [{"v": {"x": 1}}, {"v": "flat"}]}))
        .unwrap_err();
    match err {
        Error::ConflictingFieldSchemas { field, .. } => assert_eq!(field, "rows.v"),
        other => panic!("expected ConflictingFieldSchemas, got {other}"),
    }
}

// ============================================================================
// Depth Limit
// ============================================================================

#[test]
fn test_depth_limit() {
    let converter = Converter::new(ConverterConfig::nested().with_max_depth(2));
    assert!(converter.convert(&json!({"a": {"b": 1}})).is_ok());

    let err = converter
        .convert(&json!({"a": {"b": {"c": 1}}}))
        .unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { max_depth: 2 }));
}

#[test]
fn test_depth_limit_applies_to_every_strategy() {
    let deep = json!([[[["x"]]]]);
    for config in [
        ConverterConfig::nested(),
        ConverterConfig::flattened(),
        ConverterConfig::schemaless(),
    ] {
        let converter = Converter::new(config.with_max_depth(3));
        let err = converter.convert(&deep).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { max_depth: 3 }));
    }
}

// ============================================================================
// Flattening
// ============================================================================

#[test]
fn test_flatten_nested_arrays() {
    let flat = flattened(&json!({"array": [["a", "b"], ["c"]]}));
    assert_eq!(
        flat.paths().collect::<Vec<_>>(),
        vec!["array.0.0", "array.0.1", "array.1.0"]
    );
    assert_eq!(flat.value("array.0.0"), Some(&Value::from("a")));
    assert_eq!(flat.value("array.0.1"), Some(&Value::from("b")));
    assert_eq!(flat.value("array.1.0"), Some(&Value::from("c")));
}

#[test]
fn test_flatten_nested_objects() {
    let flat = flattened(&json!({
        "user": {"name": "Ada", "langs": [{"n": "en"}, {"n": "no"}]},
        "count": 300,
        "gone": null
    }));

    assert_eq!(
        flat.paths().collect::<Vec<_>>(),
        vec!["count", "gone", "user.langs.0.n", "user.langs.1.n", "user.name"]
    );
    let count = flat.get("count").unwrap();
    assert_eq!(count.schema, Schema::optional(SchemaKind::Int16));
    assert_eq!(count.value, Value::Int16(300));
    assert_eq!(flat.get("gone").unwrap().schema, Schema::NULL_SENTINEL);
}

#[test]
fn test_flatten_avoids_merge_failures() {
    let flat = flattened(&json!({"mixed": ["a", 1, {"k": true}]}));
    assert_eq!(flat.len(), 3);
    assert_eq!(flat.value("mixed.1"), Some(&Value::Int8(1)));
    assert_eq!(flat.value("mixed.2.k"), Some(&Value::Boolean(true)));
}

#[test]
fn test_flatten_duplicate_path() {
    let err = Converter::new(ConverterConfig::flattened())
        .convert(&json!({"a": {"b": 1}, "a.b": 2}))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicatePath { ref path } if path == "a.b"));
}

#[test]
fn test_flatten_scalar_root() {
    let flat = flattened(&json!("lonely"));
    assert_eq!(flat.paths().collect::<Vec<_>>(), vec![""]);
}

#[test]
fn test_flat_record_into_struct() {
    let flat = flattened(&json!({"b": {"c": 1}, "a": "x"}));
    let (schema, value) = flat.into_struct().unwrap();

    assert!(!schema.optional);
    assert_eq!(field_names(&schema), vec!["a", "b.c"]);
    assert_eq!(
        value.as_struct().unwrap().get("b.c"),
        Some(&Value::Int8(1))
    );
}

// ============================================================================
// Schemaless
// ============================================================================

#[test]
fn test_schemaless_output() {
    let converter = Converter::new(ConverterConfig::schemaless());
    let converted = converter
        .convert(&json!({"n": 300, "l": [1, 2.5], "o": {"x": "y"}}))
        .unwrap();

    let value = match converted {
        Converted::Schemaless(value) => value,
        other => panic!("expected schemaless output, got {other:?}"),
    };
    let map = match &value {
        Value::Map(map) => map,
        other => panic!("expected map, got {other:?}"),
    };
    assert_eq!(map["n"], Value::Int16(300));
    assert_eq!(
        map["l"],
        Value::Array(vec![Value::Int8(1), Value::Float32(2.5)])
    );
    assert!(matches!(map["o"], Value::Map(_)));
}

#[test]
fn test_into_record() {
    let (schema, _) = Converter::default()
        .convert(&json!({"a": 1}))
        .unwrap()
        .into_record()
        .unwrap();
    assert!(schema.is_some());

    let (schema, value) = Converter::new(ConverterConfig::schemaless())
        .convert(&json!({"a": 1}))
        .unwrap()
        .into_record()
        .unwrap();
    assert!(schema.is_none());
    assert!(matches!(value, Value::Map(_)));
}
