//! CLI tests

use super::*;
use crate::error::Error;
use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn runner(args: &[&str]) -> Runner {
    let mut argv = vec!["couch-connect"];
    argv.extend_from_slice(args);
    Runner::new(Cli::parse_from(argv))
}

const CONFIG: &str = r"
source:
  database: orders
  topic: orders-topic
  batch_size: 2
sink:
  database: mirror
  topics: [orders-topic]
";

#[test]
fn test_parse_global_flags() {
    let cli = Cli::parse_from(["couch-connect", "infer", "--flatten", "--pretty", "-v"]);
    assert!(cli.pretty);
    assert!(cli.verbose);
    assert!(matches!(
        cli.command,
        Commands::Infer { flatten: true, schemaless: false, max_depth: 64, .. }
    ));
}

#[test]
fn test_flatten_conflicts_with_schemaless() {
    let result = Cli::try_parse_from(["couch-connect", "infer", "--flatten", "--schemaless"]);
    assert!(result.is_err());
}

#[tokio::test]
async fn test_infer_prints_envelope() {
    let input = temp_file(".json", r#"{"_id": "a", "n": 300}"#);
    let path = input.path().to_str().unwrap();

    let output = runner(&["infer", "--input", path]).execute().await.unwrap();
    assert_eq!(output["schema"]["type"], json!("struct"));
    assert_eq!(output["schema"]["fields"][1]["type"], json!("int16"));
    assert_eq!(output["payload"], json!({"_id": "a", "n": 300}));
}

#[tokio::test]
async fn test_infer_flattened_paths() {
    let input = temp_file(".json", r#"{"a": {"b": [1, 2]}}"#);
    let path = input.path().to_str().unwrap();

    let output = runner(&["infer", "--input", path, "--flatten"])
        .execute()
        .await
        .unwrap();
    assert_eq!(output["a.b.0"]["value"], json!(1));
    assert_eq!(output["a.b.1"]["schema"], json!("int8?"));
}

#[tokio::test]
async fn test_infer_reports_mixed_arrays() {
    let input = temp_file(".json", r#"{"tags": ["a", 1]}"#);
    let path = input.path().to_str().unwrap();

    let err = runner(&["infer", "--input", path]).execute().await.unwrap_err();
    assert!(matches!(err, Error::MixedTypeArray { ref path, .. } if path == "tags"));
}

#[tokio::test]
async fn test_to_document_applies_id() {
    let envelope = json!({
        "schema": {
            "type": "struct",
            "optional": false,
            "fields": [{"type": "string", "optional": true, "field": "name"}]
        },
        "payload": {"name": "Ada"}
    });
    let input = temp_file(".json", &envelope.to_string());
    let path = input.path().to_str().unwrap();

    let output = runner(&["to-document", "--input", path, "--id", "user-1"])
        .execute()
        .await
        .unwrap();
    assert_eq!(output, json!({"_id": "user-1", "name": "Ada"}));
}

#[tokio::test]
async fn test_validate_config() {
    let config = temp_file(".yaml", CONFIG);
    let path = config.path().to_str().unwrap();

    let output = runner(&["validate", "--config", path]).execute().await.unwrap();
    assert_eq!(output["valid"], json!(true));
    assert_eq!(output["strategy"], json!("nest"));
    assert_eq!(output["source"], json!("orders"));
    assert_eq!(output["sink"], json!("mirror"));
}

#[tokio::test]
async fn test_validate_missing_file() {
    let err = runner(&["validate", "--config", "/nonexistent/connector.yaml"])
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[tokio::test]
async fn test_replay_round_trip() {
    let config = temp_file(".yaml", CONFIG);
    let docs = temp_file(
        ".jsonl",
        concat!(
            "{\"_id\": \"a\", \"qty\": 1}\n",
            "{\"_id\": \"b\", \"tags\": [\"x\", 2]}\n",
            "\n",
            "{\"_id\": \"c\", \"lines\": [{\"sku\": \"s\"}, {\"n\": 1.5}]}\n",
        ),
    );

    let output = runner(&[
        "replay",
        "--config",
        config.path().to_str().unwrap(),
        "--input",
        docs.path().to_str().unwrap(),
    ])
    .execute()
    .await
    .unwrap();

    assert_eq!(output["loaded"], json!(3));
    assert_eq!(output["records"], json!(2));
    assert_eq!(output["skipped"], json!(1));
    assert_eq!(output["written"], json!(2));
    assert_eq!(output["failed"], json!([]));
}

#[tokio::test]
async fn test_replay_reports_bad_line() {
    let config = temp_file(".yaml", CONFIG);
    let docs = temp_file(".jsonl", "{\"_id\": \"a\"}\n\n{not json}\n");

    let err = runner(&[
        "replay",
        "--config",
        config.path().to_str().unwrap(),
        "--input",
        docs.path().to_str().unwrap(),
    ])
    .execute()
    .await
    .unwrap_err();
    assert!(err.to_string().starts_with("Invalid document on line 3:"));
}
