//! CLI runner - executes commands

use crate::bridge::{to_document_map, unwrap_value};
use crate::cli::commands::{Cli, Commands};
use crate::config::{ConnectorConfig, ConverterConfig};
use crate::connector::{MemoryStore, SinkRecord, SinkTask, SourceTask};
use crate::convert::{Converted, Converter};
use crate::document::OutboundDocument;
use crate::envelope::Envelope;
use crate::error::{Error, Result, ResultExt};
use crate::types::{JsonObject, JsonValue};
use serde_json::json;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command and print its result
    pub async fn run(&self) -> Result<()> {
        let output = self.execute().await?;
        self.output_message(&output);
        Ok(())
    }

    /// Run the CLI command and return its result
    pub async fn execute(&self) -> Result<JsonValue> {
        match &self.cli.command {
            Commands::Infer {
                input,
                flatten,
                schemaless,
                max_depth,
            } => {
                let config = ConverterConfig {
                    use_structured_schema: !*schemaless,
                    flatten_nested: *flatten,
                    max_depth: *max_depth,
                };
                self.infer(input.as_deref(), config)
            }
            Commands::ToDocument { input, id } => self.to_document(input.as_deref(), id.as_deref()),
            Commands::Validate { config } => self.validate(config),
            Commands::Replay { config, input } => self.replay(config, input.as_deref()).await,
        }
    }

    /// Infer a schema for one document
    fn infer(&self, input: Option<&Path>, config: ConverterConfig) -> Result<JsonValue> {
        let document: JsonValue = serde_json::from_str(&read_input(input)?)?;
        let converter = Converter::new(config);

        match converter.convert(&document)? {
            Converted::Structured { schema, value } => {
                debug!(schema = %schema.describe(), "Inferred schema");
                Envelope::new(Some(schema), value).to_json()
            }
            Converted::Flattened(flat) => {
                let mut object = JsonObject::new();
                for (path, entry) in flat.iter() {
                    object.insert(
                        path.to_string(),
                        json!({
                            "schema": entry.schema.to_string(),
                            "value": unwrap_value(&entry.value, Some(&entry.schema))?,
                        }),
                    );
                }
                Ok(JsonValue::Object(object))
            }
            Converted::Schemaless(value) => Envelope::new(None, value).to_json(),
        }
    }

    /// Decode an envelope into the document that would be written
    fn to_document(&self, input: Option<&Path>, id: Option<&str>) -> Result<JsonValue> {
        let envelope = Envelope::parse(&read_input(input)?)?;
        let map = to_document_map(&envelope.payload, envelope.schema.as_ref())?;
        Ok(OutboundDocument::from_map(map, id).to_json())
    }

    /// Validate a connector configuration
    fn validate(&self, path: &Path) -> Result<JsonValue> {
        let config = ConnectorConfig::from_file(path)?;
        info!(path = %path.display(), "Configuration is valid");

        Ok(json!({
            "valid": true,
            "strategy": format!("{:?}", config.converter.strategy()).to_lowercase(),
            "structured": config.converter.use_structured_schema,
            "source": config.source.as_ref().map(|s| &s.database),
            "sink": config.sink.as_ref().map(|s| &s.database),
        }))
    }

    /// Load documents into an in-memory store, drain the source task and
    /// hand every record to the sink task through the envelope codec
    async fn replay(&self, config_path: &Path, input: Option<&Path>) -> Result<JsonValue> {
        let config = ConnectorConfig::from_file(config_path)?;
        let source_config = config
            .source
            .clone()
            .ok_or_else(|| Error::missing_field("source"))?;
        let sink_config = config
            .sink
            .clone()
            .ok_or_else(|| Error::missing_field("sink"))?;

        let store = Arc::new(MemoryStore::new());
        let mut loaded = 0;
        for document in parse_documents(&read_input(input)?)? {
            let JsonValue::Object(body) = document else {
                return Err(Error::unsupported_root("non-object document"));
            };
            let outcome = store.put(&source_config.database, body).await;
            if outcome.ok {
                loaded += 1;
            }
        }
        info!(loaded, database = %source_config.database, "Loaded documents");

        let topic = source_config.topic.clone();
        let mut source = SourceTask::new(store.clone(), source_config, config.converter.clone());
        let sink = SinkTask::new(store.clone(), sink_config.clone());

        let mut records = 0;
        let mut skipped = 0;
        let mut written = 0;
        let mut failed = Vec::new();
        loop {
            let before = source.resume_token().cloned();
            let report = source.poll().await?;
            skipped += report.skipped;
            if source.resume_token() == before.as_ref() {
                break;
            }

            let mut batch = Vec::with_capacity(report.records.len());
            for record in report.records {
                records += 1;
                if record.value.is_null() {
                    continue;
                }
                let wire = Envelope::new(record.schema, record.value).to_json()?;
                let mut sink_record = SinkRecord::from_envelope(&topic, Envelope::from_json(&wire)?);
                if let Some(key) = record.key {
                    sink_record = sink_record
                        .with_header(sink_config.id_header.clone(), key.clone())
                        .with_key(key);
                }
                batch.push(sink_record);
            }

            let sink_report = sink.put(batch).await?;
            written += sink_report.written;
            failed.extend(sink_report.failed.into_iter().map(|f| {
                json!({"id": f.id, "error": f.error, "reason": f.reason})
            }));
        }

        Ok(json!({
            "loaded": loaded,
            "records": records,
            "skipped": skipped,
            "written": written,
            "failed": failed,
            "resume_token": source.resume_token().map(ToString::to_string),
        }))
    }

    /// Output a message
    fn output_message(&self, msg: &JsonValue) {
        if self.cli.pretty {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        } else {
            println!("{}", serde_json::to_string(msg).unwrap_or_default());
        }
    }
}

/// Read a file, or stdin when no path is given
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        }),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Documents as a JSON array or one JSON value per line
fn parse_documents(text: &str) -> Result<Vec<JsonValue>> {
    if text.trim_start().starts_with('[') {
        let JsonValue::Array(items) = serde_json::from_str(text)? else {
            return Err(Error::config("Expected a JSON array of documents"));
        };
        return Ok(items);
    }
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid document on line {}", n + 1))
        })
        .collect()
}
