//! Sink task: records → documents

use super::store::DocumentStore;
use crate::bridge::to_document_map;
use crate::config::SinkConfig;
use crate::document::OutboundDocument;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::schema::{Schema, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A record consumed from the streaming platform
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRecord {
    pub topic: String,
    pub key: Option<String>,
    pub schema: Option<Schema>,
    pub value: Value,
    pub headers: BTreeMap<String, String>,
}

impl SinkRecord {
    pub fn new(topic: impl Into<String>, schema: Option<Schema>, value: Value) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            schema,
            value,
            headers: BTreeMap::new(),
        }
    }

    /// Record carrying a decoded envelope
    pub fn from_envelope(topic: impl Into<String>, envelope: Envelope) -> Self {
        Self::new(topic, envelope.schema, envelope.payload)
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A record that did not make it into the store
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    /// Position of the record in the `put` call
    pub index: usize,
    pub id: Option<String>,
    pub error: String,
    pub reason: Option<String>,
}

/// Result of one `put`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkReport {
    pub written: usize,
    /// Records from topics this task does not consume
    pub skipped: usize,
    pub failed: Vec<RecordFailure>,
}

impl SinkReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Writes records into one database
pub struct SinkTask {
    store: Arc<dyn DocumentStore>,
    config: SinkConfig,
}

impl SinkTask {
    pub fn new(store: Arc<dyn DocumentStore>, config: SinkConfig) -> Self {
        Self { store, config }
    }

    /// Convert and write a batch of records.
    ///
    /// Conversion and per-document write failures are reported in the
    /// returned [`SinkReport`]; only store-level errors fail the call.
    pub async fn put(&self, records: Vec<SinkRecord>) -> Result<SinkReport> {
        let mut report = SinkReport::default();
        let mut pending: Vec<(usize, OutboundDocument)> = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            if !self.consumes(&record.topic) {
                debug!(topic = %record.topic, "Skipping record from unsubscribed topic");
                report.skipped += 1;
                continue;
            }
            match self.to_document(&record) {
                Ok(doc) => pending.push((index, doc)),
                Err(e) if e.is_per_record() => {
                    warn!(index, key = ?record.key, error = %e, "Record could not be converted");
                    report.failed.push(RecordFailure {
                        index,
                        id: record.key.clone(),
                        error: e.to_string(),
                        reason: None,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        for chunk in pending.chunks(self.config.batch_size.max(1)) {
            let docs = chunk.iter().map(|(_, doc)| doc.clone()).collect();
            let outcomes = self.store.bulk_write(&self.config.database, docs).await?;

            for ((index, doc), outcome) in chunk.iter().zip(outcomes) {
                if outcome.ok {
                    report.written += 1;
                    continue;
                }
                let id = outcome.id.or_else(|| doc.id().map(str::to_string));
                let error = outcome.error.unwrap_or_else(|| "unknown".to_string());
                warn!(
                    index,
                    id = ?id,
                    error = %error,
                    reason = ?outcome.reason,
                    "Document write failed"
                );
                report.failed.push(RecordFailure {
                    index: *index,
                    id,
                    error,
                    reason: outcome.reason,
                });
            }
        }

        debug!(
            database = %self.config.database,
            written = report.written,
            failed = report.failed.len(),
            "Put batch"
        );
        Ok(report)
    }

    fn consumes(&self, topic: &str) -> bool {
        self.config.topics.is_empty() || self.config.topics.iter().any(|t| t == topic)
    }

    fn to_document(&self, record: &SinkRecord) -> Result<OutboundDocument> {
        let map = to_document_map(&record.value, record.schema.as_ref())?;
        let id_override = record.headers.get(&self.config.id_header).map(String::as_str);
        Ok(OutboundDocument::from_map(map, id_override))
    }
}
