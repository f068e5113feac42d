//! Source task: change feed → typed records

use super::store::{ChangeFeed, ChangeRow, ResumeToken};
use crate::config::{ConverterConfig, SourceConfig};
use crate::convert::Converter;
use crate::document::Document;
use crate::error::Result;
use crate::schema::{Schema, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// A converted document ready for the streaming platform
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub topic: String,
    /// Document id
    pub key: Option<String>,
    /// `None` for schemaless records and deletion tombstones
    pub schema: Option<Schema>,
    pub value: Value,
    /// Feed position of this change
    pub offset: ResumeToken,
}

/// Result of one poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    pub records: Vec<SourceRecord>,
    /// Documents dropped because they could not be converted
    pub skipped: usize,
    /// Position after this poll
    pub resume_token: Option<ResumeToken>,
}

/// Follows one database's change feed
pub struct SourceTask {
    feed: Arc<dyn ChangeFeed>,
    config: SourceConfig,
    converter: Converter,
    resume: Option<ResumeToken>,
}

impl SourceTask {
    pub fn new(feed: Arc<dyn ChangeFeed>, config: SourceConfig, converter: ConverterConfig) -> Self {
        Self {
            feed,
            config,
            converter: Converter::new(converter),
            resume: None,
        }
    }

    /// Resume from a previously stored position
    #[must_use]
    pub fn with_resume_token(mut self, token: ResumeToken) -> Self {
        self.resume = Some(token);
        self
    }

    /// Current feed position
    pub fn resume_token(&self) -> Option<&ResumeToken> {
        self.resume.as_ref()
    }

    /// Fetch the next page of changes and convert it.
    ///
    /// Documents that fail conversion are logged and skipped; store errors
    /// abort the poll without moving the resume token.
    pub async fn poll(&mut self) -> Result<PollReport> {
        let batch = self
            .feed
            .changes(
                &self.config.database,
                self.resume.as_ref(),
                self.config.batch_size,
                self.config.include_docs,
            )
            .await?;

        debug!(
            database = %self.config.database,
            rows = batch.rows.len(),
            last_seq = %batch.last_seq,
            "Fetched changes"
        );

        let mut report = PollReport::default();
        for row in batch.rows {
            match self.convert_row(&row) {
                Ok(Some(record)) => report.records.push(record),
                Ok(None) => debug!(id = %row.id, "Change row has no document body"),
                Err(e) if e.is_per_record() => {
                    warn!(id = %row.id, error = %e, "Dropping document that failed conversion");
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        self.resume = Some(batch.last_seq.clone());
        report.resume_token = Some(batch.last_seq);
        Ok(report)
    }

    fn convert_row(&self, row: &ChangeRow) -> Result<Option<SourceRecord>> {
        let record = |schema, value| SourceRecord {
            topic: self.config.topic.clone(),
            key: Some(row.id.clone()),
            schema,
            value,
            offset: row.seq.clone(),
        };

        if row.deleted {
            return Ok(Some(record(None, Value::Null)));
        }
        let Some(body) = &row.doc else {
            return Ok(None);
        };

        let document = Document::from_json(body)?;
        let (schema, value) = self.converter.convert(&document.to_json())?.into_record()?;
        Ok(Some(record(schema, value)))
    }
}
