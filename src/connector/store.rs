//! Store interfaces and the in-memory store

use crate::document::OutboundDocument;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, MetadataField};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================================================
// Change Feed
// ============================================================================

/// Position in a change feed. Callers store and hand it back, never parse it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeToken(String);

impl ResumeToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the change feed
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRow {
    pub id: String,
    pub seq: ResumeToken,
    pub deleted: bool,
    /// Full document body, when requested
    pub doc: Option<JsonValue>,
}

/// A page of the change feed
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeBatch {
    pub rows: Vec<ChangeRow>,
    /// Where the next page starts
    pub last_seq: ResumeToken,
}

/// Change feed of a document store
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Changes after `since` (from the start when `None`), at most `limit`
    /// rows, with bodies when `include_docs` is set
    async fn changes(
        &self,
        database: &str,
        since: Option<&ResumeToken>,
        limit: usize,
        include_docs: bool,
    ) -> Result<ChangeBatch>;
}

// ============================================================================
// Bulk Writes
// ============================================================================

/// Per-document result of a bulk write
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub id: Option<String>,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WriteOutcome {
    pub fn success(id: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ok: true,
            rev: Some(rev.into()),
            ..Default::default()
        }
    }

    pub fn failure(
        id: Option<String>,
        error: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id,
            ok: false,
            rev: None,
            error: Some(error.into()),
            reason: Some(reason.into()),
        }
    }
}

/// Write side of a document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a batch of documents. Returns one outcome per input document,
    /// in input order; individual failures do not fail the call.
    async fn bulk_write(
        &self,
        database: &str,
        docs: Vec<OutboundDocument>,
    ) -> Result<Vec<WriteOutcome>>;
}

// ============================================================================
// Memory Store
// ============================================================================

#[derive(Debug, Clone)]
struct StoredDocument {
    generation: u64,
    rev: String,
    seq: u64,
    deleted: bool,
    body: JsonObject,
}

#[derive(Debug, Default)]
struct Database {
    docs: BTreeMap<String, StoredDocument>,
    seq: u64,
}

impl Database {
    fn write(&mut self, doc: OutboundDocument) -> WriteOutcome {
        self.seq += 1;
        let seq = self.seq;
        let id = doc.id().map_or_else(|| format!("{seq:032x}"), str::to_string);

        let generation = match (self.docs.get(&id), doc.rev()) {
            (Some(current), Some(rev)) if current.rev == rev => current.generation + 1,
            (Some(current), None) if current.deleted => current.generation + 1,
            // unknown ids are created whatever revision the write names
            (None, _) => 1,
            _ => {
                return WriteOutcome::failure(Some(id), "conflict", "Document update conflict.")
            }
        };
        let rev = format!("{generation}-{seq:016x}");

        let mut body = doc.into_body();
        let deleted = body
            .get(MetadataField::Deleted.name())
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);
        body.insert(MetadataField::Id.name().to_string(), JsonValue::String(id.clone()));
        body.insert(MetadataField::Rev.name().to_string(), JsonValue::String(rev.clone()));

        self.docs.insert(
            id.clone(),
            StoredDocument {
                generation,
                rev: rev.clone(),
                seq,
                deleted,
                body,
            },
        );
        WriteOutcome::success(id, rev)
    }
}

/// In-process document store with a change feed
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    databases: Arc<RwLock<HashMap<String, Database>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current body of a document, including `_id` and `_rev`
    pub async fn get(&self, database: &str, id: &str) -> Option<JsonValue> {
        let databases = self.databases.read().await;
        databases
            .get(database)?
            .docs
            .get(id)
            .filter(|doc| !doc.deleted)
            .map(|doc| JsonValue::Object(doc.body.clone()))
    }

    /// Number of live documents in a database
    pub async fn doc_count(&self, database: &str) -> usize {
        let databases = self.databases.read().await;
        databases
            .get(database)
            .map_or(0, |db| db.docs.values().filter(|doc| !doc.deleted).count())
    }

    /// Write a single document
    pub async fn put(&self, database: &str, doc: JsonObject) -> WriteOutcome {
        let mut databases = self.databases.write().await;
        databases
            .entry(database.to_string())
            .or_default()
            .write(OutboundDocument::from_map(doc, None))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn bulk_write(
        &self,
        database: &str,
        docs: Vec<OutboundDocument>,
    ) -> Result<Vec<WriteOutcome>> {
        let mut databases = self.databases.write().await;
        let db = databases.entry(database.to_string()).or_default();
        Ok(docs.into_iter().map(|doc| db.write(doc)).collect())
    }
}

#[async_trait]
impl ChangeFeed for MemoryStore {
    async fn changes(
        &self,
        database: &str,
        since: Option<&ResumeToken>,
        limit: usize,
        include_docs: bool,
    ) -> Result<ChangeBatch> {
        let since = match since {
            Some(token) => token
                .as_str()
                .parse::<u64>()
                .map_err(|_| Error::store(format!("Invalid resume token '{token}'")))?,
            None => 0,
        };

        let databases = self.databases.read().await;
        let Some(db) = databases.get(database) else {
            return Err(Error::store(format!("Database '{database}' does not exist")));
        };

        // one row per document, at its latest sequence
        let mut changed: Vec<(&String, &StoredDocument)> =
            db.docs.iter().filter(|(_, doc)| doc.seq > since).collect();
        changed.sort_by_key(|(_, doc)| doc.seq);
        changed.truncate(limit);

        let last_seq = changed.last().map_or(since, |(_, doc)| doc.seq);
        let rows = changed
            .into_iter()
            .map(|(id, doc)| ChangeRow {
                id: id.clone(),
                seq: ResumeToken::new(doc.seq.to_string()),
                deleted: doc.deleted,
                doc: include_docs.then(|| JsonValue::Object(doc.body.clone())),
            })
            .collect();

        Ok(ChangeBatch {
            rows,
            last_seq: ResumeToken::new(last_seq.to_string()),
        })
    }
}
