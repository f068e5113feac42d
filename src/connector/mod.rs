//! Connector tasks and their store collaborators
//!
//! # Overview
//!
//! - [`SourceTask`] follows a database change feed and turns each document
//!   into a typed record through the [`Converter`](crate::convert::Converter)
//! - [`SinkTask`] unwraps records into plain documents and bulk-writes them
//! - [`DocumentStore`] and [`ChangeFeed`] are the store seams; [`MemoryStore`]
//!   implements both in process
//!
//! Both tasks treat conversion failures as per-record: the record is logged
//! and reported, and the rest of the batch continues.

mod sink;
mod source;
mod store;

pub use sink::{RecordFailure, SinkRecord, SinkReport, SinkTask};
pub use source::{PollReport, SourceRecord, SourceTask};
pub use store::{
    ChangeBatch, ChangeFeed, ChangeRow, DocumentStore, MemoryStore, ResumeToken, WriteOutcome,
};
