//! CLI module
//!
//! Command-line interface for the conversion engine and connector tasks.
//!
//! # Commands
//!
//! - `infer` - Infer a schema for a document and print its envelope
//! - `to-document` - Decode an envelope into the document to write
//! - `validate` - Validate a connector configuration
//! - `replay` - Run documents through source and sink in memory

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;

#[cfg(test)]
mod tests;
