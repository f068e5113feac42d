//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Document store ↔ streaming platform connector CLI
#[derive(Parser, Debug)]
#[command(name = "couch-connect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pretty-print JSON output
    #[arg(short, long, global = true)]
    pub pretty: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Infer a schema for one JSON document and print the record envelope
    Infer {
        /// Document file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Flatten nested values into dotted paths
        #[arg(long, conflicts_with = "schemaless")]
        flatten: bool,

        /// Emit a schemaless record
        #[arg(long)]
        schemaless: bool,

        /// Maximum nesting depth
        #[arg(long, default_value_t = crate::config::DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Decode a record envelope and print the document that would be written
    ToDocument {
        /// Envelope file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Document id overriding the payload's `_id`
        #[arg(long)]
        id: Option<String>,
    },

    /// Validate a connector configuration file
    Validate {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Run documents through the source and sink tasks against an
    /// in-memory store
    Replay {
        /// Configuration file with `source` and `sink` sections
        #[arg(short, long)]
        config: PathBuf,

        /// Documents as a JSON array or one JSON object per line (stdin
        /// when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}
