// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use paperdex::ranking::check_threshold;

/// paperdex - semantic retrieval for research workspaces
///
/// Chunks and embeds documents per workspace, then answers similarity
/// queries against the stored vectors.
#[derive(Parser, Debug)]
#[command(name = "paperdex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Compact JSON output (no pretty formatting)
    #[arg(long, global = true)]
    pub compact: bool,

    /// Embedding database path (overrides config)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Item text source shared by `ingest` and `reembed`.
#[derive(Args, Debug)]
pub struct ItemArgs {
    /// Workspace (tenant) that owns the item
    #[arg(short, long)]
    pub workspace: String,

    /// Item identifier within the workspace
    #[arg(short, long)]
    pub item: String,

    /// Read item text from a file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<String>,

    /// Item text (reads stdin when neither TEXT nor --file is given)
    pub text: Option<String>,

    /// Maximum characters per chunk (overrides config)
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Fail with a non-zero exit code if any chunk failed to embed
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk, embed and store an item's text
    Ingest(ItemArgs),

    /// Embed new text for an item without deleting its old records
    Reembed(ItemArgs),

    /// Rank stored chunks in a workspace against a query
    #[command(alias = "q")]
    Query {
        /// Query text
        query: String,

        /// Workspace to search
        #[arg(short, long)]
        workspace: String,

        /// Maximum number of results
        #[arg(short = 'm', long)]
        limit: Option<usize>,

        /// Minimum cosine similarity, within [-1, 1]
        #[arg(short, long, allow_negative_numbers = true, value_parser = parse_threshold)]
        threshold: Option<f32>,
    },

    /// Delete the records of an item, or of a whole workspace
    Delete {
        #[arg(short, long)]
        workspace: String,

        /// Item to delete (omit with --all to clear the workspace)
        #[arg(short, long, required_unless_present = "all")]
        item: Option<String>,

        /// Delete every record in the workspace
        #[arg(long, conflicts_with = "item")]
        all: bool,
    },

    /// Show record counts for a workspace
    Stats {
        #[arg(short, long)]
        workspace: String,
    },

    /// Show the resolved embedding provider
    Provider,

    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_threshold(raw: &str) -> Result<f32, String> {
    let value: f32 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    check_threshold(value).map_err(|_| format!("{} is outside [-1, 1]", raw))
}
