use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "asset-duper")]
#[command(about = "Find UUID/filename duplicates across asset batches", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Where the raw keys come from. Exactly one must be given.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// CSV export with one object key per row (see --column)
    #[arg(long, value_name = "FILE")]
    pub keys_csv: Option<PathBuf>,

    /// Plain-text list with one key or path per line
    #[arg(long, value_name = "FILE")]
    pub key_list: Option<PathBuf>,

    /// Local directory tree, e.g. an external drive copy of the bucket
    #[arg(long, value_name = "DIR")]
    pub local_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the inventory, report cross-batch duplicates and propose removals
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        /// Column holding the key in --keys-csv (defaults to `path_column`)
        #[arg(long)]
        column: Option<String>,

        /// Allow the top-level folder fallback when inferring batches
        #[arg(long)]
        bucket_wide: bool,
    },
    /// Compare a reference list against a target listing and report missing/extra assets
    Compare {
        /// Reference list, one entry per line
        #[arg(long, value_name = "FILE")]
        reference: PathBuf,

        #[command(flatten)]
        target: SourceArgs,

        /// Column holding the key in --keys-csv (defaults to `path_column`)
        #[arg(long)]
        column: Option<String>,
    },
    /// Show how a single key is split into batch, UUID and filename
    ParseKey {
        key: String,

        #[arg(long)]
        bucket_wide: bool,
    },
    /// Print configuration values
    PrintConfig,
}
