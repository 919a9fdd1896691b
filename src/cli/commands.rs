//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Rockie table export CLI
#[derive(Parser, Debug)]
#[command(name = "rockie-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to `{HOSTNAME}_log.log` in this directory
    #[arg(long, global = true, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export one entity table to CSV files on blob storage
    Export(ExportArgs),

    /// List built-in entities
    Entities,

    /// Print the table/column catalog of an entity
    Catalog {
        /// Entity name or definition file (YAML)
        #[arg(short, long, env = "ENTITY")]
        entity: String,
    },

    /// Validate an entity definition
    Validate {
        /// Entity name or definition file (YAML)
        #[arg(short, long, env = "ENTITY")]
        entity: String,
    },
}

/// Arguments of the `export` command
#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Entity name or definition file (YAML)
    #[arg(short, long, env = "ENTITY")]
    pub entity: Option<String>,

    /// Deployment stage (dev, test, prod)
    #[arg(short, long, env = "STAGE")]
    pub stage: Option<String>,

    /// Target bucket
    #[arg(short, long, env = "BUCKET")]
    pub bucket: Option<String>,

    /// Override the destination (local path, s3://, r2://, gs://, az://)
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Directory for staging files (default: system temp dir)
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Maximum items per scan page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// AWS region of the source table
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Object key template
    #[arg(long)]
    pub key_template: Option<String>,

    /// Read the table from a JSON Lines dump instead of DynamoDB
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Keep existing staging files and append to them
    #[arg(long)]
    pub append_staging: bool,

    /// Exit with status 2 when records or uploads failed
    #[arg(long)]
    pub strict: bool,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
