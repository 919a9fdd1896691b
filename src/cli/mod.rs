//! CLI module
//!
//! Command-line interface for running exports.
//!
//! # Commands
//!
//! - `export` - Scan a table and upload its CSV files
//! - `entities` - List built-in entities
//! - `catalog` - Print table/column catalog of an entity
//! - `validate` - Validate an entity definition

mod commands;
mod runner;

pub use commands::{Cli, Commands, ExportArgs, OutputFormat};
pub use runner::{RunOutcome, Runner};
