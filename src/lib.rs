//! # Rockie Ingest
//!
//! Full-snapshot export of DynamoDB entity tables into CSV files on blob
//! storage, for downstream batch analytics.
//!
//! ## Features
//!
//! - **Paginated Scans**: Walk a whole table page by page with a continuation cursor
//! - **Declarative Field Maps**: YAML entity definitions with dotted paths and defaults
//! - **Discriminator Routing**: One source table fanned out to several output tables
//! - **CSV Staging**: Append-only local files with a fixed header per variant
//! - **Cloud Output**: S3, R2, GCS, Azure or a local directory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rockie_ingest::{config::RunConfig, engine::ExportEngine, load_entity, Result};
//! use rockie_ingest::scan::DynamoDbSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = RunConfig::builder().stage("dev").entity("students").build()?;
//!     let entity = load_entity(config.entity())?;
//!
//!     let table = config.source_table(&entity.source_table)?;
//!     let source = DynamoDbSource::from_env(config.region(), table).await;
//!
//!     let mut engine = ExportEngine::from_config(&config, &entity, source)?;
//!     let summary = engine.run().await?;
//!     println!("{} rows written", summary.rows_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         ExportEngine                            │
//! │   INIT → SCANNING → UPLOADING → DONE            (or FAILED)     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────────┼───────────────┬──────────────────┐
//! │   Scan     │    Transform    │    Staging    │     Upload       │
//! ├────────────┼─────────────────┼───────────────┼──────────────────┤
//! │ DynamoDB   │ Dotted paths    │ CSV per       │ S3 / R2          │
//! │ JSON Lines │ Defaults        │ variant       │ GCS / Azure      │
//! │            │ Discriminator   │ Fixed header  │ Local            │
//! └────────────┴─────────────────┴───────────────┴──────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Run configuration
pub mod config;

/// Key and table name templates
pub mod template;

/// Built-in entity definitions
pub mod entities;

/// YAML loader for entity definitions
pub mod loader;

/// Paginated table scans
pub mod scan;

/// Record flattening and routing
pub mod transform;

/// CSV staging and blob storage upload
pub mod output;

/// Export orchestration
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use loader::{load_entity, load_entity_from_str, EntityDefinition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
