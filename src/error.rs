//! Error types for Rockie Ingest
//!
//! This module defines the error hierarchy for the whole export pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into three groups: configuration and scan-transport errors
//! abort a run, while record-level and upload errors are isolated to the
//! unit of work that raised them.

use thiserror::Error;

/// The main error type for Rockie Ingest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Invalid or inconsistent run configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
    },

    /// A required setting was not provided
    #[error("Missing required config field: {field}")]
    MissingConfigField {
        /// Name of the setting
        field: String,
    },

    /// A setting was provided with an unusable value
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue {
        /// Name of the setting
        field: String,
        /// Why the value is rejected
        message: String,
    },

    /// Stage name outside `dev`, `test`, `prod`
    #[error("Invalid stage '{value}': expected one of dev, test, prod")]
    InvalidStage {
        /// Rejected stage text
        value: String,
    },

    /// No built-in entity or definition file by that name
    #[error("Unknown entity '{name}'")]
    UnknownEntity {
        /// Requested entity name
        name: String,
    },

    /// Entity definition failed validation
    #[error("Invalid entity definition '{entity}': {message}")]
    InvalidDefinition {
        /// Entity name
        entity: String,
        /// Validation failure
        message: String,
    },

    /// Entity definition is not valid YAML
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON encoding or decoding failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    /// A scan call against the source table failed
    #[error("Scan of table '{table}' failed: {message}")]
    Scan {
        /// Physical table name
        table: String,
        /// Transport failure
        message: String,
    },

    /// A staging file could not be uploaded
    #[error("Upload to '{key}' failed: {message}")]
    Upload {
        /// Object key of the upload
        key: String,
        /// Transport failure
        message: String,
    },

    /// Error raised by the object store client
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    // ============================================================================
    // Record Errors
    // ============================================================================
    /// One record could not be transformed
    #[error("Record '{id}' skipped: {message}")]
    Record {
        /// Record identifier, or `unknown`
        id: String,
        /// Why the record was skipped
        message: String,
    },

    /// Discriminator value matches no declared variant
    #[error("Record '{id}' has unrecognized {field} value '{value}'")]
    UnmatchedDiscriminator {
        /// Record identifier, or `unknown`
        id: String,
        /// Discriminator field
        field: String,
        /// Value found in the record
        value: String,
    },

    /// Row columns differ from the staging file header
    #[error("Row for variant '{variant}' has columns {actual:?}, header is {expected:?}")]
    Format {
        /// Variant whose file rejected the row
        variant: String,
        /// Established header
        expected: Vec<String>,
        /// Columns of the rejected row
        actual: Vec<String>,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// Local filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read or write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was looked up
        path: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Any other error, usually with added context
    #[error("{0}")]
    Other(String),

    /// Error passed through from `anyhow`
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid entity definition error
    pub fn definition(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            entity: entity.into(),
            message: message.into(),
        }
    }

    /// Create a scan transport error
    pub fn scan(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scan {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an upload transport error
    pub fn upload(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a record error
    pub fn record(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Record {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Check if this error only affects a single record
    ///
    /// Record-level errors drop the offending record and let the run continue.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Error::Record { .. } | Error::UnmatchedDiscriminator { .. } | Error::Format { .. }
        )
    }

    /// Check if this error aborts the run when raised outside the upload phase
    pub fn is_fatal(&self) -> bool {
        !self.is_record_level() && !matches!(self, Error::Upload { .. })
    }
}

/// Result type alias for Rockie Ingest
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
