//! Common types used throughout Rockie Ingest
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// One schema-less item as returned by the source table
pub type RawRecord = JsonObject;

// ============================================================================
// Stage
// ============================================================================

/// Deployment stage a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Development
    Dev,
    /// Testing
    Test,
    /// Production
    Prod,
}

impl Stage {
    /// Lowercase name used in table names and object keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Dev => "dev",
            Stage::Test => "test",
            Stage::Prod => "prod",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dev" => Ok(Stage::Dev),
            "test" => Ok(Stage::Test),
            "prod" => Ok(Stage::Prod),
            other => Err(Error::InvalidStage {
                value: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// Column Type (for the external schema catalog)
// ============================================================================

/// Column type declared to downstream query engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Text
    #[default]
    String,
    /// Integer
    Int,
    /// Floating point
    Double,
}

impl ColumnType {
    /// Catalog type name
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Double => "double",
        }
    }
}

// ============================================================================
// Staging Mode
// ============================================================================

/// What happens to a staging file left behind by a previous run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingMode {
    /// Remove stale files so each run starts from an empty artifact
    #[default]
    Truncate,
    /// Keep appending to an existing file, adopting its header
    Append,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}
