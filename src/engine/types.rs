//! Engine types
//!
//! Run states and the structured summary of one export run.

use crate::transform::RecordFailure;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle of one export run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// Configuration resolved, nothing touched yet
    Init,
    /// Pulling pages and appending rows
    Scanning,
    /// Pushing staging files to blob storage
    Uploading,
    /// Upload phase finished, whatever the per-target outcomes
    Done,
    /// Aborted by a fatal error
    Failed,
}

impl RunState {
    /// Upper-case state name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Scanning => "SCANNING",
            Self::Uploading => "UPLOADING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }

    /// Check if the run can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of uploading one variant's staging file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    /// Variant name
    pub variant: String,
    /// Object key
    pub key: String,
    /// Destination URI on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<String>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadOutcome {
    /// A successful upload
    pub fn uploaded(variant: impl Into<String>, key: impl Into<String>, uri: String) -> Self {
        Self {
            variant: variant.into(),
            key: key.into(),
            uploaded: Some(uri),
            error: None,
        }
    }

    /// A failed upload
    pub fn failed(variant: impl Into<String>, key: impl Into<String>, error: String) -> Self {
        Self {
            variant: variant.into(),
            key: key.into(),
            uploaded: None,
            error: Some(error),
        }
    }

    /// Check if the object was written
    pub fn is_success(&self) -> bool {
        self.uploaded.is_some()
    }
}

/// Structured report of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Run identifier, e.g. `ingesta_dev_students`
    pub run_id: String,
    /// Stage name
    pub stage: String,
    /// Entity name
    pub entity: String,
    /// Final (or current) state
    pub state: RunState,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
    /// Pages fetched
    pub pages: usize,
    /// Records scanned
    pub records_scanned: usize,
    /// Rows written per variant
    pub rows: BTreeMap<String, usize>,
    /// Records dropped
    pub failures: Vec<RecordFailure>,
    /// Per-variant upload results
    pub uploads: Vec<UploadOutcome>,
}

impl RunSummary {
    /// Empty summary for a run about to start
    pub fn new(
        run_id: impl Into<String>,
        stage: impl Into<String>,
        entity: impl Into<String>,
        variants: &[&str],
    ) -> Self {
        Self {
            run_id: run_id.into(),
            stage: stage.into(),
            entity: entity.into(),
            state: RunState::Init,
            started_at: Utc::now(),
            duration_ms: 0,
            pages: 0,
            records_scanned: 0,
            rows: variants.iter().map(|v| ((*v).to_string(), 0)).collect(),
            failures: Vec::new(),
            uploads: Vec::new(),
        }
    }

    /// Count one written row
    pub fn add_row(&mut self, variant: &str) {
        *self.rows.entry(variant.to_string()).or_default() += 1;
    }

    /// Rows written across all variants
    pub fn rows_written(&self) -> usize {
        self.rows.values().sum()
    }

    /// Uploads that failed
    pub fn failed_uploads(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.uploads.iter().filter(|u| !u.is_success())
    }

    /// Check if any record or upload failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || self.failed_uploads().next().is_some()
    }
}
