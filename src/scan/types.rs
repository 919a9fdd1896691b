//! Scan types and traits
//!
//! Defines the source table abstraction every scanner drives.

use crate::error::Result;
use crate::types::RawRecord;
use async_trait::async_trait;
use std::fmt::Debug;

/// One response of the source table's scan call
#[derive(Debug, Clone)]
pub struct ScanPage<C> {
    /// Items in the order the store returned them
    pub items: Vec<RawRecord>,
    /// Continuation cursor; `None` means the table is exhausted
    pub next_cursor: Option<C>,
}

impl<C> ScanPage<C> {
    /// A page with more pages behind it
    pub fn more(items: Vec<RawRecord>, cursor: C) -> Self {
        Self {
            items,
            next_cursor: Some(cursor),
        }
    }

    /// The final page
    pub fn last(items: Vec<RawRecord>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    /// Check if this is the final page
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// A page handed to the transformer
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// 1-based page number within the run
    pub number: usize,
    /// Records of the page
    pub records: Vec<RawRecord>,
}

impl Page {
    /// Number of records in the page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Tracks scan progress during iteration
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    /// Pages fetched so far
    pub pages_fetched: usize,
    /// Records fetched so far
    pub records_fetched: usize,
    /// Is the scan complete?
    pub done: bool,
}

impl ScanState {
    /// Create a new scan state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched page
    pub fn add_page(&mut self, records: usize) {
        self.pages_fetched += 1;
        self.records_fetched += records;
    }

    /// Mark the scan as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }
}

/// A remote table that can be scanned page by page
///
/// Each call takes the cursor returned by the previous call (or `None` for the
/// first page). Transport failures are returned as errors; no retry happens
/// at this layer.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Opaque continuation token
    type Cursor: Clone + Debug + Send + Sync;

    /// Physical table name, for diagnostics
    fn table_name(&self) -> &str;

    /// Fetch one page starting after `cursor`
    async fn scan_page(&self, cursor: Option<Self::Cursor>) -> Result<ScanPage<Self::Cursor>>;
}
