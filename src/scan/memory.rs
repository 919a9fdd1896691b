//! In-memory table source
//!
//! Serves pre-loaded records in fixed-size pages, either from a vector or from
//! a JSON Lines dump of the table. Used for offline exports and tests.

use super::types::{ScanPage, TableSource};
use crate::error::{Error, Result, ResultExt};
use crate::types::{JsonValue, RawRecord};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Source backed by records held in memory
#[derive(Debug)]
pub struct MemorySource {
    table: String,
    pages: Vec<Vec<RawRecord>>,
    calls: AtomicUsize,
}

impl MemorySource {
    /// Split `records` into pages of `page_size`
    pub fn new(table: impl Into<String>, records: Vec<RawRecord>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let mut pages: Vec<Vec<RawRecord>> = Vec::new();
        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            pages.push(records.by_ref().take(page_size).collect());
        }
        Self::from_pages(table, pages)
    }

    /// Use explicit page boundaries
    pub fn from_pages(table: impl Into<String>, pages: Vec<Vec<RawRecord>>) -> Self {
        Self {
            table: table.into(),
            pages,
            calls: AtomicUsize::new(0),
        }
    }

    /// Load a JSON Lines dump, one item per line
    pub fn from_jsonl_file(
        table: impl Into<String>,
        path: impl AsRef<Path>,
        page_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            read => read.with_context(|| format!("Failed to read dump {}", path.display()))?,
        };
        let records = parse_jsonl(&content)?;
        Ok(Self::new(table, records, page_size))
    }

    /// Number of scan calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableSource for MemorySource {
    type Cursor = usize;

    fn table_name(&self) -> &str {
        &self.table
    }

    async fn scan_page(&self, cursor: Option<usize>) -> Result<ScanPage<usize>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let index = cursor.unwrap_or(0);
        let Some(items) = self.pages.get(index) else {
            if index == 0 {
                return Ok(ScanPage::last(Vec::new()));
            }
            return Err(Error::scan(
                &self.table,
                format!("cursor {index} is past the last page"),
            ));
        };

        if index + 1 < self.pages.len() {
            Ok(ScanPage::more(items.clone(), index + 1))
        } else {
            Ok(ScanPage::last(items.clone()))
        }
    }
}

/// Parse JSON Lines into records, skipping blank lines
fn parse_jsonl(content: &str) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<JsonValue>(line)? {
            JsonValue::Object(record) => records.push(record),
            other => {
                return Err(Error::config(format!(
                    "Line {} of the dump is not an object: {other}",
                    line_num + 1
                )))
            }
        }
    }

    Ok(records)
}
