//! Tests for scan module

use super::*;
use crate::error::{Error, Result};
use crate::types::RawRecord;
use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::json;
use std::sync::Mutex;

fn record(id: &str) -> RawRecord {
    let mut record = RawRecord::new();
    record.insert("student_id".to_string(), json!(id));
    record
}

/// Source replaying a fixed cursor chain and remembering every cursor it saw
struct ScriptedSource {
    responses: Vec<(Option<&'static str>, Vec<RawRecord>, Option<&'static str>)>,
    seen: Mutex<Vec<Option<String>>>,
    fail_on: Option<&'static str>,
}

impl ScriptedSource {
    fn three_pages() -> Self {
        Self {
            responses: vec![
                (None, vec![record("s1"), record("s2")], Some("c1")),
                (Some("c1"), vec![record("s3")], Some("c2")),
                (Some("c2"), vec![], Some("c3")),
                (Some("c3"), vec![record("s4")], None),
            ],
            seen: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    fn seen(&self) -> Vec<Option<String>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableSource for ScriptedSource {
    type Cursor = String;

    fn table_name(&self) -> &str {
        "dev_t_students"
    }

    async fn scan_page(&self, cursor: Option<String>) -> Result<ScanPage<String>> {
        self.seen.lock().unwrap().push(cursor.clone());

        if cursor.as_deref().is_some() && cursor.as_deref() == self.fail_on {
            return Err(Error::scan("dev_t_students", "connection reset"));
        }

        let (_, items, next) = self
            .responses
            .iter()
            .find(|(expected, _, _)| expected.map(str::to_string) == cursor)
            .ok_or_else(|| Error::scan("dev_t_students", "unexpected cursor"))?;

        Ok(ScanPage {
            items: items.clone(),
            next_cursor: next.map(str::to_string),
        })
    }
}

// ============================================================================
// Scanner Tests
// ============================================================================

#[tokio::test]
async fn test_scanner_follows_cursor_chain() {
    let mut scanner = Scanner::new(ScriptedSource::three_pages());

    let mut ids = Vec::new();
    let mut numbers = Vec::new();
    while let Some(page) = scanner.next_page().await.unwrap() {
        numbers.push(page.number);
        for record in page.records {
            ids.push(record["student_id"].as_str().unwrap().to_string());
        }
    }

    assert_eq!(ids, vec!["s1", "s2", "s3", "s4"]);
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert_eq!(scanner.state().pages_fetched, 4);
    assert_eq!(scanner.state().records_fetched, 4);
    assert!(scanner.state().done);
}

#[tokio::test]
async fn test_scanner_stops_after_last_page() {
    let mut scanner = Scanner::new(MemorySource::new(
        "dev_t_students",
        vec![record("s1"), record("s2"), record("s3"), record("s4"), record("s5")],
        2,
    ));

    let mut pages = 0;
    while scanner.next_page().await.unwrap().is_some() {
        pages += 1;
    }
    assert_eq!(pages, 3);

    // Exhausted scanners never call the source again
    assert!(scanner.next_page().await.unwrap().is_none());
    assert_eq!(scanner.state().pages_fetched, 3);
}

#[tokio::test]
async fn test_three_cursors_three_visits() {
    let source = MemorySource::from_pages(
        "dev_t_students",
        vec![
            vec![record("a")],
            vec![record("b")],
            vec![record("c"), record("d")],
        ],
    );
    let mut scanner = Scanner::new(source);

    let mut all = Vec::new();
    while let Some(page) = scanner.next_page().await.unwrap() {
        all.extend(page.records);
    }

    assert_eq!(all.len(), 4);
    assert_eq!(scanner.state().pages_fetched, 3);
}

#[tokio::test]
async fn test_scanner_passes_cursors_in_order() {
    let source = ScriptedSource::three_pages();
    let mut scanner = Scanner::new(source);
    while scanner.next_page().await.unwrap().is_some() {}

    assert_eq!(
        scanner.source().seen(),
        vec![
            None,
            Some("c1".to_string()),
            Some("c2".to_string()),
            Some("c3".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_scanner_propagates_transport_error() {
    let mut source = ScriptedSource::three_pages();
    source.fail_on = Some("c2");
    let mut scanner = Scanner::new(source);

    assert!(scanner.next_page().await.unwrap().is_some());
    assert!(scanner.next_page().await.unwrap().is_some());
    let err = scanner.next_page().await.unwrap_err();
    assert!(matches!(err, Error::Scan { .. }));
    assert!(!scanner.state().done);
}

#[tokio::test]
async fn test_pages_stream() {
    let scanner = Scanner::new(MemorySource::new(
        "dev_t_activities",
        (0..7).map(|i| record(&format!("s{i}"))).collect(),
        3,
    ));

    let pages: Vec<Page> = scanner.pages().try_collect().await.unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages.iter().map(Page::len).sum::<usize>(), 7);
    assert_eq!(pages[2].number, 3);
}

// ============================================================================
// Memory Source Tests
// ============================================================================

#[tokio::test]
async fn test_memory_source_empty_table() {
    let source = MemorySource::new("dev_t_rockies", Vec::new(), 10);
    let page = source.scan_page(None).await.unwrap();
    assert!(page.items.is_empty());
    assert!(page.is_last());
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_memory_source_counts_calls() {
    let source = MemorySource::new("dev_t_rockies", vec![record("a"), record("b")], 1);
    let first = source.scan_page(None).await.unwrap();
    assert_eq!(first.next_cursor, Some(1));
    let second = source.scan_page(first.next_cursor).await.unwrap();
    assert!(second.is_last());
    assert_eq!(source.calls(), 2);
}

#[test]
fn test_memory_source_from_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("students.jsonl");
    std::fs::write(
        &path,
        "{\"student_id\":\"s1\"}\n\n{\"student_id\":\"s2\",\"student_promos\":[\"p1\"]}\n",
    )
    .unwrap();

    let source = MemorySource::from_jsonl_file("dev_t_students", &path, 1).unwrap();
    assert_eq!(source.table_name(), "dev_t_students");
    assert_eq!(source.calls(), 0);
}

#[test]
fn test_memory_source_rejects_non_object_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.jsonl");
    std::fs::write(&path, "{\"a\":1}\n[1,2]\n").unwrap();

    let err = MemorySource::from_jsonl_file("dev_t_students", &path, 10).unwrap_err();
    assert!(err.to_string().contains("Line 2"));
}

#[test]
fn test_memory_source_missing_dump() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.jsonl");

    let err = MemorySource::from_jsonl_file("dev_t_students", &path, 10).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_memory_source_unreadable_dump_names_path() {
    let dir = tempfile::tempdir().unwrap();

    let err = MemorySource::from_jsonl_file("dev_t_students", dir.path(), 10).unwrap_err();
    assert!(matches!(err, Error::Other(_)));
    assert!(err
        .to_string()
        .starts_with(&format!("Failed to read dump {}", dir.path().display())));
}
