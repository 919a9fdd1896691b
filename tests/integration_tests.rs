//! Integration tests using in-memory sources and a local destination
//!
//! Tests the full end-to-end flow: entity definition → paged scan → CSV staging → upload

use clap::Parser;
use pretty_assertions::assert_eq;
use rockie_ingest::cli::{Cli, RunOutcome, Runner};
use rockie_ingest::config::RunConfig;
use rockie_ingest::engine::{ExportEngine, RunState};
use rockie_ingest::scan::MemorySource;
use rockie_ingest::transform::decode_nested;
use rockie_ingest::{load_entity, load_entity_from_str, JsonValue, RawRecord};
use serde_json::json;
use std::path::Path;
use tempfile::tempdir;

fn raw(value: JsonValue) -> RawRecord {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

fn write_dump(dir: &Path, records: &[JsonValue]) -> std::path::PathBuf {
    let path = dir.join("dump.jsonl");
    let lines: Vec<String> = records.iter().map(ToString::to_string).collect();
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

// ============================================================================
// Engine Integration Tests
// ============================================================================

#[tokio::test]
async fn test_student_scenario_across_three_pages() {
    let staging = tempdir().unwrap();
    let bucket = tempdir().unwrap();
    let config = RunConfig::builder()
        .stage("dev")
        .entity("students")
        .staging_dir(staging.path())
        .destination(bucket.path().to_str().unwrap())
        .build()
        .unwrap();
    let entity = load_entity("students").unwrap();

    let pages = vec![
        vec![raw(json!({
            "tenant_id": "t1",
            "student_id": "s1",
            "student_email": "a@b.com",
            "student_data": {"student_name": "Ana", "rockie_coins": 10},
            "student_promos": ["p1", "p2"]
        }))],
        vec![raw(json!({"tenant_id": "t1", "student_id": "s2"}))],
        vec![raw(json!({"tenant_id": "t2", "student_id": "s3", "student_data": {"gender": "F"}}))],
    ];
    let source = MemorySource::from_pages("dev_t_students", pages);

    let mut engine = ExportEngine::from_config(&config, &entity, source).unwrap();
    let summary = engine.run().await.unwrap();

    assert_eq!(summary.state, RunState::Done);
    assert_eq!(summary.pages, 3);
    assert_eq!(engine.sink().file("students").unwrap().rows_written(), 3);

    let (header, rows) = read_csv(&bucket.path().join("dev/t_students/students_data.csv"));
    assert_eq!(header, entity.variants[0].column_names());
    assert_eq!(rows.len(), 3);

    let ana = &rows[0];
    assert_eq!(ana[0], "t1");
    assert_eq!(ana[1], "s1");
    assert_eq!(ana[2], "a@b.com");
    assert_eq!(ana[4], "Ana");
    assert_eq!(ana[9], "10");
    assert_eq!(decode_nested(&ana[11]).unwrap(), json!(["p1", "p2"]));

    let ids: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2", "s3"]);
}

#[tokio::test]
async fn test_custom_definition_fan_out() {
    let staging = tempdir().unwrap();
    let bucket = tempdir().unwrap();
    let entity = load_entity_from_str(
        r#"
name: scores
source_table: t_scores
id_field: score_id
variants:
  - name: scores
    table: t_scores
    entity: scores
    columns:
      - { name: score_id, path: score_id }
      - { name: value, path: detail.value, default: 0.0, type: double }
  - name: score_tags
    table: t_score_tags
    entity: score_tags
    columns:
      - { name: score_id, path: score_id }
      - { name: tags, path: detail.tags, default: [] }
"#,
    )
    .unwrap();
    let config = RunConfig::builder()
        .stage("test")
        .entity("scores")
        .staging_dir(staging.path())
        .destination(bucket.path().to_str().unwrap())
        .build()
        .unwrap();

    let source = MemorySource::new(
        "test_t_scores",
        vec![
            raw(json!({"score_id": "x1", "detail": {"value": 9.5, "tags": ["a", "b"]}})),
            raw(json!({"score_id": "x2"})),
        ],
        1,
    );
    let mut engine = ExportEngine::from_config(&config, &entity, source).unwrap();
    let summary = engine.run().await.unwrap();
    assert_eq!(summary.rows_written(), 4);

    let (_, scores) = read_csv(&bucket.path().join("test/t_scores/scores_data.csv"));
    assert_eq!(scores, vec![vec!["x1", "9.5"], vec!["x2", "0.0"]]);

    let (_, tags) = read_csv(&bucket.path().join("test/t_score_tags/score_tags_data.csv"));
    assert_eq!(decode_nested(&tags[0][1]).unwrap(), json!(["a", "b"]));
    assert_eq!(tags[1][1], "[]");
}

// ============================================================================
// CLI Integration Tests
// ============================================================================

#[tokio::test]
async fn test_cli_export_from_dump() {
    let work = tempdir().unwrap();
    let bucket = work.path().join("bucket");
    let staging = work.path().join("staging");
    let dump = write_dump(
        work.path(),
        &[
            json!({"tenant_id": "t1", "product_id": "p1", "store_type": "Promotion", "price": 5,
                   "product_info": {"product_brand": "Acme"}}),
            json!({"tenant_id": "t1", "product_id": "p2", "store_type": "Accessories",
                   "product_info": {"category": "hats"}}),
            json!({"tenant_id": "t1", "product_id": "p3", "store_type": "Other"}),
        ],
    );

    let cli = Cli::try_parse_from([
        "rockie-ingest",
        "export",
        "--entity",
        "purshable",
        "--stage",
        "prod",
        "--input",
        dump.to_str().unwrap(),
        "--destination",
        bucket.to_str().unwrap(),
        "--staging-dir",
        staging.to_str().unwrap(),
        "--strict",
    ])
    .unwrap();

    let outcome = Runner::new(cli).run().await.unwrap();
    assert_eq!(outcome, RunOutcome::CompletedWithFailures);

    let (promo_header, promos) = read_csv(&bucket.join("prod/t_promos/promos_data.csv"));
    assert!(promo_header.contains(&"product_brand".to_string()));
    assert_eq!(promos.len(), 1);
    assert_eq!(promos[0][1], "p1");
    assert_eq!(promos[0][4], "Acme");

    let (accesory_header, accesories) =
        read_csv(&bucket.join("prod/t_accesories/accesories_data.csv"));
    assert!(!accesory_header.contains(&"product_brand".to_string()));
    assert_eq!(accesories.len(), 1);
    assert_eq!(accesories[0][1], "p2");
    assert_eq!(accesories[0][4], "hats");
}

#[tokio::test]
async fn test_cli_invalid_stage_touches_nothing() {
    let work = tempdir().unwrap();
    let bucket = work.path().join("bucket");
    let staging = work.path().join("staging");

    let cli = Cli::try_parse_from([
        "rockie-ingest",
        "export",
        "--entity",
        "students",
        "--stage",
        "staging",
        "--input",
        "missing.jsonl",
        "--destination",
        bucket.to_str().unwrap(),
        "--staging-dir",
        staging.to_str().unwrap(),
    ])
    .unwrap();

    let err = Runner::new(cli).run().await.unwrap_err();
    assert!(err.is_fatal());
    assert!(!bucket.exists());
    assert!(!staging.exists());
}

#[tokio::test]
async fn test_cli_catalog_and_validate() {
    for command in ["catalog", "validate"] {
        let cli =
            Cli::try_parse_from(["rockie-ingest", command, "--entity", "rockies"]).unwrap();
        assert_eq!(Runner::new(cli).run().await.unwrap(), RunOutcome::Success);
    }

    let cli = Cli::try_parse_from(["rockie-ingest", "validate", "--entity", "nope"]).unwrap();
    assert!(Runner::new(cli).run().await.is_err());
}
