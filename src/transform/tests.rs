//! Tests for transform module

use super::*;
use crate::error::Error;
use crate::loader::{load_entity, EntityDefinition};
use crate::types::{JsonValue, RawRecord};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

fn raw(value: JsonValue) -> RawRecord {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn entity(name: &str) -> EntityDefinition {
    load_entity(name).unwrap()
}

fn cells(row: &FlatRow) -> Vec<(&str, &str)> {
    row.columns()
        .iter()
        .map(String::as_str)
        .zip(row.values().iter().map(String::as_str))
        .collect()
}

// ============================================================================
// Field Extraction Tests
// ============================================================================

#[test]
fn test_student_export_row() {
    let students = entity("students");
    let transformer = RecordTransformer::new(&students);

    let record = raw(json!({
        "tenant_id": "t1",
        "student_id": "s1",
        "student_email": "a@b.com",
        "student_data": {"student_name": "Ana", "rockie_coins": 10},
        "student_promos": ["p1", "p2"]
    }));

    let rows = transformer.transform(&record).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].variant, "students");
    assert_eq!(
        cells(&rows[0].row),
        vec![
            ("tenant_id", "t1"),
            ("student_id", "s1"),
            ("student_email", "a@b.com"),
            ("creation_date", ""),
            ("student_name", "Ana"),
            ("password", ""),
            ("birthday", ""),
            ("gender", ""),
            ("telephone", ""),
            ("rockie_coins", "10"),
            ("rockie_gems", "0"),
            ("student_promos", r#"["p1","p2"]"#),
        ]
    );
}

#[test]
fn test_missing_fields_use_defaults() {
    let students = entity("students");
    let transformer = RecordTransformer::new(&students);

    let rows = transformer.transform(&raw(json!({}))).unwrap();
    let row = &rows[0].row;

    assert_eq!(row.columns(), students.variants[0].column_names().as_slice());
    assert_eq!(row.get("student_id"), Some(""));
    assert_eq!(row.get("rockie_coins"), Some("0"));
    assert_eq!(row.get("student_promos"), Some("[]"));
}

#[test]
fn test_null_values_use_defaults() {
    let activities = entity("activities");
    let transformer = RecordTransformer::new(&activities);

    let record = raw(json!({
        "activity_id": "a1",
        "activity_type": null,
        "activity_data": null
    }));
    let rows = transformer.transform(&record).unwrap();
    assert_eq!(rows[0].row.get("activity_type"), Some(""));
    assert_eq!(rows[0].row.get("time"), Some("0"));
}

#[test]
fn test_nested_path_extraction() {
    let activities = entity("activities");
    let transformer = RecordTransformer::new(&activities);

    let record = raw(json!({
        "tenant_id": "t1",
        "activity_id": "a1",
        "activity_data": {"time": 42.5}
    }));
    let rows = transformer.transform(&record).unwrap();
    assert_eq!(rows[0].row.get("time"), Some("42.5"));
}

#[test]
fn test_rockie_accessory_ids_encoded() {
    let rockies = entity("rockies");
    let transformer = RecordTransformer::new(&rockies);

    let ids = json!(["hat-1", "arm-7", {"slot": "bg", "id": 3}]);
    let record = raw(json!({
        "student_id": "s9",
        "level": 3,
        "rockie_data": {"rockie_name": "Rocky", "rockie_adorned": true},
        "rockie_all_accesories_ids": ids
    }));

    let rows = transformer.transform(&record).unwrap();
    let row = &rows[0].row;
    assert_eq!(row.get("level"), Some("3"));
    assert_eq!(row.get("rockie_adorned"), Some("true"));
    assert_eq!(row.get("evolution"), Some(""));

    let encoded = row.get("rockie_all_accesories_ids").unwrap();
    assert_eq!(decode_nested(encoded).unwrap(), ids);
}

#[test]
fn test_nested_map_in_scalar_column_is_encoded() {
    let rockies = entity("rockies");
    let transformer = RecordTransformer::new(&rockies);

    let record = raw(json!({
        "student_id": "s1",
        "rockie_data": {"head_accesory": {"id": "crown", "color": "gold"}}
    }));
    let rows = transformer.transform(&record).unwrap();
    let cell = rows[0].row.get("head_accesory").unwrap();
    assert_eq!(
        decode_nested(cell).unwrap(),
        json!({"id": "crown", "color": "gold"})
    );
}

#[test]
fn test_malformed_intermediate_is_record_error() {
    let students = entity("students");
    let transformer = RecordTransformer::new(&students);

    let record = raw(json!({
        "student_id": "s1",
        "student_data": "not-a-map"
    }));
    let err = transformer.transform(&record).unwrap_err();
    assert!(err.is_record_level());
    assert!(matches!(&err, Error::Record { id, .. } if id == "s1"));
    assert!(err.to_string().contains("'student_data' is a string"));
}

// ============================================================================
// Discriminator Routing Tests
// ============================================================================

#[test_case("Promotion", "promos", 7 ; "promotion goes to promos")]
#[test_case("Accessories", "accesories", 6 ; "accessories goes to accesories")]
fn test_purchasable_routing(store_type: &str, variant: &str, columns: usize) {
    let purchasables = entity("purchasables");
    let transformer = RecordTransformer::new(&purchasables);

    let record = raw(json!({
        "tenant_id": "t1",
        "product_id": "p1",
        "store_type": store_type,
        "price": 150,
        "product_info": {"image": "img.png", "product_brand": "Acme", "category": "hats"}
    }));

    let rows = transformer.transform(&record).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].variant, variant);
    assert_eq!(rows[0].row.len(), columns);
    assert_eq!(
        rows[0].row.columns(),
        purchasables
            .variant(variant)
            .unwrap()
            .column_names()
            .as_slice()
    );
    assert_eq!(rows[0].row.get("price"), Some("150"));
    assert_eq!(rows[0].row.get("product_name"), Some(""));
}

#[test_case(json!({"product_id": "p3", "store_type": "Other"}), "Other" ; "unknown value")]
#[test_case(json!({"product_id": "p3"}), "" ; "missing field")]
#[test_case(json!({"product_id": "p3", "store_type": 5}), "5" ; "non string value")]
fn test_unmatched_discriminator(record: JsonValue, expected_value: &str) {
    let purchasables = entity("purchasables");
    let transformer = RecordTransformer::new(&purchasables);

    let err = transformer.transform(&raw(record)).unwrap_err();
    match err {
        Error::UnmatchedDiscriminator { id, field, value } => {
            assert_eq!(id, "p3");
            assert_eq!(field, "store_type");
            assert_eq!(value, expected_value);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_fan_out_without_discriminator() {
    let yaml = r#"
name: split
source_table: t_split
id_field: id
variants:
  - name: left
    table: t_left
    entity: left
    columns:
      - { name: id, path: id }
  - name: right
    table: t_right
    entity: right
    columns:
      - { name: id, path: id }
      - { name: extra, path: meta.extra, default: "n/a" }
"#;
    let def = crate::loader::load_entity_from_str(yaml).unwrap();
    let transformer = RecordTransformer::new(&def);

    let rows = transformer.transform(&raw(json!({"id": "x"}))).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].variant, "left");
    assert_eq!(rows[1].variant, "right");
    assert_eq!(rows[1].row.get("extra"), Some("n/a"));
}

// ============================================================================
// Page Isolation Tests
// ============================================================================

#[test]
fn test_transform_page_isolates_failures() {
    let purchasables = entity("purchasables");
    let transformer = RecordTransformer::new(&purchasables);

    let records = vec![
        raw(json!({"product_id": "p1", "store_type": "Promotion"})),
        raw(json!({"product_id": "p2", "store_type": "Other"})),
        raw(json!({"product_id": "p3", "store_type": "Accessories", "product_info": [1]})),
        raw(json!({"product_id": "p4", "store_type": "Accessories"})),
    ];

    let outcome = transformer.transform_page(&records);
    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.rows[0].row.get("product_id"), Some("p1"));
    assert_eq!(outcome.rows[1].row.get("product_id"), Some("p4"));

    let failed: Vec<&str> = outcome.failures.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(failed, vec!["p2", "p3"]);
}

#[test]
fn test_record_id_fallback() {
    let activities = entity("activities");
    let transformer = RecordTransformer::new(&activities);

    assert_eq!(transformer.record_id(&raw(json!({"activity_id": "a7"}))), "a7");
    assert_eq!(transformer.record_id(&raw(json!({"activity_id": 7}))), "7");
    assert_eq!(
        transformer.record_id(&raw(json!({}))),
        UNKNOWN_RECORD_ID
    );
}

// ============================================================================
// Encoding Tests
// ============================================================================

#[test_case(json!(["p1", "p2"]) ; "list of strings")]
#[test_case(json!([]) ; "empty list")]
#[test_case(json!([3, 1, 2, [true, null]]) ; "nested list keeps order")]
#[test_case(json!({"b": 1, "a": {"c": "x,y\n\"z\""}}) ; "map with csv special characters")]
fn test_encode_round_trip(value: JsonValue) {
    let text = encode_nested(&value).unwrap();
    assert_eq!(decode_nested(&text).unwrap(), value);
}

#[test]
fn test_render_cell_scalars() {
    assert_eq!(render_cell(&json!("text")).unwrap(), "text");
    assert_eq!(render_cell(&json!(10)).unwrap(), "10");
    assert_eq!(render_cell(&json!(false)).unwrap(), "false");
    assert_eq!(render_cell(&json!(null)).unwrap(), "");
    assert_eq!(render_cell(&json!(["a"])).unwrap(), r#"["a"]"#);
}

#[test]
fn test_flat_row_from_iter() {
    let row: FlatRow = vec![("a", "1"), ("b", "2")].into_iter().collect();
    assert_eq!(row.columns(), ["a".to_string(), "b".to_string()].as_slice());
    assert_eq!(row.get("b"), Some("2"));
    assert_eq!(row.get("c"), None);
}
