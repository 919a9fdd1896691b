//! Record transformer
//!
//! Flattens raw records into rows using an entity's field maps.

use super::encode::render_cell;
use super::types::{FlatRow, RecordFailure, RoutedRow};
use crate::error::{Error, Result};
use crate::loader::{ColumnDefinition, EntityDefinition, VariantDefinition};
use crate::types::{JsonValue, RawRecord};
use tracing::{debug, error};

/// Identifier used when a record carries no usable id
pub const UNKNOWN_RECORD_ID: &str = "unknown";

/// Outcome of transforming one page
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    /// Rows that survived, in record order
    pub rows: Vec<RoutedRow>,
    /// Records that were dropped
    pub failures: Vec<RecordFailure>,
}

/// Turns raw records into routed flat rows
#[derive(Debug, Clone, Copy)]
pub struct RecordTransformer<'a> {
    entity: &'a EntityDefinition,
}

impl<'a> RecordTransformer<'a> {
    /// Create a transformer for one entity
    pub fn new(entity: &'a EntityDefinition) -> Self {
        Self { entity }
    }

    /// Best-effort identifier of a record for diagnostics
    pub fn record_id(&self, record: &RawRecord) -> String {
        self.entity
            .id_field
            .as_deref()
            .and_then(|field| record.get(field))
            .and_then(|value| match value {
                JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
                JsonValue::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| UNKNOWN_RECORD_ID.to_string())
    }

    /// Transform one record into zero or more routed rows
    ///
    /// With a discriminator the record goes to exactly the matching variant;
    /// without one every variant receives a row. Any failure drops the whole
    /// record.
    pub fn transform(&self, record: &RawRecord) -> Result<Vec<RoutedRow>> {
        let id = self.record_id(record);

        let targets: Vec<&VariantDefinition> = match &self.entity.discriminator {
            Some(discriminator) => {
                let value = record.get(&discriminator.field);
                let routed = match value {
                    Some(JsonValue::String(s)) => self.entity.route(s),
                    _ => None,
                };
                let variant = routed.ok_or_else(|| Error::UnmatchedDiscriminator {
                    id: id.clone(),
                    field: discriminator.field.clone(),
                    value: match value {
                        Some(JsonValue::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                        None => String::new(),
                    },
                })?;
                vec![variant]
            }
            None => self.entity.variants.iter().collect(),
        };

        targets
            .into_iter()
            .map(|variant| {
                let row = flatten(record, variant, &id)?;
                Ok(RoutedRow::new(&variant.name, row))
            })
            .collect()
    }

    /// Transform a page, isolating per-record failures
    pub fn transform_page(&self, records: &[RawRecord]) -> PageOutcome {
        let mut outcome = PageOutcome::default();

        for record in records {
            match self.transform(record) {
                Ok(rows) => {
                    debug!(
                        entity = %self.entity.name,
                        record = %self.record_id(record),
                        rows = rows.len(),
                        "Processed record"
                    );
                    outcome.rows.extend(rows);
                }
                Err(e) => {
                    let id = self.record_id(record);
                    error!(entity = %self.entity.name, record = %id, "Error processing item: {e}");
                    outcome.failures.push(RecordFailure::new(id, None, e.to_string()));
                }
            }
        }

        outcome
    }
}

/// Build the row for one variant
///
/// The row carries exactly the variant's columns, in declaration order.
pub fn flatten(record: &RawRecord, variant: &VariantDefinition, id: &str) -> Result<FlatRow> {
    let mut row = FlatRow::with_capacity(variant.columns.len());

    for column in &variant.columns {
        let value = resolve(record, column)
            .map_err(|message| Error::record(id, message))?
            .unwrap_or(&column.default);
        let text = render_cell(value).map_err(|e| {
            Error::record(id, format!("column '{}' could not be encoded: {e}", column.name))
        })?;
        row.push(&column.name, text);
    }

    Ok(row)
}

/// Walk a column's path through the record
///
/// Returns `Ok(None)` when a segment is absent or null, and an error when an
/// intermediate segment exists but is not a mapping.
fn resolve<'r>(
    record: &'r RawRecord,
    column: &ColumnDefinition,
) -> std::result::Result<Option<&'r JsonValue>, String> {
    let mut segments = column.segments();
    let Some(first) = segments.next() else {
        return Ok(None);
    };

    let mut current = match record.get(first) {
        Some(JsonValue::Null) | None => return Ok(None),
        Some(value) => value,
    };
    let mut walked = first.to_string();

    for segment in segments {
        let map = match current {
            JsonValue::Object(map) => map,
            other => {
                return Err(format!(
                    "'{walked}' is {} where '{}' expects a mapping",
                    kind(other),
                    column.path
                ))
            }
        };
        current = match map.get(segment) {
            Some(JsonValue::Null) | None => return Ok(None),
            Some(value) => value,
        };
        walked.push('.');
        walked.push_str(segment);
    }

    Ok(Some(current))
}

fn kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "a mapping",
    }
}
