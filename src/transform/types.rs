//! Transformer types
//!
//! Flat rows and their routing to output variants.

use serde::Serialize;

/// One flattened output row, columns in field map order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    columns: Vec<String>,
    values: Vec<String>,
}

impl FlatRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Create an empty row with room for `capacity` cells
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append a cell
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Cell values in column order
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value of one column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i].as_str())
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for FlatRow {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Into<String>, V: Into<String>> FromIterator<(C, V)> for FlatRow {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

/// A row addressed to one output variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedRow {
    /// Variant name
    pub variant: String,
    /// The row
    pub row: FlatRow,
}

impl RoutedRow {
    /// Create a routed row
    pub fn new(variant: impl Into<String>, row: FlatRow) -> Self {
        Self {
            variant: variant.into(),
            row,
        }
    }
}

/// A record dropped during the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// Best-effort record identifier
    pub id: String,
    /// Variant the record was headed for, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Why it was dropped
    pub reason: String,
}

impl RecordFailure {
    /// Create a failure entry
    pub fn new(id: impl Into<String>, variant: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            variant,
            reason: reason.into(),
        }
    }
}
