//! Loader types
//!
//! Declarative entity definition types for YAML parsing. An entity definition
//! is the field map registry for one source table: which output variants it
//! produces, which columns each variant carries and where each column's value
//! is found in a raw record.

use crate::types::{ColumnType, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Entity Definition
// ============================================================================

/// Top-level entity definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EntityDefinition {
    /// Entity name (e.g. "students")
    pub name: String,
    /// Logical source table, prefixed with the stage at run time
    pub source_table: String,
    /// Field holding a best-effort record identifier for diagnostics
    #[serde(default)]
    pub id_field: Option<String>,
    /// Optional discriminator routing records to a single variant
    #[serde(default)]
    pub discriminator: Option<DiscriminatorDefinition>,
    /// Output variants, each one staging file and one uploaded object
    pub variants: Vec<VariantDefinition>,
}

impl EntityDefinition {
    /// Look up a variant by name
    pub fn variant(&self, name: &str) -> Option<&VariantDefinition> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Resolve the variant a discriminator value routes to
    pub fn route(&self, value: &str) -> Option<&VariantDefinition> {
        let discriminator = self.discriminator.as_ref()?;
        let variant = discriminator.routes.get(value)?;
        self.variant(variant)
    }

    /// Names of all output variants, in declaration order
    pub fn variant_names(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.name.as_str()).collect()
    }

    /// Catalog description of every variant's columns
    pub fn catalog(&self) -> Vec<CatalogTable> {
        self.variants
            .iter()
            .map(|v| CatalogTable {
                table: v.table.clone(),
                columns: v
                    .columns
                    .iter()
                    .map(|c| CatalogColumn {
                        name: c.name.clone(),
                        column_type: c.column_type.as_str().to_string(),
                    })
                    .collect(),
            })
            .collect()
    }
}

// ============================================================================
// Discriminator
// ============================================================================

/// Tagged-variant routing table: `value -> variant name`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiscriminatorDefinition {
    /// Top-level field holding the discriminator value
    pub field: String,
    /// Discriminator value to variant name
    pub routes: BTreeMap<String, String>,
}

// ============================================================================
// Variant (Field Map)
// ============================================================================

/// One output shape produced from the source table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VariantDefinition {
    /// Variant name, unique within the entity
    pub name: String,
    /// Catalog table name, `{table}` in the object key
    pub table: String,
    /// Output entity name, `{entity}` in the object key and staging file name
    pub entity: String,
    /// Ordered column map; this order is the file's column order
    pub columns: Vec<ColumnDefinition>,
}

impl VariantDefinition {
    /// Output column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// One `(column, path, default)` entry of a field map
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ColumnDefinition {
    /// Output column name
    pub name: String,
    /// Dotted extraction path, e.g. `student_data.rockie_coins`
    pub path: String,
    /// Value used when the path is absent or null
    #[serde(default = "default_column_value")]
    pub default: JsonValue,
    /// Type declared to the schema catalog
    #[serde(default, rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDefinition {
    /// Path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

fn default_column_value() -> JsonValue {
    JsonValue::String(String::new())
}

// ============================================================================
// Catalog
// ============================================================================

/// Column list of one catalog table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogTable {
    /// Table name
    pub table: String,
    /// Columns in file order
    pub columns: Vec<CatalogColumn>,
}

/// A catalog column in the shape the registration step expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogColumn {
    /// Column name
    #[serde(rename = "Name")]
    pub name: String,
    /// `string`, `int` or `double`
    #[serde(rename = "Type")]
    pub column_type: String,
}
