//! YAML Loader module
//!
//! Parse entity definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `EntityDefinition` - Declarative description of one source table export
//! - `VariantDefinition` - Ordered field map for one output file
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{load_entity, load_entity_from_str, validate_entity};
pub use types::{
    CatalogColumn, CatalogTable, ColumnDefinition, DiscriminatorDefinition, EntityDefinition,
    VariantDefinition,
};
