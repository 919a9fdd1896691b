//! YAML parser for entity definitions
//!
//! Parses and validates entity YAML files.
//! Supports both built-in entities (by name) and custom YAML files (by path).

use crate::entities;
use crate::error::{Error, Result};
use crate::loader::types::{EntityDefinition, VariantDefinition};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load an entity definition from a name or file path
///
/// This function first checks if the input is a built-in entity name (e.g., "students"),
/// then falls back to loading from a file path.
///
/// # Examples
///
/// ```ignore
/// // Load built-in entity by name
/// let entity = load_entity("purchasables")?;
///
/// // Load custom entity from file
/// let entity = load_entity("./rewards.yaml")?;
/// ```
pub fn load_entity(path: impl AsRef<Path>) -> Result<EntityDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = entities::get_builtin(&path_str) {
            return load_entity_from_str(yaml);
        }
        return Err(Error::UnknownEntity {
            name: path_str.to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read entity file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_entity_from_str(&content)
}

/// Load an entity definition from a YAML string
pub fn load_entity_from_str(yaml: &str) -> Result<EntityDefinition> {
    let def: EntityDefinition = serde_yaml::from_str(yaml)?;
    validate_entity(&def)?;
    Ok(def)
}

/// Validate an entity definition
pub fn validate_entity(def: &EntityDefinition) -> Result<()> {
    if def.name.trim().is_empty() {
        return Err(Error::config("Entity name cannot be empty"));
    }

    let invalid = |message: String| Error::definition(&def.name, message);

    if def.source_table.trim().is_empty() {
        return Err(invalid("source_table cannot be empty".to_string()));
    }

    if def.variants.is_empty() {
        return Err(invalid("at least one variant is required".to_string()));
    }

    let mut variant_names = HashSet::new();
    let mut outputs = HashSet::new();
    for variant in &def.variants {
        if !variant_names.insert(variant.name.as_str()) {
            return Err(invalid(format!("duplicate variant '{}'", variant.name)));
        }
        if !outputs.insert(variant.entity.as_str()) {
            return Err(invalid(format!(
                "variants share the output name '{}'",
                variant.entity
            )));
        }
        validate_variant(variant).map_err(invalid)?;
    }

    if let Some(discriminator) = &def.discriminator {
        if discriminator.field.trim().is_empty() {
            return Err(invalid("discriminator field cannot be empty".to_string()));
        }
        if discriminator.routes.is_empty() {
            return Err(invalid("discriminator needs at least one route".to_string()));
        }
        for (value, target) in &discriminator.routes {
            if def.variant(target).is_none() {
                return Err(invalid(format!(
                    "route '{value}' points at undeclared variant '{target}'"
                )));
            }
        }
    }

    Ok(())
}

/// Validate one variant's field map
fn validate_variant(variant: &VariantDefinition) -> std::result::Result<(), String> {
    if variant.name.trim().is_empty() {
        return Err("variant name cannot be empty".to_string());
    }
    if variant.table.trim().is_empty() || variant.entity.trim().is_empty() {
        return Err(format!(
            "variant '{}' needs both table and entity",
            variant.name
        ));
    }
    if variant.columns.is_empty() {
        return Err(format!("variant '{}' has no columns", variant.name));
    }

    let mut columns = HashSet::new();
    for column in &variant.columns {
        if column.name.trim().is_empty() {
            return Err(format!("variant '{}' has an unnamed column", variant.name));
        }
        if !columns.insert(column.name.as_str()) {
            return Err(format!(
                "variant '{}' declares column '{}' twice",
                variant.name, column.name
            ));
        }
        if column.segments().any(|s| s.trim().is_empty()) {
            return Err(format!(
                "column '{}' has an invalid path '{}'",
                column.name, column.path
            ));
        }
    }

    Ok(())
}
