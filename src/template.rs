//! Placeholder interpolation for table names and object keys
//!
//! Handles `{name}` placeholders such as `{stage}/{table}/{entity}_data.csv`
//! and `{stage}_{table}`.

use crate::error::{Error, Result};
use crate::types::Stage;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Regex for matching placeholders: {name}
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}").unwrap());

/// Default object key layout consumed by the downstream catalog
pub const DEFAULT_KEY_TEMPLATE: &str = "{stage}/{table}/{entity}_data.csv";

/// Default physical source table layout
pub const DEFAULT_SOURCE_TABLE_TEMPLATE: &str = "{stage}_{table}";

/// Placeholders a key template may reference
pub const KNOWN_PLACEHOLDERS: &[&str] = &["stage", "table", "entity"];

/// Values available to a template
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: BTreeMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for one output variant of a run
    pub fn for_output(stage: Stage, table: &str, entity: &str) -> Self {
        let mut ctx = Self::new();
        ctx.set("stage", stage.as_str())
            .set("table", table)
            .set("entity", entity);
        ctx
    }

    /// Set a variable
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Get a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = PLACEHOLDER_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let name = &cap[1];
        match ctx.get(name) {
            Some(value) => value.to_string(),
            None => {
                missing.push(name.to_string());
                cap[0].to_string()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::config(format!(
            "Undefined placeholder in '{template}': {}",
            missing.join(", ")
        )))
    }
}

/// Extract all placeholder names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    PLACEHOLDER_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Reject templates that reference anything other than the known placeholders
pub fn validate_key_template(template: &str) -> Result<()> {
    let unknown: Vec<String> = extract_variables(template)
        .into_iter()
        .filter(|name| !KNOWN_PLACEHOLDERS.contains(&name.as_str()))
        .collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(Error::config(format!(
            "Unknown placeholder in '{template}': {}",
            unknown.join(", ")
        )))
    }
}
