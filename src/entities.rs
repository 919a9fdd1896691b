//! Built-in entity definitions embedded in the binary
//!
//! This module embeds the field maps of every exported table directly into the
//! binary, allowing users to use `--entity students` instead of specifying a
//! file path.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in entity YAML definitions
pub static BUILTIN_ENTITIES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        m.insert("students", include_str!("../entities/students.yaml"));
        m.insert("student", include_str!("../entities/students.yaml"));

        m.insert("activities", include_str!("../entities/activities.yaml"));
        m.insert("activity", include_str!("../entities/activities.yaml"));

        m.insert("rockies", include_str!("../entities/rockies.yaml"));
        m.insert("rockie", include_str!("../entities/rockies.yaml"));

        m.insert(
            "purchasables",
            include_str!("../entities/purchasables.yaml"),
        );
        m.insert("purchasable", include_str!("../entities/purchasables.yaml"));
        m.insert("purshable", include_str!("../entities/purchasables.yaml"));

        m
    });

/// Get a built-in entity by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_ENTITIES.get(name).copied()
}

/// Check if a name is a built-in entity
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_ENTITIES.contains_key(name)
}

/// List all built-in entity names (primary names only)
pub fn list_builtin() -> Vec<&'static str> {
    vec!["students", "activities", "rockies", "purchasables"]
}
