//! Structural comparison of two configuration payloads.
//!
//! Used to preview what a publish would change relative to the latest
//! published version. Output is sorted by server name so rendering and tests
//! are reproducible.

use crate::models::McpConfig;
use serde::{Deserialize, Serialize};

/// Result of comparing two configuration payloads.
///
/// The four sets are disjoint and keyed by server name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDiff {
    /// Present in `new` but not in `old`
    pub added: Vec<String>,
    /// Present in `old` but not in `new`
    pub removed: Vec<String>,
    /// Present in both with a different resolved invocation spec
    pub changed: Vec<String>,
    /// Present in both and identical
    pub unchanged: Vec<String>,
}

impl ConfigDiff {
    /// Whether the two payloads are identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare two payloads field-by-field.
///
/// `BTreeMap` iteration keeps every output vector sorted by server name.
#[must_use]
pub fn compare(old: &McpConfig, new: &McpConfig) -> ConfigDiff {
    let mut diff = ConfigDiff::default();

    for (name, old_entry) in &old.mcp_servers {
        match new.mcp_servers.get(name) {
            None => diff.removed.push(name.clone()),
            Some(new_entry) if new_entry != old_entry => diff.changed.push(name.clone()),
            Some(_) => diff.unchanged.push(name.clone()),
        }
    }

    for name in new.mcp_servers.keys() {
        if !old.mcp_servers.contains_key(name) {
            diff.added.push(name.clone());
        }
    }

    diff
}
