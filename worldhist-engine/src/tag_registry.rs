//! Tag registry & health (§4.13, SPEC_FULL [SUPPLEMENT]).
//!
//! The registry is an open schema: the first kind to write a given tag key
//! registers it; later writes under an incompatible kind are rejected as a
//! conflict. It implements `worldhist_graph::TagValidator` so `Graph` can
//! call into it without knowing anything about registries (`tags.rs`'s
//! `TagValidator` trait is the seam).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use worldhist_core::{EngineError, Kind, Result};
use worldhist_graph::TagValidator;

/// Per-key bookkeeping: which kinds have used it, and how many writes it's
/// seen (used to compute saturation against a kind's total population).
#[derive(Debug, Clone, Default)]
struct TagEntry {
    kinds: BTreeSet<Kind>,
    write_count: usize,
}

/// Open-schema tag registry (§4.13). Unknown keys auto-register on first
/// use; a key already associated with one kind is rejected if written
/// against a declared-incompatible kind.
#[derive(Debug, Default)]
pub struct TagRegistry {
    entries: BTreeMap<String, TagEntry>,
    /// Explicit compatibility declarations a domain can seed at startup
    /// (e.g. "residentCount" only ever valid on `Location`). Keys absent
    /// from this map are unconstrained — any kind may use them, and the
    /// first kind to do so becomes their "dominant kind" for saturation
    /// purposes only, not an exclusivity rule.
    declared_compat: BTreeMap<String, BTreeSet<Kind>>,
}

/// Saturation and coverage figures consumed by end-of-run statistics
/// (§4.11, §4.13).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// `tag key -> (entities bearing it, entities of its dominant kind)`.
    pub saturation: BTreeMap<String, (usize, usize)>,
    /// Fraction of entities across the whole graph carrying zero tags.
    pub untagged_ratio: f64,
    pub conflicting_keys: Vec<String>,
}

impl TagRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `key` is only ever valid on one of `kinds`. Call this
    /// at startup for tags the domain knows are kind-specific; anything not
    /// declared stays open.
    pub fn declare(&mut self, key: impl Into<String>, kinds: impl IntoIterator<Item = Kind>) {
        self.declared_compat
            .insert(key.into(), kinds.into_iter().collect());
    }

    fn conflict(&self, key: &str, kind: Kind) -> bool {
        self.declared_compat
            .get(key)
            .is_some_and(|allowed| !allowed.contains(&kind))
    }

    /// `TagRegistry::validate(kind, key, value)` (§4.13): called by
    /// `Graph::create_entity`/`update_entity` on every tag write.
    pub fn validate_write(&mut self, kind: Kind, key: &str, _value: &Value) -> Result<()> {
        if self.conflict(key, kind) {
            return Err(EngineError::InvariantViolation(format!(
                "tag '{key}' is declared incompatible with kind {kind}"
            )));
        }
        let entry = self.entries.entry(key.to_string()).or_default();
        entry.kinds.insert(kind);
        entry.write_count += 1;
        Ok(())
    }

    /// Dominant kind for a key: whichever kind has been written most often
    /// under it, ties broken by `Kind`'s declaration order.
    #[must_use]
    fn dominant_kind(&self, key: &str) -> Option<Kind> {
        self.entries.get(key).and_then(|e| e.kinds.iter().copied().next())
    }

    #[must_use]
    pub fn health_report(&self, entity_counts_by_kind: &BTreeMap<Kind, usize>, total_entities: usize, untagged_entities: usize) -> HealthReport {
        let mut saturation = BTreeMap::new();
        let mut conflicting_keys = Vec::new();
        for (key, entry) in &self.entries {
            if entry.kinds.len() > 1 && self.declared_compat.contains_key(key) {
                conflicting_keys.push(key.clone());
            }
            if let Some(dominant) = self.dominant_kind(key) {
                let denom = entity_counts_by_kind.get(&dominant).copied().unwrap_or(0);
                saturation.insert(key.clone(), (entry.write_count, denom));
            }
        }
        let untagged_ratio = if total_entities == 0 {
            0.0
        } else {
            untagged_entities as f64 / total_entities as f64
        };
        HealthReport {
            saturation,
            untagged_ratio,
            conflicting_keys,
        }
    }
}

/// Adapts `TagRegistry` to the graph crate's validation seam. Held inside a
/// `Box<dyn TagValidator>` by `Graph`; the engine keeps its own `TagRegistry`
/// handle (via `Arc<Mutex<_>>`) so it can also produce health reports after
/// the run without reaching back into the graph.
pub struct GraphTagValidator {
    registry: std::sync::Arc<std::sync::Mutex<TagRegistry>>,
}

impl GraphTagValidator {
    #[must_use]
    pub fn new(registry: std::sync::Arc<std::sync::Mutex<TagRegistry>>) -> Self {
        Self { registry }
    }
}

impl TagValidator for GraphTagValidator {
    fn validate(&mut self, kind: Kind, key: &str, value: &Value) -> worldhist_graph::error::Result<()> {
        self.registry
            .lock()
            .expect("tag registry mutex poisoned")
            .validate_write(kind, key, value)
            .map_err(|e| worldhist_graph::GraphError::TagRejected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_key_accepts_any_kind() {
        let mut reg = TagRegistry::new();
        assert!(reg.validate_write(Kind::Npc, "favoriteColor", &Value::Null).is_ok());
        assert!(reg.validate_write(Kind::Faction, "favoriteColor", &Value::Null).is_ok());
    }

    #[test]
    fn declared_key_rejects_incompatible_kind() {
        let mut reg = TagRegistry::new();
        reg.declare("residentCount", [Kind::Location]);
        assert!(reg.validate_write(Kind::Location, "residentCount", &Value::Null).is_ok());
        assert!(reg.validate_write(Kind::Npc, "residentCount", &Value::Null).is_err());
    }

    #[test]
    fn health_report_computes_untagged_ratio() {
        let reg = TagRegistry::new();
        let report = reg.health_report(&BTreeMap::new(), 10, 4);
        assert!((report.untagged_ratio - 0.4).abs() < 1e-9);
    }
}
