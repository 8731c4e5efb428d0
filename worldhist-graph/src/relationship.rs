//! Relationships (§3): directed, typed, optionally protected from culling.

use serde::{Deserialize, Serialize};
use worldhist_core::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Active,
    Historical,
}

/// The three protected kinds named in §3/§4.8/Glossary: never culled, and
/// their rows survive endpoint archival (status flips to historical, the
/// row stays).
pub const PROTECTED_KINDS: [&str; 3] = ["supersedes", "part_of", "active_during"];

#[must_use]
pub fn is_protected(kind: &str) -> bool {
    PROTECTED_KINDS.contains(&kind)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: String,
    pub src: EntityId,
    pub dst: EntityId,
    pub strength: f64,
    pub distance: Option<f64>,
    pub category: Option<String>,
    pub status: RelationshipStatus,
    pub catalyzed_by: Option<EntityId>,
    pub created_at: u64,
}

impl Relationship {
    #[must_use]
    pub fn new(kind: impl Into<String>, src: EntityId, dst: EntityId, created_at: u64) -> Self {
        Self {
            kind: kind.into(),
            src,
            dst,
            strength: 1.0,
            distance: None,
            category: None,
            status: RelationshipStatus::Active,
            catalyzed_by: None,
            created_at,
        }
    }

    #[must_use]
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_catalyst(mut self, agent: EntityId) -> Self {
        self.catalyzed_by = Some(agent);
        self
    }

    #[must_use]
    pub fn is_protected(&self) -> bool {
        is_protected(&self.kind)
    }

    /// The `(kind:src:dst)` key-tuple used by change detection's
    /// relationship-hash snapshot (§4.10).
    #[must_use]
    pub fn key_tuple(&self) -> String {
        format!("{}:{}:{}", self.kind, self.src, self.dst)
    }
}

/// Criteria accepted by `findRelationships` / culling's candidate scan.
/// All set fields are ANDed together.
#[derive(Debug, Clone, Default)]
pub struct RelationshipCriteria {
    pub kind: Option<String>,
    pub src: Option<EntityId>,
    pub dst: Option<EntityId>,
    pub status: Option<RelationshipStatus>,
    pub category: Option<String>,
}

impl RelationshipCriteria {
    #[must_use]
    pub fn matches(&self, rel: &Relationship) -> bool {
        self.kind.as_deref().map_or(true, |k| k == rel.kind)
            && self.src.map_or(true, |s| s == rel.src)
            && self.dst.map_or(true, |d| d == rel.dst)
            && self.status.map_or(true, |s| s == rel.status)
            && self
                .category
                .as_deref()
                .map_or(true, |c| rel.category.as_deref() == Some(c))
    }
}

/// Direction filter for `getEntityRelationships(id, direction)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}
