//! `HardState`: the entity type (§3).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use worldhist_core::{EntityId, Kind, Prominence, Status};

/// `{x, y, z}` optional spatial hint; domain templates populate it for
/// locations, everything else usually leaves it `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// `temporal = {startTick, endTick|null}`, used by eras and occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Temporal {
    pub start_tick: u64,
    pub end_tick: Option<u64>,
}

/// A single `catalyzedEvents` record: which action an agent carried out and
/// when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalyzedEvent {
    pub action_id: String,
    pub tick: u64,
    pub description: String,
}

/// `catalyst = {canAct, actionDomains[], influence, catalyzedEvents[]}`
/// (§3, §4.7). Entities without this block can never be sampled as agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalystBlock {
    pub can_act: bool,
    pub action_domains: Vec<String>,
    pub influence: f64,
    pub catalyzed_events: Vec<CatalyzedEvent>,
}

impl CatalystBlock {
    #[must_use]
    pub fn new(action_domains: Vec<String>, influence: f64) -> Self {
        Self {
            can_act: true,
            action_domains,
            influence: influence.clamp(0.0, 1.0),
            catalyzed_events: Vec::new(),
        }
    }
}

/// A mirror entry in `links[]`; kept in lock-step with the relationships
/// list by the store (invariant 1). Never constructed outside
/// `worldhist_graph::store`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub kind: String,
    pub src: EntityId,
    pub dst: EntityId,
}

/// Settings accepted by `Graph::create_entity`. Everything besides `kind`
/// and `name` has a sensible default so growth templates don't have to
/// repeat boilerplate.
#[derive(Debug, Clone)]
pub struct EntitySettings {
    pub kind: Kind,
    pub subtype: String,
    pub name: String,
    pub description: String,
    pub status: Status,
    pub prominence: Prominence,
    pub culture: String,
    pub tags: BTreeMap<String, Value>,
    pub temporal: Option<Temporal>,
    pub coordinates: Option<Coordinates>,
    pub catalyst: Option<CatalystBlock>,
}

impl EntitySettings {
    #[must_use]
    pub fn new(kind: Kind, subtype: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            subtype: subtype.into(),
            name: name.into(),
            description: String::new(),
            status: Status::Active,
            prominence: Prominence::Forgotten,
            culture: String::new(),
            tags: BTreeMap::new(),
            temporal: None,
            coordinates: None,
            catalyst: None,
        }
    }

    #[must_use]
    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn prominence(mut self, prominence: Prominence) -> Self {
        self.prominence = prominence;
        self
    }

    #[must_use]
    pub fn culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = culture.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: Value) -> Self {
        self.tags.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn temporal(mut self, temporal: Temporal) -> Self {
        self.temporal = Some(temporal);
        self
    }

    #[must_use]
    pub fn catalyst(mut self, catalyst: CatalystBlock) -> Self {
        self.catalyst = Some(catalyst);
        self
    }
}

/// `HardState` (§3): an entity and everything it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardState {
    pub id: EntityId,
    pub kind: Kind,
    pub subtype: String,
    pub name: String,
    pub description: String,
    pub status: Status,
    pub prominence: Prominence,
    pub culture: String,
    pub tags: BTreeMap<String, Value>,
    pub links: Vec<LinkRef>,
    pub created_at: u64,
    pub updated_at: u64,
    pub temporal: Option<Temporal>,
    pub coordinates: Option<Coordinates>,
    pub catalyst: Option<CatalystBlock>,
}

impl HardState {
    /// Whether this entity is eligible to be sampled as a catalyst agent.
    #[must_use]
    pub fn can_act(&self) -> bool {
        self.catalyst.as_ref().is_some_and(|c| c.can_act)
    }
}

/// Patch accepted by `Graph::update_entity`. `id` is intentionally absent:
/// attempting to change it is the one forbidden field update (§4.1).
#[derive(Debug, Clone, Default)]
pub struct EntityPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub prominence_step: Option<ProminenceStep>,
    pub culture: Option<String>,
    pub tags: BTreeMap<String, Option<Value>>,
    pub temporal: Option<Temporal>,
    pub coordinates: Option<Coordinates>,
    pub catalyst: Option<CatalystBlock>,
}

/// Invariant 8 forces prominence to move one step at a time; the patch API
/// expresses that directly instead of letting callers set an arbitrary
/// target tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProminenceStep {
    Up,
    Down,
}

impl EntityPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_prominence_step(mut self, step: ProminenceStep) -> Self {
        self.prominence_step = Some(step);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: Value) -> Self {
        self.tags.insert(key.into(), Some(value));
        self
    }

    #[must_use]
    pub fn with_temporal(mut self, temporal: Temporal) -> Self {
        self.temporal = Some(temporal);
        self
    }
}
