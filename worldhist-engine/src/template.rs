//! Growth templates (§4.1, §4.3): the add-only contract through which the
//! world grows. Templates only ever see a read-only `View`; they describe
//! the entities/relationships they want and the engine applies the result.

use std::collections::BTreeMap;

use worldhist_config::EngineConfig;
use worldhist_core::{EntityId, Kind, Result};
use worldhist_graph::{EntitySettings, View};

/// A proposed addition to the graph, returned by `GrowthTemplate::expand`.
/// Kept deliberately thin: templates describe intent, the engine (not the
/// template) mints ids and performs the actual mutation so that every
/// created id still flows through the single seeded RNG (§8).
#[derive(Debug, Clone)]
pub enum Expansion {
    /// Create a new entity, optionally linked to one of the selected
    /// targets by a relationship of `link_kind`.
    NewEntity {
        settings: EntitySettings,
        link_to: Option<(EntityId, String)>,
    },
    /// Add a relationship between two entities already in the graph
    /// (including ones just created earlier in the same expansion).
    NewRelationship {
        kind: String,
        src: EntityId,
        dst: EntityId,
        strength: Option<f64>,
    },
}

/// Static metadata describing a template, used by the selector (§4.3) to
/// compute base weight, deficit boost, and diversity dampening without
/// invoking the template itself.
#[derive(Debug, Clone)]
pub struct TemplateMeta {
    pub id: String,
    pub produces_kind: Kind,
    pub base_weight: f64,
    /// `T.pressureModifiers` from §4.3's `pressureBoost` formula.
    pub pressure_modifiers: BTreeMap<String, f64>,
}

/// `expand`'s full return shape (§4.4): the mutations to apply, a
/// human-readable description for the history log, and pressure changes
/// queued for the *next* tick's update (§5 ordering guarantee 2).
#[derive(Debug, Clone, Default)]
pub struct ExpandOutcome {
    pub expansions: Vec<Expansion>,
    pub description: Option<String>,
    pub pressure_changes: BTreeMap<String, f64>,
}

/// `GrowthTemplate`: `canApply` / `findTargets` / `expand` (§4.1).
///
/// Every method takes `&View`, never `&mut View` — the type system is the
/// enforcement mechanism for "templates cannot mutate the graph directly"
/// (§4.1's restricted-view requirement): there is no mutating method a
/// template could call even if it wanted to.
pub trait GrowthTemplate: Send + Sync {
    fn meta(&self) -> &TemplateMeta;

    /// Cheap precondition check, evaluated before `find_targets` so the
    /// selector can skip templates that can never fire this tick.
    fn can_apply(&self, view: &View<'_, EngineConfig>) -> bool;

    /// Candidate entities this template would attach new growth to. An
    /// empty result means the template has nothing to do this tick even
    /// though `can_apply` returned true.
    fn find_targets(&self, view: &View<'_, EngineConfig>) -> Vec<EntityId>;

    /// Describe the growth to perform against the chosen target. Returning
    /// an outcome with no expansions is a valid "declined to expand"
    /// outcome. `Err` aborts the whole transaction — nothing in the
    /// returned outcome is ever partially applied (§4.3 error conditions).
    fn expand(&self, view: &View<'_, EngineConfig>, target: EntityId) -> Result<ExpandOutcome>;
}
