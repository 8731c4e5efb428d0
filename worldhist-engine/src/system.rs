//! Simulation systems (§4.1, §4.5): the mutating counterpart to growth
//! templates. Systems receive `&mut View` and apply their own changes
//! in-place rather than describing an `Expansion` for the engine to apply.

use worldhist_config::EngineConfig;
use worldhist_core::{EntityId, Result};
use worldhist_graph::View;

/// A system-side signal that a specific entity just became enrichment-worthy
/// in a way `observe_changes`'s tick-over-tick diff can't see on its own —
/// an era handoff or a freshly discovered location is newsworthy the instant
/// it happens, not merely because some tag field moved. Systems only hold
/// `&mut View`, not the engine's `lore`/`enrichment_queue`, so the hint rides
/// back on [`SystemResult`] for the tick loop to act on.
#[derive(Debug, Clone, Copy)]
pub enum EnrichmentHint {
    /// A new era became current; `EntityId` is the new era entity.
    EraNarrative(EntityId),
    /// A new location was created by emergent discovery.
    DiscoveryEvent(EntityId),
}

/// What a system did this tick, surfaced to the history log and
/// statistics (§4.11) without the engine needing to inspect system
/// internals.
#[derive(Debug, Clone, Default)]
pub struct SystemResult {
    pub entities_touched: usize,
    pub relationships_touched: usize,
    pub note: Option<String>,
    pub enrichment: Option<EnrichmentHint>,
}

impl SystemResult {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Static metadata the selector needs without invoking the system.
#[derive(Debug, Clone)]
pub struct SystemMeta {
    pub id: String,
    pub base_weight: f64,
}

/// `System::apply(view, modifier)` (§4.1). `modifier` is the era's
/// `systemModifier` for this system id (§4.6), already resolved by the
/// caller, folded multiplicatively into whatever weight the system uses
/// internally for its own decisions.
pub trait System: Send + Sync {
    fn meta(&self) -> &SystemMeta;

    fn apply(&self, view: &mut View<'_, EngineConfig>, modifier: f64) -> Result<SystemResult>;
}
