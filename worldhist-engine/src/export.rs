//! The exported run state (§6): everything a caller needs to persist or
//! inspect a finished (or paused) run — the full entity/relationship/history
//! snapshot, pressures, current era, tick/epoch counters, accumulated
//! statistics, and the lore ledger built up from [`super::engine::Engine::record_lore`].

use std::collections::BTreeMap;

use serde::Serialize;
use worldhist_core::EntityId;
use worldhist_graph::{HardState, HistoryEvent, Relationship};
use worldhist_llm::EnrichmentType;

use crate::statistics::{EpochStats, Fitness, ValidationReport};
use crate::tag_registry::HealthReport;

/// One delivered enrichment result, folded into the exported state as a
/// `loreRecords[]` entry (§6). `target` is `None` for era narratives, which
/// attach to the current era only implicitly through `enqueued_tick`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoreRecord {
    #[serde(rename = "type")]
    pub kind: EnrichmentType,
    pub target: Option<EntityId>,
    pub relationship: Option<(EntityId, EntityId, String)>,
    pub text: String,
    pub warnings: Vec<String>,
    pub cached: bool,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl LoreRecord {
    #[must_use]
    pub fn new(kind: EnrichmentType, target: Option<EntityId>, text: impl Into<String>) -> Self {
        Self {
            kind,
            target,
            relationship: None,
            text: text.into(),
            warnings: Vec::new(),
            cached: false,
            metadata: BTreeMap::new(),
        }
    }
}

/// Run-level statistics bundled into the export (§6): the running per-epoch
/// counters plus the end-of-run fitness, validation and tag-health reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub epochs: Vec<EpochStats>,
    pub fitness: Fitness,
    pub validation: ValidationReport,
    pub tag_health: HealthReport,
}

/// The full exported run state (§6): `{entities, relationships, history,
/// pressures, currentEraId, tick, epoch, statistics, loreRecords}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedState {
    pub entities: Vec<HardState>,
    pub relationships: Vec<Relationship>,
    pub history: Vec<HistoryEvent>,
    pub pressures: BTreeMap<String, f64>,
    pub current_era_id: Option<EntityId>,
    pub tick: u64,
    pub epoch: u64,
    pub statistics: RunStatistics,
    pub lore_records: Vec<LoreRecord>,
}
