//! The restricted view templates and systems see (§4.1, §4.4, §4.5).
//!
//! Direct iteration of the full entities map is withheld on purpose (design
//! note: "to prevent ad-hoc hub formation"). The type system does the rest
//! of the restricting: `canApply`/`findTargets`/`expand` on a growth
//! template only ever receive `&View`, so the mutation methods below
//! (which all take `&mut self`) simply aren't callable from template code —
//! templates can only *describe* what they want to produce, never write it
//! directly. Systems, the catalyst and era lifecycle receive `&mut View`
//! and use the same methods to mutate in place.
//!
//! `D` is the domain config type (an `EngineConfig` in practice); this
//! crate doesn't need to know its shape, so it stays a bare type parameter
//! rather than pulling in `worldhist-config` and creating a cycle.

use worldhist_core::{EntityId, Kind, Rng};

use crate::entity::{EntityPatch, EntitySettings, HardState};
use crate::history::EventKind;
use crate::query::EntityCriteria;
use crate::relationship::{Direction, Relationship, RelationshipCriteria};
use crate::store::{ArchiveOptions, Graph};

pub struct View<'a, D> {
    graph: &'a mut Graph,
    config: &'a D,
    rng: &'a mut Rng,
}

impl<'a, D> View<'a, D> {
    pub fn new(graph: &'a mut Graph, config: &'a D, rng: &'a mut Rng) -> Self {
        Self { graph, config, rng }
    }

    #[must_use]
    pub fn config(&self) -> &D {
        self.config
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.graph.tick
    }

    #[must_use]
    pub fn get_pressure(&self, id: &str) -> f64 {
        self.graph.get_pressure(id)
    }

    // ---- read queries, available to every caller -----------------------

    #[must_use]
    pub fn load_entity(&self, id: EntityId) -> Option<HardState> {
        self.graph.get_entity(id)
    }

    #[must_use]
    pub fn has_entity(&self, id: EntityId) -> bool {
        self.graph.has_entity(id)
    }

    #[must_use]
    pub fn find_entities(&self, criteria: &EntityCriteria) -> Vec<HardState> {
        self.graph.find_entities(criteria)
    }

    #[must_use]
    pub fn get_entities_by_kind(&self, kind: Kind) -> Vec<HardState> {
        self.graph.get_entities_by_kind(kind)
    }

    #[must_use]
    pub fn get_connected_entities(&self, id: EntityId, kind: Option<&str>) -> Vec<HardState> {
        self.graph.get_connected_entities(id, kind)
    }

    #[must_use]
    pub fn find_relationships(&self, criteria: &RelationshipCriteria) -> Vec<Relationship> {
        self.graph.find_relationships(criteria)
    }

    #[must_use]
    pub fn get_entity_relationships(&self, id: EntityId, direction: Direction) -> Vec<Relationship> {
        self.graph.get_entity_relationships(id, direction)
    }

    #[must_use]
    pub fn has_relationship(&self, src: EntityId, dst: EntityId, kind: &str) -> bool {
        self.graph.has_relationship(src, dst, kind)
    }

    #[must_use]
    pub fn relationship_cooldown(&self, entity: EntityId, kind: &str) -> Option<u64> {
        self.graph.relationship_cooldown(entity, kind)
    }

    /// The sole sanctioned entity-selection path for new connections
    /// (§4.1). `bias` nudges the random draw toward higher-prominence
    /// candidates in proportion to its value (`0.0` = uniform, `1.0` =
    /// fully prominence-weighted).
    pub fn select_targets(&mut self, kind: Kind, count: usize, bias: f64) -> Vec<EntityId> {
        let candidates = self.graph.get_entities_by_kind(kind);
        if candidates.is_empty() {
            return Vec::new();
        }
        let weighted: Vec<(EntityId, f64)> = candidates
            .iter()
            .map(|e| {
                let prominence_weight = 1.0 + e.prominence as u8 as f64;
                let weight = (1.0 - bias) + bias * prominence_weight;
                (e.id, weight.max(0.01))
            })
            .collect();
        let mut picked = Vec::with_capacity(count.min(weighted.len()));
        let mut remaining = weighted;
        for _ in 0..count.min(remaining.len()) {
            let Some(&chosen) = self.rng.weighted_choice(&remaining) else {
                break;
            };
            picked.push(chosen);
            remaining.retain(|(id, _)| *id != chosen);
        }
        picked
    }

    pub fn rng(&mut self) -> &mut Rng {
        self.rng
    }

    // ---- mutation API, only reachable through `&mut View` ----------------

    pub fn create_entity(&mut self, settings: EntitySettings) -> crate::error::Result<EntityId> {
        let id = EntityId::from_uuid(self.rng.gen_uuid());
        self.graph.create_entity_with_id(id, settings)
    }

    pub fn update_entity(&mut self, id: EntityId, patch: EntityPatch) -> crate::error::Result<bool> {
        self.graph.update_entity(id, patch)
    }

    pub fn archive_entity(&mut self, id: EntityId, superseded_by: Option<EntityId>) -> bool {
        self.graph.archive_entity(
            id,
            ArchiveOptions {
                superseded_by,
            },
        )
    }

    pub fn add_relationship(
        &mut self,
        kind: impl Into<String>,
        src: EntityId,
        dst: EntityId,
        strength: Option<f64>,
    ) -> bool {
        self.graph.add_relationship(kind, src, dst, strength, None, None)
    }

    /// Archives (not deletes) a relationship row. Used by culling (§4.8) and
    /// any other non-culling archival path; refuses nothing itself, but
    /// callers must not pass a protected kind if they mean to actually
    /// remove it from the active set permanently (protected kinds simply
    /// flip to historical and are never deleted, invariant 7).
    pub fn archive_relationship(&mut self, src: EntityId, dst: EntityId, kind: &str) -> bool {
        self.graph.archive_relationship(src, dst, kind)
    }

    pub fn add_catalyzed_relationship(
        &mut self,
        kind: impl Into<String>,
        src: EntityId,
        dst: EntityId,
        agent: EntityId,
        strength: Option<f64>,
    ) -> bool {
        self.graph
            .add_catalyzed_relationship(kind, src, dst, agent, strength)
    }

    pub fn set_current_era(&mut self, id: EntityId) {
        self.graph.current_era = Some(id);
    }

    /// Direct pressure write, bypassing `pendingDeltas`. Reserved for era
    /// transition/entry effects (§4.6 step 5), which apply synchronously at
    /// the moment of transition rather than queuing for the next tick's
    /// pressure update the way template/system `pressureChanges` do.
    pub fn set_pressure(&mut self, id: impl Into<String>, value: f64) {
        self.graph.set_pressure(id, value);
    }

    pub fn add_history_event(&mut self, kind: EventKind, text: impl Into<String>) {
        self.graph.add_history_event(kind, text);
    }
}
