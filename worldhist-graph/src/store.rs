//! `Graph`: the typed entity/relationship store (§4.1) and the invariants
//! it enforces on every mutation (§3).

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;
use tracing::warn;
use worldhist_core::{EntityId, Kind, Prominence, Status};

use crate::entity::{EntityPatch, EntitySettings, HardState, LinkRef, ProminenceStep};
use crate::error::{GraphError, Result};
use crate::growth_metrics::GrowthMetrics;
use crate::history::{EventKind, EventLog};
use crate::query::EntityCriteria;
use crate::relationship::{Direction, Relationship, RelationshipCriteria, RelationshipStatus};
use crate::tags::{NullTagValidator, TagValidator};

/// Options accepted by `archiveEntity`.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// If set, a `supersedes` link from the successor to this entity is
    /// created and the successor inherits this entity's active outgoing
    /// relationships (lifecycle: "superseded").
    pub superseded_by: Option<EntityId>,
}

/// The typed entity/relationship graph. Owns the RNG-independent world
/// state: entities, relationships, tick/epoch counters, pressures,
/// relationship cooldowns, the history log and growth metrics.
pub struct Graph {
    entities: IndexMap<EntityId, HardState>,
    relationships: Vec<Relationship>,
    /// `(kind, src, dst)` -> index into `relationships`, for active rows
    /// only. Rebuilt incrementally; used to reject duplicate adds in O(1)
    /// and to avoid a linear scan on `has_relationship`.
    active_index: HashMap<(String, EntityId, EntityId), usize>,
    pub tick: u64,
    pub epoch: u64,
    pub current_era: Option<EntityId>,
    pressures: BTreeMap<String, f64>,
    relationship_cooldowns: HashMap<EntityId, HashMap<String, u64>>,
    pub history: EventLog,
    pub growth_metrics: GrowthMetrics,
    tag_validator: Box<dyn TagValidator>,
}

impl Graph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: IndexMap::new(),
            relationships: Vec::new(),
            active_index: HashMap::new(),
            tick: 0,
            epoch: 0,
            current_era: None,
            pressures: BTreeMap::new(),
            relationship_cooldowns: HashMap::new(),
            history: EventLog::new(),
            growth_metrics: GrowthMetrics::default(),
            tag_validator: Box::new(NullTagValidator),
        }
    }

    pub fn set_tag_validator(&mut self, validator: Box<dyn TagValidator>) {
        self.tag_validator = validator;
    }

    // ---- mutation API -----------------------------------------------

    /// `createEntity(settings) -> id`. Mints a fresh OS-random id; only
    /// suitable outside the tick loop (tests, bootstrap) since it does not
    /// flow through the seeded RNG. The sanctioned in-run path is
    /// `create_entity_with_id`, which `View::create_entity` always uses.
    pub fn create_entity(&mut self, settings: EntitySettings) -> Result<EntityId> {
        self.create_entity_with_id(EntityId::from_uuid(uuid::Uuid::new_v4()), settings)
    }

    /// Same as `create_entity` but with a caller-supplied id, so that
    /// id minting can flow through the single seeded RNG (§5, §8
    /// determinism law) instead of the OS RNG.
    pub fn create_entity_with_id(&mut self, id: EntityId, settings: EntitySettings) -> Result<EntityId> {
        for (key, value) in &settings.tags {
            self.tag_validator
                .validate(settings.kind, key, value)
                .map_err(|e| GraphError::TagRejected(e.to_string()))?;
        }
        let entity = HardState {
            id,
            kind: settings.kind,
            subtype: settings.subtype,
            name: settings.name,
            description: settings.description,
            status: settings.status,
            prominence: settings.prominence,
            culture: settings.culture,
            tags: settings.tags,
            links: Vec::new(),
            created_at: self.tick,
            updated_at: self.tick,
            temporal: settings.temporal,
            coordinates: settings.coordinates,
            catalyst: settings.catalyst,
        };
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Bootstrap-only restoration; bypasses mirror/invariant bookkeeping.
    /// Must only be called before the tick loop starts.
    pub fn _load_entity(&mut self, entity: HardState) {
        self.entities.insert(entity.id, entity);
    }

    /// Bootstrap-only restoration for relationships; rebuilds the active
    /// index entry but does not re-validate invariants.
    pub fn _load_relationship(&mut self, rel: Relationship) {
        if rel.status == RelationshipStatus::Active {
            let key = (rel.kind.clone(), rel.src, rel.dst);
            self.active_index.insert(key, self.relationships.len());
        }
        self.relationships.push(rel);
    }

    /// `updateEntity(id, patch) -> bool`. Rejects forbidden fields (there
    /// is no way to pass an id through `EntityPatch`, so that rejection is
    /// structural) and enforces invariants 4, 6, 8.
    pub fn update_entity(&mut self, id: EntityId, patch: EntityPatch) -> Result<bool> {
        let kind = match self.entities.get(&id) {
            Some(e) => e.kind,
            None => return Ok(false),
        };

        for (key, value) in &patch.tags {
            if let Some(v) = value {
                self.tag_validator
                    .validate(kind, key, v)
                    .map_err(|e| GraphError::TagRejected(e.to_string()))?;
            }
        }

        // Invariant 5: at most one era has status `Current`. Enforced here
        // rather than left solely to `check_single_current_era` (an
        // after-the-fact auditing check, unlike invariants 4/6/8 below)
        // since `eraTransition` always retires the outgoing era to
        // `Historical` before promoting the next one, so a caller can never
        // legitimately need two `Current` eras at once.
        if kind == Kind::Era && patch.status == Some(Status::Current) {
            let other_current_exists = self
                .entities
                .values()
                .any(|e| e.id != id && e.kind == Kind::Era && e.status == Status::Current);
            if other_current_exists {
                return Err(GraphError::InvariantViolation(format!(
                    "entity {id} cannot become the current era while another era is already current"
                )));
            }
        }

        let tick = self.tick;
        let entity = self.entities.get_mut(&id).expect("checked above");

        if let Some(next_status) = patch.status {
            if !entity.status.can_transition_to(next_status) {
                return Err(GraphError::InvariantViolation(format!(
                    "entity {id} cannot transition {:?} -> {next_status:?}",
                    entity.status
                )));
            }
            entity.status = next_status;
        }
        if let Some(step) = patch.prominence_step {
            entity.prominence = match step {
                ProminenceStep::Up => entity.prominence.step_up(),
                ProminenceStep::Down => entity.prominence.step_down(),
            };
        }
        if let Some(name) = patch.name {
            entity.name = name;
        }
        if let Some(desc) = patch.description {
            entity.description = desc;
        }
        if let Some(culture) = patch.culture {
            entity.culture = culture;
        }
        for (key, value) in patch.tags {
            match value {
                Some(v) => {
                    entity.tags.insert(key, v);
                }
                None => {
                    entity.tags.remove(&key);
                }
            }
        }
        if let Some(temporal) = patch.temporal {
            entity.temporal = Some(temporal);
        }
        if let Some(coords) = patch.coordinates {
            entity.coordinates = Some(coords);
        }
        if let Some(catalyst) = patch.catalyst {
            entity.catalyst = Some(catalyst);
        }
        entity.updated_at = tick;
        debug_assert!(entity.created_at <= entity.updated_at && entity.updated_at <= tick);
        Ok(true)
    }

    /// `deleteEntity(id) -> bool`. Hard delete, reserved for transient
    /// templates; also removes every relationship that touches it (no
    /// archival, no mirroring obligation since the row disappears).
    pub fn delete_entity(&mut self, id: EntityId) -> bool {
        if self.entities.shift_remove(&id).is_none() {
            return false;
        }
        self.relationships.retain(|r| r.src != id && r.dst != id);
        self.rebuild_active_index();
        true
    }

    /// `archiveEntity(id, opts)`. Status -> historical, and every active
    /// relationship touching it is archived atomically (invariant 3),
    /// except protected kinds whose rows simply flip status (invariant 7).
    pub fn archive_entity(&mut self, id: EntityId, opts: ArchiveOptions) -> bool {
        if !self.entities.contains_key(&id) {
            warn!(entity = %id, "archive_entity: unknown id, no-op");
            return false;
        }
        let tick = self.tick;
        {
            let entity = self.entities.get_mut(&id).expect("checked above");
            if entity.status == Status::Historical {
                return true;
            }
            entity.status = Status::Historical;
            entity.updated_at = tick;
        }
        for rel in &mut self.relationships {
            if rel.status == RelationshipStatus::Active && (rel.src == id || rel.dst == id) {
                rel.status = RelationshipStatus::Historical;
            }
        }
        self.rebuild_active_index();

        if let Some(successor) = opts.superseded_by {
            let _ = self.add_relationship("supersedes", successor, id, None, None, None);
        }
        true
    }

    /// `addRelationship(kind, src, dst, strength?, distance?, category?) -> bool`.
    /// Duplicate active `(kind, src, dst)` is a no-op returning `false`.
    /// Missing endpoints fail silently returning `false` with a warning.
    pub fn add_relationship(
        &mut self,
        kind: impl Into<String>,
        src: EntityId,
        dst: EntityId,
        strength: Option<f64>,
        distance: Option<f64>,
        category: Option<String>,
    ) -> bool {
        let kind = kind.into();
        if !self.entities.contains_key(&src) || !self.entities.contains_key(&dst) {
            warn!(%src, %dst, %kind, "add_relationship: missing endpoint");
            return false;
        }
        let index_key = (kind.clone(), src, dst);
        if self.active_index.contains_key(&index_key) {
            return false;
        }
        let mut rel = Relationship::new(kind.clone(), src, dst, self.tick);
        if let Some(s) = strength {
            rel = rel.with_strength(s);
        }
        if let Some(d) = distance {
            rel = rel.with_distance(d);
        }
        if let Some(c) = category {
            rel = rel.with_category(c);
        }
        let idx = self.relationships.len();
        self.relationships.push(rel);
        self.active_index.insert(index_key, idx);

        if let Some(src_entity) = self.entities.get_mut(&src) {
            src_entity.links.push(LinkRef { kind, src, dst });
        }
        self.relationship_cooldowns
            .entry(src)
            .or_default()
            .insert(self.relationships[idx].kind.clone(), self.tick);
        true
    }

    /// Relationship with catalyst attribution (§4.7): `catalyzedBy` is set
    /// and the record is appended unconditionally even if an identical
    /// relationship already exists under a different catalyst (attribution
    /// always records the latest actor that successfully created a link).
    pub fn add_catalyzed_relationship(
        &mut self,
        kind: impl Into<String>,
        src: EntityId,
        dst: EntityId,
        agent: EntityId,
        strength: Option<f64>,
    ) -> bool {
        let kind = kind.into();
        if !self.add_relationship(kind.clone(), src, dst, strength, None, None) {
            return false;
        }
        if let Some(last) = self.relationships.last_mut() {
            last.catalyzed_by = Some(agent);
        }
        true
    }

    /// `removeRelationship(src, dst, kind) -> bool`. Hard delete; used by
    /// culling on non-protected kinds (protected kinds are never passed
    /// here — invariant 7 is a caller contract, enforced again defensively
    /// below).
    pub fn remove_relationship(&mut self, src: EntityId, dst: EntityId, kind: &str) -> bool {
        if crate::relationship::is_protected(kind) {
            warn!(%kind, "remove_relationship refused: protected kind");
            return false;
        }
        let before = self.relationships.len();
        self.relationships
            .retain(|r| !(r.src == src && r.dst == dst && r.kind == kind));
        if self.relationships.len() == before {
            return false;
        }
        if let Some(e) = self.entities.get_mut(&src) {
            e.links
                .retain(|l| !(l.src == src && l.dst == dst && l.kind == kind));
        }
        self.rebuild_active_index();
        true
    }

    /// `archiveRelationship`: status -> historical without removing the
    /// row. Used for protected-kind endpoint archival and explicit
    /// non-culling archival.
    pub fn archive_relationship(&mut self, src: EntityId, dst: EntityId, kind: &str) -> bool {
        let mut found = false;
        for rel in &mut self.relationships {
            if rel.src == src && rel.dst == dst && rel.kind == kind && rel.status == RelationshipStatus::Active
            {
                rel.status = RelationshipStatus::Historical;
                found = true;
            }
        }
        if found {
            self.rebuild_active_index();
        }
        found
    }

    fn rebuild_active_index(&mut self) {
        self.active_index.clear();
        for (idx, rel) in self.relationships.iter().enumerate() {
            if rel.status == RelationshipStatus::Active {
                self.active_index
                    .insert((rel.kind.clone(), rel.src, rel.dst), idx);
            }
        }
    }

    // ---- read queries (always defensive copies) ---------------------

    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<HardState> {
        self.entities.get(&id).cloned()
    }

    #[must_use]
    pub fn has_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    #[must_use]
    pub fn find_entities(&self, criteria: &EntityCriteria) -> Vec<HardState> {
        self.entities
            .values()
            .filter(|e| {
                criteria.kind.map_or(true, |k| k == e.kind)
                    && criteria
                        .subtype
                        .as_deref()
                        .map_or(true, |s| s == e.subtype)
                    && criteria.status.map_or(true, |s| s == e.status)
                    && criteria
                        .prominence
                        .map_or(true, |p| p == e.prominence)
                    && criteria.culture.as_deref().map_or(true, |c| c == e.culture)
                    && criteria
                        .tag
                        .as_ref()
                        .map_or(true, |(k, v)| e.tags.get(k) == Some(v))
                    && !criteria.exclude.contains(&e.id)
            })
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get_entities_by_kind(&self, kind: Kind) -> Vec<HardState> {
        self.find_entities(&EntityCriteria::new().with_kind(kind))
    }

    /// Entities directly connected to `id` via an active relationship in
    /// either direction, optionally filtered to one relationship kind.
    #[must_use]
    pub fn get_connected_entities(&self, id: EntityId, kind: Option<&str>) -> Vec<HardState> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for rel in &self.relationships {
            if rel.status != RelationshipStatus::Active {
                continue;
            }
            if let Some(k) = kind {
                if rel.kind != k {
                    continue;
                }
            }
            let other = if rel.src == id {
                Some(rel.dst)
            } else if rel.dst == id {
                Some(rel.src)
            } else {
                None
            };
            if let Some(other_id) = other {
                if seen.insert(other_id) {
                    if let Some(e) = self.entities.get(&other_id) {
                        out.push(e.clone());
                    }
                }
            }
        }
        out
    }

    #[must_use]
    pub fn get_relationships(&self) -> Vec<Relationship> {
        self.relationships.clone()
    }

    #[must_use]
    pub fn find_relationships(&self, criteria: &RelationshipCriteria) -> Vec<Relationship> {
        self.relationships
            .iter()
            .filter(|r| criteria.matches(r))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get_entity_relationships(&self, id: EntityId, direction: Direction) -> Vec<Relationship> {
        self.relationships
            .iter()
            .filter(|r| match direction {
                Direction::Outgoing => r.src == id,
                Direction::Incoming => r.dst == id,
                Direction::Both => r.src == id || r.dst == id,
            })
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn has_relationship(&self, src: EntityId, dst: EntityId, kind: &str) -> bool {
        self.active_index
            .contains_key(&(kind.to_string(), src, dst))
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    #[must_use]
    pub fn active_relationship_count(&self) -> usize {
        self.relationships
            .iter()
            .filter(|r| r.status == RelationshipStatus::Active)
            .count()
    }

    // ---- pressures ----------------------------------------------------

    #[must_use]
    pub fn get_pressure(&self, id: &str) -> f64 {
        self.pressures.get(id).copied().unwrap_or(0.0)
    }

    pub fn set_pressure(&mut self, id: impl Into<String>, value: f64) {
        self.pressures.insert(id.into(), value.clamp(0.0, 100.0));
    }

    #[must_use]
    pub fn pressures(&self) -> &BTreeMap<String, f64> {
        &self.pressures
    }

    pub fn pressures_mut(&mut self) -> &mut BTreeMap<String, f64> {
        &mut self.pressures
    }

    // ---- cooldowns ------------------------------------------------------

    #[must_use]
    pub fn relationship_cooldown(&self, entity: EntityId, kind: &str) -> Option<u64> {
        self.relationship_cooldowns
            .get(&entity)
            .and_then(|m| m.get(kind))
            .copied()
    }

    // ---- history --------------------------------------------------------

    pub fn add_history_event(&mut self, kind: EventKind, text: impl Into<String>) {
        self.history.push(self.tick, kind, text);
    }

    // ---- invariant checks (used by the tests and validators, §8) --------

    /// Invariant 1 + its converse: every link mirrors exactly one
    /// relationship row and vice versa.
    #[must_use]
    pub fn check_links_consistent(&self) -> bool {
        let mut rel_keys: HashMap<(String, EntityId, EntityId), usize> = HashMap::new();
        for r in &self.relationships {
            *rel_keys
                .entry((r.kind.clone(), r.src, r.dst))
                .or_insert(0) += 1;
        }
        for entity in self.entities.values() {
            let mut link_keys: HashMap<(String, EntityId, EntityId), usize> = HashMap::new();
            for l in &entity.links {
                if l.src != entity.id {
                    return false;
                }
                *link_keys
                    .entry((l.kind.clone(), l.src, l.dst))
                    .or_insert(0) += 1;
            }
            for (key, count) in &link_keys {
                if rel_keys.get(key).copied().unwrap_or(0) < *count {
                    return false;
                }
            }
        }
        true
    }

    /// Invariant 2: every relationship endpoint is a live entity id.
    #[must_use]
    pub fn check_relationship_endpoints_live(&self) -> bool {
        self.relationships
            .iter()
            .all(|r| self.entities.contains_key(&r.src) && self.entities.contains_key(&r.dst))
    }

    /// Invariant 5: at most one era has status `Current`.
    #[must_use]
    pub fn check_single_current_era(&self) -> bool {
        self.entities
            .values()
            .filter(|e| e.kind == Kind::Era && e.status == Status::Current)
            .count()
            <= 1
    }

    /// Invariant 6: `createdAt <= updatedAt <= tick` for every entity.
    #[must_use]
    pub fn check_timestamps_ordered(&self) -> bool {
        self.entities
            .values()
            .all(|e| e.created_at <= e.updated_at && e.updated_at <= self.tick)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npc(graph: &mut Graph, name: &str) -> EntityId {
        graph
            .create_entity(EntitySettings::new(Kind::Npc, "commoner", name))
            .unwrap()
    }

    #[test]
    fn duplicate_relationship_add_is_a_no_op() {
        let mut g = Graph::new();
        let a = npc(&mut g, "a");
        let b = npc(&mut g, "b");
        assert!(g.add_relationship("allies", a, b, None, None, None));
        assert!(!g.add_relationship("allies", a, b, None, None, None));
        assert_eq!(g.relationship_count(), 1);
    }

    #[test]
    fn add_relationship_to_missing_endpoint_fails_silently() {
        let mut g = Graph::new();
        let a = npc(&mut g, "a");
        let ghost = EntityId::from_uuid(uuid::Uuid::new_v4());
        assert!(!g.add_relationship("allies", a, ghost, None, None, None));
        assert_eq!(g.relationship_count(), 0);
    }

    #[test]
    fn archiving_unknown_entity_is_a_no_op() {
        let mut g = Graph::new();
        let ghost = EntityId::from_uuid(uuid::Uuid::new_v4());
        assert!(!g.archive_entity(ghost, ArchiveOptions::default()));
    }

    #[test]
    fn archive_entity_archives_its_active_relationships() {
        let mut g = Graph::new();
        let a = npc(&mut g, "a");
        let b = npc(&mut g, "b");
        g.add_relationship("allies", a, b, None, None, None);
        g.archive_entity(a, ArchiveOptions::default());
        let rels = g.get_relationships();
        assert_eq!(rels[0].status, RelationshipStatus::Historical);
        assert!(g.check_links_consistent());
        assert!(g.check_relationship_endpoints_live());
    }

    #[test]
    fn protected_relationship_survives_endpoint_archival() {
        let mut g = Graph::new();
        let a = npc(&mut g, "a");
        let b = npc(&mut g, "b");
        g.add_relationship("part_of", a, b, None, None, None);
        g.archive_entity(a, ArchiveOptions::default());
        let rels = g.get_relationships();
        assert_eq!(rels.len(), 1, "protected row must not be deleted");
        assert_eq!(rels[0].status, RelationshipStatus::Historical);
    }

    #[test]
    fn second_era_cannot_become_current_while_one_already_is() {
        let mut g = Graph::new();
        let first = g
            .create_entity(EntitySettings::new(Kind::Era, "age-of-bronze", "Bronze Age").status(Status::Current))
            .unwrap();
        let second = g
            .create_entity(EntitySettings::new(Kind::Era, "age-of-iron", "Iron Age").status(Status::Future))
            .unwrap();
        let result = g.update_entity(second, EntityPatch::new().with_status(Status::Current));
        assert!(result.is_err());
        assert_eq!(g.get_entity(first).unwrap().status, Status::Current);
        assert!(g.check_single_current_era());
    }

    #[test]
    fn era_handoff_retiring_first_then_promoting_second_is_allowed() {
        let mut g = Graph::new();
        let first = g
            .create_entity(EntitySettings::new(Kind::Era, "age-of-bronze", "Bronze Age").status(Status::Current))
            .unwrap();
        let second = g
            .create_entity(EntitySettings::new(Kind::Era, "age-of-iron", "Iron Age").status(Status::Future))
            .unwrap();
        g.update_entity(first, EntityPatch::new().with_status(Status::Historical))
            .unwrap();
        g.update_entity(second, EntityPatch::new().with_status(Status::Current))
            .unwrap();
        assert_eq!(g.get_entity(second).unwrap().status, Status::Current);
        assert!(g.check_single_current_era());
    }

    #[test]
    fn status_cannot_leave_historical() {
        let mut g = Graph::new();
        let a = npc(&mut g, "a");
        g.update_entity(a, EntityPatch::new().with_status(Status::Historical))
            .unwrap();
        let result = g.update_entity(a, EntityPatch::new().with_status(Status::Active));
        assert!(result.is_err());
    }

    #[test]
    fn prominence_moves_one_step_at_a_time() {
        let mut g = Graph::new();
        let a = npc(&mut g, "a");
        g.update_entity(a, EntityPatch::new().with_prominence_step(ProminenceStep::Up))
            .unwrap();
        assert_eq!(g.get_entity(a).unwrap().prominence, Prominence::Marginal);
    }

    #[test]
    fn find_entities_is_conjunctive() {
        let mut g = Graph::new();
        let a = npc(&mut g, "a");
        g.update_entity(a, EntityPatch::new().with_prominence_step(ProminenceStep::Up))
            .unwrap();
        let b = npc(&mut g, "b");
        let results = g.find_entities(
            &EntityCriteria::new()
                .with_kind(Kind::Npc)
                .with_prominence(Prominence::Marginal),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, a);
        assert_ne!(results[0].id, b);
    }

    #[test]
    fn remove_relationship_refuses_protected_kind() {
        let mut g = Graph::new();
        let a = npc(&mut g, "a");
        let b = npc(&mut g, "b");
        g.add_relationship("part_of", a, b, None, None, None);
        assert!(!g.remove_relationship(a, b, "part_of"));
        assert_eq!(g.relationship_count(), 1);
    }

    #[test]
    fn delete_entity_cascades_relationship_rows() {
        let mut g = Graph::new();
        let a = npc(&mut g, "a");
        let b = npc(&mut g, "b");
        g.add_relationship("allies", a, b, None, None, None);
        assert!(g.delete_entity(a));
        assert_eq!(g.relationship_count(), 0);
        assert!(g.check_relationship_endpoints_live());
    }
}
