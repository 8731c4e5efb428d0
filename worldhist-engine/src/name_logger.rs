//! Name logger & id generation (§4.14, SPEC_FULL [SUPPLEMENT]).
//!
//! `NameLogger` is the source of truth for name uniqueness within a run —
//! not the graph, since archived entities' names must stay reserved too.
//! `IdGenerator` just wraps the shared seeded `Rng` so every minted id comes
//! from the same stream the rest of the run draws from (§5, §8 determinism
//! law).

use std::collections::{BTreeMap, HashSet};

use worldhist_core::{EntityId, Kind, Rng};

/// Tracks every name assigned per entity kind to guarantee uniqueness
/// within a run. Domain templates draw candidate names and must re-roll on
/// collision; the logger, not `Graph::find_entities`, is consulted because
/// it must keep archived names reserved even after the entity itself is no
/// longer queryable by name through the normal read paths.
#[derive(Debug, Default)]
pub struct NameLogger {
    used: BTreeMap<Kind, HashSet<String>>,
}

impl NameLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_taken(&self, kind: Kind, name: &str) -> bool {
        self.used.get(&kind).is_some_and(|names| names.contains(name))
    }

    /// Reserves `name` for `kind`. Returns `false` without reserving if the
    /// name is already taken, so callers can re-roll.
    pub fn reserve(&mut self, kind: Kind, name: impl Into<String>) -> bool {
        let name = name.into();
        let set = self.used.entry(kind).or_default();
        set.insert(name)
    }

    /// Tries each candidate in order, reserving and returning the first
    /// unused one. `None` if every candidate collides.
    pub fn reserve_first_available<'a>(&mut self, kind: Kind, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
        for candidate in candidates {
            if self.reserve(kind, candidate.to_string()) {
                return Some(candidate.to_string());
            }
        }
        None
    }

    #[must_use]
    pub fn count(&self, kind: Kind) -> usize {
        self.used.get(&kind).map_or(0, HashSet::len)
    }
}

/// Mints `Uuid`-shaped entity ids from the run's seeded RNG stream (§5, §8
/// determinism law), rather than `uuid::Uuid::new_v4`'s OS randomness.
pub struct IdGenerator<'a> {
    rng: &'a mut Rng,
}

impl<'a> IdGenerator<'a> {
    pub fn new(rng: &'a mut Rng) -> Self {
        Self { rng }
    }

    pub fn next_entity_id(&mut self) -> EntityId {
        EntityId::from_uuid(self.rng.gen_uuid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_is_per_kind() {
        let mut logger = NameLogger::new();
        assert!(logger.reserve(Kind::Npc, "Vael"));
        assert!(logger.reserve(Kind::Faction, "Vael"));
        assert!(!logger.reserve(Kind::Npc, "Vael"));
    }

    #[test]
    fn reserve_first_available_skips_collisions() {
        let mut logger = NameLogger::new();
        logger.reserve(Kind::Npc, "Vael");
        let chosen = logger.reserve_first_available(Kind::Npc, ["Vael", "Rema", "Toren"]);
        assert_eq!(chosen.as_deref(), Some("Rema"));
        assert!(logger.is_taken(Kind::Npc, "Rema"));
    }

    #[test]
    fn id_generator_draws_from_seeded_stream() {
        let mut rng_a = Rng::seeded(5);
        let mut rng_b = Rng::seeded(5);
        let id_a = IdGenerator::new(&mut rng_a).next_entity_id();
        let id_b = IdGenerator::new(&mut rng_b).next_entity_id();
        assert_eq!(id_a, id_b);
    }
}
