//! Narrow contracts for the collaborators §1 explicitly keeps out of scope:
//! the domain-specific lore provider and the per-domain validation/pressure
//! hooks. The engine only ever calls through these traits.

use std::collections::BTreeMap;

use worldhist_core::Kind;

/// `config.domain` (§6): callbacks the engine consults but never
/// implements itself — the simulated world's rules live here, not in the
/// engine crate.
pub trait DomainCallbacks: Send + Sync {
    /// Structural validation hook; the engine calls this after applying a
    /// template/system/catalyst mutation and surfaces a failure as a
    /// warning, never aborting the tick (§7).
    fn validate_entity_structure(&self, entity: &worldhist_graph::HardState) -> Result<(), String>;

    /// Maps an entity-kind deficit to the pressures that should receive a
    /// positive delta when that deficit exceeds threshold (§4.9).
    fn pressure_domain_mappings(&self) -> BTreeMap<Kind, Vec<String>>;

    /// Which action domains an entity is eligible to draw actions from,
    /// beyond the bare `catalyst.actionDomains` already on the entity
    /// (§4.7 step 2's "domain-schema actor config match").
    fn action_domains_for_entity(&self, entity: &worldhist_graph::HardState) -> Vec<String>;
}

/// Read-only lore content provider, called only by the enrichment queue
/// when it builds prompts for the external LLM worker (§6). The engine
/// never inspects the returned strings; it only forwards them.
pub trait LoreProvider: Send + Sync {
    fn world_name(&self) -> String;
    fn canon_facts(&self) -> Vec<String>;
    fn cultural_groups(&self) -> Vec<String>;
    fn naming_rules(&self) -> Vec<String>;
    fn relationship_patterns(&self) -> Vec<String>;
    fn technology_notes(&self) -> Vec<String>;
    fn magic_system_notes(&self) -> Vec<String>;
    fn conflict_patterns(&self) -> Vec<String>;
    fn geography_constraints(&self) -> Vec<String>;
    fn action_domain_descriptions(&self) -> BTreeMap<String, String>;

    fn entity_enrichment_prompt(&self, entity: &worldhist_graph::HardState) -> String;
    fn relationship_enrichment_prompt(&self, relationship: &worldhist_graph::Relationship) -> String;
    fn occurrence_enrichment_prompt(&self, entity: &worldhist_graph::HardState) -> String;
    fn era_enrichment_prompt(&self, era: &worldhist_graph::HardState) -> String;

    fn geographic_terms(&self) -> Option<Vec<String>> {
        None
    }
    fn mystical_terms(&self) -> Option<Vec<String>> {
        None
    }
    fn lore_cues(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Permissive `DomainCallbacks` for runs with no domain wired in (the CLI's
/// default, and tests): structural validation always passes, no pressure
/// mappings, no extra action domains. Mirrors `NullTagValidator` /
/// `NullEnrichmentClient`'s role as the no-op collaborator a generic engine
/// run falls back to.
#[derive(Debug, Default)]
pub struct NullDomainCallbacks;

impl DomainCallbacks for NullDomainCallbacks {
    fn validate_entity_structure(&self, _entity: &worldhist_graph::HardState) -> Result<(), String> {
        Ok(())
    }

    fn pressure_domain_mappings(&self) -> BTreeMap<Kind, Vec<String>> {
        BTreeMap::new()
    }

    fn action_domains_for_entity(&self, _entity: &worldhist_graph::HardState) -> Vec<String> {
        Vec::new()
    }
}

/// Placeholder `LoreProvider` for runs without a domain's actual lore
/// content (§1 keeps the content itself out of scope). Prompts are plain
/// descriptions of the entity rather than anything resembling real prose,
/// matching "the placeholder description is kept" in §7's `EnrichmentFailure`
/// handling for a worker that was never wired in.
#[derive(Debug, Default)]
pub struct NullLoreProvider;

impl LoreProvider for NullLoreProvider {
    fn world_name(&self) -> String {
        String::new()
    }
    fn canon_facts(&self) -> Vec<String> {
        Vec::new()
    }
    fn cultural_groups(&self) -> Vec<String> {
        Vec::new()
    }
    fn naming_rules(&self) -> Vec<String> {
        Vec::new()
    }
    fn relationship_patterns(&self) -> Vec<String> {
        Vec::new()
    }
    fn technology_notes(&self) -> Vec<String> {
        Vec::new()
    }
    fn magic_system_notes(&self) -> Vec<String> {
        Vec::new()
    }
    fn conflict_patterns(&self) -> Vec<String> {
        Vec::new()
    }
    fn geography_constraints(&self) -> Vec<String> {
        Vec::new()
    }
    fn action_domain_descriptions(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn entity_enrichment_prompt(&self, entity: &worldhist_graph::HardState) -> String {
        format!("Describe {} ({:?}/{}).", entity.name, entity.kind, entity.subtype)
    }
    fn relationship_enrichment_prompt(&self, relationship: &worldhist_graph::Relationship) -> String {
        format!("Describe the {} relationship between {} and {}.", relationship.kind, relationship.src, relationship.dst)
    }
    fn occurrence_enrichment_prompt(&self, entity: &worldhist_graph::HardState) -> String {
        format!("Narrate the occurrence {}.", entity.name)
    }
    fn era_enrichment_prompt(&self, era: &worldhist_graph::HardState) -> String {
        format!("Narrate the era {}.", era.name)
    }
}
