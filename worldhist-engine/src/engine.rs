//! The tick-loop orchestrator (§4.2): the only place that holds every
//! collaborator at once and drives them in the order the rest of this crate
//! assumes. Everything else in `worldhist-engine` describes *how* one piece
//! of a tick behaves; this module decides *when* each piece runs.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use worldhist_config::{DomainCallbacks, EngineConfig, LoreProvider};
use worldhist_core::{EntityId, Kind, Result, Status};
use worldhist_graph::{EntityCriteria, Graph, HardState, View};
use worldhist_llm::{EnrichmentClient, EnrichmentType, NullEnrichmentClient};

use crate::catalyst::{ActionHandler, ActionHandlerRegistry, UniversalCatalyst};
use crate::change_detection::ChangeTracker;
use crate::culling::{self, CullingWeights};
use crate::discovery::EmergentDiscovery;
use crate::enrichment_queue::{EnrichmentBudgets, EnrichmentQueue};
use crate::era_lifecycle::{EraSpawner, EraTransition};
use crate::export::{ExportedState, LoreRecord, RunStatistics};
use crate::occurrence::{OccurrenceCreation, OccurrenceRegistry, OccurrenceTrigger};
use crate::pressures::{self, PendingDeltas};
use crate::statistics::{self, EpochStats, Fitness, ValidationReport};
use crate::system::{EnrichmentHint, System, SystemMeta};
use crate::system_selector::{self, SystemSchedule};
use crate::tag_registry::{GraphTagValidator, HealthReport, TagRegistry};
use crate::template::GrowthTemplate;
use crate::template_selector::{self, ScoredTemplate, SelectorState};

/// Deficit fraction above which a kind's shortfall starts pushing pressures
/// upward (§4.9). Not named by the spec text itself; chosen conservatively
/// so a kind only a little under target doesn't constantly nudge pressures.
const DISTRIBUTION_DEFICIT_THRESHOLD: f64 = 0.2;
/// Delta applied per unit of deficit fraction above the threshold (§4.9).
const DISTRIBUTION_DEFICIT_DELTA: f64 = 5.0;
/// Ceiling on how many templates one growth phase samples, regardless of
/// how large the summed deficit gets. Keeps a single phase bounded even
/// against a config with a huge target/actual gap.
const GROWTH_PICKS_CAP: usize = 8;

/// Builds an [`Engine`]. Framework systems (`eraSpawner`, `eraTransition`)
/// are registered automatically; `occurrenceCreation` and
/// `emergentDiscovery` are appended at [`EngineBuilder::build`] once any
/// domain-registered occurrence triggers have been collected.
pub struct EngineBuilder {
    config: EngineConfig,
    domain: Arc<dyn DomainCallbacks>,
    lore: Arc<dyn LoreProvider>,
    templates: Vec<Box<dyn GrowthTemplate>>,
    systems: Vec<Box<dyn System>>,
    schedules: BTreeMap<String, SystemSchedule>,
    action_registry: ActionHandlerRegistry,
    occurrence_registry: OccurrenceRegistry,
    catalyst_base_rate: f64,
    culling_weights: CullingWeights,
    enrichment_budgets: EnrichmentBudgets,
    enrichment_client: Arc<dyn EnrichmentClient>,
    tag_declarations: Vec<(String, Vec<Kind>)>,
    required_relationship_kinds: BTreeMap<Kind, Vec<String>>,
    termination_predicate: Option<Box<dyn Fn(&Graph) -> bool + Send + Sync>>,
    project_id: String,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let mut schedules = BTreeMap::new();
        for id in ["eraSpawner", "eraTransition", "occurrenceCreation", "emergentDiscovery"] {
            schedules.insert(id.to_string(), SystemSchedule::AlwaysRun);
        }
        Self {
            config,
            domain: Arc::new(worldhist_config::domain::NullDomainCallbacks),
            lore: Arc::new(worldhist_config::domain::NullLoreProvider),
            templates: Vec::new(),
            systems: vec![Box::new(EraSpawner::new()), Box::new(EraTransition::new())],
            schedules,
            action_registry: ActionHandlerRegistry::new(),
            occurrence_registry: OccurrenceRegistry::new(),
            catalyst_base_rate: 0.3,
            culling_weights: CullingWeights::default(),
            enrichment_budgets: EnrichmentBudgets::default(),
            enrichment_client: Arc::new(NullEnrichmentClient),
            tag_declarations: Vec::new(),
            required_relationship_kinds: BTreeMap::new(),
            termination_predicate: None,
            project_id: "worldhist".to_string(),
        }
    }

    #[must_use]
    pub fn domain(mut self, domain: Arc<dyn DomainCallbacks>) -> Self {
        self.domain = domain;
        self
    }

    #[must_use]
    pub fn lore(mut self, lore: Arc<dyn LoreProvider>) -> Self {
        self.lore = lore;
        self
    }

    #[must_use]
    pub fn template(mut self, template: Box<dyn GrowthTemplate>) -> Self {
        self.templates.push(template);
        self
    }

    /// Registers a domain system with an explicit run schedule. Framework
    /// systems always run (they self-gate internally); domain systems
    /// usually want a rolled probability instead.
    #[must_use]
    pub fn system(mut self, system: Box<dyn System>, schedule: SystemSchedule) -> Self {
        self.schedules.insert(system.meta().id.clone(), schedule);
        self.systems.push(system);
        self
    }

    #[must_use]
    pub fn action_handler(mut self, action_id: impl Into<String>, handler: ActionHandler) -> Self {
        self.action_registry.register(action_id, handler);
        self
    }

    #[must_use]
    pub fn occurrence_trigger(mut self, trigger: OccurrenceTrigger) -> Self {
        self.occurrence_registry.register(trigger);
        self
    }

    #[must_use]
    pub fn catalyst_base_rate(mut self, base_rate: f64) -> Self {
        self.catalyst_base_rate = base_rate;
        self
    }

    #[must_use]
    pub fn culling_weights(mut self, weights: CullingWeights) -> Self {
        self.culling_weights = weights;
        self
    }

    #[must_use]
    pub fn enrichment_budgets(mut self, budgets: EnrichmentBudgets) -> Self {
        self.enrichment_budgets = budgets;
        self
    }

    #[must_use]
    pub fn enrichment_client(mut self, client: Arc<dyn EnrichmentClient>) -> Self {
        self.enrichment_client = client;
        self
    }

    #[must_use]
    pub fn declare_tag(mut self, key: impl Into<String>, kinds: impl IntoIterator<Item = Kind>) -> Self {
        self.tag_declarations.push((key.into(), kinds.into_iter().collect()));
        self
    }

    #[must_use]
    pub fn require_relationship(mut self, kind: Kind, relationship_kind: impl Into<String>) -> Self {
        self.required_relationship_kinds
            .entry(kind)
            .or_default()
            .push(relationship_kind.into());
        self
    }

    #[must_use]
    pub fn termination_predicate(mut self, predicate: Box<dyn Fn(&Graph) -> bool + Send + Sync>) -> Self {
        self.termination_predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    #[must_use]
    pub fn build(self) -> Engine {
        let tag_registry = Arc::new(Mutex::new(TagRegistry::new()));
        for (key, kinds) in self.tag_declarations {
            tag_registry
                .lock()
                .expect("tag registry mutex poisoned")
                .declare(key, kinds);
        }

        let mut graph = Graph::new();
        graph.set_tag_validator(Box::new(GraphTagValidator::new(tag_registry.clone())));
        graph.growth_metrics = worldhist_graph::GrowthMetrics::new(self.config.growth_metrics_window);

        let rng = worldhist_core::Rng::seeded(self.config.seed);
        let enrichment_queue = EnrichmentQueue::spawn(self.enrichment_budgets, self.enrichment_client);

        let mut systems = self.systems;
        systems.push(Box::new(OccurrenceCreation::new(self.occurrence_registry)));
        systems.push(Box::new(EmergentDiscovery::new()));

        Engine {
            graph,
            config: self.config,
            rng,
            domain: self.domain,
            lore: self.lore,
            tag_registry,
            templates: self.templates,
            systems,
            schedules: self.schedules,
            catalyst: UniversalCatalyst::new(self.catalyst_base_rate),
            action_registry: self.action_registry,
            selector_state: SelectorState::new(),
            pending_deltas: PendingDeltas::new(),
            change_tracker: ChangeTracker::new(),
            enrichment_queue,
            lore_records: Vec::new(),
            culling_weights: self.culling_weights,
            epoch_stats: Vec::new(),
            required_relationship_kinds: self.required_relationship_kinds,
            termination_predicate: self.termination_predicate,
            project_id: self.project_id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// The simulation. Owns the graph, the RNG stream, and every registered
/// collaborator; `run` drives the tick loop described in §4.2 until a
/// termination condition holds, then links the final era and lets the
/// caller flush the enrichment queue.
pub struct Engine {
    graph: Graph,
    config: EngineConfig,
    rng: worldhist_core::Rng,
    domain: Arc<dyn DomainCallbacks>,
    lore: Arc<dyn LoreProvider>,
    tag_registry: Arc<Mutex<TagRegistry>>,
    templates: Vec<Box<dyn GrowthTemplate>>,
    systems: Vec<Box<dyn System>>,
    schedules: BTreeMap<String, SystemSchedule>,
    catalyst: UniversalCatalyst,
    action_registry: ActionHandlerRegistry,
    selector_state: SelectorState,
    pending_deltas: PendingDeltas,
    change_tracker: ChangeTracker,
    enrichment_queue: EnrichmentQueue,
    lore_records: Vec<LoreRecord>,
    culling_weights: CullingWeights,
    epoch_stats: Vec<EpochStats>,
    required_relationship_kinds: BTreeMap<Kind, Vec<String>>,
    termination_predicate: Option<Box<dyn Fn(&Graph) -> bool + Send + Sync>>,
    project_id: String,
    cancelled: Arc<AtomicBool>,
}

impl Engine {
    #[must_use]
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// A clone of the flag `run` checks each tick; an external caller (a
    /// signal handler, a UI cancel button) can set it to stop the loop at
    /// the next tick boundary (§5 cancellation & timeouts).
    #[must_use]
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.graph.tick
    }

    fn current_era(&self) -> Option<HardState> {
        self.graph
            .get_entities_by_kind(Kind::Era)
            .into_iter()
            .find(|e| e.status == Status::Current)
    }

    fn era_modifier(&self, system_id: &str) -> f64 {
        self.current_era()
            .and_then(|era| self.config.era(&era.subtype).cloned())
            .map_or(1.0, |era| era.system_modifier(system_id))
    }

    fn should_terminate(&self) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return true;
        }
        if self.graph.tick >= self.config.max_ticks {
            return true;
        }
        if self.graph.entity_count() >= self.config.hard_cap {
            return true;
        }
        self.termination_predicate
            .as_ref()
            .is_some_and(|predicate| predicate(&self.graph))
    }

    /// Runs ticks until a termination condition holds (§4.2), then links
    /// the final era to every still-prominent entity. Does not flush the
    /// enrichment queue; call [`Engine::flush_enrichment`] from an async
    /// context afterward.
    pub fn run(&mut self) -> Result<()> {
        while !self.should_terminate() {
            self.tick()?;
        }
        self.finalize();
        info!(tick = self.graph.tick, entities = self.graph.entity_count(), "run complete");
        Ok(())
    }

    fn tick(&mut self) -> Result<()> {
        pressures::update_pressures(&mut self.graph, &self.config, &mut self.pending_deltas);
        let mappings = self.domain.pressure_domain_mappings();
        pressures::apply_distribution_pressure(
            &self.graph,
            &self.config,
            &mappings,
            DISTRIBUTION_DEFICIT_THRESHOLD,
            DISTRIBUTION_DEFICIT_DELTA,
            &mut self.pending_deltas,
        );

        let active_before = self.graph.active_relationship_count();
        let tick = self.graph.tick;
        let era_modifiers: BTreeMap<String, f64> = self
            .systems
            .iter()
            .map(|s| s.meta().id.clone())
            .chain(std::iter::once("universalCatalyst".to_string()))
            .map(|id| {
                let modifier = self.era_modifier(&id);
                (id, modifier)
            })
            .collect();

        {
            let mut view = View::new(&mut self.graph, &self.config, &mut self.rng);

            if tick % self.config.simulation_ticks_per_growth == 0 {
                Self::run_growth_phase(
                    &self.templates,
                    &mut self.selector_state,
                    &mut self.pending_deltas,
                    &self.config,
                    &self.domain,
                    &mut view,
                )?;
            }

            // Systems surface enrichment-worthy events (an era handoff, a
            // fresh discovery) via `SystemResult.enrichment` rather than
            // touching `self.lore`/`self.enrichment_queue` directly --
            // `System::apply` only ever holds `&mut View`. Collected here,
            // dispatched once the loop (and its shared borrow of
            // `self.systems`) has ended.
            let mut era_narratives: Vec<EntityId> = Vec::new();
            let mut discovery_events: Vec<EntityId> = Vec::new();
            for system in &self.systems {
                let meta: &SystemMeta = system.meta();
                let era_modifier = era_modifiers.get(&meta.id).copied().unwrap_or(1.0);
                let schedule = self.schedules.get(&meta.id).copied().unwrap_or(SystemSchedule::AlwaysRun);
                if system_selector::should_run(schedule, era_modifier, meta.base_weight, view.rng()) {
                    let result = system.apply(&mut view, era_modifier)?;
                    if let Some(note) = result.note {
                        tracing::debug!(system = %meta.id, %note, "system applied");
                    }
                    match result.enrichment {
                        Some(EnrichmentHint::EraNarrative(id)) => era_narratives.push(id),
                        Some(EnrichmentHint::DiscoveryEvent(id)) => discovery_events.push(id),
                        None => {}
                    }
                }
            }

            let catalyst_modifier = era_modifiers.get("universalCatalyst").copied().unwrap_or(1.0);
            let agents: Vec<EntityId> = view
                .find_entities(&EntityCriteria::new())
                .into_iter()
                .filter(HardState::can_act)
                .map(|e| e.id)
                .collect();
            for agent_id in agents {
                let record = self
                    .catalyst
                    .resolve_agent(&mut view, agent_id, &self.action_registry, catalyst_modifier, 1.0)?;
                if record.status == crate::catalyst::AttemptStatus::Success {
                    tracing::debug!(agent = %agent_id, action = ?record.action_id, "catalyst action succeeded");
                }
            }

            let budget = active_before + self.config.relationship_budget.max_per_simulation_tick;
            culling::cull_to_budget(&mut view, budget, self.culling_weights);

            for era_id in era_narratives {
                if let Some(era_entity) = view.load_entity(era_id) {
                    let prompt = self.lore.era_enrichment_prompt(&era_entity);
                    self.enrichment_queue.enqueue(
                        EnrichmentType::EraNarrative,
                        Some(era_id),
                        &format!("era-narrative:{era_id}"),
                        prompt,
                        tick,
                    );
                }
            }
            for location_id in discovery_events {
                if let Some(location) = view.load_entity(location_id) {
                    let prompt = self.lore.entity_enrichment_prompt(&location);
                    self.enrichment_queue.enqueue(
                        EnrichmentType::DiscoveryEvent,
                        Some(location_id),
                        &format!("discovery-event:{location_id}"),
                        prompt,
                        tick,
                    );
                }
            }

            Self::observe_changes(&mut self.change_tracker, &mut self.enrichment_queue, &self.lore, &view);
        }

        if tick % self.config.epoch_length == 0 {
            let stats = statistics::record_epoch(&self.graph, &self.config.target_entities_per_kind);
            self.graph
                .growth_metrics
                .record_epoch_relationship_count(self.graph.get_relationships().len());
            self.epoch_stats.push(stats);
            self.graph.epoch += 1;
        }

        self.graph.tick += 1;
        Ok(())
    }

    /// Associated function rather than a `&mut self` method: it runs while
    /// `view` (borrowed from `self.graph`/`self.config`/`self.rng`) is still
    /// alive in the caller, so it takes exactly the other fields it needs
    /// instead of `&mut self`, keeping those borrows disjoint.
    #[allow(clippy::too_many_arguments)]
    fn run_growth_phase(
        templates: &[Box<dyn GrowthTemplate>],
        selector_state: &mut SelectorState,
        pending_deltas: &mut PendingDeltas,
        config: &EngineConfig,
        domain: &Arc<dyn DomainCallbacks>,
        view: &mut View<'_, EngineConfig>,
    ) -> Result<()> {
        if templates.is_empty() {
            return Ok(());
        }
        let era_config = view
            .get_entities_by_kind(Kind::Era)
            .into_iter()
            .find(|e| e.status == Status::Current)
            .and_then(|era| config.era(&era.subtype).cloned());
        let pressures: BTreeMap<String, f64> = config
            .pressures
            .keys()
            .map(|id| (id.clone(), view.get_pressure(id)))
            .collect();
        let actual_counts: BTreeMap<Kind, usize> = Kind::all()
            .into_iter()
            .filter(Kind::is_domain_kind)
            .map(|kind| (kind, view.get_entities_by_kind(kind).len()))
            .collect();

        let mut scored = Vec::with_capacity(templates.len());
        for template in templates {
            if !template.can_apply(view) {
                continue;
            }
            let meta = template.meta();
            let era_weight = era_config.as_ref().map_or(1.0, |era| era.template_weight(&meta.id));
            let weight = template_selector::score_template(
                meta,
                era_weight,
                &pressures,
                &meta.pressure_modifiers,
                &config.target_entities_per_kind,
                &actual_counts,
                selector_state.run_count(&meta.id),
                config,
            );
            scored.push(ScoredTemplate { id: meta.id.clone(), weight });
        }
        if scored.is_empty() {
            return Ok(());
        }

        let total_deficit: f64 = config
            .target_entities_per_kind
            .iter()
            .map(|(kind_str, &target)| {
                if target == 0 {
                    return 0.0;
                }
                let Some(kind) = Kind::all().into_iter().find(|k| k.to_string() == *kind_str) else {
                    return 0.0;
                };
                let actual = actual_counts.get(&kind).copied().unwrap_or(0);
                (target.saturating_sub(actual)) as f64 / target as f64
            })
            .sum();
        if total_deficit <= 0.0 {
            return Ok(());
        }
        let picks = (total_deficit.ceil() as usize).clamp(1, GROWTH_PICKS_CAP);

        let picked_ids = template_selector::sample_templates(&scored, picks, view.rng());
        let mut relationships_this_phase = 0;
        for template_id in picked_ids {
            selector_state.record_run(&template_id);
            let Some(index) = templates.iter().position(|t| t.meta().id == template_id) else {
                continue;
            };
            let targets = templates[index].find_targets(view);
            if targets.is_empty() {
                continue;
            }
            let Some(&target) = view.rng().pick_random(&targets) else {
                continue;
            };
            let outcome = match templates[index].expand(view, target) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(template = %template_id, %err, "template expansion failed, transaction discarded");
                    continue;
                }
            };
            Self::apply_expansion(config, domain, pending_deltas, view, &outcome, &mut relationships_this_phase)?;
        }
        Ok(())
    }

    fn apply_expansion(
        config: &EngineConfig,
        domain: &Arc<dyn DomainCallbacks>,
        pending_deltas: &mut PendingDeltas,
        view: &mut View<'_, EngineConfig>,
        outcome: &crate::template::ExpandOutcome,
        relationships_this_phase: &mut usize,
    ) -> Result<()> {
        for expansion in &outcome.expansions {
            match expansion {
                crate::template::Expansion::NewEntity { settings, link_to } => {
                    let id = view.create_entity(settings.clone())?;
                    if let Some(entity) = view.load_entity(id) {
                        if let Err(reason) = domain.validate_entity_structure(&entity) {
                            warn!(entity = %id, %reason, "entity failed domain structural validation");
                        }
                    }
                    if let Some((target, link_kind)) = link_to {
                        if *relationships_this_phase < config.relationship_budget.max_per_growth_phase
                            && view.add_relationship(link_kind.clone(), id, *target, None)
                        {
                            *relationships_this_phase += 1;
                        }
                    }
                }
                crate::template::Expansion::NewRelationship { kind, src, dst, strength } => {
                    if *relationships_this_phase < config.relationship_budget.max_per_growth_phase
                        && view.add_relationship(kind.clone(), *src, *dst, *strength)
                    {
                        *relationships_this_phase += 1;
                    }
                }
            }
        }
        if let Some(description) = &outcome.description {
            view.add_history_event(worldhist_graph::EventKind::Simulation, description.clone());
        }
        pending_deltas.add(&outcome.pressure_changes);
        Ok(())
    }

    /// Change detection + enrichment enqueue (§4.10), run once per tick
    /// against every live entity while the tick's single `View` is still in
    /// scope. An existing entity with at least one qualifying change is
    /// queued as `EntityChange` (carrying what changed); an entity that
    /// qualifies purely on the prominence gate with nothing to report gets
    /// the plain `Description` enrichment instead.
    fn observe_changes(
        change_tracker: &mut ChangeTracker,
        enrichment_queue: &mut EnrichmentQueue,
        lore: &Arc<dyn LoreProvider>,
        view: &View<'_, EngineConfig>,
    ) {
        let entities: Vec<HardState> = Kind::all()
            .into_iter()
            .flat_map(|kind| view.get_entities_by_kind(kind))
            .filter(|e| e.status != Status::Historical)
            .collect();
        for entity in entities {
            let changes = change_tracker.observe(view, &entity);
            if !crate::change_detection::should_enqueue(&entity, &changes) {
                continue;
            }
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            changes.hash(&mut hasher);
            let context_hash = format!("{:x}", hasher.finish());
            let (enrichment_type, prompt) = if changes.is_empty() {
                (EnrichmentType::Description, lore.entity_enrichment_prompt(&entity))
            } else {
                (
                    EnrichmentType::EntityChange,
                    format!(
                        "{} Recent changes: {}.",
                        lore.entity_enrichment_prompt(&entity),
                        changes.join("; ")
                    ),
                )
            };
            enrichment_queue.enqueue(enrichment_type, Some(entity.id), &context_hash, prompt, view.tick());
        }
    }

    fn finalize(&mut self) {
        let Some(era) = self.current_era() else {
            return;
        };
        let mut view = View::new(&mut self.graph, &self.config, &mut self.rng);
        let prominent: Vec<EntityId> = view
            .find_entities(&EntityCriteria::new())
            .into_iter()
            .filter(|e| e.kind != Kind::Era && e.prominence.is_prominent())
            .map(|e| e.id)
            .collect();
        for entity_id in prominent {
            view.add_relationship("active_during", entity_id, era.id, None);
        }
    }

    /// Dispatches every batched enrichment task accumulated this run. The
    /// engine's only asynchronous operation (§5.1); call after [`Engine::run`]
    /// returns.
    pub async fn flush_enrichment(&mut self) -> usize {
        self.enrichment_queue.flush(&self.project_id).await
    }

    /// Feeds a completed enrichment result back into the run's lore ledger.
    /// The engine never awaits the external worker itself (fire-and-forget,
    /// §5), so this is the only path by which `ExportedState.loreRecords`
    /// gets populated; a caller that never wires a worker back in will
    /// legitimately export an empty list.
    pub fn record_lore(&mut self, record: LoreRecord) {
        self.lore_records.push(record);
    }

    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = statistics::validate_graph(&self.graph, &self.required_relationship_kinds);
        for kind in Kind::all() {
            for entity in self.graph.get_entities_by_kind(kind) {
                if !statistics::is_enrichable(entity.prominence) {
                    continue;
                }
                let has_record = self.lore_records.iter().any(|r| r.target == Some(entity.id));
                if !has_record {
                    report.failures.push(format!("{} {} has no lore record", kind, entity.id));
                }
            }
        }
        report
    }

    #[must_use]
    pub fn fitness(&self) -> Fitness {
        let violations = self.validate().failures.len();
        statistics::fitness(&self.graph, &self.config.target_entities_per_kind, violations)
    }

    #[must_use]
    pub fn tag_health(&self) -> HealthReport {
        let counts: BTreeMap<Kind, usize> = Kind::all()
            .into_iter()
            .map(|kind| (kind, self.graph.get_entities_by_kind(kind).len()))
            .collect();
        let total = self.graph.entity_count();
        let untagged = Kind::all()
            .into_iter()
            .flat_map(|kind| self.graph.get_entities_by_kind(kind))
            .filter(|e| e.tags.is_empty())
            .count();
        self.tag_registry
            .lock()
            .expect("tag registry mutex poisoned")
            .health_report(&counts, total, untagged)
    }

    #[must_use]
    pub fn export(&self) -> ExportedState {
        let entities: Vec<HardState> = Kind::all()
            .into_iter()
            .flat_map(|kind| self.graph.get_entities_by_kind(kind))
            .collect();
        ExportedState {
            entities,
            relationships: self.graph.get_relationships(),
            history: self.graph.history.events().to_vec(),
            pressures: self.graph.pressures().clone(),
            current_era_id: self.graph.current_era,
            tick: self.graph.tick,
            epoch: self.graph.epoch,
            statistics: RunStatistics {
                epochs: self.epoch_stats.clone(),
                fitness: self.fitness(),
                validation: self.validate(),
                tag_health: self.tag_health(),
            },
            lore_records: self.lore_records.clone(),
        }
    }
}
