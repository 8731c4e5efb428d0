//! The enrichment queue (§4.10): batches entities per enrichment type,
//! deduplicates by fingerprint, enforces per-run budgets, and dispatches
//! through the external LLM worker contract (§6) over a channel — the
//! engine's only asynchrony (§5.1).

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;
use worldhist_core::EntityId;
use worldhist_llm::{EnrichmentClient, EnrichmentTask, EnrichmentType, TaskId, WireTaskKind};

/// Per-run dispatch ceilings (§4.10).
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentBudgets {
    pub max_entity_enrichments: usize,
    pub max_relationship_enrichments: usize,
    pub max_era_narratives: usize,
}

impl Default for EnrichmentBudgets {
    fn default() -> Self {
        Self {
            max_entity_enrichments: 500,
            max_relationship_enrichments: 200,
            max_era_narratives: 20,
        }
    }
}

/// Default batch size window named in §4.10 ("default batch size 3-6").
const DEFAULT_BATCH_SIZE: usize = 4;

fn wire_kind_for(enrichment_type: EnrichmentType) -> WireTaskKind {
    match enrichment_type {
        EnrichmentType::EraNarrative => WireTaskKind::EraNarrative,
        EnrichmentType::RelationshipBackstory | EnrichmentType::ChainLink => WireTaskKind::Relationship,
        _ => WireTaskKind::Text,
    }
}

fn fingerprint(enrichment_type: EnrichmentType, target: &str, context_hash: &str) -> String {
    format!("{enrichment_type:?}:{target}:{context_hash}")
}

struct PendingTask {
    enrichment_type: EnrichmentType,
    entity_id: Option<EntityId>,
    prompt: String,
    fingerprint: String,
    enqueued_tick: u64,
}

/// Batches and dispatches enrichment tasks. Holds a channel sender rather
/// than the client directly so the engine's tick loop stays synchronous;
/// a worker task owns the receiving end and drives `EnrichmentClient`.
pub struct EnrichmentQueue {
    budgets: EnrichmentBudgets,
    batch_size: usize,
    pending: Vec<PendingTask>,
    seen_fingerprints: HashSet<String>,
    dispatched_entity: usize,
    dispatched_relationship: usize,
    dispatched_era: usize,
    next_task_id: u64,
    sender: mpsc::Sender<EnrichmentTask>,
}

impl EnrichmentQueue {
    #[must_use]
    pub fn new(budgets: EnrichmentBudgets, sender: mpsc::Sender<EnrichmentTask>) -> Self {
        Self {
            budgets,
            batch_size: DEFAULT_BATCH_SIZE,
            pending: Vec::new(),
            seen_fingerprints: HashSet::new(),
            dispatched_entity: 0,
            dispatched_relationship: 0,
            dispatched_era: 0,
            next_task_id: 0,
            sender,
        }
    }

    /// Spawns the channel pair plus a worker loop driving `client`, and
    /// returns the queue half. The worker loop runs until the sender half
    /// (held by the queue) is dropped.
    pub fn spawn(budgets: EnrichmentBudgets, client: Arc<dyn EnrichmentClient>) -> Self {
        let (tx, mut rx) = mpsc::channel::<EnrichmentTask>(64);
        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                if let Err(err) = client.execute(task).await {
                    warn!(%err, "enrichment dispatch failed");
                }
            }
        });
        Self::new(budgets, tx)
    }

    /// Enqueues one task, deduplicating by fingerprint (§4.10, §8 scenario
    /// 6: exactly one dispatch per `(type, entityId, contextHash)` per run).
    pub fn enqueue(
        &mut self,
        enrichment_type: EnrichmentType,
        entity_id: Option<EntityId>,
        context_hash: &str,
        prompt: impl Into<String>,
        tick: u64,
    ) -> bool {
        let target = entity_id.map(|id| id.to_string()).unwrap_or_default();
        let fp = fingerprint(enrichment_type, &target, context_hash);
        if self.seen_fingerprints.contains(&fp) {
            return false;
        }
        self.seen_fingerprints.insert(fp.clone());
        self.pending.push(PendingTask {
            enrichment_type,
            entity_id,
            prompt: prompt.into(),
            fingerprint: fp,
            enqueued_tick: tick,
        });
        true
    }

    fn budget_remaining(&self, enrichment_type: EnrichmentType) -> bool {
        match enrichment_type {
            EnrichmentType::EraNarrative => self.dispatched_era < self.budgets.max_era_narratives,
            EnrichmentType::RelationshipBackstory | EnrichmentType::ChainLink => {
                self.dispatched_relationship < self.budgets.max_relationship_enrichments
            }
            _ => self.dispatched_entity < self.budgets.max_entity_enrichments,
        }
    }

    fn record_dispatch(&mut self, enrichment_type: EnrichmentType) {
        match enrichment_type {
            EnrichmentType::EraNarrative => self.dispatched_era += 1,
            EnrichmentType::RelationshipBackstory | EnrichmentType::ChainLink => {
                self.dispatched_relationship += 1;
            }
            _ => self.dispatched_entity += 1,
        }
    }

    /// Groups pending tasks by enrichment type into batches of
    /// `batch_size`, drops whatever exceeds budget, and dispatches the
    /// rest over the channel. Returns the number of tasks actually sent.
    pub async fn flush(&mut self, project_id: &str) -> usize {
        let mut by_type: BTreeMap<EnrichmentType, Vec<PendingTask>> = BTreeMap::new();
        for task in self.pending.drain(..) {
            by_type.entry(task.enrichment_type).or_default().push(task);
        }

        let mut dispatched = 0;
        for (enrichment_type, tasks) in by_type {
            for chunk in tasks.chunks(self.batch_size.max(1)) {
                for task in chunk {
                    if !self.budget_remaining(enrichment_type) {
                        warn!(?enrichment_type, "enrichment budget exhausted, dropping task");
                        continue;
                    }
                    let wire_task = EnrichmentTask {
                        id: TaskId(self.next_task_id),
                        enrichment_type,
                        wire_kind: wire_kind_for(enrichment_type),
                        entity_id: task.entity_id,
                        project_id: project_id.to_string(),
                        prompt: task.prompt.clone(),
                        previous_image_id: None,
                        enqueued_tick: task.enqueued_tick,
                        fingerprint: task.fingerprint.clone(),
                    };
                    self.next_task_id += 1;
                    if self.sender.send(wire_task).await.is_ok() {
                        self.record_dispatch(enrichment_type);
                        dispatched += 1;
                    }
                }
            }
        }
        dispatched
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_fingerprint_enqueues_once() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut queue = EnrichmentQueue::new(EnrichmentBudgets::default(), tx);
        let entity = EntityId::from_uuid(uuid::Uuid::new_v4());
        assert!(queue.enqueue(EnrichmentType::Description, Some(entity), "ctx", "describe", 1));
        assert!(!queue.enqueue(EnrichmentType::Description, Some(entity), "ctx", "describe again", 1));
        assert_eq!(queue.pending_len(), 1);

        let dispatched = queue.flush("project").await;
        assert_eq!(dispatched, 1);
        let received = rx.recv().await.unwrap();
        assert_eq!(received.fingerprint, fingerprint(EnrichmentType::Description, &entity.to_string(), "ctx"));
    }

    #[tokio::test]
    async fn budget_caps_dispatch_count() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut budgets = EnrichmentBudgets::default();
        budgets.max_entity_enrichments = 1;
        let mut queue = EnrichmentQueue::new(budgets, tx);
        for i in 0..3 {
            let entity = EntityId::from_uuid(uuid::Uuid::new_v4());
            queue.enqueue(EnrichmentType::Description, Some(entity), &i.to_string(), "d", 1);
        }
        let dispatched = queue.flush("project").await;
        assert_eq!(dispatched, 1);
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }
}
