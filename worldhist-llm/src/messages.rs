//! Wire shapes for the LLM worker protocol (§6) and the enrichment-queue's
//! internal task bookkeeping (§4.10).

use serde::{Deserialize, Serialize};
use worldhist_core::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

/// The seven enrichment kinds the queue batches separately (§4.10), which
/// also double as `LoreRecord::type` values in the exported state (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentType {
    Name,
    Description,
    EraNarrative,
    RelationshipBackstory,
    TechMagic,
    DiscoveryEvent,
    ChainLink,
    EntityChange,
    Occurrence,
}

/// The wire-level task kind a `task.type` field carries to the worker
/// (§6): coarser than `EnrichmentType` since `image` tasks don't map to a
/// single enrichment kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireTaskKind {
    Text,
    Image,
    EraNarrative,
    Relationship,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentTask {
    pub id: TaskId,
    pub enrichment_type: EnrichmentType,
    pub wire_kind: WireTaskKind,
    pub entity_id: Option<EntityId>,
    pub project_id: String,
    pub prompt: String,
    pub previous_image_id: Option<String>,
    /// Tick at which this task was enqueued; retained through dispatch so
    /// ordering-guarantee (3) in §5 holds even though output order is not.
    pub enqueued_tick: u64,
    /// Fingerprint over `(enrichment_type, target id, context hash)` used
    /// for idempotence (§4.10, §8 scenario 6).
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub task_id: TaskId,
    pub text: Option<String>,
    pub image_id: Option<String>,
    pub revised_prompt: Option<String>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub model: String,
    pub estimated_cost: f64,
    pub actual_cost: f64,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// Inbound messages the engine sends to the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerRequest {
    Init { config: serde_json::Value },
    Execute { task: EnrichmentTask },
    Abort { task_id: Option<TaskId> },
}

/// Outbound messages the worker sends back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkerEvent {
    Ready,
    Started { task_id: TaskId },
    Complete { result: EnrichmentResult },
    Error { task_id: TaskId, error: String },
}
