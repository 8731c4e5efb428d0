//! The client-side trait the enrichment queue dispatches through.
//!
//! A real implementation owns the HTTP/process plumbing to the worker
//! (out of scope, §1); the engine only ever talks to this trait, which
//! keeps `worldhist-engine` a pure synchronous crate apart from the channel
//! send itself (§5.1).

use async_trait::async_trait;

use crate::messages::{EnrichmentTask, TaskId};
use crate::Result;

#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    /// Fire-and-forget dispatch (§5 suspension point (a)). The engine does
    /// not block on this; the result (if any) arrives later through
    /// whatever channel the concrete client was constructed with.
    async fn execute(&self, task: EnrichmentTask) -> Result<()>;

    /// Cancellation checked at tick boundaries and enrichment dispatch
    /// (§5 cancellation & timeouts). `None` aborts every in-flight task.
    async fn abort(&self, task_id: Option<TaskId>) -> Result<()>;
}

/// A no-op client used in tests and by domains that run with LLM
/// enrichment disabled; every dispatch is dropped immediately, which is
/// indistinguishable to the engine from "the worker never replied" —
/// exactly the behavior §7's `EnrichmentFailure` handling already expects
/// (placeholder description kept, warning recorded).
#[derive(Debug, Default)]
pub struct NullEnrichmentClient;

#[async_trait]
impl EnrichmentClient for NullEnrichmentClient {
    async fn execute(&self, _task: EnrichmentTask) -> Result<()> {
        Ok(())
    }

    async fn abort(&self, _task_id: Option<TaskId>) -> Result<()> {
        Ok(())
    }
}

