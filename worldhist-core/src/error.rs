//! Engine-wide error type.
//!
//! Mirrors the error kinds spec'd in §7: config errors are fatal before
//! tick 1, template/invariant/enrichment failures are recorded and the tick
//! loop continues, budget events are informational.

use thiserror::Error;

/// Result alias used across every crate in the workspace.
pub type Result<T> = std::result::Result<T, EngineError>;

/// The five error kinds the simulation distinguishes, plus a catch-all for
/// wrapping lower-level failures (serde, io) at crate boundaries.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid or missing configuration. Fatal before the first tick.
    #[error("config error: {0}")]
    Config(String),

    /// A growth template threw during `expand`; its transaction was
    /// aborted and no partial graph change was applied.
    #[error("template '{template}' failed: {reason}")]
    TemplateFailure { template: String, reason: String },

    /// A mutation would have broken a §3 graph invariant; the mutation was
    /// rejected and prior state retained.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The external LLM worker failed or returned unparseable output. The
    /// placeholder description is kept; never fatal.
    #[error("enrichment failed for {entity}: {reason}")]
    EnrichmentFailure { entity: String, reason: String },

    /// Not actually an error: culling triggered because a budget was
    /// exceeded. Carried through the same channel so phases can log
    /// uniformly, but never surfaces as a validator failure.
    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    /// An entity or relationship id referenced by a caller doesn't exist.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for the error kinds that should abort a run before simulation
    /// starts (§7 propagation rules).
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
