//! Graph-local error type; collapses into `worldhist_core::EngineError` at
//! the engine boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("relationship not found: {kind} {src}->{dst}")]
    RelationshipNotFound {
        kind: String,
        src: String,
        dst: String,
    },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("forbidden field update: {0}")]
    ForbiddenUpdate(String),

    #[error("tag rejected: {0}")]
    TagRejected(String),
}

impl From<GraphError> for worldhist_core::EngineError {
    fn from(e: GraphError) -> Self {
        Self::InvariantViolation(e.to_string())
    }
}
