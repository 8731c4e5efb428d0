use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("worker dispatch failed: {0}")]
    Dispatch(String),

    #[error("worker returned unparseable output for task {task_id}: {reason}")]
    UnparseableOutput { task_id: String, reason: String },

    #[error("task {0} was aborted")]
    Aborted(String),
}
