use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the engine. All of them are recoverable by the
/// caller; none aborts the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("task {0} not found")]
    TaskNotFound(Uuid),

    #[error("snapshot {0} not found")]
    SnapshotNotFound(u64),

    #[error("{0}")]
    InvalidArgument(String),

    /// Adding the dependency edge would make the graph cyclic.
    #[error("dependency cycle through task {0}")]
    CycleDetected(Uuid),

    /// The task cannot be completed while dependencies are still open.
    #[error("task {id} has {missing} incomplete dependencies")]
    DependenciesIncomplete { id: Uuid, missing: usize },

    #[error("invalid import payload: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
