//! Error types for FEDRA.

use thiserror::Error;

/// Result type alias for FEDRA operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in FEDRA operations.
///
/// Validation variants are fatal to a round and nothing is persisted.
/// `GovernanceUnavailable` and `PersistenceFailure` are retryable by the
/// caller: the pipeline is deterministic for identical inputs.
#[derive(Error, Debug)]
pub enum Error {
    // Validation errors
    #[error("at least 2 node decisions required, got {0}")]
    InsufficientDecisions(usize),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("node {node}: {field} {value} outside [0,1]")]
    FieldOutOfRange {
        node: String,
        field: &'static str,
        value: f64,
    },

    // Collaborator errors
    #[error("governance gate unavailable: {0}")]
    GovernanceUnavailable(String),

    #[error("persistence failed: {0}")]
    PersistenceFailure(String),

    #[error("consensus not found: {0}")]
    ConsensusNotFound(String),

    // Serialization errors
    #[error("serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may retry the round with the same inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::GovernanceUnavailable(_) | Error::PersistenceFailure(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
