use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authoring or wiring errors. These indicate the orchestrator was called
/// incorrectly and halt the whole batch before any request is dispatched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("field '{0}' is declared more than once in the field table")]
    DuplicateField(String),

    #[error("engine field '{engine_name}' is mapped from both '{first}' and '{second}'")]
    DuplicateEngineName {
        engine_name: String,
        first: String,
        second: String,
    },

    #[error("field '{0}' is not present in the baseline parameter set")]
    MissingBaselineField(String),

    #[error("field '{field}' expects a {expected} value, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("field '{0}' is substituted rather than offset and cannot be swept")]
    NotSweepable(String),

    #[error("scenario '{0}' already exists")]
    DuplicateScenario(String),

    #[error("scenario '{0}' not found")]
    ScenarioNotFound(String),

    #[error("engine schema is missing fields: {}", missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
}

/// Failure of a single request to the remote engine. Captured per request and
/// never escalated to sibling requests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("engine request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("engine rejected parameters ({status}): {message}")]
    Rejection { status: u16, message: String },

    #[error("invalid engine response: {0}")]
    InvalidResponse(String),
}

impl EngineError {
    /// Fold the transport-level detail into the reported failure class
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Rejection { .. } => ErrorKind::EngineRejection,
            EngineError::Transport(_)
            | EngineError::Timeout { .. }
            | EngineError::InvalidResponse(_) => ErrorKind::Transport,
        }
    }
}

/// Failure class attached to a failed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network or timeout failure reaching the engine
    Transport,
    /// The engine validated and rejected the parameter set
    EngineRejection,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::EngineRejection => write!(f, "engine rejection"),
        }
    }
}
