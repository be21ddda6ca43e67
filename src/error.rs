//! Error types for the Streamline lifecycle orchestrator

use std::fmt;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors that can occur while driving cluster lifecycles
#[derive(Debug)]
pub enum OrchestratorError {
    /// Kubernetes API error not covered by a more specific variant
    KubeApi(String),
    /// Resource does not exist
    NotFound(String),
    /// Create collided with an existing resource
    AlreadyExists(String),
    /// Update collided with a newer stored version
    Conflict(String),
    /// Create or update rejected by admission
    AdmissionRejected(String),
    /// A poll exceeded its bound without the predicate becoming true
    TimedOut {
        operation: String,
        last_observed: String,
    },
    /// The external reconciler or a verification job reported a failure
    ReportedFailure { reason: String, message: String },
    /// Caller-side misconfiguration (e.g. update without a fetched version)
    Configuration(String),
    /// Serialization error
    Serialization(String),
}

impl OrchestratorError {
    /// True when the error represents a missing resource, which
    /// delete-oriented operations treat as their goal state.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrchestratorError::NotFound(_))
    }
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::KubeApi(msg) => write!(f, "Kubernetes API error: {}", msg),
            OrchestratorError::NotFound(msg) => write!(f, "Resource not found: {}", msg),
            OrchestratorError::AlreadyExists(msg) => write!(f, "Resource already exists: {}", msg),
            OrchestratorError::Conflict(msg) => write!(f, "Update conflict: {}", msg),
            OrchestratorError::AdmissionRejected(msg) => write!(f, "Admission rejected: {}", msg),
            OrchestratorError::TimedOut {
                operation,
                last_observed,
            } => write!(
                f,
                "Timed out waiting for {} (last observed: {})",
                operation, last_observed
            ),
            OrchestratorError::ReportedFailure { reason, message } => {
                write!(f, "Reported failure: [{}] {}", reason, message)
            }
            OrchestratorError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            OrchestratorError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for OrchestratorError {}

impl From<kube::Error> for OrchestratorError {
    fn from(err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(resp) => match resp.code {
                404 => OrchestratorError::NotFound(resp.message.clone()),
                409 if resp.reason == "AlreadyExists" => {
                    OrchestratorError::AlreadyExists(resp.message.clone())
                }
                409 => OrchestratorError::Conflict(resp.message.clone()),
                422 => OrchestratorError::AdmissionRejected(resp.message.clone()),
                _ => OrchestratorError::KubeApi(err.to_string()),
            },
            _ => OrchestratorError::KubeApi(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(err: serde_json::Error) -> Self {
        OrchestratorError::Serialization(err.to_string())
    }
}
