//! Error types for the Skylift deployer

use thiserror::Error;

/// Main error type for the deployer
///
/// Variants map onto the failure taxonomy: precondition failures abort
/// before any remote state is touched, conflicts abort resolution,
/// pipeline and reconcile failures abort with cleanup guidance, and
/// timeouts are surfaced separately so callers can choose their severity.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Precondition failed: {0}")]
    PreconditionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cloud API error: {0}")]
    CloudApiError(String),

    #[error("Name conflict: {0}")]
    NameConflict(String),

    #[error("Image build failed: {0}")]
    BuildError(String),

    #[error("Image push failed: {0}")]
    PushError(String),

    #[error("Reconcile error: {0}")]
    ReconcileError(String),

    #[error("Instance entered failed state: {0}")]
    InstanceFailed(String),

    #[error("Timed out: {0}")]
    TimeoutError(String),

    #[error("Interrupted by operator")]
    Interrupted,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
