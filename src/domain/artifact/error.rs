use std::path::PathBuf;

use thiserror::Error;

/// Why a contract could not be bound
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("no artifact named {name}.json under {roots}")]
    NotFound { name: String, roots: String },

    #[error("malformed artifact {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("{name} is not deployed on network {network_id}")]
    NotDeployed { name: String, network_id: u64 },

    #[error("invalid contract address {0}")]
    InvalidAddress(String),

    #[error("{name} ABI has no {function}() function")]
    MissingFunction { name: String, function: String },
}

/// Failure categories surfaced by the runtime
#[derive(Debug, Error)]
pub enum FaucetError {
    #[error("wallet provider not detected: {0}")]
    ProviderAbsent(String),

    #[error("contract unavailable: {0}")]
    ArtifactResolution(#[from] ArtifactError),

    #[error("{kind} rejected: {error:#}")]
    InvocationRejected {
        kind: &'static str,
        error: anyhow::Error,
    },

    #[error("{what} query failed: {error:#}")]
    QueryFailed {
        what: &'static str,
        error: anyhow::Error,
    },
}
