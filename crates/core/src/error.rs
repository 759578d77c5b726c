//! Error types shared across the workspace
//!
//! Expected control-flow outcomes (no applicable strategy, supervision
//! rejection) are modelled as values, not errors. These variants cover
//! genuine dependency and serialization failures only.

use thiserror::Error;

/// Core error type for collaborator calls
#[derive(Debug, Error)]
pub enum CoreError {
    /// External dependency is unreachable or refused the call
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// External dependency exceeded its call timeout
    #[error("dependency timed out after {timeout_ms}ms: {dependency}")]
    DependencyTimeout { dependency: String, timeout_ms: u64 },

    /// Durable store load/save failure
    #[error("store error: {0}")]
    Store(String),

    /// Record encode/decode failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::DependencyUnavailable(msg.into())
    }

    pub fn timeout(dependency: impl Into<String>, timeout_ms: u64) -> Self {
        Self::DependencyTimeout {
            dependency: dependency.into(),
            timeout_ms,
        }
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Whether the failure is transient and safe to degrade around
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DependencyUnavailable(_) | Self::DependencyTimeout { .. } | Self::Store(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
