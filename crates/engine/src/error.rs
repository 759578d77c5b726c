//! Engine error taxonomy
//!
//! Deliberately small: dependency failures degrade inside the turn
//! (keyword-only risk, cache-only sessions, substituted or fallback
//! responses) and never surface here. What remains is misconfiguration
//! at startup and turns addressed to an ended session.

use thiserror::Error;

use support_agent_config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The session was explicitly ended or swept for inactivity; a new
    /// session id is required to continue.
    #[error("session '{0}' has ended and accepts no further turns")]
    SessionEnded(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
