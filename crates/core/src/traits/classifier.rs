//! External risk classifier contract

use async_trait::async_trait;

use crate::error::Result;

/// External model scoring a turn's danger level
///
/// Unavailability is a first-class, non-fatal outcome: callers must treat
/// any error as "degrade to keyword-only", never as a failed turn.
#[async_trait]
pub trait RiskClassifier: Send + Sync {
    /// Score `text` in [0, 1]; higher is more dangerous
    async fn score(&self, text: &str) -> Result<f32>;

    /// Provider name for degradation logs
    fn name(&self) -> &str {
        "classifier"
    }
}
