//! Crisis escalation sink contract

use async_trait::async_trait;

use crate::error::Result;
use crate::risk::RiskAssessment;

/// External handoff mechanism notified when assessed risk requires
/// escalation.
///
/// The engine invokes this at most once per `(session, turn)`; the
/// `turn` sequence number is the idempotence key, so a sink that retries
/// internally cannot double-alert.
#[async_trait]
pub trait EscalationSink: Send + Sync {
    async fn notify(&self, session_id: &str, turn: u64, assessment: &RiskAssessment)
        -> Result<()>;
}
