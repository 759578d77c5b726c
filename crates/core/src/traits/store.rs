//! Durable store contract
//!
//! Only the load/save surface matters here; the storage engine behind it
//! is an external collaborator. Last-write-wins is acceptable: a lost
//! write is superseded by the next successful one.

use async_trait::async_trait;

use crate::error::Result;
use crate::record::PersistedSession;

#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Load the persisted record for a session id, if any
    async fn load(&self, session_id: &str) -> Result<Option<PersistedSession>>;

    /// Persist a session record (upsert)
    async fn save(&self, record: &PersistedSession) -> Result<()>;
}
