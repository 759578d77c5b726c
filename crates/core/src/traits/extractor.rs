//! Context extraction contract

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;

/// Best-effort derivation of structured context facts from turn text
///
/// Bounded latency is the caller's responsibility (the engine wraps the
/// call in a timeout); an empty map is always an acceptable result.
#[async_trait]
pub trait ContextExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<HashMap<String, serde_json::Value>>;
}
