//! `DurableStore` implementations
//!
//! `InMemoryDurableStore` backs tests and single-process deployments.
//! `FileDurableStore` keeps one JSON document per session under a root
//! directory, writing through a temp file + rename so a crashed save
//! never leaves a half-written record.

use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use support_agent_core::{CoreError, DurableStore, PersistedSession, Result};

#[derive(Default)]
pub struct InMemoryDurableStore {
    records: DashMap<String, PersistedSession>,
}

impl InMemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl DurableStore for InMemoryDurableStore {
    async fn load(&self, session_id: &str) -> Result<Option<PersistedSession>> {
        Ok(self.records.get(session_id).map(|r| r.clone()))
    }

    async fn save(&self, record: &PersistedSession) -> Result<()> {
        self.records.insert(record.session_id.clone(), record.clone());
        Ok(())
    }
}

pub struct FileDurableStore {
    root: PathBuf,
}

impl FileDurableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn record_path(&self, session_id: &str) -> PathBuf {
        // Session ids come from callers; the encoding must be injective
        // so distinct ids never share a record file.
        let mut safe = String::with_capacity(session_id.len());
        for byte in session_id.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' => safe.push(byte as char),
                other => {
                    safe.push('_');
                    safe.push_str(&format!("{other:02x}"));
                }
            }
        }
        self.root.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl DurableStore for FileDurableStore {
    async fn load(&self, session_id: &str) -> Result<Option<PersistedSession>> {
        let path = self.record_path(session_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let record = serde_json::from_slice(&bytes)?;
                Ok(Some(record))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(CoreError::store(format!(
                "read {}: {err}",
                path.display()
            ))),
        }
    }

    async fn save(&self, record: &PersistedSession) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| CoreError::store(format!("create store root: {err}")))?;

        let bytes = serde_json::to_vec_pretty(record)?;
        let tmp = self.root.join(format!(".{}.tmp", Uuid::new_v4()));
        let path = self.record_path(&record.session_id);

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|err| CoreError::store(format!("write {}: {err}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|err| CoreError::store(format!("rename to {}: {err}", path.display())))?;
        Ok(())
    }
}
