// Audit logs live in three JSON arrays next to the other data files.
//
// Unlike the record stores these are not cached: history commands read the
// file fresh so a hand-edited or corrupted log shows up as a read error
// instead of silently serving stale entries.

use crate::core::audit::{AuditStore, LogKind};
use crate::core::storage::StoreError;
use crate::infra::json_file::write_atomic;
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct JsonAuditStore {
    dir: PathBuf,
    append_lock: Mutex<()>,
}

impl JsonAuditStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            append_lock: Mutex::new(()),
        })
    }

    fn path(&self, log: LogKind) -> PathBuf {
        self.dir.join(log.file_name())
    }
}

async fn load(path: &Path) -> Result<Vec<Value>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl AuditStore for JsonAuditStore {
    async fn append(&self, log: LogKind, entry: Value) -> Result<(), StoreError> {
        let _guard = self.append_lock.lock().await;
        let path = self.path(log);
        // A corrupt log is left alone rather than replaced by a fresh array.
        let mut entries = load(&path).await?;
        entries.push(entry);
        write_atomic(&path, &entries).await
    }

    async fn read(&self, log: LogKind) -> Result<Vec<Value>, StoreError> {
        load(&self.path(log)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn appends_in_order_per_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAuditStore::new(dir.path()).unwrap();

        assert!(store.read(LogKind::Rewards).await.unwrap().is_empty());
        store.append(LogKind::Rewards, json!({ "n": 1 })).await.unwrap();
        store.append(LogKind::Rewards, json!({ "n": 2 })).await.unwrap();
        store.append(LogKind::Events, json!({ "n": 3 })).await.unwrap();

        assert_eq!(
            store.read(LogKind::Rewards).await.unwrap(),
            vec![json!({ "n": 1 }), json!({ "n": 2 })]
        );
        assert!(dir.path().join("event_log.json").exists());
        assert!(store.read(LogKind::Deletions).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_log_is_a_read_error_and_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deletion_log.json");
        std::fs::write(&path, "[{\"kind\": ").unwrap();
        let store = JsonAuditStore::new(dir.path()).unwrap();

        assert!(matches!(
            store.read(LogKind::Deletions).await,
            Err(StoreError::Serialization(_))
        ));
        assert!(store
            .append(LogKind::Deletions, json!({ "n": 1 }))
            .await
            .is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{\"kind\": ");
    }
}
