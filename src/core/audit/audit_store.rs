use super::audit_models::LogKind;
use crate::core::storage::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// Append-only storage for the audit logs. Entries travel as raw JSON so a
/// single implementation serves all three logs; decoding into typed
/// entries happens in the service.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, log: LogKind, entry: Value) -> Result<(), StoreError>;
    /// Every entry of a log, oldest first.
    async fn read(&self, log: LogKind) -> Result<Vec<Value>, StoreError>;
}
