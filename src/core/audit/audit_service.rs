use super::audit_models::{
    DeletionLogEntry, EventLogEntry, LogKind, LogQuery, RewardLogEntry,
};
use super::audit_store::AuditStore;
use crate::core::storage::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Failed to read the {log} log: {source}")]
    Read { log: LogKind, source: StoreError },
    #[error("Failed to write the {log} log: {source}")]
    Write { log: LogKind, source: StoreError },
}

pub struct AuditService<A: AuditStore> {
    store: Arc<A>,
}

impl<A: AuditStore> AuditService<A> {
    pub fn new(store: Arc<A>) -> Self {
        Self { store }
    }

    pub async fn record_reward(&self, entry: RewardLogEntry) -> Result<(), AuditError> {
        self.append(LogKind::Rewards, &entry).await
    }

    pub async fn record_event(&self, entry: EventLogEntry) -> Result<(), AuditError> {
        self.append(LogKind::Events, &entry).await
    }

    pub async fn record_deletion(&self, entry: DeletionLogEntry) -> Result<(), AuditError> {
        self.append(LogKind::Deletions, &entry).await
    }

    /// Newest first.
    pub async fn reward_history(&self, query: &LogQuery) -> Result<Vec<RewardLogEntry>, AuditError> {
        let entries: Vec<RewardLogEntry> = self.read(LogKind::Rewards).await?;
        Ok(entries
            .into_iter()
            .rev()
            .filter(|e| query.matches_reward(e))
            .collect())
    }

    pub async fn event_history(&self, query: &LogQuery) -> Result<Vec<EventLogEntry>, AuditError> {
        let entries: Vec<EventLogEntry> = self.read(LogKind::Events).await?;
        Ok(entries
            .into_iter()
            .rev()
            .filter(|e| query.matches_event(e))
            .collect())
    }

    pub async fn deletion_history(
        &self,
        query: &LogQuery,
    ) -> Result<Vec<DeletionLogEntry>, AuditError> {
        let entries: Vec<DeletionLogEntry> = self.read(LogKind::Deletions).await?;
        Ok(entries
            .into_iter()
            .rev()
            .filter(|e| query.matches_deletion(e))
            .collect())
    }

    async fn append<T: Serialize>(&self, log: LogKind, entry: &T) -> Result<(), AuditError> {
        let value = serde_json::to_value(entry).map_err(|e| AuditError::Write {
            log,
            source: e.into(),
        })?;
        self.store
            .append(log, value)
            .await
            .map_err(|source| AuditError::Write { log, source })?;
        tracing::debug!(log = log.label(), "Audit entry appended");
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, log: LogKind) -> Result<Vec<T>, AuditError> {
        let raw = self
            .store
            .read(log)
            .await
            .map_err(|source| AuditError::Read { log, source })?;
        raw.into_iter()
            .map(|value| {
                serde_json::from_value(value).map_err(|e| AuditError::Read {
                    log,
                    source: e.into(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::audit_models::{DeletedKind, EventAction, RewardAction};
    use crate::infra::memory::InMemoryAuditStore;
    use serde_json::json;

    fn service() -> (Arc<InMemoryAuditStore>, AuditService<InMemoryAuditStore>) {
        let store = Arc::new(InMemoryAuditStore::new());
        (store.clone(), AuditService::new(store))
    }

    #[tokio::test]
    async fn history_is_newest_first_and_filtered() {
        let (_, audit) = service();
        audit
            .record_reward(RewardLogEntry::new(RewardAction::Created, 1).reward("badge_sun"))
            .await
            .unwrap();
        audit
            .record_reward(
                RewardLogEntry::new(RewardAction::Granted, 2)
                    .target(42)
                    .reward("badge_sun"),
            )
            .await
            .unwrap();
        audit
            .record_reward(RewardLogEntry::new(RewardAction::Granted, 2).target(43).reward("item_shell"))
            .await
            .unwrap();

        let all = audit.reward_history(&LogQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].reward_id.as_deref(), Some("item_shell"));
        assert_eq!(all[2].action, RewardAction::Created);

        let sun = audit
            .reward_history(&LogQuery {
                subject_id: Some("badge_sun".to_string()),
                actor_id: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(sun.len(), 1);
        assert_eq!(sun[0].target_id, Some(42));
    }

    #[tokio::test]
    async fn event_and_deletion_logs_are_separate() {
        let (_, audit) = service();
        audit
            .record_event(EventLogEntry::new(EventAction::Created, 1, "evt_abc12345"))
            .await
            .unwrap();
        audit
            .record_deletion(DeletionLogEntry {
                kind: DeletedKind::Reward,
                object_id: "badge_sun".to_string(),
                name: "Sun".to_string(),
                actor_id: 1,
                timestamp: chrono::Utc::now(),
                reason: String::new(),
                snapshot: json!({ "id": "badge_sun" }),
                unlinked_users: 2,
                unlinked_events: 1,
            })
            .await
            .unwrap();

        assert!(audit
            .reward_history(&LogQuery::default())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(audit.event_history(&LogQuery::default()).await.unwrap().len(), 1);
        let deletions = audit.deletion_history(&LogQuery::default()).await.unwrap();
        assert_eq!(deletions[0].unlinked_users, 2);
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_read_error() {
        let (store, audit) = service();
        store
            .append(LogKind::Rewards, json!({ "action": "exploded" }))
            .await
            .unwrap();
        let err = audit.reward_history(&LogQuery::default()).await.unwrap_err();
        assert!(matches!(
            err,
            AuditError::Read {
                log: LogKind::Rewards,
                ..
            }
        ));
        assert!(err.to_string().starts_with("Failed to read the reward log"));
    }
}
