use super::event_models::Event;
use crate::core::storage::StoreError;
use async_trait::async_trait;

/// Persistence for events, keyed by `event_id`.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;
    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError>;
    async fn insert_event(&self, event: Event) -> Result<(), StoreError>;
    async fn save_event(&self, event: Event) -> Result<(), StoreError>;
    async fn remove_event(&self, event_id: &str) -> Result<Option<Event>, StoreError>;
    /// Replace several existing events with a single write.
    async fn save_events(&self, events: Vec<Event>) -> Result<(), StoreError>;
}
