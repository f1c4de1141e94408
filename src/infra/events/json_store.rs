use crate::core::events::{Event, EventStore};
use crate::core::storage::StoreError;
use crate::infra::json_file::JsonFile;
use async_trait::async_trait;
use std::path::PathBuf;

/// `events.json`: a JSON array of events.
pub struct JsonEventStore {
    file: JsonFile<Vec<Event>>,
}

impl JsonEventStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            file: JsonFile::open(path)?,
        })
    }
}

#[async_trait]
impl EventStore for JsonEventStore {
    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.file.read(|events| events.clone()).await)
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        Ok(self
            .file
            .read(|events| events.iter().find(|e| e.event_id == event_id).cloned())
            .await)
    }

    async fn insert_event(&self, event: Event) -> Result<(), StoreError> {
        self.file
            .update(|events| {
                if events.iter().any(|e| e.event_id == event.event_id) {
                    return Err(StoreError::Duplicate(event.event_id));
                }
                events.push(event);
                Ok(())
            })
            .await
    }

    async fn save_event(&self, event: Event) -> Result<(), StoreError> {
        self.save_events(vec![event]).await
    }

    async fn remove_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        let exists = self
            .file
            .read(|events| events.iter().any(|e| e.event_id == event_id))
            .await;
        if !exists {
            return Ok(None);
        }
        self.file
            .update(|events| {
                let index = events.iter().position(|e| e.event_id == event_id);
                Ok(index.map(|i| events.remove(i)))
            })
            .await
    }

    async fn save_events(&self, batch: Vec<Event>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.file
            .update(|events| {
                for event in batch {
                    match events.iter_mut().find(|e| e.event_id == event.event_id) {
                        Some(slot) => *slot = event,
                        None => return Err(StoreError::NotFound(event.event_id)),
                    }
                }
                Ok(())
            })
            .await
    }
}
