// In-memory implementations of the core store traits.
//
// These back the service tests so the business rules can be exercised
// without touching the filesystem. They follow the same contracts as the
// JSON stores (duplicate ids rejected, saves of unknown ids rejected).

use crate::core::audit::{AuditStore, LogKind};
use crate::core::events::{Event, EventStore};
use crate::core::inventory::{UserData, UserStore};
use crate::core::rewards::{Reward, WarehouseStore};
use crate::core::storage::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

#[derive(Default)]
pub struct InMemoryWarehouseStore {
    rewards: DashMap<String, Reward>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WarehouseStore for InMemoryWarehouseStore {
    async fn list_rewards(&self) -> Result<Vec<Reward>, StoreError> {
        let mut rewards: Vec<Reward> = self.rewards.iter().map(|r| r.value().clone()).collect();
        rewards.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rewards)
    }

    async fn get_reward(&self, id: &str) -> Result<Option<Reward>, StoreError> {
        Ok(self.rewards.get(id).map(|r| r.value().clone()))
    }

    async fn insert_reward(&self, reward: Reward) -> Result<(), StoreError> {
        if self.rewards.contains_key(&reward.id) {
            return Err(StoreError::Duplicate(reward.id));
        }
        self.rewards.insert(reward.id.clone(), reward);
        Ok(())
    }

    async fn save_reward(&self, reward: Reward) -> Result<(), StoreError> {
        if !self.rewards.contains_key(&reward.id) {
            return Err(StoreError::NotFound(reward.id));
        }
        self.rewards.insert(reward.id.clone(), reward);
        Ok(())
    }

    async fn remove_reward(&self, id: &str) -> Result<Option<Reward>, StoreError> {
        Ok(self.rewards.remove(id).map(|(_, r)| r))
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<u64, UserData>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, user_id: u64) -> Result<Option<UserData>, StoreError> {
        Ok(self.users.get(&user_id).map(|u| u.value().clone()))
    }

    async fn save_user(&self, user_id: u64, data: UserData) -> Result<(), StoreError> {
        self.users.insert(user_id, data);
        Ok(())
    }

    async fn all_users(&self) -> Result<Vec<(u64, UserData)>, StoreError> {
        let mut users: Vec<(u64, UserData)> = self
            .users
            .iter()
            .map(|u| (*u.key(), u.value().clone()))
            .collect();
        users.sort_by_key(|(id, _)| *id);
        Ok(users)
    }

    async fn save_users(&self, users: Vec<(u64, UserData)>) -> Result<(), StoreError> {
        for (user_id, data) in users {
            self.users.insert(user_id, data);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEventStore {
    events: DashMap<String, Event>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let mut events: Vec<Event> = self.events.iter().map(|e| e.value().clone()).collect();
        events.sort_by(|a, b| a.event_id.cmp(&b.event_id));
        Ok(events)
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        Ok(self.events.get(event_id).map(|e| e.value().clone()))
    }

    async fn insert_event(&self, event: Event) -> Result<(), StoreError> {
        if self.events.contains_key(&event.event_id) {
            return Err(StoreError::Duplicate(event.event_id));
        }
        self.events.insert(event.event_id.clone(), event);
        Ok(())
    }

    async fn save_event(&self, event: Event) -> Result<(), StoreError> {
        if !self.events.contains_key(&event.event_id) {
            return Err(StoreError::NotFound(event.event_id));
        }
        self.events.insert(event.event_id.clone(), event);
        Ok(())
    }

    async fn remove_event(&self, event_id: &str) -> Result<Option<Event>, StoreError> {
        Ok(self.events.remove(event_id).map(|(_, e)| e))
    }

    async fn save_events(&self, events: Vec<Event>) -> Result<(), StoreError> {
        for event in events {
            self.save_event(event).await?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAuditStore {
    logs: DashMap<LogKind, Vec<Value>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, log: LogKind, entry: Value) -> Result<(), StoreError> {
        self.logs.entry(log).or_default().push(entry);
        Ok(())
    }

    async fn read(&self, log: LogKind) -> Result<Vec<Value>, StoreError> {
        Ok(self.logs.get(&log).map(|l| l.value().clone()).unwrap_or_default())
    }
}
