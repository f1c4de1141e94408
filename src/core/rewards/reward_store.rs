use super::reward_models::Reward;
use crate::core::storage::StoreError;
use async_trait::async_trait;

/// Persistence for the reward warehouse.
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    async fn list_rewards(&self) -> Result<Vec<Reward>, StoreError>;
    async fn get_reward(&self, id: &str) -> Result<Option<Reward>, StoreError>;
    /// Fails with `StoreError::Duplicate` when the id is taken.
    async fn insert_reward(&self, reward: Reward) -> Result<(), StoreError>;
    /// Fails with `StoreError::NotFound` when the id is unknown.
    async fn save_reward(&self, reward: Reward) -> Result<(), StoreError>;
    async fn remove_reward(&self, id: &str) -> Result<Option<Reward>, StoreError>;
}
