use crate::core::rewards::{Reward, WarehouseStore};
use crate::core::storage::StoreError;
use crate::infra::json_file::JsonFile;
use async_trait::async_trait;
use std::path::PathBuf;

/// `warehouse.json`: a JSON array of rewards.
pub struct JsonWarehouseStore {
    file: JsonFile<Vec<Reward>>,
}

impl JsonWarehouseStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            file: JsonFile::open(path)?,
        })
    }
}

#[async_trait]
impl WarehouseStore for JsonWarehouseStore {
    async fn list_rewards(&self) -> Result<Vec<Reward>, StoreError> {
        Ok(self.file.read(|rewards| rewards.clone()).await)
    }

    async fn get_reward(&self, id: &str) -> Result<Option<Reward>, StoreError> {
        Ok(self
            .file
            .read(|rewards| rewards.iter().find(|r| r.id == id).cloned())
            .await)
    }

    async fn insert_reward(&self, reward: Reward) -> Result<(), StoreError> {
        self.file
            .update(|rewards| {
                if rewards.iter().any(|r| r.id == reward.id) {
                    return Err(StoreError::Duplicate(reward.id));
                }
                rewards.push(reward);
                Ok(())
            })
            .await
    }

    async fn save_reward(&self, reward: Reward) -> Result<(), StoreError> {
        self.file
            .update(|rewards| match rewards.iter_mut().find(|r| r.id == reward.id) {
                Some(slot) => {
                    *slot = reward;
                    Ok(())
                }
                None => Err(StoreError::NotFound(reward.id)),
            })
            .await
    }

    async fn remove_reward(&self, id: &str) -> Result<Option<Reward>, StoreError> {
        let exists = self.file.read(|rewards| rewards.iter().any(|r| r.id == id)).await;
        if !exists {
            return Ok(None);
        }
        self.file
            .update(|rewards| {
                let index = rewards.iter().position(|r| r.id == id);
                Ok(index.map(|i| rewards.remove(i)))
            })
            .await
    }
}
