use super::inventory_models::UserData;
use crate::core::storage::StoreError;
use async_trait::async_trait;

/// Persistence for per-user inventories, keyed by Discord user id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: u64) -> Result<Option<UserData>, StoreError>;
    async fn save_user(&self, user_id: u64, data: UserData) -> Result<(), StoreError>;
    async fn all_users(&self) -> Result<Vec<(u64, UserData)>, StoreError>;
    /// Upsert several users with a single write.
    async fn save_users(&self, users: Vec<(u64, UserData)>) -> Result<(), StoreError>;
}
