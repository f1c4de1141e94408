use crate::core::inventory::{UserData, UserStore};
use crate::core::storage::StoreError;
use crate::infra::json_file::JsonFile;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// `users.json`: { user_id: UserData }
pub struct JsonUserStore {
    file: JsonFile<BTreeMap<u64, UserData>>,
}

impl JsonUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            file: JsonFile::open(path)?,
        })
    }
}

#[async_trait]
impl UserStore for JsonUserStore {
    async fn get_user(&self, user_id: u64) -> Result<Option<UserData>, StoreError> {
        Ok(self.file.read(|users| users.get(&user_id).cloned()).await)
    }

    async fn save_user(&self, user_id: u64, data: UserData) -> Result<(), StoreError> {
        self.file
            .update(|users| {
                users.insert(user_id, data);
                Ok(())
            })
            .await
    }

    async fn all_users(&self) -> Result<Vec<(u64, UserData)>, StoreError> {
        Ok(self
            .file
            .read(|users| users.iter().map(|(id, u)| (*id, u.clone())).collect())
            .await)
    }

    async fn save_users(&self, batch: Vec<(u64, UserData)>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.file
            .update(|users| {
                users.extend(batch);
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keys_round_trip_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = JsonUserStore::new(&path).unwrap();
        let mut data = UserData {
            points: 120,
            ..Default::default()
        };
        data.titles.insert("title_captain".to_string());
        data.equipped_title = Some("title_captain".to_string());
        data.items = vec!["item_shell".to_string(), "item_shell".to_string()];
        store.save_user(1234567890123, data.clone()).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"1234567890123\""));

        let reloaded = JsonUserStore::new(&path).unwrap();
        assert_eq!(reloaded.get_user(1234567890123).await.unwrap(), Some(data));
        assert_eq!(reloaded.get_user(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"{ "42": { "points": 7 } }"#).unwrap();

        let store = JsonUserStore::new(&path).unwrap();
        let user = store.get_user(42).await.unwrap().unwrap();
        assert_eq!(user.points, 7);
        assert!(user.items.is_empty());
        assert!(user.equipped_title.is_none());
    }

    #[tokio::test]
    async fn batch_save_upserts() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonUserStore::new(dir.path().join("users.json")).unwrap();
        store.save_user(1, UserData::default()).await.unwrap();
        store
            .save_users(vec![
                (
                    1,
                    UserData {
                        points: 5,
                        ..Default::default()
                    },
                ),
                (2, UserData::default()),
            ])
            .await
            .unwrap();
        let all = store.all_users().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].1.points, 5);
    }
}
