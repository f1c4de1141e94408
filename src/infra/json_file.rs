// A JSON document on disk with an in-memory copy.
//
// Reads are served from the cache. Writes apply to a copy of the cache,
// persist that copy (temp file + rename) and only then replace the cache,
// so a failed write leaves both the file and memory untouched.

use crate::core::storage::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub struct JsonFile<T> {
    path: PathBuf,
    cache: RwLock<T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send + Sync,
{
    /// Load the document, or start from `T::default()` when the file is
    /// missing or empty. A file that exists but does not decode is an error;
    /// overwriting it would lose data.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = if path.exists() && fs::metadata(&path)?.len() > 0 {
            let reader = BufReader::new(File::open(&path)?);
            serde_json::from_reader(reader)?
        } else {
            T::default()
        };

        Ok(Self {
            path,
            cache: RwLock::new(data),
        })
    }

    pub async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let cache = self.cache.read().await;
        f(&cache)
    }

    /// Mutate the document and persist it while holding the write lock.
    pub async fn update<R>(
        &self,
        f: impl FnOnce(&mut T) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut cache = self.cache.write().await;
        let mut next = cache.clone();
        let result = f(&mut next)?;
        write_atomic(&self.path, &next).await?;
        *cache = next;
        Ok(result)
    }
}

/// Serialize to a sibling temp file, then rename it over `path`.
pub async fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        let file: JsonFile<BTreeMap<String, u32>> = JsonFile::open(&path).unwrap();
        file.update(|doc| {
            doc.insert("a".to_string(), 1);
            Ok(())
        })
        .await
        .unwrap();
        assert!(!temp_path(&path).exists());

        let reopened: JsonFile<BTreeMap<String, u32>> = JsonFile::open(&path).unwrap();
        assert_eq!(reopened.read(|doc| doc.get("a").copied()).await, Some(1));
    }

    #[tokio::test]
    async fn failed_update_leaves_cache_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let file: JsonFile<Vec<u32>> = JsonFile::open(dir.path().join("doc.json")).unwrap();

        let result: Result<(), StoreError> = file
            .update(|doc| {
                doc.push(7);
                Err(StoreError::NotFound("x".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(file.read(|doc| doc.is_empty()).await);
    }

    #[tokio::test]
    async fn failed_write_keeps_the_cached_copy() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("gone");
        let file: JsonFile<Vec<u32>> = JsonFile::open(folder.join("doc.json")).unwrap();
        fs::remove_dir(&folder).unwrap();

        let result = file
            .update(|doc| {
                doc.push(7);
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(file.read(|doc| doc.is_empty()).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_are_all_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let file = std::sync::Arc::new(JsonFile::<Vec<u32>>::open(&path).unwrap());

        let mut handles = Vec::new();
        for n in 0..20 {
            let file = std::sync::Arc::clone(&file);
            handles.push(tokio::spawn(async move {
                file.update(|doc| {
                    doc.push(n);
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let reopened = JsonFile::<Vec<u32>>::open(&path).unwrap();
        let mut stored = reopened.read(|doc| doc.clone()).await;
        stored.sort_unstable();
        assert_eq!(stored, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{ not json").unwrap();
        let result: Result<JsonFile<Vec<u32>>, _> = JsonFile::open(&path);
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[test]
    fn empty_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "").unwrap();
        assert!(JsonFile::<Vec<u32>>::open(&path).is_ok());
    }
}
