// The persistent store is an external collaborator that takes upserts of
// opaque JSON documents by key and answers point reads. The trait keeps the
// core independent of the concrete engine; the in-memory implementation backs
// tests and the directory implementation backs the extraction binary.

use chrono::DateTime;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::Value;
use std::path::Path;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub payload: Value,
    pub modified_at: DateTime<Utc>,
}

#[allow(async_fn_in_trait)]
pub trait KvStore {
    async fn upsert(
        &self,
        key: &str,
        payload: Value,
        modified_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn get(&self, key: &str) -> anyhow::Result<Option<StoredDocument>>;
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    documents: DashMap<String, StoredDocument>,
}

impl MemoryKvStore {
    pub fn new() -> MemoryKvStore {
        MemoryKvStore::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl KvStore for MemoryKvStore {
    async fn upsert(
        &self,
        key: &str,
        payload: Value,
        modified_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.documents.insert(
            key.to_string(),
            StoredDocument {
                payload,
                modified_at,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<StoredDocument>> {
        Ok(self.documents.get(key).map(|doc| doc.value().clone()))
    }
}

/// Writes each document as `<root>/<key>.json`. Keys may contain `/` to get
/// one directory level per dataset.
#[derive(Debug, Clone)]
pub struct DirectoryKvStore {
    root: PathBuf,
}

impl DirectoryKvStore {
    pub fn new(root: impl AsRef<Path>) -> DirectoryKvStore {
        DirectoryKvStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl KvStore for DirectoryKvStore {
    async fn upsert(
        &self,
        key: &str,
        payload: Value,
        modified_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let document = StoredDocument {
            payload,
            modified_at,
        };
        tokio::fs::write(&path, serde_json::to_vec_pretty(&document)?).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<StoredDocument>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_upserts_overwrite_whole_documents() {
        let store = MemoryKvStore::new();
        let first_write = Utc::now();

        store
            .upsert("bus_route/12", json!({"routes": 2}), first_write)
            .await
            .unwrap();
        store
            .upsert("bus_route/12", json!({"routes": 3}), first_write)
            .await
            .unwrap();

        let document = store.get("bus_route/12").await.unwrap().unwrap();
        assert_eq!(document.payload, json!({"routes": 3}));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn memory_store_misses_read_as_none() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn directory_store_roundtrips_documents() {
        let root = std::env::temp_dir().join("tembusu-store-test");
        let _ = tokio::fs::remove_dir_all(&root).await;
        let store = DirectoryKvStore::new(&root);
        let modified_at = Utc::now();

        store
            .upsert("bus_stop_raw/83139", json!({"services": ["15"]}), modified_at)
            .await
            .unwrap();

        let document = store.get("bus_stop_raw/83139").await.unwrap().unwrap();
        assert_eq!(document.payload, json!({"services": ["15"]}));
        assert_eq!(store.get("bus_stop_raw/00000").await.unwrap(), None);

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
