use super::BlobStore;
use crate::core::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory blob store keyed by `<collection>/<record id>/<file name>`
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.blobs.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<()> {
        self.blobs.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.blobs.write().await.remove(key);
        Ok(())
    }
}

/// Storage key of an upload's file
pub fn blob_key(prefix: &str, record_id: &str, file_name: &str) -> String {
    format!("{}/{}/{}", prefix, record_id, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let blobs = InMemoryBlobStore::new();
        let key = blob_key("site_uploads", "U1", "logo.png");
        assert_eq!(key, "site_uploads/U1/logo.png");

        blobs.put(&key, vec![1, 2, 3]).await.unwrap();
        assert_eq!(blobs.get(&key).await.unwrap(), Some(vec![1, 2, 3]));

        blobs.delete(&key).await.unwrap();
        assert!(blobs.get(&key).await.unwrap().is_none());
        assert!(blobs.is_empty().await);
    }
}
