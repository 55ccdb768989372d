//! In-process [`BlobStore`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use postpix_core::naming::public_url;

use crate::{BlobStore, StorageError};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Keeps objects in a map; keys listed in `fail_keys` are rejected.
pub struct MemoryBlobStore {
    assets_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
    fail_keys: Mutex<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new(assets_url: impl Into<String>) -> Self {
        Self {
            assets_url: assets_url.into(),
            objects: Mutex::new(HashMap::new()),
            fail_keys: Mutex::new(Vec::new()),
        }
    }

    /// Make every later `put` whose key contains `fragment` fail.
    pub fn fail_on(&self, fragment: impl Into<String>) {
        self.fail_keys.lock().expect("blob store poisoned").push(fragment.into());
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().expect("blob store poisoned").get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().expect("blob store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        if self.fail_keys.lock().expect("blob store poisoned").iter().any(|f| key.contains(f.as_str())) {
            return Err(StorageError::Upload {
                bucket: "memory".into(),
                key: key.to_string(),
                reason: "rejected".into(),
            });
        }
        self.objects.lock().expect("blob store poisoned").insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(public_url(&self.assets_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_returns_public_url_and_keeps_bytes() {
        let store = MemoryBlobStore::new("https://assets.test/");
        let url = store.put("posts/p/a.png", vec![1, 2], "image/png").await.unwrap();

        assert_eq!(url, "https://assets.test/posts/p/a.png");
        assert_eq!(
            store.object("posts/p/a.png"),
            Some(StoredObject {
                body: vec![1, 2],
                content_type: "image/png".into()
            })
        );
    }

    #[tokio::test]
    async fn configured_keys_fail() {
        let store = MemoryBlobStore::new("https://assets.test");
        store.fail_on("broken");
        let err = store.put("posts/p/broken.png", vec![], "image/png").await.unwrap_err();
        assert!(matches!(err, StorageError::Upload { key, .. } if key == "posts/p/broken.png"));
        assert!(store.is_empty());
    }
}
