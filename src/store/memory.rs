//! In-memory bucket used by tests and local dry runs.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use tokio::sync::RwLock;

use super::{ObjectStore, StoreError, StoreResult};

#[derive(Clone, Debug)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

/// Website hosting settings recorded by [`ObjectStore::configure_website`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebsiteSettings {
    pub index_document: String,
    pub error_document: String,
}

#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    website: RwLock<Option<WebsiteSettings>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
            website: RwLock::new(None),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Simulate an outage: every call fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All stored keys in lexicographic order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    pub async fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|object| object.content_type.clone())
    }

    pub async fn website(&self) -> Option<WebsiteSettings> {
        self.website.read().await.clone()
    }

    fn check_available(&self, operation: &'static str) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                operation,
                message: "simulated outage".to_string(),
            });
        }
        Ok(())
    }
}

impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.check_available("list")?;
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.check_available("get")?;
        self.objects
            .read()
            .await
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> StoreResult<()> {
        self.check_available("put")?;
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.check_available("delete")?;
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn configure_website(
        &self,
        index_document: &str,
        error_document: &str,
    ) -> StoreResult<()> {
        self.check_available("configure_website")?;
        *self.website.write().await = Some(WebsiteSettings {
            index_document: index_document.to_string(),
            error_document: error_document.to_string(),
        });
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("memory://{}/{key}", self.bucket)
    }

    fn website_url(&self) -> String {
        format!("memory://{}/", self.bucket)
    }
}
