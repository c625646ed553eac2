// In-memory object store
//
// Keeps objects in a map and issues deterministic, unsigned URLs shaped like
// SigV4 presigned URLs. Used by tests and for running the gateway locally
// without a bucket.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::key::StorageKey;
use crate::storage::{AddressingStyle, ObjectStore};

pub struct MemoryObjectStore {
    endpoint: url::Url,
    bucket: String,
    addressing_style: AddressingStyle,
    objects: RwLock<HashMap<String, Bytes>>,
    unavailable: AtomicBool,
    latency: RwLock<Option<Duration>>,
}

impl MemoryObjectStore {
    /// Create an empty store that pretends to live at `endpoint`
    pub fn new(endpoint: &str, bucket: &str, addressing_style: AddressingStyle) -> Result<Self> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint '{endpoint}': {e}")))?;

        Ok(Self {
            endpoint,
            bucket: bucket.to_string(),
            addressing_style,
            objects: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
            latency: RwLock::new(None),
        })
    }

    pub fn insert(&self, key: &str, data: impl Into<Bytes>) {
        self.objects.write().insert(key.to_string(), data.into());
    }

    /// Make every call fail with [`Error::Store`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write() = latency;
    }

    async fn simulate(&self) -> Result<()> {
        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::Store("object store unavailable".to_string()));
        }
        Ok(())
    }

    fn object_url(&self, key: &StorageKey) -> Result<url::Url> {
        let mut url = self.endpoint.clone();

        match self.addressing_style {
            AddressingStyle::Path => {
                url.set_path(&format!("/{}/{}", self.bucket, key.as_str()));
            }
            AddressingStyle::Virtual => {
                let host = self.endpoint.host_str().unwrap_or_default();
                url.set_host(Some(&format!("{}.{host}", self.bucket)))
                    .map_err(|e| Error::Internal(format!("cannot build virtual host: {e}")))?;
                url.set_path(&format!("/{}", key.as_str()));
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, key: &StorageKey) -> Result<Bytes> {
        self.simulate().await?;

        self.objects
            .read()
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn presign_get(&self, key: &StorageKey, expires_in: Duration) -> Result<String> {
        self.simulate().await?;

        let mut url = self.object_url(key)?;
        url.query_pairs_mut()
            .append_pair("X-Amz-Algorithm", "AWS4-HMAC-SHA256")
            .append_pair("X-Amz-Expires", &expires_in.as_secs().to_string())
            .append_pair("X-Amz-Signature", "memory");

        Ok(url.to_string())
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool> {
        self.simulate().await?;

        Ok(self.objects.read().contains_key(key.as_str()))
    }

    fn addressing_style(&self) -> AddressingStyle {
        self.addressing_style
    }
}
