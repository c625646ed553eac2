// S3-compatible object store backend
//
// Supports:
// - AWS S3
// - Vultr Object Storage / DigitalOcean Spaces
// - Minio
// - Any S3-compatible storage
//
// Uses OpenDAL for unified storage access

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{services::S3, Operator};
use std::time::Duration;

use crate::config::StorageConfig;
use crate::error::Result;
use crate::key::StorageKey;
use crate::storage::{AddressingStyle, ObjectStore};

/// S3 storage backend
pub struct S3ObjectStore {
    operator: Operator,
    key_prefix: String,
    addressing_style: AddressingStyle,
}

impl S3ObjectStore {
    /// Create a new store from configuration
    ///
    /// Credentials come only from the configuration: shared config files and
    /// instance metadata are never consulted.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let region = config.effective_region();

        tracing::info!(
            bucket = %config.bucket,
            endpoint = %config.endpoint,
            region = %region,
            addressing_style = %config.addressing_style,
            "Initializing S3 object store"
        );

        let mut builder = S3::default()
            .endpoint(&config.endpoint)
            .bucket(&config.bucket)
            .region(&region)
            .access_key_id(&config.access_key_id)
            .secret_access_key(&config.secret_access_key)
            .disable_config_load()
            .disable_ec2_metadata();

        if config.addressing_style == AddressingStyle::Virtual {
            builder = builder.enable_virtual_host_style();
        }

        let operator = Operator::new(builder)?.finish();

        Ok(Self {
            operator,
            key_prefix: config.object_key_prefix.trim_matches('/').to_string(),
            addressing_style: config.addressing_style,
        })
    }

    /// Full object path inside the bucket
    fn object_path(&self, key: &StorageKey) -> String {
        if self.key_prefix.is_empty() {
            key.as_str().to_string()
        } else {
            format!("{}/{}", self.key_prefix, key.as_str())
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, key: &StorageKey) -> Result<Bytes> {
        let path = self.object_path(key);

        let buffer = self.operator.read(&path).await?;
        let data = buffer.to_bytes();

        tracing::trace!("Read from S3: {} ({} bytes)", path, data.len());

        Ok(data)
    }

    async fn presign_get(&self, key: &StorageKey, expires_in: Duration) -> Result<String> {
        let path = self.object_path(key);

        let presigned = self.operator.presign_read(&path, expires_in).await?;

        Ok(presigned.uri().to_string())
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool> {
        let path = self.object_path(key);

        Ok(self.operator.exists(&path).await?)
    }

    fn addressing_style(&self) -> AddressingStyle {
        self.addressing_style
    }
}
