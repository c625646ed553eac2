//! Presign service
//!
//! Wraps an [`ObjectStore`] with the process-wide expiry policy and a single
//! addressing style. The style is checked once at construction: a store that
//! would sign with a different style than the one configured is a startup
//! error, not something discovered by players at redirect time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::key::StorageKey;
use crate::storage::{bounded, AddressingStyle, ObjectStore};

/// A time-limited, signed GET URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrl {
    pub resolved_key: String,
    pub presigned_url: String,
    pub expires_at: DateTime<Utc>,
    pub addressing_style: AddressingStyle,
    /// Host the URL points at (the store, never this gateway)
    #[serde(skip)]
    pub host: String,
}

pub struct PresignService {
    store: Arc<dyn ObjectStore>,
    default_expiry: Duration,
    addressing_style: AddressingStyle,
    call_timeout: Duration,
}

impl PresignService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        default_expiry: Duration,
        addressing_style: AddressingStyle,
        call_timeout: Duration,
    ) -> Result<Self> {
        if store.addressing_style() != addressing_style {
            return Err(Error::Config(format!(
                "object store signs with '{}' addressing but '{}' is configured",
                store.addressing_style(),
                addressing_style
            )));
        }
        if default_expiry.is_zero() {
            return Err(Error::Config("presign expiry must be positive".to_string()));
        }

        Ok(Self {
            store,
            default_expiry,
            addressing_style,
            call_timeout,
        })
    }

    #[must_use]
    pub const fn addressing_style(&self) -> AddressingStyle {
        self.addressing_style
    }

    #[must_use]
    pub const fn default_expiry(&self) -> Duration {
        self.default_expiry
    }

    /// Presign `key` with the configured expiry
    pub async fn presign(&self, key: &StorageKey) -> Result<PresignedUrl> {
        self.presign_for(key, self.default_expiry).await
    }

    /// Presign `key` with an explicit expiry
    pub async fn presign_for(&self, key: &StorageKey, expires_in: Duration) -> Result<PresignedUrl> {
        let issued_at = Utc::now();
        let url = bounded(self.call_timeout, self.store.presign_get(key, expires_in)).await?;

        let host = url::Url::parse(&url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_string))
            .ok_or_else(|| Error::Store(format!("store returned an unusable URL for '{key}'")))?;
        let ttl = chrono::Duration::from_std(expires_in)
            .map_err(|e| Error::Internal(format!("expiry out of range: {e}")))?;
        let expires_at = issued_at + ttl;

        // The query string carries the signature and credential scope; only
        // the host is logged.
        debug!(
            key = %key,
            host = %host,
            expires_at = %expires_at.to_rfc3339(),
            addressing_style = %self.addressing_style,
            "Issued presigned URL"
        );

        Ok(PresignedUrl {
            resolved_key: key.to_string(),
            presigned_url: url,
            expires_at,
            addressing_style: self.addressing_style,
            host,
        })
    }

    /// Check existence, bounded by the same call timeout
    pub async fn exists(&self, key: &StorageKey) -> Result<bool> {
        bounded(self.call_timeout, self.store.exists(key)).await
    }
}
