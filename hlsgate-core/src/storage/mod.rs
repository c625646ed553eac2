// Object store abstraction
//
// Supports two backends:
// - S3ObjectStore: any S3-compatible store through OpenDAL
// - MemoryObjectStore: in-process map (tests, local development)

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::key::StorageKey;

/// How request URLs address the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingStyle {
    /// `endpoint/bucket/key`
    #[default]
    Path,
    /// `bucket.endpoint/key`
    Virtual,
}

impl AddressingStyle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Virtual => "virtual",
        }
    }
}

impl fmt::Display for AddressingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressingStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "path" => Ok(Self::Path),
            "virtual" | "virtual-hosted" => Ok(Self::Virtual),
            other => Err(Error::Config(format!("unknown addressing style '{other}'"))),
        }
    }
}

/// Object store client used by the gateway
///
/// The gateway only ever reads: it fetches playlists and hands out presigned
/// GET URLs for everything else. Retry policy, if any, belongs to the
/// implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full object body
    ///
    /// Returns [`Error::NotFound`] when the object does not exist.
    async fn get_object(&self, key: &StorageKey) -> Result<Bytes>;

    /// Issue a presigned GET URL valid for `expires_in`
    async fn presign_get(&self, key: &StorageKey, expires_in: Duration) -> Result<String>;

    /// Check whether the object exists
    async fn exists(&self, key: &StorageKey) -> Result<bool>;

    /// Addressing style baked into every URL this store issues
    fn addressing_style(&self) -> AddressingStyle;
}

/// Bound a store call by `limit`, mapping expiry to [`Error::Timeout`].
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| Error::Timeout(limit))?
}

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;
