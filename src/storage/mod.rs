pub mod fs;
pub mod persist;

pub use fs::*;
pub use persist::*;

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// How long fetch links stay valid
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(3600);

/// Errors raised by a blob store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key: {0:?}")]
    InvalidKey(String),
    #[error("failed to access object {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("failed to encode object metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("URL is not served by this store: {0}")]
    ForeignUrl(String),
    #[error("malformed signed URL: {0}")]
    MalformedUrl(String),
    #[error("signature mismatch for object {0}")]
    InvalidSignature(String),
    #[error("signed URL for {key} expired at {expired_at}")]
    Expired {
        key: String,
        expired_at: DateTime<Utc>,
    },
    #[error("failed to sign URL: {0}")]
    Signing(String),
}

/// Content type and descriptive key/value pairs stored with an object
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub entries: BTreeMap<String, String>,
}

impl ObjectMetadata {
    pub fn new(content_type: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// A read-only link that stops working at `expires_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Write-once blob storage with time-limited signed read links
pub trait BlobStore {
    /// Store `body` under `key`, replacing any previous object
    fn put(&self, key: &str, body: &str, metadata: &ObjectMetadata) -> Result<(), StorageError>;

    /// Produce a read-only link to `key` valid for `ttl`
    fn presign_get(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError>;

    /// Resolve a link produced by [`BlobStore::presign_get`] back to the object body
    fn fetch_signed(&self, url: &str) -> Result<String, StorageError>;
}
