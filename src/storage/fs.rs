use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;
use url::Url;

use crate::storage::{BlobStore, ObjectMetadata, PresignedUrl, StorageError};

type HmacSha256 = Hmac<Sha256>;

const METADATA_SUFFIX: &str = ".meta.json";

/// Configuration for the filesystem-backed store
#[derive(Debug, Clone)]
pub struct FsStoreConfig {
    /// Directory objects are written under
    pub root: PathBuf,
    /// Public base URL that maps onto `root`
    pub public_url: String,
    /// Secret used to sign fetch links
    pub signing_key: String,
}

impl FsStoreConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let signing_key = std::env::var("STORYFORGE_SIGNING_KEY")
            .context("STORYFORGE_SIGNING_KEY environment variable not set")?;

        Ok(Self {
            root: std::env::var("STORYFORGE_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./artifacts")),
            public_url: std::env::var("STORYFORGE_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080/artifacts".to_string()),
            signing_key,
        })
    }
}

/// Blob store writing objects to a local directory, served under a public base URL
///
/// Each object gets a `<key>.meta.json` sidecar holding its content type and metadata.
/// Links are signed with HMAC-SHA256 over the key and expiry timestamp.
pub struct FsBlobStore {
    config: FsStoreConfig,
    base: Url,
}

impl FsBlobStore {
    pub fn new(config: FsStoreConfig) -> Result<Self> {
        let base = Url::parse(config.public_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid public URL: {}", config.public_url))?;
        Ok(Self { config, base })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Stored metadata for `key`
    pub fn metadata(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        let path = self.metadata_path(key)?;
        let raw = read_object(&path, key)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Sign `key` so the link stops working at `expires_at`
    pub fn presign_until(
        &self,
        key: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PresignedUrl, StorageError> {
        validate_key(key)?;
        let expires = expires_at.timestamp();
        let signature = self.sign(key, expires)?;
        let url = format!(
            "{}/{}?expires={}&signature={}",
            self.base.as_str().trim_end_matches('/'),
            key,
            expires,
            signature
        );
        Ok(PresignedUrl { url, expires_at })
    }

    /// Check a link's origin, signature and expiry against `now` and return its key
    pub fn verify_at(&self, url: &str, now: DateTime<Utc>) -> Result<String, StorageError> {
        let parsed = Url::parse(url).map_err(|e| StorageError::MalformedUrl(e.to_string()))?;
        if parsed.origin() != self.base.origin() {
            return Err(StorageError::ForeignUrl(url.to_string()));
        }

        let prefix = format!("{}/", self.base.path().trim_end_matches('/'));
        let key = parsed
            .path()
            .strip_prefix(&prefix)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?
            .to_string();
        validate_key(&key)?;

        let mut expires = None;
        let mut signature = None;
        for (name, value) in parsed.query_pairs() {
            match name.as_ref() {
                "expires" => expires = value.parse::<i64>().ok(),
                "signature" => signature = Some(value.into_owned()),
                _ => {}
            }
        }
        let expires = expires.ok_or_else(|| StorageError::MalformedUrl("missing expires".into()))?;
        let signature =
            signature.ok_or_else(|| StorageError::MalformedUrl("missing signature".into()))?;

        if !self.verify_signature(&key, expires, &signature)? {
            return Err(StorageError::InvalidSignature(key));
        }

        if now.timestamp() >= expires {
            let expired_at = Utc
                .timestamp_opt(expires, 0)
                .single()
                .unwrap_or_default();
            return Err(StorageError::Expired { key, expired_at });
        }

        Ok(key)
    }

    fn mac(&self) -> Result<HmacSha256, StorageError> {
        HmacSha256::new_from_slice(self.config.signing_key.as_bytes())
            .map_err(|e| StorageError::Signing(e.to_string()))
    }

    fn sign(&self, key: &str, expires: i64) -> Result<String, StorageError> {
        let mut mac = self.mac()?;
        mac.update(signing_payload(key, expires).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn verify_signature(&self, key: &str, expires: i64, signature: &str) -> Result<bool, StorageError> {
        let expected = match hex::decode(signature) {
            Ok(bytes) => bytes,
            Err(_) => return Ok(false),
        };
        let mut mac = self.mac()?;
        mac.update(signing_payload(key, expires).as_bytes());
        Ok(mac.verify_slice(&expected).is_ok())
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.config.root.join(key))
    }

    fn metadata_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.config.root.join(format!("{}{}", key, METADATA_SUFFIX)))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, body: &str, metadata: &ObjectMetadata) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&path, body).map_err(io_err)?;

        let sidecar = serde_json::to_string_pretty(metadata)?;
        std::fs::write(self.metadata_path(key)?, sidecar).map_err(io_err)?;

        debug!("Stored {} ({} bytes) at {:?}", key, body.len(), path);
        Ok(())
    }

    fn presign_get(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|e| StorageError::Signing(e.to_string()))?;
        self.presign_until(key, Utc::now() + ttl)
    }

    fn fetch_signed(&self, url: &str) -> Result<String, StorageError> {
        let key = self.verify_at(url, Utc::now())?;
        read_object(&self.object_path(&key)?, &key)
    }
}

fn read_object(path: &Path, key: &str) -> Result<String, StorageError> {
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(key.to_string())
        } else {
            StorageError::Io {
                key: key.to_string(),
                source,
            }
        }
    })
}

fn signing_payload(key: &str, expires: i64) -> String {
    format!("{}\n{}", key, expires)
}

/// Keys are relative `/`-separated paths of `[A-Za-z0-9._-]` segments, no `.` or `..`
fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidKey(key.to_string());

    if key.is_empty() || key.ends_with(METADATA_SUFFIX) {
        return Err(invalid());
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'))
    {
        return Err(invalid());
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid());
    }
    Ok(())
}
