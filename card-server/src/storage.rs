//! Object storage boundary.
//!
//! The real asset backend is an external collaborator; this module pins
//! down the contract the rest of the service relies on: uploads overwrite
//! in place, stable paths never expire, and signed URLs are short-lived
//! grants minted from a stable path at render time.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use card_core::FaceId;

use crate::records::current_timestamp_ms;
use crate::CardId;

/// Bucket holding all card assets and exported faces.
pub const BUCKET_NAME: &str = "card-assets";

/// Lifetime of signed URLs minted for viewers and the export pipeline.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Errors from object storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The referenced object does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// A signed URL could not be parsed or does not belong to this store.
    #[error("Invalid signed URL: {0}")]
    InvalidSignedUrl(String),

    /// A signed URL was valid once but its grant has expired.
    #[error("Signed URL expired: {0}")]
    Expired(String),

    /// The backing store reported a failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// The object-store contract.
///
/// `upload` has overwrite semantics: re-exporting a face replaces the
/// previous bitmap at the same stable path instead of accumulating
/// garbage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes at a stable path, replacing any existing object.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Mint a short-lived fetchable URL for a stable path.
    async fn create_signed_url(&self, path: &str, ttl: Duration)
        -> Result<String, StorageError>;

    /// Resolve a previously minted signed URL to the object bytes.
    async fn fetch(&self, signed_url: &str) -> Result<Vec<u8>, StorageError>;
}

/// Stable path for a raw uploaded asset:
/// `cards/{userId}/{cardId}/assets/{generatedId}.{ext}`.
#[must_use]
pub fn asset_path(user_id: &str, card_id: &CardId, ext: &str) -> String {
    format!("cards/{user_id}/{card_id}/assets/{}.{ext}", Uuid::new_v4())
}

/// Stable path for an exported face bitmap:
/// `cards/{userId}/{cardId}/faces/{faceId}.png`. Overwritten on re-export.
#[must_use]
pub fn face_path(user_id: &str, card_id: &CardId, face: FaceId) -> String {
    format!("cards/{user_id}/{card_id}/faces/{face}.png")
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Debug, Clone)]
struct SignedGrant {
    path: String,
    expires_at_ms: u64,
}

/// In-memory object store for tests and development.
///
/// Signed URLs look like `mem://card-assets/{grant}` and honor their
/// expiry, so the "resolve at render time, never persist" rules can be
/// exercised without a network.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    grants: Arc<RwLock<HashMap<String, SignedGrant>>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an object exists at the given stable path.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(path)
    }

    /// Read an object's bytes directly by stable path (test helper).
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .map(|o| o.bytes.clone())
    }

    /// Content type recorded for a stored object (test helper).
    #[must_use]
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .map(|o| o.content_type.clone())
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let mut objects = self
            .objects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn create_signed_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        if !self.contains(path) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let grant = Uuid::new_v4().simple().to_string();
        let expires_at_ms =
            current_timestamp_ms() + u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self.grants
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(
                grant.clone(),
                SignedGrant {
                    path: path.to_string(),
                    expires_at_ms,
                },
            );

        Ok(format!("mem://{BUCKET_NAME}/{grant}"))
    }

    async fn fetch(&self, signed_url: &str) -> Result<Vec<u8>, StorageError> {
        let parsed = Url::parse(signed_url)
            .map_err(|e| StorageError::InvalidSignedUrl(format!("{signed_url}: {e}")))?;
        if parsed.scheme() != "mem" {
            return Err(StorageError::InvalidSignedUrl(format!(
                "unexpected scheme {}",
                parsed.scheme()
            )));
        }

        let grant_id = parsed.path().trim_start_matches('/').to_string();
        let grant = {
            let grants = self
                .grants
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            grants
                .get(&grant_id)
                .cloned()
                .ok_or_else(|| StorageError::InvalidSignedUrl(signed_url.to_string()))?
        };

        if current_timestamp_ms() > grant.expires_at_ms {
            return Err(StorageError::Expired(signed_url.to_string()));
        }

        let objects = self
            .objects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        objects
            .get(&grant.path)
            .map(|o| o.bytes.clone())
            .ok_or_else(|| StorageError::NotFound(grant.path.clone()))
    }
}

// ---------------------------------------------------------------------------
// HTTP-backed store
// ---------------------------------------------------------------------------

/// Object store backed by a Supabase-style storage REST API.
///
/// Uploads use the upsert header so re-exports overwrite in place; signed
/// URLs come back as paths relative to the storage base.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: Url,
    service_key: String,
}

impl HttpObjectStore {
    /// Create a store talking to the given storage endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not a valid absolute URL.
    pub fn new(base_url: &str, service_key: impl Into<String>) -> Result<Self, StorageError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StorageError::Backend(format!("invalid storage URL: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            service_key: service_key.into(),
        })
    }

    fn object_url(&self, kind: &str, path: &str) -> Result<Url, StorageError> {
        self.base_url
            .join(&format!("storage/v1/{kind}/{BUCKET_NAME}/{path}"))
            .map_err(|e| StorageError::Backend(format!("bad object path {path}: {e}")))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.object_url("object", path)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("upload failed for {path}: {e}")))?;

        if !response.status().is_success() {
            return Err(StorageError::Backend(format!(
                "upload of {path} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn create_signed_url(
        &self,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        #[derive(serde::Deserialize)]
        struct SignResponse {
            #[serde(rename = "signedURL")]
            signed_url: String,
        }

        let url = self.object_url("object/sign", path)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "expiresIn": ttl.as_secs() }))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("signing failed for {path}: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(path.to_string()));
        }
        if !response.status().is_success() {
            return Err(StorageError::Backend(format!(
                "signing {path} returned {}",
                response.status()
            )));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Backend(format!("bad signing response: {e}")))?;

        let absolute = self
            .base_url
            .join(body.signed_url.trim_start_matches('/'))
            .map_err(|e| StorageError::Backend(format!("bad signed URL: {e}")))?;
        Ok(absolute.to_string())
    }

    async fn fetch(&self, signed_url: &str) -> Result<Vec<u8>, StorageError> {
        let url = Url::parse(signed_url)
            .map_err(|e| StorageError::InvalidSignedUrl(format!("{signed_url}: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(StorageError::InvalidSignedUrl(format!(
                "unexpected scheme {}",
                url.scheme()
            )));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("fetch failed: {e}")))?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            return Err(StorageError::Expired(signed_url.to_string()));
        }
        if !response.status().is_success() {
            return Err(StorageError::Backend(format!(
                "fetch returned {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| StorageError::Backend(format!("fetch body failed: {e}")))
    }
}
