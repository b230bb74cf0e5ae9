//! Hosted image storage.
//!
//! Product images arrive either as already-hosted URLs or as embedded
//! `data:image/...` payloads. Embedded payloads are pushed to an
//! [`AssetStore`] and only the returned URL is persisted.

mod cloudinary;

pub use cloudinary::{CloudinaryAssetStore, CloudinaryConfig};

use async_trait::async_trait;
use thiserror::Error;

/// Folder every product image is uploaded to.
pub const PRODUCTS_FOLDER: &str = "products";

const EMBEDDED_PREFIX: &str = "data:image";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset host request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Asset host rejected the request: {0}")]
    Rejected(String),

    #[error("Asset host is not configured")]
    NotConfigured,
}

pub type AssetResult<T> = Result<T, AssetError>;

/// An image stored by the asset host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Host identifier, including the folder (`products/abc123`)
    pub public_id: String,
    /// HTTPS URL of the stored image
    pub secure_url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store an embedded image payload under `folder`.
    async fn upload(&self, payload: &str, folder: &str) -> AssetResult<UploadedAsset>;

    /// Remove `folder/public_id` from the host.
    async fn delete(&self, public_id: &str, folder: &str) -> AssetResult<()>;
}

/// Stand-in used when no asset host credentials are configured.
/// Every call fails with [`AssetError::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredAssetStore;

#[async_trait]
impl AssetStore for UnconfiguredAssetStore {
    async fn upload(&self, _payload: &str, _folder: &str) -> AssetResult<UploadedAsset> {
        Err(AssetError::NotConfigured)
    }

    async fn delete(&self, _public_id: &str, _folder: &str) -> AssetResult<()> {
        Err(AssetError::NotConfigured)
    }
}

/// True when `image` is an inline `data:image...` payload rather than a URL.
pub fn is_embedded_payload(image: &str) -> bool {
    image.starts_with(EMBEDDED_PREFIX)
}

/// Derive the asset host id from a hosted image URL.
///
/// Takes the last path segment, ignores any query or fragment and cuts at the
/// first `.`: `https://host/v1/products/abc.def.jpg?x=1` gives `abc`.
/// Returns `None` when nothing usable remains.
pub fn storage_id_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let id = segment.split('.').next().unwrap_or(segment);

    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_embedded_payload() {
        assert!(is_embedded_payload("data:image/png;base64,iVBORw0KGgo="));
        assert!(!is_embedded_payload("https://res.cloudinary.com/demo/image/upload/x.png"));
        assert!(!is_embedded_payload("data:text/plain;base64,aGk="));
    }

    #[test]
    fn test_storage_id_from_url() {
        assert_eq!(
            storage_id_from_url(
                "https://res.cloudinary.com/demo/image/upload/v1712/products/abc123.jpg"
            ),
            Some("abc123")
        );
        assert_eq!(
            storage_id_from_url("https://cdn.example.com/products/abc.def.png?v=2#top"),
            Some("abc")
        );
        assert_eq!(storage_id_from_url("plain-id"), Some("plain-id"));
    }

    #[test]
    fn test_storage_id_from_url_rejects_empty() {
        assert_eq!(storage_id_from_url("https://cdn.example.com/products/"), None);
        assert_eq!(storage_id_from_url("https://cdn.example.com/.hidden"), None);
        assert_eq!(storage_id_from_url(""), None);
    }

    #[tokio::test]
    async fn test_unconfigured_store_fails() {
        let store = UnconfiguredAssetStore;

        assert!(matches!(
            store.upload("data:image/png;base64,AA==", PRODUCTS_FOLDER).await,
            Err(AssetError::NotConfigured)
        ));
        assert!(store.delete("abc", PRODUCTS_FOLDER).await.is_err());
    }
}
