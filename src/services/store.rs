//! Storage backend abstraction shared by both deployment variants.
//!
//! The gallery's namespace is a flat set of image names inside one backend
//! instance (a local directory or an object-storage bucket). All handlers go
//! through [`ImageStore`], so the two variants stay interchangeable
//! implementations of one capability set: put, get, list.

use crate::models::image::StoredImage;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::{io, sync::Arc};
use thiserror::Error;

const MAX_IMAGE_NAME_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image `{0}` not found")]
    ImageNotFound(String),
    #[error("invalid image name")]
    InvalidImageName,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, ImageStoreError>;

/// Byte stream handed back by `get`, ready to become a response body.
pub type ImageByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Shared handle used as axum state.
pub type DynImageStore = Arc<dyn ImageStore>;

/// Flat put/get/list storage capability keyed by image name.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `bytes` under `name`, replacing any existing entry with the
    /// same name (last write wins).
    async fn put(&self, name: &str, bytes: Bytes) -> StoreResult<StoredImage>;

    /// Retrieve metadata and payload for `name`, or `ImageNotFound`.
    async fn get(&self, name: &str) -> StoreResult<(StoredImage, ImageByteStream)>;

    /// All names in the namespace, sorted descending (newest first).
    async fn list(&self) -> StoreResult<Vec<String>>;

    /// Readiness check against the backend, used by `/readyz` only.
    async fn probe(&self) -> StoreResult<()>;
}

/// Reject names that could escape the storage namespace.
///
/// Callers supply the retrieval name verbatim, so this runs before any
/// resolution against a directory or bucket. Rejects empty and oversized
/// names, path separators, `..` segments, control characters, and NUL.
pub fn ensure_name_safe(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.len() > MAX_IMAGE_NAME_LEN {
        return Err(ImageStoreError::InvalidImageName);
    }
    if name.contains('/') || name.contains("..") {
        return Err(ImageStoreError::InvalidImageName);
    }
    if name
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        return Err(ImageStoreError::InvalidImageName);
    }
    Ok(())
}

/// Infer a content type from the name's extension.
///
/// The ingest path always assigns `.jpg`, but the retrieval path serves
/// whatever the namespace holds, so a few common image types are covered.
pub fn content_type_for(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
            "image/jpeg"
        }
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        Some(ext) if ext.eq_ignore_ascii_case("gif") => "image/gif",
        Some(ext) if ext.eq_ignore_ascii_case("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
