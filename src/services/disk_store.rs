//! Local-directory storage backend (server deployment variant).
//!
//! Payloads live directly under `base_path`, one file per image, named by the
//! image name itself. Writes go through a temporary file and an atomic rename
//! so a crash mid-write never leaves a truncated file under a valid-looking
//! name.

use crate::models::image::StoredImage;
use crate::services::store::{
    ImageByteStream, ImageStore, ImageStoreError, StoreResult, content_type_for, ensure_name_safe,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct DiskStore {
    /// Directory holding one file per stored image.
    base_path: PathBuf,
}

impl DiskStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn image_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }
}

#[async_trait]
impl ImageStore for DiskStore {
    async fn put(&self, name: &str, bytes: Bytes) -> StoreResult<StoredImage> {
        ensure_name_safe(name)?;
        fs::create_dir_all(&self.base_path).await?;

        let final_path = self.image_path(name);
        let tmp_path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        if let Err(err) = file.write_all(&bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ImageStoreError::Io(err));
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ImageStoreError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(ImageStoreError::Io(err));
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &final_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&final_path).await?;
                fs::rename(&tmp_path, &final_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(ImageStoreError::Io(err));
            }
        }

        debug!("wrote {} ({} bytes)", final_path.display(), bytes.len());

        Ok(StoredImage {
            name: name.to_string(),
            content_type: Some(content_type_for(name).to_string()),
            size_bytes: bytes.len() as i64,
            stored_at: StoredImage::stored_at_from_name(name).unwrap_or_else(Utc::now),
        })
    }

    async fn get(&self, name: &str) -> StoreResult<(StoredImage, ImageByteStream)> {
        ensure_name_safe(name)?;

        let path = self.image_path(name);
        let file = File::open(&path).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                ImageStoreError::ImageNotFound(name.to_string())
            } else {
                ImageStoreError::Io(err)
            }
        })?;

        let meta = file.metadata().await?;
        let stored_at = StoredImage::stored_at_from_name(name)
            .or_else(|| meta.modified().ok().map(DateTime::<Utc>::from))
            .unwrap_or_else(Utc::now);

        let image = StoredImage {
            name: name.to_string(),
            content_type: Some(content_type_for(name).to_string()),
            size_bytes: meta.len() as i64,
            stored_at,
        };

        Ok((image, ReaderStream::new(file).boxed()))
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        // A directory that was never written to lists as an empty gallery.
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ImageStoreError::Io(err)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // Dot-prefixed entries are our own temp and probe files.
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    async fn probe(&self) -> StoreResult<()> {
        let tmp_path = self.base_path.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&tmp_path, b"readyz").await?;
        let read_back = fs::read(&tmp_path).await;
        let _ = fs::remove_file(&tmp_path).await;
        match read_back {
            Ok(bytes) if bytes == b"readyz" => Ok(()),
            Ok(_) => Err(ImageStoreError::Backend(
                "probe file content mismatch".into(),
            )),
            Err(err) => Err(ImageStoreError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, DiskStore) {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());
        (dir, store)
    }

    async fn collect(mut stream: ImageByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn put_then_get_round_trips_bytes() {
        let (_dir, store) = store();
        let payload = Bytes::from_static(b"\xff\xd8\xff\xe0jpeg-ish");

        let image = store.put("IMG_1700000000.jpg", payload.clone()).await.unwrap();
        assert_eq!(image.size_bytes, payload.len() as i64);
        assert_eq!(image.stored_at.timestamp(), 1_700_000_000);

        let (meta, stream) = store.get("IMG_1700000000.jpg").await.unwrap();
        assert_eq!(meta.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(collect(stream).await, payload.to_vec());
    }

    #[tokio::test]
    async fn zero_byte_payload_is_stored_and_retrievable() {
        let (_dir, store) = store();
        store.put("IMG_1700000001.jpg", Bytes::new()).await.unwrap();

        let (meta, stream) = store.get("IMG_1700000001.jpg").await.unwrap();
        assert_eq!(meta.size_bytes, 0);
        assert!(collect(stream).await.is_empty());
    }

    #[tokio::test]
    async fn same_name_overwrites_last_write_wins() {
        let (_dir, store) = store();
        store
            .put("IMG_1700000002.jpg", Bytes::from_static(b"first"))
            .await
            .unwrap();
        store
            .put("IMG_1700000002.jpg", Bytes::from_static(b"second"))
            .await
            .unwrap();

        let names = store.list().await.unwrap();
        assert_eq!(names, vec!["IMG_1700000002.jpg"]);

        let (_, stream) = store.get("IMG_1700000002.jpg").await.unwrap();
        assert_eq!(collect(stream).await, b"second");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (_dir, store) = store();
        for secs in [1_700_000_000i64, 1_700_000_005, 1_700_000_002] {
            store
                .put(&StoredImage::timestamped_name(secs), Bytes::from_static(b"x"))
                .await
                .unwrap();
        }

        let names = store.list().await.unwrap();
        assert_eq!(
            names,
            vec![
                "IMG_1700000005.jpg",
                "IMG_1700000002.jpg",
                "IMG_1700000000.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn list_on_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_of_unknown_name_is_not_found() {
        let (_dir, store) = store();
        let err = store.get("IMG_1234567890.jpg").await.err().unwrap();
        assert!(matches!(err, ImageStoreError::ImageNotFound(_)));
    }

    #[tokio::test]
    async fn traversal_names_are_rejected_before_resolution() {
        let (_dir, store) = store();
        for name in ["../proof.jpg", "a/b.jpg", "..", "nul\0.jpg"] {
            let err = store.get(name).await.err().unwrap();
            assert!(matches!(err, ImageStoreError::InvalidImageName));
            let err = store.put(name, Bytes::from_static(b"x")).await.unwrap_err();
            assert!(matches!(err, ImageStoreError::InvalidImageName));
        }
    }

    #[tokio::test]
    async fn probe_succeeds_on_writable_directory() {
        let (_dir, store) = store();
        store.probe().await.unwrap();
        // Probe leaves no residue behind for the gallery to pick up.
        assert!(store.list().await.unwrap().is_empty());
    }
}
