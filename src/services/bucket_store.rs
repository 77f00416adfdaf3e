//! Object-storage bucket backend (cloud deployment variant).
//!
//! One flat bucket, one object per image, keyed by the image name. Credentials
//! and region come from the ambient AWS environment resolved at startup.

use crate::models::image::StoredImage;
use crate::services::store::{
    ImageByteStream, ImageStore, ImageStoreError, StoreResult, content_type_for, ensure_name_safe,
};
use async_trait::async_trait;
use aws_sdk_s3::{Client, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

#[derive(Clone)]
pub struct BucketStore {
    client: Client,
    bucket: String,
}

impl BucketStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ImageStore for BucketStore {
    async fn put(&self, name: &str, bytes: Bytes) -> StoreResult<StoredImage> {
        ensure_name_safe(name)?;

        let size_bytes = bytes.len() as i64;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_type(content_type_for(name))
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| ImageStoreError::Backend(DisplayErrorContext(err).to_string()))?;

        debug!("put {} into bucket {} ({} bytes)", name, self.bucket, size_bytes);

        Ok(StoredImage {
            name: name.to_string(),
            content_type: Some(content_type_for(name).to_string()),
            size_bytes,
            stored_at: StoredImage::stored_at_from_name(name).unwrap_or_else(Utc::now),
        })
    }

    async fn get(&self, name: &str) -> StoreResult<(StoredImage, ImageByteStream)> {
        ensure_name_safe(name)?;

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|err| {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    ImageStoreError::ImageNotFound(name.to_string())
                } else {
                    ImageStoreError::Backend(DisplayErrorContext(service_err).to_string())
                }
            })?;

        let stored_at = StoredImage::stored_at_from_name(name)
            .or_else(|| {
                output
                    .last_modified()
                    .and_then(|lm| Utc.timestamp_opt(lm.secs(), 0).single())
            })
            .unwrap_or_else(Utc::now);

        let image = StoredImage {
            name: name.to_string(),
            content_type: output
                .content_type()
                .map(str::to_string)
                .or_else(|| Some(content_type_for(name).to_string())),
            size_bytes: output.content_length().unwrap_or(0),
            stored_at,
        };

        let stream = ReaderStream::new(output.body.into_async_read()).boxed();
        Ok((image, stream))
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page =
                page.map_err(|err| ImageStoreError::Backend(DisplayErrorContext(err).to_string()))?;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    names.push(key.to_string());
                }
            }
        }

        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    async fn probe(&self) -> StoreResult<()> {
        self.client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(1)
            .send()
            .await
            .map_err(|err| ImageStoreError::Backend(DisplayErrorContext(err).to_string()))?;
        Ok(())
    }
}
