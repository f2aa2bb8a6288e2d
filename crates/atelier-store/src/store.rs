//! Artifact store client

use crate::backend::{BucketNames, StorageBackend, StorageError};
use atelier_artifact::{generate_key, ArtifactReference, Bucket, ImageAsset, MediaType, VideoAsset};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// A write the backend refused
#[derive(Debug, thiserror::Error)]
#[error("upload to {bucket}/{key} failed: {source}")]
pub struct UploadFailure {
    /// Logical bucket the write targeted
    pub bucket: Bucket,
    /// Generated key
    pub key: String,
    /// Backend detail
    #[source]
    pub source: StorageError,
}

/// Client the pipeline uses for uploads and rollback deletes
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct ArtifactStore {
    backend: Arc<dyn StorageBackend>,
    buckets: BucketNames,
}

impl ArtifactStore {
    #[inline]
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_bucket_names(backend, BucketNames::default())
    }

    #[inline]
    #[must_use]
    pub fn with_bucket_names(backend: Arc<dyn StorageBackend>, buckets: BucketNames) -> Self {
        Self { backend, buckets }
    }

    #[inline]
    #[must_use]
    pub fn bucket_names(&self) -> &BucketNames {
        &self.buckets
    }

    /// Write `data` under `key` in `bucket`
    ///
    /// # Errors
    /// Returns `UploadFailure` if the backend rejects the write, including
    /// when `key` already exists.
    pub async fn upload(
        &self,
        data: Bytes,
        bucket: Bucket,
        key: &str,
        media_type: MediaType,
    ) -> Result<ArtifactReference, UploadFailure> {
        let bucket_name = self.buckets.name(bucket);
        let size = data.len();

        self.backend
            .put(bucket_name, key, data, media_type.mime())
            .await
            .map_err(|source| UploadFailure {
                bucket,
                key: key.to_string(),
                source,
            })?;

        metrics::counter!("atelier_uploads_total", "bucket" => bucket.default_name()).increment(1);
        tracing::debug!(bucket = %bucket_name, key, size, content_type = %media_type, "Uploaded artifact");

        Ok(self.public_url(bucket, key))
    }

    /// Upload an image under a fresh key derived from its role
    ///
    /// # Errors
    /// Returns `UploadFailure` if the backend rejects the write.
    pub async fn upload_image(
        &self,
        asset: &ImageAsset,
        bucket: Bucket,
    ) -> Result<ArtifactReference, UploadFailure> {
        let key = generate_key(asset.role().tag(), asset.format().extension());
        tracing::debug!(role = %asset.role(), digest = %asset.digest().short(), "Uploading image");
        self.upload(asset.data().clone(), bucket, &key, asset.format().media_type())
            .await
    }

    /// Upload a video to the video bucket under a fresh key
    ///
    /// # Errors
    /// Returns `UploadFailure` if the backend rejects the write.
    pub async fn upload_video(&self, video: &VideoAsset) -> Result<ArtifactReference, UploadFailure> {
        let media_type = video.media_type();
        let key = generate_key("video", media_type.extension());
        tracing::debug!(digest = %video.digest().short(), "Uploading video");
        self.upload(video.data().clone(), Bucket::GeneratedVideos, &key, media_type)
            .await
    }

    /// Best-effort removal of an uploaded artifact
    ///
    /// The bucket comes from the reference itself. Failures are logged and
    /// reported as `false`; they are never escalated.
    pub async fn delete(&self, reference: &ArtifactReference) -> bool {
        let bucket_name = self.buckets.name(reference.bucket());
        match self.backend.remove(bucket_name, reference.key()).await {
            Ok(()) => {
                tracing::debug!(bucket = %bucket_name, key = reference.key(), "Deleted artifact");
                true
            }
            Err(e) => {
                tracing::warn!(
                    bucket = %bucket_name,
                    key = reference.key(),
                    error = %e,
                    "Failed to delete artifact"
                );
                false
            }
        }
    }

    /// Derive the reference for `bucket/key` without I/O
    #[must_use]
    pub fn public_url(&self, bucket: Bucket, key: &str) -> ArtifactReference {
        let url = self.backend.public_url(self.buckets.name(bucket), key);
        ArtifactReference::new(bucket, key, url)
    }
}

impl fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("buckets", &self.buckets)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use atelier_artifact::{ImageFormat, ViewRole};

    fn store() -> (Arc<MemoryStore>, ArtifactStore) {
        let backend = Arc::new(MemoryStore::new());
        (backend.clone(), ArtifactStore::new(backend))
    }

    #[tokio::test]
    async fn upload_returns_reference_with_bucket() {
        let (backend, store) = store();
        let reference = store
            .upload(Bytes::from_static(b"img"), Bucket::SourceImages, "k1.jpg", MediaType::Jpeg)
            .await
            .unwrap();

        assert_eq!(reference.bucket(), Bucket::SourceImages);
        assert_eq!(reference.key(), "k1.jpg");
        assert_eq!(reference.url(), "memory://source-images/k1.jpg");
        assert_eq!(backend.content_type("source-images", "k1.jpg").as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn duplicate_key_is_an_upload_failure() {
        let (_, store) = store();
        store
            .upload(Bytes::from_static(b"a"), Bucket::EnhancedImages, "dup.png", MediaType::Png)
            .await
            .unwrap();

        let err = store
            .upload(Bytes::from_static(b"b"), Bucket::EnhancedImages, "dup.png", MediaType::Png)
            .await
            .unwrap_err();

        assert_eq!(err.bucket, Bucket::EnhancedImages);
        assert_eq!(err.key, "dup.png");
        assert!(matches!(err.source, StorageError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn upload_image_uses_role_and_format_in_key() {
        let (backend, store) = store();
        let asset = ImageAsset::new(vec![7u8; 32], ImageFormat::Png, ViewRole::EnhancedBack);

        let reference = store.upload_image(&asset, Bucket::EnhancedImages).await.unwrap();

        assert!(reference.key().ends_with("-enhanced-back.png"));
        assert_eq!(backend.object("enhanced-images", reference.key()).map(|b| b.len()), Some(32));
    }

    #[tokio::test]
    async fn video_goes_to_video_bucket() {
        let (_, store) = store();
        let reference = store.upload_video(&VideoAsset::new(vec![0u8; 8])).await.unwrap();

        assert_eq!(reference.bucket(), Bucket::GeneratedVideos);
        assert!(reference.key().ends_with("-video.mp4"));
    }

    #[tokio::test]
    async fn delete_reports_outcome_without_failing() {
        let (backend, store) = store();
        let reference = store
            .upload(Bytes::from_static(b"x"), Bucket::GeneratedAngles, "left.png", MediaType::Png)
            .await
            .unwrap();

        assert!(store.delete(&reference).await);
        assert!(backend.is_empty());
        assert!(!store.delete(&reference).await);
    }

    #[tokio::test]
    async fn bucket_overrides_are_honoured() {
        let backend = Arc::new(MemoryStore::new());
        let names = BucketNames {
            source_images: "originals".to_string(),
            ..BucketNames::default()
        };
        let store = ArtifactStore::with_bucket_names(backend.clone(), names);

        let reference = store
            .upload(Bytes::from_static(b"x"), Bucket::SourceImages, "f.jpg", MediaType::Jpeg)
            .await
            .unwrap();

        assert_eq!(reference.url(), "memory://originals/f.jpg");
        assert!(backend.object("originals", "f.jpg").is_some());
        assert!(store.delete(&reference).await);
    }
}
