//! Storage backend seam

use async_trait::async_trait;
use atelier_artifact::Bucket;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Errors reported by a storage backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Key already present; backends never overwrite
    #[error("object {bucket}/{key} already exists")]
    AlreadyExists { bucket: String, key: String },

    /// Key not present
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    /// Backend answered with a non-success status
    #[error("backend rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Misconfiguration or other backend-specific failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// Primitives consumed from an object-storage backend
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write `data` under `bucket/key`, failing if the key exists
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Derive the public URL of `bucket/key`; no I/O
    fn public_url(&self, bucket: &str, key: &str) -> String;

    /// Remove `bucket/key`
    async fn remove(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

/// Physical names of the four logical buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketNames {
    pub source_images: String,
    pub enhanced_images: String,
    pub generated_angles: String,
    pub generated_videos: String,
}

impl BucketNames {
    /// Resolve a logical bucket to its configured name
    #[inline]
    #[must_use]
    pub fn name(&self, bucket: Bucket) -> &str {
        match bucket {
            Bucket::SourceImages => &self.source_images,
            Bucket::EnhancedImages => &self.enhanced_images,
            Bucket::GeneratedAngles => &self.generated_angles,
            Bucket::GeneratedVideos => &self.generated_videos,
        }
    }
}

impl Default for BucketNames {
    fn default() -> Self {
        Self {
            source_images: Bucket::SourceImages.default_name().to_string(),
            enhanced_images: Bucket::EnhancedImages.default_name().to_string(),
            generated_angles: Bucket::GeneratedAngles.default_name().to_string(),
            generated_videos: Bucket::GeneratedVideos.default_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_match_logical_buckets() {
        let names = BucketNames::default();
        for bucket in Bucket::ALL {
            assert_eq!(names.name(bucket), bucket.default_name());
        }
    }

    #[test]
    fn overrides_apply_per_bucket() {
        let names = BucketNames {
            generated_videos: "videos-prod".to_string(),
            ..BucketNames::default()
        };
        assert_eq!(names.name(Bucket::GeneratedVideos), "videos-prod");
        assert_eq!(names.name(Bucket::SourceImages), "source-images");
    }
}
