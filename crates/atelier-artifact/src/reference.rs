//! Locators for uploaded artifacts
//!
//! A reference records the bucket it was written to, so rollback never has
//! to guess the bucket from the shape of the URL.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical storage buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    /// Client-submitted originals
    SourceImages,
    /// Enhanced (or fallback) copies of the originals
    EnhancedImages,
    /// Synthesized left/right views
    GeneratedAngles,
    /// Synthesized videos
    GeneratedVideos,
}

impl Bucket {
    pub const ALL: [Self; 4] = [
        Self::SourceImages,
        Self::EnhancedImages,
        Self::GeneratedAngles,
        Self::GeneratedVideos,
    ];

    /// Bucket name used when no override is configured
    #[inline]
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::SourceImages => "source-images",
            Self::EnhancedImages => "enhanced-images",
            Self::GeneratedAngles => "generated-angles",
            Self::GeneratedVideos => "generated-videos",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Resolvable locator of a successfully uploaded artifact
///
/// Only the store produces these, and only after the write succeeded.
/// References are never mutated; rollback consumes them by reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactReference {
    bucket: Bucket,
    key: String,
    url: String,
}

impl ArtifactReference {
    #[inline]
    #[must_use]
    pub fn new(bucket: Bucket, key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            bucket,
            key: key.into(),
            url: url.into(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn bucket(&self) -> Bucket {
        self.bucket
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Public URL handed to the client
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}
