//! Image and video buffers
//!
//! Assets are immutable once produced. A step that derives a new view
//! builds a new asset rather than mutating the one it was given.

use crate::hash::ContentHash;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Accepted input image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Parse a declared MIME type, ignoring parameters and case
    ///
    /// `image/jpg` is accepted as a common misspelling of `image/jpeg`.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        if essence.eq_ignore_ascii_case("image/jpeg") || essence.eq_ignore_ascii_case("image/jpg") {
            Some(Self::Jpeg)
        } else if essence.eq_ignore_ascii_case("image/png") {
            Some(Self::Png)
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn mime(self) -> &'static str {
        self.media_type().mime()
    }

    #[inline]
    #[must_use]
    pub const fn extension(self) -> &'static str {
        self.media_type().extension()
    }

    /// Widen to the storage content type
    #[inline]
    #[must_use]
    pub const fn media_type(self) -> MediaType {
        match self {
            Self::Jpeg => MediaType::Jpeg,
            Self::Png => MediaType::Png,
        }
    }
}

/// Content types the store is asked to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Jpeg,
    Png,
    Mp4,
}

impl MediaType {
    #[inline]
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Mp4 => "video/mp4",
        }
    }

    #[inline]
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Semantic role of an image within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewRole {
    Front,
    Back,
    EnhancedFront,
    EnhancedBack,
    Left,
    Right,
}

impl ViewRole {
    /// Tag used in storage keys and log lines
    #[inline]
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::EnhancedFront => "enhanced-front",
            Self::EnhancedBack => "enhanced-back",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Role of the enhanced copy of an original view
    #[inline]
    #[must_use]
    pub const fn enhanced(self) -> Option<Self> {
        match self {
            Self::Front => Some(Self::EnhancedFront),
            Self::Back => Some(Self::EnhancedBack),
            _ => None,
        }
    }

    /// Human label handed to capabilities ("front", "back", ...)
    #[inline]
    #[must_use]
    pub const fn view_label(self) -> &'static str {
        match self {
            Self::Front | Self::EnhancedFront => "front",
            Self::Back | Self::EnhancedBack => "back",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for ViewRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An image buffer with its declared format and role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    data: Bytes,
    format: ImageFormat,
    role: ViewRole,
}

impl ImageAsset {
    #[inline]
    #[must_use]
    pub fn new(data: impl Into<Bytes>, format: ImageFormat, role: ViewRole) -> Self {
        Self {
            data: data.into(),
            format,
            role,
        }
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    #[inline]
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    #[inline]
    #[must_use]
    pub const fn role(&self) -> ViewRole {
        self.role
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Blake3 digest of the bytes
    #[inline]
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        ContentHash::compute(&self.data)
    }

    /// Same bytes under a different role
    ///
    /// The buffer is shared, not copied.
    #[inline]
    #[must_use]
    pub fn with_role(self, role: ViewRole) -> Self {
        Self { role, ..self }
    }
}

/// A generated MP4 buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    data: Bytes,
}

impl VideoAsset {
    #[inline]
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    #[inline]
    #[must_use]
    pub const fn media_type(&self) -> MediaType {
        MediaType::Mp4
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        ContentHash::compute(&self.data)
    }
}
