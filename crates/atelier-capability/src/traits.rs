//! Capability traits
//!
//! Implementations must be safe to call from many runs at once.

use crate::error::CapabilityError;
use async_trait::async_trait;
use atelier_artifact::{ImageAsset, ImageFormat};
use bytes::Bytes;

/// Image returned by a provider
///
/// `format` is what the provider declared, if it declared JPEG or PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data: Bytes,
    pub format: Option<ImageFormat>,
}

impl GeneratedImage {
    #[inline]
    #[must_use]
    pub fn new(data: impl Into<Bytes>, format: Option<ImageFormat>) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }
}

/// Left and right views synthesized from front and back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedViews {
    pub left: GeneratedImage,
    pub right: GeneratedImage,
}

/// The four named views video synthesis consumes
#[derive(Debug, Clone)]
pub struct ViewSet {
    pub front: ImageAsset,
    pub back: ImageAsset,
    pub left: ImageAsset,
    pub right: ImageAsset,
}

impl ViewSet {
    /// Views paired with their labels, in front/back/left/right order
    #[must_use]
    pub fn labelled(&self) -> [(&'static str, &ImageAsset); 4] {
        [
            ("front", &self.front),
            ("back", &self.back),
            ("left", &self.left),
            ("right", &self.right),
        ]
    }
}

/// Image enhancement: image plus instruction in, image out
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageEnhancer: Send + Sync {
    async fn enhance(
        &self,
        image: &ImageAsset,
        instruction: &str,
    ) -> Result<GeneratedImage, CapabilityError>;
}

/// Multi-view synthesis: front and back in, left and right out
#[async_trait]
pub trait AngleSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        front: &ImageAsset,
        back: &ImageAsset,
    ) -> Result<GeneratedViews, CapabilityError>;
}

/// Video synthesis: four named views in, one video buffer out
#[async_trait]
pub trait VideoSynthesizer: Send + Sync {
    async fn synthesize_video(&self, views: &ViewSet) -> Result<Bytes, CapabilityError>;
}
