//! Stand-in for capabilities with no provider configured
//!
//! Every call fails with [`CapabilityError::NotConfigured`], so a run that
//! reaches it fails loudly and rolls back instead of inventing output.

use crate::error::CapabilityError;
use crate::traits::{
    AngleSynthesizer, GeneratedImage, GeneratedViews, ImageEnhancer, VideoSynthesizer, ViewSet,
};
use async_trait::async_trait;
use atelier_artifact::ImageAsset;
use bytes::Bytes;

#[derive(Debug, Clone, Copy)]
pub struct Unconfigured {
    capability: &'static str,
}

impl Unconfigured {
    #[inline]
    #[must_use]
    pub const fn new(capability: &'static str) -> Self {
        Self { capability }
    }
}

#[async_trait]
impl ImageEnhancer for Unconfigured {
    async fn enhance(
        &self,
        _image: &ImageAsset,
        _instruction: &str,
    ) -> Result<GeneratedImage, CapabilityError> {
        Err(CapabilityError::NotConfigured(self.capability))
    }
}

#[async_trait]
impl AngleSynthesizer for Unconfigured {
    async fn synthesize(
        &self,
        _front: &ImageAsset,
        _back: &ImageAsset,
    ) -> Result<GeneratedViews, CapabilityError> {
        Err(CapabilityError::NotConfigured(self.capability))
    }
}

#[async_trait]
impl VideoSynthesizer for Unconfigured {
    async fn synthesize_video(&self, _views: &ViewSet) -> Result<Bytes, CapabilityError> {
        Err(CapabilityError::NotConfigured(self.capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::EnhancementStep;
    use atelier_artifact::{ImageFormat, ViewRole};
    use std::sync::Arc;

    #[tokio::test]
    async fn unconfigured_enhancer_falls_back() {
        let original = ImageAsset::new(Bytes::from_static(b"x"), ImageFormat::Jpeg, ViewRole::Back);
        let outcome = EnhancementStep::new(Arc::new(Unconfigured::new("image enhancement")))
            .run(original)
            .await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.asset().role(), ViewRole::EnhancedBack);
    }

    #[tokio::test]
    async fn unconfigured_synthesis_fails() {
        let image = ImageAsset::new(Bytes::from_static(b"x"), ImageFormat::Png, ViewRole::EnhancedFront);
        let err = Unconfigured::new("angle synthesis")
            .synthesize(&image, &image)
            .await
            .unwrap_err();
        assert!(matches!(err, CapabilityError::NotConfigured("angle synthesis")));
    }
}
