//! Enhancement step
//!
//! Enhancement is an optional quality improvement. Any failure, timeout or
//! empty answer yields the original bytes as [`Enhancement::Fallback`];
//! this step never returns an error.

use crate::error::CapabilityError;
use crate::traits::ImageEnhancer;
use atelier_artifact::ImageAsset;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Fixed transformation instruction sent with every image
pub const ENHANCEMENT_INSTRUCTION: &str = "Transform this clothing photograph into a \
professional e-commerce product image. Keep the garment exactly as it is: same cut, \
colours, fabric texture, prints, logos and details. Remove wrinkles and stray creases, \
even out the lighting, place the garment on a clean pure white background, and centre it \
in a straight, symmetrical presentation. Do not add people, mannequins, props or text.";

/// Outcome of enhancing one image
///
/// Both variants carry a usable asset tagged with the enhanced role; the
/// variant records which policy branch produced it.
#[derive(Debug, Clone)]
pub enum Enhancement {
    /// Provider returned an image
    Enhanced(ImageAsset),
    /// Original bytes kept because enhancement failed
    Fallback { asset: ImageAsset, reason: String },
}

impl Enhancement {
    #[inline]
    #[must_use]
    pub fn asset(&self) -> &ImageAsset {
        match self {
            Self::Enhanced(asset) | Self::Fallback { asset, .. } => asset,
        }
    }

    #[inline]
    #[must_use]
    pub fn into_asset(self) -> ImageAsset {
        match self {
            Self::Enhanced(asset) | Self::Fallback { asset, .. } => asset,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Fail-open wrapper around an [`ImageEnhancer`]
#[derive(Clone)]
pub struct EnhancementStep {
    enhancer: Arc<dyn ImageEnhancer>,
    timeout: Duration,
}

impl EnhancementStep {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    #[inline]
    #[must_use]
    pub fn new(enhancer: Arc<dyn ImageEnhancer>) -> Self {
        Self {
            enhancer,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enhance `original`, falling back to its bytes on any failure
    ///
    /// The result is tagged with the enhanced counterpart of the
    /// original's role (`front` becomes `enhanced-front`).
    pub async fn run(&self, original: ImageAsset) -> Enhancement {
        let role = original.role().enhanced().unwrap_or(original.role());

        match self.call(&original).await {
            Ok(image) => {
                let format = image.format.unwrap_or(original.format());
                tracing::debug!(
                    role = %role,
                    original_size = original.len(),
                    enhanced_size = image.data.len(),
                    "Image enhanced"
                );
                Enhancement::Enhanced(ImageAsset::new(image.data, format, role))
            }
            Err(e) => {
                metrics::counter!("atelier_enhancement_fallbacks_total").increment(1);
                tracing::warn!(
                    role = %original.role(),
                    digest = %original.digest().short(),
                    error = %e,
                    "Enhancement failed, using original image"
                );
                Enhancement::Fallback {
                    asset: original.with_role(role),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn call(&self, original: &ImageAsset) -> Result<crate::GeneratedImage, CapabilityError> {
        let instruction = format!(
            "{ENHANCEMENT_INSTRUCTION} This is the {} view of the garment.",
            original.role().view_label()
        );

        let image = tokio::time::timeout(self.timeout, self.enhancer.enhance(original, &instruction))
            .await
            .map_err(|_| CapabilityError::Timeout(self.timeout))??;

        if image.data.is_empty() {
            return Err(CapabilityError::NoImage);
        }
        Ok(image)
    }
}

impl fmt::Debug for EnhancementStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancementStep")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockImageEnhancer;
    use crate::GeneratedImage;
    use async_trait::async_trait;
    use atelier_artifact::{ImageFormat, ViewRole};
    use bytes::Bytes;

    fn front() -> ImageAsset {
        ImageAsset::new(Bytes::from_static(b"raw-front"), ImageFormat::Jpeg, ViewRole::Front)
    }

    #[tokio::test]
    async fn enhanced_image_takes_enhanced_role() {
        let mut mock = MockImageEnhancer::new();
        mock.expect_enhance()
            .withf(|image, instruction| {
                image.role() == ViewRole::Front && instruction.ends_with("front view of the garment.")
            })
            .times(1)
            .returning(|_, _| Ok(GeneratedImage::new(Bytes::from_static(b"clean"), Some(ImageFormat::Png))));

        let outcome = EnhancementStep::new(Arc::new(mock)).run(front()).await;

        assert!(!outcome.is_fallback());
        let asset = outcome.into_asset();
        assert_eq!(asset.role(), ViewRole::EnhancedFront);
        assert_eq!(asset.format(), ImageFormat::Png);
        assert_eq!(asset.data().as_ref(), b"clean");
    }

    #[tokio::test]
    async fn undeclared_format_keeps_original_format() {
        let mut mock = MockImageEnhancer::new();
        mock.expect_enhance()
            .returning(|_, _| Ok(GeneratedImage::new(Bytes::from_static(b"clean"), None)));

        let asset = EnhancementStep::new(Arc::new(mock)).run(front()).await.into_asset();

        assert_eq!(asset.format(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn provider_error_falls_back_to_original() {
        let mut mock = MockImageEnhancer::new();
        mock.expect_enhance()
            .returning(|_, _| Err(CapabilityError::provider(503, "overloaded")));

        let outcome = EnhancementStep::new(Arc::new(mock)).run(front()).await;

        assert!(outcome.is_fallback());
        let asset = outcome.into_asset();
        assert_eq!(asset.role(), ViewRole::EnhancedFront);
        assert_eq!(asset.data().as_ref(), b"raw-front");
    }

    #[tokio::test]
    async fn empty_image_falls_back() {
        let mut mock = MockImageEnhancer::new();
        mock.expect_enhance()
            .returning(|_, _| Ok(GeneratedImage::new(Bytes::new(), Some(ImageFormat::Png))));

        let outcome = EnhancementStep::new(Arc::new(mock)).run(front()).await;

        match outcome {
            Enhancement::Fallback { asset, reason } => {
                assert_eq!(asset.format(), ImageFormat::Jpeg);
                assert!(reason.contains("no image"));
            }
            Enhancement::Enhanced(_) => panic!("expected fallback"),
        }
    }

    struct Stalled;

    #[async_trait]
    impl ImageEnhancer for Stalled {
        async fn enhance(
            &self,
            _image: &ImageAsset,
            _instruction: &str,
        ) -> Result<GeneratedImage, CapabilityError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(CapabilityError::NoImage)
        }
    }

    #[tokio::test]
    async fn timeout_falls_back() {
        let step = EnhancementStep::new(Arc::new(Stalled)).with_timeout(Duration::from_millis(20));

        let outcome = step.run(front()).await;

        match outcome {
            Enhancement::Fallback { reason, .. } => assert!(reason.contains("timed out")),
            Enhancement::Enhanced(_) => panic!("expected fallback"),
        }
    }
}
