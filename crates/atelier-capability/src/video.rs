//! Video synthesis step

use crate::error::CapabilityError;
use crate::traits::{VideoSynthesizer, ViewSet};
use atelier_artifact::VideoAsset;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct VideoStep {
    synthesizer: Arc<dyn VideoSynthesizer>,
    timeout: Duration,
}

impl VideoStep {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    #[inline]
    #[must_use]
    pub fn new(synthesizer: Arc<dyn VideoSynthesizer>) -> Self {
        Self {
            synthesizer,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Generate a video from the four views
    ///
    /// # Errors
    /// Propagates any capability failure; an empty buffer is `Malformed`.
    pub async fn run(&self, views: &ViewSet) -> Result<VideoAsset, CapabilityError> {
        let data = tokio::time::timeout(self.timeout, self.synthesizer.synthesize_video(views))
            .await
            .map_err(|_| CapabilityError::Timeout(self.timeout))??;

        if data.is_empty() {
            return Err(CapabilityError::Malformed("video buffer is empty".to_string()));
        }
        tracing::debug!(size = data.len(), "Video synthesized");
        Ok(VideoAsset::new(data))
    }
}

impl fmt::Debug for VideoStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoStep")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atelier_artifact::{ImageAsset, ImageFormat, ViewRole};
    use bytes::Bytes;

    struct Echo;

    #[async_trait]
    impl VideoSynthesizer for Echo {
        async fn synthesize_video(&self, views: &ViewSet) -> Result<Bytes, CapabilityError> {
            let mut out = Vec::new();
            for (label, asset) in views.labelled() {
                out.extend_from_slice(label.as_bytes());
                out.extend_from_slice(asset.data());
            }
            Ok(out.into())
        }
    }

    struct Slow;

    #[async_trait]
    impl VideoSynthesizer for Slow {
        async fn synthesize_video(&self, _views: &ViewSet) -> Result<Bytes, CapabilityError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Bytes::from_static(b"late"))
        }
    }

    fn view_set() -> ViewSet {
        let asset = |b: &'static [u8], role| ImageAsset::new(Bytes::from_static(b), ImageFormat::Png, role);
        ViewSet {
            front: asset(b"F", ViewRole::EnhancedFront),
            back: asset(b"B", ViewRole::EnhancedBack),
            left: asset(b"L", ViewRole::Left),
            right: asset(b"R", ViewRole::Right),
        }
    }

    #[tokio::test]
    async fn passes_all_four_views_in_order() {
        let video = VideoStep::new(Arc::new(Echo)).run(&view_set()).await.unwrap();
        assert_eq!(video.data().as_ref(), b"frontFbackBleftLrightR");
    }

    #[tokio::test]
    async fn timeout_is_a_hard_failure() {
        let step = VideoStep::new(Arc::new(Slow)).with_timeout(Duration::from_millis(20));
        let err = step.run(&view_set()).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Timeout(_)));
    }
}
