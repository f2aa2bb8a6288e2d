//! Side-angle synthesis step
//!
//! Unlike enhancement this step does not fail open: without left and right
//! views there is nothing for video synthesis to work from.

use crate::error::CapabilityError;
use crate::traits::{AngleSynthesizer, GeneratedImage};
use atelier_artifact::{ImageAsset, ImageFormat, ViewRole};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AngleStep {
    synthesizer: Arc<dyn AngleSynthesizer>,
    timeout: Duration,
}

impl AngleStep {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    #[inline]
    #[must_use]
    pub fn new(synthesizer: Arc<dyn AngleSynthesizer>) -> Self {
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

    /// Synthesize left and right views from enhanced front and back
    ///
    /// # Errors
    /// Propagates any capability failure; an empty view is `Malformed`.
    pub async fn run(
        &self,
        front: &ImageAsset,
        back: &ImageAsset,
    ) -> Result<(ImageAsset, ImageAsset), CapabilityError> {
        let views = tokio::time::timeout(self.timeout, self.synthesizer.synthesize(front, back))
            .await
            .map_err(|_| CapabilityError::Timeout(self.timeout))??;

        let left = into_view(views.left, ViewRole::Left, front.format())?;
        let right = into_view(views.right, ViewRole::Right, front.format())?;
        tracing::debug!(left_size = left.len(), right_size = right.len(), "Side angles synthesized");

        Ok((left, right))
    }
}

fn into_view(
    image: GeneratedImage,
    role: ViewRole,
    default_format: ImageFormat,
) -> Result<ImageAsset, CapabilityError> {
    if image.data.is_empty() {
        return Err(CapabilityError::Malformed(format!("{role} view is empty")));
    }
    Ok(ImageAsset::new(
        image.data,
        image.format.unwrap_or(default_format),
        role,
    ))
}

impl fmt::Debug for AngleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AngleStep")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
