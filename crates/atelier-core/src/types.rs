//! Request, result and cost types for pipeline runs

use crate::error::PipelineError;
use atelier_artifact::{ArtifactReference, ImageAsset, ImageFormat, ViewRole};
use bytes::Bytes;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub Ulid);

impl RunId {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A submitted image before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub data: Bytes,
    /// Declared MIME type, as sent by the client
    pub content_type: String,
}

impl ImageUpload {
    #[inline]
    #[must_use]
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }
}

/// Input to one run; either image may be missing until validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineRequest {
    pub front: Option<ImageUpload>,
    pub back: Option<ImageUpload>,
}

impl PipelineRequest {
    #[inline]
    #[must_use]
    pub fn new(front: ImageUpload, back: ImageUpload) -> Self {
        Self {
            front: Some(front),
            back: Some(back),
        }
    }

    /// Turn the uploads into tagged assets
    ///
    /// # Errors
    /// Returns `PipelineError::Validation` if either image is missing,
    /// empty, or not JPEG/PNG.
    pub fn validate(self) -> Result<(ImageAsset, ImageAsset), PipelineError> {
        let (Some(front), Some(back)) = (self.front, self.back) else {
            return Err(PipelineError::Validation(
                "Both front and back images are required".to_string(),
            ));
        };
        Ok((
            into_asset(front, ViewRole::Front)?,
            into_asset(back, ViewRole::Back)?,
        ))
    }
}

fn into_asset(upload: ImageUpload, role: ViewRole) -> Result<ImageAsset, PipelineError> {
    let format = ImageFormat::from_mime(&upload.content_type).ok_or_else(|| {
        PipelineError::Validation(format!(
            "Unsupported {role} image type `{}`; only JPEG and PNG are allowed",
            upload.content_type
        ))
    })?;
    if upload.data.is_empty() {
        return Err(PipelineError::Validation(format!("The {role} image is empty")));
    }
    Ok(ImageAsset::new(upload.data, format, role))
}

/// Fixed per-run cost estimate, in cents
///
/// A display estimate only. Nothing here is derived from actual provider
/// usage or billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostSchedule {
    pub enhancement_cents: u32,
    pub angle_synthesis_cents: u32,
    pub video_synthesis_cents: u32,
}

/// The schedule attached to every successful run
pub const COST_SCHEDULE: CostSchedule = CostSchedule {
    enhancement_cents: 8,
    angle_synthesis_cents: 14,
    video_synthesis_cents: 125,
};

impl CostSchedule {
    #[inline]
    #[must_use]
    pub const fn total_cents(&self) -> u32 {
        self.enhancement_cents + self.angle_synthesis_cents + self.video_synthesis_cents
    }

    /// Total in dollars
    #[inline]
    #[must_use]
    pub fn total(&self) -> f64 {
        dollars(self.total_cents())
    }
}

fn dollars(cents: u32) -> f64 {
    f64::from(cents) / 100.0
}

impl Serialize for CostSchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CostSchedule", 4)?;
        state.serialize_field("enhancement", &dollars(self.enhancement_cents))?;
        state.serialize_field("angleSynthesis", &dollars(self.angle_synthesis_cents))?;
        state.serialize_field("videoSynthesis", &dollars(self.video_synthesis_cents))?;
        state.serialize_field("total", &self.total())?;
        state.end()
    }
}

fn as_url<S: Serializer>(reference: &ArtifactReference, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(reference.url())
}

/// One generated image in the result payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultImage {
    pub role: ViewRole,
    #[serde(rename = "url", serialize_with = "as_url")]
    pub reference: ArtifactReference,
}

/// Payload of the terminal success event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    #[serde(rename = "videoUrl", serialize_with = "as_url")]
    pub video: ArtifactReference,
    /// Enhanced front, enhanced back, left, right
    pub images: Vec<ResultImage>,
    pub costs: CostSchedule,
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_artifact::Bucket;

    fn upload(content_type: &str) -> ImageUpload {
        ImageUpload::new(Bytes::from_static(b"pixels"), content_type)
    }

    #[test]
    fn missing_image_fails_validation() {
        let request = PipelineRequest {
            front: Some(upload("image/jpeg")),
            back: None,
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "Both front and back images are required");
    }

    #[test]
    fn disallowed_type_fails_validation() {
        let err = PipelineRequest::new(upload("image/jpeg"), upload("image/gif"))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("back image type `image/gif`"));
    }

    #[test]
    fn empty_image_fails_validation() {
        let request = PipelineRequest::new(ImageUpload::new(Bytes::new(), "image/png"), upload("image/png"));
        let err = request.validate().unwrap_err();
        assert_eq!(err.to_string(), "The front image is empty");
    }

    #[test]
    fn valid_pair_is_tagged() {
        let (front, back) = PipelineRequest::new(upload("image/jpeg"), upload("image/png"))
            .validate()
            .unwrap();
        assert_eq!(front.role(), ViewRole::Front);
        assert_eq!(front.format(), ImageFormat::Jpeg);
        assert_eq!(back.role(), ViewRole::Back);
        assert_eq!(back.format(), ImageFormat::Png);
    }

    #[test]
    fn cost_schedule_totals() {
        assert_eq!(COST_SCHEDULE.total_cents(), 147);
        assert!((COST_SCHEDULE.total() - 1.47).abs() < f64::EPSILON);

        let json = serde_json::to_value(COST_SCHEDULE).unwrap();
        assert_eq!(json["enhancement"], 0.08);
        assert_eq!(json["angleSynthesis"], 0.14);
        assert_eq!(json["videoSynthesis"], 1.25);
        assert_eq!(json["total"], 1.47);
    }

    #[test]
    fn result_serializes_urls() {
        let result = PipelineResult {
            video: ArtifactReference::new(Bucket::GeneratedVideos, "v.mp4", "https://cdn/v.mp4"),
            images: vec![ResultImage {
                role: ViewRole::Left,
                reference: ArtifactReference::new(Bucket::GeneratedAngles, "l.png", "https://cdn/l.png"),
            }],
            costs: COST_SCHEDULE,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["videoUrl"], "https://cdn/v.mp4");
        assert_eq!(json["images"][0]["role"], "left");
        assert_eq!(json["images"][0]["url"], "https://cdn/l.png");
        assert_eq!(json["costs"]["total"], 1.47);
    }
}
