//! Multipart intake for `POST /api/generate`

use crate::rejection::ApiError;
use atelier_artifact::ImageFormat;
use atelier_core::{ImageUpload, PipelineRequest};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use warp::multipart::{FormData, Part};

/// Per-image ceiling
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Whole-body ceiling: two images plus multipart framing
pub const MAX_FORM_BYTES: u64 = 2 * MAX_IMAGE_BYTES as u64 + 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Front,
    Back,
}

impl Slot {
    fn from_field(name: &str) -> Option<Self> {
        match name {
            "front" | "frontImage" => Some(Self::Front),
            "back" | "backImage" => Some(Self::Back),
            _ => None,
        }
    }
}

/// Collect the front and back parts into a request
///
/// Unknown parts are skipped. Missing images are left as `None` for the
/// pipeline's own validation to report.
///
/// # Errors
/// Returns `ApiError` for a broken body, a part over [`MAX_IMAGE_BYTES`],
/// or an image part not declared as JPEG or PNG.
pub async fn read_request(form: FormData) -> Result<PipelineRequest, ApiError> {
    let mut request = PipelineRequest::default();
    futures::pin_mut!(form);

    while let Some(part) = form
        .try_next()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        let field = part.name().to_string();
        let Some(slot) = Slot::from_field(&field) else {
            tracing::debug!(field = %field, "Ignoring unknown form field");
            continue;
        };

        let content_type = part.content_type().unwrap_or_default().to_string();
        if ImageFormat::from_mime(&content_type).is_none() {
            return Err(ApiError::UnsupportedImageType { field, content_type });
        }

        let data = read_part(part, &field).await?;
        tracing::debug!(field = %field, size = data.len(), content_type = %content_type, "Received image");

        let upload = ImageUpload::new(data, content_type);
        match slot {
            Slot::Front => request.front = Some(upload),
            Slot::Back => request.back = Some(upload),
        }
    }

    Ok(request)
}

async fn read_part(part: Part, field: &str) -> Result<Bytes, ApiError> {
    let stream = part.stream();
    futures::pin_mut!(stream);

    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ApiError::Multipart(e.to_string()))?;
        if buf.len() + chunk.remaining() > MAX_IMAGE_BYTES {
            return Err(ApiError::ImageTooLarge {
                field: field.to_string(),
                limit_mib: MAX_IMAGE_BYTES / (1024 * 1024),
            });
        }
        buf.put(chunk);
    }
    Ok(buf.freeze())
}
