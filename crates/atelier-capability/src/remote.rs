//! Remote synthesis adapter
//!
//! Posts named views as base64 JSON to a synthesis service and reads named
//! outputs back:
//!
//! ```text
//! request:  {"views":   {"front": {"mimeType": "image/png", "data": "..."}, ...}}
//! response: {"outputs": {"left":  {"mimeType": "image/png", "data": "..."}, ...}}
//! ```
//!
//! One instance serves one endpoint; construct one for angles and another
//! for video.

use crate::error::CapabilityError;
use crate::traits::{AngleSynthesizer, GeneratedImage, GeneratedViews, VideoSynthesizer, ViewSet};
use async_trait::async_trait;
use atelier_artifact::{ImageAsset, ImageFormat};
use base64::prelude::*;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct RemoteSynthesizer {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodedMedia {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    views: BTreeMap<&'a str, EncodedMedia>,
}

#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    #[serde(default)]
    outputs: HashMap<String, EncodedMedia>,
}

impl SynthesisResponse {
    fn take(&mut self, name: &str) -> Result<(Bytes, String), CapabilityError> {
        let media = self
            .outputs
            .remove(name)
            .ok_or_else(|| CapabilityError::Malformed(format!("missing output `{name}`")))?;
        let data = BASE64_STANDARD
            .decode(media.data.as_bytes())
            .map_err(|e| CapabilityError::Malformed(format!("output `{name}` is not base64: {e}")))?;
        Ok((data.into(), media.mime_type))
    }

    fn take_image(&mut self, name: &str) -> Result<GeneratedImage, CapabilityError> {
        let (data, mime) = self.take(name)?;
        Ok(GeneratedImage::new(data, ImageFormat::from_mime(&mime)))
    }
}

fn encode(asset: &ImageAsset) -> EncodedMedia {
    EncodedMedia {
        mime_type: asset.format().mime().to_string(),
        data: BASE64_STANDARD.encode(asset.data()),
    }
}

impl RemoteSynthesizer {
    /// # Errors
    /// Returns `NotConfigured` for an empty endpoint, or `Transport` if the
    /// HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        capability: &'static str,
    ) -> Result<Self, CapabilityError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(CapabilityError::NotConfigured(capability));
        }
        let client = Client::builder().build()?;
        Ok(Self {
            endpoint: endpoint.trim().to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        })
    }

    async fn call(&self, views: &[(&str, &ImageAsset)]) -> Result<SynthesisResponse, CapabilityError> {
        let request = SynthesisRequest {
            views: views.iter().map(|(label, asset)| (*label, encode(asset))).collect(),
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::provider(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| CapabilityError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl AngleSynthesizer for RemoteSynthesizer {
    async fn synthesize(
        &self,
        front: &ImageAsset,
        back: &ImageAsset,
    ) -> Result<GeneratedViews, CapabilityError> {
        let mut response = self.call(&[("front", front), ("back", back)]).await?;
        Ok(GeneratedViews {
            left: response.take_image("left")?,
            right: response.take_image("right")?,
        })
    }
}

#[async_trait]
impl VideoSynthesizer for RemoteSynthesizer {
    async fn synthesize_video(&self, views: &ViewSet) -> Result<Bytes, CapabilityError> {
        let mut response = self.call(&views.labelled()).await?;
        let (data, mime) = response.take("video")?;
        if !mime.is_empty() && !mime.starts_with("video/") {
            return Err(CapabilityError::Malformed(format!("video output has type {mime}")));
        }
        Ok(data)
    }
}
