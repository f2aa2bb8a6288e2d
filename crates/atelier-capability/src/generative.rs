//! Generative image API enhancer
//!
//! Calls a `generateContent`-style endpoint with the instruction as a text
//! part and the image as an inline base64 part, then takes the first
//! response part that carries inline image data.

use crate::error::CapabilityError;
use crate::traits::{GeneratedImage, ImageEnhancer};
use async_trait::async_trait;
use atelier_artifact::{ImageAsset, ImageFormat};
use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Connection settings for [`GenerativeImageEnhancer`]
#[derive(Debug, Clone)]
pub struct GenerativeImageConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

impl GenerativeImageConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_MODEL: &'static str = "gemini-2.5-flash-image";

    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerativeImageEnhancer {
    config: GenerativeImageConfig,
    client: Client,
}

impl GenerativeImageEnhancer {
    /// # Errors
    /// Returns `CapabilityError::NotConfigured` for an empty API key, or
    /// `Transport` if the HTTP client cannot be built.
    pub fn new(config: GenerativeImageConfig) -> Result<Self, CapabilityError> {
        if config.api_key.trim().is_empty() {
            return Err(CapabilityError::NotConfigured("image enhancement"));
        }
        let client = Client::builder().build()?;
        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: [&'static str; 2],
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl InlineData {
    /// Non-empty payload with an `image/*` MIME type
    fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/") && !self.data.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

/// First image-bearing part across all candidates
fn first_image(response: GenerateResponse) -> Result<GeneratedImage, CapabilityError> {
    let inline = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.inline_data)
        .find(InlineData::is_image)
        .ok_or(CapabilityError::NoImage)?;

    let data = BASE64_STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|e| CapabilityError::Malformed(format!("inline image is not base64: {e}")))?;

    Ok(GeneratedImage::new(data, ImageFormat::from_mime(&inline.mime_type)))
}

#[async_trait]
impl ImageEnhancer for GenerativeImageEnhancer {
    async fn enhance(
        &self,
        image: &ImageAsset,
        instruction: &str,
    ) -> Result<GeneratedImage, CapabilityError> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [
                    RequestPart::Text { text: instruction },
                    RequestPart::Inline {
                        inline_data: InlineData {
                            mime_type: image.format().mime().to_string(),
                            data: BASE64_STANDARD.encode(image.data()),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["TEXT", "IMAGE"],
            },
        };

        tracing::debug!(model = %self.config.model, role = %image.role(), size = image.len(), "Requesting enhancement");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::provider(status.as_u16(), body));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::Malformed(e.to_string()))?;
        first_image(body)
    }
}
