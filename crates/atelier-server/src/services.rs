//! Build the pipeline and its collaborators from configuration

use crate::config::ServiceConfig;
use atelier_capability::{
    AngleSynthesizer, CapabilityError, GenerativeImageConfig, GenerativeImageEnhancer,
    ImageEnhancer, RemoteSynthesizer, Unconfigured, VideoSynthesizer,
};
use atelier_core::{Pipeline, PipelineSteps};
use atelier_store::{ArtifactStore, RestObjectStore, StorageError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("storage backend: {0}")]
    Storage(#[from] StorageError),

    #[error("capability client: {0}")]
    Capability(#[from] CapabilityError),
}

/// Wire the REST store and the configured providers into a pipeline
///
/// Providers without configuration are replaced by [`Unconfigured`]
/// stand-ins and reported at `warn`.
///
/// # Errors
/// Returns `StartupError` if the storage backend or an HTTP client cannot
/// be constructed.
pub fn build_pipeline(config: &ServiceConfig) -> Result<Pipeline, StartupError> {
    let backend = RestObjectStore::new(&config.storage.endpoint, &config.storage.service_key)?;
    let store = ArtifactStore::with_bucket_names(Arc::new(backend), config.storage.buckets.clone());

    let caps = &config.capabilities;

    let enhancer: Arc<dyn ImageEnhancer> = if caps.enhancer_api_key.trim().is_empty() {
        tracing::warn!("No enhancer API key configured; images will be used unenhanced");
        Arc::new(Unconfigured::new("image enhancement"))
    } else {
        let enhancer = GenerativeImageEnhancer::new(GenerativeImageConfig {
            endpoint: caps.enhancer_endpoint.clone(),
            model: caps.enhancer_model.clone(),
            api_key: caps.enhancer_api_key.clone(),
        })?;
        tracing::info!(model = %caps.enhancer_model, "Image enhancement enabled");
        Arc::new(enhancer)
    };

    let api_key = Some(caps.capability_api_key.clone());

    let angles: Arc<dyn AngleSynthesizer> = if caps.angle_endpoint.trim().is_empty() {
        tracing::warn!("No angle synthesis endpoint configured; runs will fail at side-angle synthesis");
        Arc::new(Unconfigured::new("side-angle synthesis"))
    } else {
        Arc::new(RemoteSynthesizer::new(
            &caps.angle_endpoint,
            api_key.clone(),
            "side-angle synthesis",
        )?)
    };

    let video: Arc<dyn VideoSynthesizer> = if caps.video_endpoint.trim().is_empty() {
        tracing::warn!("No video synthesis endpoint configured; runs will fail at video synthesis");
        Arc::new(Unconfigured::new("video synthesis"))
    } else {
        Arc::new(RemoteSynthesizer::new(&caps.video_endpoint, api_key, "video synthesis")?)
    };

    let steps = PipelineSteps::new(enhancer, angles, video)
        .with_timeouts(caps.enhancement_timeout(), caps.synthesis_timeout());

    Ok(Pipeline::new(store, steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServiceConfig {
        let mut config = ServiceConfig::new();
        config.storage.endpoint = "https://storage.example.co".into();
        config.storage.service_key = "service-key".into();
        config
    }

    #[test]
    fn builds_with_only_storage_configured() {
        assert!(build_pipeline(&config()).is_ok());
    }

    #[test]
    fn builds_with_all_providers() {
        let mut config = config();
        config.capabilities.enhancer_api_key = "g-key".into();
        config.capabilities.angle_endpoint = "https://synth.example.com/angles".into();
        config.capabilities.video_endpoint = "https://synth.example.com/video".into();
        assert!(build_pipeline(&config).is_ok());
    }

    #[test]
    fn missing_storage_fails() {
        let err = build_pipeline(&ServiceConfig::new()).unwrap_err();
        assert!(matches!(err, StartupError::Storage(_)));
    }
}
