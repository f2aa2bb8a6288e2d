//! Testing utilities for Atelier workspace
//!
//! Storage and capability fakes with failure injection, image fixtures, and
//! helpers for draining a run's progress stream.

#![allow(missing_docs)]

use async_trait::async_trait;
use atelier_artifact::{ImageAsset, ImageFormat};
use atelier_capability::{
    AngleSynthesizer, CapabilityError, GeneratedImage, GeneratedViews, ImageEnhancer,
    VideoSynthesizer, ViewSet,
};
use atelier_core::{ImageUpload, Pipeline, PipelineSteps, ProgressEvent, ProgressStream};
use atelier_store::{ArtifactStore, MemoryStore, StorageBackend, StorageError};
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Memory backend that records calls and can be told to fail
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: MemoryStore,
    fail_put_at: Option<usize>,
    fail_deletes: bool,
    delete_delay: Option<Duration>,
    puts: AtomicUsize,
    deletes: Mutex<Vec<(String, String)>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `n`th put (1-based)
    pub fn failing_put(n: usize) -> Self {
        Self {
            fail_put_at: Some(n),
            ..Self::default()
        }
    }

    /// Accept puts but refuse every delete
    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    /// Accept every call but take `delay` to finish each delete
    pub fn slow_deletes(delay: Duration) -> Self {
        Self {
            delete_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn objects(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// `(bucket, key)` of every delete call, in order
    pub fn deletes(&self) -> Vec<(String, String)> {
        self.deletes.lock().clone()
    }
}

#[async_trait]
impl StorageBackend for RecordingBackend {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_put_at == Some(n) {
            return Err(StorageError::Rejected {
                status: 503,
                body: "injected put failure".to_string(),
            });
        }
        self.inner.put(bucket, key, data, content_type).await
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.inner.public_url(bucket, key)
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.deletes.lock().push((bucket.to_string(), key.to_string()));
        if let Some(delay) = self.delete_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_deletes {
            return Err(StorageError::Backend("injected delete failure".to_string()));
        }
        self.inner.remove(bucket, key).await
    }
}

/// What a fake capability does when called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Succeed,
    Fail,
    /// Return an empty buffer
    Empty,
}

#[derive(Debug)]
pub struct FakeEnhancer {
    script: Script,
    calls: AtomicUsize,
}

impl FakeEnhancer {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageEnhancer for FakeEnhancer {
    async fn enhance(
        &self,
        image: &ImageAsset,
        _instruction: &str,
    ) -> Result<GeneratedImage, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Succeed => {
                let mut data = b"enhanced:".to_vec();
                data.extend_from_slice(image.data());
                Ok(GeneratedImage::new(data, Some(ImageFormat::Png)))
            }
            Script::Fail => Err(CapabilityError::provider(500, "enhancer down")),
            Script::Empty => Ok(GeneratedImage::new(Bytes::new(), None)),
        }
    }
}

#[derive(Debug)]
pub struct FakeAngles {
    script: Script,
    calls: AtomicUsize,
}

impl FakeAngles {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AngleSynthesizer for FakeAngles {
    async fn synthesize(
        &self,
        _front: &ImageAsset,
        _back: &ImageAsset,
    ) -> Result<GeneratedViews, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Succeed => Ok(GeneratedViews {
                left: GeneratedImage::new(Bytes::from_static(b"left-view"), Some(ImageFormat::Png)),
                right: GeneratedImage::new(Bytes::from_static(b"right-view"), Some(ImageFormat::Png)),
            }),
            Script::Fail => Err(CapabilityError::provider(502, "angle model unavailable")),
            Script::Empty => Ok(GeneratedViews {
                left: GeneratedImage::new(Bytes::new(), None),
                right: GeneratedImage::new(Bytes::new(), None),
            }),
        }
    }
}

#[derive(Debug)]
pub struct FakeVideo {
    script: Script,
    calls: AtomicUsize,
}

impl FakeVideo {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSynthesizer for FakeVideo {
    async fn synthesize_video(&self, _views: &ViewSet) -> Result<Bytes, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Succeed => Ok(Bytes::from_static(b"\x00\x00\x00\x18ftypmp42")),
            Script::Fail => Err(CapabilityError::provider(500, "video model unavailable")),
            Script::Empty => Ok(Bytes::new()),
        }
    }
}

/// Pipeline over `backend` with the given fakes
pub fn pipeline_with(
    backend: Arc<RecordingBackend>,
    enhancer: Arc<dyn ImageEnhancer>,
    angles: Arc<dyn AngleSynthesizer>,
    video: Arc<dyn VideoSynthesizer>,
) -> Pipeline {
    Pipeline::new(ArtifactStore::new(backend), PipelineSteps::new(enhancer, angles, video))
}

/// Pipeline over `backend` where every capability succeeds
pub fn happy_pipeline(backend: Arc<RecordingBackend>) -> Pipeline {
    pipeline_with(
        backend,
        FakeEnhancer::new(Script::Succeed),
        FakeAngles::new(Script::Succeed),
        FakeVideo::new(Script::Succeed),
    )
}

/// JPEG upload of `size` bytes starting with the SOI marker
pub fn jpeg_upload(size: usize) -> ImageUpload {
    let mut data = vec![0xFF, 0xD8, 0xFF];
    data.resize(size.max(3), 0xAB);
    ImageUpload::new(data, "image/jpeg")
}

/// PNG upload of `size` bytes starting with the PNG signature
pub fn png_upload(size: usize) -> ImageUpload {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.resize(size.max(8), 0xCD);
    ImageUpload::new(data, "image/png")
}

/// Drain a progress stream until it closes
pub async fn collect_events(stream: ProgressStream) -> Vec<ProgressEvent> {
    stream.collect().await
}
