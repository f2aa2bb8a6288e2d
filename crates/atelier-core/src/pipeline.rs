//! Pipeline orchestrator
//!
//! Drives one run through its phases, emitting a progress event on entry to
//! each phase before doing that phase's work. Any failure ends the run with
//! a single error event, then every artifact the run uploaded is deleted
//! best effort, and only then does the progress stream end.

use crate::error::{PipelineError, SynthesisStage};
use crate::phase::Phase;
use crate::progress::{progress_channel, ProgressSink, ProgressStream};
use crate::run::PipelineRun;
use crate::types::{PipelineRequest, PipelineResult, ResultImage, COST_SCHEDULE};
use atelier_artifact::{ArtifactReference, Bucket, ImageAsset};
use atelier_capability::{
    AngleStep, AngleSynthesizer, EnhancementStep, ImageEnhancer, VideoStep, VideoSynthesizer,
    ViewSet,
};
use atelier_store::ArtifactStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Move to `phase` and report its milestone before any of its work starts
fn enter(run: &mut PipelineRun, sink: &mut ProgressSink, phase: Phase) -> Result<(), PipelineError> {
    run.enter(phase)?;
    if let Some(milestone) = phase.milestone() {
        tracing::info!(step = milestone.step, progress = milestone.percent, "{}", milestone.message);
        sink.emit(milestone);
    }
    Ok(())
}

/// The three capability steps a run calls, with their timeouts
#[derive(Debug, Clone)]
pub struct PipelineSteps {
    pub enhancement: EnhancementStep,
    pub angles: AngleStep,
    pub video: VideoStep,
}

impl PipelineSteps {
    #[must_use]
    pub fn new(
        enhancer: Arc<dyn ImageEnhancer>,
        angles: Arc<dyn AngleSynthesizer>,
        video: Arc<dyn VideoSynthesizer>,
    ) -> Self {
        Self {
            enhancement: EnhancementStep::new(enhancer),
            angles: AngleStep::new(angles),
            video: VideoStep::new(video),
        }
    }

    /// Override the enhancement and synthesis timeouts
    #[must_use]
    pub fn with_timeouts(mut self, enhancement: Duration, synthesis: Duration) -> Self {
        self.enhancement = self.enhancement.with_timeout(enhancement);
        self.angles = self.angles.with_timeout(synthesis);
        self.video = self.video.with_timeout(synthesis);
        self
    }
}

/// Result of rolling back a failed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackReport {
    /// Deletes issued
    pub attempted: usize,
    /// Deletes the backend refused
    pub failed: usize,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    Succeeded(PipelineResult),
    Failed {
        error: PipelineError,
        rollback: RollbackReport,
    },
}

impl RunOutcome {
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Stateless orchestrator shared by all runs
///
/// Every run gets its own [`PipelineRun`] and progress channel; the only
/// things shared between runs are the store and the capability clients.
#[derive(Debug, Clone)]
pub struct Pipeline {
    store: ArtifactStore,
    steps: PipelineSteps,
}

impl Pipeline {
    #[inline]
    #[must_use]
    pub fn new(store: ArtifactStore, steps: PipelineSteps) -> Self {
        Self { store, steps }
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Start a run on its own task and return its progress stream
    ///
    /// Dropping the stream does not cancel the run: in-flight calls finish
    /// and rollback still happens on failure.
    #[must_use]
    pub fn spawn(&self, request: PipelineRequest) -> ProgressStream {
        let (sink, stream) = progress_channel();
        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.run(request, sink).await;
        });
        stream
    }

    /// Execute one run to completion, reporting through `sink`
    pub async fn run(&self, request: PipelineRequest, sink: ProgressSink) -> RunOutcome {
        let mut run = PipelineRun::new();
        let span = tracing::info_span!("pipeline_run", run_id = %run.id());
        self.run_inner(&mut run, request, sink).instrument(span).await
    }

    async fn run_inner(
        &self,
        run: &mut PipelineRun,
        request: PipelineRequest,
        mut sink: ProgressSink,
    ) -> RunOutcome {
        tracing::info!("Pipeline run started");

        match self.execute(run, request, &mut sink).await {
            Ok(result) => match run.enter(Phase::Succeeded) {
                Ok(()) => {
                    if let Some(milestone) = Phase::Succeeded.milestone() {
                        sink.complete(milestone, result.clone());
                    }
                    metrics::counter!("atelier_runs_total", "outcome" => "success").increment(1);
                    tracing::info!(
                        elapsed_ms = run.elapsed_ms(),
                        artifacts = run.uploaded().len(),
                        "Pipeline run succeeded"
                    );
                    RunOutcome::Succeeded(result)
                }
                Err(e) => self.fail(run, sink, e.into()).await,
            },
            Err(error) => self.fail(run, sink, error).await,
        }
    }

    async fn fail(&self, run: &mut PipelineRun, sink: ProgressSink, error: PipelineError) -> RunOutcome {
        let failed_in = run.phase();
        if let Err(e) = run.enter(Phase::Failed) {
            tracing::error!(error = %e, "Run could not enter failed phase");
        }

        let kind = error.kind();
        metrics::counter!("atelier_runs_total", "outcome" => kind.as_str()).increment(1);
        tracing::error!(
            phase = %failed_in,
            kind = kind.as_str(),
            error = %error,
            elapsed_ms = run.elapsed_ms(),
            "Pipeline run failed"
        );

        let closing = sink.fail(error.to_string());

        let rollback = if error.requires_rollback() {
            self.rollback(run.uploaded()).await
        } else {
            RollbackReport::default()
        };
        closing.close();

        RunOutcome::Failed { error, rollback }
    }

    async fn execute(
        &self,
        run: &mut PipelineRun,
        request: PipelineRequest,
        sink: &mut ProgressSink,
    ) -> Result<PipelineResult, PipelineError> {
        let (front, back) = request.validate()?;

        enter(run, sink, Phase::UploadingOriginals)?;
        self.upload_image(run, &front, Bucket::SourceImages).await?;
        self.upload_image(run, &back, Bucket::SourceImages).await?;

        enter(run, sink, Phase::Enhancing)?;
        let enhanced_front = self.steps.enhancement.run(front).await.into_asset();
        let enhanced_back = self.steps.enhancement.run(back).await.into_asset();
        let enhanced_front_ref = self
            .upload_image(run, &enhanced_front, Bucket::EnhancedImages)
            .await?;
        let enhanced_back_ref = self
            .upload_image(run, &enhanced_back, Bucket::EnhancedImages)
            .await?;

        enter(run, sink, Phase::SynthesizingAngles)?;
        let (left, right) = self
            .steps
            .angles
            .run(&enhanced_front, &enhanced_back)
            .await
            .map_err(|e| PipelineError::synthesis(SynthesisStage::Angles, e))?;
        let left_ref = self.upload_image(run, &left, Bucket::GeneratedAngles).await?;
        let right_ref = self.upload_image(run, &right, Bucket::GeneratedAngles).await?;

        enter(run, sink, Phase::SynthesizingVideo)?;
        let views = ViewSet {
            front: enhanced_front,
            back: enhanced_back,
            left,
            right,
        };
        let video = self
            .steps
            .video
            .run(&views)
            .await
            .map_err(|e| PipelineError::synthesis(SynthesisStage::Video, e))?;
        let video_ref = self.store.upload_video(&video).await?;
        run.record(video_ref.clone());

        enter(run, sink, Phase::Finalizing)?;
        let images = [
            (&views.front, enhanced_front_ref),
            (&views.back, enhanced_back_ref),
            (&views.left, left_ref),
            (&views.right, right_ref),
        ]
        .into_iter()
        .map(|(asset, reference)| ResultImage {
            role: asset.role(),
            reference,
        })
        .collect();

        Ok(PipelineResult {
            video: video_ref,
            images,
            costs: COST_SCHEDULE,
        })
    }

    async fn upload_image(
        &self,
        run: &mut PipelineRun,
        asset: &ImageAsset,
        bucket: Bucket,
    ) -> Result<ArtifactReference, PipelineError> {
        let reference = self.store.upload_image(asset, bucket).await?;
        run.record(reference.clone());
        Ok(reference)
    }

    /// Delete each reference once; failures are counted, never raised
    pub async fn rollback(&self, uploaded: &[ArtifactReference]) -> RollbackReport {
        let mut report = RollbackReport::default();
        for reference in uploaded {
            report.attempted += 1;
            let deleted = self.store.delete(reference).await;
            let result = if deleted { "deleted" } else { "failed" };
            metrics::counter!("atelier_rollback_deletes_total", "result" => result).increment(1);
            if !deleted {
                report.failed += 1;
            }
        }
        if report.attempted > 0 {
            tracing::info!(
                attempted = report.attempted,
                failed = report.failed,
                "Rollback finished"
            );
        }
        report
    }
}
