//! Atelier Core - Pipeline Orchestrator
//!
//! Runs one front/back garment photo pair through the fixed pipeline:
//!
//! 1. Validate both images
//! 2. Upload originals
//! 3. Enhance each image (fail-open) and upload the results
//! 4. Synthesize left/right views and upload them
//! 5. Synthesize a video and upload it
//!
//! Progress is reported over a per-run [`ProgressStream`]; every run ends
//! with exactly one terminal event. A failed run deletes whatever it had
//! uploaded, best effort.
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_core::{Pipeline, PipelineRequest, PipelineSteps};
//! use futures::StreamExt;
//!
//! let pipeline = Pipeline::new(store, PipelineSteps::new(enhancer, angles, video));
//! let mut events = pipeline.spawn(PipelineRequest::new(front, back));
//! while let Some(event) = events.next().await {
//!     println!("{}% {}", event.progress, event.message);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod phase;
pub mod pipeline;
pub mod progress;
pub mod run;
pub mod types;

pub use error::{FailureKind, PipelineError, SynthesisStage};
pub use phase::{Milestone, Phase, PhaseError};
pub use pipeline::{Pipeline, PipelineSteps, RollbackReport, RunOutcome};
pub use progress::{
    progress_channel, ClosingSink, ProgressEvent, ProgressSink, ProgressStatus, ProgressStream,
};
pub use run::PipelineRun;
pub use types::{
    CostSchedule, ImageUpload, PipelineRequest, PipelineResult, ResultImage, RunId, COST_SCHEDULE,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a pipeline
    pub use crate::{
        ImageUpload, Pipeline, PipelineRequest, PipelineSteps, ProgressEvent, ProgressStatus,
        ProgressStream,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
