//! State of one pipeline run

use crate::phase::{validate_transition, Phase, PhaseError};
use crate::types::RunId;
use atelier_artifact::ArtifactReference;
use std::time::Instant;

/// Run-scoped state: current phase and every artifact written so far
///
/// Owned by the task executing the run; never shared between runs.
#[derive(Debug)]
pub struct PipelineRun {
    id: RunId,
    phase: Phase,
    uploaded: Vec<ArtifactReference>,
    started: Instant,
}

impl PipelineRun {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: RunId::new(),
            phase: Phase::Validating,
            uploaded: Vec::new(),
            started: Instant::now(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> RunId {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Artifacts written by this run, in upload order
    #[inline]
    #[must_use]
    pub fn uploaded(&self) -> &[ArtifactReference] {
        &self.uploaded
    }

    /// Remember a successful upload for rollback
    pub fn record(&mut self, reference: ArtifactReference) {
        self.uploaded.push(reference);
    }

    /// Move to `next`
    ///
    /// # Errors
    /// Returns `PhaseError::IllegalTransition` if `next` is not reachable
    /// from the current phase.
    pub fn enter(&mut self, next: Phase) -> Result<(), PhaseError> {
        validate_transition(self.phase, next)?;
        tracing::debug!(run_id = %self.id, from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
