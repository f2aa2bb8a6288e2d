//! Pipeline failure types

use crate::phase::PhaseError;
use atelier_capability::CapabilityError;
use atelier_store::UploadFailure;
use std::fmt;

/// Synthesis step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisStage {
    Angles,
    Video,
}

impl fmt::Display for SynthesisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Angles => "Side-angle synthesis",
            Self::Video => "Video synthesis",
        })
    }
}

/// Coarse failure classification for logs and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ValidationFailure,
    UploadFailure,
    SynthesisFailure,
    Internal,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailure => "validation",
            Self::UploadFailure => "upload",
            Self::SynthesisFailure => "synthesis",
            Self::Internal => "internal",
        }
    }
}

/// Why a run failed
///
/// The `Display` text is what the client sees in the terminal error event.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to store artifact: {0}")]
    Upload(#[from] UploadFailure),

    #[error("{stage} failed: {source}")]
    Synthesis {
        stage: SynthesisStage,
        #[source]
        source: CapabilityError,
    },

    #[error("Internal pipeline error: {0}")]
    State(#[from] PhaseError),
}

impl PipelineError {
    #[inline]
    #[must_use]
    pub fn synthesis(stage: SynthesisStage, source: CapabilityError) -> Self {
        Self::Synthesis { stage, source }
    }

    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::ValidationFailure,
            Self::Upload(_) => FailureKind::UploadFailure,
            Self::Synthesis { .. } => FailureKind::SynthesisFailure,
            Self::State(_) => FailureKind::Internal,
        }
    }

    /// Validation runs before any write, so only later failures have
    /// artifacts to remove
    #[must_use]
    pub const fn requires_rollback(&self) -> bool {
        !matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;
    use atelier_artifact::Bucket;
    use atelier_store::StorageError;
    use std::time::Duration;

    #[test]
    fn validation_message_is_verbatim() {
        let err = PipelineError::Validation("Both front and back images are required".into());
        assert_eq!(err.to_string(), "Both front and back images are required");
        assert_eq!(err.kind(), FailureKind::ValidationFailure);
        assert!(!err.requires_rollback());
    }

    #[test]
    fn synthesis_message_names_stage() {
        let err = PipelineError::synthesis(
            SynthesisStage::Video,
            CapabilityError::Timeout(Duration::from_secs(300)),
        );
        assert!(err.to_string().starts_with("Video synthesis failed: "));
        assert_eq!(err.kind(), FailureKind::SynthesisFailure);
        assert!(err.requires_rollback());
    }

    #[test]
    fn upload_failure_converts() {
        let failure = UploadFailure {
            bucket: Bucket::SourceImages,
            key: "k.jpg".into(),
            source: StorageError::Backend("disk full".into()),
        };
        let err: PipelineError = failure.into();
        assert_eq!(err.kind(), FailureKind::UploadFailure);
        assert!(err.to_string().contains("source-images/k.jpg"));
    }

    #[test]
    fn state_error_is_internal() {
        let err: PipelineError = PhaseError::IllegalTransition {
            from: Phase::Succeeded,
            to: Phase::Failed,
        }
        .into();
        assert_eq!(err.kind(), FailureKind::Internal);
        assert_eq!(err.kind().as_str(), "internal");
    }
}
