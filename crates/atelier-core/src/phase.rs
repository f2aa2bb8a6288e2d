//! Run phases and their transitions
//!
//! ```text
//! Validating -> UploadingOriginals -> Enhancing -> SynthesizingAngles
//!            -> SynthesizingVideo -> Finalizing -> Succeeded
//! any non-terminal phase -> Failed
//! ```

use std::fmt;

/// Phase of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Validating,
    UploadingOriginals,
    Enhancing,
    SynthesizingAngles,
    SynthesizingVideo,
    Finalizing,
    Succeeded,
    Failed,
}

/// Progress reported on entering a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub step: u8,
    pub percent: u8,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    #[error("illegal phase transition {from} -> {to}")]
    IllegalTransition { from: Phase, to: Phase },
}

impl Phase {
    /// Fixed progress table; phases without a milestone emit nothing
    #[must_use]
    pub const fn milestone(self) -> Option<Milestone> {
        let (step, percent, message) = match self {
            Self::UploadingOriginals => (1, 10, "Uploading original images"),
            Self::Enhancing => (2, 25, "Enhancing images"),
            Self::SynthesizingAngles => (3, 50, "Generating side angles"),
            Self::SynthesizingVideo => (4, 80, "Generating video"),
            Self::Succeeded => (5, 100, "Generation complete"),
            Self::Validating | Self::Finalizing | Self::Failed => return None,
        };
        Some(Milestone {
            step,
            percent,
            message,
        })
    }

    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: Phase) -> Vec<Phase> {
    use Phase::*;
    match from {
        Validating => vec![UploadingOriginals, Failed],
        UploadingOriginals => vec![Enhancing, Failed],
        Enhancing => vec![SynthesizingAngles, Failed],
        SynthesizingAngles => vec![SynthesizingVideo, Failed],
        SynthesizingVideo => vec![Finalizing, Failed],
        Finalizing => vec![Succeeded, Failed],
        Succeeded | Failed => vec![],
    }
}

/// Check a transition against the phase graph
///
/// # Errors
/// Returns `PhaseError::IllegalTransition` for any edge not in the graph.
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), PhaseError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PhaseError::IllegalTransition { from, to })
    }
}
