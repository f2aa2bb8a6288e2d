//! Per-run progress channel
//!
//! The pipeline holds a [`ProgressSink`]; the transport reads a
//! [`ProgressStream`]. Terminal events consume the sink, so nothing can be
//! emitted after a run has completed or failed. A failed run keeps the
//! stream open through a [`ClosingSink`] until its cleanup is done.

use crate::phase::Milestone;
use crate::types::PipelineResult;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Processing,
    Complete,
    Error,
}

/// One progress update as sent to the client
///
/// `step` runs 1..=5. A failure before the first milestone reports step 1
/// at 0 %.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub step: u8,
    pub progress: u8,
    pub message: String,
    pub status: ProgressStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PipelineResult>,
}

impl ProgressEvent {
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status != ProgressStatus::Processing
    }
}

/// Create a connected sink/stream pair for one run
#[must_use]
pub fn progress_channel() -> (ProgressSink, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProgressSink {
            tx,
            last: (1, 0),
        },
        ProgressStream { rx },
    )
}

/// Writing half, owned by the run
#[derive(Debug)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    /// Step and percent of the last event sent
    last: (u8, u8),
}

impl ProgressSink {
    /// Report entry into a phase
    pub fn emit(&mut self, milestone: Milestone) {
        debug_assert!(milestone.percent >= self.last.1, "progress went backwards");
        self.last = (milestone.step, milestone.percent);
        self.send(ProgressEvent {
            step: milestone.step,
            progress: milestone.percent,
            message: milestone.message.to_string(),
            status: ProgressStatus::Processing,
            result: None,
        });
    }

    /// Send the success event and close the channel
    pub fn complete(mut self, milestone: Milestone, result: PipelineResult) {
        self.last = (milestone.step, milestone.percent);
        self.send(ProgressEvent {
            step: milestone.step,
            progress: milestone.percent,
            message: milestone.message.to_string(),
            status: ProgressStatus::Complete,
            result: Some(result),
        });
    }

    /// Send the error event; the channel stays open until the returned
    /// handle is closed or dropped
    ///
    /// Step and percent repeat the last event sent, or step 1 at 0 % if none
    /// was.
    #[must_use = "the stream ends as soon as the returned handle is dropped"]
    pub fn fail(mut self, message: impl Into<String>) -> ClosingSink {
        let (step, progress) = self.last;
        self.send(ProgressEvent {
            step,
            progress,
            message: message.into(),
            status: ProgressStatus::Error,
            result: None,
        });
        ClosingSink { tx: self.tx }
    }

    /// Step and percent of the last event sent
    #[inline]
    #[must_use]
    pub const fn last(&self) -> (u8, u8) {
        self.last
    }

    fn send(&mut self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Progress reader gone, event dropped");
        }
    }
}

/// A failed run's sink after its error event: sends nothing, holds the
/// stream open
#[derive(Debug)]
pub struct ClosingSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ClosingSink {
    /// End the stream
    #[inline]
    pub fn close(self) {
        drop(self.tx);
    }
}

/// Reading half; ends after the terminal event
#[derive(Debug)]
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressStream {
    /// Next event, or `None` once the run has finished
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
