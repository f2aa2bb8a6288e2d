//! Capability boundary errors

use std::time::Duration;

/// Failure of an external capability call
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// Network or protocol failure
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    /// Response carried no image-bearing part
    #[error("provider response contained no image")]
    NoImage,

    /// Response did not have the expected shape
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// Call exceeded its time budget
    #[error("capability call timed out after {0:?}")]
    Timeout(Duration),

    /// No provider is configured for this capability
    #[error("{0} capability is not configured")]
    NotConfigured(&'static str),
}

impl CapabilityError {
    /// Build a `Provider` error, truncating very long bodies
    #[must_use]
    pub fn provider(status: u16, body: impl Into<String>) -> Self {
        const MAX_BODY: usize = 512;
        let mut body = body.into();
        if body.len() > MAX_BODY {
            let mut cut = MAX_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push_str("...");
        }
        Self::Provider { status, body }
    }
}
