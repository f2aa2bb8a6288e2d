//! Atelier Capabilities
//!
//! The pipeline's heavy lifting is delegated to external services. This
//! crate draws the seam:
//!
//! - Capability traits ([`ImageEnhancer`], [`AngleSynthesizer`],
//!   [`VideoSynthesizer`]): buffers in, buffers out, explicit failure
//! - Step wrappers that shape inputs and outputs and apply failure policy:
//!   [`EnhancementStep`] fails open, [`AngleStep`] and [`VideoStep`] do not
//! - Provider adapters: [`GenerativeImageEnhancer`], [`RemoteSynthesizer`],
//!   and the [`Unconfigured`] stand-in
//!
//! Provider wire formats stay inside their adapter; swapping a provider
//! never touches the orchestrator.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod angles;
mod enhance;
mod error;
mod generative;
mod remote;
mod traits;
mod unconfigured;
mod video;

pub use angles::AngleStep;
pub use enhance::{Enhancement, EnhancementStep, ENHANCEMENT_INSTRUCTION};
pub use error::CapabilityError;
pub use generative::{GenerativeImageEnhancer, GenerativeImageConfig};
pub use remote::RemoteSynthesizer;
pub use traits::{
    AngleSynthesizer, GeneratedImage, GeneratedViews, ImageEnhancer, VideoSynthesizer, ViewSet,
};
pub use unconfigured::Unconfigured;
pub use video::VideoStep;
