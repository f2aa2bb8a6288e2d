//! Atelier Artifact Types
//!
//! Everything a pipeline run hands between its steps and the store.
//!
//! # Core Concepts
//!
//! - [`ImageAsset`]: immutable image bytes tagged with format and view role
//! - [`VideoAsset`]: the generated video buffer
//! - [`ArtifactReference`]: locator of a successfully uploaded artifact,
//!   carrying its [`Bucket`] explicitly
//! - [`generate_key`]: collision-resistant storage keys
//! - [`ContentHash`]: Blake3 digest used when logging artifacts
//!
//! # Example
//!
//! ```rust,ignore
//! use atelier_artifact::{generate_key, ImageAsset, ImageFormat, ViewRole};
//!
//! let front = ImageAsset::new(bytes, ImageFormat::Jpeg, ViewRole::Front);
//! let key = generate_key(front.role().tag(), front.format().extension());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod asset;
mod hash;
mod key;
mod reference;

pub use asset::{ImageAsset, ImageFormat, MediaType, VideoAsset, ViewRole};
pub use hash::ContentHash;
pub use key::generate_key;
pub use reference::{ArtifactReference, Bucket};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
