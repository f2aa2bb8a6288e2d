//! Atelier Artifact Store
//!
//! Uploads run artifacts to object storage and removes them again on
//! rollback. The store never overwrites: writing an existing key is an
//! [`UploadFailure`].
//!
//! - [`StorageBackend`]: the three primitives a backend must provide
//! - [`ArtifactStore`]: the client the pipeline talks to
//! - [`RestObjectStore`]: storage REST API backend
//! - [`MemoryStore`]: in-process backend for tests and local runs

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod backend;
mod memory;
mod rest;
mod store;

pub use backend::{BucketNames, StorageBackend, StorageError};
pub use memory::MemoryStore;
pub use rest::RestObjectStore;
pub use store::{ArtifactStore, UploadFailure};
