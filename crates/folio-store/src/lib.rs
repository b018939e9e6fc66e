//! Folio Store - in-process backend for Folio galleries
//!
//! [`MemoryStore`] implements [`folio_gallery::GalleryStore`] over a record
//! list and an asset map. It backs the CLI and the integration tests, and
//! documents the contract a hosted backend has to meet:
//! - Records listed newest first by `created_at`
//! - Backend-assigned IDs and timestamps on insert
//! - `NotFound` for updates and deletes of missing targets

#![warn(unreachable_pub)]

pub mod memory;

pub use memory::{Asset, MemoryStore, Operation};
