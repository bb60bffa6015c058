//! Shared state store for Reprise
//!
//! This crate implements the process-wide store every activation and resume
//! reads live:
//! - SharedStore: `FxHashMap` behind a `parking_lot::RwLock`, versioned writes
//! - StoreImage: frozen copy used to reset the store between resumes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod image;
pub mod shared;

pub use image::StoreImage;
pub use shared::{SharedStore, VersionedValue};
