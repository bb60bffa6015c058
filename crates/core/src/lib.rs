//! Core types for Reprise
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Dynamic value carried by locals, inputs, results and the store
//! - Bindings: Frozen local bindings carried by a snapshot
//! - CaptureId / FunctionId / ResumePoint: Identities and tags
//! - RepriseError: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bindings;
pub mod error;
pub mod types;
pub mod value;

pub use bindings::Bindings;
pub use error::{RepriseError, RepriseResult};
pub use types::{CaptureId, FunctionId, ResumePoint};
pub use value::Value;
