//! Error types for Reprise
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors are returned synchronously to the caller of `invoke`/`resume`.
//! Nothing is retried, and shared store writes made before a failure stay
//! visible.

use crate::types::{CaptureId, FunctionId};
use std::io;
use thiserror::Error;

/// Result type alias for Reprise operations
pub type RepriseResult<T> = std::result::Result<T, RepriseError>;

/// Error types for the capture/resume engine
#[derive(Debug, Error)]
pub enum RepriseError {
    /// Code after a resume point referenced a name the activation never bound
    ///
    /// `capture_id` is the snapshot being resumed, or `None` during an
    /// initial activation.
    #[error("Unbound variable '{name}'{}", fmt_capture(.capture_id))]
    UnboundVariable {
        /// Name of the missing local
        name: String,
        /// Snapshot whose bindings were consulted
        capture_id: Option<CaptureId>,
    },

    /// Resume of a snapshot that is already being resumed
    #[error("Snapshot {capture_id} is already being resumed")]
    Reentrancy {
        /// Snapshot that was re-entered
        capture_id: CaptureId,
    },

    /// Second capture inside a single activation
    #[error("Function '{function}' already captured in this activation")]
    CaptureLimit {
        /// Function whose activation captured twice
        function: FunctionId,
    },

    /// No suspendable function registered under this id
    #[error("Unknown function '{function}'")]
    UnknownFunction {
        /// Requested function
        function: FunctionId,
    },

    /// A function is already registered under this id
    #[error("Function '{function}' is already registered")]
    DuplicateFunction {
        /// Conflicting function id
        function: FunctionId,
    },

    /// The owning function has no code for this resume point
    #[error("Function '{function}' has no resume point {point}")]
    UnknownResumePoint {
        /// Owning function
        function: FunctionId,
        /// Unrecognized tag
        point: String,
    },

    /// A local or store value had the wrong type for the operation
    #[error("Type mismatch for '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        /// Local or store name
        name: String,
        /// Expected type name
        expected: &'static str,
        /// Actual type name
        actual: &'static str,
    },

    /// Nested resumes from inside activations went too deep
    #[error("Resume depth {depth} exceeds limit {limit}")]
    ResumeDepthExceeded {
        /// Depth that was attempted
        depth: usize,
        /// Configured limit
        limit: usize,
    },

    /// Invalid input or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error (config file access)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn fmt_capture(capture_id: &Option<CaptureId>) -> String {
    match capture_id {
        Some(id) => format!(" in snapshot {}", id),
        None => String::new(),
    }
}

impl RepriseError {
    /// Unbound local, optionally tied to the snapshot being resumed
    pub fn unbound(name: impl Into<String>, capture_id: Option<CaptureId>) -> Self {
        RepriseError::UnboundVariable {
            name: name.into(),
            capture_id,
        }
    }

    /// Invalid input or configuration
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        RepriseError::InvalidInput(msg.into())
    }

    /// Type mismatch on a named value
    pub fn type_mismatch(
        name: impl Into<String>,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        RepriseError::TypeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// True for `UnboundVariable`
    pub fn is_unbound_variable(&self) -> bool {
        matches!(self, RepriseError::UnboundVariable { .. })
    }

    /// True for `Reentrancy`
    pub fn is_reentrancy(&self) -> bool {
        matches!(self, RepriseError::Reentrancy { .. })
    }

    /// True for errors caused by how the engine was called rather than by
    /// the suspendable function's body
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            RepriseError::Reentrancy { .. }
                | RepriseError::UnknownFunction { .. }
                | RepriseError::DuplicateFunction { .. }
                | RepriseError::ResumeDepthExceeded { .. }
                | RepriseError::InvalidInput(_)
        )
    }
}
