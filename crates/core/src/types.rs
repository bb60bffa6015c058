//! Identifier types for Reprise
//!
//! This module defines the foundational identifiers:
//! - CaptureId: Unique identity of a captured snapshot
//! - FunctionId: Identity of a suspendable function
//! - ResumePoint: Enumerated tag naming the code that follows a capture point

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a captured snapshot
///
/// A CaptureId is a wrapper around a UUID v4. Every capture allocates a fresh
/// id, so two snapshots never share an identity even when their bindings are
/// structurally equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaptureId(Uuid);

impl CaptureId {
    /// Create a new random CaptureId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a CaptureId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse a CaptureId from a string representation
    ///
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the raw bytes of this CaptureId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for CaptureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a suspendable function
///
/// Functions are registered with the engine under this name; a snapshot
/// records the id of the function that produced it so the engine can route
/// a resume back to the right body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(String);

impl FunctionId {
    /// Create a function id from a name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the function name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FunctionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FunctionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Tag naming "the code following a capture point"
///
/// A suspendable function declares one `ResumePoint` per capture site and
/// dispatches on the tag when resumed. Equality and hashing use the numeric
/// tag only; the label is for logs.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResumePoint {
    tag: u32,
    label: &'static str,
}

impl ResumePoint {
    /// Declare a resume point
    pub const fn new(tag: u32, label: &'static str) -> Self {
        Self { tag, label }
    }

    /// Numeric tag
    pub const fn tag(&self) -> u32 {
        self.tag
    }

    /// Human readable label
    pub const fn label(&self) -> &'static str {
        self.label
    }
}

impl PartialEq for ResumePoint {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for ResumePoint {}

impl std::hash::Hash for ResumePoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
    }
}

impl fmt::Display for ResumePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.tag)
    }
}
