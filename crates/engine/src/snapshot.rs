//! Snapshots and resume outcomes
//!
//! A [`Snapshot`] is the immutable record produced by a capture point: the
//! locals live at that statement, the tag of the code that follows it, the
//! function that owns that code, and an ordering sequence number.
//!
//! # Guarantees
//!
//! - Bindings are frozen at capture. Later store writes and later resumes
//!   never change them.
//! - The resume point and owner are fixed.
//! - Resuming never mutates a snapshot, so one snapshot can be resumed any
//!   number of times.
//! - Identity is the capture id. Two snapshots with equal bindings are still
//!   different snapshots; clones of one snapshot are the same snapshot.

use reprise_core::{Bindings, CaptureId, FunctionId, ResumePoint, Value};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::ReentrancyPolicy;

#[derive(Debug)]
struct SnapshotInner {
    capture_id: CaptureId,
    owner: FunctionId,
    resume_point: ResumePoint,
    bindings: Bindings,
    captured_at: u64,
    /// Resumes of this snapshot currently executing
    active: AtomicUsize,
}

/// Captured continuation of a suspendable function
///
/// Cloning is O(1); clones share identity and the in-progress state. The
/// snapshot is released when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct Snapshot {
    inner: Arc<SnapshotInner>,
}

impl Snapshot {
    pub(crate) fn new(
        owner: FunctionId,
        resume_point: ResumePoint,
        bindings: Bindings,
        captured_at: u64,
    ) -> Self {
        Snapshot {
            inner: Arc::new(SnapshotInner {
                capture_id: CaptureId::new(),
                owner,
                resume_point,
                bindings,
                captured_at,
                active: AtomicUsize::new(0),
            }),
        }
    }

    /// Unique id assigned at capture time
    pub fn capture_id(&self) -> CaptureId {
        self.inner.capture_id
    }

    /// Function whose code follows the resume point
    pub fn owner(&self) -> &FunctionId {
        &self.inner.owner
    }

    /// Tag of the code following the capture point
    pub fn resume_point(&self) -> ResumePoint {
        self.inner.resume_point
    }

    /// Locals frozen at capture
    pub fn bindings(&self) -> &Bindings {
        &self.inner.bindings
    }

    /// Single frozen local
    pub fn binding(&self, name: &str) -> Option<&Value> {
        self.inner.bindings.get(name)
    }

    /// Engine-wide capture sequence number
    pub fn captured_at(&self) -> u64 {
        self.inner.captured_at
    }

    /// True while at least one resume of this snapshot is executing
    pub fn is_in_progress(&self) -> bool {
        self.active_resumes() > 0
    }

    /// Number of resumes of this snapshot currently executing
    pub fn active_resumes(&self) -> usize {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Same owner, resume point and bindings; identity is ignored
    pub fn structurally_eq(&self, other: &Snapshot) -> bool {
        self.inner.owner == other.inner.owner
            && self.inner.resume_point == other.inner.resume_point
            && self.inner.bindings == other.inner.bindings
    }

    /// Serializable description for logs and debugging
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            capture_id: self.inner.capture_id,
            owner: self.inner.owner.clone(),
            resume_point: self.inner.resume_point,
            captured_at: self.inner.captured_at,
            bindings: self
                .inner
                .bindings
                .iter()
                .map(|(name, value)| (name.to_string(), serde_json::Value::from(value.clone())))
                .collect(),
        }
    }

    /// Mark a resume as started
    ///
    /// Under `Forbid` this fails if any resume is already running. The
    /// returned guard marks the resume finished when dropped, including on
    /// error and unwind.
    pub(crate) fn enter(&self, policy: ReentrancyPolicy) -> Option<ResumeGuard<'_>> {
        let active = &self.inner.active;
        match policy {
            ReentrancyPolicy::Forbid => active
                .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                .ok()?,
            ReentrancyPolicy::Allow => active.fetch_add(1, Ordering::AcqRel),
        };
        Some(ResumeGuard { active })
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.inner.capture_id == other.inner.capture_id
    }
}

impl Eq for Snapshot {}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Snapshot({} @ {}, #{}, {} bindings)",
            self.inner.owner,
            self.inner.resume_point,
            self.inner.captured_at,
            self.inner.bindings.len()
        )
    }
}

/// Releases a snapshot's in-progress mark on drop
#[derive(Debug)]
pub(crate) struct ResumeGuard<'a> {
    active: &'a AtomicUsize,
}

impl Drop for ResumeGuard<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// JSON-friendly view of a snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    /// Snapshot identity
    pub capture_id: CaptureId,
    /// Owning function
    pub owner: FunctionId,
    /// Resume point tag
    pub resume_point: ResumePoint,
    /// Capture sequence number
    pub captured_at: u64,
    /// Frozen locals
    pub bindings: BTreeMap<String, serde_json::Value>,
}

/// What a resume (or an initial activation) produced
///
/// Either the function ran to completion with a value, or it captured again
/// and handed back a new snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Terminal value
    Value(Value),
    /// A further capture
    Snapshot(Snapshot),
}

impl Outcome {
    /// True for `Outcome::Value`
    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    /// True for `Outcome::Snapshot`
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Outcome::Snapshot(_))
    }

    /// Borrow the terminal value
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Snapshot(_) => None,
        }
    }

    /// Borrow the snapshot
    pub fn as_snapshot(&self) -> Option<&Snapshot> {
        match self {
            Outcome::Snapshot(s) => Some(s),
            Outcome::Value(_) => None,
        }
    }

    /// Take the terminal value
    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Snapshot(_) => None,
        }
    }

    /// Take the snapshot
    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            Outcome::Snapshot(s) => Some(s),
            Outcome::Value(_) => None,
        }
    }

    /// "value" or "snapshot"
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Value(_) => "value",
            Outcome::Snapshot(_) => "snapshot",
        }
    }

    /// Equal values, or structurally equal snapshots
    pub fn structurally_eq(&self, other: &Outcome) -> bool {
        match (self, other) {
            (Outcome::Value(a), Outcome::Value(b)) => a == b,
            (Outcome::Snapshot(a), Outcome::Snapshot(b)) => a.structurally_eq(b),
            _ => false,
        }
    }
}

impl From<Value> for Outcome {
    fn from(v: Value) -> Self {
        Outcome::Value(v)
    }
}

impl From<Snapshot> for Outcome {
    fn from(s: Snapshot) -> Self {
        Outcome::Snapshot(s)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(v) => write!(f, "Value({})", v),
            Outcome::Snapshot(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::Snapshot: Send, Sync, Clone);
    static_assertions::assert_impl_all!(super::Outcome: Send, Sync);

    use super::*;

    const POINT: ResumePoint = ResumePoint::new(1, "after");

    fn bindings() -> Bindings {
        vec![("a".to_string(), Value::Int(5))].into_iter().collect()
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(FunctionId::from("f"), POINT, bindings(), 1)
    }

    #[test]
    fn test_accessors() {
        let s = snapshot();
        assert_eq!(s.owner().as_str(), "f");
        assert_eq!(s.resume_point(), POINT);
        assert_eq!(s.binding("a"), Some(&Value::Int(5)));
        assert_eq!(s.captured_at(), 1);
        assert!(!s.is_in_progress());
    }

    #[test]
    fn test_identity_equality() {
        let a = snapshot();
        let b = snapshot();
        assert_ne!(a, b);
        assert_ne!(a.capture_id(), b.capture_id());
        assert!(a.structurally_eq(&b));

        let clone = a.clone();
        assert_eq!(a, clone);
    }

    #[test]
    fn test_structural_difference() {
        let a = snapshot();
        let other_point = Snapshot::new(
            FunctionId::from("f"),
            ResumePoint::new(2, "inner"),
            bindings(),
            2,
        );
        assert!(!a.structurally_eq(&other_point));
    }

    #[test]
    fn test_forbid_guard_is_exclusive() {
        let s = snapshot();
        let guard = s.enter(ReentrancyPolicy::Forbid).unwrap();
        assert!(s.is_in_progress());
        assert!(s.clone().enter(ReentrancyPolicy::Forbid).is_none());
        drop(guard);
        assert!(!s.is_in_progress());
        assert!(s.enter(ReentrancyPolicy::Forbid).is_some());
    }

    #[test]
    fn test_allow_guard_counts() {
        let s = snapshot();
        let g1 = s.enter(ReentrancyPolicy::Allow).unwrap();
        let g2 = s.enter(ReentrancyPolicy::Allow).unwrap();
        assert_eq!(s.active_resumes(), 2);
        drop(g1);
        drop(g2);
        assert_eq!(s.active_resumes(), 0);
    }

    #[test]
    fn test_summary_serializes() {
        let s = snapshot();
        let json = serde_json::to_value(s.summary()).unwrap();
        assert_eq!(json["owner"], "f");
        assert_eq!(json["bindings"]["a"], 5);
        assert_eq!(json["captured_at"], 1);
    }

    #[test]
    fn test_outcome_helpers() {
        let v = Outcome::from(Value::Int(500));
        assert!(v.is_value());
        assert_eq!(v.kind(), "value");
        assert_eq!(v.as_value(), Some(&Value::Int(500)));
        assert_eq!(v.to_string(), "Value(500)");

        let s = Outcome::from(snapshot());
        assert!(s.is_snapshot());
        assert!(s.as_value().is_none());
        assert!(s.clone().into_snapshot().is_some());
        assert!(!v.structurally_eq(&s));
        assert!(s.structurally_eq(&Outcome::from(snapshot())));
        assert_ne!(s, Outcome::from(snapshot()));
    }
}
