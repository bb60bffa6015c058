//! Engine counters
//!
//! All counters use Relaxed ordering: they are observational only and do not
//! synchronize any other memory.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a `ResumeEngine`
#[derive(Debug, Default)]
pub struct EngineMetrics {
    activations: AtomicU64,
    captures: AtomicU64,
    resumes_started: AtomicU64,
    resumes_completed: AtomicU64,
    resumes_failed: AtomicU64,
    reentrancy_rejected: AtomicU64,
    active_resumes: AtomicU64,
}

impl EngineMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_activation(&self) {
        self.activations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_capture(&self) {
        self.captures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resume_started(&self) {
        self.resumes_started.fetch_add(1, Ordering::Relaxed);
        self.active_resumes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resume_finished(&self, ok: bool) {
        if ok {
            self.resumes_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.resumes_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.active_resumes.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reentrancy_rejected(&self) {
        self.reentrancy_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters into a plain struct
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            activations: self.activations.load(Ordering::Relaxed),
            captures: self.captures.load(Ordering::Relaxed),
            resumes_started: self.resumes_started.load(Ordering::Relaxed),
            resumes_completed: self.resumes_completed.load(Ordering::Relaxed),
            resumes_failed: self.resumes_failed.load(Ordering::Relaxed),
            reentrancy_rejected: self.reentrancy_rejected.load(Ordering::Relaxed),
            active_resumes: self.active_resumes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Initial activations started through `invoke`
    pub activations: u64,
    /// Snapshots produced by capture points
    pub captures: u64,
    /// Resumes that passed the reentrancy check and began executing
    pub resumes_started: u64,
    /// Resumes that returned an outcome
    pub resumes_completed: u64,
    /// Resumes that returned an error after starting
    pub resumes_failed: u64,
    /// Resumes refused because the snapshot was already being resumed
    pub reentrancy_rejected: u64,
    /// Resumes currently executing
    pub active_resumes: u64,
}

impl MetricsSnapshot {
    /// Completed / started, or 0.0 before any resume
    pub fn completion_rate(&self) -> f64 {
        if self.resumes_started > 0 {
            self.resumes_completed as f64 / self.resumes_started as f64
        } else {
            0.0
        }
    }

    /// Resumes that finished either way
    pub fn resumes_finished(&self) -> u64 {
        self.resumes_completed + self.resumes_failed
    }
}
