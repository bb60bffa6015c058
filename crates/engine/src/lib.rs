//! Capture/resume engine for Reprise
//!
//! This crate implements multi-shot continuations over explicit state
//! machines:
//! - Suspendable: trait a function implements to be capturable
//! - Activation: per-execution context (locals, live store, capture point)
//! - Snapshot: immutable captured continuation
//! - ResumeEngine: function registry, `invoke` and `resume`
//! - EngineConfig: `reprise.toml` settings (reentrancy policy, depth limit)
//! - routines: ready-made suspendable functions
//!
//! The engine is the only component that knows about:
//! - Routing a snapshot back to the function that produced it
//! - Reentrancy policy enforcement
//! - Capture sequencing

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activation;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod routine;
pub mod routines;
pub mod snapshot;

pub use activation::Activation;
pub use config::{EngineConfig, ReentrancyPolicy, CONFIG_FILE_NAME};
pub use engine::ResumeEngine;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use routine::Suspendable;
pub use routines::CounterReplay;
pub use snapshot::{Outcome, Snapshot, SnapshotSummary};
