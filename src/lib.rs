//! Reprise - multi-shot continuations over explicit state machines
//!
//! A suspendable function captures its live locals as a [`Snapshot`]; the
//! [`ResumeEngine`] re-enters that snapshot as many times as the driver
//! likes. Every resume starts from the frozen locals but reads the
//! [`SharedStore`] live, so resumes of one snapshot can take different
//! branches as shared state changes.
//!
//! # Quick Start
//!
//! ```
//! use reprise::{CounterReplay, FunctionId, Outcome, ResumeEngine, SharedStore, Value};
//! use std::sync::Arc;
//!
//! let engine = ResumeEngine::new(SharedStore::new());
//! engine.register(Arc::new(CounterReplay::new()))?;
//!
//! let snap = engine
//!     .invoke(&FunctionId::from("counter_replay"), Some(Value::Int(13)))?
//!     .into_snapshot()
//!     .expect("first activation captures");
//!
//! assert!(engine.resume(&snap, None)?.is_snapshot());
//! assert_eq!(engine.resume(&snap, None)?, Outcome::Value(Value::Int(500)));
//! # Ok::<(), reprise::RepriseError>(())
//! ```
//!
//! # Architecture
//!
//! - `reprise-core`: values, identifiers, bindings, errors
//! - `reprise-storage`: the shared state store
//! - `reprise-engine`: snapshots, activations, the resume engine

pub use reprise_core::{
    Bindings, CaptureId, FunctionId, RepriseError, RepriseResult, ResumePoint, Value,
};
pub use reprise_engine::{
    routines, Activation, CounterReplay, EngineConfig, MetricsSnapshot, Outcome,
    ReentrancyPolicy, ResumeEngine, Snapshot, SnapshotSummary, Suspendable,
};
pub use reprise_storage::{SharedStore, StoreImage};
