//! Resume engine
//!
//! The engine owns the function registry and the shared store handle, and
//! implements the two driver-facing operations:
//! - `invoke`: initial activation of a registered function
//! - `resume`: re-entry of a snapshot at its resume point
//!
//! # Resume Semantics
//!
//! Each resume is an independent activation. Its locals start as a copy of
//! the snapshot's bindings; every store read inside it is live. Nothing the
//! resume does is written back to the snapshot, so the same snapshot can be
//! resumed again and may take a different branch if the store changed.
//!
//! Store writes made by a resume that later fails are not rolled back.

use dashmap::DashMap;
use reprise_core::{
    Bindings, CaptureId, FunctionId, RepriseError, RepriseResult, ResumePoint, Value,
};
use reprise_storage::SharedStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::activation::Activation;
use crate::config::{EngineConfig, ReentrancyPolicy};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::routine::Suspendable;
use crate::snapshot::{Outcome, Snapshot};

/// Capture/resume engine
///
/// `ResumeEngine` is `Send + Sync`; share it with `Arc` to resume from
/// several threads. Whether one snapshot may be resumed concurrently is
/// decided by the configured [`ReentrancyPolicy`].
pub struct ResumeEngine {
    store: SharedStore,
    functions: DashMap<FunctionId, Arc<dyn Suspendable>>,
    config: EngineConfig,
    policy: ReentrancyPolicy,
    /// Source of `Snapshot::captured_at`
    sequence: AtomicU64,
    metrics: EngineMetrics,
}

impl ResumeEngine {
    /// Engine with the default configuration
    pub fn new(store: SharedStore) -> Self {
        ResumeEngine {
            store,
            functions: DashMap::new(),
            config: EngineConfig::default(),
            policy: ReentrancyPolicy::Forbid,
            sequence: AtomicU64::new(0),
            metrics: EngineMetrics::new(),
        }
    }

    /// Engine with an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration does not validate.
    pub fn with_config(store: SharedStore, config: EngineConfig) -> RepriseResult<Self> {
        config.validate()?;
        let policy = config.reentrancy_policy()?;
        Ok(ResumeEngine {
            store,
            functions: DashMap::new(),
            config,
            policy,
            sequence: AtomicU64::new(0),
            metrics: EngineMetrics::new(),
        })
    }

    /// The shared store every activation reads
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parsed reentrancy policy
    pub fn policy(&self) -> ReentrancyPolicy {
        self.policy
    }

    /// Current counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Register a suspendable function under its id
    ///
    /// # Errors
    ///
    /// Returns `DuplicateFunction` if the id is taken.
    pub fn register(&self, function: Arc<dyn Suspendable>) -> RepriseResult<()> {
        let id = function.id();
        match self.functions.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(RepriseError::DuplicateFunction { function: id })
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                debug!(target: "reprise::engine", function = %id, "Function registered");
                slot.insert(function);
                Ok(())
            }
        }
    }

    /// True if a function is registered under `id`
    pub fn is_registered(&self, id: &FunctionId) -> bool {
        self.functions.contains_key(id)
    }

    /// Registered function ids, sorted
    pub fn functions(&self) -> Vec<FunctionId> {
        let mut ids: Vec<FunctionId> = self.functions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    // Clone the Arc out so no map shard lock is held while a body runs.
    fn lookup(&self, id: &FunctionId) -> RepriseResult<Arc<dyn Suspendable>> {
        self.functions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RepriseError::UnknownFunction {
                function: id.clone(),
            })
    }

    /// Start a new activation of a registered function
    ///
    /// Returns the function's terminal value, or the snapshot it handed back
    /// after capturing.
    pub fn invoke(&self, function: &FunctionId, input: Option<Value>) -> RepriseResult<Outcome> {
        let routine = self.lookup(function)?;
        self.metrics.record_activation();
        debug!(target: "reprise::engine", function = %function, "Activation started");

        let mut cx = Activation::initial(self, function.clone(), input, 0);
        let outcome = routine.start(&mut cx);
        match &outcome {
            Ok(o) => {
                debug!(target: "reprise::engine", function = %function, outcome = o.kind(), "Activation finished")
            }
            Err(e) => {
                warn!(target: "reprise::engine", function = %function, error = %e, "Activation failed")
            }
        }
        outcome
    }

    /// Re-enter a snapshot at its resume point
    ///
    /// `input` is visible to the resumed code through `cx.input()`; the
    /// snapshot's bindings seed the locals. The snapshot itself is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// - `Reentrancy` if the snapshot is already being resumed and the
    ///   policy is `Forbid`
    /// - `UnknownFunction` if the owner is not registered with this engine
    /// - `UnknownResumePoint` if the registered owner does not define the
    ///   snapshot's resume point
    /// - any error raised by the resumed code, such as `UnboundVariable`
    pub fn resume(&self, snapshot: &Snapshot, input: Option<Value>) -> RepriseResult<Outcome> {
        self.resume_at_depth(snapshot, input, 0)
    }

    pub(crate) fn resume_at_depth(
        &self,
        snapshot: &Snapshot,
        input: Option<Value>,
        depth: usize,
    ) -> RepriseResult<Outcome> {
        if depth > self.config.max_resume_depth {
            return Err(RepriseError::ResumeDepthExceeded {
                depth,
                limit: self.config.max_resume_depth,
            });
        }

        let capture_id = snapshot.capture_id();
        let _guard = match snapshot.enter(self.policy) {
            Some(guard) => guard,
            None => {
                self.metrics.record_reentrancy_rejected();
                warn!(target: "reprise::resume", capture_id = %capture_id, "Snapshot already being resumed");
                return Err(RepriseError::Reentrancy { capture_id });
            }
        };

        let routine = self.lookup(snapshot.owner())?;
        self.metrics.record_resume_started();
        debug!(
            target: "reprise::resume",
            capture_id = %capture_id,
            function = %snapshot.owner(),
            point = %snapshot.resume_point(),
            depth,
            "Resume started"
        );

        let mut cx = Activation::resumed(self, snapshot, input, depth);
        let outcome = routine.resume(snapshot.resume_point(), &mut cx);
        self.metrics.record_resume_finished(outcome.is_ok());

        match &outcome {
            Ok(o) => {
                debug!(target: "reprise::resume", capture_id = %capture_id, outcome = o.kind(), "Resume finished")
            }
            Err(e) => {
                warn!(target: "reprise::resume", capture_id = %capture_id, error = %e, "Resume failed")
            }
        }
        outcome
    }

    /// Build a snapshot for a capture point
    pub(crate) fn record_capture(
        &self,
        owner: FunctionId,
        point: ResumePoint,
        bindings: Bindings,
        parent: Option<CaptureId>,
    ) -> Snapshot {
        let captured_at = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Snapshot::new(owner, point, bindings, captured_at);
        self.metrics.record_capture();

        if self.config.trace_bindings {
            debug!(
                target: "reprise::capture",
                capture_id = %snapshot.capture_id(),
                parent = ?parent,
                function = %snapshot.owner(),
                point = %point,
                captured_at,
                bindings = ?snapshot.bindings(),
                "Captured"
            );
        } else {
            debug!(
                target: "reprise::capture",
                capture_id = %snapshot.capture_id(),
                parent = ?parent,
                function = %snapshot.owner(),
                point = %point,
                captured_at,
                bound = snapshot.bindings().len(),
                "Captured"
            );
        }
        snapshot
    }
}

impl std::fmt::Debug for ResumeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeEngine")
            .field("functions", &self.functions())
            .field("policy", &self.policy)
            .field("store_version", &self.store.version())
            .field("metrics", &self.metrics())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::ResumeEngine: Send, Sync);

    use super::*;

    const AFTER: ResumePoint = ResumePoint::new(1, "after");

    /// Binds `n` from the input, captures, then returns `n + store["bump"]`.
    struct AddBump;

    impl Suspendable for AddBump {
        fn id(&self) -> FunctionId {
            FunctionId::from("add_bump")
        }

        fn start(&self, cx: &mut Activation<'_>) -> RepriseResult<Outcome> {
            let n = cx.input().and_then(Value::as_int).unwrap_or(0);
            cx.bind("n", n);
            Ok(cx.capture(AFTER)?.into())
        }

        fn resume(&self, point: ResumePoint, cx: &mut Activation<'_>) -> RepriseResult<Outcome> {
            if point != AFTER {
                return Err(cx.unknown_point(point));
            }
            let bump = cx.store().get_int("bump")?.unwrap_or(0);
            Ok(Value::Int(cx.int("n")? + bump).into())
        }
    }

    fn engine() -> ResumeEngine {
        let engine = ResumeEngine::new(SharedStore::new());
        engine.register(Arc::new(AddBump)).unwrap();
        engine
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let engine = engine();
        let err = engine.register(Arc::new(AddBump)).unwrap_err();
        assert!(matches!(err, RepriseError::DuplicateFunction { .. }));
        assert_eq!(engine.functions(), vec![FunctionId::from("add_bump")]);
    }

    #[test]
    fn test_invoke_unknown_function() {
        let engine = engine();
        let err = engine.invoke(&FunctionId::from("missing"), None).unwrap_err();
        assert!(matches!(err, RepriseError::UnknownFunction { .. }));
    }

    #[test]
    fn test_resume_reads_store_live() {
        let engine = engine();
        let snap = engine
            .invoke(&FunctionId::from("add_bump"), Some(Value::Int(10)))
            .unwrap()
            .into_snapshot()
            .unwrap();

        assert_eq!(engine.resume(&snap, None).unwrap(), Outcome::Value(Value::Int(10)));
        engine.store().set("bump", Value::Int(5));
        assert_eq!(engine.resume(&snap, None).unwrap(), Outcome::Value(Value::Int(15)));
        assert_eq!(snap.binding("n"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_capture_sequence_increases() {
        let engine = engine();
        let id = FunctionId::from("add_bump");
        let a = engine.invoke(&id, None).unwrap().into_snapshot().unwrap();
        let b = engine.invoke(&id, None).unwrap().into_snapshot().unwrap();
        assert!(a.captured_at() < b.captured_at());
    }

    #[test]
    fn test_snapshot_from_other_engine_is_unknown_function() {
        let a = engine();
        let b = ResumeEngine::new(SharedStore::new());
        let snap = a
            .invoke(&FunctionId::from("add_bump"), None)
            .unwrap()
            .into_snapshot()
            .unwrap();
        let err = b.resume(&snap, None).unwrap_err();
        assert!(matches!(err, RepriseError::UnknownFunction { .. }));
        assert!(!snap.is_in_progress());
    }

    #[test]
    fn test_metrics_track_calls() {
        let engine = engine();
        let snap = engine
            .invoke(&FunctionId::from("add_bump"), None)
            .unwrap()
            .into_snapshot()
            .unwrap();
        engine.resume(&snap, None).unwrap();
        engine.store().set("bump", Value::from("oops"));
        assert!(engine.resume(&snap, None).is_err());

        let m = engine.metrics();
        assert_eq!(m.activations, 1);
        assert_eq!(m.captures, 1);
        assert_eq!(m.resumes_started, 2);
        assert_eq!(m.resumes_completed, 1);
        assert_eq!(m.resumes_failed, 1);
        assert_eq!(m.active_resumes, 0);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let config = EngineConfig {
            reentrancy: "never".to_string(),
            ..EngineConfig::default()
        };
        assert!(ResumeEngine::with_config(SharedStore::new(), config).is_err());
    }

    #[test]
    fn test_with_config_sets_policy() {
        let engine =
            ResumeEngine::with_config(SharedStore::new(), EngineConfig::allowing_reentrancy())
                .unwrap();
        assert_eq!(engine.policy(), ReentrancyPolicy::Allow);
    }
}
