//! Activation context handed to suspendable function bodies
//!
//! One `Activation` exists per execution instance: the initial call made by
//! `invoke`, or a single resume of a snapshot. It owns the working locals,
//! exposes the live shared store, and hosts the capture point.

use reprise_core::{
    Bindings, CaptureId, FunctionId, RepriseError, RepriseResult, ResumePoint, Value,
};
use reprise_storage::SharedStore;
use std::collections::BTreeMap;

use crate::engine::ResumeEngine;
use crate::snapshot::{Outcome, Snapshot};

/// Execution instance of a suspendable function
pub struct Activation<'e> {
    engine: &'e ResumeEngine,
    function: FunctionId,
    /// Snapshot this activation resumes, `None` for an initial call
    origin: Option<CaptureId>,
    locals: BTreeMap<String, Value>,
    input: Option<Value>,
    captured: bool,
    depth: usize,
}

impl<'e> Activation<'e> {
    pub(crate) fn initial(
        engine: &'e ResumeEngine,
        function: FunctionId,
        input: Option<Value>,
        depth: usize,
    ) -> Self {
        Activation {
            engine,
            function,
            origin: None,
            locals: BTreeMap::new(),
            input,
            captured: false,
            depth,
        }
    }

    pub(crate) fn resumed(
        engine: &'e ResumeEngine,
        snapshot: &Snapshot,
        input: Option<Value>,
        depth: usize,
    ) -> Self {
        Activation {
            engine,
            function: snapshot.owner().clone(),
            origin: Some(snapshot.capture_id()),
            locals: snapshot.bindings().to_map(),
            input,
            captured: false,
            depth,
        }
    }

    /// The live shared store
    pub fn store(&self) -> &SharedStore {
        self.engine.store()
    }

    /// Input passed to `invoke` or `resume`
    pub fn input(&self) -> Option<&Value> {
        self.input.as_ref()
    }

    /// Function being executed
    pub fn function(&self) -> &FunctionId {
        &self.function
    }

    /// Snapshot being resumed, `None` during the initial call
    pub fn resumed_from(&self) -> Option<CaptureId> {
        self.origin
    }

    /// Nesting depth: 0 for calls made by the driver
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bind or rebind a local
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.locals.insert(name.into(), value.into());
    }

    /// Drop a local so later captures do not record it
    pub fn unbind(&mut self, name: &str) -> Option<Value> {
        self.locals.remove(name)
    }

    /// True if `name` is bound
    pub fn is_bound(&self, name: &str) -> bool {
        self.locals.contains_key(name)
    }

    /// Read a local
    ///
    /// Fails with `UnboundVariable` if the name was never bound in this
    /// activation nor carried in by the snapshot.
    pub fn local(&self, name: &str) -> RepriseResult<&Value> {
        self.locals
            .get(name)
            .ok_or_else(|| RepriseError::unbound(name, self.origin))
    }

    /// Read an integer local
    pub fn int(&self, name: &str) -> RepriseResult<i64> {
        let value = self.local(name)?;
        value
            .as_int()
            .ok_or_else(|| RepriseError::type_mismatch(name, "Int", value.type_name()))
    }

    /// Capture point
    ///
    /// Freezes exactly the locals bound right now and pairs them with
    /// `point`, the tag of the code that follows this statement. Execution
    /// of the current activation continues normally afterwards. At most one
    /// capture is allowed per activation.
    pub fn capture(&mut self, point: ResumePoint) -> RepriseResult<Snapshot> {
        if self.captured {
            return Err(RepriseError::CaptureLimit {
                function: self.function.clone(),
            });
        }
        self.captured = true;
        let bindings = Bindings::new(self.locals.clone());
        Ok(self
            .engine
            .record_capture(self.function.clone(), point, bindings, self.origin))
    }

    /// Resume another snapshot from inside this activation
    ///
    /// Counts against the engine's `max_resume_depth`.
    pub fn resume(&self, snapshot: &Snapshot, input: Option<Value>) -> RepriseResult<Outcome> {
        self.engine.resume_at_depth(snapshot, input, self.depth + 1)
    }

    /// Error for a resume point this function does not define
    pub fn unknown_point(&self, point: ResumePoint) -> RepriseError {
        RepriseError::UnknownResumePoint {
            function: self.function.clone(),
            point: point.to_string(),
        }
    }
}
