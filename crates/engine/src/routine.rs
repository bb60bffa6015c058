//! Suspendable functions
//!
//! A suspendable function is written as an explicit state machine: `start`
//! is the body from its first statement, and `resume` dispatches on the
//! [`ResumePoint`] tag to the code that follows each capture point. All
//! locals live in the [`Activation`]; all shared state is read through
//! `cx.store()` at the moment the code runs.

use reprise_core::{FunctionId, RepriseResult, ResumePoint};

use crate::activation::Activation;
use crate::snapshot::Outcome;

/// A function whose activations can be captured and resumed
///
/// Implementations must be deterministic given their locals, their input and
/// the store contents they read: the engine relies on this to make repeated
/// resumes of one snapshot differ only through shared state.
pub trait Suspendable: Send + Sync {
    /// Name the function is registered under
    fn id(&self) -> FunctionId;

    /// Run the body from the top
    ///
    /// The activation input is available through `cx.input()`.
    fn start(&self, cx: &mut Activation<'_>) -> RepriseResult<Outcome>;

    /// Run the code following `point`, with locals seeded from the snapshot
    ///
    /// Unknown tags should be reported with [`Activation::unknown_point`].
    fn resume(&self, point: ResumePoint, cx: &mut Activation<'_>) -> RepriseResult<Outcome>;
}
