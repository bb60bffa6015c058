//! CounterReplay: branch selection driven by a shared counter
//!
//! ## Body
//!
//! Initial activation, with an `Int` input `c`:
//!
//! ```text
//! if counter == 0:
//!     counter += 1
//!     a = 5; b = 45; c = c + 10
//!     capture AFTER_CAPTURE            -> returned to the driver
//! else:
//!     return null
//! ```
//!
//! Resume at `AFTER_CAPTURE`:
//!
//! ```text
//! x = 45
//! if counter == 1:
//!     counter += 1
//!     hidden_inner = 55
//!     capture INNER_CAPTURE            -> returned to the driver
//! x += 1
//! return a * 100
//! ```
//!
//! Resume at `INNER_CAPTURE` returns `hidden_inner`.
//!
//! Each `if counter == n: counter += 1` is one `fetch_add_if` on the store,
//! so concurrent activations never both take a branch guarded by the same
//! counter value.
//!
//! With a fresh store and `c = 13`, the snapshot returned by the initial
//! call holds `a=5, b=45, c=23` and the counter reads 1. The first resume of
//! it sees 1, advances the counter to 2 and returns a nested snapshot; every
//! later resume of the same snapshot sees 2 and returns 500.

use reprise_core::{FunctionId, RepriseError, RepriseResult, ResumePoint, Value};
use tracing::debug;

use crate::activation::Activation;
use crate::routine::Suspendable;
use crate::snapshot::Outcome;

/// Default store name of the shared counter
pub const DEFAULT_COUNTER: &str = "counter";

/// Registered function name
pub const COUNTER_REPLAY: &str = "counter_replay";

/// Code following the capture in the initial activation
pub const AFTER_CAPTURE: ResumePoint = ResumePoint::new(1, "after_capture");

/// Code following the nested capture taken while `counter == 1`
pub const INNER_CAPTURE: ResumePoint = ResumePoint::new(2, "inner_capture");

/// Suspendable function whose resumes branch on a shared counter
#[derive(Debug, Clone)]
pub struct CounterReplay {
    counter: String,
}

impl CounterReplay {
    /// Routine reading the `"counter"` store entry
    pub fn new() -> Self {
        Self::with_counter(DEFAULT_COUNTER)
    }

    /// Routine reading a differently named store entry
    pub fn with_counter(name: impl Into<String>) -> Self {
        CounterReplay {
            counter: name.into(),
        }
    }

    /// Store name of the counter
    pub fn counter_name(&self) -> &str {
        &self.counter
    }

    fn after_capture(&self, cx: &mut Activation<'_>) -> RepriseResult<Outcome> {
        cx.bind("x", 45);

        if cx.store().fetch_add_if(&self.counter, 1, 1)?.is_some() {
            cx.bind("hidden_inner", 55);
            let nested = cx.capture(INNER_CAPTURE)?;
            return Ok(nested.into());
        }

        let x = cx.int("x")? + 1;
        cx.bind("x", x);
        let (a, b, c) = (cx.int("a")?, cx.int("b")?, cx.int("c")?);
        debug!(target: "reprise::routine", a, b, c, x, "counter_replay alternate branch");
        Ok(Value::Int(a * 100).into())
    }
}

impl Default for CounterReplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Suspendable for CounterReplay {
    fn id(&self) -> FunctionId {
        FunctionId::from(COUNTER_REPLAY)
    }

    fn start(&self, cx: &mut Activation<'_>) -> RepriseResult<Outcome> {
        let c = match cx.input() {
            Some(Value::Int(c)) => *c,
            Some(other) => {
                return Err(RepriseError::type_mismatch("c", "Int", other.type_name()))
            }
            None => return Err(RepriseError::invalid_input("counter_replay expects an Int input")),
        };
        cx.bind("c", c);

        let first = cx.store().fetch_add_if(&self.counter, 0, 1)?.is_some();
        debug!(target: "reprise::routine", first, "counter_replay started");
        if !first {
            return Ok(Value::Null.into());
        }

        cx.bind("a", 5);
        cx.bind("b", 45);
        cx.bind("c", c + 10);
        Ok(cx.capture(AFTER_CAPTURE)?.into())
    }

    fn resume(&self, point: ResumePoint, cx: &mut Activation<'_>) -> RepriseResult<Outcome> {
        if point == AFTER_CAPTURE {
            self.after_capture(cx)
        } else if point == INNER_CAPTURE {
            Ok(cx.local("hidden_inner")?.clone().into())
        } else {
            Err(cx.unknown_point(point))
        }
    }
}
