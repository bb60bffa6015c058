//! Driver for the CounterReplay routine
//!
//! Activates the routine once with `c = 13`, then resumes the returned
//! snapshot four times, logging each outcome and the shared counter.
//!
//! ```text
//! RUST_LOG=debug cargo run --example counter_replay
//! ```

use reprise::routines::counter_replay::{COUNTER_REPLAY, DEFAULT_COUNTER};
use reprise::{CounterReplay, FunctionId, Outcome, RepriseResult, ResumeEngine, SharedStore, Value};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> RepriseResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine = ResumeEngine::new(SharedStore::new());
    engine.register(Arc::new(CounterReplay::new()))?;

    let snap = match engine.invoke(&FunctionId::from(COUNTER_REPLAY), Some(Value::Int(13)))? {
        Outcome::Snapshot(snap) => snap,
        Outcome::Value(v) => {
            info!(value = %v, "Routine finished without capturing");
            return Ok(());
        }
    };
    let summary = serde_json::to_string(&snap.summary()).unwrap_or_default();
    info!(snapshot = %summary, "Captured");

    for round in 1..=4 {
        let outcome = engine.resume(&snap, None)?;
        let counter = engine.store().get_or(DEFAULT_COUNTER, Value::Null);
        info!(round, outcome = %outcome, counter = %counter, "Resumed");
    }

    let metrics = engine.metrics();
    info!(
        captures = metrics.captures,
        resumes = metrics.resumes_completed,
        "Done"
    );
    Ok(())
}
