//! Ready-made suspendable functions
//!
//! - **CounterReplay**: captures once, then branches on a shared counter so
//!   repeated resumes of one snapshot diverge as the counter advances
//!
//! Routines hold no mutable state of their own. Everything they remember
//! between capture and resume is in snapshot bindings, and everything they
//! share is in the store, so one registered instance serves any number of
//! activations.

pub mod counter_replay;

pub use counter_replay::CounterReplay;
