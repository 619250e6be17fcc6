//! WEFT Combinator Engine
//!
//! Turns workflow-level `Parallel`, `Choice`, and `StartAsTask` operations
//! into correctly-synchronized graphs of schedulable jobs. Fan-in is
//! arbitrated without any central lock: atomic increment-and-return
//! counters pick exactly one child callback to drive the parent
//! continuation, and idempotent aggregator slots detect completion exactly
//! once. The engine never blocks waiting for children; a combinator ends
//! its own job immediately after submission.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod choice;
pub mod engine;
pub mod error;
pub mod parallel;
pub mod scope;
pub mod spawn;

#[cfg(test)]
pub(crate) mod testkit;

// Re-exports
pub use engine::ExecutionEngine;
pub use error::{EngineError, EngineResult};
pub use scope::JobScope;
