//! WEFT Core Types
//!
//! This crate contains pure types and logic with no I/O: typed identifiers,
//! the shared error vocabulary, and the fault/cancellation value types that
//! travel through the continuation channel.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fault;
pub mod id;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use fault::{CancellationCause, Fault, FaultKind, FaultPolicy};
pub use id::{JobId, ProcessId, TaskId, TokenId, WorkerId};
