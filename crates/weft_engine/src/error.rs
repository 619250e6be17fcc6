//! Engine errors.
//!
//! Combinators report failures through the continuation channel; these
//! errors cover the direct-call surface only (task spawning), where a
//! validation failure is returned to the caller instead.

use weft_core::CoreError;

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The declared result type can never cross worker boundaries
    #[error("result type {type_name} cannot cross worker boundaries")]
    ResultTypeNotPortable {
        /// Name of the offending type
        type_name: &'static str,
    },

    /// The computation closure cannot cross worker boundaries
    #[error("computation closure cannot cross worker boundaries")]
    ClosureNotPortable,

    /// A shared primitive could not be acquired or reached
    #[error("resource layer failure: {0}")]
    Resource(#[from] CoreError),
}
