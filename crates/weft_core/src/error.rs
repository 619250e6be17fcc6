//! Core error types for WEFT.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
///
/// Shared error vocabulary of the primitive contracts: anything a
/// distributed counter, result aggregator, cancellation entry, completion
/// source, or job queue may report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Aggregator slot index outside the declared capacity
    SlotOutOfRange {
        /// Requested slot index
        index: usize,
        /// Declared slot capacity
        capacity: usize,
    },

    /// Aggregator snapshot requested before all slots were filled
    Incomplete {
        /// Slots currently filled
        filled: usize,
        /// Declared slot capacity
        capacity: usize,
    },

    /// Write to a completion source that already reached a terminal state
    AlreadyResolved {
        /// Terminal state that was already recorded
        state: String,
    },

    /// Cancellation entry not known to the factory
    EntryNotFound {
        /// Identifier of the missing entry
        id: String,
    },

    /// Job queue no longer accepts submissions
    QueueClosed,

    /// Operation observed a set cancellation token
    Cancelled,

    /// Internal error (for unexpected errors)
    Internal {
        /// Error message
        message: String,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotOutOfRange { index, capacity } => {
                write!(f, "Slot {} out of range (capacity {})", index, capacity)
            }
            Self::Incomplete { filled, capacity } => {
                write!(f, "Aggregator incomplete: {}/{} slots filled", filled, capacity)
            }
            Self::AlreadyResolved { state } => {
                write!(f, "Completion source already resolved: {}", state)
            }
            Self::EntryNotFound { id } => write!(f, "Cancellation entry not found: {}", id),
            Self::QueueClosed => write!(f, "Job queue closed"),
            Self::Cancelled => write!(f, "Operation cancelled"),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for CoreError {}
