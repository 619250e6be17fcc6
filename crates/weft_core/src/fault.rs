//! Fault values and fault policies.
//!
//! A [`Fault`] is the exception payload that travels the continuation
//! channel; a [`FaultPolicy`] tells the surrounding scheduler how to react
//! to worker loss for a job. The engine threads policies through jobs
//! unmodified and never interprets them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a fault travelling the continuation channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// Enumerating the input sequence of a combinator failed
    Enumeration,
    /// A computation or continuation closure cannot cross worker boundaries
    ClosureNotPortable,
    /// The declared result type can never cross worker boundaries
    ResultTypeNotPortable,
    /// A produced result value cannot cross worker boundaries
    ResultNotPortable,
    /// The computation itself raised an error
    Application,
    /// A shared primitive (counter, aggregator, token, queue) failed
    Resource,
}

/// Exception payload reported through the failure arm of a continuation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Fault classification
    kind: FaultKind,
    /// Human-readable description
    message: String,
}

impl Fault {
    /// Fault raised by the workflow computation itself
    #[must_use]
    pub fn application(message: impl Into<String>) -> Self {
        Self { kind: FaultKind::Application, message: message.into() }
    }

    /// Input enumeration failed before any job was scheduled
    #[must_use]
    pub fn enumeration(message: impl Into<String>) -> Self {
        Self { kind: FaultKind::Enumeration, message: message.into() }
    }

    /// A closure set cannot cross worker boundaries
    #[must_use]
    pub fn closure_not_portable(scope: &str) -> Self {
        Self {
            kind: FaultKind::ClosureNotPortable,
            message: format!("closure state in {} cannot cross worker boundaries", scope),
        }
    }

    /// The declared result type can never cross worker boundaries
    #[must_use]
    pub fn result_type_not_portable(type_name: &str) -> Self {
        Self {
            kind: FaultKind::ResultTypeNotPortable,
            message: format!("result type {} cannot cross worker boundaries", type_name),
        }
    }

    /// A produced result value cannot cross worker boundaries
    #[must_use]
    pub fn result_not_portable(detail: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::ResultNotPortable,
            message: format!("result of {} cannot cross worker boundaries", detail.into()),
        }
    }

    /// A shared primitive failed underneath the engine
    #[must_use]
    pub fn resource(message: impl Into<String>) -> Self {
        Self { kind: FaultKind::Resource, message: message.into() }
    }

    /// Fault classification
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Human-readable description
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Fault {}

/// Reason recorded when a computation resolves through the cancellation arm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationCause {
    /// Human-readable description
    message: String,
}

impl CancellationCause {
    /// Create a cancellation cause
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Cause recorded when a job observes its token set before starting
    #[must_use]
    pub fn token_set() -> Self {
        Self::new("cancellation token was set before the job started")
    }

    /// Human-readable description
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CancellationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Directive for the external scheduler on how to react to worker loss
///
/// Carried on every job; never interpreted by the combinator logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultPolicy {
    /// A lost job is not re-scheduled
    NoRetry,
    /// A lost job is re-scheduled up to the given number of attempts
    Retry {
        /// Maximum number of re-scheduling attempts
        max_attempts: u32,
    },
    /// A lost job is re-scheduled until it completes
    InfiniteRetry,
}

impl FaultPolicy {
    /// Maximum re-scheduling attempts, if bounded
    #[must_use]
    pub const fn max_attempts(&self) -> Option<u32> {
        match self {
            Self::NoRetry => Some(0),
            Self::Retry { max_attempts } => Some(*max_attempts),
            Self::InfiniteRetry => None,
        }
    }
}

impl Default for FaultPolicy {
    fn default() -> Self {
        Self::NoRetry
    }
}

impl fmt::Display for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRetry => write!(f, "no-retry"),
            Self::Retry { max_attempts } => write!(f, "retry(max {})", max_attempts),
            Self::InfiniteRetry => write!(f, "infinite-retry"),
        }
    }
}
