//! Distributed atomic counter contract.

use async_trait::async_trait;
use weft_core::CoreResult;

/// Remotely shared integer supporting only atomic increment-and-return.
///
/// No two increments ever observe the same returned value. This uniqueness
/// is the only arbitration primitive the engine relies on: whichever racing
/// caller observes the value `1` holds exclusive ownership of whatever the
/// race guards.
#[async_trait]
pub trait DistributedCounter: Send + Sync {
    /// Atomically increment and return the new value.
    async fn increment(&self) -> CoreResult<u64>;

    /// Current value, for observation only; never use this for arbitration.
    async fn value(&self) -> CoreResult<u64>;
}
