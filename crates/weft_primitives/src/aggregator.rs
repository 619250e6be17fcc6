//! Result aggregator contract.

use async_trait::async_trait;
use weft_core::CoreResult;

use crate::computation::Payload;

/// Fixed-capacity, index-addressed result collection.
///
/// Slot index is the input index of the sub-computation, not its completion
/// order. The `all slots filled` transition is reported to exactly one
/// caller, which is thereby granted the right to materialize the snapshot
/// and drive the parent continuation.
#[async_trait]
pub trait ResultAggregator<T: Payload + Clone>: Send + Sync {
    /// Declared slot capacity.
    fn capacity(&self) -> usize;

    /// Write a slot. With `overwrite` false an occupied slot keeps its
    /// existing value. Returns `true` on the unique call that observes the
    /// transition to all-slots-filled.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is outside the declared capacity or the
    /// backing store is unreachable.
    async fn set_result(&self, index: usize, value: T, overwrite: bool) -> CoreResult<bool>;

    /// Number of slots currently filled.
    async fn filled(&self) -> CoreResult<usize>;

    /// Snapshot of all slots in input-index order.
    ///
    /// # Errors
    ///
    /// Returns an error if any slot is still empty.
    async fn to_vec(&self) -> CoreResult<Vec<T>>;
}
