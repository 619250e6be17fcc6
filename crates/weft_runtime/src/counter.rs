//! In-memory distributed counter.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use weft_core::CoreResult;
use weft_primitives::DistributedCounter;

/// Counter backed by a process-local atomic.
#[derive(Debug)]
pub struct InMemoryCounter {
    value: AtomicU64,
}

impl InMemoryCounter {
    /// Create a counter starting at `initial`.
    #[must_use]
    pub const fn new(initial: u64) -> Self {
        Self { value: AtomicU64::new(initial) }
    }
}

#[async_trait]
impl DistributedCounter for InMemoryCounter {
    async fn increment(&self) -> CoreResult<u64> {
        Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn value(&self) -> CoreResult<u64> {
        Ok(self.value.load(Ordering::SeqCst))
    }
}
