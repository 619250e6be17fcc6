//! In-memory result aggregator.

use async_trait::async_trait;
use tokio::sync::Mutex;
use weft_core::{CoreError, CoreResult};
use weft_primitives::{Payload, ResultAggregator};

struct AggregatorInner<T> {
    slots: Vec<Option<T>>,
    completion_latched: bool,
}

/// Aggregator backed by a mutex-guarded slot vector.
///
/// The all-slots-filled transition is latched so exactly one `set_result`
/// call observes it, no matter how writes interleave.
pub struct InMemoryAggregator<T> {
    capacity: usize,
    inner: Mutex<AggregatorInner<T>>,
}

impl<T> InMemoryAggregator<T> {
    /// Create an aggregator with the given slot capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            capacity,
            inner: Mutex::new(AggregatorInner { slots, completion_latched: false }),
        }
    }
}

#[async_trait]
impl<T: Payload + Clone> ResultAggregator<T> for InMemoryAggregator<T> {
    fn capacity(&self) -> usize {
        self.capacity
    }

    async fn set_result(&self, index: usize, value: T, overwrite: bool) -> CoreResult<bool> {
        let mut inner = self.inner.lock().await;

        if index >= self.capacity {
            return Err(CoreError::SlotOutOfRange { index, capacity: self.capacity });
        }

        if inner.slots[index].is_none() || overwrite {
            inner.slots[index] = Some(value);
        }

        let all_filled = inner.slots.iter().all(Option::is_some);
        if all_filled && !inner.completion_latched {
            inner.completion_latched = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn filled(&self) -> CoreResult<usize> {
        let inner = self.inner.lock().await;
        Ok(inner.slots.iter().filter(|slot| slot.is_some()).count())
    }

    async fn to_vec(&self) -> CoreResult<Vec<T>> {
        let inner = self.inner.lock().await;
        let filled = inner.slots.iter().filter(|slot| slot.is_some()).count();
        if filled < self.capacity {
            return Err(CoreError::Incomplete { filled, capacity: self.capacity });
        }
        Ok(inner.slots.iter().flatten().cloned().collect())
    }
}
