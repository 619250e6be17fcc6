//! In-memory cancellation entries.
//!
//! Entries form a tree through the factory's registry: each entry holds
//! strong references to the children derived from it, and cancelling an
//! entry cascades down that subtree. Creating an entry under a cancelled
//! parent yields an entry that starts cancelled.

use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use weft_core::{CoreError, CoreResult, TokenId};
use weft_primitives::{CancellationEntry, CancellationEntryFactory};

/// Cancellation entry backed by process-local state.
pub struct InMemoryCancellationEntry {
    id: TokenId,
    cancelled: AtomicBool,
    children: Mutex<Vec<Arc<InMemoryCancellationEntry>>>,
}

impl InMemoryCancellationEntry {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            id: TokenId::new(),
            cancelled: AtomicBool::new(false),
            children: Mutex::new(Vec::new()),
        })
    }

    fn is_cancelled_now(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn cancel_now(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let children = match self.children.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for child in children {
            child.cancel_now();
        }
    }

    fn attach_child(&self, child: Arc<Self>) {
        match self.children.lock() {
            Ok(mut guard) => guard.push(child.clone()),
            Err(poisoned) => poisoned.into_inner().push(child.clone()),
        }
        // parent may have been cancelled while the child was being linked
        if self.is_cancelled_now() {
            child.cancel_now();
        }
    }
}

#[async_trait]
impl CancellationEntry for InMemoryCancellationEntry {
    fn id(&self) -> TokenId {
        self.id
    }

    async fn is_cancelled(&self) -> CoreResult<bool> {
        Ok(self.is_cancelled_now())
    }

    async fn cancel(&self) -> CoreResult<()> {
        self.cancel_now();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryCancellationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCancellationEntry")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled_now())
            .finish()
    }
}

/// Factory handing out tree-linked in-memory entries.
#[derive(Default)]
pub struct InMemoryCancellationFactory {
    entries: RwLock<IndexMap<TokenId, Arc<InMemoryCancellationEntry>>>,
}

impl InMemoryCancellationFactory {
    /// Create an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries created through this factory.
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CancellationEntryFactory for InMemoryCancellationFactory {
    async fn create_entry(&self, parents: &[TokenId]) -> CoreResult<Arc<dyn CancellationEntry>> {
        let entry = InMemoryCancellationEntry::new();

        {
            let registry = self.entries.read().await;
            for parent_id in parents {
                let parent = registry.get(parent_id).ok_or_else(|| CoreError::EntryNotFound {
                    id: parent_id.to_string(),
                })?;
                parent.attach_child(entry.clone());
            }
        }

        self.entries.write().await.insert(entry.id, entry.clone());
        Ok(entry)
    }
}
