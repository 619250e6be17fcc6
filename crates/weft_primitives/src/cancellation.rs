//! Distributed cancellation tokens.
//!
//! A token is a node in a cancellation tree. Cancelling a node cancels all
//! descendants; children can never cancel their parents. Cancellation is
//! cooperative and one-directional: a set token only prevents new work that
//! checks it from starting.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_core::{CoreResult, TokenId};

/// Remotely shared cancellation state behind a token.
///
/// `cancel` and `is_cancelled` must be linearizable; an entry created under
/// an already-cancelled parent must start cancelled.
#[async_trait]
pub trait CancellationEntry: Send + Sync {
    /// Identifier of this entry.
    fn id(&self) -> TokenId;

    /// Whether the entry has been cancelled.
    async fn is_cancelled(&self) -> CoreResult<bool>;

    /// Cancel the entry and all entries derived from it.
    async fn cancel(&self) -> CoreResult<()>;
}

/// Factory for cancellation entries, supplied by the resource manager.
#[async_trait]
pub trait CancellationEntryFactory: Send + Sync {
    /// Create an entry linked under the given parent entries. An empty
    /// parent list creates a root entry.
    async fn create_entry(&self, parents: &[TokenId]) -> CoreResult<Arc<dyn CancellationEntry>>;
}

/// Hierarchical, remotely-observable cancellation flag.
///
/// The elevated flag records whether cancelling this token is allowed to
/// independently cancel a higher-level computation; its interpretation
/// belongs to the entry implementation.
#[derive(Clone)]
pub struct DistributedCancellationToken {
    entry: Arc<dyn CancellationEntry>,
    elevated: bool,
}

impl DistributedCancellationToken {
    /// Create a token as a child of the given parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the factory cannot resolve a parent or allocate
    /// the entry.
    pub async fn create(
        factory: &dyn CancellationEntryFactory,
        parents: &[DistributedCancellationToken],
        elevate: bool,
    ) -> CoreResult<Self> {
        let parent_ids: Vec<TokenId> = parents.iter().map(Self::id).collect();
        let entry = factory.create_entry(&parent_ids).await?;
        Ok(Self { entry, elevated: elevate })
    }

    /// Wrap an existing entry.
    #[must_use]
    pub fn from_entry(entry: Arc<dyn CancellationEntry>, elevated: bool) -> Self {
        Self { entry, elevated }
    }

    /// A token backed by purely local state, for contexts created outside
    /// any combinator (program entry points, tests).
    #[must_use]
    pub fn detached() -> Self {
        Self {
            entry: Arc::new(LocalEntry { id: TokenId::new(), cancelled: AtomicBool::new(false) }),
            elevated: false,
        }
    }

    /// Identifier of the underlying entry.
    #[must_use]
    pub fn id(&self) -> TokenId {
        self.entry.id()
    }

    /// Whether cancelling this token may cancel a higher-level computation.
    #[must_use]
    pub const fn is_elevated(&self) -> bool {
        self.elevated
    }

    /// Whether the token has been cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing entry is unreachable.
    pub async fn is_cancelled(&self) -> CoreResult<bool> {
        self.entry.is_cancelled().await
    }

    /// Cancel this token and all tokens derived from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing entry is unreachable.
    pub async fn cancel(&self) -> CoreResult<()> {
        self.entry.cancel().await
    }
}

impl std::fmt::Debug for DistributedCancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DistributedCancellationToken")
            .field("id", &self.id())
            .field("elevated", &self.elevated)
            .finish()
    }
}

/// Entry with no factory linkage; cancellation affects only itself.
struct LocalEntry {
    id: TokenId,
    cancelled: AtomicBool,
}

#[async_trait]
impl CancellationEntry for LocalEntry {
    fn id(&self) -> TokenId {
        self.id
    }

    async fn is_cancelled(&self) -> CoreResult<bool> {
        Ok(self.cancelled.load(Ordering::SeqCst))
    }

    async fn cancel(&self) -> CoreResult<()> {
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }
}
