//! # InviteMe Runtime
//!
//! Serialization layer that turns the synchronous registry state machines
//! into shared services.
//!
//! The core crate's `InviteRegistry` and `RegistryFactory` take `&mut self`
//! for every mutating operation; [`Store`] is the one place that hands out
//! that `&mut`. It holds state behind a `tokio::sync::RwLock`, so:
//!
//! - Mutations ([`Store::execute`]) take the write lock: concurrent callers
//!   are totally ordered by lock acquisition, an admitted operation always
//!   runs to completion, and nothing is observable until it returns. The
//!   registry operations themselves are validate-then-commit, so a rejected
//!   operation leaves the state byte-identical.
//! - Reads ([`Store::query`]) take the read lock: they run concurrently with
//!   each other and observe a consistent snapshot relative to the serialized
//!   mutation order; an in-flight mutation is never visible.
//!
//! There is no cancellation or timeout at this layer; retry policy belongs to
//! the caller.
//!
//! ## Example
//!
//! ```ignore
//! let store = Store::new(InviteRegistry::new(env));
//!
//! let event_id = store
//!     .execute(|registry| {
//!         registry.create_event(&host, "Party", date, "Loc", 50, false)
//!     })
//!     .await??;
//!
//! let owner = store
//!     .query(|registry| registry.owner_of(token_id).cloned())
//!     .await?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from the store itself; domain failures travel inside the closure's
/// return value, not here.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The store is shutting down and not admitting new mutations
    #[error("store is shutting down")]
    ShutdownInProgress,
}

/// Shared, serialized access to one piece of registry state.
///
/// Cloning the store clones the handle, not the state; all clones point at
/// the same instance.
pub struct Store<S> {
    state: Arc<RwLock<S>>,
    shutdown: Arc<AtomicBool>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<S> Store<S>
where
    S: Send + Sync + 'static,
{
    /// Wraps an initial state in a store
    #[must_use]
    pub fn new(initial_state: S) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial_state)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs one mutating operation under the write lock.
    ///
    /// The closure's return value is handed back untouched; registry
    /// operations return their own `Result`, so the usual call site is
    /// `store.execute(...).await??`.
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownInProgress`] once [`begin_shutdown`](Self::begin_shutdown)
    /// has been called. Operations admitted before that still run to
    /// completion.
    pub async fn execute<T>(&self, operation: impl FnOnce(&mut S) -> T) -> Result<T, StoreError> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(StoreError::ShutdownInProgress);
        }
        let mut state = self.state.write().await;
        Ok(operation(&mut state))
    }

    /// Runs one read-only closure under the read lock. Reads stay available
    /// during shutdown so collaborators can drain.
    pub async fn query<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let state = self.state.read().await;
        f(&state)
    }

    /// Clones the entire current state.
    pub async fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.query(Clone::clone).await
    }

    /// Stops admitting new mutations. Idempotent.
    pub fn begin_shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            tracing::info!("store shutdown initiated");
        }
    }

    /// Whether shutdown has been initiated
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl<S> std::fmt::Debug for Store<S>
where
    S: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("shutting_down", &self.is_shutting_down())
            .finish_non_exhaustive()
    }
}
