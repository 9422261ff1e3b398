//! Unit-of-Work: one transaction around one caller-supplied callback.
//!
//! ```text
//! begin ──► f(&mut tx) ──Ok──► commit ──► Ok(value)
//!   │            │                │
//!   │           Err / deadline    └─fail─► Unavailable
//!   │            ▼
//!   │        rollback ──► Err(original error)
//!   └─fail─► Unavailable
//! ```
//!
//! A panic inside `f`, or dropping the returned future, unwinds past the
//! local transaction handle; the handle's drop guard rolls it back. There is
//! no exit path that leaves a transaction open.
//!
//! Nesting is not supported: code running inside `f` must use save-points
//! (see [`crate::batch`]) rather than calling `with_transaction` again.

use crate::error::{AppError, ErrorCode, Result};
use crate::store::TransactionalStore;
use futures::future::BoxFuture;
use std::time::Duration;

/// Transaction manager over a [`TransactionalStore`].
#[derive(Debug, Clone)]
pub struct UnitOfWork<S> {
    store: S,
    deadline: Option<Duration>,
}

impl<S: TransactionalStore> UnitOfWork<S> {
    /// Create a unit of work without a transaction deadline.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            store,
            deadline: None,
        }
    }

    /// Abandon (roll back) any transaction whose callback runs longer than
    /// `deadline`. A zero duration disables the deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = (!deadline.is_zero()).then_some(deadline);
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Run `f` inside a fresh transaction.
    ///
    /// Commits if `f` returns `Ok`, rolls back and returns the error
    /// unchanged if it returns `Err`.
    ///
    /// # Errors
    ///
    /// - Whatever `f` returns
    /// - [`AppError::Unavailable`] if the transaction cannot be started or
    ///   committed, or if the deadline elapses
    pub async fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut S::Tx) -> BoxFuture<'t, Result<T>> + Send,
    {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| lifecycle_error("begin tx failed", e))?;

        let outcome = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, f(&mut tx))
                .await
                .unwrap_or_else(|elapsed| {
                    Err(AppError::unavailable("transaction deadline exceeded", elapsed))
                }),
            None => f(&mut tx).await,
        };

        match outcome {
            Ok(value) => {
                self.store
                    .commit(tx)
                    .await
                    .map_err(|e| lifecycle_error("commit failed", e))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    tracing::warn!(
                        error = %rollback_err.row_message(),
                        original = %err,
                        "Rollback failed; transaction will be discarded by the connection"
                    );
                }
                tracing::debug!(code = %err.code(), error = %err, "Transaction rolled back");
                Err(err)
            }
        }
    }
}

/// Begin/commit failures surface as [`AppError::Unavailable`]. A store that
/// already reports `Unavailable` is passed through as-is.
fn lifecycle_error(message: &str, err: AppError) -> AppError {
    if err.code() == ErrorCode::Unavailable {
        err
    } else {
        AppError::unavailable(message, err.row_message())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts lifecycle calls.
    #[derive(Default)]
    struct CountingStore {
        begins: AtomicUsize,
        commits: AtomicUsize,
        rollbacks: AtomicUsize,
        fail_begin: bool,
        fail_commit: bool,
    }

    struct CountingTx {
        writes: Vec<&'static str>,
    }

    impl TransactionalStore for Arc<CountingStore> {
        type Tx = CountingTx;

        async fn begin(&self) -> Result<CountingTx> {
            if self.fail_begin {
                return Err(AppError::unavailable("begin tx failed", "connection refused"));
            }
            self.begins.fetch_add(1, Ordering::SeqCst);
            Ok(CountingTx { writes: Vec::new() })
        }

        async fn commit(&self, _tx: CountingTx) -> Result<()> {
            if self.fail_commit {
                return Err(AppError::internal("commit", "connection reset"));
            }
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(&self, _tx: CountingTx) -> Result<()> {
            self.rollbacks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn commits_on_success() {
        let store = Arc::new(CountingStore::default());
        let uow = UnitOfWork::new(Arc::clone(&store));

        let n = uow
            .with_transaction(|tx| {
                Box::pin(async move {
                    tx.writes.push("insert");
                    Ok(tx.writes.len())
                })
            })
            .await
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(store.commits.load(Ordering::SeqCst), 1);
        assert_eq!(store.rollbacks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rolls_back_and_propagates_error_unchanged() {
        let store = Arc::new(CountingStore::default());
        let uow = UnitOfWork::new(Arc::clone(&store));

        let err = uow
            .with_transaction(|_tx| Box::pin(async move { Err::<(), _>(AppError::conflict("sold out")) }))
            .await
            .unwrap_err();

        assert_eq!(err, AppError::conflict("sold out"));
        assert_eq!(store.commits.load(Ordering::SeqCst), 0);
        assert_eq!(store.rollbacks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn commit_failure_is_unavailable() {
        let store = Arc::new(CountingStore {
            fail_commit: true,
            ..CountingStore::default()
        });
        let uow = UnitOfWork::new(Arc::clone(&store));

        let err = uow
            .with_transaction(|_tx| Box::pin(async move { Ok(()) }))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::Unavailable);
        assert_eq!(err.message(), "commit failed");
        assert_eq!(err.cause(), Some("commit: connection reset"));
    }

    #[tokio::test]
    async fn unavailable_begin_is_not_wrapped_twice() {
        let store = Arc::new(CountingStore {
            fail_begin: true,
            ..CountingStore::default()
        });
        let uow = UnitOfWork::new(Arc::clone(&store));

        let err = uow
            .with_transaction(|_tx| Box::pin(async move { Ok(()) }))
            .await
            .unwrap_err();

        assert_eq!(err, AppError::unavailable("begin tx failed", "connection refused"));
        assert_eq!(store.begins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deadline_rolls_back() {
        let store = Arc::new(CountingStore::default());
        let uow = UnitOfWork::new(Arc::clone(&store)).with_deadline(Duration::from_millis(20));

        let err = uow
            .with_transaction(|_tx| {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.message(), "transaction deadline exceeded");
        assert_eq!(store.rollbacks.load(Ordering::SeqCst), 1);
        assert_eq!(store.commits.load(Ordering::SeqCst), 0);
    }
}
