//! Bulk ingestion of users, events and tickets.
//!
//! Each call is one transaction: stamp the audit context, then run the
//! save-point importer over the items. In stop mode (`continue_on_error =
//! false`) the first failed row rolls the whole transaction back.

use crate::metrics;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time2meet_core::batch::{
    BatchImporter, BatchResult, ImportEventItem, ImportItem, ImportTicketItem, ImportUserItem,
    RowInserter, Savepoints,
};
use time2meet_core::error::Result;
use time2meet_core::ids::UserId;
use time2meet_core::store::{AuditContextSetter, TransactionalStore};
use time2meet_core::unit_of_work::UnitOfWork;

/// Batch input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest<I> {
    /// Audited actor; nil for anonymous imports
    #[serde(default)]
    pub actor_id: UserId,
    /// Caller's network address; empty when unknown
    #[serde(default)]
    pub origin_address: String,
    /// Keep going after a failed row instead of aborting
    #[serde(default)]
    pub continue_on_error: bool,
    /// Rows, imported in order
    pub items: Vec<I>,
}

/// Batch import use case.
pub struct BatchImport<S: TransactionalStore> {
    uow: UnitOfWork<S>,
}

impl<S> BatchImport<S>
where
    S: TransactionalStore + AuditContextSetter<S::Tx> + Savepoints<S::Tx> + Clone + 'static,
{
    /// Create the use case over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self {
            uow: UnitOfWork::new(store),
        }
    }

    /// Roll back imports that run longer than `deadline` (zero disables).
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.uow = self.uow.with_deadline(deadline);
        self
    }

    /// Import user accounts.
    ///
    /// # Errors
    ///
    /// See [`Self::import`].
    pub async fn import_users(&self, request: BatchRequest<ImportUserItem>) -> Result<BatchResult>
    where
        S: RowInserter<S::Tx, <ImportUserItem as ImportItem>::Row>,
    {
        self.import(request).await
    }

    /// Import events.
    ///
    /// # Errors
    ///
    /// See [`Self::import`].
    pub async fn import_events(&self, request: BatchRequest<ImportEventItem>) -> Result<BatchResult>
    where
        S: RowInserter<S::Tx, <ImportEventItem as ImportItem>::Row>,
    {
        self.import(request).await
    }

    /// Import tickets.
    ///
    /// # Errors
    ///
    /// See [`Self::import`].
    pub async fn import_tickets(&self, request: BatchRequest<ImportTicketItem>) -> Result<BatchResult>
    where
        S: RowInserter<S::Tx, <ImportTicketItem as ImportItem>::Row>,
    {
        self.import(request).await
    }

    /// Import any batch kind in one transaction.
    ///
    /// An empty batch opens no transaction.
    ///
    /// # Errors
    ///
    /// - [`AppError::Conflict`](time2meet_core::AppError::Conflict) on the
    ///   first failed row in stop mode; nothing from the batch is kept
    /// - [`AppError::Internal`](time2meet_core::AppError::Internal) if the
    ///   audit stamp or save-point bookkeeping fails
    /// - [`AppError::Unavailable`](time2meet_core::AppError::Unavailable) if
    ///   the transaction cannot begin or commit
    #[tracing::instrument(
        skip(self, request),
        fields(
            kind = %I::KIND,
            rows = request.items.len(),
            continue_on_error = request.continue_on_error,
            actor_id = %request.actor_id,
        )
    )]
    pub async fn import<I>(&self, request: BatchRequest<I>) -> Result<BatchResult>
    where
        I: ImportItem + 'static,
        S: RowInserter<S::Tx, I::Row>,
    {
        let kind = I::KIND.as_str();
        let rows = request.items.len();
        if rows == 0 {
            return Ok(BatchResult::new(0));
        }

        let store = self.uow.store().clone();
        let BatchRequest {
            actor_id,
            origin_address,
            continue_on_error,
            items,
        } = request;

        let outcome = self
            .uow
            .with_transaction(move |tx| {
                Box::pin(async move {
                    store.stamp(tx, actor_id, origin_address.trim()).await?;
                    BatchImporter::new(store)
                        .import_rows(tx, &items, continue_on_error)
                        .await
                })
            })
            .await;

        match &outcome {
            Ok(result) => {
                metrics::record_batch_rows(kind, "inserted", result.success);
                metrics::record_batch_rows(kind, "failed", result.failed);
                tracing::info!(
                    total = result.total,
                    success = result.success,
                    failed = result.failed,
                    "Batch import committed"
                );
            }
            Err(e) => {
                metrics::record_batch_rows(kind, "rolled_back", rows);
                tracing::warn!(code = %e.code(), error = %e, cause = ?e.cause(), "Batch import rolled back");
            }
        }
        outcome
    }
}
