//! Ticket inventory statements run inside a caller's transaction.

use crate::store::{PgTx, PostgresStore};
use chrono::{DateTime, Utc};
use std::time::Instant;
use time2meet_core::error::{AppError, Result};
use time2meet_core::ids::{TicketId, TicketTypeId};
use time2meet_core::money::Capacity;
use time2meet_core::store::{NewTicket, TicketInventory};
use uuid::Uuid;

impl TicketInventory<PgTx> for PostgresStore {
    async fn lock_ticket_type_for_update(
        &self,
        tx: &mut PgTx,
        ticket_type_id: TicketTypeId,
    ) -> Result<Capacity> {
        let started = Instant::now();

        // Blocks while another transaction holds the row.
        let row: Option<(i32, i32)> = sqlx::query_as(
            "SELECT quantity_total, quantity_sold FROM ticket_types WHERE id = $1 FOR UPDATE",
        )
        .bind(ticket_type_id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::internal("lock ticket type failed", e))?;

        metrics::histogram!("ticketing_ticket_type_lock_wait_seconds")
            .record(started.elapsed().as_secs_f64());

        let (quantity_total, quantity_sold) =
            row.ok_or_else(|| AppError::not_found("ticket type not found"))?;
        Capacity::from_storage(quantity_total, quantity_sold)
    }

    async fn insert_paid_ticket(&self, tx: &mut PgTx, ticket: NewTicket) -> Result<TicketId> {
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO tickets (ticket_type_id, buyer_id, purchase_date, status, qr_code, amount_paid)
            VALUES ($1, $2, $3, 'paid', $4, $5)
            RETURNING id
            ",
        )
        .bind(ticket.ticket_type_id.as_uuid())
        .bind(ticket.buyer_id.as_uuid())
        .bind(ticket.purchased_at)
        .bind(&ticket.qr_code)
        .bind(ticket.amount_paid.amount())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::internal("insert ticket failed", e))?;

        Ok(TicketId::from_uuid(id))
    }

    async fn mark_ticket_used(
        &self,
        tx: &mut PgTx,
        ticket_id: TicketId,
        used_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE tickets SET status = 'used', used_at = $1 WHERE id = $2 AND status IN ('paid', 'used')",
        )
        .bind(used_at)
        .bind(ticket_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::internal("validate ticket failed", e))?;

        Ok(result.rows_affected() > 0)
    }
}
