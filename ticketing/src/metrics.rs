//! Business metrics for the ticketing engine.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `ticketing_tickets_sold_total` - Tickets sold by committed purchases
//! - `ticketing_purchase_rejections_total{reason}` - Purchases refused
//!   (`validation`, `sold_out`, `not_found`)
//! - `ticketing_tickets_validated_total` - Successful ticket validations
//! - `ticketing_batch_rows_total{kind, outcome}` - Batch rows by entity and
//!   outcome (`inserted`, `failed`, `rolled_back`)
//!
//! ## Histograms
//! - `ticketing_ticket_type_lock_wait_seconds` - Time spent acquiring the
//!   ticket type row lock

use metrics::{describe_counter, describe_histogram};

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "ticketing_tickets_sold_total",
        "Total number of tickets sold"
    );
    describe_counter!(
        "ticketing_purchase_rejections_total",
        "Purchases refused, by reason (validation, sold_out, not_found)"
    );
    describe_counter!(
        "ticketing_tickets_validated_total",
        "Total number of successful ticket validations"
    );
    describe_counter!(
        "ticketing_batch_rows_total",
        "Batch import rows by kind and outcome (inserted, failed, rolled_back)"
    );
    describe_histogram!(
        "ticketing_ticket_type_lock_wait_seconds",
        "Time spent waiting for the ticket type row lock"
    );

    tracing::info!("Business metrics registered");
}

/// Record a committed purchase.
pub fn record_ticket_sold() {
    metrics::counter!("ticketing_tickets_sold_total").increment(1);
}

/// Record a refused purchase.
pub fn record_purchase_rejected(reason: &'static str) {
    metrics::counter!("ticketing_purchase_rejections_total", "reason" => reason).increment(1);
    tracing::debug!(reason, "Recorded purchase_rejected metric");
}

/// Record a committed validation.
pub fn record_ticket_validated() {
    metrics::counter!("ticketing_tickets_validated_total").increment(1);
}

/// Record batch rows for one outcome.
pub fn record_batch_rows(kind: &'static str, outcome: &'static str, rows: usize) {
    if rows == 0 {
        return;
    }
    metrics::counter!("ticketing_batch_rows_total", "kind" => kind, "outcome" => outcome)
        .increment(u64::try_from(rows).unwrap_or(u64::MAX));
}
