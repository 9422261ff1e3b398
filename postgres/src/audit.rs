//! Transaction-local audit stamp read by the audit triggers.

use crate::store::{PgTx, PostgresStore};
use time2meet_core::error::{AppError, Result};
use time2meet_core::ids::UserId;
use time2meet_core::store::AuditContextSetter;

impl AuditContextSetter<PgTx> for PostgresStore {
    async fn stamp(&self, tx: &mut PgTx, actor_id: UserId, origin_address: &str) -> Result<()> {
        // is_local = true: the setting dies with the transaction.
        if !actor_id.is_nil() {
            sqlx::query("SELECT set_config('app.user_id', $1, true)")
                .bind(actor_id.to_string())
                .execute(&mut **tx)
                .await
                .map_err(|e| AppError::internal("set audit user_id failed", e))?;
        }
        if !origin_address.is_empty() {
            sqlx::query("SELECT set_config('app.ip', $1, true)")
                .bind(origin_address)
                .execute(&mut **tx)
                .await
                .map_err(|e| AppError::internal("set audit ip failed", e))?;
        }
        Ok(())
    }
}
