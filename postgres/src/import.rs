//! Save-point bookkeeping and per-entity row inserts for batch import.

use crate::error::classify_row_error;
use crate::store::{PgTx, PostgresStore};
use time2meet_core::batch::{NewEventRow, NewTicketRow, NewUserRow, RowInserter, Savepoints};
use time2meet_core::error::{AppError, Result};

/// Save-point names are spliced into SQL, so only plain identifiers pass.
fn checked_identifier(name: &str) -> Result<&str> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(AppError::internal(
            "invalid savepoint name",
            format!("{name:?}"),
        ))
    }
}

impl Savepoints<PgTx> for PostgresStore {
    async fn savepoint(&self, tx: &mut PgTx, name: &str) -> Result<()> {
        let name = checked_identifier(name)?;
        sqlx::query(&format!("SAVEPOINT {name}"))
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::internal("savepoint failed", e))?;
        Ok(())
    }

    async fn rollback_to_savepoint(&self, tx: &mut PgTx, name: &str) -> Result<()> {
        let name = checked_identifier(name)?;
        sqlx::query(&format!("ROLLBACK TO SAVEPOINT {name}"))
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::internal("rollback to savepoint failed", e))?;
        Ok(())
    }

    async fn release_savepoint(&self, tx: &mut PgTx, name: &str) -> Result<()> {
        let name = checked_identifier(name)?;
        sqlx::query(&format!("RELEASE SAVEPOINT {name}"))
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::internal("release savepoint failed", e))?;
        Ok(())
    }
}

impl RowInserter<PgTx, NewUserRow> for PostgresStore {
    async fn insert_row(&self, tx: &mut PgTx, row: &NewUserRow) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (email, password_hash, full_name, phone, role, is_active)
            VALUES ($1, $2, $3, $4, $5, true)
            ",
        )
        .bind(row.email.as_str())
        .bind(&row.password_hash)
        .bind(&row.full_name)
        .bind(row.phone.as_deref())
        .bind(row.role.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| classify_row_error(&e))?;
        Ok(())
    }
}

impl RowInserter<PgTx, NewEventRow> for PostgresStore {
    async fn insert_row(&self, tx: &mut PgTx, row: &NewEventRow) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO events (organizer_id, title, description, status, is_public, max_participants, cover_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(row.organizer_id.as_uuid())
        .bind(&row.title)
        .bind(row.description.as_deref())
        .bind(row.status.as_str())
        .bind(row.is_public)
        .bind(row.max_participants)
        .bind(row.cover_image.as_deref())
        .execute(&mut **tx)
        .await
        .map_err(|e| classify_row_error(&e))?;
        Ok(())
    }
}

impl RowInserter<PgTx, NewTicketRow> for PostgresStore {
    async fn insert_row(&self, tx: &mut PgTx, row: &NewTicketRow) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO tickets (ticket_type_id, buyer_id, purchase_date, status, qr_code, amount_paid)
            VALUES ($1, $2, COALESCE($3, NOW()), $4, $5, $6)
            ",
        )
        .bind(row.ticket_type_id.as_uuid())
        .bind(row.buyer_id.as_uuid())
        .bind(row.purchase_date)
        .bind(row.status.as_str())
        .bind(&row.qr_code)
        .bind(row.amount_paid.amount())
        .execute(&mut **tx)
        .await
        .map_err(|e| classify_row_error(&e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(checked_identifier("sp_item").is_ok());
        assert!(checked_identifier("_sp2").is_ok());
    }

    #[test]
    fn rejects_anything_that_could_alter_the_statement() {
        for bad in ["", "sp item", "sp;DROP TABLE users", "Sp", "1sp", "sp-item"] {
            assert!(checked_identifier(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
