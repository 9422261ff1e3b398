//! Classification of sqlx errors raised by row statements.

use sqlx::error::ErrorKind;
use time2meet_core::error::AppError;

/// Map a failed row insert onto the engine's error classes.
///
/// Constraint violations keep the database's message so batch callers can
/// report which row broke which constraint.
#[must_use]
pub fn classify_row_error(err: &sqlx::Error) -> AppError {
    let sqlx::Error::Database(db) = err else {
        return AppError::internal("database error", err);
    };
    let detail = db
        .constraint()
        .map_or_else(|| db.message().to_string(), |c| format!("{c}: {}", db.message()));

    match db.kind() {
        ErrorKind::UniqueViolation => AppError::conflict_caused_by("unique constraint violated", detail),
        ErrorKind::ForeignKeyViolation => {
            AppError::conflict_caused_by("referenced row does not exist", detail)
        }
        ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
            AppError::validation(format!("constraint violated: {detail}"))
        }
        _ => AppError::internal("database error", detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time2meet_core::error::ErrorCode;

    #[test]
    fn non_database_errors_are_internal() {
        let err = classify_row_error(&sqlx::Error::RowNotFound);
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(err.message(), "database error");
    }

    #[test]
    fn pool_timeout_is_internal() {
        let err = classify_row_error(&sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), ErrorCode::Internal);
    }
}
