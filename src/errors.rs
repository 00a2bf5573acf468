use sea_orm::error::{DbErr, RuntimeErr, SqlErr};
use sea_orm::sqlx;
use serde::Serialize;

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Maps a storage-level unique constraint violation onto `Conflict`,
    /// leaving every other database error untouched.
    pub fn from_unique_violation(error: DbErr, conflict_message: impl Into<String>) -> Self {
        match error.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Conflict(conflict_message.into())
            }
            _ => ServiceError::DatabaseError(error),
        }
    }

    /// Maps a storage-level CHECK constraint failure onto `InvariantViolation`.
    /// sea-orm has no structured variant for CHECK failures, so the driver's
    /// error code is consulted first and the message text second.
    pub fn from_check_violation(error: DbErr, message: impl Into<String>) -> Self {
        if is_check_violation(&error) {
            ServiceError::InvariantViolation(message.into())
        } else {
            ServiceError::DatabaseError(error)
        }
    }

    /// Stable machine-readable code, the single source of truth for any
    /// transport layer that needs to classify failures.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::InvariantViolation(_) => "invariant_violation",
            Self::ValidationError(_) => "validation_error",
            Self::EventError(_) => "event_error",
            Self::InternalError(_) | Self::Other(_) => "internal_error",
        }
    }

    /// True when the caller can fix the request; false for infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Conflict(_)
                | Self::InvariantViolation(_)
                | Self::ValidationError(_)
        )
    }

    /// Message safe to hand back to callers.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Postgres `check_violation`, SQLite `SQLITE_CONSTRAINT_CHECK`, MySQL `ER_CHECK_CONSTRAINT_VIOLATED`.
const CHECK_VIOLATION_CODES: [&str; 3] = ["23514", "275", "3819"];

fn is_check_violation(error: &DbErr) -> bool {
    let coded = match error {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => e
            .code()
            .is_some_and(|code| CHECK_VIOLATION_CODES.iter().any(|c| code == *c)),
        _ => false,
    };
    if coded {
        return true;
    }
    let text = error.to_string();
    text.contains("CHECK constraint failed") || text.contains("violates check constraint")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Portion {
        #[validate(range(min = 1, max = 10))]
        quantity: i32,
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ServiceError::NotFound("x".into()).error_code(), "not_found");
        assert_eq!(ServiceError::Conflict("x".into()).error_code(), "conflict");
        assert_eq!(
            ServiceError::InvariantViolation("x".into()).error_code(),
            "invariant_violation"
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).error_code(),
            "validation_error"
        );
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("boom".into())).error_code(),
            "database_error"
        );
    }

    #[test]
    fn only_domain_failures_are_client_errors() {
        assert!(ServiceError::Conflict("x".into()).is_client_error());
        assert!(ServiceError::InvariantViolation("x".into()).is_client_error());
        assert!(!ServiceError::DatabaseError(DbErr::Custom("boom".into())).is_client_error());
        assert!(!ServiceError::EventError("closed".into()).is_client_error());
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("relation does not exist".into())).response_message(),
            "Database error"
        );
        assert_eq!(
            ServiceError::InternalError("stack".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::NotFound("Client 7 not found".into()).response_message(),
            "Not found: Client 7 not found"
        );
    }

    #[test]
    fn validation_errors_convert() {
        let err: ServiceError = Portion { quantity: 11 }.validate().unwrap_err().into();
        assert!(matches!(err, ServiceError::ValidationError(msg) if msg.contains("quantity")));
    }

    #[test]
    fn non_unique_database_errors_pass_through() {
        let err = ServiceError::from_unique_violation(DbErr::Custom("x".into()), "dup");
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }

    #[test]
    fn check_failures_become_invariant_violations() {
        let sqlite = DbErr::Custom("CHECK constraint failed: current_quantity >= 0".into());
        assert!(matches!(
            ServiceError::from_check_violation(sqlite, "negative"),
            ServiceError::InvariantViolation(msg) if msg == "negative"
        ));
        let postgres = DbErr::Custom(
            "new row for relation \"inventory_items\" violates check constraint \"ck_quantity\"".into(),
        );
        assert!(matches!(
            ServiceError::from_check_violation(postgres, "negative"),
            ServiceError::InvariantViolation(_)
        ));
        let other = DbErr::Custom("disk I/O error".into());
        assert!(matches!(
            ServiceError::from_check_violation(other, "negative"),
            ServiceError::DatabaseError(_)
        ));
    }
}
