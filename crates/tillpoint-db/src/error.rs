//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          CoreError raised inside a unit     │
//! │       │                              (InsufficientStock, ...)           │
//! │       ▼                                      │                          │
//! │  DbError (this module) ◄─────────────────────┘                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/backend) ← stable code + client-safe message            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use tillpoint_core::CoreError;

/// Database operation errors.
///
/// Store failures are wrapped with enough context to log; domain failures
/// detected while a transaction is open travel as [`DbError::Domain`] so the
/// caller can roll back and still report the precise reason.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found (or not visible to the calling tenant).
    ///
    /// ## When This Occurs
    /// - Row id doesn't exist
    /// - Row belongs to another tenant
    /// - Update/delete affected zero rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: i64 },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate username
    /// - Any UNIQUE index not mapped to a domain error by the repository
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a product that committed sale lines reference
    /// - Referencing a tenant that doesn't exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed (including CHECK and trigger aborts).
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin/commit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored value could not be mapped back into a domain type.
    #[error("Internal database error: {0}")]
    Internal(String),

    /// Domain rule violated while the unit of work was open.
    #[error(transparent)]
    Domain(#[from] CoreError),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and row id.
    pub fn not_found(entity: impl Into<String>, id: i64) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id,
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for a UNIQUE constraint failure involving `column` (`table.column`).
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.contains(column))
    }

    /// Wraps a failed `begin`/`commit`.
    pub(crate) fn transaction(err: sqlx::Error) -> Self {
        DbError::TransactionFailed(err.to_string())
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::Internal (repositories use fetch_optional)
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // UNIQUE: "UNIQUE constraint failed: products.tenant_id, products.sku"
                // FK:     "FOREIGN KEY constraint failed"
                if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: columns.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::ColumnDecode { index, source } => {
                DbError::Internal(format!("column {index}: {source}"))
            }

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_matching() {
        let err = DbError::duplicate("products.tenant_id, products.sku", "NAS001");
        assert!(err.is_unique_violation_on("products.sku"));
        assert!(!err.is_unique_violation_on("users.username"));
    }

    #[test]
    fn test_domain_errors_display_transparently() {
        let err: DbError = CoreError::EmptySale.into();
        assert_eq!(err.to_string(), CoreError::EmptySale.to_string());
    }
}
