//! # API Error Type
//!
//! Unified error type for backend services.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tillpoint                              │
//! │                                                                         │
//! │  Service call                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ValidationError ──► rejected before any transaction opens             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError::Domain(CoreError) ──► ApiError::{NotFound, InsufficientStock, │
//! │       │                          TotalMismatch, DuplicateSku, ...}     │
//! │       │                          (ids re-encoded as public tokens)     │
//! │       ▼                                                                 │
//! │  DbError::{QueryFailed, ...} ──► error! with full context               │
//! │                                  ApiError::Persistence { operation }    │
//! │                                  client sees a generic message          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! Clients receive an [`ErrorBody`]:
//! ```json
//! {
//!   "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for Nasi Ayam: requested 1, available 0"
//! }
//! ```

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{error, warn};
use ts_rs::TS;

use tillpoint_core::{CoreError, IdCodec, Money, ValidationError};
use tillpoint_db::DbError;

/// Errors surfaced by backend services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or empty input, caught before any mutation.
    #[error("{0}")]
    Validation(String),

    /// Entity absent or owned by another tenant. `id` is the public token.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: i64,
        available: i64,
    },

    #[error("Total mismatch: claimed {claimed}, computed {computed}")]
    TotalMismatch { claimed: Money, computed: Money },

    #[error("SKU '{sku}' already exists")]
    DuplicateSku { sku: String },

    #[error("Request is not bound to a tenant")]
    MissingTenantScope,

    #[error("Invalid identifier: '{token}'")]
    InvalidToken { token: String },

    /// Bad credentials or an invalid/expired access token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The operation collides with existing records.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An atomic unit ran past its deadline and was rolled back.
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// Underlying store failure, tagged with the failing operation.
    #[error("{operation} failed: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: DbError,
    },

    /// Object storage failure.
    #[error("{operation} failed: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Not enough stock for a sale line (409)
    InsufficientStock,

    /// Claimed total differs from the computed one (422)
    TotalMismatch,

    /// SKU already used in this tenant (409)
    DuplicateSku,

    /// No tenant on the request (403)
    MissingTenantScope,

    /// Undecodable public identifier (400)
    InvalidTokenFormat,

    /// Authentication failed (401)
    Unauthorized,

    /// Conflicting state (409)
    Conflict,

    /// Deadline exceeded (503)
    Timeout,

    /// Store failure (500)
    PersistenceFailure,

    /// Object storage failure (502)
    StorageFailure,

    /// Internal server error (500)
    Internal,
}

/// Wire shape of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation(_) => ErrorCode::ValidationError,
            ApiError::NotFound { .. } => ErrorCode::NotFound,
            ApiError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            ApiError::TotalMismatch { .. } => ErrorCode::TotalMismatch,
            ApiError::DuplicateSku { .. } => ErrorCode::DuplicateSku,
            ApiError::MissingTenantScope => ErrorCode::MissingTenantScope,
            ApiError::InvalidToken { .. } => ErrorCode::InvalidTokenFormat,
            ApiError::Unauthorized(_) => ErrorCode::Unauthorized,
            ApiError::Conflict(_) => ErrorCode::Conflict,
            ApiError::Timeout { .. } => ErrorCode::Timeout,
            ApiError::Persistence { .. } => ErrorCode::PersistenceFailure,
            ApiError::Storage { .. } => ErrorCode::StorageFailure,
            ApiError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Message safe to show a client. Infrastructure details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Persistence { .. } => "Database operation failed".to_string(),
            ApiError::Storage { .. } => "Storage operation failed".to_string(),
            ApiError::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.client_message(),
        }
    }

    pub fn not_found(entity: &str, token: impl Into<String>) -> Self {
        ApiError::NotFound {
            entity: entity.to_string(),
            id: token.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    /// Converts a store error raised by `operation`.
    ///
    /// Row ids inside the error are re-encoded with `codec`; infrastructure
    /// failures are logged here with their full source.
    pub fn from_db(operation: &'static str, err: DbError, codec: &IdCodec) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::NotFound {
                entity,
                id: codec.encode_row_id(id),
            },
            DbError::Domain(core) => ApiError::from_core(core, codec),
            DbError::UniqueViolation { field, value } => {
                let column = field.rsplit('.').next().unwrap_or(&field).to_string();
                ApiError::Conflict(format!("{column} '{value}' already exists"))
            }
            DbError::ForeignKeyViolation { message } => {
                warn!(operation, %message, "Foreign key violation");
                ApiError::Conflict("Operation conflicts with existing records".to_string())
            }
            source => {
                error!(operation, error = %source, "Database operation failed");
                ApiError::Persistence { operation, source }
            }
        }
    }

    /// Converts a domain error, re-encoding any row ids it carries.
    pub fn from_core(err: CoreError, codec: &IdCodec) -> Self {
        match err {
            CoreError::EmptySale => ApiError::Validation(CoreError::EmptySale.to_string()),
            CoreError::ProductNotFound { id } => {
                ApiError::not_found("Product", codec.encode_row_id(id))
            }
            CoreError::SaleNotFound { id } => ApiError::not_found("Sale", codec.encode_row_id(id)),
            CoreError::TenantNotFound { id } => {
                ApiError::not_found("Tenant", codec.encode_row_id(id))
            }
            CoreError::InsufficientStock {
                product,
                requested,
                available,
            } => ApiError::InsufficientStock {
                product,
                requested,
                available,
            },
            CoreError::TotalMismatch { claimed, computed } => {
                ApiError::TotalMismatch { claimed, computed }
            }
            CoreError::DuplicateSku { sku } => ApiError::DuplicateSku { sku },
            CoreError::MissingTenantScope => ApiError::MissingTenantScope,
            CoreError::InvalidTokenFormat { token } => ApiError::InvalidToken { token },
            CoreError::Validation(v) => ApiError::Validation(v.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl Serialize for ApiError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body().serialize(serializer)
    }
}

/// Convenience type alias for Results with ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tillpoint_core::IdCodecConfig;

    fn codec() -> IdCodec {
        IdCodec::new(IdCodecConfig::with_salt("errors")).unwrap()
    }

    #[test]
    fn test_not_found_uses_public_token() {
        let codec = codec();
        let err = ApiError::from_db("get product", DbError::not_found("Product", 12), &codec);
        match &err {
            ApiError::NotFound { entity, id } => {
                assert_eq!(entity, "Product");
                assert_eq!(id, &codec.encode_row_id(12));
                assert_ne!(id, "12");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_domain_error_inside_unit() {
        let err = ApiError::from_db(
            "create sale",
            DbError::Domain(CoreError::InsufficientStock {
                product: "Nasi Ayam".to_string(),
                requested: 1,
                available: 0,
            }),
            &codec(),
        );
        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert_eq!(
            err.client_message(),
            "Insufficient stock for Nasi Ayam: requested 1, available 0"
        );
    }

    #[test]
    fn test_persistence_failure_is_generic() {
        let err = ApiError::from_db(
            "create sale",
            DbError::QueryFailed("disk I/O error at /var/lib/db".to_string()),
            &codec(),
        );
        assert_eq!(err.code(), ErrorCode::PersistenceFailure);
        assert_eq!(err.client_message(), "Database operation failed");
        assert!(err.to_string().contains("create sale"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unique_violation_names_column() {
        let err = ApiError::from_db(
            "register user",
            DbError::duplicate("users.username", "kasir01"),
            &codec(),
        );
        assert_eq!(err.client_message(), "Conflict: username 'kasir01' already exists");
    }

    #[test]
    fn test_serializes_as_body() {
        let json = serde_json::to_value(ApiError::MissingTenantScope).unwrap();
        assert_eq!(json["code"], "MISSING_TENANT_SCOPE");
        assert_eq!(json["message"], "Request is not bound to a tenant");
    }
}
