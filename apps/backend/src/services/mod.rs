//! Backend services.
//!
//! Each service holds the shared [`AppState`](crate::AppState). Tenant-bound
//! operations take a `&TenantScope`; tenant management takes a
//! `&PlatformScope`. Public tokens are decoded here, before any store call.

pub mod auth_service;
pub mod product_service;
pub mod report_service;
pub mod sale_service;
pub mod tenant_service;

pub use auth_service::{AuthService, RegisterUserInput};
pub use product_service::ProductService;
pub use report_service::ReportService;
pub use sale_service::{CreateSaleInput, SaleItemInput, SaleService};
pub use tenant_service::TenantService;

use crate::error::{ApiError, ApiResult};
use tillpoint_core::IdCodec;

/// Decodes a public token into a row id.
pub(crate) fn decode_id(codec: &IdCodec, token: &str) -> ApiResult<i64> {
    codec
        .decode_row_id(token.trim())
        .map_err(|e| ApiError::from_core(e, codec))
}
