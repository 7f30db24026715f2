//! # Tillpoint Backend
//!
//! Service layer of the multi-tenant point-of-sale backend. A transport
//! layer (HTTP router, RPC server) resolves the caller, then calls these
//! services; routing itself lives outside this crate.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Backend Services                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  AuthService   │  │ ProductService │  │  SaleService               ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • get / list   │  │ • create_sale (atomic)     ││
//! │  │ • resolve_scope│  │ • create/update│  │ • get_sale / list_sales    ││
//! │  │ • register_user│  │ • stock, images│  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │ TenantService  │  │ ReportService  │                                │
//! │  │ (PlatformScope)│  │ • sales_report │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │   SQLite     │  │ ObjectStore  │  │ JWT + IdCodec            ││  │
//! │  │  │ tillpoint-db │  │ images       │  │ tokens, public ids       ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::AppConfig`]. Required: `JWT_SECRET`, `ADMIN_USERNAME`,
//! `ADMIN_PASSWORD_HASH`, `ID_SALT`.

pub mod auth;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;
pub mod telemetry;
pub mod views;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::auth::{AdminGuard, JwtManager};
use crate::services::{AuthService, ProductService, ReportService, SaleService, TenantService};
use crate::storage::ObjectStore;
use tillpoint_core::IdCodec;
use tillpoint_db::{Database, DbError};

// Re-exports
pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorBody, ErrorCode};

/// Failure while assembling the application state.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database initialization failed: {0}")]
    Database(#[from] DbError),
}

/// Shared application state.
///
/// Nothing request-specific lives here; the tenant scope is built per
/// request and passed explicitly into every service call.
pub struct AppState {
    pub db: Database,
    pub codec: IdCodec,
    pub config: AppConfig,
    pub jwt: JwtManager,
    pub admin: AdminGuard,
    pub store: Arc<dyn ObjectStore>,
}

impl AppState {
    /// Assembles state around an already opened database.
    pub fn new(
        config: AppConfig,
        db: Database,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Arc<Self>, ConfigError> {
        let codec = config.id_codec()?;
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_expiry_secs);
        let admin = AdminGuard::new(
            config.admin_username.clone(),
            config.admin_password_hash.clone(),
        );

        Ok(Arc::new(AppState {
            db,
            codec,
            config,
            jwt,
            admin,
            store,
        }))
    }

    /// Opens the configured database (running migrations) and assembles state.
    pub async fn connect(
        config: AppConfig,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Arc<Self>, StartupError> {
        // Fail on a bad id alphabet before touching the database.
        config.id_codec()?;

        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database_path.display(), "Backend state ready");

        Ok(AppState::new(config, db, store)?)
    }

    pub fn products(self: &Arc<Self>) -> ProductService {
        ProductService::new(Arc::clone(self))
    }

    pub fn sales(self: &Arc<Self>) -> SaleService {
        SaleService::new(Arc::clone(self))
    }

    pub fn reports(self: &Arc<Self>) -> ReportService {
        ReportService::new(Arc::clone(self))
    }

    pub fn tenants(self: &Arc<Self>) -> TenantService {
        TenantService::new(Arc::clone(self))
    }

    pub fn auth(self: &Arc<Self>) -> AuthService {
        AuthService::new(Arc::clone(self))
    }
}
