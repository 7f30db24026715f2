//! Shared setup for backend integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, OnceLock};

use tillpoint_backend::auth::{hash_password, PlatformScope};
use tillpoint_backend::storage::InMemoryObjectStore;
use tillpoint_backend::views::ProductView;
use tillpoint_backend::{AppConfig, AppState};
use tillpoint_core::{Money, NewProduct, NewTenant, TenantScope};
use tillpoint_db::{Database, DbConfig};

pub const ADMIN_USERNAME: &str = "root";
pub const ADMIN_PASSWORD: &str = "platform-pass";

fn admin_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(ADMIN_PASSWORD).unwrap())
}

pub fn config(database_path: Option<&Path>) -> AppConfig {
    config_with(database_path, &[])
}

/// Test config with extra environment values layered on top.
pub fn config_with(database_path: Option<&Path>, extra: &[(&str, &str)]) -> AppConfig {
    let path = database_path.map(|p| p.display().to_string());
    AppConfig::from_lookup(|key| {
        if let Some((_, value)) = extra.iter().find(|(k, _)| *k == key) {
            return Some(value.to_string());
        }
        match key {
            "JWT_SECRET" => Some("integration-secret".to_string()),
            "ADMIN_USERNAME" => Some(ADMIN_USERNAME.to_string()),
            "ADMIN_PASSWORD_HASH" => Some(admin_hash().to_string()),
            "ID_SALT" => Some("integration-salt".to_string()),
            "DATABASE_PATH" => path.clone(),
            _ => None,
        }
    })
    .unwrap()
}

/// App over a fresh in-memory database.
pub async fn app() -> Arc<AppState> {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let store = Arc::new(InMemoryObjectStore::new("tillpoint"));
    AppState::new(config(None), db, store).unwrap()
}

/// App over a database file, with a real multi-connection pool.
pub async fn file_app(path: &Path) -> Arc<AppState> {
    file_app_with(path, &[]).await
}

pub async fn file_app_with(path: &Path, extra: &[(&str, &str)]) -> Arc<AppState> {
    let store = Arc::new(InMemoryObjectStore::new("tillpoint"));
    AppState::connect(config_with(Some(path), extra), store)
        .await
        .unwrap()
}

pub fn admin(app: &Arc<AppState>) -> PlatformScope {
    app.auth().authorize_admin(ADMIN_USERNAME, ADMIN_PASSWORD).unwrap()
}

/// Registers a tenant; returns its scope and public token.
pub async fn tenant(app: &Arc<AppState>, name: &str) -> (TenantScope, String) {
    let view = app
        .tenants()
        .create(
            &admin(app),
            NewTenant {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let scope = TenantScope::resolve(Some(&view.id), &app.codec).unwrap();
    (scope, view.id)
}

pub async fn product(
    app: &Arc<AppState>,
    scope: &TenantScope,
    sku: &str,
    price: i64,
    stock: i64,
) -> ProductView {
    app.products()
        .create(
            scope,
            NewProduct {
                name: format!("Product {sku}"),
                sku: sku.to_string(),
                cost_price: Money::zero(),
                sale_price: Money::from_major(price),
                stock,
                image_ref: None,
            },
        )
        .await
        .unwrap()
}
