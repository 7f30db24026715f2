//! Tenant management.
//!
//! Every method takes a [`PlatformScope`], which only
//! [`AdminGuard::authorize`](crate::auth::AdminGuard::authorize) can mint.
//! Tenant users' access tokens never reach these operations.

use std::sync::Arc;

use tracing::info;

use crate::auth::PlatformScope;
use crate::error::{ApiError, ApiResult};
use crate::services::decode_id;
use crate::views::{PageView, TenantView};
use crate::AppState;
use tillpoint_core::{NewTenant, PageRequest, TenantPatch};

/// Platform-admin tenant service.
pub struct TenantService {
    state: Arc<AppState>,
}

impl TenantService {
    pub fn new(state: Arc<AppState>) -> Self {
        TenantService { state }
    }

    pub async fn create(&self, admin: &PlatformScope, input: NewTenant) -> ApiResult<TenantView> {
        input.validate()?;

        let tenant = self
            .state
            .db
            .tenants()
            .create(&input)
            .await
            .map_err(|e| self.db_error("create tenant", e))?;

        info!(admin = %admin.username(), tenant = tenant.id, "Tenant registered");
        Ok(TenantView::new(tenant, &self.state.codec))
    }

    pub async fn get(&self, _admin: &PlatformScope, tenant_id: &str) -> ApiResult<TenantView> {
        let id = decode_id(&self.state.codec, tenant_id)?;

        let tenant = self
            .state
            .db
            .tenants()
            .get(id)
            .await
            .map_err(|e| self.db_error("get tenant", e))?;

        Ok(TenantView::new(tenant, &self.state.codec))
    }

    pub async fn list(
        &self,
        _admin: &PlatformScope,
        page: i64,
        page_size: i64,
    ) -> ApiResult<PageView<TenantView>> {
        let page = self
            .state
            .db
            .tenants()
            .list(PageRequest::new(page, page_size))
            .await
            .map_err(|e| self.db_error("list tenants", e))?;

        Ok(PageView::from_page(page, |t| TenantView::new(t, &self.state.codec)))
    }

    pub async fn update(
        &self,
        admin: &PlatformScope,
        tenant_id: &str,
        patch: TenantPatch,
    ) -> ApiResult<TenantView> {
        patch.validate()?;
        let id = decode_id(&self.state.codec, tenant_id)?;

        let tenant = self
            .state
            .db
            .tenants()
            .update(id, patch)
            .await
            .map_err(|e| self.db_error("update tenant", e))?;

        info!(admin = %admin.username(), tenant = tenant.id, "Tenant updated");
        Ok(TenantView::new(tenant, &self.state.codec))
    }

    fn db_error(&self, operation: &'static str, err: tillpoint_db::DbError) -> ApiError {
        ApiError::from_db(operation, err, &self.state.codec)
    }
}
