//! # Tenant Scope
//!
//! Every read or write of tenant-owned data takes a [`TenantScope`] as an
//! explicit parameter. There is no ambient lookup and no "unscoped" variant
//! of a tenant-bound query.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Bearer token ──► verify JWT ──► tenant claim "X7KQ2PA"                 │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                     TenantScope::resolve(Some("X7KQ2PA"), &codec)       │
//! │                                        │                                │
//! │               ┌────────────────────────┼──────────────────────┐         │
//! │               ▼                        ▼                      ▼         │
//! │       products().get(&scope)   sales().create(&scope)  reports(&scope)  │
//! │                                                                         │
//! │  No claim ──► MissingTenantScope (fail closed, never an unscoped query) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Platform-admin operations (tenant management) do not use this type at all.
//! They require a separate credential class handled by the service layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::ids::IdCodec;

/// Row id of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

impl TenantId {
    #[inline]
    pub const fn new(id: i64) -> Self {
        TenantId(id)
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated tenant of the current request.
///
/// Constructed once per request and passed by reference into every
/// tenant-bound data access. Never shared across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantScope {
    tenant_id: TenantId,
}

impl TenantScope {
    pub const fn new(tenant_id: TenantId) -> Self {
        TenantScope { tenant_id }
    }

    /// Resolves a scope from the (encoded) tenant claim of a verified token.
    ///
    /// ## Errors
    /// - `MissingTenantScope` when the token carries no tenant
    /// - `InvalidTokenFormat` when the claim does not decode
    pub fn resolve(tenant_claim: Option<&str>, codec: &IdCodec) -> CoreResult<Self> {
        let claim = tenant_claim
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(CoreError::MissingTenantScope)?;

        let id = codec.decode_row_id(claim)?;
        Ok(TenantScope::new(TenantId::new(id)))
    }

    #[inline]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// True when a row's tenant reference belongs to this scope.
    ///
    /// Rows with no tenant (legacy) never match.
    pub fn owns(&self, row_tenant: Option<TenantId>) -> bool {
        row_tenant == Some(self.tenant_id)
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tenant:{}", self.tenant_id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
