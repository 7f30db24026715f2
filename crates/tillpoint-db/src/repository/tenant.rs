//! # Tenant Repository
//!
//! Tenant rows are not tenant-owned, so nothing here takes a scope. The
//! service layer only reaches these methods with a platform-admin guard.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::now;
use tillpoint_core::{NewTenant, Page, PageRequest, Tenant, TenantPatch};

const TENANT_COLUMNS: &str = "id, name, address, phone, email, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct TenantRow {
    id: i64,
    name: String,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for tenant records.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: SqlitePool,
}

impl TenantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TenantRepository { pool }
    }

    pub async fn create(&self, tenant: &NewTenant) -> DbResult<Tenant> {
        let now = now();
        let sql = format!(
            "INSERT INTO tenants (name, address, phone, email, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING {TENANT_COLUMNS}"
        );
        let row: TenantRow = sqlx::query_as(&sql)
            .bind(tenant.name.trim())
            .bind(tenant.address.as_deref())
            .bind(tenant.phone.as_deref())
            .bind(tenant.email.as_deref())
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        info!(id = row.id, name = %row.name, "Tenant created");
        Ok(row.into())
    }

    pub async fn get(&self, id: i64) -> DbResult<Tenant> {
        debug!(id, "Fetching tenant");

        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1");
        let row: Option<TenantRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Tenant::from)
            .ok_or_else(|| DbError::not_found("Tenant", id))
    }

    pub async fn list(&self, page: PageRequest) -> DbResult<Page<Tenant>> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY id LIMIT ?1 OFFSET ?2");
        let rows: Vec<TenantRow> = sqlx::query_as(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(rows.into_iter().map(Tenant::from).collect(), total, page))
    }

    /// Merges a patch into a stored tenant.
    pub async fn update(&self, id: i64, patch: TenantPatch) -> DbResult<Tenant> {
        let mut tenant = self.get(id).await?;
        tenant.apply_patch(patch);
        tenant.updated_at = now();

        let result = sqlx::query(
            "UPDATE tenants SET name = ?1, address = ?2, phone = ?3, email = ?4, updated_at = ?5 \
             WHERE id = ?6",
        )
        .bind(&tenant.name)
        .bind(tenant.address.as_deref())
        .bind(tenant.phone.as_deref())
        .bind(tenant.email.as_deref())
        .bind(tenant.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tenant", id));
        }

        info!(id, "Tenant updated");
        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_tenant_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.tenants();

        let created = repo
            .create(&NewTenant {
                name: "Warung Bu Sri".to_string(),
                phone: Some("0812".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(repo.get(created.id).await.unwrap(), created);

        let updated = repo
            .update(
                created.id,
                TenantPatch {
                    email: Some("sri@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("0812"));
        assert_eq!(updated.email.as_deref(), Some("sri@example.com"));

        let page = repo.list(PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 1);

        assert!(matches!(repo.get(999).await, Err(DbError::NotFound { .. })));
    }
}
