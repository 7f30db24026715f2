//! # User Repository
//!
//! Login accounts. Usernames are globally unique; a user may be bound to
//! one tenant, which is what its access tokens get scoped to.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::now;
use tillpoint_core::{NewUser, TenantId, User, UserRole};

const USER_COLUMNS: &str = "id, username, password_hash, role, tenant_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    role: UserRole,
    tenant_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role: row.role,
            tenant_id: row.tenant_id.map(TenantId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for user accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username taken
    /// * `Err(DbError::ForeignKeyViolation)` - tenant doesn't exist
    pub async fn create(&self, user: &NewUser) -> DbResult<User> {
        let username = user.username.trim();
        debug!(username = %username, "Creating user");

        let sql = format!(
            "INSERT INTO users (username, password_hash, role, tenant_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(username)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.tenant_id.map(TenantId::get))
            .bind(now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, username),
                other => other,
            })?;

        info!(id = row.id, username = %row.username, role = row.role.as_str(), "User created");
        Ok(row.into())
    }

    pub async fn get(&self, id: i64) -> DbResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::from).ok_or_else(|| DbError::not_found("User", id))
    }

    /// Login lookup. `None` for an unknown username.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use tillpoint_core::NewTenant;

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = db
            .tenants()
            .create(&NewTenant {
                name: "Warung A".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let input = NewUser {
            username: "kasir01".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: UserRole::User,
            tenant_id: Some(TenantId::new(tenant.id)),
        };
        let user = db.users().create(&input).await.unwrap();
        assert_eq!(user.tenant_id, Some(TenantId::new(tenant.id)));

        let found = db.users().find_by_username("kasir01").await.unwrap().unwrap();
        assert_eq!(found, user);
        assert_eq!(db.users().get(user.id).await.unwrap().role, UserRole::User);
        assert!(db.users().find_by_username("nobody").await.unwrap().is_none());

        let err = db.users().create(&input).await.unwrap_err();
        assert!(err.is_unique_violation_on("users.username"));
    }

    #[tokio::test]
    async fn test_unknown_tenant_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .users()
            .create(&NewUser {
                username: "ghost".to_string(),
                password_hash: "x".to_string(),
                role: UserRole::Admin,
                tenant_id: Some(TenantId::new(42)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
