//! # Product Repository
//!
//! Storage side of the product ledger: tenant-scoped CRUD plus the guarded
//! stock adjustment used inside sale transactions.
//!
//! ## Guarded Stock Adjustment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    adjust_stock(conn, scope, id, -3)                    │
//! │                                                                         │
//! │  UPDATE products                                                        │
//! │     SET stock = stock + (-3)                                            │
//! │   WHERE id = ? AND tenant_id = ?                                        │
//! │     AND stock + (-3) >= 0          ◄── check and write in ONE statement │
//! │  RETURNING ...                                                          │
//! │       │                                                                 │
//! │       ├── 1 row  ──► updated product (price snapshot for the line)      │
//! │       │                                                                 │
//! │       └── 0 rows ──► scoped read to explain why:                        │
//! │                       • no row for this tenant → ProductNotFound        │
//! │                       • row exists             → InsufficientStock      │
//! │                                                                         │
//! │  Runs on the caller's connection, so it commits or rolls back with     │
//! │  the enclosing sale.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{now, parse_column};
use tillpoint_core::{
    CoreError, NewProduct, Page, PageRequest, Product, ProductPatch, TenantId, TenantScope,
};

const PRODUCT_COLUMNS: &str = "id, tenant_id, name, sku, cost_price, sale_price, stock, \
                               image_ref, created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    tenant_id: Option<i64>,
    name: String,
    sku: String,
    cost_price: String,
    sale_price: String,
    stock: i64,
    image_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            id: row.id,
            tenant_id: row.tenant_id.map(TenantId::new),
            name: row.name,
            sku: row.sku,
            cost_price: parse_column("cost_price", &row.cost_price)?,
            sale_price: parse_column("sale_price", &row.sale_price)?,
            stock: row.stock,
            image_ref: row.image_ref,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.create(&scope, &new_product).await?;
/// let page = repo.list(&scope, PageRequest::new(1, 20)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product owned by the scope's tenant.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such product for this tenant
    pub async fn get(&self, scope: &TenantScope, id: i64) -> DbResult<Product> {
        debug!(tenant = %scope, id, "Fetching product");

        let mut conn = self.pool.acquire().await?;
        Self::find_scoped(&mut conn, scope, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists the tenant's products ordered by id.
    pub async fn list(&self, scope: &TenantScope, page: PageRequest) -> DbResult<Page<Product>> {
        debug!(tenant = %scope, page = page.page(), page_size = page.page_size(), "Listing products");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = ?1 \
             ORDER BY id LIMIT ?2 OFFSET ?3"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(scope.tenant_id().get())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = ?1")
            .bind(scope.tenant_id().get())
            .fetch_one(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Page::new(items, total, page))
    }

    /// Creates a product stamped with the scope's tenant.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::DuplicateSku))` - SKU already used by this tenant
    pub async fn create(&self, scope: &TenantScope, product: &NewProduct) -> DbResult<Product> {
        let sku = product.sku.trim();
        debug!(tenant = %scope, sku = %sku, "Creating product");

        if self.sku_taken(scope, sku, None).await? {
            return Err(CoreError::DuplicateSku { sku: sku.to_string() }.into());
        }

        let now = now();
        let sql = format!(
            "INSERT INTO products (tenant_id, name, sku, cost_price, sale_price, stock, \
             image_ref, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row: ProductRow = sqlx::query_as(&sql)
            .bind(scope.tenant_id().get())
            .bind(product.name.trim())
            .bind(sku)
            .bind(product.cost_price.to_storage_string())
            .bind(product.sale_price.to_storage_string())
            .bind(product.stock)
            .bind(product.image_ref.as_deref())
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sku_conflict(e.into(), sku))?;

        info!(tenant = %scope, id = row.id, sku = %sku, "Product created");
        Product::try_from(row)
    }

    /// Applies a typed patch to a tenant's product.
    ///
    /// Read, merge and write happen in one transaction, and the write is
    /// still filtered on the tenant so a foreign row can never be touched.
    pub async fn update(
        &self,
        scope: &TenantScope,
        id: i64,
        patch: ProductPatch,
    ) -> DbResult<Product> {
        debug!(tenant = %scope, id, "Updating product");

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        let mut product = Self::find_scoped(&mut tx, scope, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if let Some(sku) = patch.sku.as_deref().map(str::trim) {
            if sku != product.sku && Self::sku_taken_in(&mut tx, scope, sku, Some(id)).await? {
                return Err(CoreError::DuplicateSku { sku: sku.to_string() }.into());
            }
        }

        product.apply_patch(patch);
        product.updated_at = now();

        let result = sqlx::query(
            "UPDATE products SET name = ?1, sku = ?2, cost_price = ?3, sale_price = ?4, \
             stock = ?5, image_ref = ?6, updated_at = ?7 \
             WHERE id = ?8 AND tenant_id = ?9",
        )
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.cost_price.to_storage_string())
        .bind(product.sale_price.to_storage_string())
        .bind(product.stock)
        .bind(product.image_ref.as_deref())
        .bind(product.updated_at)
        .bind(id)
        .bind(scope.tenant_id().get())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sku_conflict(e.into(), &product.sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        tx.commit().await.map_err(DbError::transaction)?;

        info!(tenant = %scope, id, "Product updated");
        Ok(product)
    }

    /// Sets the absolute stock level.
    pub async fn set_stock(&self, scope: &TenantScope, id: i64, stock: i64) -> DbResult<Product> {
        self.update(scope, id, ProductPatch::stock(stock)).await
    }

    /// Records the storage key of the product's image.
    pub async fn set_image_ref(
        &self,
        scope: &TenantScope,
        id: i64,
        image_ref: &str,
    ) -> DbResult<Product> {
        self.update(scope, id, ProductPatch::image(image_ref)).await
    }

    /// Deletes a tenant's product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - nothing deleted for this tenant
    /// * `Err(DbError::ForeignKeyViolation)` - committed sale lines reference it
    pub async fn delete(&self, scope: &TenantScope, id: i64) -> DbResult<()> {
        debug!(tenant = %scope, id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(scope.tenant_id().get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(tenant = %scope, id, "Product deleted");
        Ok(())
    }

    // =========================================================================
    // Transaction participants
    // =========================================================================

    /// Adds `delta` to a product's stock inside the caller's transaction.
    ///
    /// ## Arguments
    /// * `conn` - the enclosing transaction's connection
    /// * `delta` - negative for sales, positive for restocking
    ///
    /// ## Returns
    /// The product as it stands after the adjustment.
    ///
    /// ## Errors
    /// * `DbError::Domain(ProductNotFound)` - missing or owned by another tenant
    /// * `DbError::Domain(InsufficientStock)` - the result would be negative
    pub async fn adjust_stock(
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        id: i64,
        delta: i64,
    ) -> DbResult<Product> {
        debug!(tenant = %scope, id, delta, "Adjusting stock");

        let sql = format!(
            "UPDATE products SET stock = stock + ?1, updated_at = ?2 \
             WHERE id = ?3 AND tenant_id = ?4 AND stock + ?1 >= 0 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let updated: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(delta)
            .bind(now())
            .bind(id)
            .bind(scope.tenant_id().get())
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(row) = updated {
            return Product::try_from(row);
        }

        match Self::find_scoped(conn, scope, id).await? {
            None => Err(CoreError::ProductNotFound { id }.into()),
            Some(product) => Err(CoreError::InsufficientStock {
                product: product.name,
                requested: delta.saturating_neg(),
                available: product.stock,
            }
            .into()),
        }
    }

    /// Scoped read on an explicit connection.
    pub async fn find_scoped(
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        id: i64,
    ) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND tenant_id = ?2");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(scope.tenant_id().get())
            .fetch_optional(&mut *conn)
            .await?;

        row.map(Product::try_from).transpose()
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn sku_taken(&self, scope: &TenantScope, sku: &str, except: Option<i64>) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::sku_taken_in(&mut conn, scope, sku, except).await
    }

    async fn sku_taken_in(
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        sku: &str,
        except: Option<i64>,
    ) -> DbResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM products WHERE tenant_id = ?1 AND sku = ?2 \
             AND (?3 IS NULL OR id <> ?3))",
        )
        .bind(scope.tenant_id().get())
        .bind(sku)
        .bind(except)
        .fetch_one(&mut *conn)
        .await?;

        Ok(taken)
    }
}

/// A UNIQUE failure on the SKU index means another request won the race.
fn map_sku_conflict(err: DbError, sku: &str) -> DbError {
    if err.is_unique_violation_on("products.sku") {
        CoreError::DuplicateSku { sku: sku.to_string() }.into()
    } else {
        err
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
