//! # Sale Repository
//!
//! Sale headers (`transactions`) and their lines (`transaction_items`).
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   ├── ProductRepository::adjust_stock(...)   per line, in order        │
//! │   ├── SaleTally::verify(...)                 server total == claim     │
//! │   └── SaleRepository::insert(tx, scope, sale)                          │
//! │         ├── INSERT transactions        (tenant stamped from scope)     │
//! │         └── INSERT transaction_items   (unit_price snapshot)           │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  get(scope, id) ── re-read with each line's current product details    │
//! │                                                                         │
//! │  There is no update path: a committed sale is immutable.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{now, parse_column};
use tillpoint_core::{
    DiscountPercent, LineProduct, Money, Page, PageRequest, Sale, SaleLine, TenantId, TenantScope,
};

const SALE_COLUMNS: &str =
    "id, tenant_id, cashier, payment_method, discount, total, notes, created_at, updated_at";

const LINE_SELECT: &str = "SELECT ti.id, ti.transaction_id, ti.product_id, ti.quantity, \
     ti.unit_price, p.name AS product_name, p.sku AS product_sku, \
     p.sale_price AS product_sale_price, p.image_ref AS product_image_ref \
     FROM transaction_items ti JOIN products p ON p.id = ti.product_id";

// =============================================================================
// Inputs
// =============================================================================

/// A verified sale ready to be written inside a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub cashier: String,
    pub payment_method: String,
    pub discount: DiscountPercent,
    /// Server-computed total.
    pub total: Money,
    pub notes: Option<String>,
    pub lines: Vec<NewSaleLine>,
}

/// One line of a [`NewSale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSaleLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: i64,
    tenant_id: i64,
    cashier: String,
    payment_method: String,
    discount: String,
    total: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_sale(self, lines: Vec<SaleLine>) -> DbResult<Sale> {
        Ok(Sale {
            id: self.id,
            tenant_id: TenantId::new(self.tenant_id),
            cashier: self.cashier,
            payment_method: self.payment_method,
            discount: parse_column("discount", &self.discount)?,
            total: parse_column("total", &self.total)?,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            lines,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: i64,
    transaction_id: i64,
    product_id: i64,
    quantity: i64,
    unit_price: String,
    product_name: String,
    product_sku: String,
    product_sale_price: String,
    product_image_ref: Option<String>,
}

impl TryFrom<LineRow> for SaleLine {
    type Error = DbError;

    fn try_from(row: LineRow) -> DbResult<Self> {
        Ok(SaleLine {
            id: row.id,
            sale_id: row.transaction_id,
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: parse_column("unit_price", &row.unit_price)?,
            product: LineProduct {
                id: row.product_id,
                name: row.product_name,
                sku: row.product_sku,
                sale_price: parse_column("sale_price", &row.product_sale_price)?,
                image_ref: row.product_image_ref,
            },
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a sale header and its lines on the caller's transaction.
    ///
    /// ## Returns
    /// The new sale's row id. Nothing is visible until the caller commits.
    pub async fn insert(
        conn: &mut SqliteConnection,
        scope: &TenantScope,
        sale: &NewSale,
    ) -> DbResult<i64> {
        let now = now();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO transactions (tenant_id, cashier, payment_method, discount, total, \
             notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) RETURNING id",
        )
        .bind(scope.tenant_id().get())
        .bind(sale.cashier.trim())
        .bind(sale.payment_method.trim())
        .bind(sale.discount.value().normalize().to_string())
        .bind(sale.total.to_storage_string())
        .bind(sale.notes.as_deref())
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        for line in &sale.lines {
            sqlx::query(
                "INSERT INTO transaction_items (transaction_id, product_id, quantity, unit_price) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price.to_storage_string())
            .execute(&mut *conn)
            .await?;
        }

        debug!(tenant = %scope, sale_id = id, lines = sale.lines.len(), "Sale rows written");
        Ok(id)
    }

    /// Gets a tenant's sale with its lines.
    pub async fn get(&self, scope: &TenantScope, id: i64) -> DbResult<Sale> {
        debug!(tenant = %scope, id, "Fetching sale");

        let sql = format!("SELECT {SALE_COLUMNS} FROM transactions WHERE id = ?1 AND tenant_id = ?2");
        let header: SaleRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(scope.tenant_id().get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let sql = format!("{LINE_SELECT} WHERE ti.transaction_id = ?1 ORDER BY ti.id");
        let lines: Vec<LineRow> = sqlx::query_as(&sql).bind(id).fetch_all(&self.pool).await?;

        let lines = lines
            .into_iter()
            .map(SaleLine::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        header.into_sale(lines)
    }

    /// Lists a tenant's sales, newest first, each with its lines.
    pub async fn list(&self, scope: &TenantScope, page: PageRequest) -> DbResult<Page<Sale>> {
        debug!(tenant = %scope, page = page.page(), page_size = page.page_size(), "Listing sales");

        let tenant = scope.tenant_id().get();

        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM transactions WHERE tenant_id = ?1 \
             ORDER BY id DESC LIMIT ?2 OFFSET ?3"
        );
        let headers: Vec<SaleRow> = sqlx::query_as(&sql)
            .bind(tenant)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "{LINE_SELECT} WHERE ti.transaction_id IN \
             (SELECT id FROM transactions WHERE tenant_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3) \
             ORDER BY ti.id"
        );
        let line_rows: Vec<LineRow> = sqlx::query_as(&sql)
            .bind(tenant)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE tenant_id = ?1")
            .bind(tenant)
            .fetch_one(&self.pool)
            .await?;

        let mut lines_by_sale: HashMap<i64, Vec<SaleLine>> = HashMap::new();
        for row in line_rows {
            let line = SaleLine::try_from(row)?;
            lines_by_sale.entry(line.sale_id).or_default().push(line);
        }

        let items = headers
            .into_iter()
            .map(|header| {
                let lines = lines_by_sale.remove(&header.id).unwrap_or_default();
                header.into_sale(lines)
            })
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Page::new(items, total, page))
    }

    /// Number of lines referencing a product (any tenant).
    pub async fn count_lines_for_product(&self, product_id: i64) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transaction_items WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
