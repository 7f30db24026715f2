//! # Report Repository
//!
//! Read-only access to committed sale lines for report aggregation. The
//! arithmetic lives in `tillpoint_core::report`; this module only selects
//! the tenant's lines whose sale falls inside the window.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::parse_column;
use tillpoint_core::report::{ReportLine, ReportWindow};
use tillpoint_core::TenantScope;

#[derive(Debug, sqlx::FromRow)]
struct WindowLineRow {
    sale_id: i64,
    product_id: i64,
    product_name: String,
    quantity: i64,
    unit_price: String,
}

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sale lines of the tenant's transactions created inside `window`.
    pub async fn lines_in_window(
        &self,
        scope: &TenantScope,
        window: &ReportWindow,
    ) -> DbResult<Vec<ReportLine>> {
        debug!(
            tenant = %scope,
            start = %window.start(),
            end = %window.end(),
            "Loading report lines"
        );

        let rows: Vec<WindowLineRow> = sqlx::query_as(
            "SELECT t.id AS sale_id, ti.product_id, p.name AS product_name, ti.quantity, ti.unit_price \
             FROM transaction_items ti \
             JOIN transactions t ON t.id = ti.transaction_id \
             JOIN products p ON p.id = ti.product_id \
             WHERE t.tenant_id = ?1 AND t.created_at >= ?2 AND t.created_at <= ?3 \
             ORDER BY ti.id",
        )
        .bind(scope.tenant_id().get())
        .bind(window.start())
        .bind(window.end())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ReportLine {
                    sale_id: row.sale_id,
                    product_id: row.product_id,
                    product_name: row.product_name,
                    quantity: row.quantity,
                    unit_price: parse_column("unit_price", &row.unit_price)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, NewSale, NewSaleLine, SaleRepository};
    use chrono::{Duration, Utc};
    use tillpoint_core::{DiscountPercent, Money, NewProduct, NewTenant, TenantId};

    #[tokio::test]
    async fn test_window_and_scope_filtering() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut scopes = Vec::new();
        for name in ["Warung A", "Warung B"] {
            let t = db
                .tenants()
                .create(&NewTenant {
                    name: name.to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
            scopes.push(TenantScope::new(TenantId::new(t.id)));
        }

        for scope in &scopes {
            let product = db
                .products()
                .create(
                    scope,
                    &NewProduct {
                        name: "Nasi Ayam".to_string(),
                        sku: "NAS001".to_string(),
                        cost_price: Money::zero(),
                        sale_price: Money::from_major(12000),
                        stock: 10,
                        image_ref: None,
                    },
                )
                .await
                .unwrap();

            let mut tx = db.begin().await.unwrap();
            SaleRepository::insert(
                &mut tx,
                scope,
                &NewSale {
                    cashier: "Ayu".to_string(),
                    payment_method: "cash".to_string(),
                    discount: DiscountPercent::none(),
                    total: Money::from_major(24000),
                    notes: None,
                    lines: vec![NewSaleLine {
                        product_id: product.id,
                        quantity: 2,
                        unit_price: product.sale_price,
                    }],
                },
            )
            .await
            .unwrap();
            tx.commit().await.unwrap();
        }

        let today = Utc::now().date_naive();
        let window = ReportWindow::from_dates(today - Duration::days(1), today + Duration::days(1))
            .unwrap();
        let lines = db.reports().lines_in_window(&scopes[0], &window).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].unit_price, Money::from_major(12000));

        let past = today - Duration::days(30);
        let window = ReportWindow::from_dates(past, past).unwrap();
        assert!(db.reports().lines_in_window(&scopes[0], &window).await.unwrap().is_empty());
    }
}
