//! # Sale Service
//!
//! Sale processing: every stock decrement, the total check and the sale
//! rows commit together or not at all.
//!
//! ## Sale Processing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_sale(scope, input)                            │
//! │                                                                         │
//! │  Before the transaction (no rollback needed):                          │
//! │    decode product tokens ──► InvalidToken                              │
//! │    validate shape        ──► EmptySale / Validation                    │
//! │                                                                         │
//! │  BEGIN  (bounded by SALE_TIMEOUT_MS)                                   │
//! │    for each line, in request order:                                    │
//! │      UPDATE products SET stock = stock - qty                           │
//! │        WHERE id = ? AND tenant_id = ? AND stock - qty >= 0             │
//! │        RETURNING ...            ──► ProductNotFound / InsufficientStock│
//! │      unit_price = returned sale_price (snapshot)                       │
//! │      running += unit_price × qty                                       │
//! │    total = running × (100 − discount) / 100                            │
//! │    total == claimed?            ──► TotalMismatch                      │
//! │    INSERT transactions (total = server value), transaction_items       │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Re-read the committed sale with product details                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The guarded UPDATE is the unit's first statement and takes SQLite's write
//! lock, so two sales of the same product serialize in the database. The
//! second one runs against the first one's committed stock. Nothing about
//! stock or price is cached in process.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::decode_id;
use crate::views::{PageView, SaleView};
use crate::AppState;
use tillpoint_core::sale::SaleTally;
use tillpoint_core::{
    CoreError, DiscountPercent, Money, PageRequest, SaleItemRequest, SaleRequest, TenantScope,
};
use tillpoint_db::{DbError, DbResult, NewSale, NewSaleLine, ProductRepository, SaleRepository};

/// Sale creation input as received from a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleInput {
    pub items: Vec<SaleItemInput>,
    pub cashier: String,
    pub payment_method: String,
    #[serde(default)]
    pub discount: DiscountPercent,
    /// The client's total; verified, never stored.
    #[serde(alias = "totalPrice")]
    pub claimed_total: Money,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One requested line, keyed by the product's public token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemInput {
    pub product_id: String,
    pub quantity: i64,
}

/// Sale processing service.
pub struct SaleService {
    state: Arc<AppState>,
}

impl SaleService {
    pub fn new(state: Arc<AppState>) -> Self {
        SaleService { state }
    }

    /// Processes a sale atomically.
    ///
    /// ## Returns
    /// The committed sale, re-read with each line's product details.
    ///
    /// ## Errors
    /// * `Validation` - empty sale, bad quantity or labels
    /// * `InvalidToken` - a product id does not decode
    /// * `NotFound` - a product is absent or belongs to another tenant
    /// * `InsufficientStock` - a line asks for more than is on hand
    /// * `TotalMismatch` - the claimed total differs from the computed one
    /// * `Timeout` - the unit ran past `SALE_TIMEOUT_MS`
    ///
    /// Every error after validation leaves stock and sales untouched.
    pub async fn create_sale(
        &self,
        scope: &TenantScope,
        input: CreateSaleInput,
    ) -> ApiResult<SaleView> {
        let codec = &self.state.codec;
        let request = self.decode_request(input)?;
        request
            .validate()
            .map_err(|e| ApiError::from_core(e, codec))?;

        debug!(tenant = %scope, lines = request.items.len(), "Processing sale");

        let deadline = self.state.config.sale_timeout;
        let sale_id = match tokio::time::timeout(deadline, self.commit_sale(scope, &request)).await
        {
            Ok(result) => result.map_err(|e| self.sale_rejected(scope, e))?,
            Err(_) => {
                // The dropped transaction rolls back.
                warn!(tenant = %scope, timeout_ms = deadline.as_millis() as u64, "Sale timed out");
                return Err(ApiError::Timeout {
                    operation: "create sale",
                });
            }
        };

        let sale = self
            .state
            .db
            .sales()
            .get(scope, sale_id)
            .await
            .map_err(|e| ApiError::from_db("load sale", e, codec))?;

        Ok(SaleView::new(sale, codec))
    }

    pub async fn get_sale(&self, scope: &TenantScope, sale_id: &str) -> ApiResult<SaleView> {
        let codec = &self.state.codec;
        let id = decode_id(codec, sale_id)?;

        let sale = self
            .state
            .db
            .sales()
            .get(scope, id)
            .await
            .map_err(|e| ApiError::from_db("get sale", e, codec))?;

        Ok(SaleView::new(sale, codec))
    }

    /// Newest first; `page` and `page_size` are clamped.
    pub async fn list_sales(
        &self,
        scope: &TenantScope,
        page: i64,
        page_size: i64,
    ) -> ApiResult<PageView<SaleView>> {
        let codec = &self.state.codec;
        let page = self
            .state
            .db
            .sales()
            .list(scope, PageRequest::new(page, page_size))
            .await
            .map_err(|e| ApiError::from_db("list sales", e, codec))?;

        Ok(PageView::from_page(page, |sale| SaleView::new(sale, codec)))
    }

    // =========================================================================
    // Atomic unit
    // =========================================================================

    async fn commit_sale(&self, scope: &TenantScope, request: &SaleRequest) -> DbResult<i64> {
        let mut tx = self.state.db.begin().await?;

        let mut tally = SaleTally::new();
        let mut lines = Vec::with_capacity(request.items.len());

        for item in &request.items {
            let product =
                ProductRepository::adjust_stock(&mut tx, scope, item.product_id, -item.quantity)
                    .await?;

            tally
                .add_line(product.sale_price, item.quantity)
                .map_err(CoreError::from)?;
            lines.push(NewSaleLine {
                product_id: product.id,
                quantity: item.quantity,
                unit_price: product.sale_price,
            });
        }

        let total = tally.verify(request.discount, request.claimed_total)?;

        let sale = NewSale {
            cashier: request.cashier.clone(),
            payment_method: request.payment_method.clone(),
            discount: request.discount,
            total,
            notes: request.notes.clone(),
            lines,
        };
        let sale_id = SaleRepository::insert(&mut tx, scope, &sale).await?;

        tx.commit().await?;

        info!(
            tenant = %scope,
            sale_id,
            lines = tally.lines(),
            units = tally.units(),
            total = %total,
            "Sale committed"
        );
        Ok(sale_id)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn decode_request(&self, input: CreateSaleInput) -> ApiResult<SaleRequest> {
        let codec = &self.state.codec;
        let items = input
            .items
            .iter()
            .map(|item| -> ApiResult<SaleItemRequest> {
                Ok(SaleItemRequest {
                    product_id: decode_id(codec, &item.product_id)?,
                    quantity: item.quantity,
                })
            })
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(SaleRequest {
            items,
            cashier: input.cashier,
            payment_method: input.payment_method,
            discount: input.discount,
            claimed_total: input.claimed_total,
            notes: input.notes.filter(|n| !n.trim().is_empty()),
        })
    }

    fn sale_rejected(&self, scope: &TenantScope, err: DbError) -> ApiError {
        match &err {
            DbError::Domain(CoreError::InsufficientStock {
                product,
                requested,
                available,
            }) => warn!(
                tenant = %scope,
                product = %product,
                requested,
                available,
                "Sale rejected: insufficient stock"
            ),
            DbError::Domain(CoreError::TotalMismatch { claimed, computed }) => warn!(
                tenant = %scope,
                claimed = %claimed,
                computed = %computed,
                "Sale rejected: total mismatch"
            ),
            _ => {}
        }
        ApiError::from_db("create sale", err, &self.state.codec)
    }
}
