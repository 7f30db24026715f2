//! # Domain Types
//!
//! Entities and request shapes used throughout Tillpoint.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Tenant      │   │     Product     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  tenant_id      │   │  tenant_id      │       │
//! │  │  name           │   │  sku (unique    │   │  discount       │       │
//! │  │  profile fields │   │   per tenant)   │   │  total (server) │       │
//! │  └─────────────────┘   │  stock ≥ 0      │   │  lines ─────────┼──┐    │
//! │                        └─────────────────┘   └─────────────────┘  │    │
//! │                                 ▲                                  │    │
//! │                                 │           ┌─────────────────┐   │    │
//! │                                 └───────────│    SaleLine     │◄──┘    │
//! │                                             │  unit_price     │        │
//! │                                             │  (snapshot)     │        │
//! │                                             └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids here are raw row ids; they are encoded only at the service boundary.
//! Partial updates go through typed patches (`ProductPatch`, `TenantPatch`)
//! merged by a single `apply_patch` per entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{DiscountPercent, Money};
use crate::tenant::TenantId;
use crate::validation::{
    validate_amount, validate_label, validate_line_count, validate_non_negative,
    validate_optional_text, validate_product_name, validate_quantity, validate_sale_price,
    validate_sku, validate_stock,
};
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Tenant
// =============================================================================

/// A tenant (store/business). Identity boundary for all owned rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTenant {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl NewTenant {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_label("name", &self.name, 200)?;
        validate_profile(&self.address, &self.phone, &self.email)
    }
}

/// Partial tenant update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl TenantPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_label("name", name, 200)?;
        }
        validate_profile(&self.address, &self.phone, &self.email)
    }
}

impl Tenant {
    /// Merges a patch into this tenant.
    pub fn apply_patch(&mut self, patch: TenantPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if patch.address.is_some() {
            self.address = patch.address;
        }
        if patch.phone.is_some() {
            self.phone = patch.phone;
        }
        if patch.email.is_some() {
            self.email = patch.email;
        }
    }
}

fn validate_profile(
    address: &Option<String>,
    phone: &Option<String>,
    email: &Option<String>,
) -> Result<(), ValidationError> {
    validate_optional_text("address", address.as_deref(), 500)?;
    validate_optional_text("phone", phone.as_deref(), 30)?;
    validate_optional_text("email", email.as_deref(), 200)?;
    if let Some(email) = email {
        if !email.contains('@') {
            return Err(ValidationError::invalid_format("email", "missing '@'"));
        }
    }
    Ok(())
}

// =============================================================================
// Product
// =============================================================================

/// A sellable item with a stock counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,

    /// Owning tenant. `None` only for legacy rows created before tenancy;
    /// such rows are invisible to every tenant-bound query.
    pub tenant_id: Option<TenantId>,

    pub name: String,

    /// Unique within the tenant.
    pub sku: String,

    pub cost_price: Money,

    /// Current price; snapshotted into sale lines at sale time.
    pub sale_price: Money,

    /// Never negative.
    pub stock: i64,

    /// Object storage key of the product image.
    pub image_ref: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product. The tenant is stamped from the scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub cost_price: Money,
    pub sale_price: Money,
    pub stock: i64,
    pub image_ref: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_product_name(&self.name)?;
        validate_sku(&self.sku)?;
        validate_amount("cost_price", self.cost_price)?;
        validate_sale_price(self.sale_price)?;
        validate_stock(self.stock)
    }
}

/// Partial product update. `None` leaves a field unchanged.
///
/// The owning tenant is deliberately absent: it is immutable once set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub cost_price: Option<Money>,
    pub sale_price: Option<Money>,
    pub stock: Option<i64>,
    pub image_ref: Option<String>,
}

impl ProductPatch {
    /// A patch that only sets the stock level.
    pub fn stock(stock: i64) -> Self {
        ProductPatch {
            stock: Some(stock),
            ..Default::default()
        }
    }

    /// A patch that only sets the image reference.
    pub fn image(image_ref: impl Into<String>) -> Self {
        ProductPatch {
            image_ref: Some(image_ref.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ProductPatch::default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_product_name(name)?;
        }
        if let Some(sku) = &self.sku {
            validate_sku(sku)?;
        }
        if let Some(cost) = self.cost_price {
            validate_amount("cost_price", cost)?;
        }
        if let Some(price) = self.sale_price {
            validate_sale_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }
}

impl Product {
    /// Merges a patch into this product.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let mut product = ledger.get(&scope, id).await?;
    /// product.apply_patch(ProductPatch::stock(12));
    /// assert_eq!(product.stock, 12);
    /// ```
    pub fn apply_patch(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(sku) = patch.sku {
            self.sku = sku.trim().to_string();
        }
        if let Some(cost) = patch.cost_price {
            self.cost_price = cost;
        }
        if let Some(price) = patch.sale_price {
            self.sale_price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if patch.image_ref.is_some() {
            self.image_ref = patch.image_ref;
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub tenant_id: TenantId,
    pub cashier: String,
    pub payment_method: String,
    pub discount: DiscountPercent,

    /// Server-computed and verified total, never the caller's claim.
    pub total: Money,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<SaleLine>,
}

impl Sale {
    pub fn units(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// One product's contribution to a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,

    /// Price at sale time, independent of later price changes.
    pub unit_price: Money,

    /// The product as it is now.
    pub product: LineProduct,
}

impl SaleLine {
    /// `unit_price × quantity`; `None` if not representable.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Product details resolved for a sale line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineProduct {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub sale_price: Money,
    pub image_ref: Option<String>,
}

/// A decoded sale request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    /// Processed in order.
    pub items: Vec<SaleItemRequest>,
    pub cashier: String,
    pub payment_method: String,
    pub discount: DiscountPercent,
    pub claimed_total: Money,
    pub notes: Option<String>,
}

/// One requested line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

impl SaleRequest {
    /// Everything that can be checked without touching stored data.
    ///
    /// ## Errors
    /// - `EmptySale` for no lines
    /// - `Validation` for bad quantities, labels, notes or claimed total
    pub fn validate(&self) -> CoreResult<()> {
        if self.items.is_empty() {
            return Err(CoreError::EmptySale);
        }
        validate_line_count(self.items.len())?;
        for item in &self.items {
            validate_quantity(item.quantity)?;
        }
        validate_label("cashier", &self.cashier, 100)?;
        validate_label("payment_method", &self.payment_method, 100)?;
        validate_optional_text("notes", self.notes.as_deref(), 500)?;
        validate_non_negative("total_price", self.claimed_total)?;
        Ok(())
    }
}

// =============================================================================
// User
// =============================================================================

/// Role of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".to_string(), "user".to_string()],
            }),
        }
    }
}

/// A login account, optionally bound to a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub tenant_id: Option<TenantId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a user. The password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub tenant_id: Option<TenantId>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Clamped page request. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Clamps raw caller input.
    ///
    /// - `page < 1` → 1
    /// - `page_size < 1` → 1
    /// - `page_size > 100` → 100
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = page.clamp(1, u32::MAX as i64) as u32;
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE as i64) as u32;
        PageRequest { page, page_size }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// SQL LIMIT.
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    /// SQL OFFSET.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(1, DEFAULT_PAGE_SIZE as i64)
    }
}

/// One page of results plus the unpaginated total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Page {
            items,
            total,
            page: request.page(),
            page_size: request.page_size(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
