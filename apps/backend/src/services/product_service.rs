//! # Product Service
//!
//! The tenant's product catalog and stock ledger, plus product images.
//!
//! ## Image Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Image Upload                                 │
//! │                                                                         │
//! │  image_upload_url(scope, "K3XQ9PL", "png")                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  scoped product lookup ──► NotFound for other tenants' products        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  key = tenants/{tenant_token}/products/{product_token}_{unix}.png      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  image_ref = key (stored)  ──►  presigned PUT url (15 min)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads go the other way: the stored key is only served when it lies in
//! the caller's namespace.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::services::decode_id;
use crate::storage::StorageError;
use crate::views::{PageView, PresignedUrlView, ProductView};
use crate::AppState;
use tillpoint_core::object_key::{ObjectKey, TenantNamespace};
use tillpoint_core::validation::{validate_stock, validate_stock_delta};
use tillpoint_core::{NewProduct, PageRequest, Product, ProductPatch, TenantScope, ValidationError};
use tillpoint_db::ProductRepository;

/// Product catalog service.
pub struct ProductService {
    state: Arc<AppState>,
}

impl ProductService {
    pub fn new(state: Arc<AppState>) -> Self {
        ProductService { state }
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    pub async fn get(&self, scope: &TenantScope, product_id: &str) -> ApiResult<ProductView> {
        let product = self.find(scope, product_id).await?;
        Ok(self.view(product))
    }

    /// Paginated listing; `page` and `page_size` are clamped.
    pub async fn list(
        &self,
        scope: &TenantScope,
        page: i64,
        page_size: i64,
    ) -> ApiResult<PageView<ProductView>> {
        let request = PageRequest::new(page, page_size);
        let page = self
            .state
            .db
            .products()
            .list(scope, request)
            .await
            .map_err(|e| self.db_error("list products", e))?;

        Ok(PageView::from_page(page, |p| self.view(p)))
    }

    /// Creates a product for the scope's tenant.
    ///
    /// ## Errors
    /// * `Validation` - bad name, SKU, prices or stock
    /// * `DuplicateSku` - SKU already used by this tenant
    pub async fn create(&self, scope: &TenantScope, input: NewProduct) -> ApiResult<ProductView> {
        input.validate()?;

        let product = self
            .state
            .db
            .products()
            .create(scope, &input)
            .await
            .map_err(|e| self.db_error("create product", e))?;

        Ok(self.view(product))
    }

    /// Applies a partial update.
    pub async fn update(
        &self,
        scope: &TenantScope,
        product_id: &str,
        patch: ProductPatch,
    ) -> ApiResult<ProductView> {
        if patch.is_empty() {
            return Err(ApiError::Validation("No fields to update".to_string()));
        }
        patch.validate()?;
        let id = decode_id(&self.state.codec, product_id)?;

        let product = self
            .state
            .db
            .products()
            .update(scope, id, patch)
            .await
            .map_err(|e| self.db_error("update product", e))?;

        Ok(self.view(product))
    }

    /// Sets the absolute stock level.
    pub async fn update_stock(
        &self,
        scope: &TenantScope,
        product_id: &str,
        quantity: i64,
    ) -> ApiResult<ProductView> {
        validate_stock(quantity)?;
        let id = decode_id(&self.state.codec, product_id)?;

        let product = self
            .state
            .db
            .products()
            .set_stock(scope, id, quantity)
            .await
            .map_err(|e| self.db_error("update stock", e))?;

        info!(tenant = %scope, product = %product_id, stock = quantity, "Stock set");
        Ok(self.view(product))
    }

    /// Adds `delta` to the stock level in its own transaction.
    ///
    /// ## Errors
    /// * `Validation` - zero, or larger than `MAX_STOCK_ADJUSTMENT` either way
    /// * `NotFound` - absent or owned by another tenant
    /// * `InsufficientStock` - the result would be negative
    pub async fn adjust_stock(
        &self,
        scope: &TenantScope,
        product_id: &str,
        delta: i64,
    ) -> ApiResult<ProductView> {
        validate_stock_delta(delta)?;
        let id = decode_id(&self.state.codec, product_id)?;

        let mut tx = self
            .state
            .db
            .begin()
            .await
            .map_err(|e| self.db_error("adjust stock", e))?;
        let product = ProductRepository::adjust_stock(&mut tx, scope, id, delta)
            .await
            .map_err(|e| self.db_error("adjust stock", e))?;
        tx.commit()
            .await
            .map_err(|e| self.db_error("adjust stock", e.into()))?;

        info!(tenant = %scope, product = %product_id, delta, stock = product.stock, "Stock adjusted");
        Ok(self.view(product))
    }

    /// Deletes a product that no committed sale references.
    ///
    /// ## Errors
    /// * `NotFound` - absent or owned by another tenant
    /// * `Conflict` - sale lines reference the product
    pub async fn delete(&self, scope: &TenantScope, product_id: &str) -> ApiResult<()> {
        let product = self.find(scope, product_id).await?;

        let references = self
            .state
            .db
            .sales()
            .count_lines_for_product(product.id)
            .await
            .map_err(|e| self.db_error("delete product", e))?;
        if references > 0 {
            warn!(tenant = %scope, product = %product_id, references, "Delete refused");
            return Err(ApiError::Conflict(format!(
                "Product {} is referenced by {} sale line(s)",
                product_id.trim(),
                references
            )));
        }

        self.state
            .db
            .products()
            .delete(scope, product.id)
            .await
            .map_err(|e| self.db_error("delete product", e))
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// Reserves an image key for the product and presigns an upload to it.
    pub async fn image_upload_url(
        &self,
        scope: &TenantScope,
        product_id: &str,
        extension: &str,
    ) -> ApiResult<PresignedUrlView> {
        let product = self.find(scope, product_id).await?;
        let key = self.image_key(scope, &product, extension)?;

        self.state
            .db
            .products()
            .set_image_ref(scope, product.id, key.as_str())
            .await
            .map_err(|e| self.db_error("reserve image key", e))?;

        let ttl = self.state.config.presign_upload_ttl;
        let url = self
            .state
            .store
            .presign(&key, ttl, true)
            .await
            .map_err(|e| self.storage_error("presign image upload", e))?;

        debug!(tenant = %scope, key = %key, "Upload URL issued");
        Ok(PresignedUrlView {
            url,
            key: key.to_string(),
            expires_in_secs: ttl.as_secs(),
        })
    }

    /// Stores image bytes directly and records the key on the product.
    pub async fn upload_image(
        &self,
        scope: &TenantScope,
        product_id: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ApiResult<ProductView> {
        if bytes.is_empty() {
            return Err(ValidationError::required("image").into());
        }
        let product = self.find(scope, product_id).await?;
        let key = self.image_key(scope, &product, extension_for(content_type)?)?;

        self.state
            .store
            .put(&key, bytes, content_type)
            .await
            .map_err(|e| self.storage_error("store image", e))?;

        let product = self
            .state
            .db
            .products()
            .set_image_ref(scope, product.id, key.as_str())
            .await
            .map_err(|e| self.db_error("record image", e))?;

        info!(tenant = %scope, key = %key, "Product image stored");
        Ok(self.view(product))
    }

    /// Presigns a download of the product's image.
    pub async fn image_download_url(
        &self,
        scope: &TenantScope,
        product_id: &str,
    ) -> ApiResult<PresignedUrlView> {
        let key = self.stored_image_key(scope, product_id).await?;
        let ttl = self.state.config.presign_download_ttl;

        let url = self
            .state
            .store
            .presign(&key, ttl, false)
            .await
            .map_err(|e| self.storage_error("presign image download", e))?;

        Ok(PresignedUrlView {
            url,
            key: key.to_string(),
            expires_in_secs: ttl.as_secs(),
        })
    }

    /// Reads the product's image bytes.
    pub async fn download_image(&self, scope: &TenantScope, product_id: &str) -> ApiResult<Vec<u8>> {
        let key = self.stored_image_key(scope, product_id).await?;

        self.state.store.get(&key).await.map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("Product image", product_id.trim()),
            other => self.storage_error("read image", other),
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn find(&self, scope: &TenantScope, product_id: &str) -> ApiResult<Product> {
        let id = decode_id(&self.state.codec, product_id)?;
        self.state
            .db
            .products()
            .get(scope, id)
            .await
            .map_err(|e| self.db_error("get product", e))
    }

    fn image_key(
        &self,
        scope: &TenantScope,
        product: &Product,
        extension: &str,
    ) -> ApiResult<ObjectKey> {
        let namespace = TenantNamespace::for_scope(scope, &self.state.codec);
        let token = self.state.codec.encode_row_id(product.id);
        Ok(namespace.product_image_key(&token, extension, Utc::now())?)
    }

    /// The product's image key, if it has one inside the caller's namespace.
    async fn stored_image_key(&self, scope: &TenantScope, product_id: &str) -> ApiResult<ObjectKey> {
        let product = self.find(scope, product_id).await?;
        let namespace = TenantNamespace::for_scope(scope, &self.state.codec);

        match product.image_ref.map(ObjectKey::from_stored) {
            Some(key) if key.is_within(&namespace) => Ok(key),
            Some(key) => {
                warn!(tenant = %scope, key = %key, "Image key outside tenant namespace");
                Err(ApiError::not_found("Product image", product_id.trim()))
            }
            None => Err(ApiError::not_found("Product image", product_id.trim())),
        }
    }

    fn view(&self, product: Product) -> ProductView {
        ProductView::new(product, &self.state.codec)
    }

    fn db_error(&self, operation: &'static str, err: tillpoint_db::DbError) -> ApiError {
        ApiError::from_db(operation, err, &self.state.codec)
    }

    fn storage_error(&self, operation: &'static str, err: StorageError) -> ApiError {
        error!(operation, error = %err, "Object storage failed");
        ApiError::Storage {
            operation,
            message: err.to_string(),
        }
    }
}

/// File extension for an image content type (`image/png` → `png`).
fn extension_for(content_type: &str) -> Result<&str, ValidationError> {
    let subtype = content_type
        .split(';')
        .next()
        .and_then(|mime| mime.trim().strip_prefix("image/"))
        .ok_or_else(|| ValidationError::invalid_format("content_type", "expected image/*"))?;

    // image/svg+xml → svg
    Ok(subtype.split('+').next().unwrap_or(subtype))
}
