//! # Object Storage Keys
//!
//! Keys for product images, namespaced by the tenant's public token:
//!
//! ```text
//! tenants/{tenant_token}/products/{product_token}_{unix_seconds}.{ext}
//! ```
//!
//! The namespace is derived from the scope, never from caller input, so two
//! tenants cannot produce the same key and a raw tenant id never appears in
//! a path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::ids::IdCodec;
use crate::tenant::TenantScope;

const MAX_EXTENSION_LEN: usize = 8;

/// A storage key inside some tenant's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Wraps a key read back from storage (e.g. a product's image reference).
    pub fn from_stored(key: impl Into<String>) -> Self {
        ObjectKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the key lives under `namespace`.
    pub fn is_within(&self, namespace: &TenantNamespace) -> bool {
        self.0.starts_with(namespace.prefix())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `tenants/{tenant_token}/` for one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantNamespace(String);

impl TenantNamespace {
    pub fn for_scope(scope: &TenantScope, codec: &IdCodec) -> Self {
        TenantNamespace(format!(
            "tenants/{}/",
            codec.encode_row_id(scope.tenant_id().get())
        ))
    }

    pub fn prefix(&self) -> &str {
        &self.0
    }

    /// Key for a product image uploaded at `uploaded_at`.
    ///
    /// ## Arguments
    /// * `product_token` - the product's public id
    /// * `extension` - file extension with or without the leading dot
    pub fn product_image_key(
        &self,
        product_token: &str,
        extension: &str,
        uploaded_at: DateTime<Utc>,
    ) -> Result<ObjectKey, ValidationError> {
        let ext = normalize_extension(extension)?;
        Ok(ObjectKey(format!(
            "{}products/{}_{}.{}",
            self.0,
            product_token,
            uploaded_at.timestamp(),
            ext
        )))
    }
}

/// Strips a leading dot and lowercases; only short alphanumeric extensions.
fn normalize_extension(extension: &str) -> Result<String, ValidationError> {
    let ext = extension.trim().trim_start_matches('.');

    if ext.is_empty() {
        return Err(ValidationError::required("extension"));
    }
    if ext.len() > MAX_EXTENSION_LEN {
        return Err(ValidationError::TooLong {
            field: "extension".to_string(),
            max: MAX_EXTENSION_LEN,
        });
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::invalid_format(
            "extension",
            "must contain only letters and digits",
        ));
    }

    Ok(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdCodecConfig;
    use crate::tenant::TenantId;
    use chrono::TimeZone;

    fn codec() -> IdCodec {
        IdCodec::new(IdCodecConfig::with_salt("keys")).unwrap()
    }

    #[test]
    fn test_product_image_key_layout() {
        let codec = codec();
        let scope = TenantScope::new(TenantId::new(3));
        let ns = TenantNamespace::for_scope(&scope, &codec);
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 9, 15, 0).unwrap();

        let key = ns.product_image_key("PRODTOK", ".JPG", at).unwrap();

        assert_eq!(
            key.as_str(),
            format!("tenants/{}/products/PRODTOK_{}.jpg", codec.encode(3), at.timestamp())
        );
        assert!(key.is_within(&ns));
    }

    #[test]
    fn test_namespaces_never_overlap() {
        let codec = codec();
        let a = TenantNamespace::for_scope(&TenantScope::new(TenantId::new(1)), &codec);
        let b = TenantNamespace::for_scope(&TenantScope::new(TenantId::new(2)), &codec);

        let key = a.product_image_key("P", "png", Utc::now()).unwrap();
        assert!(key.is_within(&a));
        assert!(!key.is_within(&b));
    }

    #[test]
    fn test_rejects_bad_extensions() {
        let ns = TenantNamespace::for_scope(&TenantScope::new(TenantId::new(1)), &codec());
        let now = Utc::now();
        assert!(ns.product_image_key("P", "", now).is_err());
        assert!(ns.product_image_key("P", "../../etc", now).is_err());
        assert!(ns.product_image_key("P", "averyverylongext", now).is_err());
    }
}
