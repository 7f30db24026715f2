//! JWT authentication module.
//!
//! Two credential classes, kept apart on purpose:
//!
//! - **Access tokens** (HS256 JWT) for tenant users. The tenant claim is the
//!   encoded tenant token; it becomes a `TenantScope` per request.
//! - **Platform-admin credentials** (username + argon2 hash from config).
//!   Only [`AdminGuard::authorize`] can mint a [`PlatformScope`], and a
//!   `PlatformScope` is what tenant management requires.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use tillpoint_core::UserRole;

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (encoded user id)
    pub sub: String,

    pub username: String,

    pub role: UserRole,

    /// Encoded tenant id; absent for users not bound to a tenant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: impl Into<String>, lifetime_secs: i64) -> Self {
        JwtManager {
            secret: secret.into(),
            lifetime_secs,
        }
    }

    /// Generate an access token.
    ///
    /// ## Arguments
    /// * `user_token` - encoded user id
    /// * `tenant_token` - encoded tenant id, if the user is bound to one
    pub fn issue(
        &self,
        user_token: &str,
        username: &str,
        role: UserRole,
        tenant_token: Option<&str>,
    ) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user_token.to_string(),
            username: username.to_string(),
            role,
            tenant_id: tenant_token.map(str::to_string),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!(error = %e, "Token rejected");
            ApiError::unauthorized("Invalid or expired token")
        })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage (argon2id, random salt, PHC string).
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Platform Admin
// =============================================================================

/// Proof that the caller authenticated as the platform admin.
///
/// The private field keeps this unconstructible outside this module.
#[derive(Debug, Clone)]
pub struct PlatformScope {
    username: String,
}

impl PlatformScope {
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Checks platform-admin credentials against the configured account.
pub struct AdminGuard {
    username: String,
    password_hash: String,
}

impl AdminGuard {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        AdminGuard {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }

    /// Authorizes a platform-admin request.
    ///
    /// ## Errors
    /// `ApiError::Unauthorized` for any wrong username or password; the two
    /// cases are not distinguished.
    pub fn authorize(&self, username: &str, password: &str) -> ApiResult<PlatformScope> {
        // Verify even on a wrong username so both failures cost the same.
        let password_ok = verify_password(password, &self.password_hash);

        if username != self.username || !password_ok {
            warn!(username = %username, "Platform admin authentication failed");
            return Err(ApiError::unauthorized("Invalid admin credentials"));
        }

        Ok(PlatformScope {
            username: self.username.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 3600);

        let token = manager
            .issue("USR0001", "kasir01", UserRole::User, Some("TNT0001"))
            .unwrap();

        let claims = manager.validate(&token).unwrap();

        assert_eq!(claims.sub, "USR0001");
        assert_eq!(claims.username, "kasir01");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.tenant_id.as_deref(), Some("TNT0001"));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);

        let token = issuer.issue("USR0001", "kasir01", UserRole::User, None).unwrap();
        assert!(matches!(verifier.validate(&token), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token() {
        // Past the default 60s leeway.
        let manager = JwtManager::new("test-secret", -120);
        let token = manager.issue("USR0001", "kasir01", UserRole::User, None).unwrap();
        assert!(manager.validate(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(verify_password("rahasia123", &hash));
        assert!(!verify_password("rahasia124", &hash));
        assert!(!verify_password("rahasia123", "not-a-phc-string"));
    }

    #[test]
    fn test_admin_guard() {
        let guard = AdminGuard::new("root", hash_password("platform-pass").unwrap());

        let scope = guard.authorize("root", "platform-pass").unwrap();
        assert_eq!(scope.username(), "root");

        assert!(guard.authorize("root", "wrong").is_err());
        assert!(guard.authorize("someone", "platform-pass").is_err());
    }
}
