//! Authentication service.
//!
//! Logs tenant users in, resolves the `TenantScope` of a bearer token, and
//! lets the platform admin register users.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::auth::{extract_bearer_token, hash_password, verify_password, PlatformScope};
use crate::error::{ApiError, ApiResult};
use crate::services::decode_id;
use crate::views::{LoginView, UserView};
use crate::AppState;
use tillpoint_core::validation::{validate_password, validate_username};
use tillpoint_core::{NewUser, TenantId, TenantScope, UserRole};

/// Input for registering a user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserInput {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    /// Public token of the tenant the user works for
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// Authentication service.
pub struct AuthService {
    state: Arc<AppState>,
}

impl AuthService {
    pub fn new(state: Arc<AppState>) -> Self {
        AuthService { state }
    }

    /// Platform-admin credential check; see [`AdminGuard`](crate::auth::AdminGuard).
    pub fn authorize_admin(&self, username: &str, password: &str) -> ApiResult<PlatformScope> {
        self.state.admin.authorize(username, password)
    }

    /// Creates a user, optionally bound to a tenant.
    ///
    /// ## Errors
    /// * `Validation` - bad username or password
    /// * `NotFound` - the tenant token names no tenant
    /// * `Conflict` - username taken
    pub async fn register_user(
        &self,
        admin: &PlatformScope,
        input: RegisterUserInput,
    ) -> ApiResult<UserView> {
        let codec = &self.state.codec;
        validate_username(&input.username)?;
        validate_password(&input.password)?;

        let tenant_id = match input.tenant_id.as_deref() {
            Some(token) => {
                let id = decode_id(codec, token)?;
                self.state
                    .db
                    .tenants()
                    .get(id)
                    .await
                    .map_err(|e| ApiError::from_db("register user", e, codec))?;
                Some(TenantId::new(id))
            }
            None => None,
        };

        let user = self
            .state
            .db
            .users()
            .create(&NewUser {
                username: input.username,
                password_hash: hash_password(&input.password)?,
                role: input.role,
                tenant_id,
            })
            .await
            .map_err(|e| ApiError::from_db("register user", e, codec))?;

        info!(admin = %admin.username(), user = %user.username, "User registered");
        Ok(UserView::new(user, codec))
    }

    /// Verifies credentials and issues an access token.
    ///
    /// ## Errors
    /// `Unauthorized` for an unknown user or a wrong password, without
    /// saying which.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginView> {
        let codec = &self.state.codec;

        let user = self
            .state
            .db
            .users()
            .find_by_username(username)
            .await
            .map_err(|e| ApiError::from_db("login", e, codec))?;

        let user = match user {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                warn!(username = %username.trim(), "Login failed");
                return Err(ApiError::unauthorized("Invalid username or password"));
            }
        };

        let user_token = codec.encode_row_id(user.id);
        let tenant_token = user.tenant_id.map(|t| codec.encode_row_id(t.get()));
        let access_token = self.state.jwt.issue(
            &user_token,
            &user.username,
            user.role,
            tenant_token.as_deref(),
        )?;

        info!(user = %user.username, tenant = ?tenant_token, "Login succeeded");
        Ok(LoginView {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.state.config.jwt_expiry_secs,
            user: UserView::new(user, codec),
        })
    }

    /// Resolves the tenant scope of an `Authorization` header value.
    ///
    /// ## Errors
    /// * `Unauthorized` - no bearer token, or it is invalid or expired
    /// * `MissingTenantScope` - the token carries no tenant
    /// * `InvalidToken` - the tenant claim does not decode
    pub fn resolve_scope(&self, authorization: &str) -> ApiResult<TenantScope> {
        let token = extract_bearer_token(authorization)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        let claims = self.state.jwt.validate(token)?;

        let scope = TenantScope::resolve(claims.tenant_id.as_deref(), &self.state.codec)
            .map_err(|e| ApiError::from_core(e, &self.state.codec))?;

        debug!(user = %claims.username, tenant = %scope, "Scope resolved");
        Ok(scope)
    }
}
