//! Backend configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. Secrets (JWT secret, admin credentials, id salt) have no
//! defaults and must be set.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tillpoint_core::ids::{DEFAULT_ALPHABET, DEFAULT_MIN_LENGTH};
use tillpoint_core::{IdCodec, IdCodecConfig};
use tillpoint_db::DbConfig;

/// Placeholder secret shipped in sample env files; never accepted.
const PLACEHOLDER_SECRET: &str = "change-me";

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// HS256 signing secret for access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_expiry_secs: i64,

    /// Platform-admin username
    pub admin_username: String,

    /// Platform-admin password (argon2 PHC string)
    pub admin_password_hash: String,

    /// Keying salt for public identifiers
    pub id_salt: String,

    /// Alphabet for public identifiers
    pub id_alphabet: String,

    /// Minimum public identifier length
    pub id_min_length: usize,

    /// Object storage bucket
    pub storage_bucket: String,

    /// Lifetime of presigned upload URLs
    pub presign_upload_ttl: Duration,

    /// Lifetime of presigned download URLs
    pub presign_download_ttl: Duration,

    /// Upper bound for one sale's atomic unit
    pub sale_timeout: Duration,

    /// Fallback log filter when RUST_LOG is unset
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let vars: HashMap<&str, &str> = [("JWT_SECRET", "s3cret"), ...].into();
    /// let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()))?;
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = required(&lookup, "JWT_SECRET")?;
        if jwt_secret == PLACEHOLDER_SECRET {
            return Err(ConfigError::invalid(
                "JWT_SECRET",
                "placeholder secret must be replaced",
            ));
        }

        let config = AppConfig {
            database_path: PathBuf::from(
                lookup("DATABASE_PATH").unwrap_or_else(|| "tillpoint.db".to_string()),
            ),

            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 5)?,

            jwt_secret,

            jwt_expiry_secs: parsed(&lookup, "JWT_EXPIRY_SECS", 86_400)?, // 24 hours

            admin_username: required(&lookup, "ADMIN_USERNAME")?,

            admin_password_hash: required(&lookup, "ADMIN_PASSWORD_HASH")?,

            id_salt: required(&lookup, "ID_SALT")?,

            id_alphabet: lookup("ID_ALPHABET").unwrap_or_else(|| DEFAULT_ALPHABET.to_string()),

            id_min_length: parsed(&lookup, "ID_MIN_LENGTH", DEFAULT_MIN_LENGTH)?,

            storage_bucket: lookup("STORAGE_BUCKET").unwrap_or_else(|| "tillpoint".to_string()),

            presign_upload_ttl: Duration::from_secs(parsed(
                &lookup,
                "PRESIGN_UPLOAD_TTL_SECS",
                900, // 15 minutes
            )?),

            presign_download_ttl: Duration::from_secs(parsed(
                &lookup,
                "PRESIGN_DOWNLOAD_TTL_SECS",
                3_600, // 1 hour
            )?),

            sale_timeout: Duration::from_millis(parsed(&lookup, "SALE_TIMEOUT_MS", 5_000)?),

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::invalid("DB_MAX_CONNECTIONS", "must be at least 1"));
        }
        if config.jwt_expiry_secs <= 0 {
            return Err(ConfigError::invalid("JWT_EXPIRY_SECS", "must be positive"));
        }
        if config.sale_timeout.is_zero() {
            return Err(ConfigError::invalid("SALE_TIMEOUT_MS", "must be positive"));
        }

        Ok(config)
    }

    /// Builds the identifier codec from the configured salt and alphabet.
    pub fn id_codec(&self) -> Result<IdCodec, ConfigError> {
        IdCodec::new(
            IdCodecConfig::with_salt(self.id_salt.clone())
                .alphabet(self.id_alphabet.clone())
                .min_length(self.id_min_length),
        )
        .map_err(|e| ConfigError::invalid("ID_ALPHABET", e.to_string()))
    }

    /// Pool configuration for the configured database file.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.db_max_connections)
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingRequired(key.to_string()))
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
