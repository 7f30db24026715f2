//! # Public Identifiers
//!
//! Reversible, salted encoding of numeric row ids into short opaque tokens.
//!
//! ## Where Tokens Appear
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  row id 42 ──encode──► "X7KQ2PA"                                        │
//! │                          │                                              │
//! │                          ├──► JSON payloads   { "id": "X7KQ2PA" }       │
//! │                          ├──► JWT claims      { "tenant_id": "..." }    │
//! │                          └──► storage keys    tenants/X7KQ2PA/...       │
//! │                                                                         │
//! │  "X7KQ2PA" ──decode──► 42     "garbage" ──decode──► InvalidTokenFormat  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scheme is hashids (via the `harsh` crate), so tokens issued by
//! earlier deployments stay valid under the same salt, alphabet and minimum
//! length. It obfuscates ordering and makes enumeration tedious. It is not
//! encryption.

use std::fmt;
use std::sync::Arc;

use harsh::Harsh;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Constants
// =============================================================================

/// Alphabet used by existing deployments.
pub const DEFAULT_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";

/// Minimum token length used by existing deployments.
pub const DEFAULT_MIN_LENGTH: usize = 7;

const MIN_ALPHABET_LENGTH: usize = 16;

// =============================================================================
// Configuration
// =============================================================================

/// Keying material for [`IdCodec`].
///
/// Injected from configuration so the salt can be rotated per deployment
/// and swapped in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCodecConfig {
    pub salt: String,
    pub alphabet: String,
    pub min_length: usize,
}

impl IdCodecConfig {
    /// Default alphabet and length with the given salt.
    pub fn with_salt(salt: impl Into<String>) -> Self {
        IdCodecConfig {
            salt: salt.into(),
            alphabet: DEFAULT_ALPHABET.to_string(),
            min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = alphabet.into();
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Rejects alphabets that would make tokens ambiguous.
    fn validate(&self) -> Result<(), ValidationError> {
        let alphabet: Vec<char> = self.alphabet.chars().collect();

        if alphabet.len() < MIN_ALPHABET_LENGTH {
            return Err(ValidationError::TooShort {
                field: "id alphabet".to_string(),
                min: MIN_ALPHABET_LENGTH,
            });
        }
        for (i, c) in alphabet.iter().enumerate() {
            if !c.is_ascii_graphic() {
                return Err(ValidationError::invalid_format(
                    "id alphabet",
                    "only printable ASCII without whitespace is allowed",
                ));
            }
            if alphabet[..i].contains(c) {
                return Err(ValidationError::invalid_format(
                    "id alphabet",
                    format!("duplicate character '{c}'"),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Codec
// =============================================================================

/// Encodes and decodes public identifiers.
///
/// ## Example
/// ```rust
/// use tillpoint_core::ids::{IdCodec, IdCodecConfig};
///
/// let codec = IdCodec::new(IdCodecConfig::with_salt("pepper")).unwrap();
/// let token = codec.encode(42);
/// assert_eq!(token.len(), 7);
/// assert_eq!(codec.decode(&token).unwrap(), 42);
/// assert!(codec.decode("not-a-token").is_err());
/// ```
#[derive(Clone)]
pub struct IdCodec {
    harsh: Arc<Harsh>,
    alphabet: String,
    min_length: usize,
    /// Longest token a single id can produce; anything longer is rejected
    /// before decoding.
    max_token_length: usize,
}

impl IdCodec {
    /// Builds the codec.
    ///
    /// ## Errors
    /// `ValidationError` if the alphabet has fewer than 16 characters,
    /// repeats a character, or contains whitespace or non-ASCII characters.
    pub fn new(config: IdCodecConfig) -> Result<Self, ValidationError> {
        config.validate()?;

        let harsh = Harsh::builder()
            .salt(config.salt.as_bytes())
            .alphabet(config.alphabet.as_bytes())
            .length(config.min_length)
            .build()
            .map_err(|e| ValidationError::invalid_format("id alphabet", e.to_string()))?;

        let max_token_length = harsh.encode(&[u64::MAX]).len().max(config.min_length);

        Ok(IdCodec {
            harsh: Arc::new(harsh),
            alphabet: config.alphabet,
            min_length: config.min_length,
            max_token_length,
        })
    }

    /// Encodes one id. Deterministic for a given configuration.
    pub fn encode(&self, id: u64) -> String {
        self.harsh.encode(&[id])
    }

    /// Decodes a token produced by [`IdCodec::encode`] under the same keying.
    ///
    /// ## Errors
    /// `InvalidTokenFormat` when the token contains foreign characters,
    /// decodes to zero or several values, or does not re-encode to itself
    /// (tampered, or issued under another salt).
    pub fn decode(&self, token: &str) -> CoreResult<u64> {
        if token.is_empty()
            || token.len() > self.max_token_length
            || !token.chars().all(|c| self.alphabet.contains(c))
        {
            return Err(CoreError::invalid_token(token));
        }

        match self.harsh.decode(token).as_deref() {
            Ok([id]) if self.encode(*id) == token => Ok(*id),
            _ => Err(CoreError::invalid_token(token)),
        }
    }

    /// Encodes a database row id. Row ids are positive.
    pub fn encode_row_id(&self, id: i64) -> String {
        self.encode(id as u64)
    }

    /// Decodes a token into a database row id.
    pub fn decode_row_id(&self, token: &str) -> CoreResult<i64> {
        let id = self.decode(token)?;
        i64::try_from(id).map_err(|_| CoreError::invalid_token(token))
    }
}

impl fmt::Debug for IdCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Salt stays out of logs.
        f.debug_struct("IdCodec")
            .field("alphabet", &self.alphabet)
            .field("min_length", &self.min_length)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
