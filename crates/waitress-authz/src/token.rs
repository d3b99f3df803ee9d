//! Bearer token minting and verification.
//!
//! # Purpose
//! Signs and verifies the compact JWS credentials carried in the
//! `Authorization: Bearer` header.
//!
//! # Key invariants
//! - Only HMAC algorithms (HS256/HS384/HS512) are accepted; asymmetric or
//!   `none` algorithms are rejected when the verifier is built.
//! - A token whose header names a different algorithm than the configured one
//!   fails verification even if the secret matches.
//! - Expiry is checked against the injected [`Clock`], separately from the
//!   signature: `exp <= now` is expired.
//!
//! # Security model
//! - The secret is never logged; [`TokenSecret`]'s `Debug` output is redacted.
//! - Callers must not report which verification step failed to clients.
use crate::{Clock, Role};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Claims carried by bearer tokens.
///
/// `role` also accepts the legacy `authType` field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userID", default)]
    pub user_id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(alias = "authType")]
    pub role: String,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("unsupported signing algorithm: {0:?}")]
    UnsupportedAlgorithm(Algorithm),
    #[error("token secret is empty")]
    EmptySecret,
    #[error("token expired at {expires_at} (now {now})")]
    Expired { expires_at: i64, now: i64 },
}

/// Shared HMAC secret.
#[derive(Clone)]
pub struct TokenSecret(Vec<u8>);

impl TokenSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let bytes = secret.into();
        if bytes.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self(bytes))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenSecret(<redacted>)")
    }
}

fn ensure_hmac(algorithm: Algorithm) -> Result<Algorithm, TokenError> {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(TokenError::UnsupportedAlgorithm(other)),
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(
        secret: &TokenSecret,
        algorithm: Algorithm,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        let algorithm = ensure_hmac(algorithm)?;
        Ok(Self {
            algorithm,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            clock,
        })
    }

    /// Verify signature and algorithm, then check expiry against the clock.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &validation)?;

        let now = self.clock.now_epoch_seconds();
        if data.claims.expires_at <= now {
            return Err(TokenError::Expired {
                expires_at: data.claims.expires_at,
                now,
            });
        }
        Ok(data.claims)
    }
}

pub struct TokenIssuer {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(
        secret: &TokenSecret,
        algorithm: Algorithm,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        let algorithm = ensure_hmac(algorithm)?;
        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
            clock,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Epoch second at which anything issued now stops being valid.
    pub fn expires_at(&self) -> i64 {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        self.clock.now_epoch_seconds().saturating_add(ttl)
    }

    pub fn mint(&self, user_id: u64, email: &str, role: Role) -> Result<String, TokenError> {
        let claims = TokenClaims {
            user_id,
            email: email.to_string(),
            role: role.to_string(),
            expires_at: self.expires_at(),
        };
        let token = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }
}
