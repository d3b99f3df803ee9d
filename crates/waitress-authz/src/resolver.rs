//! Dual-channel caller authentication.
//!
//! # Purpose
//! Produces the caller's [`AuthenticationClaim`] from either a bearer token or
//! a server-side session, in that order.
//!
//! # Key invariants
//! - The session store is never touched when the token channel succeeds.
//! - Channel failures are collapsed into [`ResolveError::Unauthenticated`]; the
//!   specific reason is only emitted at `debug`.
//! - Nothing is retried; a session store error counts as "no session".
use crate::{Role, SessionStore, TokenVerifier};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Authorization scheme prefix, matched case-sensitively.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Raw request credentials, borrowed from the inbound request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub authorization: Option<&'a str>,
    pub session_id: Option<&'a str>,
}

#[cfg(test)]
impl<'a> Credentials<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn bearer(authorization: &'a str) -> Self {
        Self {
            authorization: Some(authorization),
            session_id: None,
        }
    }

    pub fn session(session_id: &'a str) -> Self {
        Self {
            authorization: None,
            session_id: Some(session_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimSource {
    Token,
    Session,
}

impl ClaimSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimSource::Token => "token",
            ClaimSource::Session => "session",
        }
    }
}

/// Request-scoped identity produced by a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationClaim {
    pub role: Role,
    pub source: ClaimSource,
    pub subject: String,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("authentication required")]
    Unauthenticated,
}

#[derive(Debug)]
enum ChannelFailure {
    MissingHeader,
    MalformedScheme,
    InvalidToken,
    UnknownRole,
    MissingCookie,
    NoSession,
    EmptyRole,
    StoreUnavailable,
}

/// Token from an `Authorization` header value, if it uses the bearer scheme.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}

#[derive(Clone)]
pub struct AuthResolver {
    verifier: TokenVerifier,
    sessions: Arc<dyn SessionStore>,
}

impl AuthResolver {
    pub fn new(verifier: TokenVerifier, sessions: Arc<dyn SessionStore>) -> Self {
        Self { verifier, sessions }
    }

    pub async fn resolve(
        &self,
        credentials: &Credentials<'_>,
    ) -> Result<AuthenticationClaim, ResolveError> {
        let token_failure = match self.token_channel(credentials.authorization) {
            Ok(claim) => return Ok(claim),
            Err(failure) => failure,
        };
        tracing::debug!(reason = ?token_failure, "token channel failed; trying session");

        match self.session_channel(credentials.session_id).await {
            Ok(claim) => Ok(claim),
            Err(session_failure) => {
                tracing::debug!(reason = ?session_failure, "session channel failed");
                Err(ResolveError::Unauthenticated)
            }
        }
    }

    fn token_channel(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticationClaim, ChannelFailure> {
        let header = authorization.ok_or(ChannelFailure::MissingHeader)?;
        let token = bearer_token(header).ok_or(ChannelFailure::MalformedScheme)?;
        let claims = self
            .verifier
            .verify(token)
            .map_err(|err| {
                tracing::debug!(error = %err, "bearer token rejected");
                ChannelFailure::InvalidToken
            })?;
        let role = claims.role.parse::<Role>().map_err(|err| {
            tracing::debug!(error = %err, "token carries an unknown role");
            ChannelFailure::UnknownRole
        })?;
        let subject = if claims.email.is_empty() {
            claims.user_id.to_string()
        } else {
            claims.email
        };
        Ok(AuthenticationClaim {
            role,
            source: ClaimSource::Token,
            subject,
        })
    }

    async fn session_channel(
        &self,
        session_id: Option<&str>,
    ) -> Result<AuthenticationClaim, ChannelFailure> {
        let session_id = session_id
            .filter(|id| !id.is_empty())
            .ok_or(ChannelFailure::MissingCookie)?;
        let record = match self.sessions.get(session_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(ChannelFailure::NoSession),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    backend = self.sessions.backend_name(),
                    "session lookup failed"
                );
                return Err(ChannelFailure::StoreUnavailable);
            }
        };
        if record.role.is_empty() {
            return Err(ChannelFailure::EmptyRole);
        }
        let role = record.role.parse::<Role>().map_err(|err| {
            tracing::debug!(error = %err, "session carries an unknown role");
            ChannelFailure::UnknownRole
        })?;
        Ok(AuthenticationClaim {
            role,
            source: ClaimSource::Session,
            subject: record.subject,
        })
    }
}
