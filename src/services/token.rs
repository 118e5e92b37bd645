// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuing and verification.
//!
//! Tokens are HS256 JWTs signed with the shared `JWT_SECRET`. They are
//! stateless apart from a small revocation set: logging out records the
//! token's `jti` until its natural expiry so the same token cannot be
//! replayed.

use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lifetime of a session token (and of the cookie carrying it).
pub const SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email the user logged in with
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Token ID, used for revocation
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Identity a token is issued for.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: Option<String>,
}

/// A freshly signed token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token missing")]
    Missing,

    #[error("token expired")]
    Expired,

    #[error("token malformed or signature invalid")]
    Invalid,

    #[error("token revoked")]
    Revoked,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("system clock error: {0}")]
    Clock(#[from] std::time::SystemTimeError),
}

/// Current Unix time in seconds.
pub fn unix_now() -> Result<u64, TokenError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Sign a token for `identity` valid from `now` for `ttl`.
pub fn issue_token(
    identity: &Identity,
    secret: &[u8],
    ttl: Duration,
    now: u64,
) -> Result<IssuedToken, TokenError> {
    let claims = Claims {
        sub: identity.id.clone(),
        email: identity.email.clone(),
        role: identity.role.clone(),
        jti: uuid::Uuid::new_v4().to_string(),
        iat: now,
        exp: now + ttl.as_secs(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?;

    Ok(IssuedToken { token, claims })
}

/// Verify signature and expiry of `token` as of `now`.
///
/// Expiry is checked here rather than by `jsonwebtoken` so callers can pin
/// the clock. A token with `exp <= now` is expired.
pub fn verify_token(token: &str, secret: &[u8], now: u64) -> Result<Claims, TokenError> {
    if token.trim().is_empty() {
        return Err(TokenError::Missing);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            TokenError::Invalid
        })?;

    if token_data.claims.exp <= now {
        return Err(TokenError::Expired);
    }

    Ok(token_data.claims)
}

/// Issues and verifies session tokens, tracking revoked token IDs.
#[derive(Clone)]
pub struct TokenService {
    secret: Arc<Vec<u8>>,
    ttl: Duration,
    /// jti -> exp of tokens revoked before they expired
    revoked: Arc<DashMap<String, u64>>,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, SESSION_TTL)
    }

    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            secret: Arc::new(secret.to_vec()),
            ttl,
            revoked: Arc::new(DashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, TokenError> {
        self.issue_at(identity, unix_now()?)
    }

    pub fn issue_at(&self, identity: &Identity, now: u64) -> Result<IssuedToken, TokenError> {
        issue_token(identity, &self.secret, self.ttl, now)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, unix_now()?)
    }

    pub fn verify_at(&self, token: &str, now: u64) -> Result<Claims, TokenError> {
        let claims = verify_token(token, &self.secret, now)?;
        if self.revoked.contains_key(&claims.jti) {
            return Err(TokenError::Revoked);
        }
        Ok(claims)
    }

    /// Revoke a verified token until its expiry.
    pub fn revoke(&self, claims: &Claims) {
        if let Ok(now) = unix_now() {
            self.revoked.retain(|_, exp| *exp > now);
        }
        self.revoked.insert(claims.jti.clone(), claims.exp);
        tracing::debug!(
            user_id = %claims.sub,
            jti = %claims.jti,
            outstanding = self.revoked.len(),
            "Session token revoked"
        );
    }
}
