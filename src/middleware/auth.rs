// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! Every protected route goes through [`require_auth`]; handlers then use
//! [`AuthUser::authorize`] for per-resource ownership checks instead of
//! looking at cookies themselves.

use crate::error::AppError;
use crate::services::token::{Claims, TokenError};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Name of the cookie carrying the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: Option<String>,
    /// Full claims, kept for logout/revocation
    pub claims: Claims,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
            role: claims.role.clone(),
            claims,
        }
    }
}

impl AuthUser {
    /// Require that the token subject owns `user_id`.
    pub fn authorize(&self, user_id: &str) -> Result<(), AppError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            tracing::warn!(
                subject = %self.user_id,
                target = %user_id,
                "Blocked access to another user's resource"
            );
            Err(AppError::Forbidden)
        }
    }
}

/// Non-empty session cookie value.
fn cookie_token(jar: &CookieJar) -> Option<String> {
    jar.get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// Non-empty `Authorization: Bearer` token.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Verify the session cookie, then the bearer token if the cookie is absent
/// or fails. The cookie's error is reported when both fail.
pub fn verify_request(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<Claims, TokenError> {
    let bearer = bearer_token(headers);
    match cookie_token(jar) {
        Some(cookie) => state.tokens.verify(&cookie).or_else(|cookie_err| match bearer {
            Some(bearer) => state.tokens.verify(&bearer).map_err(|_| cookie_err),
            None => Err(cookie_err),
        }),
        None => state.tokens.verify(&bearer.ok_or(TokenError::Missing)?),
    }
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify_request(&state, &jar, request.headers()).map_err(|e| {
        tracing::debug!(error = %e, path = %request.uri().path(), "Rejected session token");
        e
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}
