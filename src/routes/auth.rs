// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and profile routes.
//!
//! Sessions are carried in the HTTP-only `token` cookie; bearer tokens are
//! also accepted by the auth middleware for non-browser clients.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    WithRejection,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{verify_request, AuthUser, TOKEN_COOKIE};
use crate::models::user::normalize_email;
use crate::models::{FitnessData, Profile, SocialLinks, User};
use crate::services::password::{hash_password_blocking, verify_password_blocking};
use crate::services::token::Identity;
use crate::services::ProfileUpdate;
use crate::time_utils::{format_unix_rfc3339, now_rfc3339};
use crate::AppState;

use super::read_upload;

/// Routes reachable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

/// Routes that need a session; the auth middleware is applied in routes/mod.rs.
pub fn protected_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/profile", get(get_profile).post(save_profile))
        .route(
            "/api/auth/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

// ─── Register / Login / Logout ───────────────────────────────

/// Registration form.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[serde(default)]
    pub fitness_data: Option<FitnessData>,
}

/// At least 8 characters with at least one letter and one digit.
fn validate_password(password: &str) -> std::result::Result<(), ValidationError> {
    let long_enough = password.chars().count() >= 8;
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_strength");
        err.message = Some(
            "Password must be at least 8 characters and contain a letter and a number".into(),
        );
        Err(err)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Account as returned to clients (never includes the password hash).
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    pub user: UserResponse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub user: UserResponse,
    /// RFC3339 expiry of the session token
    pub expires_at: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

/// Create an account.
async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(mut req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    req.name = req.name.trim().to_string();
    req.email = normalize_email(&req.email);
    req.validate()?;

    if state.db.get_user_by_email(&req.email).await?.is_some() {
        tracing::info!("Registration rejected: email already registered");
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password_blocking(req.password).await?;

    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name,
        email: req.email,
        password_hash,
        fitness: req.fitness_data,
        role: None,
        created_at: now_rfc3339(),
    };

    // The store re-checks uniqueness, so a concurrent registration still gets 409
    state.db.insert_user(&user).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse::from(&user),
        }),
    ))
}

/// Session cookie carrying `token`, valid for `max_age`.
fn session_cookie(token: String, max_age: time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Replacement cookie that expires the session immediately.
fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), time::Duration::ZERO, secure);
    cookie.set_expires(time::OffsetDateTime::UNIX_EPOCH);
    cookie
}

/// Log in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    // Unknown email and wrong password must be indistinguishable, in timing too
    let user = state.db.get_user_by_email(&email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let password_ok = verify_password_blocking(req.password, stored_hash).await?;

    let user = match user {
        Some(user) if password_ok => user,
        Some(user) => {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            tracing::info!("Login failed: unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let issued = state.tokens.issue(&Identity {
        id: user.id.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
    })?;

    let max_age = time::Duration::seconds(state.tokens.ttl().as_secs() as i64);
    let jar = jar.add(session_cookie(
        issued.token,
        max_age,
        state.config.production,
    ));

    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        jar,
        Json(LoginResponse {
            user: UserResponse::from(&user),
            expires_at: format_unix_rfc3339(issued.claims.exp).unwrap_or_default(),
        }),
    ))
}

/// Log out: revoke the presented token (if any) and expire the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, Json<LogoutResponse>) {
    match verify_request(&state, &jar, &headers) {
        Ok(claims) => state.tokens.revoke(&claims),
        Err(e) => tracing::debug!(error = %e, "Logout without a usable token"),
    }

    let jar = jar.add(expired_session_cookie(state.config.production));

    (
        jar,
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully".to_string(),
        }),
    )
}

// ─── Current User ────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user: SessionUser,
}

/// Identity carried by the session token.
async fn me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user: SessionUser {
            id: user.user_id,
            email: user.email,
            role: user.role,
        },
    })
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub social_links: Option<SocialLinks>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SocialLinksView {
    pub instagram: String,
    pub twitter: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileView {
    pub user_id: String,
    pub name: String,
    pub bio: String,
    pub avatar_url: String,
    pub social_links: SocialLinksView,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub created_at: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub updated_at: String,
}

impl From<Profile> for ProfileView {
    fn from(p: Profile) -> Self {
        Self {
            user_id: p.user_id,
            name: p.name,
            bio: p.bio,
            avatar_url: p.avatar_url,
            social_links: SocialLinksView {
                instagram: p.social_links.instagram,
                twitter: p.social_links.twitter,
            },
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub profile: ProfileView,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveProfileResponse {
    pub success: bool,
    pub profile: ProfileView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AvatarResponse {
    pub avatar_url: String,
}

fn require_user_id(user_id: Option<String>) -> Result<String> {
    user_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ProfileResponse>> {
    let user_id = require_user_id(query.user_id)?;
    let profile = state.profiles.get(&user, &user_id).await?;
    Ok(Json(ProfileResponse {
        profile: profile.into(),
    }))
}

async fn save_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(req), _): WithRejection<Json<ProfileRequest>, AppError>,
) -> Result<Json<SaveProfileResponse>> {
    let user_id = require_user_id(req.user_id)?;
    let profile = state
        .profiles
        .upsert(
            &user,
            &user_id,
            ProfileUpdate {
                name: req.name,
                bio: req.bio,
                avatar_url: req.avatar_url,
                social_links: req.social_links,
            },
        )
        .await?;

    Ok(Json(SaveProfileResponse {
        success: true,
        profile: profile.into(),
    }))
}

async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<AvatarResponse>> {
    let upload = read_upload(multipart).await?;
    let avatar_url = state.profiles.upload_avatar(&user, upload).await?;
    tracing::info!(user_id = %user.user_id, "Avatar uploaded");
    Ok(Json(AvatarResponse { avatar_url }))
}
