// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model for storage.

use serde::{Deserialize, Serialize};

/// User account stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUID v4 (also used as document ID)
    pub id: String,
    /// Display name given at registration
    pub name: String,
    /// Trimmed, lower-cased email (unique)
    pub email: String,
    /// Argon2 PHC string. Never leaves the server.
    pub password_hash: String,
    /// Fitness attributes collected at sign-up
    #[serde(default)]
    pub fitness: Option<FitnessData>,
    #[serde(default)]
    pub role: Option<String>,
    /// When the account was created
    pub created_at: String,
}

/// Optional fitness attributes attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessData {
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub plan_type: Option<String>,
}

/// Create-only marker that reserves an email address for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailClaim {
    pub user_id: String,
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
