// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User profile model.

use serde::{Deserialize, Serialize};

/// Public profile, one per user, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Owning user (also used as document ID)
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub social_links: SocialLinks,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    /// Shape returned for a user who has never saved a profile.
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: String::new(),
            bio: String::new(),
            avatar_url: String::new(),
            social_links: SocialLinks::default(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub twitter: String,
}
