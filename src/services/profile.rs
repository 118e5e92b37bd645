// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile reads, upserts and avatar uploads.
//!
//! Every operation takes the caller's [`AuthUser`] and only touches the
//! profile it owns.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{Profile, SocialLinks};
use crate::services::storage::{normalize_public_url, ObjectStore, Upload};
use crate::time_utils::now_rfc3339;

/// Fields accepted by a profile save. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub social_links: Option<SocialLinks>,
}

#[derive(Clone)]
pub struct ProfileService {
    db: Database,
    storage: ObjectStore,
}

impl ProfileService {
    pub fn new(db: Database, storage: ObjectStore) -> Self {
        Self { db, storage }
    }

    /// Get the caller's profile, or an empty one if none was saved yet.
    pub async fn get(&self, auth: &AuthUser, user_id: &str) -> Result<Profile> {
        auth.authorize(user_id)?;

        Ok(self
            .db
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| Profile::empty(user_id)))
    }

    /// Create or update the caller's profile and return the stored document.
    pub async fn upsert(
        &self,
        auth: &AuthUser,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Profile> {
        let name = update.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name is required".to_string()));
        }
        auth.authorize(user_id)?;

        let existing = self.db.get_profile(user_id).await?;
        let now = now_rfc3339();

        let (bio, avatar_url, social_links, created_at) = match existing {
            Some(p) => (p.bio, p.avatar_url, p.social_links, p.created_at),
            None => (String::new(), String::new(), SocialLinks::default(), now.clone()),
        };

        let profile = Profile {
            user_id: user_id.to_string(),
            name: name.to_string(),
            bio: update.bio.map(|b| b.trim().to_string()).unwrap_or(bio),
            avatar_url: update
                .avatar_url
                .map(|url| normalize_public_url(&url))
                .unwrap_or(avatar_url),
            social_links: update
                .social_links
                .map(|links| SocialLinks {
                    instagram: links.instagram.trim().to_string(),
                    twitter: links.twitter.trim().to_string(),
                })
                .unwrap_or(social_links),
            created_at,
            updated_at: now,
        };

        self.db.upsert_profile(&profile).await?;

        tracing::info!(user_id, "Profile saved");
        Ok(profile)
    }

    /// Store a new avatar image and return its public URL.
    ///
    /// The profile itself is not modified; the client saves the URL with
    /// its next upsert.
    pub async fn upload_avatar(&self, auth: &AuthUser, upload: Upload) -> Result<String> {
        let content_type = upload.require_image()?.to_string();
        let object_name = format!(
            "avatars/{}-{}-{}",
            auth.user_id,
            uuid::Uuid::new_v4(),
            upload.safe_file_name()
        );

        self.storage
            .upload(&object_name, &content_type, upload.bytes)
            .await
    }
}
