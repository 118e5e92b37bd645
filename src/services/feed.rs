// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image feed: listing, posting and likes.
//!
//! Handles:
//! - Listing posts newest first, with author names resolved at read time
//! - Purging posts that lost their image (fire-and-forget)
//! - Upload-then-insert with compensation if the insert fails
//! - Server-side likes, at most one per user per post

use std::collections::{HashMap, HashSet};

use futures_util::{stream, StreamExt};

use crate::db::Database;
use crate::error::Result;
use crate::models::{LikeOutcome, Post};
use crate::services::storage::{normalize_public_url, ObjectStore, Upload};
use crate::time_utils::now_rfc3339;

const MAX_CONCURRENT_DB_OPS: usize = 16;

/// Shown when neither a profile nor an account name is available.
pub const FALLBACK_AUTHOR_NAME: &str = "User";

/// A post together with its author's current display name.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub post: Post,
    pub author_name: String,
}

#[derive(Clone)]
pub struct FeedService {
    db: Database,
    storage: ObjectStore,
}

impl FeedService {
    pub fn new(db: Database, storage: ObjectStore) -> Self {
        Self { db, storage }
    }

    /// All posts with an image, newest first.
    ///
    /// Posts without an image are left out and deleted in the background.
    pub async fn list(&self) -> Result<Vec<FeedItem>> {
        let (posts, broken): (Vec<Post>, Vec<Post>) = self
            .db
            .list_posts()
            .await?
            .into_iter()
            .partition(Post::has_image);

        if !broken.is_empty() {
            tracing::info!(count = broken.len(), "Scheduling cleanup of posts without images");
            let db = self.db.clone();
            tokio::spawn(async move {
                purge_posts(&db, broken).await;
            });
        }

        let names = self.resolve_author_names(&posts).await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let author_name = names
                    .get(&post.author_id)
                    .cloned()
                    .unwrap_or_else(|| FALLBACK_AUTHOR_NAME.to_string());
                FeedItem { post, author_name }
            })
            .collect())
    }

    /// Upload an image and create a post for it.
    pub async fn create(&self, author_id: &str, upload: Upload) -> Result<FeedItem> {
        let content_type = upload.require_image()?.to_string();
        let object_name = format!("{}-{}", uuid::Uuid::new_v4(), upload.safe_file_name());

        let public_url = self
            .storage
            .upload(&object_name, &content_type, upload.bytes)
            .await?;

        let post = Post {
            id: uuid::Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            image_url: normalize_public_url(&public_url),
            object_name: object_name.clone(),
            created_at: now_rfc3339(),
            like_count: 0,
        };

        if let Err(e) = self.db.insert_post(&post).await {
            tracing::warn!(
                object = %object_name,
                error = %e,
                "Post insert failed, removing uploaded object"
            );
            if let Err(cleanup) = self.storage.delete(&object_name).await {
                tracing::error!(
                    object = %object_name,
                    error = %cleanup,
                    "Failed to remove orphaned object"
                );
            }
            return Err(e);
        }

        tracing::info!(post_id = %post.id, author_id, "Post created");

        let author_name = self.author_name(author_id).await?;
        Ok(FeedItem { post, author_name })
    }

    /// Like a post on behalf of `user_id`. Repeat likes are no-ops.
    pub async fn like(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome> {
        let outcome = self.db.like_post(post_id, user_id).await?;
        tracing::debug!(
            post_id,
            user_id,
            likes = outcome.likes,
            newly_liked = outcome.newly_liked,
            "Post like processed"
        );
        Ok(outcome)
    }

    /// Display name for one author: profile name, then account name.
    async fn author_name(&self, author_id: &str) -> Result<String> {
        if let Some(profile) = self.db.get_profile(author_id).await? {
            if !profile.name.trim().is_empty() {
                return Ok(profile.name);
            }
        }

        Ok(self
            .db
            .get_user(author_id)
            .await?
            .map(|u| u.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_AUTHOR_NAME.to_string()))
    }

    /// Names for every distinct author, looked up concurrently.
    async fn resolve_author_names(&self, posts: &[Post]) -> Result<HashMap<String, String>> {
        let authors: HashSet<String> = posts.iter().map(|p| p.author_id.clone()).collect();

        stream::iter(authors)
            .map(|author_id: String| async move {
                self.author_name(&author_id)
                    .await
                    .map(|name| (author_id, name))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(String, String)>>>()
            .await
            .into_iter()
            .collect()
    }
}

/// Delete the given posts, logging failures. Returns how many were deleted.
pub async fn purge_posts(db: &Database, posts: Vec<Post>) -> usize {
    stream::iter(posts)
        .map(|post| async move {
            match db.delete_post(&post.id).await {
                Ok(()) => {
                    tracing::info!(post_id = %post.id, "Deleted post without image");
                    true
                }
                Err(e) => {
                    tracing::warn!(post_id = %post.id, error = %e, "Failed to delete post without image");
                    false
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_DB_OPS)
        .filter(|deleted| futures_util::future::ready(*deleted))
        .count()
        .await
}
