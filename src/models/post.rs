// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Feed post model for storage and API.

use serde::{Deserialize, Serialize};

/// Image post stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// UUID v4 (also used as document ID)
    pub id: String,
    /// User who uploaded the image
    pub author_id: String,
    /// Public URL returned by the object store
    pub image_url: String,
    /// Object store key backing `image_url`
    #[serde(default)]
    pub object_name: String,
    /// RFC3339 UTC with millisecond precision (sortable as a string)
    pub created_at: String,
    #[serde(default)]
    pub like_count: u64,
}

impl Post {
    /// Posts without a usable image are hidden from the feed and purged.
    pub fn has_image(&self) -> bool {
        !self.image_url.trim().is_empty()
    }
}

/// Marker document recording that a user liked a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostLike {
    pub post_id: String,
    pub user_id: String,
    pub created_at: String,
}

impl PostLike {
    /// Document ID; one like per (post, user).
    pub fn doc_id(post_id: &str, user_id: &str) -> String {
        format!("{}_{}", post_id, user_id)
    }
}

/// Result of a like request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    /// Like count after the request
    pub likes: u64,
    /// `false` if this user had already liked the post
    pub newly_liked: bool,
}
