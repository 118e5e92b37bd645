// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store used by tests and `STORE_BACKEND=memory`.
//!
//! Mirrors the Firestore collections with concurrent maps. Email claims and
//! likes go through the entry/set APIs so uniqueness holds under concurrent
//! requests.

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

use crate::error::AppError;
use crate::models::{LikeOutcome, Post, Profile, User};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// email -> user_id
    user_emails: DashMap<String, String>,
    profiles: DashMap<String, Profile>,
    posts: DashMap<String, Post>,
    /// (post_id, user_id)
    post_likes: DashSet<(String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.clone())
    }

    pub fn get_user_by_email(&self, email: &str) -> Option<User> {
        let user_id = self.user_emails.get(email)?.clone();
        self.get_user(&user_id)
    }

    pub fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match self.user_emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("User already exists".to_string())),
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(())
            }
        }
    }

    pub fn get_profile(&self, user_id: &str) -> Option<Profile> {
        self.profiles.get(user_id).map(|p| p.clone())
    }

    pub fn upsert_profile(&self, profile: &Profile) {
        self.profiles
            .insert(profile.user_id.clone(), profile.clone());
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn get_post(&self, post_id: &str) -> Option<Post> {
        self.posts.get(post_id).map(|p| p.clone())
    }

    pub fn list_posts(&self) -> Vec<Post> {
        let mut posts: Vec<Post> = self.posts.iter().map(|p| p.value().clone()).collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts
    }

    pub fn insert_post(&self, post: &Post) {
        self.posts.insert(post.id.clone(), post.clone());
    }

    pub fn delete_post(&self, post_id: &str) {
        self.posts.remove(post_id);
        self.post_likes.retain(|(liked, _)| liked != post_id);
    }

    pub fn like_post(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome, AppError> {
        let mut post = self
            .posts
            .get_mut(post_id)
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

        // The post entry lock is held across the check-and-increment
        let newly_liked = self
            .post_likes
            .insert((post_id.to_string(), user_id.to_string()));
        if newly_liked {
            post.like_count += 1;
        }

        Ok(LikeOutcome {
            likes: post.like_count,
            newly_liked,
        })
    }
}
