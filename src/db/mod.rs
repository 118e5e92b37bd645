// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore, or in-process maps for tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{LikeOutcome, Post, Profile, User};
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Create-only email reservations (keyed by url-encoded email)
    pub const USER_EMAILS: &str = "user_emails";
    pub const PROFILES: &str = "profiles";
    pub const POSTS: &str = "posts";
    /// Like markers (keyed by `{post_id}_{user_id}`)
    pub const POST_LIKES: &str = "post_likes";
}

/// Credential store handle shared by all request handlers.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(Arc<MemoryStore>),
    /// Every operation fails (offline mode)
    Offline,
}

fn offline() -> AppError {
    AppError::Database("Database not connected (offline mode)".to_string())
}

impl Database {
    /// Connect to Firestore (or its emulator).
    pub async fn connect_firestore(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreStore::new(project_id).await?),
        })
    }

    /// Create an empty in-process store.
    pub fn new_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// Wrap an existing in-process store (lets tests inspect it directly).
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            backend: Backend::Memory(store),
        }
    }

    /// Create a database handle whose operations all fail.
    ///
    /// Used to exercise error paths in tests.
    pub fn new_offline() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match &self.backend {
            Backend::Firestore(_) => "firestore",
            Backend::Memory(_) => "memory",
            Backend::Offline => "offline",
        }
    }

    // ─── Users ───────────────────────────────────────────────────

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_user(user_id).await,
            Backend::Memory(db) => Ok(db.get_user(user_id)),
            Backend::Offline => Err(offline()),
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_user_by_email(email).await,
            Backend::Memory(db) => Ok(db.get_user_by_email(email)),
            Backend::Offline => Err(offline()),
        }
    }

    /// Store a new user. Fails with `Conflict` if the email is registered.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.insert_user(user).await,
            Backend::Memory(db) => db.insert_user(user),
            Backend::Offline => Err(offline()),
        }
    }

    // ─── Profiles ────────────────────────────────────────────────

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_profile(user_id).await,
            Backend::Memory(db) => Ok(db.get_profile(user_id)),
            Backend::Offline => Err(offline()),
        }
    }

    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.upsert_profile(profile).await,
            Backend::Memory(db) => {
                db.upsert_profile(profile);
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    // ─── Posts ───────────────────────────────────────────────────

    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.get_post(post_id).await,
            Backend::Memory(db) => Ok(db.get_post(post_id)),
            Backend::Offline => Err(offline()),
        }
    }

    /// All posts ordered by `created_at` descending.
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.list_posts().await,
            Backend::Memory(db) => Ok(db.list_posts()),
            Backend::Offline => Err(offline()),
        }
    }

    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.insert_post(post).await,
            Backend::Memory(db) => {
                db.insert_post(post);
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.delete_post(post_id).await,
            Backend::Memory(db) => {
                db.delete_post(post_id);
                Ok(())
            }
            Backend::Offline => Err(offline()),
        }
    }

    pub async fn like_post(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome, AppError> {
        match &self.backend {
            Backend::Firestore(db) => db.like_post(post_id, user_id).await,
            Backend::Memory(db) => db.like_post(post_id, user_id),
            Backend::Offline => Err(offline()),
        }
    }
}
