// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, with a create-only email claim for uniqueness)
//! - Profiles (one document per user)
//! - Posts (feed entries)
//! - Post likes (one document per post and user)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{EmailClaim, LikeOutcome, Post, PostLike, Profile, User};
use firestore::errors::FirestoreError;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 16;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

fn db_err(e: FirestoreError) -> AppError {
    AppError::Database(e.to_string())
}

/// Document ID for an email claim. Emails may contain `/`.
fn email_doc_id(email: &str) -> String {
    urlencoding::encode(email).into_owned()
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(db_err)
    }

    /// Get a user by normalized email via the email claim.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let claim: Option<EmailClaim> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::USER_EMAILS)
            .obj()
            .one(&email_doc_id(email))
            .await
            .map_err(db_err)?;

        match claim {
            Some(claim) => self.get_user(&claim.user_id).await,
            None => Ok(None),
        }
    }

    /// Create a user, failing with `Conflict` if the email is taken.
    ///
    /// The email claim is a create-only insert, so two concurrent
    /// registrations for one address cannot both succeed.
    pub async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let claim_id = email_doc_id(&user.email);
        let claim = EmailClaim {
            user_id: user.id.clone(),
        };

        let inserted: Result<EmailClaim, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::USER_EMAILS)
            .document_id(&claim_id)
            .object(&claim)
            .execute()
            .await;

        match inserted {
            Ok(_) => {}
            Err(FirestoreError::DataConflictError(_)) => {
                return Err(AppError::Conflict("User already exists".to_string()));
            }
            Err(e) => return Err(db_err(e)),
        }

        let written: Result<(), AppError> = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(db_err);

        if let Err(e) = written {
            // Release the claim so the address can be registered again
            if let Err(cleanup) = self
                .client
                .fluent()
                .delete()
                .from(collections::USER_EMAILS)
                .document_id(&claim_id)
                .execute()
                .await
            {
                tracing::warn!(error = %cleanup, "Failed to release email claim");
            }
            return Err(e);
        }

        Ok(())
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(user_id)
            .await
            .map_err(db_err)
    }

    /// Create or replace the profile document keyed by `user_id`.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::PROFILES)
            .document_id(&profile.user_id)
            .object(profile)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    // ─── Post Operations ─────────────────────────────────────────

    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::POSTS)
            .obj()
            .one(post_id)
            .await
            .map_err(db_err)
    }

    /// All posts, newest first (ties broken by descending id).
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let mut posts: Vec<Post> = self
            .client
            .fluent()
            .select()
            .from(collections::POSTS)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(db_err)?;

        // Only a single-field index exists, so the tie-break happens here
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(posts)
    }

    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::POSTS)
            .document_id(&post.id)
            .object(post)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Delete a post together with its like markers.
    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::POSTS)
            .document_id(post_id)
            .execute()
            .await
            .map_err(db_err)?;

        let likes: Vec<PostLike> = self
            .client
            .fluent()
            .select()
            .from(collections::POST_LIKES)
            .filter(|q| q.for_all([q.field("post_id").eq(post_id)]))
            .obj()
            .query()
            .await
            .map_err(db_err)?;

        let client = &self.client;
        stream::iter(likes)
            .map(|like| async move {
                client
                    .fluent()
                    .delete()
                    .from(collections::POST_LIKES)
                    .document_id(PostLike::doc_id(&like.post_id, &like.user_id))
                    .execute()
                    .await
                    .map_err(db_err)
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        Ok(())
    }

    /// Record a like and bump the counter, at most once per user and post.
    ///
    /// The post and like marker are read inside the transaction, so a
    /// concurrent like of the same post makes one of the commits fail
    /// instead of losing an increment.
    pub async fn like_post(&self, post_id: &str, user_id: &str) -> Result<LikeOutcome, AppError> {
        let like_id = PostLike::doc_id(post_id, user_id);

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let tx_db = self.client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        );

        let post: Option<Post> = tx_db
            .fluent()
            .select()
            .by_id_in(collections::POSTS)
            .obj()
            .one(post_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read post in transaction: {}", e)))?;

        let Some(mut post) = post else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        };

        let existing: Option<PostLike> = tx_db
            .fluent()
            .select()
            .by_id_in(collections::POST_LIKES)
            .obj()
            .one(&like_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read like in transaction: {}", e)))?;

        if existing.is_some() {
            tracing::debug!(post_id, user_id, "Post already liked by user");
            let _ = transaction.rollback().await;
            return Ok(LikeOutcome {
                likes: post.like_count,
                newly_liked: false,
            });
        }

        let like = PostLike {
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            created_at: crate::time_utils::now_rfc3339(),
        };
        post.like_count += 1;

        self.client
            .fluent()
            .update()
            .in_col(collections::POST_LIKES)
            .document_id(&like_id)
            .object(&like)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add like to transaction: {}", e)))?;

        self.client
            .fluent()
            .update()
            .in_col(collections::POSTS)
            .document_id(post_id)
            .object(&post)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add post to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(LikeOutcome {
            likes: post.like_count,
            newly_liked: true,
        })
    }
}
