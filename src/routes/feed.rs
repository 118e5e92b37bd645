// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image feed routes.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::services::FeedItem;
use crate::AppState;

use super::read_upload;

/// The feed itself is readable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/posts", get(list_posts))
}

/// Posting and liking; the auth middleware is applied in routes/mod.rs.
pub fn protected_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/posts",
            post(create_post).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/posts/{id}/like", post(like_post))
}

/// A feed entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PostView {
    pub id: String,
    pub author_id: String,
    /// Author display name, resolved when the feed is read
    pub author: String,
    pub image_url: String,
    pub created_at: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub likes: u64,
}

impl From<FeedItem> for PostView {
    fn from(item: FeedItem) -> Self {
        Self {
            id: item.post.id,
            author_id: item.post.author_id,
            author: item.author_name,
            image_url: item.post.image_url,
            created_at: item.post.created_at,
            likes: item.post.like_count,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PostsResponse {
    pub posts: Vec<PostView>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreatePostResponse {
    pub post: PostView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LikeResponse {
    pub post_id: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub likes: u64,
    /// `false` when this user had already liked the post
    pub liked: bool,
}

async fn list_posts(State(state): State<Arc<AppState>>) -> Result<Json<PostsResponse>> {
    let posts = state
        .feed
        .list()
        .await?
        .into_iter()
        .map(PostView::from)
        .collect();
    Ok(Json(PostsResponse { posts }))
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatePostResponse>)> {
    let upload = read_upload(multipart).await?;
    let item = state.feed.create(&user.user_id, upload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse { post: item.into() }),
    ))
}

async fn like_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<Json<LikeResponse>> {
    let outcome = state.feed.like(&post_id, &user.user_id).await?;
    Ok(Json(LikeResponse {
        post_id,
        likes: outcome.likes,
        liked: outcome.newly_liked,
    }))
}
