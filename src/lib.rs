// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Natty-Fit: backend for a fitness subscription site
//!
//! This crate provides the HTTP API for account registration and login,
//! user profiles, and the image-post feed.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{FeedService, ObjectStore, ProfileService, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub storage: ObjectStore,
    pub tokens: TokenService,
    pub profiles: ProfileService,
    pub feed: FeedService,
}

impl AppState {
    /// Wire the services on top of the given stores.
    pub fn new(config: Config, db: Database, storage: ObjectStore) -> Self {
        let tokens = TokenService::new(&config.jwt_signing_key);
        let profiles = ProfileService::new(db.clone(), storage.clone());
        let feed = FeedService::new(db.clone(), storage.clone());
        Self {
            config,
            db,
            storage,
            tokens,
            profiles,
            feed,
        }
    }
}
