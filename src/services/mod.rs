// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod feed;
pub mod password;
pub mod profile;
pub mod storage;
pub mod token;

pub use feed::{FeedItem, FeedService};
pub use profile::{ProfileService, ProfileUpdate};
pub use storage::{ObjectStore, Upload};
pub use token::{Claims, Identity, TokenError, TokenService};
