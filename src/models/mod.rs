// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod post;
pub mod profile;
pub mod user;

pub use post::{LikeOutcome, Post, PostLike};
pub use profile::{Profile, SocialLinks};
pub use user::{EmailClaim, FitnessData, User};
