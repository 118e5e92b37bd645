// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;

/// Default cap on image upload size (10 MiB).
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which credential store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL (CORS origin and redirect base)
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Production mode: Secure cookies
    pub production: bool,
    /// Credential store backend
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Object storage API base URL; `None` keeps uploads in memory
    pub storage_url: Option<String>,
    /// Object storage bucket for posts and avatars
    pub storage_bucket: String,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,

    // --- Secrets ---
    /// Object storage service key
    pub storage_service_key: Option<String>,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            production: false,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            storage_url: None,
            storage_bucket: "nattypost".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            storage_service_key: None,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .parse()?;

        let storage_url = env::var("STORAGE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let storage_service_key = env::var("STORAGE_SERVICE_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if storage_url.is_some() && storage_service_key.is_none() {
            return Err(ConfigError::Missing("STORAGE_SERVICE_KEY"));
        }

        let jwt_signing_key = env::var("JWT_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_signing_key.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            production: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            store_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage_url,
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "nattypost".to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            storage_service_key,
            jwt_signing_key: jwt_signing_key.into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
