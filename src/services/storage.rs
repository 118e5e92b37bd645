// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Object storage for uploaded images and avatars.
//!
//! Production uses a Supabase-style storage REST API:
//! - `POST   {base}/storage/v1/object/{bucket}/{name}` to upload
//! - `DELETE {base}/storage/v1/object/{bucket}/{name}` to delete
//! - `{base}/storage/v1/object/public/{bucket}/{name}` as the public URL
//!
//! Tests and local runs use an in-process map instead.

use crate::error::AppError;
use dashmap::DashMap;
use std::sync::Arc;

/// Cache lifetime sent with uploads, in seconds.
const UPLOAD_CACHE_CONTROL: &str = "max-age=3600";

/// An object as held by the in-memory backend.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Object store handle.
#[derive(Clone)]
pub struct ObjectStore {
    backend: StorageBackend,
}

#[derive(Clone)]
enum StorageBackend {
    Http(HttpStorage),
    Memory(MemoryStorage),
}

#[derive(Clone)]
struct HttpStorage {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

#[derive(Clone)]
struct MemoryStorage {
    public_base: String,
    bucket: String,
    objects: Arc<DashMap<String, StoredObject>>,
    /// Fail every upload (exercises error paths in tests)
    fail_uploads: bool,
}

impl ObjectStore {
    /// Storage backed by the HTTP storage API.
    pub fn http(base_url: &str, bucket: &str, service_key: &str) -> Self {
        Self {
            backend: StorageBackend::Http(HttpStorage {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                bucket: bucket.to_string(),
                service_key: service_key.to_string(),
            }),
        }
    }

    /// In-process storage; public URLs are rooted at `public_base`.
    pub fn memory(public_base: &str, bucket: &str) -> Self {
        Self {
            backend: StorageBackend::Memory(MemoryStorage {
                public_base: public_base.trim_end_matches('/').to_string(),
                bucket: bucket.to_string(),
                objects: Arc::new(DashMap::new()),
                fail_uploads: false,
            }),
        }
    }

    /// In-process storage that rejects every upload.
    pub fn memory_failing(public_base: &str, bucket: &str) -> Self {
        let mut store = Self::memory(public_base, bucket);
        if let StorageBackend::Memory(mem) = &mut store.backend {
            mem.fail_uploads = true;
        }
        store
    }

    /// Public URL for an object name.
    pub fn public_url(&self, name: &str) -> String {
        let path = encode_object_path(name);
        match &self.backend {
            StorageBackend::Http(s) => format!(
                "{}/storage/v1/object/public/{}/{}",
                s.base_url, s.bucket, path
            ),
            StorageBackend::Memory(m) => format!("{}/{}/{}", m.public_base, m.bucket, path),
        }
    }

    /// Upload an object and return its public URL.
    ///
    /// Names are never overwritten; callers generate unique names.
    pub async fn upload(
        &self,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let size = bytes.len();
        match &self.backend {
            StorageBackend::Http(s) => {
                let url = format!(
                    "{}/storage/v1/object/{}/{}",
                    s.base_url,
                    s.bucket,
                    encode_object_path(name)
                );

                let response = s
                    .http
                    .post(&url)
                    .bearer_auth(&s.service_key)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .header(reqwest::header::CACHE_CONTROL, UPLOAD_CACHE_CONTROL)
                    .header("x-upsert", "false")
                    .body(bytes)
                    .send()
                    .await
                    .map_err(|e| AppError::Upstream(format!("Upload request failed: {}", e)))?;

                check_response(response).await?;
            }
            StorageBackend::Memory(m) => {
                if m.fail_uploads {
                    return Err(AppError::Upstream("Upload rejected by storage".to_string()));
                }
                match m.objects.entry(name.to_string()) {
                    dashmap::mapref::entry::Entry::Occupied(_) => {
                        return Err(AppError::Upstream(format!(
                            "Object {} already exists",
                            name
                        )));
                    }
                    dashmap::mapref::entry::Entry::Vacant(slot) => {
                        slot.insert(StoredObject {
                            content_type: content_type.to_string(),
                            bytes,
                        });
                    }
                }
            }
        }

        tracing::info!(object = name, size, content_type, "Object uploaded");
        Ok(normalize_public_url(&self.public_url(name)))
    }

    /// Delete an object.
    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        match &self.backend {
            StorageBackend::Http(s) => {
                let url = format!(
                    "{}/storage/v1/object/{}/{}",
                    s.base_url,
                    s.bucket,
                    encode_object_path(name)
                );

                let response = s
                    .http
                    .delete(&url)
                    .bearer_auth(&s.service_key)
                    .send()
                    .await
                    .map_err(|e| AppError::Upstream(format!("Delete request failed: {}", e)))?;

                check_response(response).await?;
            }
            StorageBackend::Memory(m) => {
                m.objects.remove(name);
            }
        }

        tracing::info!(object = name, "Object deleted");
        Ok(())
    }

    /// Fetch an object from the in-memory backend (always `None` over HTTP).
    pub fn get_local(&self, name: &str) -> Option<StoredObject> {
        match &self.backend {
            StorageBackend::Http(_) => None,
            StorageBackend::Memory(m) => m.objects.get(name).map(|o| o.clone()),
        }
    }

    /// Number of objects in the in-memory backend.
    pub fn local_len(&self) -> usize {
        match &self.backend {
            StorageBackend::Http(_) => 0,
            StorageBackend::Memory(m) => m.objects.len(),
        }
    }
}

async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Upstream(format!(
        "Storage API returned {}: {}",
        status, body
    )))
}

/// A file received from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Check the upload is a non-empty `image/*` file and return its MIME type.
    pub fn require_image(&self) -> Result<&str, AppError> {
        let content_type = self
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| ct.starts_with("image/"))
            .ok_or_else(|| AppError::Validation("Please upload an image file".to_string()))?;

        if self.bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        Ok(content_type)
    }

    /// File name safe to embed in an object name.
    pub fn safe_file_name(&self) -> String {
        sanitize_file_name(self.file_name.as_deref().unwrap_or_default())
    }
}

/// Percent-encode each path segment of an object name.
fn encode_object_path(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Replace whitespace runs with `-` and drop path separators.
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c == '/' || c == '\\' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    if out.is_empty() || out.chars().all(|c| c == '.') {
        "upload".to_string()
    } else {
        out
    }
}

/// Trim a URL and collapse repeated slashes, keeping the `//` after a scheme.
pub fn normalize_public_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.trim().chars() {
        if c == '/' && out.ends_with('/') {
            let before = out[..out.len() - 1].chars().last();
            if before != Some(':') {
                continue;
            }
        }
        out.push(c);
    }
    out
}
