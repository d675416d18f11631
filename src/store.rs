//! Persistence seam for the hosted catalog: tables plus the image bucket.

use crate::record::{DeletionRequest, Fly, FlyDetails, FlyId, NewFly, WaitlistEntry};
use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Error reported by the hosted store itself, e.g. a constraint violation.
    #[error("{message} (http {status})")]
    Api { status: u16, message: String },
}

/// Every write is a single call with no version check: concurrent admin
/// sessions race and the last write wins.
#[async_trait]
pub trait FlyStore: Send + Sync {
    /// Flies ordered by name, optionally only those missing description,
    /// categories or season.
    async fn list_flies(&self, incomplete_only: bool) -> Result<Vec<Fly>, StoreError>;

    async fn get_fly(&self, id: &FlyId) -> Result<Option<Fly>, StoreError>;

    /// Exact name lookup.
    async fn find_by_name(&self, name: &str) -> Result<Option<Fly>, StoreError>;

    /// Case-insensitive substring match on name, ordered by name.
    async fn search_by_name(&self, term: &str) -> Result<Vec<Fly>, StoreError>;

    async fn all_names(&self) -> Result<Vec<String>, StoreError>;

    async fn insert_flies(&self, flies: &[NewFly]) -> Result<Vec<Fly>, StoreError>;

    async fn update_details(&self, id: &FlyId, details: &FlyDetails) -> Result<(), StoreError>;

    async fn set_image(&self, id: &FlyId, image_url: &str) -> Result<(), StoreError>;

    /// Store an image object and return its public URL.
    async fn upload_image(
        &self,
        object_name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError>;

    async fn add_waitlist(&self, entry: &WaitlistEntry) -> Result<(), StoreError>;

    async fn add_deletion_request(&self, request: &DeletionRequest) -> Result<(), StoreError>;
}

/// Unique object name for an uploaded image, e.g. `1718012345678-4821.jpg`.
pub fn object_name(extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u16 = rand::rng().random_range(0..10_000);
    format!("{}-{:04}.{}", millis, suffix, extension)
}

/// File extension of an image URL's path, ignoring any query string.
pub fn extension_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "jpg".to_string(),
    }
}

pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}
