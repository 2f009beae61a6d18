// ABOUTME: Image operations trait for the container engine.
// ABOUTME: List images (optionally dangling only) and remove them.

use super::sealed::Sealed;
use super::shared_types::{ImageSummary, IsNotFound};
use crate::types::ImageName;
use async_trait::async_trait;

/// Image operations: list, remove.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// List images matching the given filters.
    async fn list_images(&self, filters: &ImageFilters) -> Result<Vec<ImageSummary>, ImageError>;

    /// Remove an image by reference or id.
    async fn remove_image(&self, name: &ImageName, force: bool) -> Result<(), ImageError>;
}

/// Filters for listing images.
#[derive(Debug, Clone, Default)]
pub struct ImageFilters {
    /// Only untagged (dangling) images.
    pub dangling: bool,
    /// Only images matching this reference pattern.
    pub reference: Option<String>,
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("image in use, cannot remove: {0}")]
    InUse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl IsNotFound for ImageError {
    fn is_not_found(&self) -> bool {
        matches!(self, ImageError::NotFound(_))
    }
}
