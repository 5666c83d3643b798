//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the rendition layer
//! needs: identify and resize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a recording mock.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Execute a resize operation, writing the encoded result to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
