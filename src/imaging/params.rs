//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the rendition layer (which decides which widths to produce) and the
//! [`backend`](super::backend) (which does the actual pixel work), so a mock
//! backend can stand in during tests.
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 92). Clamped on construction.
//! - [`ResizeParams`] — One resize: source, output path, target dimensions, quality.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
///
/// Always within range: deserialization goes through [`Quality::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(92)
    }
}

/// Parameters for a ratio-preserving resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
