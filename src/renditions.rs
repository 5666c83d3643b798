//! Disk-backed rendition host.
//!
//! [`DiskRenditions`] implements [`RenditionHost`] for images of a scanned
//! [`ContentTree`](crate::content::ContentTree): it encodes resized copies into
//! the output directory and publishes them under a base URL.
//!
//! ## Output Structure
//!
//! Renditions sit next to where their source would be published, named after
//! the source stem, the final dimensions and the quality:
//!
//! ```text
//! dist/
//! ├── .rendition-cache.json
//! ├── test.jpg                        # original, copied on first publication
//! ├── test@480x360_q92.jpg
//! └── about/
//!     ├── index.html
//!     └── portrait@480x640_q92.png
//! ```
//!
//! Each rendition is produced at most once per run; repeated requests for
//! the same (image, width) return the already produced rendition.

use crate::cache::{CacheStats, RenditionCache, hash_file, hash_rendition_params};
use crate::content::{ImageFormat, ImageRecord};
use crate::imaging::{BackendError, ImageBackend, Quality, ResizeParams, scaled_height};
use crate::responsive::{ImageResource, RenditionHost};
use log::debug;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenditionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// An original image or one of its resized renditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    /// Content path the rendition is published at.
    pub path: String,
    /// Source file of the original image.
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub is_original: bool,
}

impl From<&ImageRecord> for Rendition {
    fn from(image: &ImageRecord) -> Self {
        Self {
            path: image.path.clone(),
            source: image.source.clone(),
            width: image.width,
            height: image.height,
            format: image.format,
            is_original: true,
        }
    }
}

impl ImageResource for Rendition {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> ImageFormat {
        self.format
    }
}

/// How a rendition came to exist on disk in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenditionStatus {
    /// Reused from a previous build at the same path.
    Cached,
    /// Reused from a previous build at another path.
    Copied,
    /// Freshly encoded.
    Encoded,
    /// Original image copied into the output.
    Published,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionEvent {
    pub path: String,
    pub width: u32,
    pub status: RenditionStatus,
}

// Path-segment percent-encode set, plus `,` which separates `srcset` candidates.
// See: https://url.spec.whatwg.org/#path-percent-encode-set
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%')
    .add(b',');

/// Percent-encode every segment of a content path, keeping the separators.
///
/// ```
/// # use responsive_image::renditions::encode_content_path;
/// assert_eq!(encode_content_path("/my photos/a,b.jpg"), "/my%20photos/a%2Cb.jpg");
/// ```
pub fn encode_content_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Content path of the rendition of `image` at the given size.
///
/// ```
/// # use responsive_image::renditions::rendition_path;
/// # use responsive_image::content::ImageFormat;
/// # use responsive_image::imaging::Quality;
/// assert_eq!(
///     rendition_path("/about/me.JPG", ImageFormat::Jpeg, 480, 360, Quality::new(92)),
///     "/about/me@480x360_q92.jpg"
/// );
/// ```
pub fn rendition_path(
    original: &str,
    format: ImageFormat,
    width: u32,
    height: u32,
    quality: Quality,
) -> String {
    let (dir, file) = original.rsplit_once('/').unwrap_or(("", original));
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    format!(
        "{dir}/{stem}@{width}x{height}_q{}.{}",
        quality.value(),
        format.extension()
    )
}

/// Encodes renditions into an output directory via an [`ImageBackend`].
pub struct DiskRenditions<'b, B: ImageBackend> {
    backend: &'b B,
    output_dir: PathBuf,
    base_url: String,
    cache: Option<RenditionCache>,
    stats: CacheStats,
    source_hashes: HashMap<PathBuf, String>,
    produced: HashSet<String>,
    events: Option<Sender<RenditionEvent>>,
}

impl<'b, B: ImageBackend> DiskRenditions<'b, B> {
    /// `use_cache = false` ignores and overwrites any previous cache.
    pub fn new(backend: &'b B, output_dir: &Path, base_url: &str, use_cache: bool) -> Self {
        let cache = if use_cache {
            RenditionCache::load(output_dir)
        } else {
            RenditionCache::empty()
        };
        Self {
            backend,
            output_dir: output_dir.to_path_buf(),
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: Some(cache),
            stats: CacheStats::default(),
            source_hashes: HashMap::new(),
            produced: HashSet::new(),
            events: None,
        }
    }

    /// Report every produced rendition on `tx`.
    pub fn with_events(mut self, tx: Sender<RenditionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Persist the cache and return the run's counters.
    pub fn finish(mut self) -> Result<CacheStats, RenditionError> {
        if let Some(cache) = self.cache.take() {
            cache.save(&self.output_dir)?;
        }
        Ok(self.stats)
    }

    fn output_file(&self, content_path: &str) -> PathBuf {
        self.output_dir.join(content_path.trim_start_matches('/'))
    }

    fn emit(&self, path: &str, width: u32, status: RenditionStatus) {
        if let Some(tx) = &self.events {
            // A dropped receiver only loses progress output.
            let _ = tx.send(RenditionEvent {
                path: path.to_string(),
                width,
                status,
            });
        }
    }

    fn source_hash(&mut self, source: &Path) -> Result<String, RenditionError> {
        if let Some(hash) = self.source_hashes.get(source) {
            return Ok(hash.clone());
        }
        let hash = hash_file(source)?;
        self.source_hashes.insert(source.to_path_buf(), hash.clone());
        Ok(hash)
    }

    /// Write the rendition to disk, reusing a cached file when possible.
    fn produce(
        &mut self,
        params: &ResizeParams,
        path: &str,
    ) -> Result<RenditionStatus, RenditionError> {
        let source_hash = self.source_hash(&params.source)?;
        let ext = params
            .output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let params_hash =
            hash_rendition_params(params.width, params.height, params.quality.value(), ext);
        let rel = path.trim_start_matches('/').to_string();

        let cached = self
            .cache
            .as_ref()
            .and_then(|c| c.lookup(&source_hash, &params_hash, &self.output_dir))
            .map(str::to_string);

        let status = match cached {
            Some(stored) if stored == rel => {
                self.stats.reused += 1;
                RenditionStatus::Cached
            }
            Some(stored) => {
                std::fs::copy(self.output_dir.join(&stored), &params.output)?;
                self.stats.relocated += 1;
                RenditionStatus::Copied
            }
            None => {
                self.backend.resize(params)?;
                self.stats.encoded += 1;
                RenditionStatus::Encoded
            }
        };
        debug!("{path}: {status:?}");

        if let Some(cache) = self.cache.as_mut() {
            cache.record(rel, source_hash, params_hash);
        }
        Ok(status)
    }
}

impl<B: ImageBackend> RenditionHost for DiskRenditions<'_, B> {
    type Image = Rendition;
    type Error = RenditionError;

    fn resize(
        &mut self,
        image: &Rendition,
        width: u32,
        quality: Quality,
    ) -> Result<Rendition, RenditionError> {
        let height = scaled_height((image.width, image.height), width);
        let path = rendition_path(&image.path, image.format, width, height, quality);
        let rendition = Rendition {
            path: path.clone(),
            source: image.source.clone(),
            width,
            height,
            format: image.format,
            is_original: false,
        };
        if self.produced.contains(&path) {
            return Ok(rendition);
        }

        let output = self.output_file(&path);
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let params = ResizeParams {
            source: image.source.clone(),
            output,
            width,
            height,
            quality,
        };
        let status = self.produce(&params, &path)?;
        self.emit(&path, width, status);
        self.produced.insert(path);
        Ok(rendition)
    }

    fn url_of(&mut self, image: &Rendition) -> Result<String, RenditionError> {
        if image.is_original && !self.produced.contains(&image.path) {
            let output = self.output_file(&image.path);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&image.source, &output)?;
            self.emit(&image.path, image.width, RenditionStatus::Published);
            self.produced.insert(image.path.clone());
        }
        Ok(format!("{}{}", self.base_url, encode_content_path(&image.path)))
    }
}
