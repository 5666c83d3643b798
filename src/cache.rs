//! Rendition cache for incremental builds.
//!
//! Encoding is the only expensive step of rendering a page: resolving
//! references and building attributes is cheap arithmetic. This module lets
//! [`DiskRenditions`](crate::renditions::DiskRenditions) skip the encode when a
//! rendition with the same source bytes and the same parameters was written
//! by an earlier build.
//!
//! ## Keys
//!
//! Lookups are content-addressed by `(source_hash, params_hash)`:
//!
//! - **`source_hash`**: SHA-256 of the source image bytes, so `git checkout`
//!   (which resets mtimes) does not invalidate anything.
//! - **`params_hash`**: SHA-256 of (width, height, quality, output extension).
//!
//! A hit also requires the recorded file to still exist. When an image moved
//! within the content tree the recorded file sits at a different path; the
//! caller copies it over instead of re-encoding.
//!
//! ## Storage
//!
//! `<output>/.rendition-cache.json`. A missing, corrupt or version-mismatched
//! file loads as an empty cache.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::Path;

const CACHE_FILENAME: &str = ".rendition-cache.json";

/// Bump to invalidate every existing cache when the key computation changes.
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk map from rendition output path (relative to the output root) to
/// the hashes it was produced from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RenditionCache {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → output path. Rebuilt on load.
    #[serde(skip)]
    by_content: HashMap<String, String>,
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

impl RenditionCache {
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
            by_content: HashMap::new(),
        }
    }

    /// Load the cache stored in `output_dir`, or an empty one.
    pub fn load(output_dir: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(output_dir.join(CACHE_FILENAME)) else {
            return Self::empty();
        };
        let mut cache: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        if cache.version != CACHE_VERSION {
            return Self::empty();
        }
        cache.by_content = cache
            .entries
            .iter()
            .map(|(path, e)| (content_key(&e.source_hash, &e.params_hash), path.clone()))
            .collect();
        cache
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(output_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output_dir.join(CACHE_FILENAME), json)
    }

    /// Output path of a previous rendition with the same content, if its file
    /// is still present under `output_dir`.
    pub fn lookup(&self, source_hash: &str, params_hash: &str, output_dir: &Path) -> Option<&str> {
        let path = self.by_content.get(&content_key(source_hash, params_hash))?;
        output_dir.join(path).exists().then_some(path.as_str())
    }

    /// Record a rendition, dropping any entry the same content had under an
    /// older path and any content key the path was previously recorded under.
    pub fn record(&mut self, output_path: String, source_hash: String, params_hash: String) {
        let key = content_key(&source_hash, &params_hash);
        if let Some(old) = self.by_content.get(&key)
            && *old != output_path
        {
            self.entries.remove(old.as_str());
        }
        self.by_content.insert(key.clone(), output_path.clone());
        let previous = self.entries.insert(
            output_path,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
        if let Some(previous) = previous {
            let old_key = content_key(&previous.source_hash, &previous.params_hash);
            if old_key != key {
                self.by_content.remove(&old_key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SHA-256 of a file's contents, hex encoded.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// SHA-256 of the parameters a rendition is encoded with.
pub fn hash_rendition_params(width: u32, height: u32, quality: u32, extension: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"rendition\0");
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    hasher.update(extension.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Per-build rendition counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub reused: u32,
    pub relocated: u32,
    pub encoded: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.reused + self.relocated + self.encoded
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reused == 0 && self.relocated == 0 {
            return write!(f, "{} encoded", self.encoded);
        }
        write!(f, "{} cached", self.reused)?;
        if self.relocated > 0 {
            write!(f, ", {} copied", self.relocated)?;
        }
        write!(f, ", {} encoded ({} total)", self.encoded, self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn lookup_hit_requires_file_on_disk() {
        let tmp = TempDir::new().unwrap();
        let mut cache = RenditionCache::empty();
        cache.record("about/me@480x360_q92.jpg".into(), "src".into(), "prm".into());

        assert_eq!(cache.lookup("src", "prm", tmp.path()), None);

        fs::create_dir_all(tmp.path().join("about")).unwrap();
        fs::write(tmp.path().join("about/me@480x360_q92.jpg"), "jpeg").unwrap();
        assert_eq!(
            cache.lookup("src", "prm", tmp.path()),
            Some("about/me@480x360_q92.jpg")
        );
    }

    #[test]
    fn lookup_misses_on_different_hashes() {
        let tmp = TempDir::new().unwrap();
        let mut cache = RenditionCache::empty();
        cache.record("a.jpg".into(), "s".into(), "p".into());
        fs::write(tmp.path().join("a.jpg"), "jpeg").unwrap();

        assert_eq!(cache.lookup("other", "p", tmp.path()), None);
        assert_eq!(cache.lookup("s", "other", tmp.path()), None);
    }

    #[test]
    fn record_drops_entry_at_old_path() {
        let mut cache = RenditionCache::empty();
        cache.record("old/a.jpg".into(), "s".into(), "p".into());
        cache.record("new/a.jpg".into(), "s".into(), "p".into());

        assert_eq!(cache.len(), 1);
        assert!(cache.entries.contains_key("new/a.jpg"));
    }

    #[test]
    fn rerecorded_path_forgets_old_content() {
        let tmp = TempDir::new().unwrap();
        let mut cache = RenditionCache::empty();
        cache.record("a@480.jpg".into(), "old".into(), "p".into());
        cache.record("a@480.jpg".into(), "new".into(), "p".into());
        fs::write(tmp.path().join("a@480.jpg"), "jpeg").unwrap();

        assert_eq!(cache.lookup("old", "p", tmp.path()), None);
        assert_eq!(cache.lookup("new", "p", tmp.path()), Some("a@480.jpg"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn save_and_load_rebuilds_index() {
        let tmp = TempDir::new().unwrap();
        let mut cache = RenditionCache::empty();
        cache.record("x.jpg".into(), "s1".into(), "p1".into());
        cache.save(tmp.path()).unwrap();
        fs::write(tmp.path().join("x.jpg"), "jpeg").unwrap();

        let loaded = RenditionCache::load(tmp.path());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.lookup("s1", "p1", tmp.path()), Some("x.jpg"));
    }

    #[test]
    fn load_missing_or_corrupt_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(RenditionCache::load(tmp.path()).is_empty());

        fs::write(tmp.path().join(CACHE_FILENAME), "not json").unwrap();
        assert!(RenditionCache::load(tmp.path()).is_empty());
    }

    #[test]
    fn load_other_version_is_empty() {
        let tmp = TempDir::new().unwrap();
        let json = format!(
            r#"{{"version": {}, "entries": {{"a.jpg": {{"source_hash":"s","params_hash":"p"}}}}}}"#,
            CACHE_VERSION + 1
        );
        fs::write(tmp.path().join(CACHE_FILENAME), json).unwrap();
        assert!(RenditionCache::load(tmp.path()).is_empty());
    }

    #[test]
    fn hash_file_tracks_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("img.bin");
        fs::write(&path, b"one").unwrap();
        let first = hash_file(&path).unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, hash_file(&path).unwrap());

        fs::write(&path, b"two").unwrap();
        assert_ne!(first, hash_file(&path).unwrap());
    }

    #[test]
    fn params_hash_varies_with_each_input() {
        let base = hash_rendition_params(480, 360, 92, "jpg");
        assert_eq!(base, hash_rendition_params(480, 360, 92, "jpg"));
        assert_ne!(base, hash_rendition_params(800, 360, 92, "jpg"));
        assert_ne!(base, hash_rendition_params(480, 361, 92, "jpg"));
        assert_ne!(base, hash_rendition_params(480, 360, 80, "jpg"));
        assert_ne!(base, hash_rendition_params(480, 360, 92, "png"));
    }

    #[test]
    fn stats_display() {
        let encoded_only = CacheStats {
            encoded: 3,
            ..Default::default()
        };
        assert_eq!(encoded_only.to_string(), "3 encoded");

        let mixed = CacheStats {
            reused: 5,
            relocated: 0,
            encoded: 2,
        };
        assert_eq!(mixed.to_string(), "5 cached, 2 encoded (7 total)");

        let with_copies = CacheStats {
            reused: 3,
            relocated: 2,
            encoded: 1,
        };
        assert_eq!(with_copies.to_string(), "3 cached, 2 copied, 1 encoded (6 total)");
    }
}
