//! Content tree: the addressable graph of pages, images and attachments.
//!
//! Every node has a content path: `/` for the content root, `/about` for a
//! directory, `/about/portrait.jpg` for a file inside it. Directories are
//! pages; image files (by extension) are image records carrying their
//! dimensions; anything else is an attachment.
//!
//! ```text
//! content/                     → /              (page)
//! ├── contents.md
//! ├── hero.jpg                 → /hero.jpg      (image 2400x1800, jpeg)
//! ├── brochure.pdf             → /brochure.pdf  (attachment)
//! └── about/                   → /about         (page)
//!     ├── contents.md
//!     └── portrait.png         → /about/portrait.png (image)
//! ```
//!
//! Paths join like filesystem paths: see [`join_path`].

use crate::imaging::ImageBackend;
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Content root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Image formats recognised in the content tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Tiff,
}

impl ImageFormat {
    /// Detect a format from a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Whether renditions can be generated for this format.
    pub fn is_responsive(self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Gif)
    }

    /// Canonical extension used for generated renditions.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Tiff => "tiff",
        }
    }
}

/// A source image in the content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub path: String,
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

/// A directory-backed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub path: String,
    pub source_dir: PathBuf,
}

/// A file that is neither a page nor a recognised image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: String,
    pub source: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Page(PageRecord),
    Image(ImageRecord),
    Attachment(Attachment),
}

impl Node {
    pub fn path(&self) -> &str {
        match self {
            Node::Page(p) => &p.path,
            Node::Image(i) => &i.path,
            Node::Attachment(a) => &a.path,
        }
    }

    pub fn as_image(&self) -> Option<&ImageRecord> {
        match self {
            Node::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// In-memory content tree addressable by content path.
#[derive(Debug, Clone, Default)]
pub struct ContentTree {
    root: PathBuf,
    nodes: BTreeMap<String, Node>,
}

impl ContentTree {
    /// Create an empty tree rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            nodes: BTreeMap::new(),
        }
    }

    /// Walk `root` and build the tree, reading image dimensions via `backend`.
    ///
    /// Hidden entries (leading `.`) are skipped. Images whose dimensions
    /// cannot be read are kept as attachments.
    pub fn scan(root: &Path, backend: &impl ImageBackend) -> Result<Self, ContentError> {
        if !root.is_dir() {
            return Err(ContentError::NotADirectory(root.to_path_buf()));
        }
        let mut tree = Self::new(root);

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        for entry in walker {
            let entry = entry?;
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let path = content_path(rel);
            let source = entry.path().to_path_buf();

            if entry.file_type().is_dir() {
                tree.insert(Node::Page(PageRecord {
                    path,
                    source_dir: source,
                }));
                continue;
            }

            let node = match ImageFormat::from_path(&source) {
                Some(format) => match backend.identify(&source) {
                    Ok(dims) => Node::Image(ImageRecord {
                        path,
                        source,
                        width: dims.width,
                        height: dims.height,
                        format,
                    }),
                    Err(e) => {
                        warn!("cannot read dimensions of {}: {e}", source.display());
                        Node::Attachment(Attachment { path, source })
                    }
                },
                None => Node::Attachment(Attachment { path, source }),
            };
            tree.insert(node);
        }

        Ok(tree)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Insert or replace a node, keyed by its normalised path.
    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(normalize_path(node.path()), node);
    }

    /// Look up a node by content path. Trailing slashes are ignored.
    pub fn get(&self, path: &str) -> Option<&Node> {
        self.nodes.get(&normalize_path(path))
    }

    /// All pages, in path order.
    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.nodes.values().filter_map(|node| match node {
            Node::Page(page) => Some(page),
            _ => None,
        })
    }

    /// All images, in path order.
    pub fn images(&self) -> impl Iterator<Item = &ImageRecord> {
        self.nodes.values().filter_map(Node::as_image)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

/// Convert a path relative to the content root into a content path.
fn content_path(rel: &Path) -> String {
    let segments: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Normalise a content path: collapse `.`, empty segments and `..`.
///
/// `..` never climbs above the root.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Join `reference` onto `base`, treating `base` as a directory.
///
/// Absolute references replace the base entirely.
///
/// ```
/// # use responsive_image::content::join_path;
/// assert_eq!(join_path("/", "test.jpg"), "/test.jpg");
/// assert_eq!(join_path("/about", "../test.jpg"), "/test.jpg");
/// assert_eq!(join_path("/about", "me.jpg"), "/about/me.jpg");
/// ```
pub fn join_path(base: &str, reference: &str) -> String {
    if reference.starts_with('/') {
        normalize_path(reference)
    } else {
        normalize_path(&format!("{}/{}", base, reference))
    }
}
