//! # Responsive Image
//!
//! Rewrites images embedded in Markdown pages into responsive `<img>` tags.
//! A Markdown `![alt](src "title")` whose target is a local PNG, GIF or JPEG
//! becomes
//!
//! ```html
//! <img src="/hero@1200x900_q92.jpg" width="1200" height="900" alt="alt"
//!      title="title" srcset="/hero@480x360_q92.jpg 480w, ..." sizes="...">
//! ```
//!
//! with one downscaled rendition per configured width.
//!
//! # Architecture
//!
//! ```text
//! content/ ──scan──▶ ContentTree ──render_markdown──▶ HTML ──build_site──▶ dist/
//!                                       │
//!                                 build_attrs ◀──▶ RenditionHost (resize, url_of)
//! ```
//!
//! The attribute builder in [`responsive`] is pure logic over two host
//! capabilities: producing a rendition of a given width and naming the URL it
//! is published at. [`renditions::DiskRenditions`] is the host used by the
//! CLI; tests plug in closures through [`responsive::FnHost`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `responsive-image.toml` loading and lenient per-key parsing |
//! | [`content`] | Content tree scanning: pages, images, attachments, path joining |
//! | [`resolve`] | Markdown image reference → image record |
//! | [`responsive`] | Width selection, `src`/`srcset`/`sizes` synthesis, tag formatting |
//! | [`markdown`] | pulldown-cmark rendering with the image hook |
//! | [`renditions`] | Disk-backed rendition host and file naming |
//! | [`cache`] | Content-addressed rendition cache for incremental builds |
//! | [`site`] | Per-page rendering and full HTML documents via Maud |
//! | [`imaging`] | Pure-Rust decode/resize/encode behind the `ImageBackend` trait |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Never Upscale
//!
//! Widths at or above the image's own width collapse into a single entry for
//! the original. `srcset` only appears when at least two widths apply; a lone
//! width adds nothing over `src`.
//!
//! ## Lenient Configuration
//!
//! A malformed value in `responsive-image.toml` is logged and ignored for that
//! key only; the rest of the file still applies.

pub mod cache;
pub mod config;
pub mod content;
pub mod imaging;
pub mod markdown;
pub mod output;
pub mod renditions;
pub mod resolve;
pub mod responsive;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
