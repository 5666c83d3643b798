//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every entity leads
//! with its positional index and identity (content path or page title);
//! filesystem details follow as indented context lines.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Pages
//! 001 /
//! 002 /about
//!
//! Images
//! 001 /about/portrait.png (300x400)
//!     Widths: 300
//! 002 /test.jpg (800x600)
//!     Widths: 480, 800
//!
//! 2 pages, 2 images, 3 attachments
//! ```
//!
//! ## Renditions
//!
//! ```text
//!     480px: encoded → /test@480x360_q92.jpg
//!     800px: published → /test.jpg
//! ```
//!
//! ## Build
//!
//! ```text
//! 001 Home → index.html
//!     Source: /
//! 002 About → about/index.html
//!     Source: /about
//!
//! Generated 2 pages
//! ```
//!
//! Each `format_*` function returns lines for testability; `print_*`
//! wrappers write them to stdout.

use crate::config::ResponsiveImageConfig;
use crate::content::ContentTree;
use crate::imaging::select_widths;
use crate::renditions::{RenditionEvent, RenditionStatus};
use crate::site::WrittenPage;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn status_label(status: RenditionStatus) -> &'static str {
    match status {
        RenditionStatus::Cached => "cached",
        RenditionStatus::Copied => "copied",
        RenditionStatus::Encoded => "encoded",
        RenditionStatus::Published => "published",
    }
}

fn join_widths(widths: &[u32]) -> String {
    widths
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format the scanned content tree with the widths each image would get.
pub fn format_scan_output(tree: &ContentTree, config: &ResponsiveImageConfig) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    let mut page_count = 0;
    for (i, page) in tree.pages().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), page.path));
        page_count += 1;
    }

    let mut image_count = 0;
    let images: Vec<_> = tree.images().collect();
    if !images.is_empty() {
        lines.push(String::new());
        lines.push("Images".to_string());
    }
    for (i, image) in images.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}x{})",
            format_index(i + 1),
            image.path,
            image.width,
            image.height
        ));
        if image.format.is_responsive() {
            let widths = select_widths(image.width, &config.widths);
            lines.push(format!("{}Widths: {}", indent(1), join_widths(&widths)));
        } else {
            lines.push(format!(
                "{}Not resized ({})",
                indent(1),
                image.format.extension()
            ));
        }
        image_count += 1;
    }

    let attachments = tree.len() - page_count - image_count;
    lines.push(String::new());
    lines.push(format!(
        "{} pages, {} images, {} attachments",
        page_count, image_count, attachments
    ));
    lines
}

pub fn print_scan_output(tree: &ContentTree, config: &ResponsiveImageConfig) {
    for line in format_scan_output(tree, config) {
        println!("{}", line);
    }
}

/// Format one rendition progress event.
pub fn format_rendition_event(event: &RenditionEvent) -> String {
    format!(
        "{}{}px: {} \u{2192} {}",
        indent(1),
        event.width,
        status_label(event.status),
        event.path
    )
}

/// Format the pages written by a build.
pub fn format_build_output(pages: &[WrittenPage]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, page) in pages.iter().enumerate() {
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            page.title,
            page.output.display()
        ));
        lines.push(format!("{}Source: {}", indent(1), page.path));
    }
    if !pages.is_empty() {
        lines.push(String::new());
    }
    let noun = if pages.len() == 1 { "page" } else { "pages" };
    lines.push(format!("Generated {} {}", pages.len(), noun));
    lines
}

pub fn print_build_output(pages: &[WrittenPage]) {
    for line in format_build_output(pages) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Attachment, ImageFormat, ImageRecord, Node, PageRecord};
    use std::path::PathBuf;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    fn tree() -> ContentTree {
        let mut tree = ContentTree::new("/content");
        tree.insert(Node::Page(PageRecord {
            path: "/".into(),
            source_dir: "/content".into(),
        }));
        tree.insert(Node::Image(ImageRecord {
            path: "/test.jpg".into(),
            source: "/content/test.jpg".into(),
            width: 800,
            height: 600,
            format: ImageFormat::Jpeg,
        }));
        tree.insert(Node::Image(ImageRecord {
            path: "/photo.webp".into(),
            source: "/content/photo.webp".into(),
            width: 640,
            height: 480,
            format: ImageFormat::Webp,
        }));
        tree.insert(Node::Attachment(Attachment {
            path: "/contents.md".into(),
            source: "/content/contents.md".into(),
        }));
        tree
    }

    #[test]
    fn scan_output_lists_pages_and_widths() {
        let lines = format_scan_output(&tree(), &ResponsiveImageConfig::default());
        assert_eq!(
            lines,
            vec![
                "Pages",
                "001 /",
                "",
                "Images",
                "001 /photo.webp (640x480)",
                "    Not resized (webp)",
                "002 /test.jpg (800x600)",
                "    Widths: 480, 800",
                "",
                "1 pages, 2 images, 1 attachments",
            ]
        );
    }

    #[test]
    fn rendition_event_line() {
        let event = RenditionEvent {
            path: "/test@480x360_q92.jpg".into(),
            width: 480,
            status: RenditionStatus::Cached,
        };
        assert_eq!(
            format_rendition_event(&event),
            "    480px: cached \u{2192} /test@480x360_q92.jpg"
        );
    }

    #[test]
    fn build_output_lists_pages() {
        let pages = vec![
            WrittenPage {
                path: "/".into(),
                title: "Home".into(),
                output: PathBuf::from("index.html"),
            },
            WrittenPage {
                path: "/about".into(),
                title: "About".into(),
                output: PathBuf::from("about/index.html"),
            },
        ];
        assert_eq!(
            format_build_output(&pages),
            vec![
                "001 Home \u{2192} index.html",
                "    Source: /",
                "002 About \u{2192} about/index.html",
                "    Source: /about",
                "",
                "Generated 2 pages",
            ]
        );
    }

    #[test]
    fn build_output_empty() {
        assert_eq!(format_build_output(&[]), vec!["Generated 0 pages"]);
    }
}
