//! Shared test utilities: synthetic images and a small content tree.
//!
//! ```text
//! content/
//! ├── contents.md          # "# Home", embeds test.jpg
//! ├── test.jpg             # 800x600
//! ├── dummy.pdf
//! ├── about/
//! │   ├── contents.md      # "# About", embeds portrait.png and ../test.jpg
//! │   └── portrait.png     # 300x400
//! └── gallery/             # no contents.md
//!     └── wide.gif         # 1000x500
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

pub const HOME_MD: &str = "# Home\n\n![Hero](test.jpg \"The hero\")\n\n[Download](dummy.pdf)\n";
pub const ABOUT_MD: &str = "# About\n\n![Me](portrait.png)\n\nAlso ![the hero](../test.jpg).\n";

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(y % 256) as u8, 64, (x % 256) as u8, 255])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

pub fn create_test_gif(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        image::Rgba([0, (x % 256) as u8, 200, 255])
    });
    image::DynamicImage::ImageRgba8(img)
        .save_with_format(path, image::ImageFormat::Gif)
        .unwrap();
}

/// Write the content tree above into a fresh temp directory.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    std::fs::write(root.join("contents.md"), HOME_MD).unwrap();
    create_test_jpeg(&root.join("test.jpg"), 800, 600);
    std::fs::write(root.join("dummy.pdf"), b"%PDF-1.4\n").unwrap();

    std::fs::create_dir_all(root.join("about")).unwrap();
    std::fs::write(root.join("about/contents.md"), ABOUT_MD).unwrap();
    create_test_png(&root.join("about/portrait.png"), 300, 400);

    std::fs::create_dir_all(root.join("gallery")).unwrap();
    create_test_gif(&root.join("gallery/wide.gif"), 1000, 500);

    tmp
}
