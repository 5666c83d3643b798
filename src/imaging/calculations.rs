//! Pure calculation functions for rendition widths and dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Select the rendition widths to produce for an image.
///
/// Walks `candidates` (ascending) and keeps every width strictly below
/// `image_width`. The first candidate at or above `image_width` is replaced by
/// `image_width` itself and the walk stops, so the native width acts as a hard
/// ceiling and nothing is ever upscaled. When every candidate is smaller than
/// the image, all of them are returned and no ceiling entry is added.
///
/// An empty candidate list yields an empty result.
///
/// # Examples
/// ```
/// # use responsive_image::imaging::select_widths;
/// let widths = [480, 800, 1200, 2400];
/// assert_eq!(select_widths(1024, &widths), vec![480, 800, 1024]);
/// assert_eq!(select_widths(3600, &widths), vec![480, 800, 1200, 2400]);
/// assert_eq!(select_widths(120, &widths), vec![120]);
/// ```
pub fn select_widths(image_width: u32, candidates: &[u32]) -> Vec<u32> {
    let mut selected = Vec::with_capacity(candidates.len());
    for &width in candidates {
        if width < image_width {
            selected.push(width);
        } else {
            selected.push(image_width);
            break;
        }
    }
    selected
}

/// Height of a rendition scaled to `target_width`, preserving aspect ratio.
///
/// Rounds half up and never returns zero.
///
/// # Examples
/// ```
/// # use responsive_image::imaging::scaled_height;
/// // 2400x1800 (4:3) at 1200 wide → 900 tall
/// assert_eq!(scaled_height((2400, 1800), 1200), 900);
/// ```
pub fn scaled_height(original: (u32, u32), target_width: u32) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return orig_h.max(1);
    }
    let height = (orig_h as f64 * target_width as f64 / orig_w as f64).round() as u32;
    height.max(1)
}
