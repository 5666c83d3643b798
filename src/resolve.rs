//! Resolution of Markdown image references to content-tree images.
//!
//! A reference is resolvable only when it points inside the content tree and
//! lands on an image record. External URLs, missing paths and non-image
//! nodes are all "no match", never errors.

use crate::content::{ContentTree, ImageRecord, Node, join_path};
use log::debug;

/// Split a reference into `(scheme, netloc, path)` the way URL parsers do.
///
/// Query and fragment are dropped from the path.
fn split_reference(reference: &str) -> (Option<&str>, Option<&str>, &str) {
    let (scheme, rest) = match reference.find(':') {
        Some(pos) if is_scheme(&reference[..pos]) => {
            (Some(&reference[..pos]), &reference[pos + 1..])
        }
        _ => (None, reference),
    };

    let (netloc, rest) = match rest.strip_prefix("//") {
        Some(after) => {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            (Some(&after[..end]), &after[end..])
        }
        None => (None, rest),
    };

    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    (scheme, netloc, &rest[..end])
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Whether `reference` addresses something outside the content tree.
///
/// ```
/// # use responsive_image::resolve::is_external;
/// assert!(is_external("http://example.com/x.jpg"));
/// assert!(is_external("//cdn.example.com/x.jpg"));
/// assert!(!is_external("../x.jpg"));
/// ```
pub fn is_external(reference: &str) -> bool {
    let (scheme, netloc, _) = split_reference(reference);
    scheme.is_some() || netloc.is_some_and(|n| !n.is_empty())
}

/// Resolve `reference` relative to the page at `current` to an image record.
///
/// Returns `None` when there is no current location, the reference is an
/// external URL, or the target does not exist or is not an image.
pub fn resolve_image<'t>(
    tree: &'t ContentTree,
    current: Option<&str>,
    reference: &str,
) -> Option<&'t ImageRecord> {
    let current = current?;
    let (scheme, netloc, path) = split_reference(reference);
    if scheme.is_some() || netloc.is_some_and(|n| !n.is_empty()) {
        debug!("not resolving external image {reference:?}");
        return None;
    }

    let target = join_path(current, path);
    match tree.get(&target) {
        Some(Node::Image(image)) => Some(image),
        Some(_) => {
            debug!("{target} is not an image");
            None
        }
        None => {
            debug!("{target} not found in content tree");
            None
        }
    }
}
