//! Markdown rendering with responsive images.
//!
//! Uses pulldown-cmark for parsing and HTML output and intercepts only image
//! events. Each `![alt](src "title")` is resolved against the content tree:
//!
//! - resolvable PNG/GIF/JPEG → `<img src width height alt title srcset sizes>`
//!   built by [`build_attrs`]
//! - anything else (external URL, missing file, other format) → plain
//!   `<img src alt title>`
//!
//! Inline markup inside the alt text is flattened to its text content.

use crate::config::ResponsiveImageConfig;
use crate::content::{ContentTree, ImageRecord};
use crate::resolve::resolve_image;
use crate::responsive::{ImageResource, RenditionHost, build_attrs, format_img_tag};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html::push_html};

/// Everything image rendering needs besides the Markdown source.
pub struct MarkdownContext<'a, H: RenditionHost> {
    pub tree: &'a ContentTree,
    /// Content path of the page being rendered.
    pub current: Option<&'a str>,
    pub config: &'a ResponsiveImageConfig,
    pub host: &'a mut H,
}

/// An image whose alt text is still being collected.
struct PendingImage {
    dest_url: String,
    title: String,
    alt: String,
    /// Images nested inside this one's alt text.
    depth: usize,
}

/// Render Markdown to HTML, emitting responsive tags for content images.
///
/// Host errors abort rendering and are returned unchanged.
pub fn render_markdown<H>(
    source: &str,
    ctx: &mut MarkdownContext<'_, H>,
) -> Result<String, H::Error>
where
    H: RenditionHost,
    H::Image: for<'r> From<&'r ImageRecord>,
{
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut pending: Option<PendingImage> = None;

    for event in Parser::new_ext(source, options) {
        match event {
            Event::Start(Tag::Image { dest_url, title, .. }) => match pending.as_mut() {
                Some(outer) => outer.depth += 1,
                None => {
                    pending = Some(PendingImage {
                        dest_url: dest_url.to_string(),
                        title: title.to_string(),
                        alt: String::new(),
                        depth: 0,
                    })
                }
            },
            Event::End(TagEnd::Image) => match pending.take() {
                Some(mut outer) if outer.depth > 0 => {
                    outer.depth -= 1;
                    pending = Some(outer);
                }
                Some(image) => {
                    let tag = render_image(&image, ctx)?;
                    events.push(Event::InlineHtml(tag.into()));
                }
                None => {}
            },
            Event::Text(text) | Event::Code(text) if pending.is_some() => {
                if let Some(image) = pending.as_mut() {
                    image.alt.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak if pending.is_some() => {
                if let Some(image) = pending.as_mut() {
                    image.alt.push(' ');
                }
            }
            _ if pending.is_some() => {}
            other => events.push(other),
        }
    }

    let mut html = String::with_capacity(source.len() * 2);
    push_html(&mut html, events.into_iter());
    Ok(html)
}

fn render_image<H>(
    image: &PendingImage,
    ctx: &mut MarkdownContext<'_, H>,
) -> Result<String, H::Error>
where
    H: RenditionHost,
    H::Image: for<'r> From<&'r ImageRecord>,
{
    let title = Some(image.title.as_str()).filter(|t| !t.is_empty());

    let source = resolve_image(ctx.tree, ctx.current, &image.dest_url)
        .map(|record| H::Image::from(record))
        .filter(|source| source.format().is_responsive());
    if let Some(source) = source {
        let attrs = build_attrs(&source, ctx.config, &mut *ctx.host)?;
        return Ok(attrs.to_tag(&image.alt, title));
    }

    Ok(format_img_tag(&[
        ("src", Some(image.dest_url.as_str())),
        ("alt", Some(image.alt.as_str())),
        ("title", title),
    ]))
}
