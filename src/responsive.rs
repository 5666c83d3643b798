//! Responsive `<img>` attribute synthesis.
//!
//! [`ResponsiveImage`] turns one source image into the attribute set of a
//! responsive `<img>` tag:
//!
//! ```text
//! src     url of the rendition at `default_width` (or the original if narrower)
//! width   width of that rendition
//! height  height of that rendition
//! srcset  "{url} {w}w, ..." for every selected width, only when there are 2+
//! sizes   config value, only when srcset is present
//! ```
//!
//! The core never touches pixels or URLs itself. Producing a rendition and
//! publishing it are capabilities of a [`RenditionHost`] passed in by the
//! caller; their errors propagate unchanged.

use crate::config::ResponsiveImageConfig;
use crate::content::ImageFormat;
use crate::imaging::{Quality, select_widths};
use html_escape::encode_quoted_attribute;
use serde::Serialize;
use std::marker::PhantomData;

/// An image that renditions can be produced from.
pub trait ImageResource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> ImageFormat;
}

/// Host capabilities the attribute builder depends on.
pub trait RenditionHost {
    type Image: ImageResource + Clone;
    type Error;

    /// Produce a rendition `width` pixels wide, preserving aspect ratio.
    ///
    /// Only called with `width` strictly below the image's own width. Must be
    /// idempotent for a given (image, width) pair.
    fn resize(
        &mut self,
        image: &Self::Image,
        width: u32,
        quality: Quality,
    ) -> Result<Self::Image, Self::Error>;

    /// Address at which `image` is published.
    fn url_of(&mut self, image: &Self::Image) -> Result<String, Self::Error>;
}

/// A [`RenditionHost`] made from a pair of closures.
pub struct FnHost<I, E, R, U> {
    resize: R,
    url_of: U,
    _marker: PhantomData<fn(&I) -> Result<I, E>>,
}

impl<I, E, R, U> FnHost<I, E, R, U>
where
    I: ImageResource + Clone,
    R: FnMut(&I, u32, Quality) -> Result<I, E>,
    U: FnMut(&I) -> Result<String, E>,
{
    pub fn new(resize: R, url_of: U) -> Self {
        Self {
            resize,
            url_of,
            _marker: PhantomData,
        }
    }
}

impl<I, E, R, U> RenditionHost for FnHost<I, E, R, U>
where
    I: ImageResource + Clone,
    R: FnMut(&I, u32, Quality) -> Result<I, E>,
    U: FnMut(&I) -> Result<String, E>,
{
    type Image = I;
    type Error = E;

    fn resize(&mut self, image: &I, width: u32, quality: Quality) -> Result<I, E> {
        (self.resize)(image, width, quality)
    }

    fn url_of(&mut self, image: &I) -> Result<String, E> {
        (self.url_of)(image)
    }
}

/// Attributes of a responsive `<img>` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImgAttrs {
    pub src: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srcset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
}

impl ImgAttrs {
    /// Render the `<img>` start tag.
    ///
    /// Attributes come out as `src width height alt title srcset sizes`;
    /// `title` is omitted when absent or empty, as are `srcset` and `sizes`.
    pub fn to_tag(&self, alt: &str, title: Option<&str>) -> String {
        let width = self.width.to_string();
        let height = self.height.to_string();
        format_img_tag(&[
            ("src", Some(self.src.as_str())),
            ("width", Some(width.as_str())),
            ("height", Some(height.as_str())),
            ("alt", Some(alt)),
            ("title", title.filter(|t| !t.is_empty())),
            ("srcset", self.srcset.as_deref()),
            ("sizes", self.sizes.as_deref()),
        ])
    }
}

/// Format an `<img>` start tag, escaping values and skipping absent ones.
pub fn format_img_tag(attrs: &[(&str, Option<&str>)]) -> String {
    let mut tag = String::from("<img");
    for (name, value) in attrs {
        if let Some(value) = value {
            tag.push(' ');
            tag.push_str(name);
            tag.push_str("=\"");
            tag.push_str(&encode_quoted_attribute(value));
            tag.push('"');
        }
    }
    tag.push('>');
    tag
}

/// One source image bound to a configuration and a host.
pub struct ResponsiveImage<'a, H: RenditionHost> {
    image: &'a H::Image,
    config: &'a ResponsiveImageConfig,
    host: &'a mut H,
}

impl<'a, H: RenditionHost> ResponsiveImage<'a, H> {
    pub fn new(image: &'a H::Image, config: &'a ResponsiveImageConfig, host: &'a mut H) -> Self {
        Self {
            image,
            config,
            host,
        }
    }

    /// Widths that would be rendered for this image.
    pub fn widths(&self) -> Vec<u32> {
        select_widths(self.image.width(), &self.config.widths)
    }

    pub fn sizes(&self) -> Option<&str> {
        self.config.sizes.as_deref()
    }

    /// Resize to `width`, or hand back the original when no resize is needed.
    ///
    /// The host is only asked for widths strictly below the image's own.
    pub fn resize_image(&mut self, width: Option<u32>) -> Result<H::Image, H::Error> {
        match width {
            Some(w) if w < self.image.width() => {
                self.host.resize(self.image, w, self.config.quality)
            }
            _ => Ok(self.image.clone()),
        }
    }

    /// `src`, `width` and `height` of the default rendition.
    pub fn default_image_attrs(&mut self) -> Result<ImgAttrs, H::Error> {
        let default_image = self.resize_image(Some(self.config.default_width))?;
        Ok(ImgAttrs {
            src: self.host.url_of(&default_image)?,
            width: default_image.width(),
            height: default_image.height(),
            srcset: None,
            sizes: None,
        })
    }

    /// The `srcset` value, or `None` when fewer than two widths apply.
    pub fn srcset(&mut self) -> Result<Option<String>, H::Error> {
        let widths = self.widths();
        if widths.len() <= 1 {
            return Ok(None);
        }
        let mut entries = Vec::with_capacity(widths.len());
        for width in widths {
            let rendition = self.resize_image(Some(width))?;
            let url = self.host.url_of(&rendition)?;
            entries.push(format!("{url} {width}w"));
        }
        Ok(Some(entries.join(", ")))
    }

    /// Full attribute set.
    pub fn attrs(&mut self) -> Result<ImgAttrs, H::Error> {
        let mut attrs = self.default_image_attrs()?;
        attrs.srcset = self.srcset()?;
        if attrs.srcset.is_some() {
            attrs.sizes = self.sizes().map(str::to_string);
        }
        Ok(attrs)
    }
}

/// Build the responsive attribute set for `image`.
pub fn build_attrs<H: RenditionHost>(
    image: &H::Image,
    config: &ResponsiveImageConfig,
    host: &mut H,
) -> Result<ImgAttrs, H::Error> {
    ResponsiveImage::new(image, config, host).attrs()
}
