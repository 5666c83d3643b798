//! Page rendering and site output.
//!
//! Every directory of the content tree is a page. A page's body lives in
//! `contents.md` inside that directory; pages without one are skipped by
//! [`build_site`] (they only hold assets).
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html             # page "/"
//! ├── about/
//! │   └── index.html         # page "/about"
//! └── ...                    # renditions and published originals
//! ```
//!
//! Documents are produced with [maud](https://maud.lambda.xyz/); the page
//! title comes from the first `# ` heading, falling back to the page path.

use crate::config::ResponsiveImageConfig;
use crate::content::{ContentTree, ImageRecord, Node, PageRecord};
use crate::markdown::{MarkdownContext, render_markdown};
use crate::renditions::RenditionError;
use crate::responsive::RenditionHost;
use log::{debug, info};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONTENTS_FILENAME: &str = "contents.md";

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Rendition error: {0}")]
    Rendition(#[from] RenditionError),
    #[error("No page at {0}")]
    PageNotFound(String),
}

/// A page written by [`build_site`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    pub path: String,
    pub title: String,
    /// Written file, relative to the output directory.
    pub output: PathBuf,
}

fn find_page<'t>(tree: &'t ContentTree, page_path: &str) -> Result<&'t PageRecord, SiteError> {
    match tree.get(page_path) {
        Some(Node::Page(page)) => Ok(page),
        _ => Err(SiteError::PageNotFound(page_path.to_string())),
    }
}

fn read_contents(page: &PageRecord) -> Result<Option<String>, SiteError> {
    match fs::read_to_string(page.source_dir.join(CONTENTS_FILENAME)) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn render_source<H>(
    tree: &ContentTree,
    page: &PageRecord,
    source: &str,
    config: &ResponsiveImageConfig,
    host: &mut H,
) -> Result<String, SiteError>
where
    H: RenditionHost,
    H::Image: for<'r> From<&'r ImageRecord>,
    SiteError: From<H::Error>,
{
    let mut ctx = MarkdownContext {
        tree,
        current: Some(page.path.as_str()),
        config,
        host,
    };
    Ok(render_markdown(source, &mut ctx)?)
}

/// Render the Markdown body of the page at `page_path` to an HTML fragment.
///
/// A page without `contents.md` renders as an empty fragment.
pub fn render_page<H>(
    tree: &ContentTree,
    page_path: &str,
    config: &ResponsiveImageConfig,
    host: &mut H,
) -> Result<String, SiteError>
where
    H: RenditionHost,
    H::Image: for<'r> From<&'r ImageRecord>,
    SiteError: From<H::Error>,
{
    let page = find_page(tree, page_path)?;
    match read_contents(page)? {
        Some(source) => render_source(tree, page, &source, config, host),
        None => Ok(String::new()),
    }
}

/// Text of the first level-one ATX heading, if any.
pub fn page_title(source: &str) -> Option<&str> {
    source
        .lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().trim_end_matches('#').trim_end())
        .filter(|title| !title.is_empty())
}

/// Output file of a page, relative to the output directory.
fn page_output(page_path: &str) -> PathBuf {
    Path::new(page_path.trim_matches('/')).join("index.html")
}

fn page_document(title: &str, body: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
            }
            body {
                main { (PreEscaped(body)) }
            }
        }
    }
}

/// Render every page with a `contents.md` into `output_dir`.
///
/// Pages are processed in content-path order; the first error aborts the
/// build.
pub fn build_site<H>(
    tree: &ContentTree,
    config: &ResponsiveImageConfig,
    host: &mut H,
    output_dir: &Path,
) -> Result<Vec<WrittenPage>, SiteError>
where
    H: RenditionHost,
    H::Image: for<'r> From<&'r ImageRecord>,
    SiteError: From<H::Error>,
{
    let mut written = Vec::new();
    for page in tree.pages() {
        let Some(source) = read_contents(page)? else {
            debug!("{}: no {CONTENTS_FILENAME}, skipping", page.path);
            continue;
        };
        let body = render_source(tree, page, &source, config, host)?;
        let title = page_title(&source).unwrap_or(&page.path).to_string();

        let output = page_output(&page.path);
        let file = output_dir.join(&output);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, page_document(&title, &body).into_string())?;
        info!("wrote {} → {}", page.path, file.display());

        written.push(WrittenPage {
            path: page.path.clone(),
            title,
            output,
        });
    }
    Ok(written)
}
