use clap::{Parser, Subcommand};
use log::debug;
use responsive_image::content::{ContentTree, Node};
use responsive_image::imaging::{RustBackend, select_widths};
use responsive_image::renditions::{DiskRenditions, Rendition};
use responsive_image::{config, output, responsive, site};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "responsive-image")]
#[command(about = "Render Markdown images as responsive <img> tags")]
#[command(long_about = "\
Render Markdown images as responsive <img> tags

Every directory under the content root is a page; its body is contents.md.
Images embedded with ![alt](src \"title\") that point at a local PNG, GIF or
JPEG are rewritten with width, height, srcset and sizes attributes, and a
downscaled rendition is written for every configured width.

Content structure:

  content/
  ├── contents.md              # Page \"/\"
  ├── hero.jpg                 # ![Hero](hero.jpg)
  └── about/
      ├── contents.md          # Page \"/about\", may use ../hero.jpg
      └── portrait.png

Run 'responsive-image gen-config' to generate a documented responsive-image.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    content: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Configuration file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// URL prefix renditions are published under
    #[arg(long, default_value = "/", global = true)]
    base_url: String,

    /// Ignore the rendition cache and re-encode everything
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every page into the output directory
    Build,
    /// Render one page and print the HTML fragment
    Render {
        /// Content path of the page, e.g. /about
        page: String,
    },
    /// Print the responsive attributes of one image as JSON
    Attrs {
        /// Content path of the image, e.g. /about/portrait.png
        image: String,
    },
    /// Print the widths that would be rendered for an image this wide
    Widths { image_width: u32 },
    /// Print a stock responsive-image.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;
    debug!("config: {config:?}");

    if let Command::Widths { image_width } = cli.command {
        let widths: Vec<String> = select_widths(image_width, &config.widths)
            .iter()
            .map(u32::to_string)
            .collect();
        println!("{}", widths.join(" "));
        return Ok(());
    }

    let backend = RustBackend::new();
    let tree = ContentTree::scan(&cli.content, &backend)?;

    match cli.command {
        Command::Build => {
            println!("==> Scanning {}", cli.content.display());
            output::print_scan_output(&tree, &config);

            println!("==> Rendering pages \u{2192} {}", cli.output.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_rendition_event(&event));
                }
            });
            let mut host =
                DiskRenditions::new(&backend, &cli.output, &cli.base_url, !cli.no_cache)
                    .with_events(tx);
            let pages = site::build_site(&tree, &config, &mut host, &cli.output)?;
            let stats = host.finish()?;
            printer.join().map_err(|_| "progress printer panicked")?;

            output::print_build_output(&pages);
            println!("Cache: {}", stats);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Render { page } => {
            let mut host =
                DiskRenditions::new(&backend, &cli.output, &cli.base_url, !cli.no_cache);
            let html = site::render_page(&tree, &page, &config, &mut host)?;
            host.finish()?;
            print!("{}", html);
        }
        Command::Attrs { image } => {
            let record = match tree.get(&image) {
                Some(Node::Image(record)) if record.format.is_responsive() => record,
                Some(Node::Image(record)) => {
                    return Err(format!(
                        "{} is a {} image; only PNG, GIF and JPEG are resized",
                        record.path,
                        record.format.extension()
                    )
                    .into());
                }
                _ => return Err(format!("no image at {image}").into()),
            };
            let mut host =
                DiskRenditions::new(&backend, &cli.output, &cli.base_url, !cli.no_cache);
            let attrs = responsive::build_attrs(&Rendition::from(record), &config, &mut host)?;
            host.finish()?;
            println!("{}", serde_json::to_string_pretty(&attrs)?);
        }
        Command::Widths { .. } | Command::GenConfig => {}
    }

    Ok(())
}
