//! Export one element from an HTML file as a standalone document.
//!
//! The click target is designated with a CSS selector; the first match in
//! document order is exported.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::error;
use url::Url;

use elemsnap::css::loader::{DocumentStyles, FileLoader, NoLoader, StylesheetLoader};
use elemsnap::dom::parse_html;
use elemsnap::error::{Error, Result};
use elemsnap::session::{Event, ExportOptions, Session};

#[derive(Parser, Debug)]
#[command(name = "snap_element", about = "Export an element from an HTML page")]
struct Args {
  /// HTML file to read.
  input: PathBuf,

  /// CSS selector for the element to export; the first match wins.
  #[arg(short, long)]
  selector: String,

  /// Page URL, used to absolutize relative src/href attributes and to
  /// resolve stylesheet links.
  #[arg(short, long)]
  base_url: Option<Url>,

  /// Directory the exported element.html is written into.
  #[arg(short, long, default_value = ".")]
  output_dir: PathBuf,

  /// JSON file with export options; command-line flags override it.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Leave relative URLs as authored.
  #[arg(long)]
  keep_relative: bool,

  /// Do not read stylesheets referenced by <link> from disk.
  #[arg(long)]
  no_linked_sheets: bool,
}

fn load_options(args: &Args) -> Result<ExportOptions> {
  let mut options = match &args.config {
    Some(path) => {
      let text = fs::read_to_string(path)?;
      serde_json::from_str(&text)
        .map_err(|e| Error::Other(format!("bad config {}: {}", path.display(), e)))?
    }
    None => ExportOptions::default(),
  };
  if let Some(base) = &args.base_url {
    options.base_url = Some(base.clone());
  }
  if args.keep_relative {
    options.resolve_urls = false;
  }
  Ok(options)
}

fn run(args: &Args) -> Result<PathBuf> {
  let html = fs::read_to_string(&args.input)?;
  let document = parse_html(&html)?;
  let options = load_options(args)?;

  // Linked sheets resolve next to the input file unless disabled.
  let base_dir = args
    .input
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or(Path::new("."));
  let loader: Box<dyn StylesheetLoader> = if args.no_linked_sheets {
    Box::new(NoLoader)
  } else {
    Box::new(FileLoader::new(base_dir))
  };
  let styles = DocumentStyles::collect(&document, loader.as_ref(), options.base_url.as_ref());

  let target = document
    .select_first(&args.selector)?
    .ok_or_else(|| Error::Other(format!("no element matches '{}'", args.selector)))?;

  let mut session = Session::new(document, styles, options);
  session.dispatch(Event::Hover(target.clone()))?;
  let exported = session
    .dispatch(Event::Click(target))?
    .ok_or_else(|| Error::Other("session produced no document".to_string()))?;

  exported.write_to(&args.output_dir)
}

fn main() -> ExitCode {
  env_logger::init();
  let args = Args::parse();
  match run(&args) {
    Ok(path) => {
      println!("{}", path.display());
      ExitCode::SUCCESS
    }
    Err(e) => {
      error!("{}", e);
      eprintln!("snap_element: {}", e);
      ExitCode::FAILURE
    }
  }
}
