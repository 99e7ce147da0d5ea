//! Render command - resolve a document against fixtures, print markup.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use folia_case::Str;
use folia_forme::Document;
use folia_press::{MemoryRepository, ResolveOptions};

use folia::resolve_to_markup;

#[derive(Args)]
pub struct RenderArgs {
    /// Document JSON file
    #[arg(long)]
    pub document: PathBuf,

    /// Fixture repository JSON file (components, collections, assets,
    /// pages, translations)
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// Locale to overlay
    #[arg(long)]
    pub locale: Option<String>,

    /// IANA timezone for date formatting
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Resolve draft copies instead of published ones
    #[arg(long)]
    pub draft: bool,

    /// Requested page per collection layer, as `layerId=N`; repeatable
    #[arg(long = "page", value_parser = parse_page_number)]
    pub pages: Vec<(String, u32)>,

    /// Overall resolution deadline in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub deadline_ms: u64,

    /// Emit one fragment per top-level layer instead of joined markup
    #[arg(long)]
    pub fragments: bool,
}

fn parse_page_number(raw: &str) -> Result<(String, u32), String> {
    let (layer, page) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected layerId=N, got '{raw}'"))?;
    let page: u32 = page
        .parse()
        .map_err(|_| format!("page number in '{raw}' is not a number"))?;
    Ok((layer.to_string(), page))
}

pub fn run(args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let document = Document::from_json(&fs::read_to_string(&args.document)?)?;
    let repo = match &args.fixtures {
        Some(path) => MemoryRepository::from_json(&fs::read_to_string(path)?)?,
        None => MemoryRepository::default(),
    };

    let mut options = ResolveOptions {
        published: !args.draft,
        locale: args.locale.as_deref().map(Str::from),
        timezone: Str::from(args.timezone.as_str()),
        page_id: document.page_id.clone(),
        ..ResolveOptions::default()
    };
    for (layer, page) in &args.pages {
        options.page_numbers.insert(Str::from(layer.as_str()), *page);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let output = runtime.block_on(resolve_to_markup(
        &repo,
        &document,
        Default::default(),
        options,
        Some(Duration::from_millis(args.deadline_ms)),
    ))?;

    for diagnostic in &output.diagnostics {
        tracing::warn!(
            code = ?diagnostic.code,
            layer = %diagnostic.layer_id,
            "{}",
            diagnostic.detail
        );
    }

    if args.fragments {
        for fragment in &output.fragments {
            println!("{fragment}");
        }
    } else {
        println!("{}", output.markup);
    }
    Ok(())
}
