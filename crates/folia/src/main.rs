//! # folia
//!
//! Folia - layer resolution and dual rendering for visual website
//! builders.
//!
//! ## Name Origin
//!
//! **Folia** (/ˈfoʊliə/) is the plural of *folium* — leaf. A site here
//! is a tree of leaves: layers composed, resolved and pressed onto the
//! page.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "folia")]
#[command(about = "Layer resolution and rendering for visual website builders", long_about = None)]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', short_alias = 'V', long, action = clap::ArgAction::Version)]
    version: (),
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a document against fixture data and print its markup
    #[command(visible_alias = "galley")]
    Render(commands::render::RenderArgs),

    /// Print the content hash of a document
    Hash(commands::hash::HashArgs),
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Hash(args) => commands::hash::run(args),
    };
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}
