//! Hash command - print a document's content hash.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use folia_forme::Document;

#[derive(Args)]
pub struct HashArgs {
    /// Document JSON file
    #[arg(long)]
    pub document: PathBuf,
}

pub fn run(args: HashArgs) -> Result<(), Box<dyn std::error::Error>> {
    let json = fs::read_to_string(&args.document)?;
    let document = Document::from_json(&json)?;
    println!("{}", document.hash()?);
    Ok(())
}
