use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "page-haul")]
#[command(about = "Fetch a batch of URLs through headless browser sessions and emit normalized text")]
#[command(version)]
pub struct Args {
    /// URLs to fetch
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Number of concurrent fetches (and browser sessions)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Browser navigation timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Directory for downloaded files (defaults to the system temp dir)
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip the lightweight HTTP pass and always drive the browser
    #[arg(long)]
    pub browser_only: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}
