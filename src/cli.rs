use clap::Parser;
use std::path::PathBuf;

use crate::models::Edition;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "stockwatch",
    version,
    about = "Check PlayStation 5 availability at Dutch retailers"
)]
pub struct Args {
    /// Retailer keys to check, e.g. `-s bolnl -s coolbluenl` or `-s bolnl,coolbluenl`.
    /// Defaults to `runner.default_retailers` from the configuration.
    #[arg(short, long = "store", value_delimiter = ',')]
    pub stores: Vec<String>,

    /// Console edition to check (disc or digital)
    #[arg(short, long)]
    pub edition: Option<Edition>,

    /// Extra configuration file layered over `config/`
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Serve saved pages from this directory instead of launching Chrome
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    /// List known retailers and exit
    #[arg(long)]
    pub list: bool,

    /// Print the batch result as JSON instead of a text summary
    #[arg(long)]
    pub json: bool,

    /// Log at debug level regardless of configuration
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Requested keys, falling back to the configured defaults.
    pub fn stores_or(&self, defaults: &[String]) -> Vec<String> {
        let requested: Vec<String> = self
            .stores
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if requested.is_empty() {
            defaults.to_vec()
        } else {
            requested
        }
    }
}
