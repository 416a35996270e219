// ABOUTME: Command line arguments for the carto binary
// ABOUTME: Parsed with clap derive; config file values are layered underneath

use clap::Parser;
use std::path::PathBuf;

use crate::config::AppConfig;

/// Index a project headlessly and report when parsing finishes
#[derive(Parser, Debug)]
#[command(name = "carto")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Project directory or project file to load
    pub project: PathBuf,

    /// Configuration file to use
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (up to -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Re-index everything even if the project is already indexed
    #[arg(long)]
    pub force: bool,

    /// Do not wait for license validation before showing start-up content
    #[arg(long)]
    pub no_license_check: bool,

    /// Seconds to wait for indexing before giving up
    #[arg(long, default_value_t = 300, value_name = "SECS")]
    pub timeout: u64,
}

impl Args {
    /// Apply command line overrides to a loaded configuration
    pub fn apply_to(&self, config: &mut AppConfig) {
        if self.no_license_check {
            config.license_check = false;
        }
        config.verbosity = config.verbosity.saturating_add(self.verbose);
    }
}

pub fn parse_args() -> Args {
    Args::parse()
}
