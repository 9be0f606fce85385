pub mod commands;
pub mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to a file (platform data dir when no path is given)
    #[arg(long, global = true)]
    pub log_file: Option<Option<PathBuf>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Visit every profile URL and write results.csv
    Scrape {
        /// File with one profile URL per line
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for results.csv and debug dumps
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration profile to use instead of the default
        #[arg(short, long)]
        profile: Option<String>,

        /// WebDriver endpoint
        #[arg(long)]
        webdriver: Option<String>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },

    /// Join listing-phase CSV rows with scraped host records
    Merge {
        /// Listing CSV files, or directories of them
        #[arg(short, long, required = true, num_args = 1..)]
        listings: Vec<PathBuf>,

        /// Host result files or directories (defaults to the output dir's results.csv)
        #[arg(long, num_args = 1..)]
        hosts: Vec<PathBuf>,

        /// Merged file (defaults to final_complete_results.csv in the output dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage configuration profiles
    Config {
        /// Profile name to manage
        #[arg(required = false)]
        profile: Option<String>,

        /// List all available profiles
        #[arg(short, long)]
        list: bool,
    },
}

/// Options for the scrape command, applied on top of the loaded profile
#[derive(Debug, Default)]
pub struct ScrapeOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub webdriver: Option<String>,
    pub headed: bool,
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scrape { input, output, profile, webdriver, headed } => {
            info!("Starting scrape with profile {}", profile.as_deref().unwrap_or("default"));
            let overrides = ScrapeOverrides { input, output, webdriver, headed };
            commands::scrape(profile, overrides).await
        },
        Commands::Merge { listings, hosts, output } => {
            info!("Merging {} listing input(s)", listings.len());
            commands::merge(listings, hosts, output).await
        },
        Commands::Config { profile, list } => {
            if list {
                info!("Listing all configuration profiles");
                commands::list_profiles().await
            } else if let Some(profile_name) = profile {
                info!("Managing configuration profile: {}", profile_name);
                commands::manage_profile(profile_name).await
            } else {
                info!("Showing current configuration");
                commands::show_config().await
            }
        },
    }
}
