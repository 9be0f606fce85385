use anyhow::Result;
use tracing::{info, error};

mod browser;
mod cli;
mod crawler;
mod error;
mod extract;
mod storage;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    let log_file = args.log_file.clone()
        .map(|path| path.unwrap_or_else(cli::config::ScraperConfig::default_log_file));
    utils::init_logging(args.verbose, log_file.as_deref())?;

    info!("Starting Profile Scraper v{}", env!("CARGO_PKG_VERSION"));

    // Process commands
    match cli::process_command(args).await {
        Ok(_) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
