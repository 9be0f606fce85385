use anyhow::{Result, Context};
use chrono::{Datelike, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::browser::{BrowserSession, NavigationController, SettleSequence};
use crate::cli::config::ScraperConfig;
use crate::cli::ScrapeOverrides;
use crate::crawler::{load_tasks, ScrapeController};
use crate::extract::ExtractionContext;
use crate::storage::{merge_files, write_results, FilesystemArtifactStore, MERGED_FILE, RESULTS_FILE};
use std::path::PathBuf;

/// Run the whole pipeline over the input file
pub async fn scrape(profile: Option<String>, overrides: ScrapeOverrides) -> Result<()> {
    let mut config = match &profile {
        Some(name) => ScraperConfig::load_profile(name)
            .context(format!("Failed to load profile: {}", name))?,
        None => ScraperConfig::load_default()?,
    };
    apply_overrides(&mut config, overrides);

    let tasks = load_tasks(&config.scraper.input_file)?;
    info!("Loaded {} URL(s) from {}", tasks.len(), config.scraper.input_file.display());

    let output_dir = config.scraper.output_dir.clone();
    let artifacts = FilesystemArtifactStore::create(&output_dir)?;
    info!("Debug dumps go to {}", artifacts.dir().display());

    let context = ExtractionContext::new(config.extraction.clone(), Utc::now().year())
        .context("Invalid extraction settings")?;

    let mut session = BrowserSession::new(
        config.browser.clone(),
        Duration::from_secs(config.scraper.body_timeout),
    );
    session.initialize().await?;

    let navigation = NavigationController::new(
        session,
        Duration::from_secs(config.scraper.navigation_timeout),
        SettleSequence::from_settings(&config.browser.settle),
    );

    let controller = ScrapeController::new(
        context,
        Arc::new(artifacts),
        Duration::from_millis(config.scraper.politeness_delay),
        Duration::from_millis(config.scraper.retry_delay),
    );

    let report = controller.run(&navigation, tasks).await;

    let mut session = navigation.into_driver();
    if let Err(e) = session.close().await {
        warn!("Failed to close browser session: {:#}", e);
    }

    let results_path = output_dir.join(RESULTS_FILE);
    write_results(&results_path, &report.records)?;

    println!(
        "Done: {} complete, {} partial, {} failed. Results in {}",
        report.metrics.complete,
        report.metrics.partial,
        report.metrics.failed,
        results_path.display()
    );

    Ok(())
}

/// Join listing rows with host records; defaults come from the default profile
pub async fn merge(listings: Vec<PathBuf>, hosts: Vec<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let output_dir = ScraperConfig::load_default()?.scraper.output_dir;

    let hosts = if hosts.is_empty() {
        vec![output_dir.join(RESULTS_FILE)]
    } else {
        hosts
    };
    let output = output.unwrap_or_else(|| output_dir.join(MERGED_FILE));

    let summary = merge_files(&listings, &hosts, &output)?;

    if summary.rows == 0 {
        println!("No listing rows to merge");
    } else {
        println!(
            "Merged {} listing(s), {} with host data, {} without. Results in {}",
            summary.rows,
            summary.matched,
            summary.rows - summary.matched,
            output.display()
        );
    }

    Ok(())
}

/// Command line values win over the profile
fn apply_overrides(config: &mut ScraperConfig, overrides: ScrapeOverrides) {
    if let Some(input) = overrides.input {
        config.scraper.input_file = input;
    }

    if let Some(output) = overrides.output {
        config.scraper.output_dir = output;
    }

    if let Some(url) = overrides.webdriver {
        config.browser.webdriver_url = url;
    }

    if overrides.headed {
        config.browser.headless = false;
    }
}

/// List all available configuration profiles
pub async fn list_profiles() -> Result<()> {
    let profiles = ScraperConfig::list_profiles()?;

    println!("Available configuration profiles:");
    for profile in profiles {
        println!("  - {}", profile);
    }

    Ok(())
}

/// Manage a specific configuration profile
pub async fn manage_profile(profile_name: String) -> Result<()> {
    match ScraperConfig::load_profile(&profile_name) {
        Ok(config) => {
            println!("Profile: {}", profile_name);
            println!("{:#?}", config);
        },
        Err(_) => {
            // Profile doesn't exist, create a new one
            warn!("Profile '{}' does not exist. Creating a default profile.", profile_name);
            let config = ScraperConfig::default();
            let path = config.save_as_profile(&profile_name)?;
            println!("Created default profile: {} ({})", profile_name, path.display());
        }
    }

    Ok(())
}

/// Show the current configuration
pub async fn show_config() -> Result<()> {
    let config = ScraperConfig::load_default()?;
    println!("Current configuration:");
    println!("{:#?}", config);

    Ok(())
}
