use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use directories::ProjectDirs;
use tracing::{info, debug};

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScraperConfig {
    pub scraper: ScraperSettings,
    pub browser: BrowserSettings,
    pub extraction: ExtractionSettings,
}

/// Run-level settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScraperSettings {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub politeness_delay: u64,   // Delay between URLs in milliseconds
    pub retry_delay: u64,        // Pause before retrying a timed out URL, in milliseconds
    pub navigation_timeout: u64, // Per wait strategy, in seconds
    pub body_timeout: u64,       // Wait for <body> after load, in seconds
}

/// Browser session settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: String,
    pub accept_language: String,
    pub blocked_resources: Vec<String>,
    pub settle: SettleSettings,
}

/// Browser viewport settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Pauses of the scroll sequence run after each load, in milliseconds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SettleSettings {
    pub middle_pause: u64,
    pub bottom_pause: u64,
    pub top_pause: u64,
}

/// Field extraction settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionSettings {
    pub brand: String,
    pub taglines: Vec<String>,
    pub earliest_year: i32,
    pub max_listing_count: u32,
    pub max_name_len: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            scraper: ScraperSettings {
                input_file: PathBuf::from("urls.txt"),
                output_dir: PathBuf::from("output"),
                politeness_delay: 600,
                retry_delay: 1200,
                navigation_timeout: 120,
                body_timeout: 15,
            },
            browser: BrowserSettings {
                webdriver_url: "http://localhost:4444".to_string(),
                headless: true,
                viewport: Viewport {
                    width: 1366,
                    height: 900,
                },
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string(),
                accept_language: "fr-FR,fr;q=0.9,en;q=0.8".to_string(),
                blocked_resources: [
                    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.webp", "*.avif", "*.svg", "*.ico",
                    "*.woff", "*.woff2", "*.ttf", "*.otf",
                    "*.mp4", "*.webm", "*.mp3", "*.m4a",
                ]
                .iter()
                .map(|p| p.to_string())
                .collect(),
                settle: SettleSettings {
                    middle_pause: 700,
                    bottom_pause: 1000,
                    top_pause: 400,
                },
            },
            extraction: ExtractionSettings::default(),
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            brand: "Airbnb".to_string(),
            taglines: vec!["locations de vacances".to_string()],
            earliest_year: 2007,
            max_listing_count: 1000,
            max_name_len: 80,
        }
    }
}

const PROFILES_DIR: &str = "sites";
const DEFAULT_FILE: &str = "default.yaml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "profile-scraper", "profile-scraper")
}

impl ScraperConfig {
    fn config_dir() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Log file used when `--log-file` is given without a path
    pub fn default_log_file() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("./logs"))
            .join("scraper.log")
    }

    fn profile_path(profile: &str) -> PathBuf {
        Self::config_dir().join(PROFILES_DIR).join(format!("{}.yaml", profile))
    }

    /// Load the default configuration, writing it out on first use
    pub fn load_default() -> Result<Self> {
        let path = Self::config_dir().join(DEFAULT_FILE);
        if path.exists() {
            return Self::load_from_file(&path);
        }

        info!("No default configuration at {}, creating it", path.display());
        let config = Self::default();
        config.save_to_file(&path)?;
        Ok(config)
    }

    /// Load a named profile
    pub fn load_profile(profile: &str) -> Result<Self> {
        let path = Self::profile_path(profile);
        if !path.exists() {
            anyhow::bail!("Profile '{}' not found at {}", profile, path.display());
        }
        Self::load_from_file(&path)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }

    /// Parse a configuration document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Store the configuration as a named profile and return its path
    pub fn save_as_profile(&self, profile: &str) -> Result<PathBuf> {
        let path = Self::profile_path(profile);
        self.save_to_file(&path)?;
        Ok(path)
    }

    fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let contents = serde_yaml::to_string(self).context("Failed to serialize configuration")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        debug!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Names of the stored profiles, sorted
    pub fn list_profiles() -> Result<Vec<String>> {
        profiles_in(&Self::config_dir().join(PROFILES_DIR))
    }
}

fn profiles_in(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut profiles = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "yaml"))
        .filter_map(|path| path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string))
        .collect::<Vec<_>>();

    profiles.sort();
    Ok(profiles)
}
