use anyhow::{Result, Context};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::{Duration, Instant};
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::prelude::*;
use thirtyfour::{CapabilitiesHelper, PageLoadStrategy};
use tokio::time::sleep;
use tracing::{debug, error};

use crate::browser::navigation::{PageDriver, WaitStrategy};
use crate::browser::readiness::{LoadState, ReadinessTracker, LOAD_STATE_SCRIPT, MARK_STALE_SCRIPT};
use crate::cli::config::BrowserSettings;
use crate::extract::Snapshot;

/// How often load state is polled
const POLL_INTERVAL: Duration = Duration::from_millis(250);

const BODY_TEXT_SCRIPT: &str = "return document.body ? document.body.innerText : '';";

const NEXT_DATA_SCRIPT: &str = r#"
    try {
        return window.__NEXT_DATA__ ? JSON.stringify(window.__NEXT_DATA__) : null;
    } catch (e) {
        return null;
    }
"#;

/// Browser session manager
pub struct BrowserSession {
    /// Browser settings
    config: BrowserSettings,

    /// Wait for <body> after a load
    body_timeout: Duration,

    /// WebDriver instance
    driver: Option<WebDriver>,
}

impl BrowserSession {
    /// Create a new browser session
    pub fn new(config: BrowserSettings, body_timeout: Duration) -> Self {
        Self {
            config,
            body_timeout,
            driver: None,
        }
    }

    /// Initialize the browser session
    pub async fn initialize(&mut self) -> Result<()> {
        // Close any existing session
        self.close().await?;

        let mut caps = DesiredCapabilities::chrome();

        caps.add_chrome_arg(&format!("--user-agent={}", self.config.user_agent))?;
        caps.add_chrome_arg(&format!(
            "--lang={}",
            self.config.accept_language.split(',').next().unwrap_or("en-US")
        ))?;
        caps.add_chrome_arg(&format!(
            "--window-size={},{}",
            self.config.viewport.width, self.config.viewport.height
        ))?;

        if self.config.headless {
            caps.set_headless()?;
        }

        caps.add_chrome_arg("--no-sandbox")?;
        caps.add_chrome_arg("--disable-setuid-sandbox")?;
        caps.add_chrome_arg("--disable-dev-shm-usage")?;
        caps.add_chrome_option("prefs", json!({ "intl.accept_languages": self.config.accept_language }))?;

        // Loads return immediately; the wait strategies decide when a page is ready
        caps.add("pageLoadStrategy", PageLoadStrategy::None)?;

        let driver = WebDriver::new(&self.config.webdriver_url, caps).await
            .context(format!("Failed to connect to WebDriver at {}", self.config.webdriver_url))?;

        ChromeDevTools::new(driver.handle.clone())
            .execute_cdp("Network.enable")
            .await
            .context("Failed to enable DevTools network domain")?;

        debug!("Browser session initialized against {}", self.config.webdriver_url);

        self.driver = Some(driver);

        Ok(())
    }

    fn driver(&self) -> Result<&WebDriver> {
        self.driver.as_ref()
            .context("Browser session not initialized")
    }

    /// Execute JavaScript on the page
    async fn execute_script<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let result = self.driver()?.execute(script, Vec::new()).await
            .context("Failed to execute JavaScript")?;

        let value = result.convert::<T>()
            .context("Failed to parse JavaScript result")?;

        Ok(value)
    }

    async fn set_blocked_urls(&self, urls: &[String]) -> Result<()> {
        let devtools = ChromeDevTools::new(self.driver()?.handle.clone());
        devtools
            .execute_cdp_with_params("Network.setBlockedURLs", json!({ "urls": urls }))
            .await
            .context("Failed to update blocked URLs")?;
        Ok(())
    }

    /// Poll until the newly committed document satisfies `wait`
    async fn wait_until(&self, wait: WaitStrategy) -> Result<()> {
        let mut tracker = ReadinessTracker::new(wait);

        loop {
            let sample: LoadState = self.execute_script(LOAD_STATE_SCRIPT).await?;

            if tracker.observe(&sample, Instant::now()) {
                debug!("Page ready ({:?}, {} resource(s))", wait, sample.resources);
                return Ok(());
            }

            sleep(POLL_INTERVAL).await;
        }
    }

    /// Close the browser session
    pub async fn close(&mut self) -> Result<()> {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.quit().await {
                error!("Error closing browser session: {}", e);
            }
            debug!("Browser session closed");
        }

        Ok(())
    }
}

#[async_trait]
impl PageDriver for BrowserSession {
    async fn install_request_filter(&self) -> Result<()> {
        self.set_blocked_urls(&self.config.blocked_resources).await
    }

    async fn remove_request_filter(&self) -> Result<()> {
        self.set_blocked_urls(&[]).await
    }

    async fn load(&self, url: &str, wait: WaitStrategy) -> Result<()> {
        let driver = self.driver()?;

        self.execute_script::<Option<String>>(MARK_STALE_SCRIPT).await
            .context("Failed to mark the current document")?;

        debug!("Navigating to {} ({:?})", url, wait);
        driver.goto(url).await
            .context(format!("Failed to navigate to URL: {}", url))?;

        self.wait_until(wait).await?;

        driver.query(By::Tag("body"))
            .wait(self.body_timeout, POLL_INTERVAL)
            .first()
            .await
            .context("Page has no body")?;

        Ok(())
    }

    async fn scroll_to(&self, fraction: f64) -> Result<()> {
        let script = format!(
            "window.scrollTo(0, document.body.scrollHeight * {}); return null;",
            fraction
        );
        self.driver()?.execute(&script, Vec::new()).await
            .context("Failed to scroll")?;
        Ok(())
    }

    async fn harvest(&self) -> Result<Snapshot> {
        let markup = self.driver()?.source().await
            .context("Failed to get page source")?;
        let body_text: String = self.execute_script(BODY_TEXT_SCRIPT).await?;
        let next_data: Option<String> = self.execute_script(NEXT_DATA_SCRIPT).await?;

        Ok(Snapshot::from_page(markup, body_text, next_data))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            // Spawn a task to quit the driver
            tokio::spawn(async move {
                if let Err(e) = driver.quit().await {
                    error!("Error closing browser session during drop: {}", e);
                }
            });
        }
    }
}
