use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::browser::behavior::SettleSequence;
use crate::error::NavigationError;
use crate::extract::Snapshot;

/// What "loaded" means for one navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Document complete and no new network activity for a quiet window
    NetworkIdle,
    /// Initial DOM constructed
    DomContentLoaded,
}

/// Low-level page operations on a live browser page
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Start blocking heavy resources for the coming visit
    async fn install_request_filter(&self) -> Result<()>;

    /// Remove the filter installed by `install_request_filter`
    async fn remove_request_filter(&self) -> Result<()>;

    /// Navigate and wait until `wait` is satisfied
    async fn load(&self, url: &str, wait: WaitStrategy) -> Result<()>;

    /// Scroll to a fraction of the document height
    async fn scroll_to(&self, fraction: f64) -> Result<()>;

    /// Collect the snapshot of the current page
    async fn harvest(&self) -> Result<Snapshot>;
}

/// Produces a snapshot for a URL
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn capture(&self, url: &str) -> Result<Snapshot, NavigationError>;
}

/// Loads pages with a primary/fallback wait strategy and harvests them
pub struct NavigationController<D> {
    driver: D,
    timeout: Duration,
    settle: SettleSequence,
}

impl<D: PageDriver> NavigationController<D> {
    pub fn new(driver: D, timeout: Duration, settle: SettleSequence) -> Self {
        Self {
            driver,
            timeout,
            settle,
        }
    }

    /// Give back the driver, e.g. to close the session
    pub fn into_driver(self) -> D {
        self.driver
    }

    async fn load_within(&self, url: &str, wait: WaitStrategy) -> Result<(), NavigationError> {
        match timeout(self.timeout, self.driver.load(url, wait)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(NavigationError::driver(url, format!("{:#}", e))),
            Err(_) => Err(NavigationError::timeout(url, self.timeout)),
        }
    }

    async fn load_with_fallback(&self, url: &str) -> Result<(), NavigationError> {
        match self.load_within(url, WaitStrategy::NetworkIdle).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Network idle wait failed, retrying with DOM content loaded: {}", e);
                self.load_within(url, WaitStrategy::DomContentLoaded).await
            }
        }
    }

    async fn visit(&self, url: &str) -> Result<Snapshot, NavigationError> {
        self.load_with_fallback(url).await?;

        self.settle.run(&self.driver).await
            .map_err(|e| NavigationError::driver(url, format!("{:#}", e)))?;

        let snapshot = self.driver.harvest().await
            .map_err(|e| NavigationError::driver(url, format!("{:#}", e)))?;

        debug!(
            "Harvested {} ({} bytes of markup, {} structured data block(s))",
            url,
            snapshot.raw_markup().len(),
            snapshot.structured_data_blocks().len()
        );

        Ok(snapshot)
    }
}

#[async_trait]
impl<D: PageDriver> SnapshotSource for NavigationController<D> {
    async fn capture(&self, url: &str) -> Result<Snapshot, NavigationError> {
        // The filter must be removed whatever happens during the visit
        let result = match self.driver.install_request_filter().await {
            Ok(()) => self.visit(url).await,
            Err(e) => Err(NavigationError::driver(url, format!("{:#}", e))),
        };

        if let Err(e) = self.driver.remove_request_filter().await {
            warn!("Failed to remove request filter after {}: {:#}", url, e);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;

    const URL: &str = "https://www.airbnb.fr/users/show/42";

    fn instant_settle() -> SettleSequence {
        SettleSequence::new(vec![(0.5, Duration::ZERO), (1.0, Duration::ZERO), (0.0, Duration::ZERO)])
    }

    fn controller(driver: MockPageDriver) -> NavigationController<MockPageDriver> {
        NavigationController::new(driver, Duration::from_secs(5), instant_settle())
    }

    #[tokio::test]
    async fn test_visit_runs_filter_load_settle_harvest_in_order() {
        let mut driver = MockPageDriver::new();
        let mut seq = Sequence::new();

        driver.expect_install_request_filter().times(1).in_sequence(&mut seq).returning(|| Ok(()));
        driver.expect_load()
            .with(eq(URL), eq(WaitStrategy::NetworkIdle))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        for fraction in [0.5, 1.0, 0.0] {
            driver.expect_scroll_to()
                .with(eq(fraction))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }
        driver.expect_harvest()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Snapshot::new("Profil de Anna", "<html></html>")));
        driver.expect_remove_request_filter().times(1).in_sequence(&mut seq).returning(|| Ok(()));

        let snapshot = controller(driver).capture(URL).await.unwrap();
        assert_eq!(snapshot.body_text(), "Profil de Anna");
    }

    #[tokio::test]
    async fn test_falls_back_to_dom_content_loaded() {
        let mut driver = MockPageDriver::new();
        driver.expect_install_request_filter().returning(|| Ok(()));
        driver.expect_load()
            .with(eq(URL), eq(WaitStrategy::NetworkIdle))
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("net::ERR_ABORTED")));
        driver.expect_load()
            .with(eq(URL), eq(WaitStrategy::DomContentLoaded))
            .times(1)
            .returning(|_, _| Ok(()));
        driver.expect_scroll_to().times(3).returning(|_| Ok(()));
        driver.expect_harvest().times(1).returning(|| Ok(Snapshot::default()));
        driver.expect_remove_request_filter().times(1).returning(|| Ok(()));

        assert!(controller(driver).capture(URL).await.is_ok());
    }

    #[tokio::test]
    async fn test_both_strategies_failing_still_removes_filter() {
        let mut driver = MockPageDriver::new();
        driver.expect_install_request_filter().returning(|| Ok(()));
        driver.expect_load().times(2).returning(|_, _| Err(anyhow::anyhow!("connection refused")));
        driver.expect_scroll_to().never();
        driver.expect_harvest().never();
        driver.expect_remove_request_filter().times(1).returning(|| Ok(()));

        let err = controller(driver).capture(URL).await.unwrap_err();
        assert_eq!(err.url, URL);
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_harvest_failure_still_removes_filter() {
        let mut driver = MockPageDriver::new();
        driver.expect_install_request_filter().returning(|| Ok(()));
        driver.expect_load().times(1).returning(|_, _| Ok(()));
        driver.expect_scroll_to().times(3).returning(|_| Ok(()));
        driver.expect_harvest().times(1).returning(|| Err(anyhow::anyhow!("javascript error")));
        driver.expect_remove_request_filter().times(1).returning(|| Ok(()));

        assert!(controller(driver).capture(URL).await.is_err());
    }

    /// Never finishes loading
    struct StalledDriver;

    #[async_trait]
    impl PageDriver for StalledDriver {
        async fn install_request_filter(&self) -> Result<()> {
            Ok(())
        }

        async fn remove_request_filter(&self) -> Result<()> {
            Ok(())
        }

        async fn load(&self, _url: &str, _wait: WaitStrategy) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn scroll_to(&self, _fraction: f64) -> Result<()> {
            Ok(())
        }

        async fn harvest(&self) -> Result<Snapshot> {
            Ok(Snapshot::default())
        }
    }

    #[tokio::test]
    async fn test_stalled_load_is_classified_as_timeout() {
        let controller = NavigationController::new(StalledDriver, Duration::from_millis(20), instant_settle());

        let err = controller.capture(URL).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("navigation timeout"));
    }
}
