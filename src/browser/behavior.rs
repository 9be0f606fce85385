use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::browser::navigation::PageDriver;
use crate::cli::config::SettleSettings;

/// Scroll sequence run after a load so lazily rendered sections show up
#[derive(Debug, Clone)]
pub struct SettleSequence {
    /// Scroll target as a fraction of the page height, then the pause after it
    steps: Vec<(f64, Duration)>,
}

impl SettleSequence {
    pub fn new(steps: Vec<(f64, Duration)>) -> Self {
        Self { steps }
    }

    /// Middle, bottom, then back to the top
    pub fn from_settings(settings: &SettleSettings) -> Self {
        Self::new(vec![
            (0.5, Duration::from_millis(settings.middle_pause)),
            (1.0, Duration::from_millis(settings.bottom_pause)),
            (0.0, Duration::from_millis(settings.top_pause)),
        ])
    }

    pub async fn run<D: PageDriver + ?Sized>(&self, driver: &D) -> Result<()> {
        for (fraction, pause) in &self.steps {
            driver.scroll_to(*fraction).await?;
            sleep(*pause).await;
        }

        debug!("Settled page with {} scroll step(s)", self.steps.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::navigation::MockPageDriver;

    #[tokio::test]
    async fn test_scroll_error_aborts_sequence() {
        let mut driver = MockPageDriver::new();
        driver.expect_scroll_to().times(1).returning(|_| Err(anyhow::anyhow!("no body")));

        let settle = SettleSequence::from_settings(&SettleSettings {
            middle_pause: 0,
            bottom_pause: 0,
            top_pause: 0,
        });
        assert!(settle.run(&driver).await.is_err());
    }
}
