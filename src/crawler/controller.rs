use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser::navigation::SnapshotSource;
use crate::crawler::task::{ScrapeTask, TaskState};
use crate::error::NavigationError;
use crate::extract::{build_record, ExtractionContext, ResultRecord};
use crate::storage::debug::ArtifactStore;
use crate::utils::metrics::{Outcome, RequestTimer, RunMetrics};

const DUMP_MISSING_NOTE: &str = " (debug dump not written)";

/// Records of a finished run, in input order
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<ResultRecord>,
    pub metrics: RunMetrics,
}

/// Result of one pass of the per-URL pipeline
struct Attempt {
    record: ResultRecord,
    error: Option<NavigationError>,
}

impl Attempt {
    fn timed_out(&self) -> bool {
        self.error.as_ref().map_or(false, NavigationError::is_timeout)
    }

    fn outcome(&self) -> Outcome {
        if self.error.is_some() {
            Outcome::Failed
        } else if self.record.is_complete() {
            Outcome::Complete
        } else {
            Outcome::Partial
        }
    }
}

/// Drives every input URL through navigation and extraction, one at a time
pub struct ScrapeController {
    context: ExtractionContext,
    artifacts: Arc<dyn ArtifactStore>,
    politeness_delay: Duration,
    retry_delay: Duration,
}

impl ScrapeController {
    pub fn new(
        context: ExtractionContext,
        artifacts: Arc<dyn ArtifactStore>,
        politeness_delay: Duration,
        retry_delay: Duration,
    ) -> Self {
        Self {
            context,
            artifacts,
            politeness_delay,
            retry_delay,
        }
    }

    /// Process every task in order; each one yields exactly one record
    pub async fn run(&self, source: &dyn SnapshotSource, mut tasks: Vec<ScrapeTask>) -> RunReport {
        let total = tasks.len();
        let mut records = Vec::with_capacity(total);
        let mut metrics = RunMetrics::new();

        info!("Processing {} URL(s)", total);

        for task in tasks.iter_mut() {
            task.state = TaskState::Processing;
            debug!("[{}/{}] {} is {}", task.index, total, task.url, task.state);

            let timer = RequestTimer::start();
            let (attempt, retried) = self.process_task(source, task).await;
            metrics.record(attempt.outcome(), retried, timer.end());

            print_progress(task, total, &attempt.record);
            records.push(attempt.record);

            task.state = TaskState::Done;
            debug!("[{}/{}] {} is {}", task.index, total, task.url, task.state);

            sleep(self.politeness_delay).await;
        }

        metrics.log_summary();

        RunReport { records, metrics }
    }

    /// Run the pipeline, retrying once when the first pass timed out
    async fn process_task(&self, source: &dyn SnapshotSource, task: &ScrapeTask) -> (Attempt, bool) {
        let attempt = self.attempt(source, task).await;
        if !attempt.timed_out() {
            return (attempt, false);
        }

        warn!("Navigation timed out for {}, retrying once", task.url);
        sleep(self.retry_delay).await;

        (self.attempt(source, task).await, true)
    }

    async fn attempt(&self, source: &dyn SnapshotSource, task: &ScrapeTask) -> Attempt {
        match source.capture(&task.url).await {
            Ok(snapshot) => {
                let mut record = build_record(task, &snapshot, &self.context);

                if let Err(e) = self.artifacts.save_markup(task.index, snapshot.raw_markup()).await {
                    warn!("Failed to save debug markup for {}: {:#}", task.url, e);
                    // Notes of a partial record point at the dump
                    if !record.notes.is_empty() {
                        record.notes.push_str(DUMP_MISSING_NOTE);
                    }
                }

                Attempt { record, error: None }
            }
            Err(e) => {
                error!("{}", e);
                Attempt {
                    record: ResultRecord::failed(task.url.as_str(), &e),
                    error: Some(e),
                }
            }
        }
    }
}

fn print_progress(task: &ScrapeTask, total: usize, record: &ResultRecord) {
    fn or_unknown<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map_or_else(|| "?".to_string(), T::to_string)
    }

    println!(
        "[{}/{}] {} => {} | rating {} | listings {} | joined {} | years {}",
        task.index,
        total,
        task.url,
        or_unknown(&record.name),
        or_unknown(&record.rating),
        or_unknown(&record.listing_count),
        or_unknown(&record.joined_year),
        or_unknown(&record.years_active),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::navigation::MockSnapshotSource;
    use crate::extract::{test_context, Snapshot};
    use crate::storage::debug::MockArtifactStore;
    use mockall::predicate::eq;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tasks(urls: &[&str]) -> Vec<ScrapeTask> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| ScrapeTask::new(i + 1, *url))
            .collect()
    }

    fn artifacts() -> Arc<dyn ArtifactStore> {
        let mut store = MockArtifactStore::new();
        store.expect_save_markup()
            .returning(|index, _| Ok(PathBuf::from(format!("debug/page_{}.html", index))));
        Arc::new(store)
    }

    fn controller(artifacts: Arc<dyn ArtifactStore>) -> ScrapeController {
        ScrapeController::new(test_context(), artifacts, Duration::ZERO, Duration::ZERO)
    }

    fn profile(name: &str) -> Snapshot {
        Snapshot::new(
            "Membre depuis 2018 · 4 annonces · Note globale 4,8",
            "<html></html>",
        )
        .with_heading(format!("Profil de {}", name))
    }

    #[tokio::test]
    async fn test_timeout_retried_once_and_order_preserved() {
        let urls = ["https://h.example/u/1", "https://h.example/u/2", "https://h.example/u/3"];
        let calls = Arc::new(AtomicUsize::new(0));

        let mut source = MockSnapshotSource::new();
        source.expect_capture().with(eq(urls[0])).times(1).returning(|_| Ok(profile("Alice")));
        let counter = calls.clone();
        source.expect_capture().with(eq(urls[1])).times(2).returning(move |url| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(NavigationError::timeout(url, Duration::from_secs(120)))
            } else {
                Ok(profile("Bruno"))
            }
        });
        source.expect_capture().with(eq(urls[2])).times(1).returning(|_| Ok(profile("Chloé")));

        let report = controller(artifacts()).run(&source, tasks(&urls)).await;

        assert_eq!(report.records.len(), 3);
        let names: Vec<_> = report.records.iter().map(|r| r.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["Alice", "Bruno", "Chloé"]);
        assert_eq!(report.records[1].url, urls[1]);
        assert!(report.records[1].notes.is_empty());
        assert_eq!(report.metrics.retries, 1);
        assert_eq!(report.metrics.complete, 3);
    }

    #[tokio::test]
    async fn test_second_timeout_is_kept_as_failure() {
        let url = "https://h.example/u/9";
        let mut source = MockSnapshotSource::new();
        source.expect_capture()
            .times(2)
            .returning(|url| Err(NavigationError::timeout(url, Duration::from_secs(120))));

        let mut store = MockArtifactStore::new();
        store.expect_save_markup().never();

        let report = controller(Arc::new(store)).run(&source, tasks(&[url])).await;

        assert_eq!(report.records.len(), 1);
        assert!(report.records[0].notes.starts_with("Error: "));
        assert_eq!(report.metrics.failed, 1);
    }

    #[tokio::test]
    async fn test_non_timeout_failure_is_not_retried() {
        let mut source = MockSnapshotSource::new();
        source.expect_capture()
            .times(1)
            .returning(|url| Err(NavigationError::driver(url, "net::ERR_NAME_NOT_RESOLVED")));

        let report = controller(artifacts()).run(&source, tasks(&["https://nope.example/u/1"])).await;

        assert!(report.records[0].notes.contains("ERR_NAME_NOT_RESOLVED"));
        assert_eq!(report.metrics.retries, 0);
    }

    #[tokio::test]
    async fn test_duplicates_produce_separate_records_and_dumps() {
        let url = "https://h.example/u/5";
        let mut source = MockSnapshotSource::new();
        source.expect_capture().times(2).returning(|_| Ok(Snapshot::new("", "<html>dup</html>")));

        let mut store = MockArtifactStore::new();
        store.expect_save_markup()
            .with(eq(1), eq("<html>dup</html>"))
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("debug/page_1.html")));
        store.expect_save_markup()
            .with(eq(2), eq("<html>dup</html>"))
            .times(1)
            .returning(|_, _| Ok(PathBuf::from("debug/page_2.html")));

        let report = controller(Arc::new(store)).run(&source, tasks(&[url, url])).await;

        assert_eq!(report.records.len(), 2);
        assert!(report.records[0].notes.ends_with("debug/page_1.html"));
        assert!(report.records[1].notes.ends_with("debug/page_2.html"));
        assert_eq!(report.metrics.partial, 2);
    }

    #[tokio::test]
    async fn test_artifact_failure_does_not_drop_record() {
        let mut source = MockSnapshotSource::new();
        source.expect_capture().returning(|_| Ok(profile("Dana")));

        let mut store = MockArtifactStore::new();
        store.expect_save_markup().returning(|_, _| Err(anyhow::anyhow!("disk full")));

        let report = controller(Arc::new(store)).run(&source, tasks(&["https://h.example/u/7"])).await;
        tokio_test::assert_ok!(report.records.first().map(|r| r.name.clone()).ok_or("missing record"));
        assert_eq!(report.records[0].name.as_deref(), Some("Dana"));
        assert!(report.records[0].notes.is_empty());
    }

    #[tokio::test]
    async fn test_partial_record_notes_when_dump_not_written() {
        let mut source = MockSnapshotSource::new();
        source.expect_capture()
            .returning(|_| Ok(Snapshot::new("", "<html></html>").with_heading("Profil de Eva")));

        let mut store = MockArtifactStore::new();
        store.expect_save_markup().returning(|_, _| Err(anyhow::anyhow!("disk full")));

        let report = controller(Arc::new(store)).run(&source, tasks(&["https://h.example/u/8"])).await;

        assert_eq!(
            report.records[0].notes,
            "Missing fields: rating, joined_year, listing_count. See debug/page_1.html (debug dump not written)"
        );
    }
}
