//! One poll cycle: validate, fetch, update history, rebuild the report.
//!
//! The cycle owns no timer and no global state. Everything it needs is
//! passed in, and everything it produced comes back in a [`CycleOutcome`].

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{BuildHistoryConfig, ConfigError};
use crate::history::{History, HistoryError, HistoryStore};
use crate::jenkins::{self, FetchError, StatusSnapshot, StatusSource};
use crate::report::BuildHistoryReport;
use crate::trim::NameTrimmer;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to fetch job statuses: {0}")]
    Fetch(#[from] FetchError),

    #[error("failed to update job status history: {0}")]
    History(#[from] HistoryError),
}

/// Everything a successful cycle produced.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub snapshot: StatusSnapshot,
    pub history: History,
    pub report: BuildHistoryReport,
}

/// Run a single cycle against `source` and `store`.
///
/// Configuration problems are reported before any network or file I/O.
/// A fetch failure leaves the history file untouched.
pub async fn run_cycle(
    config: &BuildHistoryConfig,
    source: &dyn StatusSource,
    store: &HistoryStore,
) -> Result<CycleOutcome, CycleError> {
    let cycle_id = Uuid::new_v4();
    let span = info_span!("cycle", %cycle_id);
    run_cycle_inner(cycle_id, config, source, store)
        .instrument(span)
        .await
}

async fn run_cycle_inner(
    cycle_id: Uuid,
    config: &BuildHistoryConfig,
    source: &dyn StatusSource,
    store: &HistoryStore,
) -> Result<CycleOutcome, CycleError> {
    let started_at = Utc::now();
    config.validate()?;

    let snapshot = jenkins::fetch_snapshot(source, &config.tracked_jobs).await?;
    for job in snapshot.missing(&config.tracked_jobs) {
        debug!(%job, "tracked job not reported by server this cycle");
    }

    info!(path = %store.path().display(), found = snapshot.len(), "Updating job status history");
    let history = store.update(
        &config.tracked_jobs,
        &snapshot,
        config.history.missing_status,
        config.history.max_samples,
    )?;

    info!("Loading job status history");
    let report = BuildHistoryReport::load(store, &NameTrimmer::from(&config.display))?;

    Ok(CycleOutcome {
        cycle_id,
        started_at,
        completed_at: Utc::now(),
        snapshot,
        history,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jenkins::RemoteJob;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays one canned job list per call.
    struct Replay {
        lists: Mutex<Vec<Result<Vec<RemoteJob>, u16>>>,
        calls: AtomicUsize,
    }

    impl Replay {
        fn new(mut lists: Vec<Result<Vec<RemoteJob>, u16>>) -> Self {
            lists.reverse();
            Self {
                lists: Mutex::new(lists),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl StatusSource for Replay {
        async fn fetch_jobs(&self) -> Result<Vec<RemoteJob>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.lists.lock().unwrap().pop().expect("no more job lists") {
                Ok(jobs) => Ok(jobs),
                Err(status) => Err(FetchError::Status {
                    url: "http://jenkins.test/api/json".to_string(),
                    status,
                }),
            }
        }
    }

    fn config(dir: &tempfile::TempDir, tracked: &[&str], cap: usize) -> BuildHistoryConfig {
        let mut cfg = BuildHistoryConfig {
            tracked_jobs: tracked.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        cfg.history.path = dir.path().join("job_status_history.csv");
        cfg.history.max_samples = cap;
        cfg
    }

    #[tokio::test]
    async fn test_cycle_sequence_matches_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, &["A", "B"], 3);
        let store = HistoryStore::new(&cfg.history.path);
        let source = Replay::new(vec![
            Ok(vec![RemoteJob::new("A", "blue"), RemoteJob::new("C", "red")]),
            Ok(vec![RemoteJob::new("A", "red"), RemoteJob::new("B", "red")]),
            Ok(vec![RemoteJob::new("A", "blue"), RemoteJob::new("B", "blue")]),
            Ok(vec![RemoteJob::new("A", "red"), RemoteJob::new("B", "red")]),
        ]);

        let expected = [
            "A,blue\nB\n",
            "A,blue,red\nB,red\n",
            "A,blue,red,blue\nB,red,blue\n",
            "A,red,blue,red\nB,red,blue,red\n",
        ];
        for want in expected {
            run_cycle(&cfg, &source, &store).await.unwrap();
            assert_eq!(std::fs::read_to_string(&cfg.history.path).unwrap(), want);
        }
    }

    #[tokio::test]
    async fn test_report_reflects_written_history() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, &["Junit-demo", "TEST"], 100);
        let store = HistoryStore::new(&cfg.history.path);
        let source = Replay::new(vec![
            Ok(vec![RemoteJob::new("TEST", "red"), RemoteJob::new("Junit-demo", "blue")]),
            Ok(vec![RemoteJob::new("TEST", "blue"), RemoteJob::new("Junit-demo", "blue_anime")]),
        ]);

        run_cycle(&cfg, &source, &store).await.unwrap();
        let outcome = run_cycle(&cfg, &source, &store).await.unwrap();

        let names: Vec<&str> = outcome
            .report
            .jenkins_jobs
            .iter()
            .map(|j| j.job_name.as_str())
            .collect();
        assert_eq!(names, vec!["Junit-demo", "TEST"]);
        let junit: Vec<&str> = outcome.report.jenkins_jobs[0]
            .build_status
            .iter()
            .map(|s| s.status.as_str())
            .collect();
        assert_eq!(junit, vec!["blue", "blue_anime"]);
        assert_eq!(outcome.snapshot.get("TEST"), Some("blue"));
        assert!(outcome.completed_at >= outcome.started_at);
    }

    #[tokio::test]
    async fn test_misconfiguration_fails_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, &[], 100);
        let store = HistoryStore::new(&cfg.history.path);
        let source = Replay::new(vec![Ok(vec![RemoteJob::new("A", "blue")])]);

        let err = run_cycle(&cfg, &source, &store).await.unwrap_err();
        assert!(matches!(err, CycleError::Config(ConfigError::NoTrackedJobs)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(&dir, &["A"], 100);
        let store = HistoryStore::new(&cfg.history.path);
        let source = Replay::new(vec![Ok(vec![RemoteJob::new("A", "blue")]), Err(503)]);

        run_cycle(&cfg, &source, &store).await.unwrap();
        let err = run_cycle(&cfg, &source, &store).await.unwrap_err();
        assert!(matches!(
            err,
            CycleError::Fetch(FetchError::Status { status: 503, .. })
        ));
        assert_eq!(std::fs::read_to_string(&cfg.history.path).unwrap(), "A,blue\n");
    }
}
