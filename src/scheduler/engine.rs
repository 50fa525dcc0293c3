use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use super::history::{RunEntry, RunLog, RunStatus};
use super::ticker::Ticker;
use crate::config::BuildHistoryConfig;
use crate::cycle::{run_cycle, CycleError, CycleOutcome};
use crate::history::HistoryStore;
use crate::jenkins::{JenkinsClient, StatusSource};
use crate::publish::{self, Publisher, ReportBoard};

/// The scheduled job: its configuration plus the collaborators a cycle
/// reads from and publishes to.
#[derive(Clone)]
pub struct BuildHistoryJob {
    config: Arc<BuildHistoryConfig>,
    source: Arc<dyn StatusSource>,
    store: HistoryStore,
    publisher: Arc<dyn Publisher>,
    board: ReportBoard,
    runs: RunLog,
}

impl BuildHistoryJob {
    pub fn new(
        config: BuildHistoryConfig,
        source: Arc<dyn StatusSource>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let store = HistoryStore::new(&config.history.path);
        let runs = RunLog::new(config.api.run_log_capacity);
        Self {
            config: Arc::new(config),
            source,
            store,
            publisher,
            board: ReportBoard::new(),
            runs,
        }
    }

    /// Wire up the Jenkins client and the configured publisher.
    pub fn from_config(config: BuildHistoryConfig) -> Result<Self> {
        config.validate()?;
        let source = Arc::new(JenkinsClient::new(&config.jenkins)?);
        let publisher: Arc<dyn Publisher> = Arc::from(publish::from_config(&config.publish)?);
        Ok(Self::new(config, source, publisher))
    }

    pub fn config(&self) -> &BuildHistoryConfig {
        &self.config
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn board(&self) -> &ReportBoard {
        &self.board
    }

    pub fn runs(&self) -> &RunLog {
        &self.runs
    }

    /// Run one cycle, record it, and publish the report on success.
    pub async fn run_once(&self) -> Result<CycleOutcome, CycleError> {
        let started_at = Utc::now();
        let result = run_cycle(&self.config, self.source.as_ref(), &self.store).await;

        let entry = match &result {
            Ok(outcome) => RunEntry {
                cycle_id: Some(outcome.cycle_id),
                status: RunStatus::Success,
                summary: format!(
                    "{} of {} tracked jobs reported",
                    outcome.snapshot.len(),
                    self.config.tracked_jobs.len()
                ),
                started_at,
                finished_at: outcome.completed_at,
            },
            Err(e) => RunEntry {
                cycle_id: None,
                status: RunStatus::Failed,
                summary: e.to_string(),
                started_at,
                finished_at: Utc::now(),
            },
        };
        self.runs.push(entry).await;

        if let Ok(outcome) = &result {
            self.publish(outcome).await;
        }
        result
    }

    /// Fire-and-forget: failures are logged, never returned.
    async fn publish(&self, outcome: &CycleOutcome) {
        let channel = &self.config.publish.channel;
        // The board is in-process and cannot fail.
        let _ = self.board.publish(channel, &outcome.report).await;

        if let Err(e) = self.publisher.publish(channel, &outcome.report).await {
            warn!(
                cycle_id = %outcome.cycle_id,
                publisher = self.publisher.name(),
                %channel,
                "Failed to publish report: {}",
                e
            );
        }
    }
}

/// Main scheduler loop: one cycle per tick until `shutdown` resolves or the
/// schedule runs out. Cycles run back to back on this task, so they never
/// overlap. Returns the number of cycles attempted.
pub async fn run_scheduler_loop<F>(job: BuildHistoryJob, mut ticker: Ticker, shutdown: F) -> usize
where
    F: Future<Output = ()>,
{
    info!(trigger = %ticker.trigger(), jobs = job.config.tracked_jobs.len(), "Scheduler engine started");
    tokio::pin!(shutdown);

    let mut cycles = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Scheduler engine stopping");
                break;
            }
            more = ticker.tick() => {
                if !more {
                    warn!("Schedule has no further runs; scheduler engine stopping");
                    break;
                }
                cycles += 1;
                match job.run_once().await {
                    Ok(outcome) => info!(
                        cycle_id = %outcome.cycle_id,
                        reported = outcome.snapshot.len(),
                        "Cycle finished"
                    ),
                    Err(e) => error!("Cycle failed: {}", e),
                }
            }
        }
    }
    cycles
}
