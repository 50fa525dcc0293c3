use crate::publish::ReportBoard;
use crate::scheduler::{BuildHistoryJob, RunLog};

#[derive(Clone)]
pub struct AppState {
    pub board: ReportBoard,
    pub runs: RunLog,
    pub tracked_jobs: usize,
}

impl AppState {
    pub fn from_job(job: &BuildHistoryJob) -> Self {
        Self {
            board: job.board().clone(),
            runs: job.runs().clone(),
            tracked_jobs: job.config().tracked_jobs.len(),
        }
    }
}
