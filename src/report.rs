//! Widget payload built from the history file.

use serde::{Deserialize, Serialize};

use crate::history::{History, HistoryError, HistoryStore};
use crate::trim::NameTrimmer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub status: String,
}

/// One widget line: a display name and its statuses, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHistory {
    pub job_name: String,
    pub build_status: Vec<BuildStatus>,
}

/// `{ "jenkins_jobs": [ { "job_name": ..., "build_status": [ {"status": ...} ] } ] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildHistoryReport {
    pub jenkins_jobs: Vec<JobHistory>,
}

impl BuildHistoryReport {
    /// One entry per history row, in row order, with the name shortened for
    /// display.
    pub fn from_history(history: &History, trimmer: &NameTrimmer) -> Self {
        let jenkins_jobs = history
            .rows()
            .iter()
            .map(|row| JobHistory {
                job_name: trimmer.trim(row.job_name()),
                build_status: row
                    .statuses()
                    .iter()
                    .map(|status| BuildStatus {
                        status: status.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self { jenkins_jobs }
    }

    /// Re-read the history file and build the report from what is on disk.
    pub fn load(store: &HistoryStore, trimmer: &NameTrimmer) -> Result<Self, HistoryError> {
        let history = store.read()?;
        Ok(Self::from_history(&history, trimmer))
    }

    pub fn job(&self, job_name: &str) -> Option<&JobHistory> {
        self.jenkins_jobs.iter().find(|job| job.job_name == job_name)
    }
}

impl JobHistory {
    pub fn latest(&self) -> Option<&str> {
        self.build_status.last().map(|s| s.status.as_str())
    }
}
