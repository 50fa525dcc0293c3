//! Jenkins job list polling.
//!
//! The cycle only needs the current color of a handful of jobs, so the
//! server is asked for the bare `name`/`color` tree of its top-level job
//! list and the tracked names are picked out of that.

pub mod client;

pub use self::client::JenkinsClient;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid job list url built from '{base}': {reason}")]
    Url { base: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed job list from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One entry of the server's job list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteJob {
    pub name: String,
    /// Folders and some job types carry no color.
    #[serde(default)]
    pub color: Option<String>,
}

impl RemoteJob {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: Some(color.into()),
        }
    }
}

/// Body of `GET /api/json?tree=jobs[name,color]`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobList {
    pub jobs: Vec<RemoteJob>,
}

/// Source of the remote job list. Implemented by [`JenkinsClient`]; tests
/// plug in canned lists.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the full job list once.
    async fn fetch_jobs(&self) -> Result<Vec<RemoteJob>, FetchError>;
}

/// Latest status of every tracked job the server reported this cycle.
///
/// Tracked jobs the server did not list, or listed without a color, are
/// simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    statuses: HashMap<String, String>,
}

impl StatusSnapshot {
    /// Pick the tracked jobs out of the full job list by exact name match.
    /// When the list repeats a name the last entry wins.
    pub fn from_jobs(jobs: &[RemoteJob], tracked: &[String]) -> Self {
        let tracked: HashSet<&str> = tracked.iter().map(String::as_str).collect();
        let statuses = jobs
            .iter()
            .filter(|job| tracked.contains(job.name.as_str()))
            .filter_map(|job| Some((job.name.clone(), job.color.clone()?)))
            .collect();
        Self { statuses }
    }

    pub fn get(&self, job_name: &str) -> Option<&str> {
        self.statuses.get(job_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Tracked names with no status this cycle, in tracked order.
    pub fn missing<'a>(&self, tracked: &'a [String]) -> Vec<&'a str> {
        tracked
            .iter()
            .map(String::as_str)
            .filter(|name| !self.statuses.contains_key(*name))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StatusSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            statuses: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Fetch the job list from `source` and reduce it to the tracked jobs.
pub async fn fetch_snapshot(
    source: &dyn StatusSource,
    tracked: &[String],
) -> Result<StatusSnapshot, FetchError> {
    let jobs = source.fetch_jobs().await?;
    Ok(StatusSnapshot::from_jobs(&jobs, tracked))
}
