//! Outbound publishing of the widget report.
//!
//! A cycle hands its report to one configured [`Publisher`] and to the
//! in-process [`ReportBoard`] read by the API. Publishing is fire-and-forget
//! from the cycle's point of view: failures are logged by the caller.

pub mod board;
pub mod dashboard;
pub mod file;
pub mod log;

pub use self::board::{PublishedReport, ReportBoard};
pub use self::dashboard::DashboardPublisher;
pub use self::file::FilePublisher;
pub use self::log::LogPublisher;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::{PublishConfig, PublishTarget};
use crate::report::BuildHistoryReport;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("publish target '{target}' requires '{field}'")]
    Misconfigured {
        target: &'static str,
        field: &'static str,
    },
}

/// Destination for a cycle's report.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Deliver `report` under `channel`.
    async fn publish(&self, channel: &str, report: &BuildHistoryReport)
        -> Result<(), PublishError>;
}

/// Build the publisher selected by `config.target`.
pub fn from_config(config: &PublishConfig) -> Result<Box<dyn Publisher>, PublishError> {
    let publisher: Box<dyn Publisher> = match config.target {
        PublishTarget::Log => Box::new(LogPublisher),
        PublishTarget::File => {
            let path = config.file_path.clone().ok_or(PublishError::Misconfigured {
                target: "file",
                field: "file_path",
            })?;
            Box::new(FilePublisher::new(path))
        }
        PublishTarget::Dashboard => {
            let url = config
                .dashboard_url
                .as_deref()
                .ok_or(PublishError::Misconfigured {
                    target: "dashboard",
                    field: "dashboard_url",
                })?;
            Box::new(DashboardPublisher::new(
                url,
                config.auth_token.clone(),
                std::time::Duration::from_secs(config.timeout_secs),
            )?)
        }
    };
    Ok(publisher)
}
