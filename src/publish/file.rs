use std::path::{Path, PathBuf};

use super::{PublishError, Publisher};
use crate::history::store::write_atomic;
use crate::report::BuildHistoryReport;

/// Rewrites a JSON file with `{"channel": ..., "data": <report>}` on every
/// publish. Readers never see a half-written file.
pub struct FilePublisher {
    path: PathBuf,
}

impl FilePublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(serde::Serialize)]
struct Envelope<'a> {
    channel: &'a str,
    data: &'a BuildHistoryReport,
}

#[async_trait::async_trait]
impl Publisher for FilePublisher {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn publish(
        &self,
        channel: &str,
        report: &BuildHistoryReport,
    ) -> Result<(), PublishError> {
        let mut body = serde_json::to_vec_pretty(&Envelope {
            channel,
            data: report,
        })?;
        body.push(b'\n');
        write_atomic(&self.path, &body).map_err(|e| PublishError::Io {
            action: e.action,
            path: e.path,
            source: e.source,
        })?;
        tracing::debug!(path = %self.path.display(), %channel, "report written");
        Ok(())
    }
}
