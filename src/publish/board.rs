//! Latest published report per channel, shared with the API.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::{PublishError, Publisher};
use crate::report::BuildHistoryReport;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedReport {
    pub channel: String,
    pub published_at: DateTime<Utc>,
    pub report: BuildHistoryReport,
}

#[derive(Debug, Clone, Default)]
pub struct ReportBoard {
    latest: Arc<RwLock<HashMap<String, PublishedReport>>>,
}

impl ReportBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, channel: &str) -> Option<PublishedReport> {
        self.latest.read().await.get(channel).cloned()
    }

    pub async fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.latest.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait::async_trait]
impl Publisher for ReportBoard {
    fn name(&self) -> &'static str {
        "board"
    }

    async fn publish(
        &self,
        channel: &str,
        report: &BuildHistoryReport,
    ) -> Result<(), PublishError> {
        let entry = PublishedReport {
            channel: channel.to_string(),
            published_at: Utc::now(),
            report: report.clone(),
        };
        self.latest.write().await.insert(channel.to_string(), entry);
        Ok(())
    }
}
