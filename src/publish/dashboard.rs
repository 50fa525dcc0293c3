//! Dashing-style widget events: `POST <board>/widgets/<channel>` with the
//! payload fields plus `auth_token` in one JSON object.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use super::{PublishError, Publisher};
use crate::report::BuildHistoryReport;

pub struct DashboardPublisher {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

#[derive(Serialize)]
struct WidgetEvent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_token: Option<&'a str>,
    #[serde(flatten)]
    report: &'a BuildHistoryReport,
}

impl DashboardPublisher {
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PublishError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    pub fn widget_url(&self, channel: &str) -> String {
        format!("{}/widgets/{}", self.base_url, channel)
    }
}

#[async_trait::async_trait]
impl Publisher for DashboardPublisher {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    async fn publish(
        &self,
        channel: &str,
        report: &BuildHistoryReport,
    ) -> Result<(), PublishError> {
        let url = self.widget_url(channel);
        let event = WidgetEvent {
            auth_token: self.auth_token.as_deref(),
            report,
        };

        let response = self
            .client
            .post(&url)
            .json(&event)
            .send()
            .await
            .map_err(|source| PublishError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Status {
                url,
                status: status.as_u16(),
            });
        }
        tracing::debug!(%url, status = status.as_u16(), "widget event accepted");
        Ok(())
    }
}
