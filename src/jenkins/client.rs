use super::{FetchError, JobList, RemoteJob, StatusSource};
use crate::config::JenkinsConfig;
use reqwest::Client;
use tracing::debug;

/// Path and tree filter of the job list request, relative to the base URL.
pub const JOB_LIST_PATH: &str = "api/json?tree=jobs[name,color]";

/// HTTP client for the Jenkins JSON API.
pub struct JenkinsClient {
    client: Client,
    job_list_url: String,
    credentials: Option<(String, Option<String>)>,
}

impl JenkinsClient {
    pub fn new(config: &JenkinsConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            job_list_url: job_list_url(&config.base_url)?,
            credentials: config
                .username
                .clone()
                .map(|user| (user, config.api_token.clone())),
        })
    }

    pub fn job_list_url(&self) -> &str {
        &self.job_list_url
    }
}

/// Join the base URL and [`JOB_LIST_PATH`], tolerating a missing trailing
/// slash and a context path such as `https://ci.example.com/jenkins`.
pub fn job_list_url(base_url: &str) -> Result<String, FetchError> {
    let mut base = reqwest::Url::parse(base_url).map_err(|e| FetchError::Url {
        base: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(JOB_LIST_PATH)
        .map(|url| url.to_string())
        .map_err(|e| FetchError::Url {
            base: base_url.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait::async_trait]
impl StatusSource for JenkinsClient {
    async fn fetch_jobs(&self) -> Result<Vec<RemoteJob>, FetchError> {
        let url = &self.job_list_url;
        let mut request = self.client.get(url);
        if let Some((user, token)) = &self.credentials {
            request = request.basic_auth(user, token.as_deref());
        }

        let response = request.send().await.map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;
        let list: JobList = serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.clone(),
            source,
        })?;

        debug!(%url, jobs = list.jobs.len(), "fetched job list");
        Ok(list.jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_list_url_joins_root() {
        assert_eq!(
            job_list_url("http://localhost:8080/").unwrap(),
            "http://localhost:8080/api/json?tree=jobs[name,color]"
        );
        assert_eq!(
            job_list_url("http://localhost:8080").unwrap(),
            "http://localhost:8080/api/json?tree=jobs[name,color]"
        );
    }

    #[test]
    fn test_job_list_url_keeps_context_path() {
        assert_eq!(
            job_list_url("https://ci.example.com/jenkins").unwrap(),
            "https://ci.example.com/jenkins/api/json?tree=jobs[name,color]"
        );
    }

    #[test]
    fn test_job_list_url_rejects_garbage() {
        assert!(matches!(
            job_list_url("::not-a-url"),
            Err(FetchError::Url { .. })
        ));
    }
}
