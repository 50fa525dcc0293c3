//! TOML configuration for the build history poller.
//!
//! Every section is optional and falls back to compiled-in defaults, so an
//! empty file (or no file at all) yields the stock setup: poll
//! `http://localhost:8080/` every minute and keep 100 samples per job.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV_VAR: &str = "BUILDHISTORY_CONFIG";

/// Config file picked up from the working directory when nothing else is set.
pub const DEFAULT_CONFIG_FILE: &str = "buildhistory.toml";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("number of tracked jobs is zero; at least one job must be monitored")]
    NoTrackedJobs,

    #[error("sample cap is zero; history must keep at least one sample")]
    ZeroSampleCap,

    #[error("tracked job '{name}' is listed more than once")]
    DuplicateJob { name: String },

    #[error("tracked job name {name:?} is invalid: {reason}")]
    InvalidJobName { name: String, reason: &'static str },

    #[error("invalid jenkins base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("schedule interval must be greater than zero")]
    ZeroInterval,

    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    #[error("display max_name_length must be greater than zero")]
    ZeroNameLength,

    #[error("publish target '{target}' requires '{field}'")]
    MissingPublishSetting {
        target: &'static str,
        field: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for the poller process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildHistoryConfig {
    /// Jenkins job names to follow, in display order.
    pub tracked_jobs: Vec<String>,
    pub jenkins: JenkinsConfig,
    pub history: HistoryConfig,
    pub display: DisplayConfig,
    pub schedule: ScheduleConfig,
    pub publish: PublishConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

impl Default for BuildHistoryConfig {
    fn default() -> Self {
        Self {
            tracked_jobs: [
                "Junit-demo",
                "HELLOGIT",
                "TEST",
                "extractParms",
                "Selenium-test",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            jenkins: JenkinsConfig::default(),
            history: HistoryConfig::default(),
            display: DisplayConfig::default(),
            schedule: ScheduleConfig::default(),
            publish: PublishConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BuildHistoryConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded buildhistory configuration");
        Ok(config)
    }

    /// Resolve the configuration, in order:
    /// 1. `explicit` (usually `--config`), which must load.
    /// 2. The path in `BUILDHISTORY_CONFIG`.
    /// 3. `./buildhistory.toml`.
    /// 4. Compiled-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "BUILDHISTORY_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load(local);
        }

        debug!("no config file found, using compiled-in defaults");
        Ok(Self::default())
    }

    /// Check the settings a cycle cannot run without.
    ///
    /// This is cheap and performs no I/O, so the cycle calls it before
    /// touching the network or the history file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracked_jobs.is_empty() {
            return Err(ConfigError::NoTrackedJobs);
        }
        if self.history.max_samples == 0 {
            return Err(ConfigError::ZeroSampleCap);
        }

        for (idx, name) in self.tracked_jobs.iter().enumerate() {
            validate_job_name(name)?;
            if self.tracked_jobs[..idx].contains(name) {
                return Err(ConfigError::DuplicateJob { name: name.clone() });
            }
        }

        self.jenkins.validate()?;

        if self.display.max_name_length == 0 {
            return Err(ConfigError::ZeroNameLength);
        }

        self.schedule.validate()?;
        self.publish.validate()?;
        Ok(())
    }

    /// Render the effective configuration back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }
}

/// Names end up as the first field of a comma-separated row.
fn validate_job_name(name: &str) -> Result<(), ConfigError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains(',') {
        "name contains a comma"
    } else if name.contains('\n') || name.contains('\r') {
        "name contains a line break"
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidJobName {
        name: name.to_string(),
        reason,
    })
}

// ---------------------------------------------------------------------------
// Jenkins
// ---------------------------------------------------------------------------

/// Remote build server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JenkinsConfig {
    /// Root URL of the Jenkins instance.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// User for HTTP basic auth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// API token (or password) paired with `username`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            timeout_secs: 30,
            username: None,
            api_token: None,
        }
    }
}

impl JenkinsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// What to record for a tracked job the server did not report this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStatus {
    /// Record nothing; the row simply does not grow this cycle.
    #[default]
    Skip,
    /// Record an empty field so every row advances in lockstep.
    Placeholder,
}

/// Persisted status history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// CSV file holding one row per tracked job.
    pub path: PathBuf,
    /// Maximum number of statuses kept per job.
    pub max_samples: usize,
    pub missing_status: MissingStatus,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("job_status_history.csv"),
            max_samples: 100,
            missing_status: MissingStatus::Skip,
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Widget display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Names longer than this are shortened with an ellipsis.
    pub max_name_length: usize,
    /// Characters kept from the end of a shortened name.
    pub name_tail_length: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_name_length: 30,
            name_tail_length: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// When cycles run. A cron expression, when present, wins over the interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
    /// Six or seven field cron expression (seconds first).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            cron: None,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Parse the cron expression, if any.
    pub fn cron_schedule(&self) -> Result<Option<cron::Schedule>, ConfigError> {
        self.cron
            .as_deref()
            .map(|expr| {
                cron::Schedule::from_str(expr).map_err(|e| ConfigError::InvalidCron {
                    expr: expr.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cron_schedule()?.is_none() && self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

/// Where each cycle's report is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishTarget {
    /// Emit the payload as a structured log event.
    #[default]
    Log,
    /// Rewrite a JSON file with the payload.
    File,
    /// POST the payload to a dashboard's widget endpoint.
    Dashboard,
}

/// Outbound publish settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Widget id / event name the report is published under.
    pub channel: String,
    pub target: PublishTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Request timeout for dashboard posts, in seconds.
    pub timeout_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            channel: "buildhistory".to_string(),
            target: PublishTarget::Log,
            file_path: None,
            dashboard_url: None,
            auth_token: None,
            timeout_secs: 10,
        }
    }
}

impl PublishConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.target {
            PublishTarget::Log => Ok(()),
            PublishTarget::File if self.file_path.is_none() => {
                Err(ConfigError::MissingPublishSetting {
                    target: "file",
                    field: "file_path",
                })
            }
            PublishTarget::Dashboard if self.dashboard_url.is_none() => {
                Err(ConfigError::MissingPublishSetting {
                    target: "dashboard",
                    field: "dashboard_url",
                })
            }
            PublishTarget::File | PublishTarget::Dashboard => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// API
// ---------------------------------------------------------------------------

/// Read-only HTTP API served alongside the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub listen_address: String,
    /// Number of recent cycle runs kept for `/runs`.
    pub run_log_capacity: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:3031".to_string(),
            run_log_capacity: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}
