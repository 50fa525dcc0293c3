use std::io::Write;
use std::path::PathBuf;

use super::{PublishError, Publisher};
use crate::report::BuildHistoryReport;

/// Writes the payload to stdout as one line of JSON per cycle.
pub struct LogPublisher;

impl LogPublisher {
    /// Write `report` as a single JSON line to `out` and flush it.
    pub fn write_payload<W: Write>(
        &self,
        mut out: W,
        report: &BuildHistoryReport,
    ) -> Result<(), PublishError> {
        let payload = serde_json::to_string(report)?;
        writeln!(out, "{payload}")
            .and_then(|()| out.flush())
            .map_err(|source| PublishError::Io {
                action: "write",
                path: PathBuf::from("<stdout>"),
                source,
            })
    }
}

#[async_trait::async_trait]
impl Publisher for LogPublisher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(
        &self,
        channel: &str,
        report: &BuildHistoryReport,
    ) -> Result<(), PublishError> {
        tracing::info!(%channel, jobs = report.jenkins_jobs.len(), "Sending event to build history widget");
        self.write_payload(std::io::stdout().lock(), report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{BuildStatus, JobHistory};

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn report() -> BuildHistoryReport {
        BuildHistoryReport {
            jenkins_jobs: vec![JobHistory {
                job_name: "Junit-demo".to_string(),
                build_status: vec![
                    BuildStatus {
                        status: "blue".to_string(),
                    },
                    BuildStatus {
                        status: "red".to_string(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_payload_is_one_json_line() {
        let mut out = Vec::new();
        tokio_test::assert_ok!(LogPublisher.write_payload(&mut out, &report()));

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["jenkins_jobs"][0]["job_name"], "Junit-demo");
        assert_eq!(value["jenkins_jobs"][0]["build_status"][1]["status"], "red");
    }

    #[test]
    fn test_write_failure_is_reported() {
        let err = tokio_test::assert_err!(LogPublisher.write_payload(Closed, &report()));
        assert!(matches!(err, PublishError::Io { action: "write", .. }));
    }
}
