//! Per-job status history: a bounded sliding window of status tokens.
//!
//! On disk every job is one comma-separated line, `name,status_1,...`, with
//! no header and no quoting. The oldest status sits right after the name.

pub mod store;

pub use self::store::HistoryStore;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::MissingStatus;
use crate::jenkins::StatusSnapshot;

pub const FIELD_SEPARATOR: char = ',';

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file {} does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed history row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: &'static str },
}

/// `[job_name, status_1, ..., status_k]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    fields: Vec<String>,
}

impl HistoryRow {
    /// A row with a name and no statuses yet.
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            fields: vec![job_name.into()],
        }
    }

    /// Parse one line of the history file. `line` is 1-based, for errors.
    pub fn parse(text: &str, line: usize) -> Result<Self, HistoryError> {
        let fields: Vec<String> = text.split(FIELD_SEPARATOR).map(str::to_string).collect();
        if fields[0].is_empty() {
            return Err(HistoryError::MalformedRow {
                line,
                reason: "row has no job name",
            });
        }
        Ok(Self { fields })
    }

    pub fn job_name(&self) -> &str {
        &self.fields[0]
    }

    /// Recorded statuses, oldest first.
    pub fn statuses(&self) -> &[String] {
        &self.fields[1..]
    }

    /// Number of fields including the name, i.e. the row length on disk.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn has_no_statuses(&self) -> bool {
        self.fields.len() == 1
    }

    /// Append `status`, first evicting the oldest statuses while the row
    /// holds more than `max_samples` fields. The row never ends up longer
    /// than `max_samples + 1`.
    pub fn push_status(&mut self, status: impl Into<String>, max_samples: usize) {
        while self.fields.len() > max_samples && self.fields.len() > 1 {
            self.fields.remove(1);
        }
        self.fields.push(status.into());
    }

    /// Serialize as one line, without the trailing newline.
    pub fn to_line(&self) -> String {
        self.fields.join(",")
    }
}

/// All history rows, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    rows: Vec<HistoryRow>,
}

impl History {
    /// First-run state: an empty row for every tracked job, in tracked order.
    pub fn seed(tracked: &[String]) -> Self {
        Self {
            rows: tracked.iter().map(HistoryRow::new).collect(),
        }
    }

    /// Parse the full file contents. Blank lines are rejected since every
    /// line must start with a job name; a trailing newline is fine.
    pub fn parse(text: &str) -> Result<Self, HistoryError> {
        let rows = text
            .lines()
            .enumerate()
            .map(|(idx, line)| HistoryRow::parse(line, idx + 1))
            .collect::<Result<_, _>>()?;
        Ok(Self { rows })
    }

    /// Render the file contents, one newline-terminated line per row.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(&row.to_line());
            out.push('\n');
        }
        out
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    pub fn row(&self, job_name: &str) -> Option<&HistoryRow> {
        self.rows.iter().find(|row| row.job_name() == job_name)
    }

    /// Append this cycle's status to every row.
    ///
    /// A job absent from `snapshot` gets nothing under
    /// [`MissingStatus::Skip`] and an empty field under
    /// [`MissingStatus::Placeholder`].
    pub fn record(&mut self, snapshot: &StatusSnapshot, missing: MissingStatus, max_samples: usize) {
        for row in &mut self.rows {
            match (snapshot.get(row.job_name()), missing) {
                (Some(status), _) => row.push_status(status, max_samples),
                (None, MissingStatus::Placeholder) => row.push_status("", max_samples),
                (None, MissingStatus::Skip) => {}
            }
        }
    }

    /// The next history given the previous one (or `None` on first run).
    ///
    /// Existing rows keep their file order; the tracked list only seeds a
    /// missing history.
    pub fn advance(
        previous: Option<History>,
        tracked: &[String],
        snapshot: &StatusSnapshot,
        missing: MissingStatus,
        max_samples: usize,
    ) -> History {
        let mut history = previous.unwrap_or_else(|| Self::seed(tracked));
        history.record(snapshot, missing, max_samples);
        history
    }
}
