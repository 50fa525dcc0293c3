//! Execution history of recent cycles, kept in memory for the API.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A record of one cycle execution.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunEntry {
    pub cycle_id: Option<Uuid>,
    pub status: RunStatus,
    pub summary: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Bounded log of the most recent runs, newest last.
#[derive(Debug, Clone)]
pub struct RunLog {
    entries: Arc<RwLock<VecDeque<RunEntry>>>,
    capacity: usize,
}

impl RunLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub async fn push(&self, entry: RunEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.write().await;
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub async fn recent(&self) -> Vec<RunEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn last(&self) -> Option<RunEntry> {
        self.entries.read().await.back().cloned()
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new(20)
    }
}
