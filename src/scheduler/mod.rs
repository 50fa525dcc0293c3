//! Scheduling of poll cycles.

pub mod engine;
pub mod history;
pub mod ticker;

// Re-export common types
pub use self::engine::{run_scheduler_loop, BuildHistoryJob};
pub use self::history::{RunEntry, RunLog, RunStatus};
pub use self::ticker::{Ticker, Trigger};
