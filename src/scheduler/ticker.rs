//! Cycle timing: a fixed interval or a cron expression.
//!
//! Either way the first tick fires immediately, so a freshly started
//! service publishes without waiting a full period.

use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule as CronSchedule;
use tokio::time::{Interval, MissedTickBehavior};

use crate::config::{ConfigError, ScheduleConfig};

/// When cycles should run.
#[derive(Debug, Clone)]
pub enum Trigger {
    Interval(Duration),
    Cron(Box<CronSchedule>),
}

impl Trigger {
    /// A cron expression wins over the interval.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self, ConfigError> {
        if let Some(schedule) = config.cron_schedule()? {
            return Ok(Self::Cron(Box::new(schedule)));
        }
        if config.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(Self::Interval(config.interval()))
    }

    /// Delay from `now` until the next scheduled run, `None` when the
    /// schedule has no future occurrence.
    pub fn delay_after(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Self::Interval(period) => Some(*period),
            Self::Cron(schedule) => schedule
                .after(&now)
                .next()
                .map(|next| (next - now).to_std().unwrap_or(Duration::ZERO)),
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval(period) => write!(f, "every {}s", period.as_secs()),
            Self::Cron(schedule) => write!(f, "cron '{}'", schedule),
        }
    }
}

enum Clock {
    Interval(Interval),
    Cron { fired: bool },
}

/// Awaitable source of cycle ticks.
pub struct Ticker {
    trigger: Trigger,
    clock: Clock,
}

impl Ticker {
    /// Must be called from within a tokio runtime.
    pub fn new(trigger: Trigger) -> Self {
        let clock = match &trigger {
            Trigger::Interval(period) => {
                let mut interval = tokio::time::interval(*period);
                // A slow cycle should not be followed by a burst of catch-up cycles.
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                Clock::Interval(interval)
            }
            Trigger::Cron(_) => Clock::Cron { fired: false },
        };
        Self { trigger, clock }
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Wait for the next tick. Returns `false` once the schedule has no
    /// further occurrences.
    pub async fn tick(&mut self) -> bool {
        match &mut self.clock {
            Clock::Interval(interval) => {
                interval.tick().await;
                true
            }
            Clock::Cron { fired } => {
                if !*fired {
                    *fired = true;
                    return true;
                }
                match self.trigger.delay_after(Utc::now()) {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        true
                    }
                    None => false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_trigger_from_config() {
        let cfg = ScheduleConfig::default();
        let trigger = Trigger::from_config(&cfg).unwrap();
        assert!(matches!(trigger, Trigger::Interval(d) if d == Duration::from_secs(60)));
        assert_eq!(trigger.to_string(), "every 60s");

        let cfg = ScheduleConfig {
            interval_secs: 0,
            cron: Some("0 */5 * * * *".to_string()),
        };
        assert!(matches!(Trigger::from_config(&cfg).unwrap(), Trigger::Cron(_)));

        let cfg = ScheduleConfig {
            interval_secs: 0,
            cron: None,
        };
        assert_eq!(Trigger::from_config(&cfg).unwrap_err(), ConfigError::ZeroInterval);
    }

    #[test]
    fn test_cron_delay() {
        let schedule = CronSchedule::from_str("0 */5 * * * *").unwrap();
        let trigger = Trigger::Cron(Box::new(schedule));
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 3, 30).unwrap();
        assert_eq!(trigger.delay_after(now), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_cron_without_future_runs() {
        let schedule = CronSchedule::from_str("0 0 0 1 1 * 2020").unwrap();
        let trigger = Trigger::Cron(Box::new(schedule));
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(trigger.delay_after(now), None);
    }

    #[tokio::test]
    async fn test_first_tick_is_immediate() {
        let mut ticker = Ticker::new(Trigger::Interval(Duration::from_secs(3600)));
        let first = tokio::time::timeout(Duration::from_secs(1), ticker.tick()).await;
        assert_eq!(first.ok(), Some(true));

        let second = tokio::time::timeout(Duration::from_millis(50), ticker.tick()).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_cron_first_tick_is_immediate() {
        let schedule = CronSchedule::from_str("0 0 0 1 1 *").unwrap();
        let mut ticker = Ticker::new(Trigger::Cron(Box::new(schedule)));
        let first = tokio::time::timeout(Duration::from_secs(1), ticker.tick()).await;
        assert_eq!(first.ok(), Some(true));
    }

    #[tokio::test]
    async fn test_cron_ticker_waits_for_next_occurrence() {
        let schedule = CronSchedule::from_str("* * * * * *").unwrap();
        let mut ticker = Ticker::new(Trigger::Cron(Box::new(schedule)));
        assert!(ticker.tick().await);

        let second = tokio::time::timeout(Duration::from_secs(3), ticker.tick()).await;
        assert_eq!(second.ok(), Some(true));
    }

    #[tokio::test]
    async fn test_cron_ticker_stops_without_future_runs() {
        let schedule = CronSchedule::from_str("0 0 0 1 1 * 2020").unwrap();
        let mut ticker = Ticker::new(Trigger::Cron(Box::new(schedule)));
        assert!(ticker.tick().await);
        assert!(!ticker.tick().await);
    }
}
