//! Matcher configuration.

use std::time::Duration;

/// Tuning knobs for [`Matcher`](crate::Matcher).
///
/// All fields have workable defaults; construct with struct-update syntax:
///
/// ```rust,ignore
/// let config = MatcherConfig { grid_dim: 50, ..MatcherConfig::default() };
/// ```
#[derive(Clone, Debug)]
pub struct MatcherConfig {
    /// Simulated seconds between batch ticks.  The matcher itself does not
    /// sleep — the driver paces `tick()` — but deadline bookkeeping and
    /// demos read the period from here.
    pub batch_period_secs: i64,

    /// Spatial grid resolution: the extent is divided into
    /// `grid_dim × grid_dim` cells.
    pub grid_dim: usize,

    /// Failed match attempts a customer is allowed before being refused.
    pub retry_bound: u32,

    /// Simulated seconds a customer sits out after a failed attempt.
    pub retry_backoff_secs: i64,

    /// Wall-clock budget for enumerating candidates per customer.  When
    /// exceeded the best found so far is committed (or the customer stays
    /// unmatched this tick).
    pub probe_budget: Duration,

    /// Skip candidates whose committed schedule already has more stops than
    /// this.  `None` disables the heuristic.
    pub max_schedule_len: Option<usize>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            batch_period_secs: 30,
            grid_dim: 100,
            retry_bound: 5,
            retry_backoff_secs: 15,
            probe_budget: Duration::from_millis(250),
            max_schedule_len: None,
        }
    }
}

impl MatcherConfig {
    /// Reject configurations the matcher cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_period_secs <= 0 {
            return Err(format!("batch_period_secs must be positive, got {}", self.batch_period_secs));
        }
        if self.grid_dim == 0 {
            return Err("grid_dim must be at least 1".into());
        }
        if self.retry_bound == 0 {
            return Err("retry_bound must be at least 1".into());
        }
        if self.retry_backoff_secs < 0 {
            return Err(format!(
                "retry_backoff_secs must be non-negative, got {}",
                self.retry_backoff_secs
            ));
        }
        Ok(())
    }
}
