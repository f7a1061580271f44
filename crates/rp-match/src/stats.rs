//! Outcome counters.

use rp_core::SimTime;

/// Aggregate matching outcomes over the matcher's lifetime.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    pub matched: u64,
    pub refused: u64,
    pub out_of_sync_rejections: u64,
    latency_sum_secs: f64,
}

impl Statistics {
    pub(crate) fn record_match(&mut self, latency_secs: i64) {
        self.matched += 1;
        self.latency_sum_secs += latency_secs.max(0) as f64;
    }

    /// Mean seconds from a customer's arrival to its accepted match;
    /// zero when nothing matched.
    pub fn mean_match_latency_secs(&self) -> f64 {
        if self.matched == 0 {
            0.0
        } else {
            self.latency_sum_secs / self.matched as f64
        }
    }
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "matched {} / refused {} / out-of-sync {} / mean latency {:.1}s",
            self.matched,
            self.refused,
            self.out_of_sync_rejections,
            self.mean_match_latency_secs()
        )
    }
}

/// Per-tick outcome snapshot handed to observers.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickSummary {
    pub now: SimTime,
    /// Customers matched this tick.
    pub matched: usize,
    /// Customers refused this tick.
    pub refused: usize,
    /// Customers still waiting after this tick.
    pub waiting: usize,
}

impl TickSummary {
    pub(crate) fn new(now: SimTime) -> Self {
        Self { now, matched: 0, refused: 0, waiting: 0 }
    }
}
