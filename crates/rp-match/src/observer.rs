//! Matcher observer trait for progress reporting.

use rp_core::{CustomerId, SimTime, VehicleId};

use crate::{Statistics, TickSummary};

/// Callbacks invoked by [`Matcher::tick`](crate::Matcher::tick) at key
/// points of the batch loop.
///
/// All methods have default no-op implementations so implementors only
/// override what they care about.
///
/// # Example — match printer
///
/// ```rust,ignore
/// struct MatchPrinter;
///
/// impl MatchObserver for MatchPrinter {
///     fn on_match(&mut self, customer: CustomerId, vehicle: VehicleId, detour_secs: f64) {
///         println!("{customer} → {vehicle} (+{detour_secs:.0}s)");
///     }
/// }
/// ```
pub trait MatchObserver {
    /// Start of a tick, before the fleet refresh.
    fn on_tick_start(&mut self, _now: SimTime) {}

    /// A customer was committed to a vehicle at the given detour cost.
    fn on_match(&mut self, _customer: CustomerId, _vehicle: VehicleId, _detour_secs: f64) {}

    /// A customer exhausted the retry bound (or can no longer be picked up
    /// in time) and left the system unserved.
    fn on_refusal(&mut self, _customer: CustomerId) {}

    /// The assignment sink rejected a commit because the vehicle had moved
    /// past the assumed route prefix.
    fn on_out_of_sync(&mut self, _customer: CustomerId, _vehicle: VehicleId) {}

    /// End of a tick.
    fn on_tick_end(&mut self, _now: SimTime, _summary: &TickSummary) {}

    /// The matcher was shut down via [`Matcher::end`](crate::Matcher::end).
    fn on_end(&mut self, _stats: &Statistics) {}
}

/// A [`MatchObserver`] that does nothing.
pub struct NoopObserver;

impl MatchObserver for NoopObserver {}
