//! The assignment sink: where accepted matches are committed.

use rp_core::CustomerId;
use rp_model::{Route, Schedule, Vehicle};

/// Everything the fleet-state authority needs to apply one assignment.
///
/// `vehicle` is the matcher's snapshot — the sink compares it against live
/// state to detect staleness.
#[derive(Debug)]
pub struct Assignment<'a> {
    pub vehicle: &'a Vehicle,
    pub customers_added: &'a [CustomerId],
    pub customers_removed: &'a [CustomerId],
    pub schedule: &'a Schedule,
    pub route: &'a Route,
}

/// Commits assignments to the authoritative fleet state.
///
/// # Contract
///
/// Returns `false` when the assignment cannot be applied because the
/// vehicle's real state has advanced past the route prefix the matcher
/// assumed.  That is a *transient* miss, not an error: the matcher discards
/// its tentative work, counts an out-of-sync rejection, and re-queues the
/// customer.
pub trait AssignmentSink {
    fn assign(&mut self, assignment: Assignment<'_>) -> bool;
}

/// A sink that accepts everything — for tests and single-process demos
/// where the matcher's view *is* the authoritative state.
#[derive(Default)]
pub struct AcceptAllSink;

impl AssignmentSink for AcceptAllSink {
    fn assign(&mut self, _assignment: Assignment<'_>) -> bool {
        true
    }
}
