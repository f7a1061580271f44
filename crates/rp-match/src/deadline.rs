//! Deadline and search-radius derivation for one customer probe.
//!
//! This is the only place the customer's time window is turned into the
//! kinetic tree's three bounds and the grid's search radius, so the
//! conversions stay consistent:
//!
//! - `pickup_by` — latest boarding instant that can still make the dropoff
//!   deadline if the ride were direct (detours only make it later, so this
//!   is a valid upper bound);
//! - `dropoff_by` — the customer's hard deadline, verbatim;
//! - `max_ride_secs` — the window length, bounding ride time while the
//!   pickup is still ahead;
//! - `pickup_range_m` — how far a vehicle can be and still board in time.

use rp_core::{SimTime, Speed};
use rp_model::Customer;
use rp_spatial::{DistanceOracle, SpatialResult};
use rp_tree::InsertRequest;

/// The derived bounds for probing one customer at instant `now`.
#[derive(Clone, Debug)]
pub struct ProbeWindow {
    pub pickup_by: SimTime,
    pub dropoff_by: SimTime,
    pub max_ride_secs: i64,
    pub pickup_range_m: f64,
}

impl ProbeWindow {
    /// `true` when the pickup deadline has already passed — no vehicle
    /// anywhere can serve this customer any more.
    pub fn hopeless(&self, now: SimTime) -> bool {
        self.pickup_by < now
    }

    /// The kinetic-tree insertion request for `customer` under this window.
    pub fn insert_request(&self, customer: &Customer) -> InsertRequest {
        InsertRequest {
            customer: customer.id,
            origin: customer.origin,
            destination: customer.destination,
            pickup_by: self.pickup_by,
            dropoff_by: self.dropoff_by,
            max_ride_secs: self.max_ride_secs,
        }
    }
}

/// Derive the probe window for `customer` at `now`.
pub fn probe_window<O: DistanceOracle + ?Sized>(
    customer: &Customer,
    now: SimTime,
    oracle: &O,
    speed: Speed,
) -> SpatialResult<ProbeWindow> {
    let direct_secs = speed.travel_secs(oracle.distance_m(customer.origin, customer.destination)?);
    let pickup_by = SimTime(customer.latest_dropoff.0 - direct_secs.ceil() as i64);
    let pickup_range_m = speed.reach_meters(pickup_by - now) as f64;
    Ok(ProbeWindow {
        pickup_by,
        dropoff_by: customer.latest_dropoff,
        max_ride_secs: customer.max_ride_secs(),
        pickup_range_m,
    })
}
