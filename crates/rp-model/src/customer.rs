//! Customers (ride requests).

use rp_core::{CustomerId, NodeId, SimTime};

/// A ride request.  Created on arrival, immutable thereafter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Customer {
    pub id: CustomerId,
    pub origin: NodeId,
    pub destination: NodeId,
    /// Earliest pickup instant; arriving earlier means waiting, not failure.
    pub earliest_pickup: SimTime,
    /// Hard dropoff deadline.
    pub latest_dropoff: SimTime,
    /// Seats occupied.  At least 1.
    pub load: u32,
}

impl Customer {
    pub fn new(
        id: CustomerId,
        origin: NodeId,
        destination: NodeId,
        earliest_pickup: SimTime,
        latest_dropoff: SimTime,
        load: u32,
    ) -> Self {
        debug_assert!(load >= 1, "customer load must be at least 1");
        debug_assert!(
            earliest_pickup <= latest_dropoff,
            "customer window must be non-empty"
        );
        Self { id, origin, destination, earliest_pickup, latest_dropoff, load }
    }

    /// The customer's total travel budget in seconds: the ride (detours
    /// included) may never keep them in the system longer than this.
    pub fn max_ride_secs(&self) -> i64 {
        self.latest_dropoff - self.earliest_pickup
    }
}

/// Lifecycle of a customer.  Exactly one state at any instant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CustomerStatus {
    /// Arrived, not yet assigned to a vehicle.
    Waiting,
    /// Committed to a vehicle, pickup still ahead.
    Assigned,
    /// On board.
    PickedUp,
    /// Delivered.
    DroppedOff,
    /// Gave up: no feasible vehicle within the retry bound.
    Refused,
}
