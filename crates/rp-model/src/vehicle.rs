//! Vehicles and their authoritative snapshots.

use rp_core::{NodeId, SimTime, VehicleId};

use crate::Schedule;

/// A snapshot of one vehicle as reported by the fleet-state stream.
///
/// The matcher never mutates these; it copies the latest snapshot in at the
/// top of each tick and reconciles its kinetic tree against it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    pub id: VehicleId,
    pub origin: NodeId,
    /// Final destination; `None` puts the vehicle in taxi mode (it roams
    /// until shut down, with `late == SimTime::MAX`).
    pub destination: Option<NodeId>,
    pub earliest: SimTime,
    pub latest: SimTime,
    /// Seat capacity; strictly positive.
    pub capacity: u32,
    /// Seats currently occupied by on-board customers.
    pub load: u32,
    /// The node the vehicle is at or heading to — the first stop of
    /// `schedule`.
    pub position: NodeId,
    /// Remaining authoritative schedule, starting at `position`.
    pub schedule: Schedule,
}

impl Vehicle {
    /// A vehicle with a fixed final destination and service window.
    pub fn new(
        id: VehicleId,
        origin: NodeId,
        destination: NodeId,
        earliest: SimTime,
        latest: SimTime,
        capacity: u32,
    ) -> Self {
        debug_assert!(capacity > 0, "vehicle capacity must be positive");
        let schedule = Schedule::initial(id, origin, Some(destination), earliest, latest);
        Self {
            id,
            origin,
            destination: Some(destination),
            earliest,
            latest,
            capacity,
            load: 0,
            position: origin,
            schedule,
        }
    }

    /// A taxi: no fixed destination, unbounded service window.
    pub fn taxi(id: VehicleId, origin: NodeId, earliest: SimTime, capacity: u32) -> Self {
        debug_assert!(capacity > 0, "vehicle capacity must be positive");
        let schedule = Schedule::initial(id, origin, None, earliest, SimTime::MAX);
        Self {
            id,
            origin,
            destination: None,
            earliest,
            latest: SimTime::MAX,
            capacity,
            load: 0,
            position: origin,
            schedule,
        }
    }

    pub fn is_taxi(&self) -> bool {
        self.destination.is_none()
    }

    /// Free seats under the *committed* workload: capacity minus customers
    /// assigned but not yet dropped off.  The kinetic tree tracks time, not
    /// load, so this is the matcher's cheap pre-filter.
    pub fn queued(&self) -> usize {
        self.schedule.queued()
    }
}
