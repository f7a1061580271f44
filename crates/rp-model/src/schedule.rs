//! Schedules and their invariant checks.
//!
//! A [`Schedule`] is the ordered stop list a vehicle has committed to:
//!
//! - the first stop is the vehicle's next node (its current position or the
//!   next intersection it is heading to);
//! - the last stop is the vehicle's final destination, or a sentinel
//!   `VehicleDest` for taxis;
//! - every assigned customer contributes a `Pickup` strictly before its
//!   `Dropoff`.
//!
//! The kinetic tree proposes stop orderings by *time* only; the checks here
//! are the authority on time windows (`check_time_windows`) and seat
//! capacity (`check_capacity`), and the matcher re-runs them on every
//! candidate schedule before committing.

use rp_core::{CustomerId, NodeId, SimTime, Speed, VehicleId};
use rp_spatial::DistanceOracle;

use crate::{ScheduleError, ScheduleResult, Stop, StopKind, StopOwner};

/// Ordered stop sequence.  See the module docs for the shape invariants.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    stops: Vec<Stop>,
}

impl Schedule {
    pub fn new(stops: Vec<Stop>) -> Self {
        Self { stops }
    }

    /// The two-stop schedule of a vehicle with no assigned customers:
    /// its origin followed by its destination (sentinel at the origin for
    /// taxis).
    pub fn initial(
        vehicle: VehicleId,
        origin: NodeId,
        destination: Option<NodeId>,
        earliest: SimTime,
        latest: SimTime,
    ) -> Self {
        let dest_loc = destination.unwrap_or(origin);
        Self {
            stops: vec![
                Stop::vehicle_origin(vehicle, origin, earliest),
                Stop::vehicle_dest(vehicle, dest_loc, latest),
            ],
        }
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn first(&self) -> Option<&Stop> {
        self.stops.first()
    }

    /// The stop after the current position — the vehicle's next real target.
    pub fn second(&self) -> Option<&Stop> {
        self.stops.get(1)
    }

    /// Customers assigned but not yet dropped off (each has exactly one
    /// remaining `Dropoff` stop).
    pub fn queued(&self) -> usize {
        self.stops
            .iter()
            .filter(|s| s.kind == StopKind::Dropoff && matches!(s.owner, StopOwner::Customer(_)))
            .count()
    }

    /// Distinct customers with any stop in this schedule, in first-stop
    /// order.  Schedules are short, so the quadratic dedup is fine.
    pub fn customers(&self) -> Vec<CustomerId> {
        let mut out: Vec<CustomerId> = Vec::new();
        for stop in &self.stops {
            if let StopOwner::Customer(c) = stop.owner {
                if !out.contains(&c) {
                    out.push(c);
                }
            }
        }
        out
    }

    // ── Invariant checks ──────────────────────────────────────────────────

    /// Every customer's pickup precedes its dropoff (a dropoff without a
    /// pickup is fine — the customer is already on board).
    pub fn check_pairing(&self) -> ScheduleResult<()> {
        for (i, stop) in self.stops.iter().enumerate() {
            if stop.kind != StopKind::Pickup {
                continue;
            }
            let Some(cust) = stop.owner.customer() else { continue };
            let has_later_dropoff = self.stops[i + 1..]
                .iter()
                .any(|s| s.kind == StopKind::Dropoff && s.owner == stop.owner);
            if !has_later_dropoff {
                return Err(ScheduleError::UnpairedStop(cust));
            }
        }
        Ok(())
    }

    /// Simulate travel along the stops from `start` and verify every late
    /// window.  Arriving before a stop's early window is a wait, not a
    /// failure — but the wait delays every stop after it.
    pub fn check_time_windows<O: DistanceOracle + ?Sized>(
        &self,
        start: SimTime,
        oracle: &O,
        speed: Speed,
    ) -> ScheduleResult<()> {
        let mut t = start.as_secs_f64();
        let mut prev: Option<NodeId> = None;
        for (index, stop) in self.stops.iter().enumerate() {
            if let Some(p) = prev {
                if p != stop.loc {
                    t += speed.travel_secs(oracle.distance_m(p, stop.loc)?);
                }
            }
            if stop.late != SimTime::MAX && t > stop.late.as_secs_f64() {
                return Err(ScheduleError::TimeWindow {
                    index,
                    loc: stop.loc,
                    arrival_secs: t,
                    latest_secs: stop.late.0,
                });
            }
            if t < stop.early.as_secs_f64() {
                t = stop.early.as_secs_f64();
            }
            prev = Some(stop.loc);
        }
        Ok(())
    }

    /// Walk the running load prefix and verify it never exceeds `capacity`.
    ///
    /// `initial_load` is the seats occupied by customers already on board
    /// (their dropoffs appear in the schedule without a pickup).  `load_of`
    /// resolves a customer's seat count; the engine passes its customer
    /// cache here.
    pub fn check_capacity(
        &self,
        initial_load: u32,
        capacity: u32,
        load_of: impl Fn(CustomerId) -> u32,
    ) -> ScheduleResult<()> {
        let mut load = initial_load;
        for (index, stop) in self.stops.iter().enumerate() {
            let Some(cust) = stop.owner.customer() else { continue };
            match stop.kind {
                StopKind::Pickup => {
                    load += load_of(cust);
                    if load > capacity {
                        return Err(ScheduleError::CapacityExceeded { index, load, capacity });
                    }
                }
                StopKind::Dropoff => load = load.saturating_sub(load_of(cust)),
                _ => {}
            }
        }
        Ok(())
    }
}
