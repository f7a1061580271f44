//! The demo's authoritative fleet state.
//!
//! In a real deployment this lives on the other side of the assignment
//! interface (a dispatch database, vehicle telemetry).  Here it is a small
//! in-process table that accepts assignments, drives vehicles along their
//! committed schedules, flips customer statuses as stops complete, and
//! replays snapshots back into the matcher.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rp_core::{CustomerId, Speed, VehicleId};
use rp_match::{Assignment, AssignmentSink, InboxHandle};
use rp_model::{CustomerStatus, Schedule, StopKind, StopOwner, Vehicle};
use rp_spatial::DistanceOracle;

struct ActiveVehicle {
    snapshot: Vehicle,
    /// Metres left to the next stop; negative means "not yet routed".
    to_next_m: f64,
}

pub struct FleetState {
    vehicles: HashMap<VehicleId, ActiveVehicle>,
    pub statuses: HashMap<CustomerId, CustomerStatus>,
    speed: Speed,
}

impl FleetState {
    pub fn new(speed: Speed) -> Self {
        Self {
            vehicles: HashMap::new(),
            statuses: HashMap::new(),
            speed,
        }
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) {
        self.vehicles.insert(
            vehicle.id,
            ActiveVehicle { snapshot: vehicle, to_next_m: -1.0 },
        );
    }

    /// Drive every vehicle for `dt_secs` of simulated time, completing
    /// stops as they are reached.
    pub fn advance<O: DistanceOracle>(&mut self, dt_secs: i64, oracle: &O) {
        for active in self.vehicles.values_mut() {
            let mut budget_m = self.speed.reach_meters(dt_secs) as f64;
            loop {
                let Some(target) = active.snapshot.schedule.second().copied() else {
                    break; // parked at the final destination
                };
                if active.to_next_m < 0.0 {
                    let from = active.snapshot.position;
                    active.to_next_m = match oracle.distance_m(from, target.loc) {
                        Ok(m) => m as f64,
                        Err(_) => break,
                    };
                }
                if budget_m < active.to_next_m {
                    active.to_next_m -= budget_m;
                    break;
                }
                budget_m -= active.to_next_m;
                active.to_next_m = -1.0;

                // Stop reached: drop the old head so the schedule keeps
                // starting at the vehicle's position.
                let remaining: Vec<_> = active.snapshot.schedule.stops()[1..].to_vec();
                active.snapshot.schedule = Schedule::new(remaining);
                active.snapshot.position = target.loc;

                if let StopOwner::Customer(cust) = target.owner {
                    match target.kind {
                        StopKind::Pickup => {
                            active.snapshot.load += 1;
                            self.statuses.insert(cust, CustomerStatus::PickedUp);
                        }
                        StopKind::Dropoff => {
                            active.snapshot.load = active.snapshot.load.saturating_sub(1);
                            self.statuses.insert(cust, CustomerStatus::DroppedOff);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Replay the current snapshots into the matcher's vehicle FIFO.
    pub fn publish(&self, inbox: &InboxHandle) {
        for active in self.vehicles.values() {
            inbox.send_vehicle(active.snapshot.clone());
        }
    }

    pub fn outcome_rows(&self) -> Vec<(CustomerId, CustomerStatus)> {
        let mut rows: Vec<_> = self.statuses.iter().map(|(c, s)| (*c, *s)).collect();
        rows.sort_by_key(|(c, _)| *c);
        rows
    }
}

/// The matcher-facing half: a cloneable handle implementing
/// [`AssignmentSink`] against the shared state.
#[derive(Clone)]
pub struct FleetSink(pub Arc<Mutex<FleetState>>);

impl AssignmentSink for FleetSink {
    fn assign(&mut self, assignment: Assignment<'_>) -> bool {
        let mut guard = self.0.lock().expect("fleet state poisoned");
        let fleet = &mut *guard;
        let Some(active) = fleet.vehicles.get_mut(&assignment.vehicle.id) else {
            return false;
        };

        // Stale view: the matcher planned from a position the vehicle has
        // already left.
        let assumed = assignment.schedule.first().map(|s| s.loc);
        if assumed != Some(active.snapshot.position) {
            return false;
        }

        active.snapshot.schedule = assignment.schedule.clone();
        active.to_next_m = -1.0;
        for &cust in assignment.customers_added {
            fleet.statuses.insert(cust, CustomerStatus::Assigned);
        }
        true
    }
}
