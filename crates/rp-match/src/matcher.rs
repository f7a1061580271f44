//! The batch matcher.
//!
//! One logical worker drives [`Matcher::tick`] on a period; producers feed
//! customers and vehicle snapshots through the [`InboxHandle`] from
//! anywhere.  Each tick:
//!
//! 1. Drain vehicle snapshots and reconcile the per-vehicle kinetic trees
//!    (create on first observation, recreate on a changed destination,
//!    advance every tree by the wall-clock delta, synchronise against the
//!    authoritative schedule).
//! 2. Rebuild the spatial grid from the refreshed positions.
//! 3. Drain customers and process the batch in arrival order: candidates
//!    from the grid, a tentative kinetic-tree insertion per candidate, the
//!    cheapest feasible detour wins, and the winner is committed through
//!    the assignment sink.
//!
//! The matcher is greedy per customer: each one sees the fleet state left
//! behind by all prior commits of the same tick, and nothing backtracks.

use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;

use rp_core::{Clock, CustomerId, SimTime, Speed, VehicleId};
use rp_model::{route_through, Customer, Route, Schedule, Stop, StopOwner, Vehicle};
use rp_spatial::{DistanceOracle, RoadNetwork, VehicleGrid};
use rp_tree::{KineticTree, PathStop, TreeError};

use crate::deadline::probe_window;
use crate::sync::synchronize;
use crate::{
    Assignment, AssignmentSink, InboxHandle, MatchError, MatchObserver, MatchResult,
    MatcherConfig, Statistics, TickSummary,
};

// ── Internal records ──────────────────────────────────────────────────────────

/// The matcher's view of one vehicle: latest snapshot plus its tree.
struct FleetEntry {
    vehicle: Vehicle,
    kt: KineticTree,
    last_seen: SimTime,
}

/// A customer awaiting assignment.
struct PendingCustomer {
    customer: Customer,
    arrived_at: SimTime,
    attempts: u32,
    next_try: SimTime,
}

/// Winner of the candidate loop, holding the derived artefacts so commit
/// needs no recomputation.  The winning vehicle's tree still carries the
/// matching shadow.
struct BestCandidate {
    vehicle: VehicleId,
    detour_secs: f64,
    schedule: Schedule,
    route: Route,
}

enum ProbeOutcome {
    Matched { vehicle: VehicleId, detour_secs: f64 },
    Unmatched,
}

// ── Matcher ───────────────────────────────────────────────────────────────────

/// The online matching engine.  See the module docs for the tick anatomy.
pub struct Matcher<O, S, C>
where
    O: DistanceOracle,
    S: AssignmentSink,
    C: Clock,
{
    config: MatcherConfig,
    speed: Speed,
    network: Arc<RoadNetwork>,
    oracle: O,
    sink: S,
    clock: C,
    grid: VehicleGrid,
    inbox: InboxHandle,
    fleet: FxHashMap<VehicleId, FleetEntry>,
    waiting: Vec<PendingCustomer>,
    /// Seat counts of every customer ever seen, for capacity re-checks on
    /// schedules that still carry earlier customers.
    customer_loads: FxHashMap<CustomerId, u32>,
    stats: Statistics,
}

impl<O, S, C> Matcher<O, S, C>
where
    O: DistanceOracle,
    S: AssignmentSink,
    C: Clock,
{
    pub fn new(
        config: MatcherConfig,
        network: Arc<RoadNetwork>,
        oracle: O,
        sink: S,
        clock: C,
        speed: Speed,
    ) -> MatchResult<Self> {
        config.validate().map_err(MatchError::Config)?;
        let grid = VehicleGrid::over_network(config.grid_dim, &network);
        Ok(Self {
            config,
            speed,
            network,
            oracle,
            sink,
            clock,
            grid,
            inbox: InboxHandle::new(),
            fleet: FxHashMap::default(),
            waiting: Vec::new(),
            customer_loads: FxHashMap::default(),
            stats: Statistics::default(),
        })
    }

    // ── Producer surface ──────────────────────────────────────────────────

    /// A cloneable handle for feeding this matcher from other threads.
    pub fn handle(&self) -> InboxHandle {
        self.inbox.clone()
    }

    pub fn on_customer(&self, customer: Customer) {
        self.inbox.send_customer(customer);
    }

    pub fn on_vehicle(&self, vehicle: Vehicle) {
        self.inbox.send_vehicle(vehicle);
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Customers neither matched nor refused yet.
    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    pub fn fleet_size(&self) -> usize {
        self.fleet.len()
    }

    /// The matcher's latest snapshot of `vehicle`, if it has been observed.
    pub fn vehicle(&self, vehicle: VehicleId) -> Option<&Vehicle> {
        self.fleet.get(&vehicle).map(|e| &e.vehicle)
    }

    /// Read-only view of a vehicle's kinetic tree (diagnostics and tests).
    pub fn tree(&self, vehicle: VehicleId) -> Option<&KineticTree> {
        self.fleet.get(&vehicle).map(|e| &e.kt)
    }

    // ── The batch tick ────────────────────────────────────────────────────

    pub fn tick<Ob: MatchObserver>(&mut self, observer: &mut Ob) -> MatchResult<TickSummary> {
        let now = self.clock.now();
        observer.on_tick_start(now);
        let mut summary = TickSummary::new(now);
        if self.inbox.is_shutdown() {
            summary.waiting = self.waiting.len();
            return Ok(summary);
        }

        self.refresh_fleet(now)?;
        self.rebuild_grid();
        self.admit_arrivals(now);

        let batch = std::mem::take(&mut self.waiting);
        let mut still_waiting = Vec::with_capacity(batch.len());

        for mut pending in batch {
            if self.inbox.is_shutdown() || pending.next_try > now {
                still_waiting.push(pending);
                continue;
            }

            match self.try_match(&pending.customer, now, observer)? {
                ProbeOutcome::Matched { vehicle, detour_secs } => {
                    self.stats.record_match(now - pending.arrived_at);
                    summary.matched += 1;
                    observer.on_match(pending.customer.id, vehicle, detour_secs);
                }
                ProbeOutcome::Unmatched => {
                    pending.attempts += 1;
                    if pending.attempts >= self.config.retry_bound {
                        self.stats.refused += 1;
                        summary.refused += 1;
                        observer.on_refusal(pending.customer.id);
                    } else {
                        pending.next_try = now + self.config.retry_backoff_secs;
                        still_waiting.push(pending);
                    }
                }
            }
        }

        self.waiting = still_waiting;
        summary.waiting = self.waiting.len();
        observer.on_tick_end(now, &summary);
        Ok(summary)
    }

    /// Shut down: discard outstanding shadows and report the final tallies.
    /// Customers still waiting are left countable via
    /// [`waiting_count`](Self::waiting_count).
    pub fn end<Ob: MatchObserver>(&mut self, observer: &mut Ob) -> Statistics {
        self.inbox.request_shutdown();
        for entry in self.fleet.values_mut() {
            entry.kt.discard_tentative();
        }
        observer.on_end(&self.stats);
        self.stats.clone()
    }

    // ── Tick phase 1: fleet refresh ───────────────────────────────────────

    fn refresh_fleet(&mut self, now: SimTime) -> MatchResult<()> {
        for vehicle in self.inbox.drain_vehicles() {
            match self.fleet.get_mut(&vehicle.id) {
                None => {
                    let kt = KineticTree::new(
                        vehicle.id,
                        vehicle.position,
                        vehicle.destination,
                        now,
                    );
                    self.fleet.insert(
                        vehicle.id,
                        FleetEntry { vehicle, kt, last_seen: now },
                    );
                }
                Some(entry) => {
                    // A changed final destination (taxi repurposed) makes
                    // the whole tree moot — start over from the new state.
                    if vehicle.destination != entry.kt.destination() {
                        entry.kt = KineticTree::new(
                            vehicle.id,
                            vehicle.position,
                            vehicle.destination,
                            now,
                        );
                        entry.last_seen = now;
                    }
                    entry.vehicle = vehicle;
                }
            }
        }

        // Advance every tree to `now`, then re-align with the authoritative
        // schedule.  Advance must come first: tentative insertions later in
        // this tick rely on fresh arrival estimates.
        for entry in self.fleet.values_mut() {
            let elapsed = now - entry.last_seen;
            if elapsed > 0 {
                entry.kt.advance(elapsed as f64);
            }
            entry.last_seen = now;
            synchronize(&mut entry.kt, &entry.vehicle.schedule, &self.oracle, self.speed)?;
        }
        Ok(())
    }

    // ── Tick phase 2: spatial index ───────────────────────────────────────

    fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (id, entry) in &self.fleet {
            if let Some(pos) = self.network.position(entry.vehicle.position) {
                self.grid.insert(*id, pos);
            }
        }
    }

    // ── Tick phase 3: batch admission ─────────────────────────────────────

    fn admit_arrivals(&mut self, now: SimTime) {
        for customer in self.inbox.drain_customers() {
            self.customer_loads.insert(customer.id, customer.load);
            self.waiting.push(PendingCustomer {
                customer,
                arrived_at: now,
                attempts: 0,
                next_try: now,
            });
        }
    }

    // ── Per-customer matching ─────────────────────────────────────────────

    fn try_match<Ob: MatchObserver>(
        &mut self,
        customer: &Customer,
        now: SimTime,
        observer: &mut Ob,
    ) -> MatchResult<ProbeOutcome> {
        let window = match probe_window(customer, now, &self.oracle, self.speed) {
            Ok(w) => w,
            // No route from origin to destination: a failed attempt, and
            // the retry bound will eventually turn it into a refusal.
            Err(_) => return Ok(ProbeOutcome::Unmatched),
        };
        if window.hopeless(now) {
            // The pickup deadline has passed; probing would be wasted work.
            return Ok(ProbeOutcome::Unmatched);
        }
        let Some(origin_pos) = self.network.position(customer.origin) else {
            return Ok(ProbeOutcome::Unmatched);
        };

        let request = window.insert_request(customer);
        let candidates = self.grid.within(window.pickup_range_m, origin_pos);
        let started = Instant::now();
        let mut best: Option<BestCandidate> = None;

        for candidate in candidates {
            if self.inbox.is_shutdown() || started.elapsed() > self.config.probe_budget {
                break;
            }

            let probe = {
                let loads = &self.customer_loads;
                let oracle = &self.oracle;
                let speed = self.speed;
                let Some(entry) = self.fleet.get_mut(&candidate) else {
                    continue;
                };

                // Seats pre-filter: the tree tracks time, not load.
                if entry.vehicle.queued() >= entry.vehicle.capacity as usize {
                    continue;
                }
                if let Some(cap) = self.config.max_schedule_len {
                    if entry.vehicle.schedule.len() > cap {
                        continue;
                    }
                }

                // Committed completion time first — detour is the delta.
                let committed = match entry.kt.best_cost(oracle, speed) {
                    Ok(c) => c,
                    Err(_) => continue, // oracle failure: skip this candidate
                };
                let cost = match entry.kt.tentative_insert(&request, oracle, speed) {
                    Ok(Some(c)) => c,
                    Ok(None) => continue,
                    Err(TreeError::Spatial(_)) => continue,
                    Err(e) => return Err(e.into()),
                };
                let detour_secs = cost - committed;

                if best
                    .as_ref()
                    .is_some_and(|b| detour_secs >= b.detour_secs)
                {
                    entry.kt.discard_tentative();
                    continue;
                }

                // Cheapest so far: derive the schedule from the shadow's
                // best path and run the authoritative checks.
                let path = entry.kt.tentative_stop_sequence()?;
                let schedule = materialise_schedule(&entry.vehicle, &path, customer);
                let initial_load = entry.vehicle.load;
                let valid = schedule
                    .check_time_windows(now, oracle, speed)
                    .and_then(|_| {
                        schedule.check_capacity(initial_load, entry.vehicle.capacity, |c| {
                            loads.get(&c).copied().unwrap_or(1)
                        })
                    })
                    .and_then(|_| schedule.check_pairing());

                match valid {
                    Err(_) => {
                        entry.kt.discard_tentative();
                        continue;
                    }
                    Ok(()) => match route_through(&schedule, oracle) {
                        Err(_) => {
                            entry.kt.discard_tentative();
                            continue;
                        }
                        Ok(route) => Some(BestCandidate {
                            vehicle: candidate,
                            detour_secs,
                            schedule,
                            route,
                        }),
                    },
                }
            };

            if let Some(new_best) = probe {
                if let Some(previous) = best.replace(new_best) {
                    if let Some(entry) = self.fleet.get_mut(&previous.vehicle) {
                        entry.kt.discard_tentative();
                    }
                }
            }
        }

        // On shutdown the outstanding shadow is drained, never committed.
        if self.inbox.is_shutdown() {
            if let Some(aborted) = best {
                if let Some(entry) = self.fleet.get_mut(&aborted.vehicle) {
                    entry.kt.discard_tentative();
                }
            }
            return Ok(ProbeOutcome::Unmatched);
        }

        let Some(winner) = best else {
            return Ok(ProbeOutcome::Unmatched);
        };
        self.commit(winner, customer, now, observer)
    }

    /// Push the winning assignment through the sink and settle the shadow.
    fn commit<Ob: MatchObserver>(
        &mut self,
        winner: BestCandidate,
        customer: &Customer,
        now: SimTime,
        observer: &mut Ob,
    ) -> MatchResult<ProbeOutcome> {
        let accepted = {
            let entry = self
                .fleet
                .get_mut(&winner.vehicle)
                .ok_or(MatchError::UnknownVehicle(winner.vehicle))?;
            let assignment = Assignment {
                vehicle: &entry.vehicle,
                customers_added: &[customer.id],
                customers_removed: &[],
                schedule: &winner.schedule,
                route: &winner.route,
            };
            self.sink.assign(assignment)
        };

        let entry = self
            .fleet
            .get_mut(&winner.vehicle)
            .ok_or(MatchError::UnknownVehicle(winner.vehicle))?;

        if !accepted {
            // Stale view: the vehicle advanced past our assumed prefix.
            // The tree is untouched; the customer goes to back-off.
            entry.kt.discard_tentative();
            self.stats.out_of_sync_rejections += 1;
            observer.on_out_of_sync(customer.id, winner.vehicle);
            return Ok(ProbeOutcome::Unmatched);
        }

        entry.kt.commit_tentative()?;
        entry.vehicle.schedule = winner.schedule;
        synchronize(&mut entry.kt, &entry.vehicle.schedule, &self.oracle, self.speed)?;

        // A committed schedule failing its own re-check means the matcher
        // and the fleet state have diverged — fatal for this tick.
        let loads = &self.customer_loads;
        let initial_load = entry.vehicle.load;
        entry
            .vehicle
            .schedule
            .check_time_windows(now, &self.oracle, self.speed)
            .and_then(|_| {
                entry.vehicle.schedule.check_capacity(
                    initial_load,
                    entry.vehicle.capacity,
                    |c| loads.get(&c).copied().unwrap_or(1),
                )
            })
            .and_then(|_| entry.vehicle.schedule.check_pairing())
            .map_err(|source| MatchError::InvariantViolation {
                vehicle: winner.vehicle,
                source,
            })?;

        Ok(ProbeOutcome::Matched {
            vehicle: winner.vehicle,
            detour_secs: winner.detour_secs,
        })
    }
}

// ── Schedule materialisation ──────────────────────────────────────────────────

/// Convert the shadow's best path into a full schedule: the vehicle's
/// current first stop, then each tree stop (re-using the cached stop record
/// when one matches, else building the new customer's), then the trailing
/// vehicle destination.
fn materialise_schedule(vehicle: &Vehicle, path: &[PathStop], customer: &Customer) -> Schedule {
    let cached = vehicle.schedule.stops();
    let mut stops = Vec::with_capacity(path.len() + 1);

    match cached.first() {
        Some(first) => stops.push(*first),
        None => stops.push(Stop::vehicle_origin(vehicle.id, vehicle.position, vehicle.earliest)),
    }

    let reusable = cached.get(1..).unwrap_or(&[]);
    for tree_stop in path.iter().skip(1) {
        let reused = reusable.iter().find(|s| {
            s.loc == tree_stop.loc
                && s.owner == tree_stop.owner
                && s.is_pickup_side() == tree_stop.is_pickup
        });
        match reused {
            Some(stop) => stops.push(*stop),
            None if tree_stop.owner == StopOwner::Customer(customer.id) => {
                let stop = if tree_stop.is_pickup {
                    Stop::pickup(
                        customer.id,
                        customer.origin,
                        customer.earliest_pickup,
                        customer.latest_dropoff,
                    )
                } else {
                    Stop::dropoff(
                        customer.id,
                        customer.destination,
                        customer.earliest_pickup,
                        customer.latest_dropoff,
                    )
                };
                stops.push(stop);
            }
            None => {}
        }
    }

    match vehicle.destination {
        Some(dest) => stops.push(Stop::vehicle_dest(vehicle.id, dest, vehicle.latest)),
        None => {
            // Taxi: sentinel destination at the last real stop, so the
            // schedule shape stays uniform for downstream consumers.
            let last_loc = stops.last().map_or(vehicle.position, |s| s.loc);
            stops.push(Stop::vehicle_dest(vehicle.id, last_loc, SimTime::MAX));
        }
    }

    Schedule::new(stops)
}
