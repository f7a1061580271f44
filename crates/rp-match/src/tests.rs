//! Matcher tests: unit coverage for the pieces plus the end-to-end
//! matching scenarios on hand-built line networks.
//!
//! Node positions are spaced 0.001° of longitude apart (≈ 111 m of
//! great-circle distance) so grid radius queries behave, while edge lengths
//! are chosen per scenario.  Fleet speed is 1 m/s throughout: metres and
//! seconds coincide, which keeps expected costs legible.

#[cfg(test)]
mod helpers {
    use std::sync::{Arc, Mutex, MutexGuard};

    use rp_core::{CustomerId, GeoPoint, NodeId, SimTime, Speed, VehicleId, VirtualClock};
    use rp_model::{Customer, Route, Schedule, Vehicle};
    use rp_spatial::{DijkstraOracle, RoadNetwork, RoadNetworkBuilder};

    use crate::{Assignment, AssignmentSink, Matcher, MatcherConfig};

    /// One accepted-or-rejected `assign` call as seen by the sink.
    pub struct RecordedAssignment {
        pub vehicle: VehicleId,
        pub added: Vec<CustomerId>,
        pub schedule: Schedule,
        pub route: Route,
    }

    pub struct SinkState {
        /// Whether the next `assign` calls report acceptance.
        pub accept: bool,
        pub assignments: Vec<RecordedAssignment>,
    }

    /// Test sink: records every assignment and answers with a switchable
    /// accept flag, shared with the test body.
    #[derive(Clone)]
    pub struct SharedSink(Arc<Mutex<SinkState>>);

    impl SharedSink {
        pub fn new() -> Self {
            Self(Arc::new(Mutex::new(SinkState { accept: true, assignments: Vec::new() })))
        }

        pub fn state(&self) -> MutexGuard<'_, SinkState> {
            self.0.lock().unwrap()
        }
    }

    impl AssignmentSink for SharedSink {
        fn assign(&mut self, assignment: Assignment<'_>) -> bool {
            let mut state = self.0.lock().unwrap();
            state.assignments.push(RecordedAssignment {
                vehicle: assignment.vehicle.id,
                added: assignment.customers_added.to_vec(),
                schedule: assignment.schedule.clone(),
                route: assignment.route.clone(),
            });
            state.accept
        }
    }

    /// A straight line of `hops.len() + 1` nodes with the given edge
    /// lengths in metres.
    pub fn line_network(hops: &[u32]) -> (Arc<RoadNetwork>, Vec<NodeId>) {
        let mut b = RoadNetworkBuilder::new();
        let nodes: Vec<NodeId> = (0..=hops.len())
            .map(|i| b.add_node(GeoPoint::new(i as f64 * 0.001, 0.0)))
            .collect();
        for (i, &length_m) in hops.iter().enumerate() {
            b.add_road(nodes[i], nodes[i + 1], length_m);
        }
        (Arc::new(b.build()), nodes)
    }

    pub type TestMatcher = Matcher<DijkstraOracle, SharedSink, Arc<VirtualClock>>;

    pub fn matcher(
        network: Arc<RoadNetwork>,
        config: MatcherConfig,
    ) -> (TestMatcher, SharedSink, Arc<VirtualClock>) {
        let clock = Arc::new(VirtualClock::new(SimTime(0)));
        let sink = SharedSink::new();
        let oracle = DijkstraOracle::new(network.clone());
        let m = Matcher::new(config, network, oracle, sink.clone(), clock.clone(), Speed::new(1.0))
            .expect("valid test config");
        (m, sink, clock)
    }

    pub fn cust(id: u32, origin: NodeId, dest: NodeId, early: i64, late: i64) -> Customer {
        Customer::new(CustomerId(id), origin, dest, SimTime(early), SimTime(late), 1)
    }

    pub fn small_config() -> MatcherConfig {
        MatcherConfig { grid_dim: 4, ..MatcherConfig::default() }
    }

    pub fn vehicle(id: u32, origin: NodeId, dest: NodeId, late: i64, capacity: u32) -> Vehicle {
        Vehicle::new(VehicleId(id), origin, dest, SimTime(0), SimTime(late), capacity)
    }
}

// ── Construction & plumbing ───────────────────────────────────────────────────

#[cfg(test)]
mod plumbing {
    use rp_core::VehicleId;

    use crate::{MatchError, MatcherConfig, NoopObserver};

    use super::helpers::{cust, line_network, matcher, small_config, vehicle};

    #[test]
    fn invalid_config_is_rejected() {
        let (net, _) = line_network(&[100]);
        let bad = MatcherConfig { grid_dim: 0, ..MatcherConfig::default() };
        let clock = std::sync::Arc::new(rp_core::VirtualClock::new(rp_core::SimTime(0)));
        let oracle = rp_spatial::DijkstraOracle::new(net.clone());
        let result = crate::Matcher::new(
            bad,
            net,
            oracle,
            crate::AcceptAllSink,
            clock,
            rp_core::Speed::new(1.0),
        );
        assert!(matches!(result, Err(MatchError::Config(_))));
    }

    #[test]
    fn shutdown_short_circuits_the_tick() {
        let (net, n) = line_network(&[300, 800]);
        let (mut m, sink, _clock) = matcher(net, small_config());

        m.on_vehicle(vehicle(1, n[0], n[2], 10_000, 4));
        m.on_customer(cust(1, n[0], n[1], 0, 5_000));
        m.handle().request_shutdown();

        let summary = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(summary.matched, 0);
        assert!(sink.state().assignments.is_empty());
        assert_eq!(m.fleet_size(), 0); // nothing was drained

        let stats = m.end(&mut NoopObserver);
        assert_eq!(stats.matched, 0);
    }

    #[test]
    fn vehicle_snapshots_build_the_fleet_table() {
        let (net, n) = line_network(&[300, 800]);
        let (mut m, _sink, _clock) = matcher(net, small_config());

        m.on_vehicle(vehicle(1, n[0], n[2], 10_000, 4));
        m.on_vehicle(vehicle(2, n[1], n[2], 10_000, 4));
        m.tick(&mut NoopObserver).unwrap();

        assert_eq!(m.fleet_size(), 2);
        assert!(m.vehicle(VehicleId(1)).is_some());
        assert!(m.tree(VehicleId(2)).is_some());
    }
}

// ── Scenario 1: single customer, single idle vehicle, direct trip ─────────────

#[cfg(test)]
mod direct_trip {
    use rp_core::{CustomerId, VehicleId};
    use rp_model::{StopKind, StopOwner};

    use crate::NoopObserver;

    use super::helpers::{cust, line_network, matcher, small_config, vehicle};

    #[test]
    fn customer_on_the_way_is_matched_at_zero_detour() {
        // 10 —300m— 20 —800m— 100, vehicle 10 → 100, customer 10 → 20.
        let (net, n) = line_network(&[300, 800]);
        let (mut m, sink, _clock) = matcher(net, small_config());

        m.on_vehicle(vehicle(1, n[0], n[2], 10_000, 4));
        m.on_customer(cust(1, n[0], n[1], 0, 5_000));

        let summary = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.refused, 0);

        let stats = m.statistics();
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.refused, 0);
        assert_eq!(stats.mean_match_latency_secs(), 0.0);

        let state = sink.state();
        assert_eq!(state.assignments.len(), 1);
        let rec = &state.assignments[0];
        assert_eq!(rec.vehicle, VehicleId(1));
        assert_eq!(rec.added, vec![CustomerId(1)]);

        let kinds: Vec<_> = rec.schedule.stops().iter().map(|s| (s.kind, s.loc)).collect();
        assert_eq!(
            kinds,
            vec![
                (StopKind::VehicleOrigin, n[0]),
                (StopKind::Pickup, n[0]),
                (StopKind::Dropoff, n[1]),
                (StopKind::VehicleDest, n[2]),
            ]
        );
        // Completion time: 300 s to the dropoff plus 800 s to the depot.
        assert_eq!(rec.route.total_meters(), 1_100);

        // The committed tree's best path reads back as the schedule minus
        // its trailing destination stop.
        drop(state);
        let tree_path = m.tree(VehicleId(1)).unwrap().ordered_stop_sequence();
        let sched = &m.vehicle(VehicleId(1)).unwrap().schedule;
        assert_eq!(tree_path.len(), sched.len() - 1);
        for (tree_stop, stop) in tree_path.iter().zip(sched.stops()) {
            assert_eq!(tree_stop.loc, stop.loc);
            assert_eq!(tree_stop.is_pickup, stop.is_pickup_side());
            assert_eq!(tree_stop.owner, stop.owner);
        }
        assert_eq!(
            tree_path[1].owner,
            StopOwner::Customer(CustomerId(1)),
        );
    }
}

// ── Scenario 2: infeasible late window ────────────────────────────────────────

#[cfg(test)]
mod infeasible_window {
    use crate::{MatcherConfig, NoopObserver};

    use super::helpers::{cust, line_network, matcher, vehicle};

    #[test]
    fn impossible_deadline_exhausts_retries_then_refuses() {
        let (net, n) = line_network(&[300, 800]);
        let config = MatcherConfig {
            grid_dim: 4,
            retry_bound: 2,
            retry_backoff_secs: 0,
            ..MatcherConfig::default()
        };
        let (mut m, sink, _clock) = matcher(net, config);

        m.on_vehicle(vehicle(1, n[0], n[2], 10_000, 4));
        // Dropoff deadline 100 s < the 300 s direct travel time.
        m.on_customer(cust(1, n[0], n[1], 0, 100));

        let first = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(first.matched, 0);
        assert_eq!(first.refused, 0);
        assert_eq!(first.waiting, 1);

        let second = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(second.refused, 1);
        assert_eq!(second.waiting, 0);

        assert_eq!(m.statistics().matched, 0);
        assert_eq!(m.statistics().refused, 1);
        assert!(sink.state().assignments.is_empty());
    }
}

// ── Scenario 3: two customers competing for one seat ──────────────────────────

#[cfg(test)]
mod seat_competition {
    use rp_core::CustomerId;

    use crate::{MatcherConfig, NoopObserver};

    use super::helpers::{cust, line_network, matcher, vehicle};

    #[test]
    fn first_arrival_takes_the_seat_and_the_second_is_refused() {
        let (net, n) = line_network(&[100, 100, 2_000, 100]);
        let config = MatcherConfig {
            grid_dim: 4,
            retry_bound: 1,
            ..MatcherConfig::default()
        };
        let (mut m, sink, _clock) = matcher(net, config);

        m.on_vehicle(vehicle(1, n[0], n[4], 100_000, 1));
        m.on_customer(cust(1, n[1], n[2], 0, 50_000)); // cheap detour, first in FIFO
        m.on_customer(cust(2, n[3], n[4], 0, 50_000)); // arrives second

        let summary = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.refused, 1);

        let state = sink.state();
        assert_eq!(state.assignments.len(), 1);
        assert_eq!(state.assignments[0].added, vec![CustomerId(1)]);
        assert_eq!(m.statistics().refused, 1);
    }
}

// ── Scenario 4: kinetic re-ordering around an on-board customer ───────────────

#[cfg(test)]
mod reordering {
    use rp_core::{CustomerId, VehicleId};
    use rp_model::{Schedule, StopKind};

    use crate::{MatcherConfig, NoopObserver};

    use super::helpers::{cust, line_network, matcher, vehicle};

    #[test]
    fn new_pickup_slots_in_before_the_pending_dropoff() {
        // n0 —100— n1 —100— n2 —100— n3 —100— n4
        let (net, n) = line_network(&[100, 100, 100, 100]);
        let config = MatcherConfig { grid_dim: 4, ..MatcherConfig::default() };
        let (mut m, sink, clock) = matcher(net, config);

        // Tick 0: cust1 rides n0 → n2.
        m.on_vehicle(vehicle(7, n[0], n[4], 100_000, 2));
        m.on_customer(cust(1, n[0], n[2], 0, 10_000));
        let summary = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(summary.matched, 1);

        // The fleet reports cust1 boarded: the pickup stop is gone and one
        // seat is taken.  Position is unchanged (pickup was at n0).
        let mut boarded = m.vehicle(VehicleId(7)).unwrap().clone();
        let committed = boarded.schedule.stops().to_vec();
        assert_eq!(committed[1].kind, StopKind::Pickup);
        boarded.schedule = Schedule::new(vec![committed[0], committed[2], committed[3]]);
        boarded.load = 1;
        clock.advance(30);
        m.on_vehicle(boarded);

        // Tick 1: cust2 rides n1 → n3; the cheap plan grabs them on the way
        // to cust1's dropoff.
        m.on_customer(cust(2, n[1], n[3], 0, 100_000));
        let summary = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(summary.matched, 1);

        let state = sink.state();
        let rec = state.assignments.last().unwrap();
        assert_eq!(rec.added, vec![CustomerId(2)]);
        let plan: Vec<_> = rec.schedule.stops().iter().map(|s| (s.kind, s.loc)).collect();
        assert_eq!(
            plan,
            vec![
                (StopKind::VehicleOrigin, n[0]),
                (StopKind::Pickup, n[1]),  // cust2 boards first
                (StopKind::Dropoff, n[2]), // then cust1 alights
                (StopKind::Dropoff, n[3]), // then cust2
                (StopKind::VehicleDest, n[4]),
            ]
        );
        // Four equal legs.
        assert_eq!(rec.route.total_meters(), 400);
    }
}

// ── Scenario 5: synchronisation after vehicle motion ──────────────────────────

#[cfg(test)]
mod synchronisation {
    use rp_core::{CustomerId, SimTime, Speed, VehicleId};
    use rp_model::{Schedule, Stop};
    use rp_tree::{InsertRequest, KineticTree};

    use crate::synchronize;

    use super::helpers::line_network;

    #[test]
    fn one_step_aligns_the_tree_with_the_moved_vehicle() {
        let (net, n) = line_network(&[100, 100, 100]);
        let oracle = rp_spatial::DijkstraOracle::new(net);
        let speed = Speed::new(1.0);

        // Tree for a vehicle at n0 heading to n3, serving cust1 n1 → n2.
        let mut kt = KineticTree::new(VehicleId(0), n[0], Some(n[3]), SimTime(0));
        kt.tentative_insert(
            &InsertRequest {
                customer: CustomerId(1),
                origin: n[1],
                destination: n[2],
                pickup_by: SimTime(10_000),
                dropoff_by: SimTime(10_000),
                max_ride_secs: 10_000,
            },
            &oracle,
            speed,
        )
        .unwrap()
        .unwrap();
        kt.commit_tentative().unwrap();

        // Authoritative state: the vehicle reached n1 (the pickup).
        let sched = Schedule::new(vec![
            Stop::pickup(CustomerId(1), n[1], SimTime(0), SimTime(10_000)),
            Stop::dropoff(CustomerId(1), n[2], SimTime(0), SimTime(10_000)),
            Stop::vehicle_dest(VehicleId(0), n[3], SimTime(100_000)),
        ]);
        synchronize(&mut kt, &sched, &oracle, speed).unwrap();

        assert_eq!(kt.root_location(), n[1]);
        assert_eq!(kt.next(), Some(n[2]));

        // Running the synchroniser again with unchanged state is a no-op.
        let before = kt.clone();
        synchronize(&mut kt, &sched, &oracle, speed).unwrap();
        assert_eq!(kt, before);
    }
}

// ── Scenario 6: out-of-sync commit rejection ──────────────────────────────────

#[cfg(test)]
mod out_of_sync {
    use crate::{MatcherConfig, NoopObserver};

    use super::helpers::{cust, line_network, matcher, vehicle};

    #[test]
    fn rejected_commit_backs_off_and_retries_cleanly() {
        let (net, n) = line_network(&[300, 800]);
        let config = MatcherConfig {
            grid_dim: 4,
            retry_bound: 3,
            retry_backoff_secs: 10,
            ..MatcherConfig::default()
        };
        let (mut m, sink, clock) = matcher(net, config);

        m.on_vehicle(vehicle(1, n[0], n[2], 10_000, 4));
        m.on_customer(cust(1, n[0], n[1], 0, 5_000));

        // The fleet authority says no: the vehicle has moved on.
        sink.state().accept = false;
        let summary = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.waiting, 1);
        assert_eq!(m.statistics().out_of_sync_rejections, 1);
        assert_eq!(m.statistics().matched, 0);

        // The tree was left untouched, so once the view stops being stale
        // the same customer commits fine after the back-off.
        sink.state().accept = true;
        clock.advance(10);
        let summary = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(summary.matched, 1);
        assert_eq!(m.statistics().matched, 1);
        assert_eq!(m.statistics().out_of_sync_rejections, 1);
        assert_eq!(m.statistics().refused, 0);
    }
}

// ── Latency accounting ────────────────────────────────────────────────────────

#[cfg(test)]
mod latency {
    use crate::{MatcherConfig, NoopObserver};

    use super::helpers::{cust, line_network, matcher, vehicle};

    #[test]
    fn latency_runs_from_arrival_to_accepted_match() {
        let (net, n) = line_network(&[300, 800]);
        let config = MatcherConfig {
            grid_dim: 4,
            retry_backoff_secs: 5,
            ..MatcherConfig::default()
        };
        let (mut m, _sink, clock) = matcher(net, config);

        // No fleet yet: the first attempt fails.
        m.on_customer(cust(1, n[0], n[1], 0, 5_000));
        let summary = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.waiting, 1);

        // A vehicle shows up 30 s later and the match goes through.
        clock.advance(30);
        m.on_vehicle(vehicle(1, n[0], n[2], 10_000, 4));
        let summary = m.tick(&mut NoopObserver).unwrap();
        assert_eq!(summary.matched, 1);
        assert_eq!(m.statistics().mean_match_latency_secs(), 30.0);
    }
}
