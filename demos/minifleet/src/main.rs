//! minifleet — smallest end-to-end demo of the ridepool matching engine.
//!
//! Five vehicles roam a synthetic 4 × 4 street lattice while seeded random
//! customers trickle in.  The matcher runs one batch tick per simulated
//! 30 s; an in-process fleet table plays the role of the authoritative
//! dispatch state, accepting assignments and replaying vehicle progress
//! back into the matcher.  Results land in `minifleet_results.csv`.

mod fleet;
mod network;

use std::sync::{Arc, Mutex};

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use rp_core::{Clock, CustomerId, SimTime, Speed, VehicleId, VirtualClock};
use rp_match::{MatchObserver, Matcher, MatcherConfig, Statistics, TickSummary};
use rp_model::{Customer, CustomerStatus, Vehicle};
use rp_spatial::{DijkstraOracle, MemoOracle};

use fleet::{FleetSink, FleetState};
use network::build_network;

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED: u64 = 42;
const TICKS: u64 = 60;
const PERIOD_SECS: i64 = 30;
const VEHICLE_COUNT: u32 = 5;
const VEHICLE_CAPACITY: u32 = 3;
const SPEED_M_PER_S: f64 = 10.0;
/// Customers get this much time from arrival to latest dropoff.
const WINDOW_SECS: i64 = 1_800;
const RESULTS_PATH: &str = "minifleet_results.csv";

// ── Progress observer ─────────────────────────────────────────────────────────

struct ProgressPrinter {
    fleet: Arc<Mutex<FleetState>>,
}

impl MatchObserver for ProgressPrinter {
    fn on_match(&mut self, customer: CustomerId, vehicle: VehicleId, detour_secs: f64) {
        println!("  match: {customer} → {vehicle} (+{detour_secs:.0}s detour)");
    }

    fn on_refusal(&mut self, customer: CustomerId) {
        println!("  refused: {customer}");
        self.fleet
            .lock()
            .expect("fleet state poisoned")
            .statuses
            .insert(customer, CustomerStatus::Refused);
    }

    fn on_tick_end(&mut self, now: SimTime, summary: &TickSummary) {
        if summary.matched + summary.refused + summary.waiting > 0 {
            println!(
                "{now}: matched {} refused {} waiting {}",
                summary.matched, summary.refused, summary.waiting
            );
        }
    }

    fn on_end(&mut self, stats: &Statistics) {
        println!("final: {stats}");
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let (net, nodes) = build_network();
    let speed = Speed::new(SPEED_M_PER_S);
    let clock = Arc::new(VirtualClock::new(SimTime::ZERO));
    let fleet = Arc::new(Mutex::new(FleetState::new(speed)));
    let fleet_oracle = DijkstraOracle::new(net.clone());

    let config = MatcherConfig {
        batch_period_secs: PERIOD_SECS,
        grid_dim: 16,
        ..MatcherConfig::default()
    };
    let mut matcher = Matcher::new(
        config,
        net.clone(),
        MemoOracle::new(DijkstraOracle::new(net.clone())),
        FleetSink(fleet.clone()),
        clock.clone(),
        speed,
    )?;
    let inbox = matcher.handle();

    // Seed the fleet: taxis roam, the rest run depot-to-depot.
    let mut rng = SmallRng::seed_from_u64(SEED);
    for i in 0..VEHICLE_COUNT {
        let origin = nodes[rng.gen_range(0..nodes.len())];
        let vehicle = if i % 2 == 0 {
            Vehicle::taxi(VehicleId(i), origin, SimTime::ZERO, VEHICLE_CAPACITY)
        } else {
            let depot = nodes[rng.gen_range(0..nodes.len())];
            Vehicle::new(
                VehicleId(i),
                origin,
                depot,
                SimTime::ZERO,
                SimTime(TICKS as i64 * PERIOD_SECS + WINDOW_SECS),
                VEHICLE_CAPACITY,
            )
        };
        fleet.lock().expect("fleet state poisoned").add_vehicle(vehicle.clone());
        inbox.send_vehicle(vehicle);
    }

    let mut observer = ProgressPrinter { fleet: fleet.clone() };
    let mut next_customer: u32 = 0;

    for _ in 0..TICKS {
        // Fresh requests: 0–2 per tick, random distinct endpoints.
        for _ in 0..rng.gen_range(0..=2u32) {
            let origin = nodes[rng.gen_range(0..nodes.len())];
            let mut dest = origin;
            while dest == origin {
                dest = nodes[rng.gen_range(0..nodes.len())];
            }
            let now = clock.now();
            let customer = Customer::new(
                CustomerId(next_customer),
                origin,
                dest,
                now,
                now + WINDOW_SECS,
                1,
            );
            next_customer += 1;
            fleet
                .lock()
                .expect("fleet state poisoned")
                .statuses
                .insert(customer.id, CustomerStatus::Waiting);
            inbox.send_customer(customer);
        }

        matcher.tick(&mut observer)?;

        clock.advance(PERIOD_SECS);
        {
            let mut guard = fleet.lock().expect("fleet state poisoned");
            guard.advance(PERIOD_SECS, &fleet_oracle);
            guard.publish(&inbox);
        }
    }

    let stats = matcher.end(&mut observer);
    write_results(&stats, &fleet.lock().expect("fleet state poisoned"))?;
    println!(
        "{} customers issued, results in {RESULTS_PATH}",
        next_customer
    );
    Ok(())
}

/// Dump per-customer outcomes plus a trailing summary row.
fn write_results(stats: &Statistics, fleet: &FleetState) -> Result<()> {
    let mut w = csv::Writer::from_path(RESULTS_PATH)?;
    w.write_record(["customer_id", "outcome"])?;
    for (customer, status) in fleet.outcome_rows() {
        w.write_record([customer.to_string(), format!("{status:?}")])?;
    }
    w.write_record([
        "summary".to_string(),
        format!(
            "matched={} refused={} out_of_sync={} mean_latency_s={:.1}",
            stats.matched,
            stats.refused,
            stats.out_of_sync_rejections,
            stats.mean_match_latency_secs()
        ),
    ])?;
    w.flush()?;
    Ok(())
}
