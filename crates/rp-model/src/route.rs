//! Routes: the waypoint realisation of a schedule on the road network.
//!
//! A route is derived data — the schedule is the ground truth, and the
//! route is rebuilt whenever the schedule changes.  Waypoints carry the
//! cumulative distance from the route start so downstream consumers can
//! place a vehicle along it without re-querying the oracle.

use rp_core::NodeId;
use rp_spatial::DistanceOracle;

use crate::{Schedule, ScheduleError, ScheduleResult};

/// Ordered `(metres_from_start, node)` waypoints realising a schedule.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub waypoints: Vec<(u32, NodeId)>,
}

impl Route {
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Cumulative length of the whole route in metres.
    pub fn total_meters(&self) -> u32 {
        self.waypoints.last().map_or(0, |&(m, _)| m)
    }

    /// The node sequence without distances.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.waypoints.iter().map(|&(_, n)| n)
    }
}

/// Materialise the route that visits `schedule`'s stops in order.
///
/// The first waypoint is the first stop at distance 0.  Co-located
/// consecutive stops (e.g. a pickup at the vehicle's current node) add no
/// waypoints.
pub fn route_through<O: DistanceOracle + ?Sized>(
    schedule: &Schedule,
    oracle: &O,
) -> ScheduleResult<Route> {
    let stops = schedule.stops();
    let Some(first) = stops.first() else {
        return Err(ScheduleError::Empty);
    };

    let mut waypoints = vec![(0u32, first.loc)];
    let mut acc: u32 = 0;

    for pair in stops.windows(2) {
        let (from, to) = (pair[0].loc, pair[1].loc);
        if from == to {
            continue;
        }
        let leg = oracle.path(from, to)?;
        for hop in leg.windows(2) {
            acc = acc.saturating_add(oracle.distance_m(hop[0], hop[1])?);
            waypoints.push((acc, hop[1]));
        }
    }

    Ok(Route { waypoints })
}
