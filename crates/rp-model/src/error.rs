//! Schedule-validation error type.

use thiserror::Error;

use rp_core::{CustomerId, NodeId};
use rp_spatial::SpatialError;

/// Errors produced by schedule and route validation.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(
        "stop {index} at {loc} missed its window: arrival {arrival_secs:.0}s > latest {latest_secs}s"
    )]
    TimeWindow {
        index: usize,
        loc: NodeId,
        arrival_secs: f64,
        latest_secs: i64,
    },

    #[error("stop {index}: load {load} exceeds capacity {capacity}")]
    CapacityExceeded { index: usize, load: u32, capacity: u32 },

    #[error("customer {0} has a pickup with no later dropoff")]
    UnpairedStop(CustomerId),

    #[error("schedule is empty")]
    Empty,

    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
