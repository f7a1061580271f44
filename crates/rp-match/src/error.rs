//! Matcher error type.
//!
//! Recoverable conditions — an infeasible insertion, a rejected commit, an
//! oracle failure on one candidate — are handled (and counted) inside the
//! tick at candidate granularity.  What surfaces here is either bad
//! construction input or a fatal invariant violation that must terminate
//! the matching loop.

use thiserror::Error;

use rp_core::VehicleId;
use rp_model::ScheduleError;
use rp_tree::TreeError;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("matcher configuration error: {0}")]
    Config(String),

    #[error("candidate {0} is not in the fleet table")]
    UnknownVehicle(VehicleId),

    /// A schedule the matcher just committed fails its own re-check — a
    /// synchronisation bug, not a data problem.
    #[error("committed schedule for {vehicle} violates fleet invariants")]
    InvariantViolation {
        vehicle: VehicleId,
        #[source]
        source: ScheduleError,
    },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

pub type MatchResult<T> = Result<T, MatchError>;
