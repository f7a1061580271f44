//! Schedule stops.

use rp_core::{CustomerId, NodeId, SimTime, VehicleId};

// ── StopOwner ─────────────────────────────────────────────────────────────────

/// Who a stop belongs to: a customer (pickup/dropoff pair) or the vehicle
/// itself (origin and final destination).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopOwner {
    Customer(CustomerId),
    Vehicle(VehicleId),
}

impl StopOwner {
    pub fn customer(self) -> Option<CustomerId> {
        match self {
            StopOwner::Customer(c) => Some(c),
            StopOwner::Vehicle(_) => None,
        }
    }
}

impl std::fmt::Display for StopOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopOwner::Customer(c) => write!(f, "{c}"),
            StopOwner::Vehicle(v) => write!(f, "{v}"),
        }
    }
}

// ── StopKind ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopKind {
    /// The vehicle's own start (or its current next node after rebasing).
    VehicleOrigin,
    /// A customer boarding point.
    Pickup,
    /// A customer alighting point.
    Dropoff,
    /// The vehicle's final destination; a sentinel at the last real stop's
    /// location for taxi-mode vehicles.
    VehicleDest,
}

// ── Stop ──────────────────────────────────────────────────────────────────────

/// One element of a [`Schedule`](crate::Schedule).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stop {
    pub owner: StopOwner,
    pub loc: NodeId,
    pub kind: StopKind,
    pub early: SimTime,
    pub late: SimTime,
}

impl Stop {
    pub fn pickup(customer: CustomerId, loc: NodeId, early: SimTime, late: SimTime) -> Self {
        Self { owner: StopOwner::Customer(customer), loc, kind: StopKind::Pickup, early, late }
    }

    pub fn dropoff(customer: CustomerId, loc: NodeId, early: SimTime, late: SimTime) -> Self {
        Self { owner: StopOwner::Customer(customer), loc, kind: StopKind::Dropoff, early, late }
    }

    pub fn vehicle_origin(vehicle: VehicleId, loc: NodeId, early: SimTime) -> Self {
        Self {
            owner: StopOwner::Vehicle(vehicle),
            loc,
            kind: StopKind::VehicleOrigin,
            early,
            late: SimTime::MAX,
        }
    }

    pub fn vehicle_dest(vehicle: VehicleId, loc: NodeId, late: SimTime) -> Self {
        Self {
            owner: StopOwner::Vehicle(vehicle),
            loc,
            kind: StopKind::VehicleDest,
            early: SimTime::ZERO,
            late,
        }
    }

    /// `true` for the boarding-side kinds (`VehicleOrigin`, `Pickup`).
    ///
    /// This is the polarity the kinetic tree reports for its path nodes, so
    /// schedule ↔ tree matching compares `(owner, loc, boarding-side)`.
    pub fn is_pickup_side(&self) -> bool {
        matches!(self.kind, StopKind::VehicleOrigin | StopKind::Pickup)
    }
}
