//! `rp-core` — foundational types for the ridepool matching engine.
//!
//! This crate is a dependency of every other `rp-*` crate.  It intentionally
//! has no `rp-*` dependencies and no required external ones (only optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                            |
//! |-----------|-----------------------------------------------------|
//! | [`ids`]   | `CustomerId`, `VehicleId`, `NodeId`                 |
//! | [`time`]  | `SimTime`, the `Clock` trait, `VirtualClock`        |
//! | [`units`] | `Speed` — the single metres → seconds conversion    |
//! | [`geo`]   | `GeoPoint`, haversine distance                      |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |

pub mod geo;
pub mod ids;
pub mod time;
pub mod units;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use geo::GeoPoint;
pub use ids::{CustomerId, NodeId, VehicleId};
pub use time::{Clock, SimTime, VirtualClock};
pub use units::Speed;
