//! `rp-model` — the fleet data model and its invariant checks.
//!
//! # Crate layout
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`customer`] | `Customer`, `CustomerStatus`                           |
//! | [`vehicle`]  | `Vehicle` snapshots, taxi mode, queued-seat counting   |
//! | [`stop`]     | `Stop`, `StopKind`, `StopOwner`                        |
//! | [`schedule`] | `Schedule` + time-window / capacity / pairing checks   |
//! | [`route`]    | `Route`, `route_through` materialisation               |
//! | [`error`]    | `ScheduleError`, `ScheduleResult<T>`                   |

pub mod customer;
pub mod error;
pub mod route;
pub mod schedule;
pub mod stop;
pub mod vehicle;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use customer::{Customer, CustomerStatus};
pub use error::{ScheduleError, ScheduleResult};
pub use route::{route_through, Route};
pub use schedule::Schedule;
pub use stop::{Stop, StopKind, StopOwner};
pub use vehicle::Vehicle;
