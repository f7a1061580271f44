//! `rp-match` — the online matching engine.
//!
//! Ties the other `rp-*` crates together: a [`Matcher`] owns one kinetic
//! tree per vehicle, rebuilds a spatial grid every batch tick, probes
//! candidate vehicles for each waiting customer, and commits the cheapest
//! feasible assignment through an [`AssignmentSink`].
//!
//! # Crate layout
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`matcher`]  | `Matcher` — the batch tick loop                         |
//! | [`sync`]     | `synchronize` — kinetic tree ↔ authoritative schedule   |
//! | [`deadline`] | `ProbeWindow` — deadline and search-radius derivation   |
//! | [`inbox`]    | `InboxHandle` — producer FIFOs and the shutdown flag    |
//! | [`sink`]     | `AssignmentSink`, `Assignment`, `AcceptAllSink`         |
//! | [`observer`] | `MatchObserver`, `NoopObserver`                         |
//! | [`stats`]    | `Statistics`, `TickSummary`                             |
//! | [`config`]   | `MatcherConfig`                                         |
//! | [`error`]    | `MatchError`, `MatchResult<T>`                          |

pub mod config;
pub mod deadline;
pub mod error;
pub mod inbox;
pub mod matcher;
pub mod observer;
pub mod sink;
pub mod stats;
pub mod sync;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::MatcherConfig;
pub use deadline::{probe_window, ProbeWindow};
pub use error::{MatchError, MatchResult};
pub use inbox::InboxHandle;
pub use matcher::Matcher;
pub use observer::{MatchObserver, NoopObserver};
pub use sink::{AcceptAllSink, Assignment, AssignmentSink};
pub use stats::{Statistics, TickSummary};
pub use sync::synchronize;
