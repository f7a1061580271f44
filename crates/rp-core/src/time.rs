//! Simulated time: the `SimTime` instant and the `Clock` source.
//!
//! # Design
//!
//! All engine time is expressed in whole simulated seconds since the start
//! of the problem horizon.  Using an integer instant keeps schedule
//! arithmetic exact; the sub-second fractions that appear when converting
//! road distances to travel time live only inside the kinetic tree, which
//! works in `f64` seconds throughout.
//!
//! The engine never reads the wall clock for simulation decisions — it asks
//! a [`Clock`], which producers advance.  The bundled [`VirtualClock`] is an
//! atomic, monotone implementation suitable for tests, demos and any driver
//! that multiplexes simulated time across threads.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute instant in simulated seconds.
///
/// `i64` so that subtraction never wraps; negative instants are legal
/// intermediate values (e.g. a deadline derivation clamping below zero).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub i64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// "Never" — the unbounded late window of a taxi-mode vehicle.
    pub const MAX: SimTime = SimTime(i64::MAX);

    /// The instant `secs` seconds after `self`.
    #[inline]
    pub fn offset(self, secs: i64) -> SimTime {
        SimTime(self.0 + secs)
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is
    /// actually later).
    #[inline]
    pub fn since(self, earlier: SimTime) -> i64 {
        self.0 - earlier.0
    }

    /// The instant as `f64` seconds, for kinetic-tree arithmetic.
    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64
    }
}

impl std::ops::Add<i64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: i64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = i64;
    #[inline]
    fn sub(self, rhs: SimTime) -> i64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Source of the current simulated instant.
///
/// # Contract
///
/// `now()` is monotone non-decreasing.  Implementations must be `Send +
/// Sync`: the matcher reads the clock from its worker while producers may
/// advance it from theirs.
pub trait Clock: Send + Sync {
    fn now(&self) -> SimTime;
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now(&self) -> SimTime {
        (**self).now()
    }
}

/// A manually driven, thread-safe [`Clock`].
///
/// `advance` and `set` use `fetch_max`, so racing producers can never move
/// the clock backwards — late writers with stale instants lose.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now_secs: AtomicI64,
}

impl VirtualClock {
    pub fn new(start: SimTime) -> Self {
        Self { now_secs: AtomicI64::new(start.0) }
    }

    /// Move the clock forward by `secs` (no-op for `secs <= 0`).
    pub fn advance(&self, secs: i64) {
        if secs > 0 {
            self.now_secs.fetch_add(secs, Ordering::Relaxed);
        }
    }

    /// Move the clock to `instant` if that is later than the current value.
    pub fn set(&self, instant: SimTime) {
        self.now_secs.fetch_max(instant.0, Ordering::Relaxed);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> SimTime {
        SimTime(self.now_secs.load(Ordering::Relaxed))
    }
}
