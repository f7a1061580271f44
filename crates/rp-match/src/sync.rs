//! The synchroniser: reconcile a kinetic tree with an authoritative
//! schedule.
//!
//! Between observations a vehicle keeps driving: it passes stops the tree
//! still holds near its root.  Synchronisation steps the tree past every
//! stop the vehicle has already visited, then relocates the root to the
//! vehicle's current next node.
//!
//! Postcondition: the tree's root is the vehicle's position and its best
//! path's next stop matches the authoritative next stop.  Running the
//! synchroniser twice with no intervening state change is a no-op on the
//! second call.

use rp_core::Speed;
use rp_model::Schedule;
use rp_spatial::DistanceOracle;
use rp_tree::{KineticTree, TreeResult};

/// Align `kt` with `schedule` (the authoritative remaining stop list,
/// starting at the vehicle's next node).
pub fn synchronize<O: DistanceOracle + ?Sized>(
    kt: &mut KineticTree,
    schedule: &Schedule,
    oracle: &O,
    speed: Speed,
) -> TreeResult<()> {
    // Step past stops the vehicle has already serviced: the tree's next
    // stop must agree with the schedule's second entry (the first entry is
    // the vehicle's current position, mirrored below by move_root).
    if let Some(target) = schedule.second() {
        while let Some(next_loc) = kt.next() {
            if next_loc == target.loc {
                break;
            }
            kt.step();
        }
    }

    if let Some(first) = schedule.first() {
        kt.move_root(first.loc, oracle, speed)?;
    }
    Ok(())
}
