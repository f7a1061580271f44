//! `rp-spatial` — road network, shortest-path oracle, and vehicle grid.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | [`network`] | `RoadNetwork` (CSR), `RoadNetworkBuilder`               |
//! | [`oracle`]  | `DistanceOracle` trait, `DijkstraOracle`, `MemoOracle`  |
//! | [`grid`]    | `VehicleGrid` — uniform bucket grid for radius queries  |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                      |

pub mod error;
pub mod grid;
pub mod network;
pub mod oracle;

#[cfg(test)]
mod tests;

pub use error::{SpatialError, SpatialResult};
pub use grid::VehicleGrid;
pub use network::{RoadNetwork, RoadNetworkBuilder};
pub use oracle::{DijkstraOracle, DistanceOracle, MemoOracle};
