//! Synthetic 4 × 4 lattice road network for the demo.

use std::sync::Arc;

use rp_core::{GeoPoint, NodeId};
use rp_spatial::{RoadNetwork, RoadNetworkBuilder};

/// Grid spacing in degrees (≈ 550 m of longitude at the equator).
const SPACING_DEG: f64 = 0.005;

/// Edge length in metres between lattice neighbours.
const EDGE_M: u32 = 550;

pub const SIDE: usize = 4;

/// Build a `SIDE × SIDE` lattice with bidirectional 550 m streets.
pub fn build_network() -> (Arc<RoadNetwork>, Vec<NodeId>) {
    let mut b = RoadNetworkBuilder::with_capacity(SIDE * SIDE, 2 * SIDE * (SIDE - 1));
    let mut nodes = Vec::with_capacity(SIDE * SIDE);
    for row in 0..SIDE {
        for col in 0..SIDE {
            nodes.push(b.add_node(GeoPoint::new(
                col as f64 * SPACING_DEG,
                row as f64 * SPACING_DEG,
            )));
        }
    }
    for row in 0..SIDE {
        for col in 0..SIDE {
            let here = nodes[row * SIDE + col];
            if col + 1 < SIDE {
                b.add_road(here, nodes[row * SIDE + col + 1], EDGE_M);
            }
            if row + 1 < SIDE {
                b.add_road(here, nodes[(row + 1) * SIDE + col], EDGE_M);
            }
        }
    }
    (Arc::new(b.build()), nodes)
}
