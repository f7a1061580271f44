//! Unit tests for rp-spatial.
//!
//! All tests use hand-crafted networks so they run without any map data.

#[cfg(test)]
mod helpers {
    use rp_core::{GeoPoint, NodeId};

    use crate::{RoadNetwork, RoadNetworkBuilder};

    /// A small grid network:
    ///
    /// ```text
    ///   0 —— 1 —— 2
    ///   |         |
    ///   3 ————————4
    /// ```
    ///
    /// Edge lengths (metres): 0-1 = 100, 1-2 = 100, 2-4 = 100,
    /// 0-3 = 500, 3-4 = 100.  Shortest 0→4 is 0→1→2→4 = 300 m.
    pub fn grid_network() -> (RoadNetwork, [NodeId; 5]) {
        let mut b = RoadNetworkBuilder::new();
        let n0 = b.add_node(GeoPoint::new(0.0, 0.0));
        let n1 = b.add_node(GeoPoint::new(0.001, 0.0));
        let n2 = b.add_node(GeoPoint::new(0.002, 0.0));
        let n3 = b.add_node(GeoPoint::new(0.0, 0.001));
        let n4 = b.add_node(GeoPoint::new(0.002, 0.001));

        b.add_road(n0, n1, 100);
        b.add_road(n1, n2, 100);
        b.add_road(n2, n4, 100);
        b.add_road(n0, n3, 500);
        b.add_road(n3, n4, 100);

        (b.build(), [n0, n1, n2, n3, n4])
    }
}

// ── Builder & network structure ───────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use rp_core::GeoPoint;

    use crate::RoadNetworkBuilder;

    #[test]
    fn empty_build() {
        let net = RoadNetworkBuilder::new().build();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.edge_count(), 0);
        assert!(net.is_empty());
        assert!(net.bounding_box().is_none());
    }

    #[test]
    fn roads_are_bidirectional() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(-88.0, 30.0));
        let c = b.add_node(GeoPoint::new(-88.0, 30.1));
        b.add_road(a, c, 1_000);
        let net = b.build();
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 2);
        assert_eq!(net.out_degree(a), 1);
        assert_eq!(net.out_degree(c), 1);
    }

    #[test]
    fn csr_out_edges() {
        let (net, [n0, n1, _, _, _]) = super::helpers::grid_network();
        assert_eq!(net.out_degree(n0), 2); // n0→n1, n0→n3
        assert_eq!(net.out_degree(n1), 2); // n1→n0, n1→n2

        let reaches_n1 = net.out_edges(n0).any(|(to, _)| to == n1);
        assert!(reaches_n1);
    }

    #[test]
    fn bounding_box_covers_all_nodes() {
        let (net, _) = super::helpers::grid_network();
        let (sw, ne) = net.bounding_box().unwrap();
        assert_eq!((sw.lng, sw.lat), (0.0, 0.0));
        assert_eq!((ne.lng, ne.lat), (0.002, 0.001));
    }
}

// ── Dijkstra oracle ───────────────────────────────────────────────────────────

#[cfg(test)]
mod dijkstra {
    use std::sync::Arc;

    use rp_core::{GeoPoint, NodeId};

    use crate::{DijkstraOracle, DistanceOracle, RoadNetworkBuilder, SpatialError};

    #[test]
    fn same_node_is_zero() {
        let (net, [n0, ..]) = super::helpers::grid_network();
        let oracle = DijkstraOracle::new(Arc::new(net));
        assert_eq!(oracle.distance_m(n0, n0).unwrap(), 0);
        assert_eq!(oracle.path(n0, n0).unwrap(), vec![n0]);
    }

    #[test]
    fn shortest_distance_and_path_agree() {
        let (net, [n0, n1, n2, _, n4]) = super::helpers::grid_network();
        let oracle = DijkstraOracle::new(Arc::new(net));

        assert_eq!(oracle.distance_m(n0, n4).unwrap(), 300);
        assert_eq!(oracle.path(n0, n4).unwrap(), vec![n0, n1, n2, n4]);
    }

    #[test]
    fn disconnected_is_no_route() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(1.0, 0.0));
        let oracle = DijkstraOracle::new(Arc::new(b.build()));
        assert!(matches!(
            oracle.distance_m(a, c),
            Err(SpatialError::NoRoute { .. })
        ));
    }

    #[test]
    fn one_way_blocks_return() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.001, 0.0));
        b.add_directed_edge(a, c, 100);
        let oracle = DijkstraOracle::new(Arc::new(b.build()));

        assert_eq!(oracle.distance_m(a, c).unwrap(), 100);
        assert!(oracle.distance_m(c, a).is_err());
    }

    #[test]
    fn unknown_node_is_reported() {
        let (net, [n0, ..]) = super::helpers::grid_network();
        let oracle = DijkstraOracle::new(Arc::new(net));
        assert!(matches!(
            oracle.distance_m(n0, NodeId(99)),
            Err(SpatialError::NodeNotFound(NodeId(99)))
        ));
    }
}

// ── Memoising oracle ──────────────────────────────────────────────────────────

#[cfg(test)]
mod memo {
    use std::sync::Arc;

    use crate::{DijkstraOracle, DistanceOracle, MemoOracle};

    #[test]
    fn caches_directed_pairs() {
        let (net, [n0, _, _, _, n4]) = super::helpers::grid_network();
        let oracle = MemoOracle::new(DijkstraOracle::new(Arc::new(net)));

        assert_eq!(oracle.cached_len(), 0);
        assert_eq!(oracle.distance_m(n0, n4).unwrap(), 300);
        assert_eq!(oracle.cached_len(), 1);

        // Repeat query hits the cache (same answer, no growth).
        assert_eq!(oracle.distance_m(n0, n4).unwrap(), 300);
        assert_eq!(oracle.cached_len(), 1);

        // The reverse direction is a distinct entry.
        assert_eq!(oracle.distance_m(n4, n0).unwrap(), 300);
        assert_eq!(oracle.cached_len(), 2);
    }
}

// ── Vehicle grid ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod grid {
    use rp_core::{GeoPoint, VehicleId};

    use crate::VehicleGrid;

    fn unit_grid(dim: usize) -> VehicleGrid {
        VehicleGrid::new(dim, GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0))
    }

    #[test]
    fn insert_then_query_finds_handle() {
        let mut g = unit_grid(10);
        let pos = GeoPoint::new(0.5, 0.5);
        g.insert(VehicleId(1), pos);

        let hits = g.within(1_000.0, pos);
        assert_eq!(hits, vec![VehicleId(1)]);
    }

    #[test]
    fn clear_empties_all_cells() {
        let mut g = unit_grid(4);
        g.insert(VehicleId(1), GeoPoint::new(0.1, 0.1));
        g.insert(VehicleId(2), GeoPoint::new(0.9, 0.9));
        assert_eq!(g.len(), 2);

        g.clear();
        assert!(g.is_empty());
        assert!(g.within(1.0e7, GeoPoint::new(0.5, 0.5)).is_empty());
    }

    #[test]
    fn radius_excludes_distant_cells() {
        let mut g = unit_grid(10);
        g.insert(VehicleId(1), GeoPoint::new(0.05, 0.05));
        g.insert(VehicleId(2), GeoPoint::new(0.95, 0.95));

        // ~0.9 degrees apart ≈ 140 km; a 5 km query around the first
        // vehicle must not reach the second one's cell.
        let hits = g.within(5_000.0, GeoPoint::new(0.05, 0.05));
        assert_eq!(hits, vec![VehicleId(1)]);
    }

    #[test]
    fn over_approximation_is_allowed_but_bounded() {
        let mut g = unit_grid(10);
        // Same cell as the query point, but ~7.8 km away diagonally.
        g.insert(VehicleId(1), GeoPoint::new(0.099, 0.099));

        // The cell's closest corner is right at the query point, so the
        // handle is returned even for a tiny radius — the documented
        // over-approximation.
        let hits = g.within(100.0, GeoPoint::new(0.051, 0.051));
        assert_eq!(hits, vec![VehicleId(1)]);
    }

    #[test]
    fn positions_outside_extent_are_clamped() {
        let mut g = unit_grid(4);
        g.insert(VehicleId(7), GeoPoint::new(-3.0, 5.0));
        assert_eq!(g.len(), 1);

        // Clamped into the corner cell, so a query near that corner sees it.
        let hits = g.within(50_000.0, GeoPoint::new(0.0, 1.0));
        assert_eq!(hits, vec![VehicleId(7)]);
    }

    #[test]
    fn degenerate_extent_still_works() {
        let p = GeoPoint::new(0.5, 0.5);
        let mut g = VehicleGrid::new(8, p, p);
        g.insert(VehicleId(1), p);
        assert_eq!(g.within(10.0, p), vec![VehicleId(1)]);
    }
}
