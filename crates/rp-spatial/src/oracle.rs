//! The shortest-path oracle: trait, default Dijkstra implementation, and a
//! memoising wrapper.
//!
//! # Pluggability
//!
//! The matching engine reaches the road network exclusively through
//! [`DistanceOracle`], so deployments can swap in contraction hierarchies,
//! hub labels, or a precomputed matrix without touching the engine.  The
//! bundled [`DijkstraOracle`] is sufficient for city-scale instances.
//!
//! # Cost units
//!
//! Oracles answer in **metres** (`u32`).  Conversion to travel seconds
//! happens at the callers through [`rp_core::Speed`] — never here.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use rp_core::NodeId;

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

// ── DistanceOracle trait ──────────────────────────────────────────────────────

/// Shortest-path queries over the road network.
///
/// # Contract
///
/// Pure and idempotent: the same query always yields the same answer.
/// Implementations must be `Send + Sync`; the matcher shares one oracle
/// across its whole lifetime and treats every call as synchronous.
pub trait DistanceOracle: Send + Sync {
    /// Shortest-path distance from `from` to `to` in metres.
    fn distance_m(&self, from: NodeId, to: NodeId) -> SpatialResult<u32>;

    /// The node sequence realising [`distance_m`](Self::distance_m),
    /// including both endpoints.  `from == to` yields a single-element path.
    fn path(&self, from: NodeId, to: NodeId) -> SpatialResult<Vec<NodeId>>;
}

// ── DijkstraOracle ────────────────────────────────────────────────────────────

/// Standard Dijkstra's algorithm over the CSR road graph, edge length in
/// metres as cost.
///
/// Holds the network behind an `Arc` so the matcher can keep a second handle
/// for geographic lookups (grid placement) without cloning the graph.
pub struct DijkstraOracle {
    network: Arc<RoadNetwork>,
}

impl DijkstraOracle {
    pub fn new(network: Arc<RoadNetwork>) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Run Dijkstra and return the predecessor array and the cost to `to`.
    fn search(&self, from: NodeId, to: NodeId) -> SpatialResult<(Vec<NodeId>, u32)> {
        let net = &*self.network;
        let n = net.node_count();
        if from.index() >= n {
            return Err(SpatialError::NodeNotFound(from));
        }
        if to.index() >= n {
            return Err(SpatialError::NodeNotFound(to));
        }

        // dist[v] = best known cost (metres) to reach v.
        let mut dist = vec![u32::MAX; n];
        // prev[v] = node preceding v on the best path; INVALID if unreached.
        let mut prev = vec![NodeId::INVALID; n];

        dist[from.index()] = 0;

        // Min-heap: Reverse makes BinaryHeap (max) behave as a min-heap.
        // Secondary key NodeId gives deterministic tie-breaking.
        let mut heap: BinaryHeap<Reverse<(u32, NodeId)>> = BinaryHeap::new();
        heap.push(Reverse((0, from)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if node == to {
                return Ok((prev, cost));
            }
            // Skip stale heap entries.
            if cost > dist[node.index()] {
                continue;
            }
            for (neighbor, length_m) in net.out_edges(node) {
                let new_cost = cost.saturating_add(length_m);
                if new_cost < dist[neighbor.index()] {
                    dist[neighbor.index()] = new_cost;
                    prev[neighbor.index()] = node;
                    heap.push(Reverse((new_cost, neighbor)));
                }
            }
        }

        Err(SpatialError::NoRoute { from, to })
    }
}

impl DistanceOracle for DijkstraOracle {
    fn distance_m(&self, from: NodeId, to: NodeId) -> SpatialResult<u32> {
        if from == to {
            // Still validate the ID so bad input surfaces early.
            return if from.index() < self.network.node_count() {
                Ok(0)
            } else {
                Err(SpatialError::NodeNotFound(from))
            };
        }
        self.search(from, to).map(|(_, cost)| cost)
    }

    fn path(&self, from: NodeId, to: NodeId) -> SpatialResult<Vec<NodeId>> {
        if from == to {
            return if from.index() < self.network.node_count() {
                Ok(vec![from])
            } else {
                Err(SpatialError::NodeNotFound(from))
            };
        }
        let (prev, _) = self.search(from, to)?;
        let mut nodes = vec![to];
        let mut cur = to;
        while prev[cur.index()] != NodeId::INVALID {
            cur = prev[cur.index()];
            nodes.push(cur);
        }
        nodes.reverse();
        Ok(nodes)
    }
}

// ── MemoOracle ────────────────────────────────────────────────────────────────

/// A memoising wrapper around any [`DistanceOracle`].
///
/// The kinetic tree asks for the same node-pair distances over and over
/// (every clone re-derives edge times), so a small cache in front of an
/// exact oracle removes the bulk of the search work.  Distances are cached
/// with a **directed** key — the road graph is directed, so `d(a, b)` and
/// `d(b, a)` may differ.  Paths are not cached; they are requested once per
/// committed assignment, not per probe.
pub struct MemoOracle<O: DistanceOracle> {
    inner: O,
    cache: Mutex<FxHashMap<(NodeId, NodeId), u32>>,
}

impl<O: DistanceOracle> MemoOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of cached distance entries.
    pub fn cached_len(&self) -> usize {
        self.cache.lock().expect("distance cache poisoned").len()
    }
}

impl<O: DistanceOracle> DistanceOracle for MemoOracle<O> {
    fn distance_m(&self, from: NodeId, to: NodeId) -> SpatialResult<u32> {
        if let Some(&d) = self
            .cache
            .lock()
            .expect("distance cache poisoned")
            .get(&(from, to))
        {
            return Ok(d);
        }
        let d = self.inner.distance_m(from, to)?;
        self.cache
            .lock()
            .expect("distance cache poisoned")
            .insert((from, to), d);
        Ok(d)
    }

    fn path(&self, from: NodeId, to: NodeId) -> SpatialResult<Vec<NodeId>> {
        self.inner.path(from, to)
    }
}
