//! Tree nodes and their arena.
//!
//! The tree is stored as an arena of slots indexed by [`NodeHandle`]; parent
//! and child links are handles, never references.  Deleting a subtree pushes
//! its slots onto a free list for reuse, so repeated tentative insertions
//! do not grow the allocation without bound.
//!
//! Cloning the arena clones every slot — that is exactly the deep-clone a
//! shadow tree needs, with all handles remaining valid in the copy.

use rp_core::NodeId;
use rp_model::StopOwner;

// ── NodeHandle ────────────────────────────────────────────────────────────────

/// Index of a node slot within its [`Arena`].
///
/// Handles are only meaningful inside the arena that issued them (or a clone
/// of it).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct NodeHandle(pub(crate) u32);

impl NodeHandle {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

// ── TreeNode ──────────────────────────────────────────────────────────────────

/// One stop candidate in the kinetic tree.
///
/// Time fields are all `f64` sim-seconds:
///
/// - `time_from_parent` — travel along the incoming edge;
/// - `time_from_root` — summed edge times from the root (root = 0);
/// - `arrival` — absolute arrival estimate, tree clock + `time_from_root`.
///
/// `limit` is an absolute deadline (pickup-by for pickups, latest dropoff
/// for dropoffs) and is never mutated once set; the clock moves instead.
/// `pair_deadline` is the max-ride budget a not-yet-picked-up dropoff is
/// checked against.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TreeNode {
    pub loc: NodeId,
    pub owner: StopOwner,
    pub is_pickup: bool,
    /// Links a pickup to its dropoff; `u64::MAX` on the root.
    pub insert_uid: u64,
    /// On a dropoff: the paired pickup has been serviced, so feasibility
    /// switches from the pair budget to the absolute `limit`.
    pub pickup_visited: bool,

    pub time_from_parent: f64,
    pub time_from_root: f64,
    pub arrival: f64,
    pub limit: f64,
    pub pair_deadline: f64,
    /// The largest residual any root-to-leaf path through this node keeps
    /// before some limit is violated.  Maintained by the tree after every
    /// structural or clock mutation.
    pub total_slack: f64,

    /// Index into `children` of the best continuation, set by the best-path
    /// sweep.
    pub best_child: Option<usize>,
    pub parent: Option<NodeHandle>,
    pub children: Vec<NodeHandle>,
}

impl TreeNode {
    /// Residual before this node's own limit bites.  Unvisited dropoffs are
    /// bounded by ride time, not wall time, so they report infinite slack.
    pub fn slack(&self) -> f64 {
        if self.is_pickup || self.pickup_visited {
            self.limit - self.arrival
        } else {
            f64::INFINITY
        }
    }

    /// Time-window feasibility of this node in isolation.
    pub fn feasible(&self) -> bool {
        if self.is_pickup || self.pickup_visited {
            self.arrival <= self.limit
        } else {
            self.time_from_root <= self.pair_deadline
        }
    }
}

// ── Arena ─────────────────────────────────────────────────────────────────────

/// Slot storage for one tree (committed or shadow).
#[derive(Clone, Debug, PartialEq, Default)]
pub(crate) struct Arena {
    slots: Vec<Option<TreeNode>>,
    free: Vec<NodeHandle>,
}

impl Arena {
    pub fn alloc(&mut self, node: TreeNode) -> NodeHandle {
        match self.free.pop() {
            Some(h) => {
                self.slots[h.index()] = Some(node);
                h
            }
            None => {
                let h = NodeHandle(self.slots.len() as u32);
                self.slots.push(Some(node));
                h
            }
        }
    }

    #[inline]
    pub fn node(&self, h: NodeHandle) -> &TreeNode {
        self.slots[h.index()].as_ref().expect("stale tree handle")
    }

    #[inline]
    pub fn node_mut(&mut self, h: NodeHandle) -> &mut TreeNode {
        self.slots[h.index()].as_mut().expect("stale tree handle")
    }

    /// Free `h` and its entire subtree.
    pub fn free_subtree(&mut self, h: NodeHandle) {
        let mut stack = vec![h];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.slots[cur.index()].take() {
                stack.extend(node.children);
                self.free.push(cur);
            }
        }
    }

    /// Free a single slot whose children have already been re-homed.
    pub fn free_slot(&mut self, h: NodeHandle) {
        debug_assert!(
            self.slots[h.index()]
                .as_ref()
                .is_none_or(|n| n.children.is_empty()),
            "freeing a slot that still owns children"
        );
        self.slots[h.index()] = None;
        self.free.push(h);
    }

    /// Number of live nodes.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// All live descendants of `h`, excluding `h` itself.
    pub fn descendants(&self, h: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeHandle> = self.node(h).children.clone();
        while let Some(cur) = stack.pop() {
            out.push(cur);
            stack.extend_from_slice(&self.node(cur).children);
        }
        out
    }
}
