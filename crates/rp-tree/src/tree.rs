//! The kinetic tree.
//!
//! One tree per vehicle.  The root is the vehicle's current position; every
//! root-to-leaf path is a time-window-feasible ordering of the vehicle's
//! outstanding pickups and dropoffs.  Inserting a request enumerates every
//! feasible augmentation of every path at once, which is what lets the
//! matcher answer "can you also take this customer, and at what detour?"
//! without re-solving a routing problem per candidate.
//!
//! # Shadow protocol
//!
//! [`tentative_insert`](KineticTree::tentative_insert) never touches the
//! committed tree: it builds a *shadow* (a deep clone plus the inserted
//! pair) and reports the shadow's best-path cost.  The caller must resolve
//! the shadow with exactly one of
//! [`commit_tentative`](KineticTree::commit_tentative) or
//! [`discard_tentative`](KineticTree::discard_tentative) before probing
//! again.
//!
//! # Time accounting
//!
//! The tree works in `f64` sim-seconds.  `advance` moves the tree's clock
//! and every node's absolute arrival estimate; deadlines (`limit`) are set
//! once at insertion and never mutated.  `step` and `move_root` re-base
//! `time_from_root` so it always equals the summed edge times from the
//! current root.

use rp_core::{CustomerId, NodeId, SimTime, Speed, VehicleId};
use rp_model::StopOwner;
use rp_spatial::DistanceOracle;

use crate::node::{Arena, NodeHandle, TreeNode};
use crate::{TreeError, TreeResult};

// ── Public request/result types ───────────────────────────────────────────────

/// The pickup–dropoff pair handed to [`KineticTree::tentative_insert`].
#[derive(Clone, Debug)]
pub struct InsertRequest {
    pub customer: CustomerId,
    pub origin: NodeId,
    pub destination: NodeId,
    /// Absolute latest boarding instant.
    pub pickup_by: SimTime,
    /// Absolute latest dropoff instant; governs the dropoff once the pickup
    /// has been serviced.
    pub dropoff_by: SimTime,
    /// Ride-time budget in seconds; governs the dropoff while its pickup is
    /// still ahead.
    pub max_ride_secs: i64,
}

/// One element of a best-path walk: who is served where, and on which side
/// of the ride.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathStop {
    pub owner: StopOwner,
    pub loc: NodeId,
    pub is_pickup: bool,
}

// ── Shadow ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
struct Shadow {
    arena: Arena,
    cost: f64,
}

// ── KineticTree ───────────────────────────────────────────────────────────────

/// Branching schedule tree for one vehicle.  See the module docs.
#[derive(Clone, Debug, PartialEq)]
pub struct KineticTree {
    arena: Arena,
    root: NodeHandle,
    /// Absolute sim-seconds at the root ("now" as far as arrivals go).
    clock: f64,
    /// Final destination; `None` = taxi mode (leaves contribute no terminal
    /// cost).
    dest: Option<NodeId>,
    vehicle: VehicleId,
    /// Pair IDs are consumed on commit only, so a discarded tentative leaves
    /// the tree bit-for-bit unchanged.
    next_uid: u64,
    shadow: Option<Shadow>,
}

impl KineticTree {
    /// An empty tree: a single root at `origin`.
    pub fn new(vehicle: VehicleId, origin: NodeId, dest: Option<NodeId>, now: SimTime) -> Self {
        let clock = now.as_secs_f64();
        let mut arena = Arena::default();
        let root = arena.alloc(TreeNode {
            loc: origin,
            owner: StopOwner::Vehicle(vehicle),
            is_pickup: true,
            insert_uid: u64::MAX,
            pickup_visited: false,
            time_from_parent: 0.0,
            time_from_root: 0.0,
            arrival: clock,
            limit: f64::INFINITY,
            pair_deadline: f64::INFINITY,
            total_slack: f64::INFINITY,
            best_child: None,
            parent: None,
            children: Vec::new(),
        });
        Self {
            arena,
            root,
            clock,
            dest,
            vehicle,
            next_uid: 0,
            shadow: None,
        }
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn vehicle(&self) -> VehicleId {
        self.vehicle
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.dest
    }

    pub fn root_location(&self) -> NodeId {
        self.arena.node(self.root).loc
    }

    /// Live nodes in the committed tree (root included).
    pub fn node_count(&self) -> usize {
        self.arena.live_count()
    }

    /// Location of the best path's next stop, or `None` for an empty tree.
    pub fn next(&self) -> Option<NodeId> {
        let root = self.arena.node(self.root);
        let idx = root.best_child?;
        let child = *root.children.get(idx)?;
        Some(self.arena.node(child).loc)
    }

    pub fn has_shadow(&self) -> bool {
        self.shadow.is_some()
    }

    /// Best-path cost of the outstanding shadow, if any.
    pub fn tentative_cost(&self) -> Option<f64> {
        self.shadow.as_ref().map(|s| s.cost)
    }

    // ── Clock motion ──────────────────────────────────────────────────────

    /// Advance the tree's wall clock by `elapsed_secs`.
    ///
    /// Every node's absolute arrival estimate shifts with the clock; limits
    /// stay put, so feasibility tightens as time passes.
    pub fn advance(&mut self, elapsed_secs: f64) {
        self.advance_inner(elapsed_secs, None);
    }

    /// [`advance`](Self::advance), additionally recording that `picked_up`
    /// has boarded: their dropoff switches from the ride-time budget to the
    /// absolute dropoff deadline.
    pub fn advance_with_pair(&mut self, elapsed_secs: f64, picked_up: CustomerId) {
        self.advance_inner(elapsed_secs, Some(picked_up));
    }

    fn advance_inner(&mut self, elapsed_secs: f64, picked_up: Option<CustomerId>) {
        if elapsed_secs < 0.0 {
            return;
        }
        self.clock += elapsed_secs;
        let everyone = self.arena.descendants(self.root);
        self.arena.node_mut(self.root).arrival += elapsed_secs;
        for h in everyone {
            let node = self.arena.node_mut(h);
            node.arrival += elapsed_secs;
            if let Some(cust) = picked_up {
                if !node.is_pickup && node.owner == StopOwner::Customer(cust) {
                    node.pickup_visited = true;
                }
            }
        }
        self.refresh_slack();
    }

    /// Replace the root's location (the vehicle reached or re-targeted its
    /// next node) and refresh the root-to-child edge times so
    /// `time_from_root` stays the true edge sum.
    pub fn move_root<O: DistanceOracle + ?Sized>(
        &mut self,
        loc: NodeId,
        oracle: &O,
        speed: Speed,
    ) -> TreeResult<()> {
        if self.arena.node(self.root).loc == loc {
            return Ok(());
        }
        self.arena.node_mut(self.root).loc = loc;
        let children = self.arena.node(self.root).children.clone();
        for child in children {
            let child_loc = self.arena.node(child).loc;
            let new_edge = travel(oracle, speed, loc, child_loc)?;
            let delta = new_edge - self.arena.node(child).time_from_parent;
            if delta != 0.0 {
                self.arena.node_mut(child).time_from_parent = new_edge;
                self.shift_subtree(child, delta);
            }
        }
        self.refresh_slack();
        Ok(())
    }

    /// Promote the root's best child to be the new root, discarding every
    /// sibling (their orderings are no longer reachable).  Returns `true`
    /// iff the promoted stop was a dropoff.
    ///
    /// No-op returning `false` on an empty tree.
    pub fn step(&mut self) -> bool {
        let root_node = self.arena.node(self.root);
        let Some(best_idx) = root_node.best_child else {
            return false;
        };
        let children = root_node.children.clone();
        let Some(&promoted) = children.get(best_idx) else {
            return false;
        };

        for (i, &child) in children.iter().enumerate() {
            if i != best_idx {
                self.arena.free_subtree(child);
            }
        }

        let promoted_node = self.arena.node(promoted).clone();
        for &grandchild in &promoted_node.children {
            self.arena.node_mut(grandchild).parent = Some(self.root);
        }
        {
            let root_mut = self.arena.node_mut(self.root);
            root_mut.children = promoted_node.children.clone();
            root_mut.best_child = promoted_node.best_child;
        }
        self.arena.node_mut(promoted).children.clear();
        self.arena.free_slot(promoted);

        // Re-base: the promoted edge is now behind the root.
        let edge = promoted_node.time_from_parent;
        if edge != 0.0 {
            for h in self.arena.descendants(self.root) {
                let node = self.arena.node_mut(h);
                node.time_from_root -= edge;
                node.arrival -= edge;
            }
        }

        if promoted_node.is_pickup {
            self.mark_pair_visited(promoted_node.insert_uid);
        }
        self.refresh_slack();
        !promoted_node.is_pickup
    }

    // ── Tentative insertion ───────────────────────────────────────────────

    /// Build a shadow containing the committed structure augmented with
    /// `req`'s pickup–dropoff pair at every feasible position.
    ///
    /// Returns the shadow's minimum root-to-leaf cost in seconds, or
    /// `Ok(None)` when no feasible augmentation exists (in which case no
    /// shadow is left behind).  A returned `Ok(Some(_))` must be resolved
    /// with `commit_tentative` or `discard_tentative`.
    pub fn tentative_insert<O: DistanceOracle + ?Sized>(
        &mut self,
        req: &InsertRequest,
        oracle: &O,
        speed: Speed,
    ) -> TreeResult<Option<f64>> {
        if self.shadow.is_some() {
            return Err(TreeError::ShadowOutstanding);
        }

        let owner = StopOwner::Customer(req.customer);
        let uid = self.next_uid;
        let pending = [
            PendingStop {
                loc: req.origin,
                owner,
                is_pickup: true,
                uid,
                limit: req.pickup_by.as_secs_f64(),
                pair_deadline: f64::INFINITY,
            },
            PendingStop {
                loc: req.destination,
                owner,
                is_pickup: false,
                uid,
                limit: req.dropoff_by.as_secs_f64(),
                pair_deadline: req.max_ride_secs as f64,
            },
        ];

        let mut shadow = self.arena.clone();
        let ctx = TreeCtx { speed, clock: self.clock, dest: self.dest };

        if !insert_pending(&mut shadow, self.root, &pending, oracle, &ctx)? {
            return Ok(None);
        }

        let cost = best_time(&mut shadow, self.root, oracle, &ctx)?;
        compute_total_slack(&mut shadow, self.root);
        self.shadow = Some(Shadow { arena: shadow, cost });
        Ok(Some(cost))
    }

    /// Replace the committed tree with the shadow.
    pub fn commit_tentative(&mut self) -> TreeResult<()> {
        let shadow = self.shadow.take().ok_or(TreeError::NoShadow)?;
        self.arena = shadow.arena;
        self.next_uid += 1;
        Ok(())
    }

    /// Drop the shadow, leaving the committed tree exactly as it was.
    pub fn discard_tentative(&mut self) {
        self.shadow = None;
    }

    // ── Best-path queries ─────────────────────────────────────────────────

    /// Best-path completion cost of the committed tree in seconds,
    /// refreshing every node's best-child marker.
    pub fn best_cost<O: DistanceOracle + ?Sized>(
        &mut self,
        oracle: &O,
        speed: Speed,
    ) -> TreeResult<f64> {
        let ctx = TreeCtx { speed, clock: self.clock, dest: self.dest };
        best_time(&mut self.arena, self.root, oracle, &ctx)
    }

    /// The committed best root-to-leaf path, root included.
    pub fn ordered_stop_sequence(&self) -> Vec<PathStop> {
        walk_best_path(&self.arena, self.root)
    }

    /// The shadow's best root-to-leaf path, root included.
    pub fn tentative_stop_sequence(&self) -> TreeResult<Vec<PathStop>> {
        let shadow = self.shadow.as_ref().ok_or(TreeError::NoShadow)?;
        Ok(walk_best_path(&shadow.arena, self.root))
    }

    // ── Internal helpers ──────────────────────────────────────────────────

    /// Add `delta` seconds to `time_from_root`/`arrival` of `h` and its
    /// whole subtree.
    fn shift_subtree(&mut self, h: NodeHandle, delta: f64) {
        let node = self.arena.node_mut(h);
        node.time_from_root += delta;
        node.arrival += delta;
        for child in self.arena.node(h).children.clone() {
            self.shift_subtree(child, delta);
        }
    }

    fn mark_pair_visited(&mut self, uid: u64) {
        for h in self.arena.descendants(self.root) {
            let node = self.arena.node_mut(h);
            if node.insert_uid == uid && !node.is_pickup {
                node.pickup_visited = true;
            }
        }
    }

    fn refresh_slack(&mut self) {
        compute_total_slack(&mut self.arena, self.root);
    }
}

// ── Insertion machinery ───────────────────────────────────────────────────────

/// Per-operation context threaded through the recursive helpers.
struct TreeCtx {
    speed: Speed,
    clock: f64,
    dest: Option<NodeId>,
}

/// A stop awaiting insertion (the pickup, then its dropoff).
struct PendingStop {
    loc: NodeId,
    owner: StopOwner,
    is_pickup: bool,
    uid: u64,
    limit: f64,
    pair_deadline: f64,
}

fn travel<O: DistanceOracle + ?Sized>(
    oracle: &O,
    speed: Speed,
    from: NodeId,
    to: NodeId,
) -> TreeResult<f64> {
    Ok(speed.travel_secs(oracle.distance_m(from, to)?))
}

/// Insert `pending[0]` at every feasible position within the subtree rooted
/// at `n`, recursively carrying the rest of `pending` into each materialised
/// position.  Returns `false` when no path through `n` can serve the whole
/// pending list; the caller must then drop `n`'s subtree.
fn insert_pending<O: DistanceOracle + ?Sized>(
    arena: &mut Arena,
    n: NodeHandle,
    pending: &[PendingStop],
    oracle: &O,
    ctx: &TreeCtx,
) -> TreeResult<bool> {
    let Some(first) = pending.first() else {
        return Ok(true);
    };

    // Position "first directly under n".  If even this is infeasible, no
    // deeper position can work either — edge sums only grow — so the whole
    // subtree is a dead end for this request.
    let Some(inserted) = attach_pending(arena, n, first, oracle, ctx)? else {
        return Ok(false);
    };

    let original: Vec<NodeHandle> = arena.node(n).children.clone();
    let mut position_ok = true;

    // Fast prune: when no existing branch retains enough slack to absorb
    // the detour through `first`, skip the copy work for this position.
    // Deeper positions are still explored below.
    if !original.is_empty() && !check_slack(arena, n, first.loc, oracle, ctx)? {
        position_ok = false;
    }

    if position_ok {
        // Re-route n's current branches through the inserted stop.
        let mut any_copy_failed = false;
        for &child in &original {
            if !copy_subtree_under(arena, inserted, child, oracle, ctx)? {
                any_copy_failed = true;
            }
        }
        if any_copy_failed && arena.node(inserted).children.is_empty() {
            position_ok = false;
        }
    }

    // Place the rest of the pair (the dropoff) within the new subtree.
    if position_ok && pending.len() > 1 {
        position_ok = insert_pending(arena, inserted, &pending[1..], oracle, ctx)?;
    }

    // Deeper positions: every original branch tries the full pending list.
    let mut surviving = Vec::with_capacity(original.len() + 1);
    for &child in &original {
        if insert_pending(arena, child, pending, oracle, ctx)? {
            surviving.push(child);
        } else {
            arena.free_subtree(child);
        }
    }

    // Inserted branch first: on equal best-path cost the tie-break prefers
    // the lowest child index, which makes the shallowest position win.
    let mut children = Vec::with_capacity(surviving.len() + 1);
    if position_ok {
        children.push(inserted);
    } else {
        arena.free_subtree(inserted);
    }
    children.extend(surviving);

    let viable = !children.is_empty();
    arena.node_mut(n).children = children;
    Ok(viable)
}

/// Materialise `p` as a (detached) child of `parent`, or `None` when the
/// position is time-window infeasible.
fn attach_pending<O: DistanceOracle + ?Sized>(
    arena: &mut Arena,
    parent: NodeHandle,
    p: &PendingStop,
    oracle: &O,
    ctx: &TreeCtx,
) -> TreeResult<Option<NodeHandle>> {
    let (parent_loc, parent_tfr) = {
        let node = arena.node(parent);
        (node.loc, node.time_from_root)
    };
    let edge = travel(oracle, ctx.speed, parent_loc, p.loc)?;
    let time_from_root = parent_tfr + edge;
    let arrival = ctx.clock + time_from_root;

    let feasible = if p.is_pickup {
        arrival <= p.limit
    } else {
        time_from_root <= p.pair_deadline
    };
    if !feasible {
        return Ok(None);
    }

    Ok(Some(arena.alloc(TreeNode {
        loc: p.loc,
        owner: p.owner,
        is_pickup: p.is_pickup,
        insert_uid: p.uid,
        pickup_visited: false,
        time_from_parent: edge,
        time_from_root,
        arrival,
        limit: p.limit,
        pair_deadline: p.pair_deadline,
        total_slack: 0.0,
        best_child: None,
        parent: Some(parent),
        children: Vec::new(),
    })))
}

/// Copy the subtree rooted at `src` underneath `new_parent`, re-deriving
/// edge times for the new routing and pruning branches that turn
/// infeasible.  Returns `false` when nothing of `src`'s subtree survives.
fn copy_subtree_under<O: DistanceOracle + ?Sized>(
    arena: &mut Arena,
    new_parent: NodeHandle,
    src: NodeHandle,
    oracle: &O,
    ctx: &TreeCtx,
) -> TreeResult<bool> {
    let src_node = arena.node(src).clone();
    let (parent_loc, parent_tfr) = {
        let node = arena.node(new_parent);
        (node.loc, node.time_from_root)
    };

    let edge = travel(oracle, ctx.speed, parent_loc, src_node.loc)?;
    let copy = TreeNode {
        time_from_parent: edge,
        time_from_root: parent_tfr + edge,
        arrival: ctx.clock + parent_tfr + edge,
        parent: Some(new_parent),
        children: Vec::new(),
        best_child: None,
        ..src_node.clone()
    };
    if !copy.feasible() {
        return Ok(false);
    }

    let handle = arena.alloc(copy);
    let mut any_failed = false;
    for &child in &src_node.children {
        if !copy_subtree_under(arena, handle, child, oracle, ctx)? {
            any_failed = true;
        }
    }
    if any_failed && arena.node(handle).children.is_empty() {
        arena.free_subtree(handle);
        return Ok(false);
    }

    arena.node_mut(new_parent).children.push(handle);
    Ok(true)
}

/// `true` when at least one existing child of `n` retains enough slack to
/// absorb the detour `n → loc → child`.
fn check_slack<O: DistanceOracle + ?Sized>(
    arena: &Arena,
    n: NodeHandle,
    loc: NodeId,
    oracle: &O,
    ctx: &TreeCtx,
) -> TreeResult<bool> {
    let node = arena.node(n);
    let to_new = travel(oracle, ctx.speed, node.loc, loc)?;
    for &child in &node.children {
        let child_node = arena.node(child);
        let detour =
            to_new + travel(oracle, ctx.speed, loc, child_node.loc)? - child_node.time_from_parent;
        if child_node.total_slack > detour {
            return Ok(true);
        }
    }
    Ok(false)
}

// ── Best-path sweep ───────────────────────────────────────────────────────────

/// DFS returning the minimum completion time from `h` to any leaf (plus the
/// leaf-to-destination term), storing the argmin child index along the way.
/// Ties resolve to the lowest child index.
fn best_time<O: DistanceOracle + ?Sized>(
    arena: &mut Arena,
    h: NodeHandle,
    oracle: &O,
    ctx: &TreeCtx,
) -> TreeResult<f64> {
    let children = arena.node(h).children.clone();
    if children.is_empty() {
        arena.node_mut(h).best_child = None;
        return match ctx.dest {
            None => Ok(0.0),
            Some(dest) => travel(oracle, ctx.speed, arena.node(h).loc, dest),
        };
    }

    let mut best = f64::INFINITY;
    let mut best_idx = None;
    for (i, &child) in children.iter().enumerate() {
        let through = best_time(arena, child, oracle, ctx)? + arena.node(child).time_from_parent;
        if through < best {
            best = through;
            best_idx = Some(i);
        }
    }
    arena.node_mut(h).best_child = best_idx;
    Ok(best)
}

/// Post-order slack recomputation (see [`TreeNode::total_slack`]).
fn compute_total_slack(arena: &mut Arena, h: NodeHandle) -> f64 {
    let children = arena.node(h).children.clone();
    let own = arena.node(h).slack();
    let total = if children.is_empty() {
        own
    } else {
        let mut best_child_slack = f64::NEG_INFINITY;
        for child in children {
            best_child_slack = best_child_slack.max(compute_total_slack(arena, child));
        }
        own.min(best_child_slack)
    };
    arena.node_mut(h).total_slack = total;
    total
}

fn walk_best_path(arena: &Arena, root: NodeHandle) -> Vec<PathStop> {
    let mut out = Vec::new();
    let mut cur = root;
    loop {
        let node = arena.node(cur);
        out.push(PathStop { owner: node.owner, loc: node.loc, is_pickup: node.is_pickup });
        match node.best_child.and_then(|i| node.children.get(i)) {
            Some(&next) => cur = next,
            None => break,
        }
    }
    out
}
