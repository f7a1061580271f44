//! Uniform spatial grid over the network's geographic extent.
//!
//! # Why a grid and not a tree
//!
//! The matcher rebuilds the index from scratch at the top of every batch
//! (`clear` + one `insert` per in-service vehicle), so build cost dominates
//! query cost.  A flat `G × G` bucket grid rebuilds in O(fleet) with no
//! allocation churn and answers radius queries by scanning the cells whose
//! bounding box comes within range.
//!
//! # Over-approximation
//!
//! `within` returns every handle in any *cell* whose closest point to the
//! query is within the radius — so a returned vehicle may itself be slightly
//! out of range.  Callers re-filter; the kinetic-tree probe is the real
//! feasibility check.

use rp_core::{GeoPoint, VehicleId};

use crate::network::RoadNetwork;

/// Metres per degree of latitude, slightly understated so that padding
/// computed from it errs toward including extra cells.
const M_PER_DEG: f64 = 110_000.0;

/// A `dim × dim` bucket grid of vehicle handles.
#[derive(Debug)]
pub struct VehicleGrid {
    dim: usize,
    sw: GeoPoint,
    /// Cell width in degrees of longitude.
    cell_w: f64,
    /// Cell height in degrees of latitude.
    cell_h: f64,
    /// Row-major `dim * dim` buckets.
    cells: Vec<Vec<VehicleId>>,
}

impl VehicleGrid {
    /// Grid over an explicit extent.  `dim` is clamped to at least 1.
    ///
    /// A degenerate extent (all nodes at one point) degrades to a single
    /// effective cell; queries still work.
    pub fn new(dim: usize, sw: GeoPoint, ne: GeoPoint) -> Self {
        let dim = dim.max(1);
        let span_lng = (ne.lng - sw.lng).max(f64::EPSILON);
        let span_lat = (ne.lat - sw.lat).max(f64::EPSILON);
        Self {
            dim,
            sw,
            cell_w: span_lng / dim as f64,
            cell_h: span_lat / dim as f64,
            cells: vec![Vec::new(); dim * dim],
        }
    }

    /// Grid over the bounding box of `network`.  Empty networks get a unit
    /// extent at the origin.
    pub fn over_network(dim: usize, network: &RoadNetwork) -> Self {
        match network.bounding_box() {
            Some((sw, ne)) => Self::new(dim, sw, ne),
            None => Self::new(dim, GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)),
        }
    }

    /// Empty every bucket, keeping their allocations for the next batch.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Place `vehicle` in the cell containing `pos` (clamped to the extent).
    pub fn insert(&mut self, vehicle: VehicleId, pos: GeoPoint) {
        let (col, row) = self.cell_of(pos);
        self.cells[row * self.dim + col].push(vehicle);
    }

    /// All handles in any cell whose closest point to `center` lies within
    /// `radius_m` metres (great-circle).
    pub fn within(&self, radius_m: f64, center: GeoPoint) -> Vec<VehicleId> {
        if radius_m < 0.0 {
            return Vec::new();
        }

        // Conservative degree padding around the query point, then exact
        // closest-point checks per candidate cell.
        let pad_lat = radius_m / M_PER_DEG;
        let cos_lat = center.lat.to_radians().cos().abs().max(0.05);
        let pad_lng = radius_m / (M_PER_DEG * cos_lat);

        let (c0, r0) = self.cell_of(GeoPoint::new(center.lng - pad_lng, center.lat - pad_lat));
        let (c1, r1) = self.cell_of(GeoPoint::new(center.lng + pad_lng, center.lat + pad_lat));

        let mut found = Vec::new();
        for row in r0..=r1 {
            for col in c0..=c1 {
                let cell = &self.cells[row * self.dim + col];
                if cell.is_empty() {
                    continue;
                }
                // Closest point of the cell's bounding box to the query.
                let lo_lng = self.sw.lng + col as f64 * self.cell_w;
                let lo_lat = self.sw.lat + row as f64 * self.cell_h;
                let closest = GeoPoint::new(
                    center.lng.clamp(lo_lng, lo_lng + self.cell_w),
                    center.lat.clamp(lo_lat, lo_lat + self.cell_h),
                );
                if closest.distance_m(center) <= radius_m {
                    found.extend_from_slice(cell);
                }
            }
        }
        found
    }

    /// Total handles currently in the grid.
    pub fn len(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Vec::is_empty)
    }

    /// `(col, row)` of the cell containing `pos`, clamped to the extent.
    fn cell_of(&self, pos: GeoPoint) -> (usize, usize) {
        let col = ((pos.lng - self.sw.lng) / self.cell_w) as isize;
        let row = ((pos.lat - self.sw.lat) / self.cell_h) as isize;
        (
            col.clamp(0, self.dim as isize - 1) as usize,
            row.clamp(0, self.dim as isize - 1) as usize,
        )
    }
}
