//! Uniform Cell Grid (Broad Phase)
//!
//! A 2D uniform partition of the origin-centred world into fixed-size square
//! cells. Each cell holds the handles of every body whose world bounds
//! overlap it; proximity queries touch only the cells a region covers.
//!
//! # How It Works
//!
//! A bounds maps to a closed range of cell indices per axis
//! ([`CellRange`]); a body spanning several cells appears in each of them.
//! Queries therefore may return the same handle more than once; the tick
//! driver deduplicates with per-body tick stamps.
//!
//! # Removal Hazard
//!
//! Membership is recorded as the [`CellRange`] used at insert time and
//! removal takes that recorded range. Recomputing the range from a body's
//! *current* bounds after it moved would skip the cells it was actually
//! filed under and leave dangling handles behind.

use crate::body::BodyId;
use crate::bounds::Bounds;
use crate::math::Vec3;

/// Side length of one square cell, in world units.
pub const CELL_SIZE: f32 = 16.0;

/// Number of cells along each axis of the grid.
pub const GRID_CELLS: usize = 256;

/// Half-extent of the world; the grid spans `[-WORLD_DIM, +WORLD_DIM]` on X
/// and Y. (Z is unbounded; the grid partitions the ground plane.)
pub const WORLD_DIM: f32 = GRID_CELLS as f32 * CELL_SIZE / 2.0;

// ============================================================================
// CellRange
// ============================================================================

/// Closed, clamped range of cell indices on X and Y.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    /// First covered cell column
    pub min_x: u16,
    /// Last covered cell column (inclusive)
    pub max_x: u16,
    /// First covered cell row
    pub min_y: u16,
    /// Last covered cell row (inclusive)
    pub max_y: u16,
}

/// Map one world coordinate to a clamped cell index.
#[inline]
fn cell_index(v: f32) -> u16 {
    let idx = ((v + WORLD_DIM) / CELL_SIZE).floor();
    (idx.max(0.0) as usize).min(GRID_CELLS - 1) as u16
}

impl CellRange {
    /// Cell range covered by a point inflated by `radius`, inclusive on both
    /// ends and clamped so out-of-world queries never index out of bounds.
    pub fn from_point_radius(p: Vec3, radius: f32) -> Self {
        Self {
            min_x: cell_index(p.x - radius),
            max_x: cell_index(p.x + radius),
            min_y: cell_index(p.y - radius),
            max_y: cell_index(p.y + radius),
        }
    }

    /// Cell range covered by a world bounds.
    pub fn from_bounds(b: &Bounds) -> Self {
        Self {
            min_x: cell_index(b.min.x),
            max_x: cell_index(b.max.x),
            min_y: cell_index(b.min.y),
            max_y: cell_index(b.max.y),
        }
    }

    /// Number of cells covered.
    pub fn cell_count(&self) -> usize {
        (self.max_x - self.min_x + 1) as usize * (self.max_y - self.min_y + 1) as usize
    }

    /// Iterate over covered `(x, y)` cell coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        let (min_x, max_x) = (self.min_x, self.max_x);
        (self.min_y..=self.max_y).flat_map(move |y| (min_x..=max_x).map(move |x| (x, y)))
    }
}

// ============================================================================
// Space
// ============================================================================

/// The world's cell grid: buckets body handles for proximity queries.
///
/// The grid owns membership only; bodies themselves live in the
/// [`BodyArena`](crate::body::BodyArena).
pub struct Space {
    cells: Vec<Vec<BodyId>>,
}

impl Space {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self {
            cells: (0..GRID_CELLS * GRID_CELLS).map(|_| Vec::new()).collect(),
        }
    }

    #[inline]
    fn cell_mut(&mut self, x: u16, y: u16) -> &mut Vec<BodyId> {
        &mut self.cells[y as usize * GRID_CELLS + x as usize]
    }

    #[inline]
    fn cell(&self, x: u16, y: u16) -> &[BodyId] {
        &self.cells[y as usize * GRID_CELLS + x as usize]
    }

    /// File `id` under every cell of `range`. The caller records `range` on
    /// the body for later removal.
    pub fn insert(&mut self, id: BodyId, range: CellRange) {
        for (x, y) in range.iter() {
            self.cell_mut(x, y).push(id);
        }
    }

    /// Remove `id` from every cell of `range`, which must be the range
    /// recorded at insert time.
    pub fn remove(&mut self, id: BodyId, range: CellRange) {
        for (x, y) in range.iter() {
            let cell = self.cell_mut(x, y);
            if let Some(pos) = cell.iter().position(|&c| c == id) {
                cell.swap_remove(pos);
            }
        }
    }

    /// Move `id` from `old` to `new`. A no-op when the ranges are equal,
    /// which covers most ticks; otherwise the old range is vacated and the
    /// new range filed in full.
    pub fn update(&mut self, id: BodyId, old: CellRange, new: CellRange) {
        if old == new {
            return;
        }
        self.remove(id, old);
        self.insert(id, new);
    }

    /// Append the handles of every body filed under a cell of `range` to
    /// `out`. A body spanning several queried cells appears once per cell;
    /// callers needing exactly-once semantics deduplicate via tick stamps.
    pub fn query(&self, range: CellRange, out: &mut Vec<BodyId>) {
        for (x, y) in range.iter() {
            out.extend_from_slice(self.cell(x, y));
        }
    }

    /// Total number of cell memberships (spanning bodies counted per cell).
    pub fn membership_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
