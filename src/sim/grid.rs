//! Uniform spatial grid for broad-phase culling
//!
//! The world rectangle `[0, width] × [0, height]` is cut into square cells.
//! Each cell lists the indices of the balls whose center lies inside it, and
//! each ball records its cell plus its position in that list, so removal is a
//! swap-remove with no scan.
//!
//! Cells are stored column by column (`col * rows + row`) and visited in that
//! same order by the broad phase.

use glam::Vec2;

use super::body::Ball;
use crate::consts::MAX_GRID_CELLS;

/// Integer cell coordinate (`col` along x, `row` along y)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub col: u32,
    pub row: u32,
}

impl CellCoord {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// Back-reference from a ball into the grid: which cell, and where in its list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSlot {
    pub cell: CellCoord,
    pub index: u32,
}

/// Neighbor offsets visited before the current cell in storage order.
///
/// Left, up-left, up and down-left: no two are opposites, so pairing each
/// cell with these four (plus itself) reaches every adjacent cell pair exactly
/// once.
pub const HALF_NEIGHBORHOOD: [(i32, i32); 4] = [(-1, 0), (-1, -1), (0, -1), (-1, 1)];

/// Uniform grid of ball-index buckets
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    /// Cell size asked for at construction; the lower bound after any resize
    requested_cell_size: f32,
    cell_size: f32,
    cols: u32,
    rows: u32,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Create an empty grid covering `world` with square cells of at least
    /// `cell_size`
    ///
    /// Cells grow beyond `cell_size` when the world would otherwise need more
    /// than `MAX_GRID_CELLS` of them.
    pub fn new(world: Vec2, cell_size: f32) -> Self {
        let requested_cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        let cell_size = Self::fitted_cell_size(world, requested_cell_size);
        let (cols, rows) = Self::dimensions_for(world, cell_size);
        Self {
            requested_cell_size,
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cell_count(cols, rows).unwrap_or(1)],
        }
    }

    /// Smallest cell size, no smaller than `cell_size`, whose grid over
    /// `world` stays within `MAX_GRID_CELLS`
    pub fn fitted_cell_size(world: Vec2, cell_size: f32) -> f32 {
        let fits = |size: f32| {
            let (cols, rows) = Self::dimensions_for(world, size);
            cell_count(cols, rows).is_some()
        };
        if fits(cell_size) {
            return cell_size;
        }

        let area = (world.x * world.y).max(0.0);
        let mut size = cell_size
            .max((area / MAX_GRID_CELLS as f32).sqrt())
            .min(f32::MAX);
        while !fits(size) && size < f32::MAX {
            size = (size * 1.05).min(f32::MAX);
        }
        log::warn!("World {world:?} too large for cell size {cell_size}, using {size}");
        size
    }

    /// `ceil(extent / cell_size)` per axis, never less than one cell
    pub fn dimensions_for(world: Vec2, cell_size: f32) -> (u32, u32) {
        let axis = |extent: f32| {
            let n = (extent / cell_size).ceil();
            if n.is_finite() { (n as u32).max(1) } else { 1 }
        };
        (axis(world.x), axis(world.y))
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    fn flat(&self, cell: CellCoord) -> usize {
        cell.col as usize * self.rows as usize + cell.row as usize
    }

    /// Cell containing `pos`, clamped to the grid edge for positions outside
    /// the world (balls may briefly sit past a wall before containment).
    pub fn cell_for_position(&self, pos: Vec2) -> CellCoord {
        let clamp_axis =
            |v: f32, n: u32| ((v / self.cell_size).floor() as i64).clamp(0, n as i64 - 1) as u32;
        CellCoord::new(clamp_axis(pos.x, self.cols), clamp_axis(pos.y, self.rows))
    }

    /// Ball indices currently bucketed in `cell`
    pub fn cell(&self, cell: CellCoord) -> &[usize] {
        &self.cells[self.flat(cell)]
    }

    /// Cell at `cell + (dc, dr)`, or `None` past the grid edge
    pub fn offset(&self, cell: CellCoord, dc: i32, dr: i32) -> Option<CellCoord> {
        let col = cell.col.checked_add_signed(dc)?;
        let row = cell.row.checked_add_signed(dr)?;
        (col < self.cols && row < self.rows).then_some(CellCoord::new(col, row))
    }

    /// All cells in storage (and broad-phase) order
    pub fn cells_in_order(&self) -> impl Iterator<Item = CellCoord> + use<> {
        let rows = self.rows;
        (0..self.cols).flat_map(move |col| (0..rows).map(move |row| CellCoord::new(col, row)))
    }

    /// Append ball `idx` to `cell` and record the slot on the ball
    pub fn add_ball(&mut self, balls: &mut [Ball], idx: usize, cell: CellCoord) {
        debug_assert!(balls[idx].slot.is_none(), "ball {idx} is already bucketed");
        let flat = self.flat(cell);
        let list = &mut self.cells[flat];
        balls[idx].slot = Some(CellSlot {
            cell,
            index: list.len() as u32,
        });
        list.push(idx);
    }

    /// Remove ball `idx` from its cell by swap-remove. No-op if unbucketed.
    pub fn remove_ball(&mut self, balls: &mut [Ball], idx: usize) {
        let Some(slot) = balls[idx].slot.take() else {
            return;
        };
        let flat = self.flat(slot.cell);
        let list = &mut self.cells[flat];

        let at = match list.get(slot.index as usize) {
            Some(&found) if found == idx => slot.index as usize,
            _ => {
                debug_assert!(false, "ball {idx} not at its recorded slot {slot:?}");
                log::error!("grid slot for ball {idx} out of sync, rescanning cell");
                match list.iter().position(|&i| i == idx) {
                    Some(p) => p,
                    None => return,
                }
            }
        };

        list.swap_remove(at);
        if let Some(&moved) = list.get(at) {
            if let Some(moved_slot) = balls[moved].slot.as_mut() {
                moved_slot.index = at as u32;
            }
        }
    }

    /// Move ball `idx` into `cell`
    pub fn relocate(&mut self, balls: &mut [Ball], idx: usize, cell: CellCoord) {
        self.remove_ball(balls, idx);
        self.add_ball(balls, idx, cell);
    }

    /// Re-bucket ball `idx` if its position now maps to a different cell.
    /// Returns whether it moved.
    pub fn rebucket(&mut self, balls: &mut [Ball], idx: usize) -> bool {
        let target = self.cell_for_position(balls[idx].pos);
        if balls[idx].cell() == Some(target) {
            return false;
        }
        self.relocate(balls, idx, target);
        true
    }

    /// Bucket every ball from scratch
    pub fn insert_all(&mut self, balls: &mut [Ball]) {
        for list in &mut self.cells {
            list.clear();
        }
        for ball in balls.iter_mut() {
            ball.slot = None;
        }
        for idx in 0..balls.len() {
            let cell = self.cell_for_position(balls[idx].pos);
            self.add_ball(balls, idx, cell);
        }
    }

    /// Resize for a new world rectangle. Rebuckets everything and returns
    /// `true` only when the cell size or grid dimensions actually change.
    pub fn resize(&mut self, world: Vec2, balls: &mut [Ball]) -> bool {
        let cell_size = Self::fitted_cell_size(world, self.requested_cell_size);
        let (cols, rows) = Self::dimensions_for(world, cell_size);
        if cols == self.cols && rows == self.rows && cell_size == self.cell_size {
            return false;
        }
        log::info!(
            "Grid resized {}x{} -> {}x{} (cell size {})",
            self.cols,
            self.rows,
            cols,
            rows,
            cell_size
        );
        self.cell_size = cell_size;
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![Vec::new(); cell_count(cols, rows).unwrap_or(1)];
        self.insert_all(balls);
        true
    }

    /// Check that every ball is listed exactly once, in the cell and slot it
    /// records.
    pub fn validate(&self, balls: &[Ball]) -> bool {
        let listed: usize = self.cells.iter().map(Vec::len).sum();
        if listed != balls.len() {
            return false;
        }
        balls.iter().enumerate().all(|(idx, ball)| {
            ball.slot.is_some_and(|slot| {
                slot.cell.col < self.cols
                    && slot.cell.row < self.rows
                    && self.cell(slot.cell).get(slot.index as usize) == Some(&idx)
            })
        })
    }
}

/// Number of cells in a `cols × rows` grid, or `None` past `MAX_GRID_CELLS`
fn cell_count(cols: u32, rows: u32) -> Option<usize> {
    (cols as usize)
        .checked_mul(rows as usize)
        .filter(|&n| n <= MAX_GRID_CELLS)
}
