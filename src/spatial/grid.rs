//! Bounded multi-occupancy grid
//!
//! Maps every in-bounds cell to the entities standing on it. The grid does
//! pure occupancy bookkeeping and has no idea what kind of entity it holds;
//! blocking rules belong to whoever decides where entities go.

use crate::core::error::{CleanerError, Result};
use crate::core::types::Coord;

/// 2D grid where each cell holds an unordered multiset of entity references
#[derive(Debug, Clone)]
pub struct MultiGrid<E: Copy + PartialEq> {
    width: u32,
    height: u32,
    cells: Vec<Vec<E>>,
}

impl<E: Copy + PartialEq> MultiGrid<E> {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Vec::new(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, pos: Coord) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    #[inline]
    fn index(&self, pos: Coord) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Put an entity on a cell
    pub fn place(&mut self, entity: E, pos: Coord) -> Result<()> {
        let idx = self.index(pos).ok_or(CleanerError::InvalidPosition(pos))?;
        self.cells[idx].push(entity);
        Ok(())
    }

    /// Take one occurrence of an entity off a cell
    ///
    /// Returns false if the entity was not there.
    pub fn remove(&mut self, entity: E, pos: Coord) -> bool {
        let Some(idx) = self.index(pos) else {
            return false;
        };
        let cell = &mut self.cells[idx];
        match cell.iter().position(|e| *e == entity) {
            Some(i) => {
                cell.remove(i);
                true
            }
            None => false,
        }
    }

    /// Move an entity between cells
    ///
    /// The destination is checked before anything changes, so a failed move
    /// leaves the grid untouched.
    pub fn move_entity(&mut self, entity: E, from: Coord, to: Coord) -> Result<()> {
        let to_idx = self.index(to).ok_or(CleanerError::InvalidPosition(to))?;
        if !self.remove(entity, from) {
            return Err(CleanerError::InvalidPosition(from));
        }
        self.cells[to_idx].push(entity);
        Ok(())
    }

    /// Entities currently on a cell (empty outside the grid)
    pub fn contents(&self, pos: Coord) -> &[E] {
        match self.index(pos) {
            Some(idx) => &self.cells[idx],
            None => &[],
        }
    }

    /// In-bounds cells within `radius` (Chebyshev) of `pos`
    ///
    /// Enumerated row by row (`dy` outer, `dx` inner). Callers that break
    /// ties by position in this list rely on that order.
    pub fn neighbors(&self, pos: Coord, radius: i32, include_center: bool) -> Vec<Coord> {
        let mut out = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 && !include_center {
                    continue;
                }
                let cell = pos.offset(dx, dy);
                if self.in_bounds(cell) {
                    out.push(cell);
                }
            }
        }
        out
    }

    /// The 8-connected neighbourhood of `pos`
    pub fn moore_neighbors(&self, pos: Coord) -> Vec<Coord> {
        self.neighbors(pos, 1, false)
    }

    /// Every cell with its contents, column by column (`x` outer, `y` inner)
    ///
    /// Restartable: each call yields a fresh iterator over the current state.
    pub fn all_cells(&self) -> impl Iterator<Item = (Coord, &[E])> + '_ {
        (0..self.width as i32).flat_map(move |x| {
            (0..self.height as i32).map(move |y| {
                let pos = Coord::new(x, y);
                (pos, self.contents(pos))
            })
        })
    }

    /// Total number of placed entities
    pub fn entity_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }
}
