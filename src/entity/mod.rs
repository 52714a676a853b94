//! Entities that live on the room grid
//!
//! Floor cells, furniture and chargers are plain records; robots carry the
//! mutable agent state and live in [`robot`].

pub mod robot;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::types::Coord;

pub use robot::Robot;

/// Walkable floor carrying the dirt flag
///
/// Every cell that holds neither furniture nor a charger has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorCell {
    pub position: Coord,
    pub dirty: bool,
}

impl FloorCell {
    pub fn new(position: Coord, dirty: bool) -> Self {
        Self { position, dirty }
    }

    /// Clear the dirt flag, returning whether it was dirty
    pub fn clean(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

/// Static obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Furniture {
    pub position: Coord,
}

/// Static charging station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charger {
    pub position: Coord,
}

/// Charger locations known to every robot
///
/// Keeps the original list order (nearest-charger ties go to the earlier
/// entry) alongside a set for membership checks.
#[derive(Debug, Clone, Default)]
pub struct ChargerRegistry {
    positions: Vec<Coord>,
    lookup: AHashSet<Coord>,
}

impl ChargerRegistry {
    pub fn new(positions: Vec<Coord>) -> Self {
        let lookup = positions.iter().copied().collect();
        Self { positions, lookup }
    }

    pub fn positions(&self) -> &[Coord] {
        &self.positions
    }

    #[inline]
    pub fn contains(&self, pos: Coord) -> bool {
        self.lookup.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
