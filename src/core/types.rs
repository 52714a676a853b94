//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation tick counter
pub type Tick = u64;

/// Integer cell coordinate on the room grid
///
/// Signed so that neighbour offsets and charger offsets can be computed
/// before bounds checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two cell coordinates
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Reference to an entity stored in the world
///
/// Each variant carries the index into the world's storage for that kind.
/// The grid stores these and never looks inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Floor(usize),
    Furniture(usize),
    Charger(usize),
    Robot(usize),
}

impl EntityRef {
    pub fn is_robot(&self) -> bool {
        matches!(self, EntityRef::Robot(_))
    }

    pub fn is_floor(&self) -> bool {
        matches!(self, EntityRef::Floor(_))
    }

    pub fn is_charger(&self) -> bool {
        matches!(self, EntityRef::Charger(_))
    }

    pub fn is_furniture(&self) -> bool {
        matches!(self, EntityRef::Furniture(_))
    }
}
