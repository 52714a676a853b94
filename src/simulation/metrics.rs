//! Read-only views of the world for observers
//!
//! Dashboards and tests pull these after a tick completes; nothing here
//! feeds back into the simulation.

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{Coord, Tick};
use crate::entity::Robot;
use crate::simulation::world::RunState;

/// Fleet-wide cumulative counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetCounters {
    /// Committed robot moves across the whole fleet
    pub total_movements: u64,
    /// Charging sessions that ended with a full battery
    pub total_recharges: u64,
}

/// One row of the metric history, recorded at the start of each step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickMetrics {
    pub tick: Tick,
    pub dirty_remaining: usize,
    /// Share of the initially dirty cells that are still dirty (0.0-1.0)
    pub dirty_fraction: f64,
    pub total_movements: u64,
    pub total_recharges: u64,
}

/// What a dashboard draws in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellTag {
    Clean = 0,
    Dirty = 1,
    Robot = 2,
}

/// Per-robot view for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotView {
    pub id: usize,
    pub position: Coord,
    pub battery: u32,
    pub movements: u64,
    pub target: Option<Coord>,
}

impl From<&Robot> for RobotView {
    fn from(robot: &Robot) -> Self {
        Self {
            id: robot.id,
            position: robot.position,
            battery: robot.battery,
            movements: robot.movements,
            target: robot.target,
        }
    }
}

/// Full observable state after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub state: RunState,
    pub width: u32,
    pub height: u32,
    /// `cells[x][y]` holds a [`CellTag`] as its numeric value
    pub cells: Vec<Vec<u8>>,
    pub dirty_remaining: usize,
    pub dirty_fraction: f64,
    pub total_movements: u64,
    pub total_recharges: u64,
    pub robots: Vec<RobotView>,
}

impl WorldSnapshot {
    pub fn tag_at(&self, pos: Coord) -> Option<CellTag> {
        let column = self.cells.get(usize::try_from(pos.x).ok()?)?;
        match column.get(usize::try_from(pos.y).ok()?)? {
            0 => Some(CellTag::Clean),
            1 => Some(CellTag::Dirty),
            2 => Some(CellTag::Robot),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn summary(&self) -> String {
        format!(
            "Tick {} ({:?}): {} dirty cells left ({:.1}%), {} moves, {} full recharges",
            self.tick,
            self.state,
            self.dirty_remaining,
            self.dirty_fraction * 100.0,
            self.total_movements,
            self.total_recharges,
        )
    }
}

/// Share of the initial dirt still on the floor
///
/// A room that started clean reports 0.0.
pub fn dirty_fraction(remaining: usize, initial: usize) -> f64 {
    if initial == 0 {
        0.0
    } else {
        remaining as f64 / initial as f64
    }
}
