//! Cleaning robot agent state

use serde::{Deserialize, Serialize};

use crate::core::config::BATTERY_MAX;
use crate::core::types::Coord;

/// A mobile cleaning robot
///
/// The decision logic lives in `simulation::policy`; this type only holds
/// the state the policy reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    pub id: usize,
    pub position: Coord,
    /// Where the current decision wants to go; committed by `advance`
    pub next_position: Coord,
    /// Charge level, always within `0..=BATTERY_MAX`
    pub battery: u32,
    /// Committed moves made by this robot
    pub movements: u64,
    /// Assigned destination: a charger or a help request location
    pub target: Option<Coord>,
    /// Dirty neighbours seen at the last cleaning decision, minus the one cleaned
    pub local_dirty: usize,
}

impl Robot {
    pub fn new(id: usize, position: Coord) -> Self {
        Self {
            id,
            position,
            next_position: position,
            battery: BATTERY_MAX,
            movements: 0,
            target: None,
            local_dirty: 0,
        }
    }

    /// Handshake half of the coordination pass
    ///
    /// A robot takes the request only when it has no dirt of its own to deal
    /// with and nowhere else to be. Accepting makes the location its target.
    pub fn accept_request(&mut self, location: Coord) -> bool {
        if self.local_dirty > 0 || self.target.is_some() {
            return false;
        }
        self.target = Some(location);
        true
    }

    pub fn is_full(&self) -> bool {
        self.battery >= BATTERY_MAX
    }

    pub fn can_move(&self) -> bool {
        self.battery > 0
    }
}
