//! Simulation configuration with documented constants
//!
//! All policy magic numbers are collected here with a note on what they
//! drive. The room parameters themselves live in [`SimulationConfig`], which
//! can be built in code or loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{CleanerError, Result};
use crate::core::types::Coord;

// === ROBOT POLICY ===

/// Full battery charge
pub const BATTERY_MAX: u32 = 100;

/// Charge gained per tick spent on a charger (clamped to `BATTERY_MAX`)
///
/// An empty robot needs 4 ticks to fill up.
pub const CHARGE_PER_TICK: u32 = 25;

/// At or below this charge an idle robot heads for the nearest charger
pub const LOW_BATTERY_THRESHOLD: u32 = 30;

/// Number of dirty neighbours at which a robot asks the fleet for help
pub const CLUSTER_THRESHOLD: usize = 4;

/// Severity assigned to help requests raised by the world's dirt sampling
pub const SAMPLED_REQUEST_SEVERITY: usize = 1;

/// Shared start cell for [`StartMode::Fixed`]
///
/// Never receives furniture.
pub const FIXED_START: Coord = Coord::new(1, 1);

/// Offset of the standard layout's anchor charger from the grid midpoint
pub const STANDARD_CHARGER_SHIFT: i32 = 5;

/// Spacing between chargers in the standard layout
pub const STANDARD_CHARGER_SPACING: i32 = 11;

// === RECOMMENDED RANGES ===
//
// These are the ranges a control panel should offer. They are not enforced
// by `validate` so that tiny scenarios stay constructible.

pub const RECOMMENDED_ROBOTS: (usize, usize) = (2, 20);
pub const RECOMMENDED_MAX_DIRTY_FRACTION: f64 = 0.70;
pub const RECOMMENDED_MAX_FURNITURE_FRACTION: f64 = 0.20;

/// How robots are placed when the world is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartMode {
    /// Every robot starts on [`FIXED_START`]
    #[default]
    Fixed,
    /// Each robot gets a distinct random floor cell
    Random,
}

/// Where chargers go
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChargerLayout {
    /// Four chargers: one at `(W/2 + 5, H/2 + 5)` and three more at
    /// offsets `(-11, 0)`, `(0, -11)` and `(-11, -11)` from it
    #[default]
    Standard,
    /// Chargers at exactly these coordinates
    Explicit { positions: Vec<Coord> },
}

impl ChargerLayout {
    /// Charger coordinates for a grid of the given size
    ///
    /// Coordinates are not bounds checked here; see [`SimulationConfig::validate`].
    pub fn positions(&self, width: u32, height: u32) -> Vec<Coord> {
        match self {
            ChargerLayout::Standard => {
                let center = Coord::new(
                    (width / 2) as i32 + STANDARD_CHARGER_SHIFT,
                    (height / 2) as i32 + STANDARD_CHARGER_SHIFT,
                );
                let s = STANDARD_CHARGER_SPACING;
                vec![
                    center,
                    center.offset(-s, 0),
                    center.offset(0, -s),
                    center.offset(-s, -s),
                ]
            }
            ChargerLayout::Explicit { positions } => positions.clone(),
        }
    }
}

/// Parameters of one simulated room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid width (M)
    pub width: u32,
    /// Grid height (N)
    pub height: u32,
    /// Number of robots in the fleet
    pub num_robots: usize,
    /// Fraction of all grid cells that start dirty
    ///
    /// The dirt count is `floor(width * height * dirty_fraction)`, sampled
    /// from floor cells only.
    pub dirty_fraction: f64,
    /// Fraction of all grid cells covered by furniture
    pub furniture_fraction: f64,
    pub start_mode: StartMode,
    pub chargers: ChargerLayout,
    /// Seed for the world's random source
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            num_robots: 5,
            dirty_fraction: 0.3,
            furniture_fraction: 0.1,
            start_mode: StartMode::Fixed,
            chargers: ChargerLayout::Standard,
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a room config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn total_cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of cells that start dirty
    pub fn dirty_count(&self) -> usize {
        (self.total_cells() as f64 * self.dirty_fraction).floor() as usize
    }

    /// Number of cells that receive furniture
    pub fn furniture_count(&self) -> usize {
        (self.total_cells() as f64 * self.furniture_fraction).floor() as usize
    }

    pub fn charger_positions(&self) -> Vec<Coord> {
        self.chargers.positions(self.width, self.height)
    }

    pub fn in_bounds(&self, pos: Coord) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Validate configuration for internal consistency
    ///
    /// Oversubscription (more dirt, furniture or random starts than free
    /// cells) is only detectable while sampling and is reported by world
    /// setup.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CleanerError::Configuration(format!(
                "grid must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }

        if self.num_robots == 0 {
            return Err(CleanerError::Configuration("num_robots must be at least 1".into()));
        }

        for (name, value) in [
            ("dirty_fraction", self.dirty_fraction),
            ("furniture_fraction", self.furniture_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CleanerError::Configuration(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.start_mode == StartMode::Fixed && !self.in_bounds(FIXED_START) {
            return Err(CleanerError::Configuration(format!(
                "fixed start {} lies outside a {}x{} grid",
                FIXED_START, self.width, self.height
            )));
        }

        let chargers = self.charger_positions();
        if chargers.is_empty() {
            return Err(CleanerError::EmptyChargerList);
        }
        for (i, pos) in chargers.iter().enumerate() {
            if !self.in_bounds(*pos) {
                return Err(CleanerError::Configuration(format!(
                    "charger {} at {} lies outside a {}x{} grid",
                    i, pos, self.width, self.height
                )));
            }
            if chargers[..i].contains(pos) {
                return Err(CleanerError::Configuration(format!(
                    "duplicate charger at {}",
                    pos
                )));
            }
        }

        Ok(())
    }
}
