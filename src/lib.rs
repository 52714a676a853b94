//! Cleanbot Fleet - cooperative cleaning robot simulation
//!
//! A fleet of battery-powered robots cleans a grid room with furniture and
//! chargers. Robots that find a cluster of dirt call for help, and the world
//! hands each call to the nearest idle robot once per tick.

pub mod core;
pub mod entity;
pub mod simulation;
pub mod spatial;

pub use crate::core::config::{ChargerLayout, SimulationConfig, StartMode};
pub use crate::core::error::{CleanerError, Result};
pub use crate::core::types::Coord;
pub use crate::simulation::world::{RunState, World};
