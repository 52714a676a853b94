pub mod config;
pub mod error;
pub mod types;

pub use config::{ChargerLayout, SimulationConfig, StartMode};
pub use error::{CleanerError, Result};
pub use types::{Coord, EntityRef, Tick};
