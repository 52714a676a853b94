//! Simulation engine: room setup, robot policy, coordination and the tick loop

pub mod coordination;
pub mod metrics;
pub mod policy;
pub mod setup;
pub mod world;

pub use coordination::{run_coordination_pass, Assignment, CoordinationReport, HelpQueue, HelpRequest};
pub use metrics::{CellTag, FleetCounters, RobotView, TickMetrics, WorldSnapshot};
pub use policy::{nearest_charger, Decision, PolicyContext};
pub use setup::{build_room, RoomLayout};
pub use world::{RunState, RunSummary, TickReport, World};
