//! World - owns the room and drives the tick loop
//!
//! Per tick:
//! 1. record metrics
//! 2. stop if the room is clean
//! 3. activate every robot once, in a fresh random order
//! 4. sample dirty cells into help requests
//! 5. run the coordination pass
//! 6. advance the tick counter

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::{SimulationConfig, SAMPLED_REQUEST_SEVERITY};
use crate::core::error::{CleanerError, Result};
use crate::core::types::{Coord, EntityRef, Tick};
use crate::entity::{Charger, ChargerRegistry, FloorCell, Furniture, Robot};
use crate::simulation::coordination::{run_coordination_pass, HelpQueue, HelpRequest};
use crate::simulation::metrics::{
    dirty_fraction, CellTag, FleetCounters, RobotView, TickMetrics, WorldSnapshot,
};
use crate::simulation::policy::{self, Decision, PolicyContext};
use crate::simulation::setup::build_room;
use crate::spatial::MultiGrid;

/// Whether the tick loop still has work to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    /// Every floor cell is clean; further steps are no-ops
    Stopped,
}

/// What happened during one call to [`World::step`]
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Tick number after the step
    pub tick: Tick,
    pub state: RunState,
    /// Each robot's decision, in activation order
    pub decisions: Vec<(usize, Decision)>,
    pub requests_offered: usize,
    pub requests_assigned: usize,
    pub dirty_remaining: usize,
}

/// Result of [`World::run`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: Tick,
    pub state: RunState,
    pub dirty_remaining: usize,
    pub total_movements: u64,
    pub total_recharges: u64,
}

/// The simulated room and its robot fleet
pub struct World {
    config: SimulationConfig,
    grid: MultiGrid<EntityRef>,
    floors: Vec<FloorCell>,
    furniture: Vec<Furniture>,
    chargers: Vec<Charger>,
    registry: ChargerRegistry,
    robots: Vec<Robot>,
    help_queue: HelpQueue,
    counters: FleetCounters,
    current_tick: Tick,
    state: RunState,
    fully_clean: bool,
    initial_dirty: usize,
    history: Vec<TickMetrics>,
    /// Random number generator (deterministic)
    rng: ChaCha8Rng,
}

impl World {
    /// Build a room from `config`, seeding the world's RNG from `config.seed`
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let room = build_room(&config, &mut rng)?;

        tracing::info!(
            "Built {}x{} room: {} robots, {} chargers, {} furniture, {} dirty cells",
            config.width,
            config.height,
            room.robots.len(),
            room.chargers.len(),
            room.furniture.len(),
            room.initial_dirty
        );

        let fully_clean = room.initial_dirty == 0;
        Ok(Self {
            config,
            grid: room.grid,
            floors: room.floors,
            furniture: room.furniture,
            chargers: room.chargers,
            registry: room.registry,
            robots: room.robots,
            help_queue: HelpQueue::new(),
            counters: FleetCounters::default(),
            current_tick: 0,
            state: RunState::Running,
            fully_clean,
            initial_dirty: room.initial_dirty,
            history: Vec::new(),
            rng,
        })
    }

    /// Advance the simulation by one tick
    ///
    /// Once stopped, further calls only record metrics.
    pub fn step(&mut self) -> Result<TickReport> {
        let metrics = self.metrics();
        self.history.push(metrics);

        if self.state == RunState::Stopped || self.is_room_clean() {
            if self.state == RunState::Running {
                tracing::info!(
                    "Room clean after {} ticks: {} moves, {} full recharges",
                    self.current_tick,
                    self.counters.total_movements,
                    self.counters.total_recharges
                );
            }
            self.state = RunState::Stopped;
            self.fully_clean = true;
            return Ok(TickReport {
                tick: self.current_tick,
                state: self.state,
                decisions: Vec::new(),
                requests_offered: 0,
                requests_assigned: 0,
                dirty_remaining: 0,
            });
        }

        let mut order: Vec<usize> = (0..self.robots.len()).collect();
        order.shuffle(&mut self.rng);
        let mut decisions = Vec::with_capacity(order.len());
        for idx in order {
            decisions.push((idx, self.activate(idx)?));
        }

        self.sample_dirt_requests();
        let requests_offered = self.help_queue.len();
        let ranking = self.robots_in_scan_order();
        let report = run_coordination_pass(&mut self.help_queue, &mut self.robots, ranking);

        self.current_tick += 1;
        let dirty_remaining = self.dirty_count();
        if dirty_remaining == 0 {
            self.fully_clean = true;
        }

        tracing::debug!(
            "Tick {}: {} dirty left, {} requests, {} assigned",
            self.current_tick,
            dirty_remaining,
            requests_offered,
            report.assignments.len()
        );

        Ok(TickReport {
            tick: self.current_tick,
            state: self.state,
            decisions,
            requests_offered,
            requests_assigned: report.assignments.len(),
            dirty_remaining,
        })
    }

    /// Step until the room is clean or `max_ticks` steps have run
    pub fn run(&mut self, max_ticks: u64) -> Result<RunSummary> {
        let mut steps = 0;
        while self.state == RunState::Running && steps < max_ticks {
            self.step()?;
            steps += 1;
        }
        Ok(self.summary())
    }

    /// One robot's decision and commit
    fn activate(&mut self, idx: usize) -> Result<Decision> {
        let mut ctx = PolicyContext {
            grid: &mut self.grid,
            floors: &mut self.floors,
            chargers: &self.registry,
            requests: &mut self.help_queue,
            counters: &mut self.counters,
            rng: &mut self.rng,
        };
        policy::step(&mut self.robots[idx], &mut ctx)
    }

    /// Queue a severity-1 request for up to `num_robots` random dirty cells
    fn sample_dirt_requests(&mut self) {
        let dirty = self.dirty_cells();
        let k = dirty.len().min(self.config.num_robots);
        for pos in dirty.choose_multiple(&mut self.rng, k) {
            self.help_queue.push(HelpRequest::new(SAMPLED_REQUEST_SEVERITY, *pos));
        }
    }

    /// Robot indices in grid scan order, the starting ranking for coordination
    fn robots_in_scan_order(&self) -> Vec<usize> {
        self.grid
            .all_cells()
            .flat_map(|(_, contents)| contents.iter())
            .filter_map(|entity| match entity {
                EntityRef::Robot(idx) => Some(*idx),
                _ => None,
            })
            .collect()
    }

    /// Add a help request to this tick's queue
    pub fn request_help(&mut self, severity: usize, location: Coord) {
        self.help_queue.push(HelpRequest::new(severity, location));
    }

    /// Move a robot directly to a cell, bypassing the policy
    ///
    /// For scenario setup. The robot keeps its battery and counters.
    pub fn relocate_robot(&mut self, idx: usize, pos: Coord) -> Result<()> {
        let robot = self.robots.get_mut(idx).ok_or_else(|| {
            CleanerError::Configuration(format!("no robot with index {}", idx))
        })?;
        self.grid.move_entity(EntityRef::Robot(idx), robot.position, pos)?;
        robot.position = pos;
        robot.next_position = pos;
        Ok(())
    }

    // === QUERIES ===

    pub fn is_room_clean(&self) -> bool {
        !self.floors.iter().any(|f| f.dirty)
    }

    pub fn dirty_count(&self) -> usize {
        self.floors.iter().filter(|f| f.dirty).count()
    }

    /// Dirty cell positions in grid scan order
    pub fn dirty_cells(&self) -> Vec<Coord> {
        self.grid
            .all_cells()
            .filter(|(_, contents)| {
                contents.iter().any(|e| matches!(e, EntityRef::Floor(i) if self.floors[*i].dirty))
            })
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn floor_at(&self, pos: Coord) -> Option<&FloorCell> {
        self.grid.contents(pos).iter().find_map(|e| match e {
            EntityRef::Floor(i) => self.floors.get(*i),
            _ => None,
        })
    }

    pub fn metrics(&self) -> TickMetrics {
        let dirty_remaining = self.dirty_count();
        TickMetrics {
            tick: self.current_tick,
            dirty_remaining,
            dirty_fraction: dirty_fraction(dirty_remaining, self.initial_dirty),
            total_movements: self.counters.total_movements,
            total_recharges: self.counters.total_recharges,
        }
    }

    /// Cell tags, robot views and counters for display
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut cells = vec![vec![CellTag::Clean as u8; self.grid.height() as usize]; self.grid.width() as usize];
        for (pos, contents) in self.grid.all_cells() {
            let tag = if contents.iter().any(EntityRef::is_robot) {
                CellTag::Robot
            } else if contents
                .iter()
                .any(|e| matches!(e, EntityRef::Floor(i) if self.floors[*i].dirty))
            {
                CellTag::Dirty
            } else {
                CellTag::Clean
            };
            cells[pos.x as usize][pos.y as usize] = tag as u8;
        }

        let metrics = self.metrics();
        WorldSnapshot {
            tick: self.current_tick,
            state: self.state,
            width: self.grid.width(),
            height: self.grid.height(),
            cells,
            dirty_remaining: metrics.dirty_remaining,
            dirty_fraction: metrics.dirty_fraction,
            total_movements: metrics.total_movements,
            total_recharges: metrics.total_recharges,
            robots: self.robots.iter().map(RobotView::from).collect(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.current_tick,
            state: self.state,
            dirty_remaining: self.dirty_count(),
            total_movements: self.counters.total_movements,
            total_recharges: self.counters.total_recharges,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// True once a tick has ended with no dirt left
    pub fn is_fully_clean(&self) -> bool {
        self.fully_clean
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn counters(&self) -> FleetCounters {
        self.counters
    }

    pub fn initial_dirty(&self) -> usize {
        self.initial_dirty
    }

    pub fn history(&self) -> &[TickMetrics] {
        &self.history
    }

    pub fn grid(&self) -> &MultiGrid<EntityRef> {
        &self.grid
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn robot(&self, idx: usize) -> Option<&Robot> {
        self.robots.get(idx)
    }

    pub fn robot_mut(&mut self, idx: usize) -> Option<&mut Robot> {
        self.robots.get_mut(idx)
    }

    pub fn floors(&self) -> &[FloorCell] {
        &self.floors
    }

    pub fn furniture(&self) -> &[Furniture] {
        &self.furniture
    }

    pub fn chargers(&self) -> &[Charger] {
        &self.chargers
    }

    pub fn charger_positions(&self) -> &[Coord] {
        self.registry.positions()
    }

    pub fn pending_requests(&self) -> &HelpQueue {
        &self.help_queue
    }
}
