//! Robot policy - the per-tick decision and commit for one robot
//!
//! Decision rules, evaluated top to bottom (first match wins):
//! 1. Standing on the target clears it
//! 2. On a charger with less than a full battery: charge and stay
//! 3. Has a target: step toward it
//! 4. Battery low: pick the nearest charger as target and step toward it
//! 5. Otherwise clean a dirty neighbour, or wander if there is none
//!
//! The decision only sets `next_position`; [`advance`] commits the move.

use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::core::config::{BATTERY_MAX, CHARGE_PER_TICK, CLUSTER_THRESHOLD, LOW_BATTERY_THRESHOLD};
use crate::core::error::{CleanerError, Result};
use crate::core::types::{Coord, EntityRef};
use crate::entity::{ChargerRegistry, FloorCell, Robot};
use crate::simulation::coordination::{HelpQueue, HelpRequest};
use crate::simulation::metrics::FleetCounters;
use crate::spatial::MultiGrid;

/// What a robot chose to do this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Sat on a charger and gained charge
    Charge,
    /// Stepped toward an existing target
    Travel,
    /// Battery low: picked the nearest charger and stepped toward it
    SeekCharger,
    /// Cleaned a dirty neighbour and moved onto it
    Clean,
    /// Nothing dirty nearby: wandered to a random free cell or stayed put
    Idle,
}

/// Shared world state a robot reads and writes while deciding
///
/// Borrowed field by field from the world so the robot itself can be
/// borrowed mutably at the same time.
pub struct PolicyContext<'a> {
    pub grid: &'a mut MultiGrid<EntityRef>,
    pub floors: &'a mut [FloorCell],
    pub chargers: &'a ChargerRegistry,
    pub requests: &'a mut HelpQueue,
    pub counters: &'a mut FleetCounters,
    pub rng: &'a mut ChaCha8Rng,
}

/// A neighbouring cell a robot could step onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    pos: Coord,
    /// Floor index, `None` for a charger
    floor: Option<usize>,
}

/// Decide and commit one robot's move for this tick
pub fn step(robot: &mut Robot, ctx: &mut PolicyContext<'_>) -> Result<Decision> {
    let decision = decide(robot, ctx)?;
    advance(robot, ctx)?;
    tracing::trace!(
        "Robot {} {:?} at {} battery={} target={:?}",
        robot.id,
        decision,
        robot.position,
        robot.battery,
        robot.target
    );
    Ok(decision)
}

/// Run the decision rules and set `next_position`
pub fn decide(robot: &mut Robot, ctx: &mut PolicyContext<'_>) -> Result<Decision> {
    if robot.target == Some(robot.position) {
        robot.target = None;
    }

    if robot.battery < BATTERY_MAX && ctx.chargers.contains(robot.position) {
        charge(robot, ctx.counters);
        return Ok(Decision::Charge);
    }

    if let Some(target) = robot.target {
        travel_toward(robot, target, ctx);
        return Ok(Decision::Travel);
    }

    if robot.battery <= LOW_BATTERY_THRESHOLD {
        let charger = nearest_charger(ctx.chargers.positions(), robot.position)?;
        robot.target = Some(charger);
        travel_toward(robot, charger, ctx);
        return Ok(Decision::SeekCharger);
    }

    Ok(clean_locally(robot, ctx))
}

/// Commit the pending move
///
/// Moves only when the robot wants to go somewhere and still has charge.
/// Each committed move costs one unit of battery. A robot at zero charge
/// keeps deciding but never moves again.
pub fn advance(robot: &mut Robot, ctx: &mut PolicyContext<'_>) -> Result<bool> {
    if robot.next_position == robot.position || !robot.can_move() {
        return Ok(false);
    }

    ctx.grid
        .move_entity(EntityRef::Robot(robot.id), robot.position, robot.next_position)?;
    robot.position = robot.next_position;
    robot.movements += 1;
    robot.battery -= 1;
    ctx.counters.total_movements += 1;
    Ok(true)
}

/// Nearest charger by Euclidean distance
///
/// Strict comparison: the first charger in the list wins a tie.
pub fn nearest_charger(chargers: &[Coord], from: Coord) -> Result<Coord> {
    let mut best: Option<(Coord, f64)> = None;
    for charger in chargers {
        let d = charger.distance(&from);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((*charger, d));
        }
    }
    best.map(|(c, _)| c).ok_or(CleanerError::EmptyChargerList)
}

fn charge(robot: &mut Robot, counters: &mut FleetCounters) {
    robot.battery = (robot.battery + CHARGE_PER_TICK).min(BATTERY_MAX);
    robot.next_position = robot.position;
    if robot.battery == BATTERY_MAX {
        counters.total_recharges += 1;
    }
}

/// Neighbour cells not occupied by a robot
///
/// Floors always qualify; chargers only when `include_chargers` is set.
/// Furniture never does. Order follows `MultiGrid::neighbors`.
fn free_neighbors(grid: &MultiGrid<EntityRef>, pos: Coord, include_chargers: bool) -> Vec<Candidate> {
    grid.moore_neighbors(pos)
        .into_iter()
        .filter_map(|cell| {
            let contents = grid.contents(cell);
            if contents.iter().any(EntityRef::is_robot) {
                return None;
            }
            contents.iter().find_map(|entity| match *entity {
                EntityRef::Floor(idx) => Some(Candidate { pos: cell, floor: Some(idx) }),
                EntityRef::Charger(_) if include_chargers => Some(Candidate { pos: cell, floor: None }),
                _ => None,
            })
        })
        .collect()
}

/// Greedy step: the free neighbour closest to the target
///
/// Ties go to the earlier neighbour. Only a charger-bound robot may step on
/// chargers, and it mops up any dirt it passes over on the way. Any robot
/// cleans the target cell itself when it steps onto it, since a robot never
/// cleans the cell it is standing on.
fn travel_toward(robot: &mut Robot, target: Coord, ctx: &mut PolicyContext<'_>) {
    let to_charger = ctx.chargers.contains(target);
    let candidates = free_neighbors(ctx.grid, robot.position, to_charger);

    let Some(best) = candidates
        .iter()
        .min_by_key(|c| OrderedFloat(c.pos.distance(&target)))
        .copied()
    else {
        robot.next_position = robot.position;
        return;
    };

    robot.next_position = best.pos;
    if to_charger || best.pos == target {
        if let Some(idx) = best.floor {
            ctx.floors[idx].clean();
        }
    }
}

fn clean_locally(robot: &mut Robot, ctx: &mut PolicyContext<'_>) -> Decision {
    let free = free_neighbors(ctx.grid, robot.position, false);
    let dirty: Vec<usize> = free
        .iter()
        .filter_map(|c| c.floor)
        .filter(|&idx| ctx.floors[idx].dirty)
        .collect();
    robot.local_dirty = dirty.len();

    if dirty.is_empty() {
        robot.next_position = free
            .choose(&mut *ctx.rng)
            .map(|c| c.pos)
            .unwrap_or(robot.position);
        return Decision::Idle;
    }

    if dirty.len() >= CLUSTER_THRESHOLD {
        tracing::debug!(
            "Robot {} asks for help: {} dirty cells around {}",
            robot.id,
            dirty.len(),
            robot.position
        );
        ctx.requests.push(HelpRequest::new(dirty.len(), robot.position));
    }

    // dirty is non-empty here
    let Some(&chosen) = dirty.choose(&mut *ctx.rng) else {
        return Decision::Idle;
    };
    ctx.floors[chosen].clean();
    robot.local_dirty -= 1;
    robot.next_position = ctx.floors[chosen].position;
    Decision::Clean
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Small room for exercising the policy without full world setup
    struct Room {
        grid: MultiGrid<EntityRef>,
        floors: Vec<FloorCell>,
        chargers: ChargerRegistry,
        requests: HelpQueue,
        counters: FleetCounters,
        rng: ChaCha8Rng,
    }

    impl Room {
        fn new(width: u32, height: u32, chargers: &[Coord], furniture: &[Coord], dirty: &[Coord]) -> Self {
            let mut grid = MultiGrid::new(width, height);
            let mut floors = Vec::new();
            for (i, c) in chargers.iter().enumerate() {
                grid.place(EntityRef::Charger(i), *c).unwrap();
            }
            for (i, f) in furniture.iter().enumerate() {
                grid.place(EntityRef::Furniture(i), *f).unwrap();
            }
            for x in 0..width as i32 {
                for y in 0..height as i32 {
                    let pos = Coord::new(x, y);
                    if chargers.contains(&pos) || furniture.contains(&pos) {
                        continue;
                    }
                    grid.place(EntityRef::Floor(floors.len()), pos).unwrap();
                    floors.push(FloorCell::new(pos, dirty.contains(&pos)));
                }
            }
            Self {
                grid,
                floors,
                chargers: ChargerRegistry::new(chargers.to_vec()),
                requests: HelpQueue::new(),
                counters: FleetCounters::default(),
                rng: ChaCha8Rng::seed_from_u64(42),
            }
        }

        fn add_robot(&mut self, id: usize, pos: Coord) -> Robot {
            self.grid.place(EntityRef::Robot(id), pos).unwrap();
            Robot::new(id, pos)
        }

        fn ctx(&mut self) -> PolicyContext<'_> {
            PolicyContext {
                grid: &mut self.grid,
                floors: &mut self.floors,
                chargers: &self.chargers,
                requests: &mut self.requests,
                counters: &mut self.counters,
                rng: &mut self.rng,
            }
        }

        fn is_dirty(&self, pos: Coord) -> bool {
            self.floors.iter().any(|f| f.position == pos && f.dirty)
        }
    }

    #[test]
    fn test_charging_clamps_at_max() {
        let mut room = Room::new(3, 3, &[Coord::new(0, 0)], &[], &[]);
        let mut robot = room.add_robot(0, Coord::new(0, 0));
        robot.battery = 90;

        let decision = step(&mut robot, &mut room.ctx()).unwrap();

        assert_eq!(decision, Decision::Charge);
        assert_eq!(robot.battery, 100);
        assert_eq!(robot.position, Coord::new(0, 0));
        assert_eq!(room.counters.total_recharges, 1);
    }

    #[test]
    fn test_partial_charge_does_not_count_as_recharge() {
        let mut room = Room::new(3, 3, &[Coord::new(0, 0)], &[], &[]);
        let mut robot = room.add_robot(0, Coord::new(0, 0));
        robot.battery = 10;

        step(&mut robot, &mut room.ctx()).unwrap();
        assert_eq!(robot.battery, 35);
        assert_eq!(room.counters.total_recharges, 0);
    }

    #[test]
    fn test_arrival_clears_target() {
        let mut room = Room::new(3, 3, &[Coord::new(0, 0)], &[], &[]);
        let mut robot = room.add_robot(0, Coord::new(2, 2));
        robot.target = Some(Coord::new(2, 2));

        let decision = decide(&mut robot, &mut room.ctx()).unwrap();
        assert!(robot.target.is_none());
        assert_eq!(decision, Decision::Idle);
    }

    #[test]
    fn test_low_battery_targets_nearest_charger() {
        let chargers = [Coord::new(0, 0), Coord::new(9, 9), Coord::new(9, 0)];
        let mut room = Room::new(10, 10, &chargers, &[], &[]);
        let mut robot = room.add_robot(0, Coord::new(7, 2));
        robot.battery = LOW_BATTERY_THRESHOLD;

        let decision = step(&mut robot, &mut room.ctx()).unwrap();

        assert_eq!(decision, Decision::SeekCharger);
        assert_eq!(robot.target, Some(Coord::new(9, 0)));
        assert_eq!(robot.position, Coord::new(8, 1));
        assert_eq!(robot.battery, LOW_BATTERY_THRESHOLD - 1);
    }

    #[test]
    fn test_nearest_charger_tie_goes_to_first() {
        let chargers = [Coord::new(0, 2), Coord::new(4, 2)];
        assert_eq!(nearest_charger(&chargers, Coord::new(2, 2)).unwrap(), Coord::new(0, 2));
    }

    #[test]
    fn test_nearest_charger_empty_list() {
        let result = nearest_charger(&[], Coord::new(2, 2));
        assert!(matches!(result, Err(CleanerError::EmptyChargerList)));
    }

    #[test]
    fn test_travel_avoids_furniture_and_robots() {
        // Direct diagonal is furniture, straight right is another robot
        let mut room = Room::new(5, 5, &[Coord::new(4, 4)], &[Coord::new(1, 1)], &[]);
        let mut robot = room.add_robot(0, Coord::new(0, 0));
        room.add_robot(1, Coord::new(1, 0));
        robot.target = Some(Coord::new(4, 4));

        step(&mut robot, &mut room.ctx()).unwrap();
        assert_eq!(robot.position, Coord::new(0, 1));
    }

    #[test]
    fn test_travel_to_charger_cleans_on_the_way() {
        let mut room = Room::new(4, 1, &[Coord::new(3, 0)], &[], &[Coord::new(1, 0)]);
        let mut robot = room.add_robot(0, Coord::new(0, 0));
        robot.target = Some(Coord::new(3, 0));

        step(&mut robot, &mut room.ctx()).unwrap();
        assert_eq!(robot.position, Coord::new(1, 0));
        assert!(!room.is_dirty(Coord::new(1, 0)));
    }

    #[test]
    fn test_travel_to_request_does_not_clean() {
        let mut room = Room::new(4, 1, &[Coord::new(0, 0)], &[], &[Coord::new(2, 0)]);
        let mut robot = room.add_robot(0, Coord::new(1, 0));
        robot.target = Some(Coord::new(3, 0));

        step(&mut robot, &mut room.ctx()).unwrap();
        assert_eq!(robot.position, Coord::new(2, 0));
        assert!(room.is_dirty(Coord::new(2, 0)));
    }

    #[test]
    fn test_travel_cleans_dirty_destination() {
        let mut room = Room::new(3, 1, &[Coord::new(0, 0)], &[], &[Coord::new(2, 0)]);
        let mut robot = room.add_robot(0, Coord::new(1, 0));
        robot.target = Some(Coord::new(2, 0));

        step(&mut robot, &mut room.ctx()).unwrap();
        assert_eq!(robot.position, Coord::new(2, 0));
        assert!(!room.is_dirty(Coord::new(2, 0)));
    }

    #[test]
    fn test_only_charger_bound_robot_steps_on_charger() {
        let mut room = Room::new(3, 1, &[Coord::new(1, 0)], &[], &[]);
        let mut robot = room.add_robot(0, Coord::new(0, 0));
        robot.target = Some(Coord::new(2, 0));

        step(&mut robot, &mut room.ctx()).unwrap();
        assert_eq!(robot.position, Coord::new(0, 0));
    }

    #[test]
    fn test_cleaning_moves_onto_cleaned_cell() {
        let mut room = Room::new(3, 3, &[Coord::new(0, 0)], &[], &[Coord::new(2, 2)]);
        let mut robot = room.add_robot(0, Coord::new(1, 1));

        let decision = step(&mut robot, &mut room.ctx()).unwrap();

        assert_eq!(decision, Decision::Clean);
        assert_eq!(robot.position, Coord::new(2, 2));
        assert!(!room.is_dirty(Coord::new(2, 2)));
        assert_eq!(robot.local_dirty, 0);
        assert_eq!(robot.movements, 1);
        assert_eq!(room.counters.total_movements, 1);
        assert!(room.requests.is_empty());
    }

    #[test]
    fn test_dirty_cluster_raises_help_request() {
        let dirty = [Coord::new(0, 1), Coord::new(1, 0), Coord::new(2, 1), Coord::new(1, 2)];
        let mut room = Room::new(3, 3, &[Coord::new(0, 0)], &[], &dirty);
        let mut robot = room.add_robot(0, Coord::new(1, 1));

        step(&mut robot, &mut room.ctx()).unwrap();

        assert_eq!(room.requests.len(), 1);
        let request = room.requests.iter().next().unwrap();
        assert_eq!(request.severity, 4);
        assert_eq!(request.location, Coord::new(1, 1));
        assert_eq!(robot.local_dirty, 3);
    }

    #[test]
    fn test_idle_robot_wanders_to_free_floor() {
        let mut room = Room::new(3, 3, &[Coord::new(0, 0)], &[Coord::new(2, 2)], &[]);
        let mut robot = room.add_robot(0, Coord::new(1, 1));

        let decision = step(&mut robot, &mut room.ctx()).unwrap();

        assert_eq!(decision, Decision::Idle);
        assert_ne!(robot.position, Coord::new(1, 1));
        assert_ne!(robot.position, Coord::new(0, 0));
        assert_ne!(robot.position, Coord::new(2, 2));
    }

    #[test]
    fn test_boxed_in_robot_stays() {
        let furniture = [Coord::new(0, 1), Coord::new(1, 0), Coord::new(1, 1)];
        let mut room = Room::new(3, 3, &[Coord::new(2, 2)], &furniture, &[]);
        let mut robot = room.add_robot(0, Coord::new(0, 0));

        step(&mut robot, &mut room.ctx()).unwrap();
        assert_eq!(robot.position, Coord::new(0, 0));
        assert_eq!(robot.battery, BATTERY_MAX);
    }

    #[test]
    fn test_empty_battery_robot_stays_put() {
        let mut room = Room::new(3, 3, &[Coord::new(0, 0)], &[], &[Coord::new(2, 2)]);
        let mut robot = room.add_robot(0, Coord::new(1, 1));
        robot.battery = 0;

        let decision = step(&mut robot, &mut room.ctx()).unwrap();

        // Still heads for the charger, but the move is never committed
        assert_eq!(decision, Decision::SeekCharger);
        assert_eq!(robot.target, Some(Coord::new(0, 0)));
        assert_eq!(robot.next_position, Coord::new(0, 0));
        assert_eq!(robot.position, Coord::new(1, 1));
        assert_eq!(robot.battery, 0);
        assert_eq!(robot.movements, 0);
    }
}
