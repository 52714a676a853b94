//! Room initialization
//!
//! Order matters for reproducibility with a given seed: chargers, then
//! furniture, then floor dirt, then robots. Every sample is drawn without
//! replacement and fails rather than clamping when the room is too small.

use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::core::config::{SimulationConfig, StartMode, FIXED_START};
use crate::core::error::{CleanerError, Result};
use crate::core::types::{Coord, EntityRef};
use crate::entity::{Charger, ChargerRegistry, FloorCell, Furniture, Robot};
use crate::spatial::MultiGrid;

/// Everything placed on a freshly built room
#[derive(Debug, Clone)]
pub struct RoomLayout {
    pub grid: MultiGrid<EntityRef>,
    pub floors: Vec<FloorCell>,
    pub furniture: Vec<Furniture>,
    pub chargers: Vec<Charger>,
    pub registry: ChargerRegistry,
    pub robots: Vec<Robot>,
    /// Number of floor cells that started dirty
    pub initial_dirty: usize,
}

/// Draw `k` distinct positions, failing if there are not enough
fn sample_positions(
    pool: &[Coord],
    k: usize,
    what: &str,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<Coord>> {
    if k > pool.len() {
        return Err(CleanerError::Configuration(format!(
            "cannot place {} {}: only {} free cells",
            k,
            what,
            pool.len()
        )));
    }
    Ok(pool.choose_multiple(rng, k).copied().collect())
}

/// Build the room described by `config`
pub fn build_room(config: &SimulationConfig, rng: &mut ChaCha8Rng) -> Result<RoomLayout> {
    config.validate()?;

    let mut grid = MultiGrid::new(config.width, config.height);
    let mut free: Vec<Coord> = grid.all_cells().map(|(pos, _)| pos).collect();

    let charger_positions = config.charger_positions();
    let mut chargers = Vec::with_capacity(charger_positions.len());
    for (idx, pos) in charger_positions.iter().enumerate() {
        grid.place(EntityRef::Charger(idx), *pos)?;
        chargers.push(Charger { position: *pos });
    }
    let registry = ChargerRegistry::new(charger_positions);
    free.retain(|pos| !registry.contains(*pos));

    let furniture_pool: Vec<Coord> = free.iter().copied().filter(|pos| *pos != FIXED_START).collect();
    let furniture_positions =
        sample_positions(&furniture_pool, config.furniture_count(), "furniture", rng)?;
    let mut furniture = Vec::with_capacity(furniture_positions.len());
    for (idx, pos) in furniture_positions.iter().enumerate() {
        grid.place(EntityRef::Furniture(idx), *pos)?;
        furniture.push(Furniture { position: *pos });
    }
    let blocked: AHashSet<Coord> = furniture_positions.into_iter().collect();
    free.retain(|pos| !blocked.contains(pos));

    let initial_dirty = config.dirty_count();
    let dirty: AHashSet<Coord> = sample_positions(&free, initial_dirty, "dirty cells", rng)?
        .into_iter()
        .collect();
    let mut floors = Vec::with_capacity(free.len());
    for (idx, pos) in free.iter().enumerate() {
        grid.place(EntityRef::Floor(idx), *pos)?;
        floors.push(FloorCell::new(*pos, dirty.contains(pos)));
    }

    let starts = match config.start_mode {
        StartMode::Fixed => vec![FIXED_START; config.num_robots],
        StartMode::Random => sample_positions(&free, config.num_robots, "robots", rng)?,
    };
    let mut robots = Vec::with_capacity(starts.len());
    for (idx, pos) in starts.into_iter().enumerate() {
        grid.place(EntityRef::Robot(idx), pos)?;
        robots.push(Robot::new(idx, pos));
    }

    Ok(RoomLayout {
        grid,
        floors,
        furniture,
        chargers,
        registry,
        robots,
        initial_dirty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ChargerLayout;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_default_room_counts() {
        let config = SimulationConfig::default();
        let room = build_room(&config, &mut rng()).unwrap();

        assert_eq!(room.chargers.len(), 4);
        assert_eq!(room.furniture.len(), 40);
        assert_eq!(room.floors.len(), 400 - 4 - 40);
        assert_eq!(room.floors.iter().filter(|f| f.dirty).count(), 120);
        assert_eq!(room.initial_dirty, 120);
        assert_eq!(room.robots.len(), 5);
        assert!(room.robots.iter().all(|r| r.position == FIXED_START));
        assert_eq!(room.grid.entity_count(), 4 + 40 + 356 + 5);
    }

    #[test]
    fn test_every_cell_has_exactly_one_base_entity() {
        let config = SimulationConfig::default();
        let room = build_room(&config, &mut rng()).unwrap();

        for (pos, contents) in room.grid.all_cells() {
            let base = contents
                .iter()
                .filter(|e| e.is_floor() || e.is_charger() || e.is_furniture())
                .count();
            assert_eq!(base, 1, "cell {} has {} base entities", pos, base);
        }
    }

    #[test]
    fn test_fixed_start_never_gets_furniture() {
        for seed in 0..20 {
            let config = SimulationConfig {
                furniture_fraction: 0.2,
                ..Default::default()
            };
            let room = build_room(&config, &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
            assert!(room.furniture.iter().all(|f| f.position != FIXED_START));
        }
    }

    #[test]
    fn test_random_starts_are_distinct_floor_cells() {
        let config = SimulationConfig {
            num_robots: 20,
            start_mode: StartMode::Random,
            ..Default::default()
        };
        let room = build_room(&config, &mut rng()).unwrap();

        let starts: AHashSet<Coord> = room.robots.iter().map(|r| r.position).collect();
        assert_eq!(starts.len(), 20);
        for pos in starts {
            assert!(room.grid.contents(pos).iter().any(|e| e.is_floor()));
        }
    }

    #[test]
    fn test_oversubscribed_dirt_fails() {
        let config = SimulationConfig {
            width: 3,
            height: 3,
            dirty_fraction: 1.0,
            furniture_fraction: 0.0,
            chargers: ChargerLayout::Explicit { positions: vec![Coord::new(0, 0)] },
            ..Default::default()
        };
        let result = build_room(&config, &mut rng());
        assert!(matches!(result, Err(CleanerError::Configuration(_))));
    }

    #[test]
    fn test_oversubscribed_robots_fail() {
        let config = SimulationConfig {
            width: 2,
            height: 2,
            num_robots: 4,
            dirty_fraction: 0.0,
            furniture_fraction: 0.0,
            start_mode: StartMode::Random,
            chargers: ChargerLayout::Explicit { positions: vec![Coord::new(0, 0)] },
            ..Default::default()
        };
        assert!(build_room(&config, &mut rng()).is_err());
    }

    #[test]
    fn test_same_seed_same_room() {
        let config = SimulationConfig::default();
        let a = build_room(&config, &mut rng()).unwrap();
        let b = build_room(&config, &mut rng()).unwrap();
        assert_eq!(a.floors, b.floors);
        assert_eq!(a.furniture, b.furniture);
    }
}
