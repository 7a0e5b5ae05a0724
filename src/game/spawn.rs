use super::constants::{
  FOOD_PLACEMENT_ATTEMPTS, GRID_H, GRID_W, SPAWN_MARGIN, SPAWN_RELAXED_TIERS,
  SPAWN_STRICT_ATTEMPTS, SPAWN_TIER_ATTEMPTS,
};
use super::types::{Cell, Direction};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct SpawnLimits {
  pub strict_attempts: usize,
  pub relaxed_tiers: Vec<usize>,
  pub tier_attempts: usize,
  pub food_attempts: usize,
}

impl Default for SpawnLimits {
  fn default() -> Self {
    Self {
      strict_attempts: SPAWN_STRICT_ATTEMPTS,
      relaxed_tiers: SPAWN_RELAXED_TIERS.to_vec(),
      tier_attempts: SPAWN_TIER_ATTEMPTS,
      food_attempts: FOOD_PLACEMENT_ATTEMPTS,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spawn {
  pub segments: VecDeque<Cell>,
  pub facing: Direction,
}

struct Blocked<'a> {
  walls: &'a HashSet<Cell>,
  occupied: &'a HashSet<Cell>,
}

impl Blocked<'_> {
  fn is_free(&self, cell: Cell) -> bool {
    cell.is_interior() && !self.walls.contains(&cell) && !self.occupied.contains(&cell)
  }

  fn clear_runway(&self, head: Cell, facing: Direction, runway: usize) -> usize {
    let mut cell = head;
    let mut clear = 0;
    while clear < runway {
      cell = cell.step(facing);
      if !self.is_free(cell) {
        break;
      }
      clear += 1;
    }
    clear
  }
}

/// Samples a head and facing, returning the body and how much of the
/// runway ahead is clear, or `None` when the body itself is blocked.
fn sample_candidate<R: Rng>(
  rng: &mut R,
  blocked: &Blocked<'_>,
  length: usize,
  runway: usize,
) -> Option<(Spawn, usize)> {
  let head = Cell::new(
    rng.gen_range(SPAWN_MARGIN..=GRID_W - 1 - SPAWN_MARGIN),
    rng.gen_range(SPAWN_MARGIN..=GRID_H - 1 - SPAWN_MARGIN),
  );
  let facing = *Direction::ALL.choose(rng)?;
  let (dx, dy) = facing.delta();

  let mut segments = VecDeque::with_capacity(length);
  for i in 0..length as i32 {
    let cell = Cell::new(head.x - dx * i, head.y - dy * i);
    if !blocked.is_free(cell) {
      return None;
    }
    segments.push_back(cell);
  }

  let clear = blocked.clear_runway(head, facing, runway);
  Some((Spawn { segments, facing }, clear))
}

/// Finds a body of `length` cells plus a facing with `runway` clear cells
/// ahead of the head. Falls back through the relaxed runway tiers, then to a
/// single segment near the center.
pub fn find_spawn<R: Rng>(
  rng: &mut R,
  walls: &HashSet<Cell>,
  occupied: &HashSet<Cell>,
  length: usize,
  runway: usize,
  limits: &SpawnLimits,
) -> Spawn {
  let blocked = Blocked { walls, occupied };
  let length = length.max(1);

  for _ in 0..limits.strict_attempts {
    if let Some((spawn, clear)) = sample_candidate(rng, &blocked, length, runway) {
      if clear >= runway {
        return spawn;
      }
    }
  }

  for &min_runway in &limits.relaxed_tiers {
    for _ in 0..limits.tier_attempts {
      if let Some((spawn, clear)) = sample_candidate(rng, &blocked, length, runway) {
        if clear >= min_runway {
          return spawn;
        }
      }
    }
  }

  tracing::debug!(length, runway, "spawn tiers exhausted, using fallback cell");
  Spawn {
    segments: VecDeque::from([fallback_cell(&blocked)]),
    facing: Direction::Right,
  }
}

fn fallback_cell(blocked: &Blocked<'_>) -> Cell {
  let center = Cell::new(GRID_W / 2, GRID_H / 2);
  if blocked.is_free(center) {
    return center;
  }
  (1..GRID_H - 1)
    .flat_map(|y| (1..GRID_W - 1).map(move |x| Cell::new(x, y)))
    .filter(|cell| blocked.is_free(*cell))
    .min_by_key(|cell| (cell.manhattan(center), cell.y, cell.x))
    .unwrap_or(center)
}

/// Tops `food` up to `target` pellets on free interior cells. Gives up on the
/// remaining pellets as soon as one placement exhausts its attempts.
pub fn place_food<R: Rng>(
  rng: &mut R,
  food: &mut Vec<Cell>,
  walls: &HashSet<Cell>,
  snakes: &HashSet<Cell>,
  target: usize,
  limits: &SpawnLimits,
) {
  'pellets: while food.len() < target {
    for _ in 0..limits.food_attempts {
      let cell = Cell::new(rng.gen_range(1..=GRID_W - 2), rng.gen_range(1..=GRID_H - 2));
      if walls.contains(&cell) || snakes.contains(&cell) || food.contains(&cell) {
        continue;
      }
      food.push(cell);
      continue 'pellets;
    }
    tracing::debug!(placed = food.len(), target, "food placement exhausted");
    break;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::game::constants::{SPAWN_LENGTH, SPAWN_RUNWAY, TOTAL_LEVELS};
  use crate::game::levels::generate_walls;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn assert_valid_body(spawn: &Spawn, walls: &HashSet<Cell>, occupied: &HashSet<Cell>) {
    let (dx, dy) = spawn.facing.delta();
    for (i, cell) in spawn.segments.iter().enumerate() {
      assert!(cell.is_interior(), "{cell:?} outside interior");
      assert!(!walls.contains(cell), "{cell:?} on a wall");
      assert!(!occupied.contains(cell), "{cell:?} overlaps a snake");
      let head = spawn.segments[0];
      assert_eq!(*cell, Cell::new(head.x - dx * i as i32, head.y - dy * i as i32));
    }
  }

  #[test]
  fn spawn_on_open_level_has_full_body_and_runway() {
    let mut rng = StdRng::seed_from_u64(7);
    let walls = generate_walls(1);
    let occupied = HashSet::new();
    for _ in 0..50 {
      let spawn = find_spawn(
        &mut rng,
        &walls,
        &occupied,
        SPAWN_LENGTH,
        SPAWN_RUNWAY,
        &SpawnLimits::default(),
      );
      assert_eq!(spawn.segments.len(), SPAWN_LENGTH);
      assert_valid_body(&spawn, &walls, &occupied);
      let blocked = Blocked {
        walls: &walls,
        occupied: &occupied,
      };
      assert_eq!(
        blocked.clear_runway(spawn.segments[0], spawn.facing, SPAWN_RUNWAY),
        SPAWN_RUNWAY
      );
    }
  }

  #[test]
  fn every_level_has_a_full_runway_spawn_spot() {
    for level in 1..=TOTAL_LEVELS {
      let walls = generate_walls(level);
      let occupied = HashSet::new();
      let blocked = Blocked {
        walls: &walls,
        occupied: &occupied,
      };
      let mut found = false;
      'search: for y in SPAWN_MARGIN..=GRID_H - 1 - SPAWN_MARGIN {
        for x in SPAWN_MARGIN..=GRID_W - 1 - SPAWN_MARGIN {
          for facing in Direction::ALL {
            let head = Cell::new(x, y);
            let (dx, dy) = facing.delta();
            let body_free = (0..SPAWN_LENGTH as i32)
              .all(|i| blocked.is_free(Cell::new(head.x - dx * i, head.y - dy * i)));
            if body_free && blocked.clear_runway(head, facing, SPAWN_RUNWAY) == SPAWN_RUNWAY {
              found = true;
              break 'search;
            }
          }
        }
      }
      assert!(found, "level {level} has no spawn spot with a full runway");
    }
  }

  #[test]
  fn spawns_avoid_walls_on_every_level() {
    let mut rng = StdRng::seed_from_u64(11);
    let occupied = HashSet::new();
    for level in 1..=TOTAL_LEVELS {
      let walls = generate_walls(level);
      for _ in 0..20 {
        let spawn = find_spawn(
          &mut rng,
          &walls,
          &occupied,
          SPAWN_LENGTH,
          SPAWN_RUNWAY,
          &SpawnLimits::default(),
        );
        assert_valid_body(&spawn, &walls, &occupied);
      }
    }
  }

  #[test]
  fn relaxed_tier_accepts_short_runway() {
    let mut rng = StdRng::seed_from_u64(3);
    let walls = generate_walls(1);
    // Only the 7x7 corner pocket stays open, so no spot has more than 4 clear cells.
    let occupied: HashSet<Cell> = (1..GRID_H - 1)
      .flat_map(|y| (1..GRID_W - 1).map(move |x| Cell::new(x, y)))
      .filter(|cell| cell.x > 7 || cell.y > 7)
      .collect();
    let limits = SpawnLimits {
      tier_attempts: 5000,
      ..SpawnLimits::default()
    };
    let spawn = find_spawn(&mut rng, &walls, &occupied, SPAWN_LENGTH, SPAWN_RUNWAY, &limits);
    assert_eq!(spawn.segments.len(), SPAWN_LENGTH);
    assert_valid_body(&spawn, &walls, &occupied);
    let blocked = Blocked {
      walls: &walls,
      occupied: &occupied,
    };
    let clear = blocked.clear_runway(spawn.segments[0], spawn.facing, SPAWN_RUNWAY);
    assert!((3..SPAWN_RUNWAY).contains(&clear), "unexpected runway {clear}");
  }

  #[test]
  fn exhausted_tiers_fall_back_to_single_center_segment() {
    let mut rng = StdRng::seed_from_u64(5);
    let walls = generate_walls(1);
    let limits = SpawnLimits {
      strict_attempts: 0,
      relaxed_tiers: Vec::new(),
      tier_attempts: 0,
      food_attempts: 0,
    };
    let spawn = find_spawn(&mut rng, &walls, &HashSet::new(), 3, 10, &limits);
    assert_eq!(spawn.facing, Direction::Right);
    assert_eq!(spawn.segments, VecDeque::from([Cell::new(GRID_W / 2, GRID_H / 2)]));
  }

  #[test]
  fn fallback_moves_off_a_walled_center() {
    let mut rng = StdRng::seed_from_u64(5);
    // Level 2's plus covers the center cell.
    let walls = generate_walls(2);
    assert!(walls.contains(&Cell::new(GRID_W / 2, GRID_H / 2)));
    let limits = SpawnLimits {
      strict_attempts: 0,
      relaxed_tiers: Vec::new(),
      tier_attempts: 0,
      food_attempts: 0,
    };
    let spawn = find_spawn(&mut rng, &walls, &HashSet::new(), 3, 10, &limits);
    assert_eq!(spawn.segments.len(), 1);
    let cell = spawn.segments[0];
    assert!(!walls.contains(&cell));
    assert_eq!(cell.manhattan(Cell::new(GRID_W / 2, GRID_H / 2)), 2);
  }

  #[test]
  fn food_fills_to_target_on_free_cells() {
    let mut rng = StdRng::seed_from_u64(9);
    let walls = generate_walls(8);
    let snakes: HashSet<Cell> = [Cell::new(2, 2), Cell::new(3, 2)].into_iter().collect();
    let mut food = Vec::new();
    place_food(&mut rng, &mut food, &walls, &snakes, 5, &SpawnLimits::default());
    assert_eq!(food.len(), 5);
    let unique: HashSet<Cell> = food.iter().copied().collect();
    assert_eq!(unique.len(), 5);
    for cell in &food {
      assert!(cell.is_interior());
      assert!(!walls.contains(cell));
      assert!(!snakes.contains(cell));
    }
  }

  #[test]
  fn existing_food_is_kept_above_target() {
    let mut rng = StdRng::seed_from_u64(1);
    let walls = generate_walls(1);
    let mut food = vec![Cell::new(5, 5), Cell::new(6, 6), Cell::new(7, 7)];
    place_food(&mut rng, &mut food, &walls, &HashSet::new(), 2, &SpawnLimits::default());
    assert_eq!(food, vec![Cell::new(5, 5), Cell::new(6, 6), Cell::new(7, 7)]);
  }

  #[test]
  fn partial_food_is_topped_up_to_target() {
    let mut rng = StdRng::seed_from_u64(3);
    let walls = generate_walls(3);
    let mut food = vec![Cell::new(5, 5)];
    place_food(&mut rng, &mut food, &walls, &HashSet::new(), 4, &SpawnLimits::default());
    assert_eq!(food.len(), 4);
    assert_eq!(food[0], Cell::new(5, 5));
    let unique: HashSet<Cell> = food.iter().copied().collect();
    assert_eq!(unique.len(), 4);
  }

  #[test]
  fn food_placement_stops_early_when_the_arena_is_full() {
    let mut rng = StdRng::seed_from_u64(2);
    let walls = generate_walls(1);
    let mut snakes: HashSet<Cell> = (1..GRID_H - 1)
      .flat_map(|y| (1..GRID_W - 1).map(move |x| Cell::new(x, y)))
      .collect();
    snakes.remove(&Cell::new(1, 1));
    let mut food = Vec::new();
    let limits = SpawnLimits {
      food_attempts: 50,
      ..SpawnLimits::default()
    };
    place_food(&mut rng, &mut food, &walls, &snakes, 3, &limits);
    assert!(food.len() <= 1);
  }
}
