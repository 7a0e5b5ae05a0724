use super::constants::{GRID_H, GRID_W, TOTAL_LEVELS};
use super::types::Cell;
use std::collections::HashSet;

const BLOCK_ORIGINS: [(i32, i32); 4] = [(10, 8), (27, 8), (10, 19), (27, 19)];

const MAZE_SEGMENTS: [((i32, i32), (i32, i32)); 30] = [
  ((4, 4), (4, 8)),
  ((8, 4), (14, 4)),
  ((8, 8), (8, 12)),
  ((12, 7), (12, 11)),
  ((16, 4), (16, 10)),
  ((20, 3), (20, 8)),
  ((24, 4), (28, 4)),
  ((24, 8), (24, 14)),
  ((28, 7), (34, 7)),
  ((32, 4), (32, 10)),
  ((36, 4), (36, 9)),
  ((4, 13), (10, 13)),
  ((4, 17), (4, 22)),
  ((8, 17), (14, 17)),
  ((12, 14), (12, 17)),
  ((16, 14), (22, 14)),
  ((18, 17), (18, 22)),
  ((22, 18), (28, 18)),
  ((26, 11), (26, 16)),
  ((30, 12), (30, 17)),
  ((32, 14), (36, 14)),
  ((34, 17), (34, 22)),
  ((4, 25), (10, 25)),
  ((8, 21), (8, 25)),
  ((12, 22), (18, 22)),
  ((14, 25), (20, 25)),
  ((22, 22), (22, 26)),
  ((26, 22), (32, 22)),
  ((28, 25), (34, 25)),
  ((36, 18), (36, 24)),
];

/// Level after `level`, wrapping from the last catalog entry back to 1.
pub fn next_level(level: u32) -> u32 {
  (level % TOTAL_LEVELS) + 1
}

pub fn border_walls() -> HashSet<Cell> {
  let mut walls = HashSet::new();
  for x in 0..GRID_W {
    walls.insert(Cell::new(x, 0));
    walls.insert(Cell::new(x, GRID_H - 1));
  }
  for y in 0..GRID_H {
    walls.insert(Cell::new(0, y));
    walls.insert(Cell::new(GRID_W - 1, y));
  }
  walls
}

/// Border plus the obstacle layout for `level`. Levels outside the catalog
/// fold back into it, so level 9 is level 1.
pub fn generate_walls(level: u32) -> HashSet<Cell> {
  let mut walls = border_walls();
  let level = if level == 0 {
    1
  } else {
    (level - 1) % TOTAL_LEVELS + 1
  };

  match level {
    2 => center_plus(&mut walls),
    3 => block_clusters(&mut walls),
    4 => gapped_bars(&mut walls),
    5 => staggered_lines(&mut walls),
    6 => nested_rings(&mut walls),
    7 => four_rooms(&mut walls),
    8 => maze(&mut walls),
    _ => {}
  }

  walls
}

fn horizontal(walls: &mut HashSet<Cell>, y: i32, xs: impl Iterator<Item = i32>) {
  walls.extend(xs.map(|x| Cell::new(x, y)));
}

fn vertical(walls: &mut HashSet<Cell>, x: i32, ys: impl Iterator<Item = i32>) {
  walls.extend(ys.map(|y| Cell::new(x, y)));
}

fn center_plus(walls: &mut HashSet<Cell>) {
  let (cx, cy) = (GRID_W / 2, GRID_H / 2);
  for i in -4..=4 {
    walls.insert(Cell::new(cx + i, cy));
    walls.insert(Cell::new(cx, cy + i));
  }
}

fn block_clusters(walls: &mut HashSet<Cell>) {
  for (px, py) in BLOCK_ORIGINS {
    for dx in 0..3 {
      for dy in 0..3 {
        walls.insert(Cell::new(px + dx, py + dy));
      }
    }
  }
}

fn gapped_bars(walls: &mut HashSet<Cell>) {
  let gap = 18..=20;
  for y in [10, 20] {
    horizontal(walls, y, (5..35).filter(|x| !gap.contains(x)));
  }
}

fn staggered_lines(walls: &mut HashSet<Cell>) {
  horizontal(walls, 8, 1..18);
  horizontal(walls, 14, 22..GRID_W - 1);
  horizontal(walls, 20, 1..18);
}

fn nested_rings(walls: &mut HashSet<Cell>) {
  // Outer ring, doorways at (20, 24) and (34, 10).
  horizontal(walls, 5, 5..35);
  horizontal(walls, 24, (5..35).filter(|x| *x != 20));
  vertical(walls, 5, 5..25);
  vertical(walls, 34, (5..25).filter(|y| *y != 10));
  // Inner ring, doorways at (15, 10) and (10, 16).
  horizontal(walls, 10, (10..30).filter(|x| *x != 15));
  horizontal(walls, 19, 10..30);
  vertical(walls, 29, 10..20);
  vertical(walls, 10, (10..20).filter(|y| *y != 16));
}

fn four_rooms(walls: &mut HashSet<Cell>) {
  let (cx, cy) = (GRID_W / 2, GRID_H / 2);
  horizontal(walls, cy, (1..GRID_W - 1).filter(|x| (x - cx).abs() > 2));
  vertical(walls, cx, (1..GRID_H - 1).filter(|y| (y - cy).abs() > 2));
}

fn maze(walls: &mut HashSet<Cell>) {
  for ((x1, y1), (x2, y2)) in MAZE_SEGMENTS {
    if x1 == x2 {
      vertical(walls, x1, y1.min(y2)..=y1.max(y2));
    } else {
      horizontal(walls, y1, x1.min(x2)..=x1.max(x2));
    }
  }
}

/// Walls in a stable order for the wire.
pub fn sorted_walls(walls: &HashSet<Cell>) -> Vec<Cell> {
  let mut cells: Vec<Cell> = walls.iter().copied().collect();
  cells.sort();
  cells
}
