use super::constants::{BOT_DECISION_MAX_MS, BOT_DECISION_MIN_MS};
use super::types::{BotDifficulty, BotProfile, Cell, Direction, Player};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// What a bot can see of the arena when it decides.
#[derive(Debug, Clone, Copy)]
pub struct BotView<'a> {
  pub walls: &'a HashSet<Cell>,
  pub food: &'a [Cell],
  /// Bodies of every other living snake.
  pub others: &'a HashSet<Cell>,
}

pub fn decide_bot_direction<R: Rng>(
  rng: &mut R,
  player: &Player,
  view: BotView<'_>,
  collisions_enabled: bool,
  difficulty: BotDifficulty,
) -> Direction {
  decide_with_profile(rng, player, view, collisions_enabled, difficulty.profile())
}

pub fn decide_with_profile<R: Rng>(
  rng: &mut R,
  player: &Player,
  view: BotView<'_>,
  collisions_enabled: bool,
  profile: BotProfile,
) -> Direction {
  if rng.gen_bool(profile.mistake_rate.clamp(0.0, 1.0)) {
    return *Direction::ALL.choose(rng).unwrap_or(&player.facing);
  }

  let Some(head) = player.head() else { return player.facing };
  let safe = safe_directions(player, head, view, collisions_enabled);
  if safe.is_empty() {
    return player.facing;
  }

  if rng.gen_bool(profile.intelligence.clamp(0.0, 1.0)) {
    if let Some(target) = nearest_food(head, view.food) {
      let current = head.manhattan(target);
      let closer: Vec<Direction> = safe
        .iter()
        .copied()
        .filter(|direction| head.step(*direction).manhattan(target) < current)
        .collect();
      if let Some(direction) = closer.choose(rng) {
        return *direction;
      }
    }
  }

  *safe.choose(rng).unwrap_or(&player.facing)
}

fn safe_directions(
  player: &Player,
  head: Cell,
  view: BotView<'_>,
  collisions_enabled: bool,
) -> Vec<Direction> {
  let body_len = player.segments.len();
  let own_body: HashSet<Cell> = player
    .segments
    .iter()
    .take(body_len.saturating_sub(1))
    .copied()
    .collect();

  Direction::ALL
    .into_iter()
    .filter(|direction| *direction != player.facing.opposite())
    .filter(|direction| {
      let next = head.step(*direction);
      if !next.is_interior() || view.walls.contains(&next) || own_body.contains(&next) {
        return false;
      }
      !(collisions_enabled && view.others.contains(&next))
    })
    .collect()
}

fn nearest_food(head: Cell, food: &[Cell]) -> Option<Cell> {
  food.iter().copied().min_by_key(|cell| head.manhattan(*cell))
}

pub fn next_decision_at<R: Rng>(rng: &mut R, now: i64) -> i64 {
  now + rng.gen_range(BOT_DECISION_MIN_MS..=BOT_DECISION_MAX_MS)
}
