use super::bot::{decide_bot_direction, next_decision_at, BotView};
use super::constants::{LEVEL_COUNTDOWN_MS, RESPAWN_DELAY_MS, SPAWN_LENGTH, SPAWN_RUNWAY};
use super::levels::{generate_walls, next_level};
use super::spawn::{find_spawn, place_food, SpawnLimits};
use super::types::{Cell, Direction, EatenEvent, GameOptions, Location, Player};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct Arena {
  pub level: u32,
  pub walls: HashSet<Cell>,
  pub food: Vec<Cell>,
  pub level_changing: bool,
  pub level_change_at: Option<i64>,
}

impl Arena {
  pub fn new(level: u32) -> Self {
    Self {
      level,
      walls: generate_walls(level),
      food: Vec::new(),
      level_changing: false,
      level_change_at: None,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
  pub level_changed: bool,
}

#[derive(Debug)]
pub struct Game {
  pub arena: Arena,
  pub players: BTreeMap<String, Player>,
  pub options: GameOptions,
  pub started: bool,
  pub food_eaten: u32,
  pub eaten_events: Vec<EatenEvent>,
  pub limits: SpawnLimits,
}

impl Game {
  pub fn new() -> Self {
    Self {
      arena: Arena::new(1),
      players: BTreeMap::new(),
      options: GameOptions::default(),
      started: false,
      food_eaten: 0,
      eaten_events: Vec::new(),
      limits: SpawnLimits::default(),
    }
  }

  pub fn playing(&self) -> impl Iterator<Item = &Player> {
    self.players.values().filter(|player| player.is_playing())
  }

  pub fn spectator_count(&self) -> usize {
    self
      .players
      .values()
      .filter(|player| player.location == Location::Spectating)
      .count()
  }

  fn snake_cells(&self, except: Option<&str>) -> HashSet<Cell> {
    self
      .playing()
      .filter(|player| player.alive && Some(player.id.as_str()) != except)
      .flat_map(|player| player.segments.iter().copied())
      .collect()
  }

  /// Starts a game for every player already placed in `Playing`.
  pub fn start<R: Rng>(&mut self, rng: &mut R, now: i64) {
    self.started = true;
    self.arena = Arena::new(1);
    self.food_eaten = 0;
    self.eaten_events.clear();
    let lives = self.options.starting_lives;
    for player in self.players.values_mut().filter(|player| player.is_playing()) {
      player.lives = lives;
      player.score = 0;
      player.eliminated = false;
    }
    self.respawn_all(rng, now);
    self.replenish_food(rng);
    tracing::info!(players = self.playing().count(), "game started");
  }

  /// Clears every Playing snake, then respawns the non-eliminated ones one
  /// at a time so each new body counts as occupancy for the next.
  fn respawn_all<R: Rng>(&mut self, rng: &mut R, now: i64) {
    let mut ids = Vec::new();
    for player in self.players.values_mut().filter(|player| player.is_playing()) {
      player.segments.clear();
      player.alive = false;
      player.respawn_at = None;
      if !player.eliminated {
        ids.push(player.id.clone());
      }
    }
    for id in ids {
      self.spawn_player(rng, &id, now);
    }
  }

  pub fn spawn_player<R: Rng>(&mut self, rng: &mut R, player_id: &str, now: i64) {
    let mut occupied = self.snake_cells(Some(player_id));
    occupied.extend(self.arena.food.iter().copied());
    let spawn = find_spawn(
      rng,
      &self.arena.walls,
      &occupied,
      SPAWN_LENGTH,
      SPAWN_RUNWAY,
      &self.limits,
    );
    let Some(player) = self.players.get_mut(player_id) else { return };
    player.segments = spawn.segments;
    player.facing = spawn.facing;
    player.pending_facing = spawn.facing;
    player.alive = true;
    player.respawn_at = None;
    player.bot_next_decision = now;
    tracing::debug!(player_id, is_bot = player.is_bot, "player spawned");
  }

  pub fn replenish_food<R: Rng>(&mut self, rng: &mut R) {
    let snakes = self.snake_cells(None);
    place_food(
      rng,
      &mut self.arena.food,
      &self.arena.walls,
      &snakes,
      self.options.food_count,
      &self.limits,
    );
  }

  fn change_level<R: Rng>(&mut self, rng: &mut R, level: u32, now: i64) {
    self.arena = Arena::new(level);
    self.food_eaten = 0;
    let lives = self.options.starting_lives;
    for player in self.players.values_mut().filter(|player| player.is_playing()) {
      if !player.eliminated {
        player.lives = lives;
      }
    }
    self.respawn_all(rng, now);
    self.replenish_food(rng);
    tracing::info!(level, "level changed");
  }

  /// Returns the whole session to its pre-game state. Options survive.
  pub fn reset(&mut self) {
    self.started = false;
    self.arena = Arena::new(1);
    self.food_eaten = 0;
    self.eaten_events.clear();
    let lives = self.options.starting_lives;
    for player in self.players.values_mut() {
      player.reset_for_lobby(lives);
    }
  }

  pub fn set_pending_direction(&mut self, player_id: &str, direction: Direction) {
    if let Some(player) = self.players.get_mut(player_id) {
      if player.is_playing() {
        player.pending_facing = direction;
      }
    }
  }

  pub fn tick<R: Rng>(&mut self, rng: &mut R, now: i64) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    if !self.started {
      return outcome;
    }
    self.eaten_events.clear();

    self.think_bots(rng, now);

    if self.arena.level_changing {
      if self.arena.level_change_at.is_some_and(|deadline| now >= deadline) {
        self.change_level(rng, next_level(self.arena.level), now);
        outcome.level_changed = true;
        self.check_invariants();
      }
      return outcome;
    }

    self.respawn_due(rng, now);
    self.commit_directions();
    let heads = self.project_heads();
    let kills = self.resolve_collisions(&heads);
    self.apply_kills(&kills, now);
    self.apply_moves(&heads, &kills);
    self.replenish_food(rng);

    if self.food_eaten >= self.options.food_target {
      self.arena.level_changing = true;
      self.arena.level_change_at = Some(now + LEVEL_COUNTDOWN_MS);
      tracing::info!(level = self.arena.level, "level cleared, countdown started");
    }

    self.check_invariants();
    outcome
  }

  fn think_bots<R: Rng>(&mut self, rng: &mut R, now: i64) {
    let collisions = self.options.collisions_enabled;
    let difficulty = self.options.bot_difficulty;
    let due: Vec<String> = self
      .playing()
      .filter(|player| player.is_bot && player.alive && now >= player.bot_next_decision)
      .map(|player| player.id.clone())
      .collect();

    let mut decisions = Vec::with_capacity(due.len());
    for id in due {
      let Some(player) = self.players.get(&id) else { continue };
      let others = self.snake_cells(Some(id.as_str()));
      let view = BotView {
        walls: &self.arena.walls,
        food: &self.arena.food,
        others: &others,
      };
      let direction = decide_bot_direction(rng, player, view, collisions, difficulty);
      decisions.push((id, direction, next_decision_at(rng, now)));
    }

    for (id, direction, next_at) in decisions {
      if let Some(player) = self.players.get_mut(&id) {
        player.pending_facing = direction;
        player.bot_next_decision = next_at;
      }
    }
  }

  fn respawn_due<R: Rng>(&mut self, rng: &mut R, now: i64) {
    let due: Vec<String> = self
      .playing()
      .filter(|player| !player.alive && !player.eliminated)
      .filter(|player| player.respawn_at.is_some_and(|at| now >= at))
      .map(|player| player.id.clone())
      .collect();
    for id in due {
      self.spawn_player(rng, &id, now);
    }
  }

  fn commit_directions(&mut self) {
    for player in self.players.values_mut() {
      if !player.is_playing() || !player.alive {
        continue;
      }
      if player.pending_facing != player.facing.opposite() || player.segments.len() <= 1 {
        player.facing = player.pending_facing;
      }
    }
  }

  fn project_heads(&self) -> BTreeMap<String, Cell> {
    self
      .playing()
      .filter(|player| player.alive)
      .filter_map(|player| Some((player.id.clone(), player.head()?.step(player.facing))))
      .collect()
  }

  fn resolve_collisions(&self, heads: &BTreeMap<String, Cell>) -> BTreeSet<String> {
    let mut kills = BTreeSet::new();

    for (id, head) in heads {
      let Some(player) = self.players.get(id) else { continue };
      if self.arena.walls.contains(head) {
        kills.insert(id.clone());
        continue;
      }
      let body_without_tail = player.segments.len().saturating_sub(1);
      if player.segments.iter().take(body_without_tail).any(|cell| cell == head) {
        kills.insert(id.clone());
        continue;
      }
      if self.options.collisions_enabled {
        let hit_other = self
          .playing()
          .filter(|other| other.alive && other.id != *id)
          .any(|other| other.segments.contains(head));
        if hit_other {
          kills.insert(id.clone());
        }
      }
    }

    // Head-on: applies whether or not body collisions are enabled.
    let mut landing: HashMap<Cell, Vec<&String>> = HashMap::new();
    for (id, head) in heads {
      landing.entry(*head).or_default().push(id);
    }
    for ids in landing.values().filter(|ids| ids.len() > 1) {
      kills.extend(ids.iter().map(|id| (*id).clone()));
    }

    kills
  }

  fn apply_kills(&mut self, kills: &BTreeSet<String>, now: i64) {
    for id in kills {
      let Some(player) = self.players.get_mut(id) else { continue };
      player.alive = false;
      player.segments.clear();
      player.lives = player.lives.saturating_sub(1);
      if player.lives > 0 {
        player.respawn_at = Some(now + RESPAWN_DELAY_MS);
      } else {
        player.eliminated = true;
        player.respawn_at = None;
      }
      tracing::debug!(
        player_id = id.as_str(),
        lives = player.lives,
        eliminated = player.eliminated,
        "player died"
      );
    }
  }

  fn apply_moves(&mut self, heads: &BTreeMap<String, Cell>, kills: &BTreeSet<String>) {
    for (id, head) in heads {
      if kills.contains(id) {
        continue;
      }
      let Some(player) = self.players.get_mut(id) else { continue };
      player.segments.push_front(*head);
      if let Some(index) = self.arena.food.iter().position(|cell| cell == head) {
        self.arena.food.remove(index);
        player.score += 1;
        self.food_eaten += 1;
        self.eaten_events.push(EatenEvent {
          x: head.x,
          y: head.y,
          color: player.color.clone(),
          player_id: id.clone(),
        });
      } else {
        player.segments.pop_back();
      }
    }
  }

  fn check_invariants(&self) {
    for player in self.players.values() {
      debug_assert!(
        !player.alive || !player.segments.is_empty(),
        "living player {} has no segments",
        player.id
      );
      debug_assert!(
        !player.eliminated || (!player.alive && player.respawn_at.is_none()),
        "eliminated player {} is alive or scheduled to respawn",
        player.id
      );
    }
    debug_assert!(
      self.arena.food.iter().all(|cell| !self.arena.walls.contains(cell)),
      "food placed on a wall"
    );
  }
}

impl Default for Game {
  fn default() -> Self {
    Self::new()
  }
}
