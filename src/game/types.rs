use super::constants::{
  DEFAULT_FOOD_COUNT, DEFAULT_FOOD_TARGET, DEFAULT_LIVES, GRID_H, GRID_W,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "[i32; 2]", from = "[i32; 2]")]
pub struct Cell {
  pub x: i32,
  pub y: i32,
}

impl Cell {
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }

  pub fn step(self, direction: Direction) -> Self {
    let (dx, dy) = direction.delta();
    Self {
      x: self.x + dx,
      y: self.y + dy,
    }
  }

  pub fn manhattan(self, other: Cell) -> i32 {
    (self.x - other.x).abs() + (self.y - other.y).abs()
  }

  /// True for cells strictly inside the border ring.
  pub fn is_interior(self) -> bool {
    self.x > 0 && self.x < GRID_W - 1 && self.y > 0 && self.y < GRID_H - 1
  }
}

impl From<Cell> for [i32; 2] {
  fn from(cell: Cell) -> Self {
    [cell.x, cell.y]
  }
}

impl From<[i32; 2]> for Cell {
  fn from([x, y]: [i32; 2]) -> Self {
    Self { x, y }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Up,
  Down,
  Left,
  Right,
}

impl Direction {
  pub const ALL: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
  ];

  pub fn delta(self) -> (i32, i32) {
    match self {
      Direction::Up => (0, -1),
      Direction::Down => (0, 1),
      Direction::Left => (-1, 0),
      Direction::Right => (1, 0),
    }
  }

  pub fn opposite(self) -> Direction {
    match self {
      Direction::Up => Direction::Down,
      Direction::Down => Direction::Up,
      Direction::Left => Direction::Right,
      Direction::Right => Direction::Left,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
  Lobby,
  Playing,
  Spectating,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Avatar {
  Emoji(String),
  CustomImage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotDifficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotProfile {
  pub intelligence: f64,
  pub mistake_rate: f64,
}

impl BotDifficulty {
  pub fn parse(value: &str) -> Option<Self> {
    match value.trim().to_ascii_lowercase().as_str() {
      "easy" => Some(BotDifficulty::Easy),
      "medium" => Some(BotDifficulty::Medium),
      "hard" => Some(BotDifficulty::Hard),
      _ => None,
    }
  }

  pub fn profile(self) -> BotProfile {
    match self {
      BotDifficulty::Easy => BotProfile {
        intelligence: 0.35,
        mistake_rate: 0.10,
      },
      BotDifficulty::Medium => BotProfile {
        intelligence: 0.65,
        mistake_rate: 0.04,
      },
      BotDifficulty::Hard => BotProfile {
        intelligence: 0.90,
        mistake_rate: 0.01,
      },
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameOptions {
  #[serde(rename = "foodToAdvance")]
  pub food_target: u32,
  #[serde(rename = "foodCount")]
  pub food_count: usize,
  #[serde(rename = "collisions")]
  pub collisions_enabled: bool,
  #[serde(rename = "lives")]
  pub starting_lives: u32,
  #[serde(rename = "botDifficulty")]
  pub bot_difficulty: BotDifficulty,
}

impl Default for GameOptions {
  fn default() -> Self {
    Self {
      food_target: DEFAULT_FOOD_TARGET,
      food_count: DEFAULT_FOOD_COUNT,
      collisions_enabled: true,
      starting_lives: DEFAULT_LIVES,
      bot_difficulty: BotDifficulty::default(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Player {
  pub id: String,
  pub name: String,
  pub color: String,
  pub avatar: Avatar,
  pub segments: VecDeque<Cell>,
  pub facing: Direction,
  pub pending_facing: Direction,
  pub score: u32,
  pub lives: u32,
  pub alive: bool,
  pub eliminated: bool,
  pub respawn_at: Option<i64>,
  pub is_bot: bool,
  pub bot_next_decision: i64,
  pub location: Location,
}

impl Player {
  pub fn new(id: String, name: String, color: String, avatar: Avatar, is_bot: bool) -> Self {
    Self {
      id,
      name,
      color,
      avatar,
      segments: VecDeque::new(),
      facing: Direction::Right,
      pending_facing: Direction::Right,
      score: 0,
      lives: DEFAULT_LIVES,
      alive: false,
      eliminated: false,
      respawn_at: None,
      is_bot,
      bot_next_decision: 0,
      location: Location::Lobby,
    }
  }

  pub fn head(&self) -> Option<Cell> {
    self.segments.front().copied()
  }

  pub fn is_playing(&self) -> bool {
    self.location == Location::Playing
  }

  /// Clears everything a game leaves behind on the player.
  pub fn reset_for_lobby(&mut self, lives: u32) {
    self.segments.clear();
    self.facing = Direction::Right;
    self.pending_facing = Direction::Right;
    self.score = 0;
    self.lives = lives;
    self.alive = false;
    self.eliminated = false;
    self.respawn_at = None;
    self.bot_next_decision = 0;
    self.location = Location::Lobby;
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EatenEvent {
  pub x: i32,
  pub y: i32,
  pub color: String,
  pub player_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
  pub name: String,
  pub color: String,
  pub avatar: Avatar,
  pub segments: Vec<Cell>,
  pub score: u32,
  pub lives: u32,
  pub alive: bool,
  pub eliminated: bool,
  pub direction: Direction,
  pub is_bot: bool,
}

impl From<&Player> for PlayerSnapshot {
  fn from(player: &Player) -> Self {
    Self {
      name: player.name.clone(),
      color: player.color.clone(),
      avatar: player.avatar.clone(),
      segments: player.segments.iter().copied().collect(),
      score: player.score,
      lives: player.lives,
      alive: player.alive,
      eliminated: player.eliminated,
      direction: player.facing,
      is_bot: player.is_bot,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyPlayer {
  pub player_id: String,
  pub name: String,
  pub color: String,
  pub avatar: Avatar,
  pub ready: bool,
  pub is_bot: bool,
  pub location: Location,
}
