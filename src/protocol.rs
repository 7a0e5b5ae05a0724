use crate::game::constants::{FOOD_COUNT_RANGE, FOOD_TARGET_RANGE, LIVES_RANGE};
use crate::game::types::{
  BotDifficulty, Cell, Direction, EatenEvent, GameOptions, LobbyPlayer, Location, PlayerSnapshot,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
  Join {
    name: Option<String>,
    color: Option<String>,
    #[serde(alias = "head_avatar")]
    avatar: Option<String>,
    #[serde(rename = "customHeadRef", alias = "custom_head")]
    custom_head_ref: Option<String>,
  },
  Ready,
  GameOptions(OptionsUpdate),
  #[serde(alias = "add_ai")]
  AddBot,
  #[serde(alias = "remove_ai")]
  RemoveBot {
    #[serde(rename = "botId", alias = "ai_id")]
    bot_id: Option<String>,
  },
  Pause,
  Input {
    direction: Direction,
  },
  ReturnToLobby,
}

/// Raw option fields. Each one is validated on its own so a bad field never
/// discards the others.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsUpdate {
  #[serde(rename = "foodToAdvance", alias = "food_to_advance")]
  pub food_to_advance: Option<Value>,
  #[serde(rename = "foodCount", alias = "food_count")]
  pub food_count: Option<Value>,
  pub collisions: Option<Value>,
  pub lives: Option<Value>,
  #[serde(rename = "botDifficulty", alias = "bot_difficulty")]
  pub bot_difficulty: Option<Value>,
}

pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
  serde_json::from_str(text).ok()
}

fn clamped_int(value: &Value, (min, max): (i64, i64)) -> Option<i64> {
  let number = match value {
    Value::Number(number) => number
      .as_i64()
      .or_else(|| number.as_f64().filter(|value| value.is_finite()).map(|value| value as i64))?,
    _ => return None,
  };
  Some(number.clamp(min, max))
}

/// Applies whichever fields are well-typed. Returns true when anything changed.
pub fn apply_options_update(options: &mut GameOptions, update: &OptionsUpdate) -> bool {
  let before = *options;
  if let Some(value) = update.food_to_advance.as_ref().and_then(|v| clamped_int(v, FOOD_TARGET_RANGE)) {
    options.food_target = value as u32;
  }
  if let Some(value) = update.food_count.as_ref().and_then(|v| clamped_int(v, FOOD_COUNT_RANGE)) {
    options.food_count = value as usize;
  }
  if let Some(value) = update.collisions.as_ref().and_then(Value::as_bool) {
    options.collisions_enabled = value;
  }
  if let Some(value) = update.lives.as_ref().and_then(|v| clamped_int(v, LIVES_RANGE)) {
    options.starting_lives = value as u32;
  }
  if let Some(value) = update
    .bot_difficulty
    .as_ref()
    .and_then(Value::as_str)
    .and_then(BotDifficulty::parse)
  {
    options.bot_difficulty = value;
  }
  *options != before
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
  Welcome {
    #[serde(rename = "playerId")]
    player_id: String,
  },
  LobbyState {
    players: Vec<LobbyPlayer>,
    #[serde(rename = "gameOptions")]
    game_options: GameOptions,
  },
  GameStart {
    level: u32,
    walls: Vec<Cell>,
    #[serde(rename = "gridSize")]
    grid_size: [i32; 2],
  },
  GameInProgress,
  State {
    players: BTreeMap<String, PlayerSnapshot>,
    food: Vec<Cell>,
    level: u32,
    #[serde(rename = "foodEaten")]
    food_eaten: u32,
    #[serde(rename = "foodTarget")]
    food_target: u32,
    #[serde(rename = "levelChanging")]
    level_changing: bool,
    #[serde(rename = "levelChangeDeadline")]
    level_change_deadline: Option<i64>,
    #[serde(rename = "eatenEvents")]
    eaten_events: Vec<EatenEvent>,
    #[serde(rename = "pausedPlayers")]
    paused_players: Vec<String>,
    #[serde(rename = "spectatorCount")]
    spectator_count: usize,
  },
  LevelChange {
    level: u32,
    walls: Vec<Cell>,
  },
  PauseState {
    #[serde(rename = "pausedPlayers")]
    paused_players: Vec<String>,
  },
  PlayerLocationChanged {
    #[serde(rename = "playerId")]
    player_id: String,
    location: Location,
  },
  GameEnd,
  MoveToLobby,
}

pub fn encode(message: &ServerMessage) -> Option<String> {
  match serde_json::to_string(message) {
    Ok(text) => Some(text),
    Err(error) => {
      tracing::warn!(?error, "failed to encode server message");
      None
    }
  }
}
