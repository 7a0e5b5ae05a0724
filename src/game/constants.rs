pub const GRID_W: i32 = 40;
pub const GRID_H: i32 = 30;
pub const DEFAULT_TICK_RATE: u32 = 10;
pub const RESPAWN_DELAY_MS: i64 = 3000;
pub const LEVEL_COUNTDOWN_MS: i64 = 3000;
pub const TOTAL_LEVELS: u32 = 8;

pub const DEFAULT_FOOD_TARGET: u32 = 5;
pub const DEFAULT_FOOD_COUNT: usize = 3;
pub const DEFAULT_LIVES: u32 = 3;
pub const FOOD_TARGET_RANGE: (i64, i64) = (1, 19);
pub const FOOD_COUNT_RANGE: (i64, i64) = (1, 5);
pub const LIVES_RANGE: (i64, i64) = (1, 9);

pub const SPAWN_LENGTH: usize = 3;
pub const SPAWN_RUNWAY: usize = 10;
pub const SPAWN_STRICT_ATTEMPTS: usize = 200;
pub const SPAWN_RELAXED_TIERS: [usize; 3] = [5, 3, 0];
pub const SPAWN_TIER_ATTEMPTS: usize = 100;
pub const FOOD_PLACEMENT_ATTEMPTS: usize = 500;
// Spawn heads are sampled this far inside the border.
pub const SPAWN_MARGIN: i32 = 3;

pub const BOT_DECISION_MIN_MS: i64 = 200;
pub const BOT_DECISION_MAX_MS: i64 = 500;
pub const MAX_BOTS: usize = 6;

pub const MAX_CUSTOM_HEAD_LEN: usize = 256;

// Control frames a session may have queued before it counts as stalled.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 64;

pub const COLOR_POOL: [&str; 12] = [
  "#ff00ff",
  "#00ffff",
  "#ff3366",
  "#33ff66",
  "#ffcc00",
  "#ff6600",
  "#66ccff",
  "#cc66ff",
  "#00ff99",
  "#ff0066",
  "#33ccff",
  "#ffff00",
];

pub const HEAD_AVATARS: [&str; 12] = [
  "angel",
  "devil",
  "8ball",
  "alien",
  "skull",
  "robot",
  "crown",
  "fire",
  "ghost",
  "cyclops",
  "star",
  "diamond",
];

pub const DEFAULT_AVATAR: &str = "angel";
pub const BOT_AVATAR: &str = "robot";
