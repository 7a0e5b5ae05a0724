use super::constants::{BOT_AVATAR, GRID_H, GRID_W, MAX_BOTS, OUTBOUND_QUEUE_CAPACITY};
use super::engine::Game;
use super::levels::sorted_walls;
use super::types::{Avatar, GameOptions, LobbyPlayer, Location, Player, PlayerSnapshot};
use crate::protocol::{self, ClientMessage, OptionsUpdate, ServerMessage};
use crate::shared::appearance::{palette_color, parse_color, resolve_avatar};
use crate::shared::names::{sanitize_player_name, DEFAULT_PLAYER_NAME};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use uuid::Uuid;

mod session;

pub use session::{LatestFrame, SessionIo};

#[derive(Debug)]
pub struct Room {
  state: Mutex<RoomState>,
  running: AtomicBool,
  tick_period: Duration,
}

#[derive(Debug)]
struct SessionEntry {
  outbound_state: Arc<LatestFrame>,
  outbound: mpsc::Sender<String>,
  player_id: Option<String>,
}

#[derive(Debug)]
struct RoomState {
  sessions: HashMap<String, SessionEntry>,
  game: Game,
  ready: HashSet<String>,
  paused: BTreeSet<String>,
  rng: StdRng,
  next_color: usize,
  next_bot: usize,
}

impl Room {
  pub fn new(tick_period: Duration) -> Self {
    Self {
      state: Mutex::new(RoomState::new(StdRng::from_entropy())),
      running: AtomicBool::new(false),
      tick_period,
    }
  }

  pub async fn add_session(&self) -> SessionIo {
    let session_id = Uuid::new_v4().to_string();
    let outbound_state = Arc::new(LatestFrame::new());
    let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let mut state = self.state.lock().await;
    state.sessions.insert(
      session_id.clone(),
      SessionEntry {
        outbound_state: Arc::clone(&outbound_state),
        outbound,
        player_id: None,
      },
    );
    tracing::debug!(%session_id, "session connected");
    SessionIo {
      session_id,
      outbound_state,
      outbound_rx,
    }
  }

  pub async fn remove_session(&self, session_id: &str) {
    let mut state = self.state.lock().await;
    state.disconnect_session(session_id);
  }

  pub async fn handle_text_message(self: &Arc<Self>, session_id: &str, text: &str) {
    let Some(message) = protocol::decode_client_message(text) else { return };
    let joined = matches!(message, ClientMessage::Join { .. });
    let mut state = self.state.lock().await;
    state.handle_client_message(session_id, message, RoomState::now_millis());
    drop(state);
    if joined {
      self.ensure_loop();
    }
  }

  fn ensure_loop(self: &Arc<Self>) {
    if self
      .running
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return;
    }

    let room = Arc::clone(self);
    tokio::spawn(async move {
      let mut interval = tokio::time::interval(room.tick_period);
      loop {
        interval.tick().await;
        let mut state = room.state.lock().await;
        if state.sessions.is_empty() {
          room.running.store(false, Ordering::SeqCst);
          tracing::debug!("tick loop stopped");
          break;
        }
        state.tick(RoomState::now_millis());
      }
    });
  }
}

impl RoomState {
  fn new(rng: StdRng) -> Self {
    Self {
      sessions: HashMap::new(),
      game: Game::new(),
      ready: HashSet::new(),
      paused: BTreeSet::new(),
      rng,
      next_color: 0,
      next_bot: 1,
    }
  }

  fn now_millis() -> i64 {
    let now = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default();
    now.as_millis() as i64
  }

  fn handle_client_message(&mut self, session_id: &str, message: ClientMessage, now: i64) {
    match message {
      ClientMessage::Join {
        name,
        color,
        avatar,
        custom_head_ref,
      } => self.handle_join(
        session_id,
        name.as_deref(),
        color.as_deref(),
        avatar.as_deref(),
        custom_head_ref.as_deref(),
      ),
      ClientMessage::Ready => self.handle_ready(session_id, now),
      ClientMessage::GameOptions(update) => self.handle_game_options(session_id, &update),
      ClientMessage::AddBot => self.handle_add_bot(session_id),
      ClientMessage::RemoveBot { bot_id } => self.handle_remove_bot(session_id, bot_id.as_deref()),
      ClientMessage::Pause => self.handle_pause(session_id),
      ClientMessage::Input { direction } => {
        if !self.game.started {
          return;
        }
        let Some(player_id) = self.session_player_id(session_id) else { return };
        if self.paused.contains(&player_id) {
          return;
        }
        self.game.set_pending_direction(&player_id, direction);
      }
      ClientMessage::ReturnToLobby => self.handle_return_to_lobby(session_id),
    }
  }

  fn disconnect_session(&mut self, session_id: &str) {
    let Some(entry) = self.sessions.remove(session_id) else { return };
    tracing::debug!(session_id, "session disconnected");
    let Some(player_id) = entry.player_id else { return };
    self.game.players.remove(&player_id);
    self.ready.remove(&player_id);
    if self.paused.remove(&player_id) {
      self.broadcast_pause_state();
    }

    if self.human_count() == 0 {
      self.remove_bots();
      self.game.options = GameOptions::default();
      self.next_color = 0;
      self.next_bot = 1;
      if self.game.started {
        self.reset_session();
      } else {
        self.broadcast_lobby_state();
      }
      return;
    }
    if self.game.started && self.playing_human_count() == 0 {
      self.reset_session();
      return;
    }
    self.broadcast_lobby_state();
    self.try_start(Self::now_millis());
  }

  fn handle_join(
    &mut self,
    session_id: &str,
    name: Option<&str>,
    color: Option<&str>,
    avatar: Option<&str>,
    custom_head: Option<&str>,
  ) {
    let Some(entry) = self.sessions.get(session_id) else { return };
    if entry.player_id.is_some() {
      return;
    }

    let player_id = Uuid::new_v4().to_string();
    let name = sanitize_player_name(name.unwrap_or(DEFAULT_PLAYER_NAME), DEFAULT_PLAYER_NAME);
    let color = color
      .and_then(parse_color)
      .unwrap_or_else(|| self.take_palette_color());
    let mut player = Player::new(
      player_id.clone(),
      name,
      color,
      resolve_avatar(avatar, custom_head),
      false,
    );
    player.lives = self.game.options.starting_lives;
    let running = self.game.started;
    if running {
      player.location = Location::Spectating;
    }
    tracing::debug!(%player_id, name = player.name.as_str(), spectating = running, "player joined");
    self.game.players.insert(player_id.clone(), player);
    if let Some(entry) = self.sessions.get_mut(session_id) {
      entry.player_id = Some(player_id.clone());
    }

    self.send_to(session_id, &ServerMessage::Welcome { player_id });
    if running {
      self.send_to(session_id, &ServerMessage::GameInProgress);
      self.broadcast_lobby_state();
      self.send_state_to(session_id);
    } else {
      self.broadcast_lobby_state();
    }
  }

  fn handle_ready(&mut self, session_id: &str, now: i64) {
    let Some(player_id) = self.session_player_id(session_id) else { return };
    let in_lobby = self
      .game
      .players
      .get(&player_id)
      .is_some_and(|player| player.location == Location::Lobby);
    if !in_lobby {
      return;
    }
    if !self.ready.remove(&player_id) {
      self.ready.insert(player_id);
    }
    self.broadcast_lobby_state();
    self.try_start(now);
  }

  fn handle_game_options(&mut self, session_id: &str, update: &OptionsUpdate) {
    if self.game.started || self.session_player_id(session_id).is_none() {
      return;
    }
    if protocol::apply_options_update(&mut self.game.options, update) {
      tracing::debug!(options = ?self.game.options, "game options updated");
      self.broadcast_lobby_state();
    }
  }

  fn handle_add_bot(&mut self, session_id: &str) {
    if self.game.started || self.session_player_id(session_id).is_none() {
      return;
    }
    if self.bot_count() >= MAX_BOTS {
      return;
    }
    let index = self.next_bot;
    self.next_bot += 1;
    let bot_id = format!("bot-{index}");
    let color = self.take_palette_color();
    let mut bot = Player::new(
      bot_id.clone(),
      format!("Bot-{index}"),
      color,
      Avatar::Emoji(BOT_AVATAR.to_string()),
      true,
    );
    bot.lives = self.game.options.starting_lives;
    self.game.players.insert(bot_id.clone(), bot);
    tracing::debug!(%bot_id, "bot added");
    self.broadcast_lobby_state();
  }

  fn handle_remove_bot(&mut self, session_id: &str, bot_id: Option<&str>) {
    if self.game.started || self.session_player_id(session_id).is_none() {
      return;
    }
    let Some(bot_id) = bot_id else { return };
    if !self.game.players.get(bot_id).is_some_and(|player| player.is_bot) {
      return;
    }
    self.game.players.remove(bot_id);
    tracing::debug!(bot_id, "bot removed");
    self.broadcast_lobby_state();
  }

  fn handle_pause(&mut self, session_id: &str) {
    if !self.game.started {
      return;
    }
    let Some(player_id) = self.session_player_id(session_id) else { return };
    let playing = self
      .game
      .players
      .get(&player_id)
      .is_some_and(|player| !player.is_bot && player.is_playing());
    if !playing {
      return;
    }
    if !self.paused.remove(&player_id) {
      self.paused.insert(player_id);
    }
    self.broadcast_pause_state();
  }

  fn handle_return_to_lobby(&mut self, session_id: &str) {
    let Some(player_id) = self.session_player_id(session_id) else { return };
    let lives = self.game.options.starting_lives;
    let Some(player) = self.game.players.get_mut(&player_id) else { return };
    if player.location == Location::Lobby {
      return;
    }
    player.reset_for_lobby(lives);
    self.ready.remove(&player_id);
    if self.paused.remove(&player_id) {
      self.broadcast_pause_state();
    }

    self.send_to(session_id, &ServerMessage::MoveToLobby);
    self.broadcast(&ServerMessage::PlayerLocationChanged {
      player_id,
      location: Location::Lobby,
    });

    if self.game.started && self.playing_human_count() == 0 {
      self.reset_session();
    } else {
      self.broadcast_lobby_state();
    }
  }

  fn try_start(&mut self, now: i64) {
    if self.game.started {
      return;
    }
    let mut lobby_humans = self
      .game
      .players
      .values()
      .filter(|player| !player.is_bot && player.location == Location::Lobby)
      .peekable();
    if lobby_humans.peek().is_none() {
      return;
    }
    if !lobby_humans.all(|player| self.ready.contains(&player.id)) {
      return;
    }

    for player in self.game.players.values_mut() {
      if player.location == Location::Lobby {
        player.location = Location::Playing;
      }
    }
    self.ready.clear();
    self.paused.clear();
    self.game.start(&mut self.rng, now);

    let message = ServerMessage::GameStart {
      level: self.game.arena.level,
      walls: sorted_walls(&self.game.arena.walls),
      grid_size: [GRID_W, GRID_H],
    };
    self.broadcast(&message);
    self.broadcast_state();
  }

  fn reset_session(&mut self) {
    self.broadcast(&ServerMessage::GameEnd);
    self.game.reset();
    self.ready.clear();
    self.paused.clear();
    tracing::info!("session reset to lobby");
    self.broadcast_lobby_state();
  }

  fn tick(&mut self, now: i64) {
    if !self.game.started {
      return;
    }
    if self.paused.is_empty() {
      let outcome = self.game.tick(&mut self.rng, now);
      if outcome.level_changed {
        let message = ServerMessage::LevelChange {
          level: self.game.arena.level,
          walls: sorted_walls(&self.game.arena.walls),
        };
        self.broadcast(&message);
      }
    }
    self.broadcast_state();
  }

  fn session_player_id(&self, session_id: &str) -> Option<String> {
    self
      .sessions
      .get(session_id)
      .and_then(|entry| entry.player_id.clone())
  }

  fn human_count(&self) -> usize {
    self.game.players.values().filter(|player| !player.is_bot).count()
  }

  fn playing_human_count(&self) -> usize {
    self.game.playing().filter(|player| !player.is_bot).count()
  }

  fn bot_count(&self) -> usize {
    self.game.players.values().filter(|player| player.is_bot).count()
  }

  fn remove_bots(&mut self) {
    self.game.players.retain(|_, player| !player.is_bot);
  }

  fn take_palette_color(&mut self) -> String {
    let color = palette_color(self.next_color);
    self.next_color += 1;
    color
  }

  fn build_lobby_message(&self) -> ServerMessage {
    let players = self
      .game
      .players
      .values()
      .map(|player| LobbyPlayer {
        player_id: player.id.clone(),
        name: player.name.clone(),
        color: player.color.clone(),
        avatar: player.avatar.clone(),
        ready: player.is_bot || self.ready.contains(&player.id),
        is_bot: player.is_bot,
        location: player.location,
      })
      .collect();
    ServerMessage::LobbyState {
      players,
      game_options: self.game.options,
    }
  }

  fn build_state_message(&self) -> ServerMessage {
    ServerMessage::State {
      players: self
        .game
        .playing()
        .map(|player| (player.id.clone(), PlayerSnapshot::from(player)))
        .collect(),
      food: self.game.arena.food.clone(),
      level: self.game.arena.level,
      food_eaten: self.game.food_eaten,
      food_target: self.game.options.food_target,
      level_changing: self.game.arena.level_changing,
      level_change_deadline: self.game.arena.level_change_at,
      eaten_events: self.game.eaten_events.clone(),
      paused_players: self.paused.iter().cloned().collect(),
      spectator_count: self.game.spectator_count(),
    }
  }

  fn broadcast_lobby_state(&mut self) {
    let message = self.build_lobby_message();
    self.broadcast(&message);
  }

  fn broadcast_pause_state(&mut self) {
    let message = ServerMessage::PauseState {
      paused_players: self.paused.iter().cloned().collect(),
    };
    self.broadcast(&message);
  }

  fn broadcast_state(&mut self) {
    let Some(payload) = protocol::encode(&self.build_state_message()) else { return };
    let mut stale = Vec::new();
    for (session_id, entry) in &self.sessions {
      if entry.outbound.is_closed() {
        stale.push(session_id.clone());
      } else {
        entry.outbound_state.store(payload.clone());
      }
    }
    for session_id in stale {
      tracing::warn!(%session_id, "dropping session with closed channel");
      self.disconnect_session(&session_id);
    }
  }

  fn send_state_to(&self, session_id: &str) {
    let Some(entry) = self.sessions.get(session_id) else { return };
    let Some(payload) = protocol::encode(&self.build_state_message()) else { return };
    entry.outbound_state.store(payload);
  }

  fn send_to(&self, session_id: &str, message: &ServerMessage) {
    let Some(entry) = self.sessions.get(session_id) else { return };
    let Some(payload) = protocol::encode(message) else { return };
    let _ = entry.outbound.try_send(payload);
  }

  /// Queues a control message for every session. A session whose queue is
  /// closed or full is dropped.
  fn broadcast(&mut self, message: &ServerMessage) {
    let Some(payload) = protocol::encode(message) else { return };
    let mut stale = Vec::new();
    for (session_id, entry) in &self.sessions {
      match entry.outbound.try_send(payload.clone()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => stale.push((session_id.clone(), "full")),
        Err(TrySendError::Closed(_)) => stale.push((session_id.clone(), "closed")),
      }
    }
    for (session_id, reason) in stale {
      tracing::warn!(%session_id, reason, "dropping session with unusable channel");
      self.disconnect_session(&session_id);
    }
  }
}
