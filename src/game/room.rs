use super::apples::{eat, init_apples, reset_apples, top_up_apples};
use super::constants::{GRID_HEIGHT, GRID_WIDTH, MAX_CHAT_LENGTH};
use super::grid::CellGrid;
use super::physics::{resolve_collisions, Arena, Outcome};
use super::snake::{move_snake, reset_snake};
use super::types::{
    Cell, Direction, GameStateSnapshot, Player, PlayerSnapshot, RoomPhase, RoomSettings,
    Visibility,
};
use crate::error::{GameError, JoinError};
use crate::protocol::ServerMessage;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};


/// One arena. Every event and every tick takes `state` for its whole step,
/// so nothing interleaves inside a room while separate rooms never contend.
#[derive(Debug)]
pub struct Room {
    id: String,
    name: String,
    visibility: Visibility,
    settings: RoomSettings,
    tick_interval: Duration,
    created_at: Instant,
    player_count: AtomicUsize,
    closed: AtomicBool,
    state: Mutex<RoomState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    NotMember,
    Left,
    Emptied,
}

#[derive(Debug)]
struct TickDriver {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct RoomState {
    settings: RoomSettings,
    players: Vec<Player>,
    sessions: HashMap<String, UnboundedSender<String>>,
    grid: CellGrid,
    apples: Vec<Cell>,
    game_started: bool,
    num_ready: usize,
    generation: u64,
    driver: Option<TickDriver>,
    closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Continue,
    Over,
}

impl Room {
    pub fn new(
        id: String,
        name: String,
        visibility: Visibility,
        settings: RoomSettings,
        tick_interval: Duration,
    ) -> Self {
        let settings = settings.normalized();
        Self {
            id,
            name,
            visibility,
            settings,
            tick_interval,
            created_at: Instant::now(),
            player_count: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            state: Mutex::new(RoomState::new(settings)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Public, still open, and with a free seat.
    pub fn is_listable(&self) -> bool {
        self.visibility == Visibility::Public
            && !self.is_closed()
            && self.player_count() < self.settings.player_cap
    }

    #[cfg(test)]
    pub async fn phase(&self) -> RoomPhase {
        self.state.lock().await.phase()
    }

    pub async fn join(
        &self,
        player_id: &str,
        sender: UnboundedSender<String>,
    ) -> Result<(), JoinError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(JoinError::NotFound(self.id.clone()));
        }
        if state.players.len() >= self.settings.player_cap {
            return Err(JoinError::Full);
        }
        if state.game_started {
            return Err(JoinError::InProgress);
        }

        let head = state.grid.take_random_free();
        if head.is_none() {
            tracing::warn!(player_id, room_id = %self.id, "no free cell for joining player");
        }
        state.players.push(Player::new(player_id.to_string(), head));
        state.sessions.insert(player_id.to_string(), sender);
        self.player_count.store(state.players.len(), Ordering::SeqCst);
        tracing::info!(player_id, room_id = %self.id, "player joined room");

        state.send_to(
            player_id,
            &ServerMessage::Welcome {
                player_id: player_id.to_string(),
            },
        );
        state.broadcast(&ServerMessage::SystemMessage {
            text: format!("{player_id} has joined the room"),
        });
        let phase = state.phase();
        state.broadcast(&ServerMessage::PlayerJoined {
            players: state.player_snapshots(),
            game_state: state.game_state(phase),
        });
        state.broadcast(&ServerMessage::LobbyState {
            game_state: state.game_state(phase),
        });
        Ok(())
    }

    pub async fn leave(&self, player_id: &str) -> LeaveOutcome {
        let mut state = self.state.lock().await;
        state.sessions.remove(player_id);
        let Some(index) = state.players.iter().position(|player| player.id == player_id) else {
            return LeaveOutcome::NotMember;
        };

        let player = state.players.remove(index);
        if player.ready {
            state.num_ready = state.num_ready.saturating_sub(1);
        }
        if let Err(error) = state.release_body(&player) {
            tracing::error!(player_id, room_id = %self.id, %error, "failed to release cells");
        }
        self.player_count.store(state.players.len(), Ordering::SeqCst);

        if state.players.is_empty() {
            state.stop_driver();
            state.closed = true;
            self.closed.store(true, Ordering::SeqCst);
            tracing::info!(room_id = %self.id, room_name = %self.name, "room destroyed");
            return LeaveOutcome::Emptied;
        }

        tracing::info!(player_id, room_id = %self.id, "player left room");
        state.broadcast(&ServerMessage::SystemMessage {
            text: format!("{player_id} has left"),
        });
        if !state.game_started {
            state.broadcast(&ServerMessage::LobbyState {
                game_state: state.game_state(RoomPhase::Lobby),
            });
        }
        LeaveOutcome::Left
    }

    pub async fn set_ready(self: &Arc<Self>, player_id: &str, ready: bool) {
        let mut state = self.state.lock().await;
        if state.closed || state.game_started {
            return;
        }
        let Some(player) = state.players.iter_mut().find(|player| player.id == player_id) else {
            return;
        };
        if player.ready == ready {
            return;
        }
        player.ready = ready;
        if ready {
            state.num_ready += 1;
        } else {
            state.num_ready = state.num_ready.saturating_sub(1);
        }

        state.broadcast(&ServerMessage::ReadyUpdate {
            game_state: state.game_state(RoomPhase::Lobby),
        });
        if state.num_ready >= self.settings.player_cap {
            self.start_game(&mut state);
        }
    }

    pub async fn submit_input(&self, player_id: &str, direction: Direction) -> bool {
        let mut state = self.state.lock().await;
        state
            .players
            .iter_mut()
            .find(|player| player.id == player_id)
            .map_or(false, |player| player.submit_input(direction))
    }

    pub async fn send_chat(&self, player_id: &str, content: String) -> bool {
        if content.chars().count() > MAX_CHAT_LENGTH {
            return false;
        }
        let state = self.state.lock().await;
        if !state.players.iter().any(|player| player.id == player_id) {
            return false;
        }
        state.broadcast(&ServerMessage::ChatMessage {
            player_id: player_id.to_string(),
            content,
        });
        true
    }

    /// Closes a room nobody has joined for `max_idle`. Returns whether the
    /// room is closed afterwards.
    pub async fn close_if_idle(&self, max_idle: Duration) -> bool {
        let mut state = self.state.lock().await;
        if state.closed {
            return true;
        }
        if !state.players.is_empty() || self.created_at.elapsed() < max_idle {
            return false;
        }
        state.stop_driver();
        state.closed = true;
        self.closed.store(true, Ordering::SeqCst);
        true
    }

    fn start_game(self: &Arc<Self>, state: &mut RoomState) {
        state.reset_for_game();
        state.broadcast(&ServerMessage::GameStart {
            players: state.player_snapshots(),
            game_state: state.game_state(RoomPhase::Playing),
        });
        tracing::info!(room_id = %self.id, players = state.players.len(), "game started");

        state.stop_driver();
        let generation = state.generation;
        let room = Arc::downgrade(self);
        let period = self.tick_interval;
        let handle = tokio::spawn(drive_ticks(room, generation, period));
        state.driver = Some(TickDriver { generation, handle });
    }

    /// Runs one tick for the driver of `generation`. Returns `false` once that
    /// driver should exit.
    async fn run_tick(&self, generation: u64) -> bool {
        let mut state = self.state.lock().await;
        if state.closed || !state.game_started || state.generation != generation {
            return false;
        }

        match state.tick() {
            Ok(TickOutcome::Continue) => {
                state.broadcast(&ServerMessage::TickUpdate {
                    players: state.player_snapshots(),
                    game_state: state.game_state(RoomPhase::Playing),
                });
                true
            }
            Ok(TickOutcome::Over) => {
                self.end_game(&mut state);
                false
            }
            Err(error) => {
                tracing::error!(room_id = %self.id, %error, "ending game after simulation failure");
                self.end_game(&mut state);
                false
            }
        }
    }

    fn end_game(&self, state: &mut RoomState) {
        state.stop_driver();
        state.game_started = false;
        state.num_ready = 0;
        for player in &mut state.players {
            player.ready = false;
        }
        state.broadcast(&ServerMessage::GameOver {
            players: state.player_snapshots(),
            game_state: state.game_state(RoomPhase::Over),
        });
        tracing::info!(room_id = %self.id, "game over");
    }
}

async fn drive_ticks(room: Weak<Room>, generation: u64, period: Duration) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        let Some(room) = room.upgrade() else { break };
        if !room.run_tick(generation).await {
            break;
        }
    }
}

impl RoomState {
    fn new(settings: RoomSettings) -> Self {
        let mut grid = CellGrid::new(GRID_WIDTH, GRID_HEIGHT);
        let apples = init_apples(&mut grid);
        Self {
            settings,
            players: Vec::new(),
            sessions: HashMap::new(),
            grid,
            apples,
            game_started: false,
            num_ready: 0,
            generation: 0,
            driver: None,
            closed: false,
        }
    }

    fn phase(&self) -> RoomPhase {
        if self.players.is_empty() {
            RoomPhase::Waiting
        } else if self.game_started {
            RoomPhase::Playing
        } else {
            RoomPhase::Lobby
        }
    }

    fn arena(&self) -> Arena {
        Arena {
            width: self.grid.width(),
            height: self.grid.height(),
            borders: self.settings.borders,
        }
    }

    /// Invalidates the running driver, if any. The generation bump makes a
    /// tick already waiting on the lock bail out.
    fn stop_driver(&mut self) {
        self.generation += 1;
        if let Some(driver) = self.driver.take() {
            driver.handle.abort();
            tracing::debug!(generation = driver.generation, "tick driver stopped");
        }
    }

    fn reset_for_game(&mut self) {
        self.grid = CellGrid::new(self.grid.width(), self.grid.height());
        reset_apples(&mut self.apples, &mut self.grid);
        for player in &mut self.players {
            let head = self.grid.take_random_free();
            reset_snake(player, head);
        }
        self.num_ready = 0;
        self.game_started = true;
    }

    fn tick(&mut self) -> Result<TickOutcome, GameError> {
        top_up_apples(&mut self.apples, &mut self.grid);
        let arena = self.arena();

        for index in 0..self.players.len() {
            if !self.players[index].alive {
                continue;
            }
            let vacated = move_snake(&mut self.players[index]);
            let outcome = resolve_collisions(&mut self.players, index, &arena);
            if outcome != Outcome::Survived {
                tracing::debug!(
                    player_id = %self.players[index].id,
                    outcome = outcome.as_str(),
                    "player eliminated"
                );
            }
            self.record_step(index, vacated)?;
            if eat(&mut self.players[index], &mut self.apples, &mut self.grid) {
                tracing::debug!(
                    player_id = %self.players[index].id,
                    length = self.players[index].segments.len(),
                    "apple eaten"
                );
            }
        }

        self.verify_occupancy()?;
        if self.players.iter().any(|player| player.alive) {
            Ok(TickOutcome::Continue)
        } else {
            Ok(TickOutcome::Over)
        }
    }

    /// Brings the grid in line with one player's move: the head is taken if it
    /// is on the board, and the vacated tail is freed unless something else
    /// still sits there.
    fn record_step(&mut self, index: usize, vacated: Option<Cell>) -> Result<(), GameError> {
        if let Some(head) = self.players[index].head() {
            if self.grid.contains(head) {
                self.grid.remove(head)?;
            }
        }
        if let Some(tail) = vacated {
            self.release(tail)?;
        }
        Ok(())
    }

    fn release(&mut self, cell: Cell) -> Result<(), GameError> {
        if self.grid.contains(cell) && !self.is_covered(cell) {
            self.grid.add(cell)?;
        }
        Ok(())
    }

    fn release_body(&mut self, player: &Player) -> Result<(), GameError> {
        for cell in &player.segments {
            self.release(*cell)?;
        }
        Ok(())
    }

    fn is_covered(&self, cell: Cell) -> bool {
        self.apples.contains(&cell)
            || self
                .players
                .iter()
                .any(|player| player.segments.contains(&cell))
    }

    /// The occupied cells must be exactly the on-board segments plus apples.
    fn verify_occupancy(&self) -> Result<(), GameError> {
        let mut expected: HashSet<Cell> = self.apples.iter().copied().collect();
        for player in &self.players {
            expected.extend(
                player
                    .segments
                    .iter()
                    .copied()
                    .filter(|cell| self.grid.contains(*cell)),
            );
        }

        if let Some(cell) = expected.iter().find(|cell| self.grid.is_free(**cell)) {
            return Err(GameError::Inconsistent(format!(
                "cell ({}, {}) is covered but marked free",
                cell.x, cell.y
            )));
        }
        let occupied = self.grid.capacity() - self.grid.free_count();
        if occupied != expected.len() {
            return Err(GameError::Inconsistent(format!(
                "{occupied} cells marked occupied but {} are covered",
                expected.len()
            )));
        }
        Ok(())
    }

    fn player_snapshots(&self) -> Vec<PlayerSnapshot> {
        self.players.iter().map(Player::snapshot).collect()
    }

    fn game_state(&self, phase: RoomPhase) -> GameStateSnapshot {
        GameStateSnapshot {
            phase,
            game_started: self.game_started,
            num_ready: self.num_ready,
            apples: self.apples.clone(),
            borders: self.settings.borders,
        }
    }

    fn broadcast(&self, message: &ServerMessage) {
        let Some(payload) = message.encode() else { return };
        for sender in self.sessions.values() {
            let _ = sender.send(payload.clone());
        }
    }

    fn send_to(&self, player_id: &str, message: &ServerMessage) {
        let Some(sender) = self.sessions.get(player_id) else { return };
        let Some(payload) = message.encode() else { return };
        let _ = sender.send(payload);
    }
}

impl Drop for RoomState {
    fn drop(&mut self) {
        self.stop_driver();
    }
}
