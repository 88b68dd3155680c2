use super::constants::MAX_PLAYERS;
use crate::error::GameError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Heading on the grid. The magnitude picks the axis and the sign picks the
/// way along it, so the reverse of any direction is its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
#[repr(i8)]
pub enum Direction {
    Left = -1,
    Right = 1,
    Up = 2,
    Down = -2,
}

impl Direction {
    #[cfg(test)]
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn opposite(self) -> Self {
        match -self.code() {
            -1 => Direction::Left,
            1 => Direction::Right,
            2 => Direction::Up,
            _ => Direction::Down,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }

    /// Unit step on the grid. `y` grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = GameError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Direction::Left),
            1 => Ok(Direction::Right),
            2 => Ok(Direction::Up),
            -2 => Ok(Direction::Down),
            other => Err(GameError::InvalidArgument(format!(
                "direction code {other} is not one of -2, -1, 1, 2"
            ))),
        }
    }
}

impl From<Direction> for i8 {
    fn from(value: Direction) -> Self {
        value.code()
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub direction: Option<Direction>,
    pub inputs: VecDeque<Direction>,
    pub segments: VecDeque<Cell>,
    pub alive: bool,
    pub ready: bool,
}

impl Player {
    pub fn new(id: String, head: Option<Cell>) -> Self {
        Self {
            id,
            direction: None,
            inputs: VecDeque::new(),
            segments: head.into_iter().collect(),
            alive: true,
            ready: false,
        }
    }

    pub fn head(&self) -> Option<Cell> {
        self.segments.front().copied()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id.clone(),
            direction: self.direction.map_or(0, Direction::code),
            alive: self.alive,
            ready: self.ready,
            segments: self.segments.iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn from_public_flag(public: bool) -> Self {
        if public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    pub borders: bool,
    #[serde(rename = "playerCap")]
    pub player_cap: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            borders: true,
            player_cap: MAX_PLAYERS,
        }
    }
}

impl RoomSettings {
    /// Rooms never hold more than two players, whatever the client asked for.
    pub fn normalized(self) -> Self {
        Self {
            borders: self.borders,
            player_cap: MAX_PLAYERS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    Waiting,
    Lobby,
    Playing,
    Over,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub id: String,
    pub direction: i8,
    pub alive: bool,
    pub ready: bool,
    pub segments: Vec<Cell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameStateSnapshot {
    pub phase: RoomPhase,
    #[serde(rename = "gameStarted")]
    pub game_started: bool,
    #[serde(rename = "numReady")]
    pub num_ready: usize,
    pub apples: Vec<Cell>,
    pub borders: bool,
}
