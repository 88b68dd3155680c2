use crate::game::input::parse_direction;
use crate::game::types::{Direction, GameStateSnapshot, PlayerSnapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Join,
    Ready { ready: bool },
    Input { direction: Direction },
    Chat { content: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum JsonClientMessage {
    #[serde(rename = "join")]
    Join,
    #[serde(rename = "ready")]
    Ready { ready: bool },
    #[serde(rename = "input")]
    Input { direction: i64 },
    #[serde(rename = "message")]
    Message { content: String },
}

/// Decodes one text frame. Malformed frames and unknown direction codes are
/// dropped here so nothing invalid reaches a room.
pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
    let message = serde_json::from_str::<JsonClientMessage>(text).ok()?;
    match message {
        JsonClientMessage::Join => Some(ClientMessage::Join),
        JsonClientMessage::Ready { ready } => Some(ClientMessage::Ready { ready }),
        JsonClientMessage::Input { direction } => match parse_direction(direction) {
            Ok(direction) => Some(ClientMessage::Input { direction }),
            Err(error) => {
                tracing::debug!(%error, "dropping input frame");
                None
            }
        },
        JsonClientMessage::Message { content } => Some(ClientMessage::Chat { content }),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "welcome")]
    Welcome {
        #[serde(rename = "playerId")]
        player_id: String,
    },
    #[serde(rename = "playerJoined")]
    PlayerJoined {
        players: Vec<PlayerSnapshot>,
        #[serde(rename = "gameState")]
        game_state: GameStateSnapshot,
    },
    #[serde(rename = "lobbyState")]
    LobbyState {
        #[serde(rename = "gameState")]
        game_state: GameStateSnapshot,
    },
    #[serde(rename = "readyUpdate")]
    ReadyUpdate {
        #[serde(rename = "gameState")]
        game_state: GameStateSnapshot,
    },
    #[serde(rename = "gameStart")]
    GameStart {
        players: Vec<PlayerSnapshot>,
        #[serde(rename = "gameState")]
        game_state: GameStateSnapshot,
    },
    #[serde(rename = "tickUpdate")]
    TickUpdate {
        players: Vec<PlayerSnapshot>,
        #[serde(rename = "gameState")]
        game_state: GameStateSnapshot,
    },
    #[serde(rename = "gameOver")]
    GameOver {
        players: Vec<PlayerSnapshot>,
        #[serde(rename = "gameState")]
        game_state: GameStateSnapshot,
    },
    #[serde(rename = "systemMessage")]
    SystemMessage { text: String },
    #[serde(rename = "errorMessage")]
    ErrorMessage { text: String },
    #[serde(rename = "chatMessage")]
    ChatMessage {
        #[serde(rename = "playerId")]
        player_id: String,
        content: String,
    },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::LobbyState { .. } => "lobbyState",
            Self::ReadyUpdate { .. } => "readyUpdate",
            Self::GameStart { .. } => "gameStart",
            Self::TickUpdate { .. } => "tickUpdate",
            Self::GameOver { .. } => "gameOver",
            Self::SystemMessage { .. } => "systemMessage",
            Self::ErrorMessage { .. } => "errorMessage",
            Self::ChatMessage { .. } => "chatMessage",
        }
    }

    pub fn encode(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(payload) => Some(payload),
            Err(error) => {
                tracing::error!(%error, kind = self.kind(), "failed to encode server message");
                None
            }
        }
    }
}
