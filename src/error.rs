use std::fmt;

/// Failures raised inside a room's simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// A malformed cell or direction reached the core.
    InvalidArgument(String),
    /// The occupancy index no longer matches the bodies and apples on the board.
    Inconsistent(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(m) => write!(f, "invalid argument: {m}"),
            Self::Inconsistent(m) => write!(f, "inconsistent room state: {m}"),
        }
    }
}

impl std::error::Error for GameError {}

/// Reasons a join request is turned away. Surfaced only to the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    NotFound(String),
    Full,
    InProgress,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(room_id) => write!(f, "room {room_id} not found"),
            Self::Full => write!(f, "Room is full"),
            Self::InProgress => write!(f, "Game is in progress"),
        }
    }
}

impl std::error::Error for JoinError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_errors_render_client_facing_text() {
        assert_eq!(
            JoinError::NotFound("abc123".to_string()).to_string(),
            "room abc123 not found"
        );
        assert_eq!(JoinError::Full.to_string(), "Room is full");
        assert_eq!(JoinError::InProgress.to_string(), "Game is in progress");
    }
}
