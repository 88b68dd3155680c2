use super::constants::INPUT_BUFFER_LENGTH;
use super::types::{Direction, Player};
use crate::error::GameError;

pub fn parse_direction(value: i64) -> Result<Direction, GameError> {
    let code = i8::try_from(value).map_err(|_| {
        GameError::InvalidArgument(format!("direction code {value} is out of range"))
    })?;
    Direction::try_from(code)
}

impl Player {
    /// Queues a turn. Returns `false` when the input is dropped: the buffer is
    /// full, or the turn repeats or reverses the move that will run before it.
    pub fn submit_input(&mut self, direction: Direction) -> bool {
        if self.inputs.len() >= INPUT_BUFFER_LENGTH {
            return false;
        }

        let reference = self.inputs.back().copied().or(self.direction);
        if let Some(previous) = reference {
            if previous == direction || previous.is_opposite(direction) {
                return false;
            }
        }

        self.inputs.push_back(direction);
        true
    }
}
