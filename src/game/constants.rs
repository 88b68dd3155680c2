pub const GRID_WIDTH: i32 = 20;
pub const GRID_HEIGHT: i32 = 20;
pub const APPLE_COUNT: usize = 6;
pub const INPUT_BUFFER_LENGTH: usize = 8;
pub const MAX_PLAYERS: usize = 2;
pub const TICK_RATE_HZ: f64 = 7.0;
pub const MAX_LISTED_ROOMS: usize = 15;
pub const MAX_CHAT_LENGTH: usize = 100;
pub const ROOM_ID_LENGTH: usize = 6;
