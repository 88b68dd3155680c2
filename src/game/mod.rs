pub mod apples;
pub mod constants;
pub mod grid;
pub mod input;
pub mod physics;
pub mod registry;
pub mod room;
pub mod snake;
pub mod types;
