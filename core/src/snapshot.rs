use serde::Serialize;

use crate::playfield::{StackRow, ROWS};
use crate::tetromino::Tetromino;

/// Deep copy of the playfield state published by the game loop.
///
/// Snapshots are immutable by construction: consumers (renderer, network
/// sender) never hold a reference into the live playfield, so they can read
/// while the loop keeps mutating.
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    pub stack: [StackRow; ROWS],
    pub current: Option<Tetromino>,
    pub next: Option<Tetromino>,
    pub level: u32,
    pub lines_cleared: u32,
    pub game_over: bool,
}
