//! Game engine for a two-player guideline Tetris.
//!
//! The engine is split into the piece layer ([`tetromino`], [`bag`]), the
//! rule layer ([`playfield`]) and the asynchronous [`game`] loop that drives
//! a playfield under gravity and player actions. Consumers never touch the
//! live playfield: the loop publishes deep-copy [`GameSnapshot`] values on a
//! channel, so renderers and the network layer read without locks.

pub mod bag;
pub mod game;
pub mod playfield;
pub mod snapshot;
pub mod srs;
pub mod tetromino;

pub use bag::Bag;
pub use game::Game;
pub use playfield::{Action, Playfield, StackRow, COLS, ROWS};
pub use snapshot::GameSnapshot;
pub use tetromino::{Rotation, Shape, Tetromino};
