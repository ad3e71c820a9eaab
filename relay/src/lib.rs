//! Pairing broker and relay for two-player Tetris matches.
//!
//! The broker holds at most one waiting game at a time. The first incoming
//! connection opens a session and waits; the second completes it. Once both
//! seats are ready each side's frames are relayed verbatim to the other, in
//! order, until either side leaves. The wire protocol is a single
//! [`GameMessage`] shape flowing in both directions over a framed stream
//! (WebSocket text frames carrying JSON).

pub mod broker;
pub mod error;
pub mod message;
pub mod session;

pub use broker::{Broker, CLOSE_REASON_CANCELLED, CLOSE_REASON_TIMEOUT, DEFAULT_WAIT_TIMEOUT};
pub use error::{RelayError, Result};
pub use message::{stack_to_wire, wire_to_stack, GameMessage};
pub use session::{GameSession, Seat};
