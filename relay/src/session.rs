use std::fmt;
use std::sync::Mutex;

use crate::message::GameMessage;

/// One of the two seats in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Player1,
    Player2,
}

impl Seat {
    pub fn opponent(self) -> Seat {
        match self {
            Seat::Player1 => Seat::Player2,
            Seat::Player2 => Seat::Player1,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seat::Player1 => write!(f, "player1"),
            Seat::Player2 => write!(f, "player2"),
        }
    }
}

struct SessionState {
    p1_ready: bool,
    p2_ready: bool,
    closed: bool,
    p1_tx: Option<flume::Sender<GameMessage>>,
    p2_tx: Option<flume::Sender<GameMessage>>,
    p1_rx: Option<flume::Receiver<GameMessage>>,
    p2_rx: Option<flume::Receiver<GameMessage>>,
}

/// A two-seat container coordinating the two player streams of one match.
///
/// Each seat has a single-slot side channel: the seat's inbound pump writes
/// into it and the opponent's handler reads from it. Closing the session
/// drops the stored channel ends so both pumps wake; `close` is idempotent,
/// guarded by the `closed` flag.
pub struct GameSession {
    state: Mutex<SessionState>,
}

impl GameSession {
    pub fn new() -> GameSession {
        let (p1_tx, p1_rx) = flume::bounded(1);
        let (p2_tx, p2_rx) = flume::bounded(1);
        GameSession {
            state: Mutex::new(SessionState {
                p1_ready: false,
                p2_ready: false,
                closed: false,
                p1_tx: Some(p1_tx),
                p2_tx: Some(p2_tx),
                p1_rx: Some(p1_rx),
                p2_rx: Some(p2_rx),
            }),
        }
    }

    /// Mark a seat as occupied.
    pub fn ready(&self, seat: Seat) {
        let mut state = self.state.lock().unwrap();
        match seat {
            Seat::Player1 => state.p1_ready = true,
            Seat::Player2 => state.p2_ready = true,
        }
    }

    /// Both seats occupied.
    pub fn is_started(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.p1_ready && state.p2_ready
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Sender for a seat's own side channel, if the session is still open.
    pub fn sender(&self, seat: Seat) -> Option<flume::Sender<GameMessage>> {
        let state = self.state.lock().unwrap();
        match seat {
            Seat::Player1 => state.p1_tx.clone(),
            Seat::Player2 => state.p2_tx.clone(),
        }
    }

    /// Take the receiving end of a seat's side channel. Each end is handed
    /// out once, to the opposing handler; when that handler exits the end
    /// drops and the seat's pump unblocks.
    pub fn take_receiver(&self, seat: Seat) -> Option<flume::Receiver<GameMessage>> {
        let mut state = self.state.lock().unwrap();
        match seat {
            Seat::Player1 => state.p1_rx.take(),
            Seat::Player2 => state.p2_rx.take(),
        }
    }

    /// Close both side channels once; later calls are no-ops.
    pub fn close(&self, seat: Seat) {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return;
        }
        state.closed = true;
        state.p1_tx.take();
        state.p2_tx.take();
        state.p1_rx.take();
        state.p2_rx.take();
        tracing::info!("session closed by {seat}");
    }
}

impl Default for GameSession {
    fn default() -> GameSession {
        GameSession::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_starts_once_both_seats_are_ready() {
        let session = GameSession::new();
        assert!(!session.is_started());
        session.ready(Seat::Player1);
        assert!(!session.is_started());
        session.ready(Seat::Player2);
        assert!(session.is_started());
    }

    #[test]
    fn close_is_idempotent_and_disconnects_both_channels() {
        let session = GameSession::new();
        let p1_tx = session.sender(Seat::Player1).expect("p1 sender");
        let p1_rx = session.take_receiver(Seat::Player1).expect("p1 receiver");

        session.close(Seat::Player2);
        session.close(Seat::Player1);
        assert!(session.is_closed());
        assert!(session.sender(Seat::Player1).is_none());
        assert!(session.take_receiver(Seat::Player2).is_none());

        // the held clone still works until dropped; the stored ends are gone
        p1_tx.send(GameMessage::started()).expect("slot free");
        assert!(p1_rx.recv().expect("queued message").is_started);
        drop(p1_tx);
        assert!(p1_rx.recv().is_err());
    }

    #[test]
    fn side_channels_are_fifo() {
        let session = GameSession::new();
        let tx = session.sender(Seat::Player1).expect("sender");
        let rx = session.take_receiver(Seat::Player1).expect("receiver");
        tx.send(GameMessage::hello("a")).expect("send");
        // single-slot channel: the second send would block, receive first
        assert_eq!(rx.recv().expect("first").name, "a");
        tx.send(GameMessage::hello("b")).expect("send");
        assert_eq!(rx.recv().expect("second").name, "b");
    }

    #[test]
    fn seats_oppose_each_other() {
        assert_eq!(Seat::Player1.opponent(), Seat::Player2);
        assert_eq!(Seat::Player2.opponent(), Seat::Player1);
        assert_eq!(Seat::Player1.to_string(), "player1");
    }
}
