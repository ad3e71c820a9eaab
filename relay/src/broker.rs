use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::WebSocketStream;

use crate::error::{RelayError, Result};
use crate::message::GameMessage;
use crate::session::{GameSession, Seat};

/// Default time player1 waits for an opponent.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Close reason sent when the wait for an opponent times out.
pub const CLOSE_REASON_TIMEOUT: &str = "deadline exceeded";
/// Close reason sent when a waiting player cancels.
pub const CLOSE_REASON_CANCELLED: &str = "cancelled";

/// Interval at which player1 polls session readiness while waiting.
const READY_POLL: Duration = Duration::from_millis(10);

/// The pairing broker.
///
/// Holds at most one waiting game. The first arriving connection allocates a
/// session and becomes player1; the next one completes it as player2 and
/// empties the slot. The lock is held only for the slot swap, never across
/// I/O.
pub struct Broker {
    waiting: Mutex<Option<Arc<GameSession>>>,
    wait_timeout: Duration,
}

impl Broker {
    pub fn new() -> Broker {
        Broker::with_wait_timeout(DEFAULT_WAIT_TIMEOUT)
    }

    pub fn with_wait_timeout(wait_timeout: Duration) -> Broker {
        Broker {
            waiting: Mutex::new(None),
            wait_timeout,
        }
    }

    /// Whether a game is currently waiting for its second player.
    pub fn has_waiting(&self) -> bool {
        self.waiting.lock().unwrap().is_some()
    }

    /// Run one connection through pairing and relay until it ends.
    ///
    /// The distinguished exits are [`RelayError::WaitTimeout`] and
    /// [`RelayError::Cancelled`] while waiting; both clear the waiting slot
    /// and surface the reason to the client in the close frame. Relay-phase
    /// endings are normal terminations.
    pub async fn handle<S>(&self, ws: WebSocketStream<S>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (session, seat) = self.assign_seat();
        let result = self.play(&session, seat, ws).await;
        session.close(seat);
        result
    }

    fn assign_seat(&self) -> (Arc<GameSession>, Seat) {
        let mut waiting = self.waiting.lock().unwrap();
        match waiting.take() {
            None => {
                let session = Arc::new(GameSession::new());
                session.ready(Seat::Player1);
                *waiting = Some(session.clone());
                (session, Seat::Player1)
            }
            Some(session) => {
                session.ready(Seat::Player2);
                (session, Seat::Player2)
            }
        }
    }

    /// Empty the waiting slot if it still points at this session, so the
    /// next arrival becomes a fresh player1 rather than joining a dead game.
    fn clear_waiting(&self, session: &Arc<GameSession>) {
        let mut waiting = self.waiting.lock().unwrap();
        if waiting
            .as_ref()
            .is_some_and(|waiting| Arc::ptr_eq(waiting, session))
        {
            *waiting = None;
        }
    }

    async fn play<S>(
        &self,
        session: &Arc<GameSession>,
        seat: Seat,
        ws: WebSocketStream<S>,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_tx, mut ws_rx) = ws.split();

        // the first inbound message names the player
        let hello = match read_message(&mut ws_rx).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                self.clear_waiting(session);
                return Err(RelayError::Handshake);
            }
            Err(e) => {
                self.clear_waiting(session);
                return Err(e);
            }
        };
        let name = hello.name;
        tracing::info!("{name} ({seat}) connected");

        // only player1 waits for the opponent
        if seat == Seat::Player1 {
            if let Err(e) = self.wait_for_opponent(session, &name, &mut ws_rx).await {
                self.clear_waiting(session);
                let reason = match &e {
                    RelayError::WaitTimeout => CLOSE_REASON_TIMEOUT,
                    _ => CLOSE_REASON_CANCELLED,
                };
                let _ = ws_tx
                    .send(Message::Close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: reason.into(),
                    })))
                    .await;
                return Err(e);
            }
        }

        ws_tx
            .send(Message::Text(GameMessage::started().encode()?.into()))
            .await?;
        tracing::info!("{name} ({seat}) match started");

        let inbound = tokio::spawn(inbound_pump(ws_rx, session.clone(), seat, name.clone()));
        let result = relay_outbound(session, seat, &name, &mut ws_tx, inbound).await;
        let _ = ws_tx.close().await;
        result
    }

    async fn wait_for_opponent<S>(
        &self,
        session: &Arc<GameSession>,
        name: &str,
        ws_rx: &mut SplitStream<WebSocketStream<S>>,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        tracing::info!("{name} (player1) waiting for an opponent");
        let deadline = tokio::time::sleep(self.wait_timeout);
        tokio::pin!(deadline);
        while !session.is_started() {
            tokio::select! {
                () = &mut deadline => {
                    tracing::info!("{name} (player1) timed out waiting for an opponent");
                    return Err(RelayError::WaitTimeout);
                }
                frame = ws_rx.next() => match frame {
                    None | Some(Ok(Message::Close(_))) => {
                        tracing::info!("{name} (player1) disconnected while waiting");
                        return Err(RelayError::Cancelled);
                    }
                    Some(Err(e)) => return Err(e.into()),
                    // frames before the match starts are dropped
                    Some(Ok(_)) => {}
                },
                () = tokio::time::sleep(READY_POLL) => {}
            }
        }
        Ok(())
    }
}

impl Default for Broker {
    fn default() -> Broker {
        Broker::new()
    }
}

/// Forward the opponent's side channel onto this connection's stream.
/// Ends when the channel closes (opponent left) or our own inbound pump
/// finishes (this player left).
async fn relay_outbound<S>(
    session: &Arc<GameSession>,
    seat: Seat,
    name: &str,
    ws_tx: &mut SplitSink<WebSocketStream<S>, Message>,
    mut inbound: JoinHandle<()>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(opponent_rx) = session.take_receiver(seat.opponent()) else {
        return Ok(());
    };
    loop {
        tokio::select! {
            message = opponent_rx.recv_async() => match message {
                Ok(message) => {
                    ws_tx.send(Message::Text(message.encode()?.into())).await?;
                }
                Err(_) => {
                    tracing::info!("opponent channel closed for {name} ({seat})");
                    return Ok(());
                }
            },
            _ = &mut inbound => {
                tracing::info!("{name} ({seat}) disconnected");
                return Ok(());
            }
        }
    }
}

/// Read frames from the stream and write them into this seat's own side
/// channel. Stops quietly on end-of-stream or peer close; logs and stops on
/// anything else.
async fn inbound_pump<S>(
    mut ws_rx: SplitStream<WebSocketStream<S>>,
    session: Arc<GameSession>,
    seat: Seat,
    name: String,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Some(tx) = session.sender(seat) else {
        return;
    };
    loop {
        match ws_rx.next().await {
            None | Some(Ok(Message::Close(_))) => break,
            Some(Ok(Message::Text(text))) => {
                let message = match GameMessage::decode(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::error!("corrupt frame from {name} ({seat}): {e}");
                        break;
                    }
                };
                if session.is_closed() {
                    break;
                }
                if tx.send_async(message).await.is_err() {
                    break;
                }
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                if is_normal_disconnect(&e) {
                    tracing::debug!("{name} ({seat}) stream ended: {e}");
                } else {
                    tracing::error!("error receiving stream message from {name} ({seat}): {e}");
                }
                break;
            }
        }
    }
}

/// Read the next data message, skipping control frames. `None` means the
/// stream ended or the peer sent a close frame.
async fn read_message<S>(
    ws_rx: &mut SplitStream<WebSocketStream<S>>,
) -> Result<Option<GameMessage>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(frame) = ws_rx.next().await {
        match frame? {
            Message::Text(text) => return GameMessage::decode(&text).map(Some),
            Message::Close(_) => return Ok(None),
            _ => {}
        }
    }
    Ok(None)
}

fn is_normal_disconnect(e: &WsError) -> bool {
    matches!(
        e,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}
