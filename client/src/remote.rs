use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tetris_relay::GameMessage;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Events surfaced to the coordinator from the relay connection.
#[derive(Debug, Clone)]
pub enum RemoteEvent {
    Message(GameMessage),
    /// The stream ended; carries the server's close reason if one was given.
    Closed(Option<String>),
}

/// A live connection to the relay server.
///
/// A single task owns the socket and shuttles frames between two channels.
/// Dropping this handle drops the outgoing sender, which makes the task
/// close the socket; that is how cancelling the wait for an opponent
/// reaches the server.
pub struct Remote {
    outgoing_tx: flume::Sender<GameMessage>,
    events_rx: flume::Receiver<RemoteEvent>,
}

impl Remote {
    /// Connect, send the opening name frame and start the pump task.
    pub async fn connect(address: &str, name: &str) -> anyhow::Result<Remote> {
        let url = format!("ws://{address}/play");
        let (mut ws, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("unable to reach the server at {address}"))?;
        let hello = GameMessage::hello(name)
            .encode()
            .context("unable to encode the opening message")?;
        ws.send(Message::Text(hello.into()))
            .await
            .context("unable to send the opening message")?;

        let (outgoing_tx, outgoing_rx) = flume::bounded(1);
        // events are never allowed to block the pump, or a full outgoing
        // slot could wedge both sides
        let (events_tx, events_rx) = flume::unbounded();
        tokio::spawn(pump(ws, outgoing_rx, events_tx));
        Ok(Remote {
            outgoing_tx,
            events_rx,
        })
    }

    pub fn events(&self) -> flume::Receiver<RemoteEvent> {
        self.events_rx.clone()
    }

    /// Queue a frame for the server. Returns false once the connection is
    /// gone.
    pub async fn send(&self, message: GameMessage) -> bool {
        self.outgoing_tx.send_async(message).await.is_ok()
    }
}

async fn pump(
    mut ws: WsStream,
    outgoing_rx: flume::Receiver<GameMessage>,
    events_tx: flume::Sender<RemoteEvent>,
) {
    loop {
        tokio::select! {
            outgoing = outgoing_rx.recv_async() => match outgoing {
                Ok(message) => {
                    let text = match message.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("unable to encode frame: {e}");
                            break;
                        }
                    };
                    if let Err(e) = ws.send(Message::Text(text.into())).await {
                        tracing::debug!("send failed, the peer is gone: {e}");
                        let _ = events_tx.send_async(RemoteEvent::Closed(None)).await;
                        break;
                    }
                }
                // the handle was dropped; tell the server we are leaving
                Err(_) => {
                    let _ = ws.close(None).await;
                    break;
                }
            },
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => match GameMessage::decode(&text) {
                    Ok(message) => {
                        if events_tx
                            .send_async(RemoteEvent::Message(message))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("corrupt frame from the server: {e}");
                        let _ = events_tx.send_async(RemoteEvent::Closed(None)).await;
                        break;
                    }
                },
                Some(Ok(Message::Close(close))) => {
                    let reason = close.map(|frame| frame.reason.to_string());
                    let _ = events_tx.send_async(RemoteEvent::Closed(reason)).await;
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("stream ended: {e}");
                    let _ = events_tx.send_async(RemoteEvent::Closed(None)).await;
                    break;
                }
                None => {
                    let _ = events_tx.send_async(RemoteEvent::Closed(None)).await;
                    break;
                }
            },
        }
    }
}
