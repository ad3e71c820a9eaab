use console::Key;
use tetris_core::{Game, GameSnapshot};
use tetris_relay::{wire_to_stack, GameMessage, CLOSE_REASON_TIMEOUT};

use crate::input;
use crate::remote::{Remote, RemoteEvent};
use crate::render::{Notice, OpponentView, Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Lobby,
    Waiting,
    Playing,
}

/// Mediates keyboard input, the local game loop and, when online, the relay
/// session.
///
/// One `select!` loop serialises the three event sources; every transition
/// between the lobby, waiting and playing screens happens on a discrete
/// event, so the screen state needs no lock.
pub struct Coordinator {
    game: Game,
    renderer: Renderer,
    keys: flume::Receiver<Key>,
    name: String,
    address: String,
    screen: Screen,
    remote: Option<Remote>,
    opponent: Option<OpponentView>,
    last_snapshot: Option<GameSnapshot>,
}

impl Coordinator {
    pub fn new(renderer: Renderer, keys: flume::Receiver<Key>, name: String, address: String) -> Coordinator {
        Coordinator {
            game: Game::new(),
            renderer,
            keys,
            name,
            address,
            screen: Screen::Lobby,
            remote: None,
            opponent: None,
            last_snapshot: None,
        }
    }

    /// Run until the player quits. Returns cleanly on quit; errors are
    /// terminal failures (the screen itself went away).
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.renderer.draw_lobby(Notice::Welcome)?;
        let updates = self.game.updates();
        let keys = self.keys.clone();
        loop {
            let events = self.remote.as_ref().map(Remote::events);
            tokio::select! {
                key = keys.recv_async() => {
                    let Ok(key) = key else {
                        anyhow::bail!("keyboard channel closed unexpectedly");
                    };
                    if !self.handle_key(key).await? {
                        self.game.stop().await;
                        return Ok(());
                    }
                }
                snapshot = updates.recv_async() => {
                    if let Ok(snapshot) = snapshot {
                        self.handle_snapshot(snapshot).await?;
                    }
                }
                event = next_remote_event(&events) => {
                    self.handle_remote_event(event).await?;
                }
            }
        }
    }

    /// Returns false when the player quits the program.
    async fn handle_key(&mut self, key: Key) -> anyhow::Result<bool> {
        // ctrl-c leaves from any screen
        if key == Key::Char('\u{3}') {
            return Ok(false);
        }
        match self.screen {
            Screen::Lobby => match key {
                Key::Char('p') => {
                    tracing::debug!("starting a local game");
                    self.start_round(None);
                }
                Key::Char('o') => self.start_online().await?,
                Key::Char('q') => return Ok(false),
                _ => {}
            },
            Screen::Waiting => {
                if key == Key::Char('c') {
                    tracing::debug!("cancelled waiting for an opponent");
                    self.remote = None;
                    self.screen = Screen::Lobby;
                    self.renderer.draw_lobby(Notice::Welcome)?;
                }
            }
            Screen::Playing => {
                if let Some(action) = input::game_action(&key) {
                    self.game.action(action);
                } else if key == Key::Escape {
                    self.end_round(Notice::Welcome).await?;
                }
            }
        }
        Ok(true)
    }

    async fn start_online(&mut self) -> anyhow::Result<()> {
        self.screen = Screen::Waiting;
        self.renderer.draw_waiting()?;
        match Remote::connect(&self.address, &self.name).await {
            Ok(remote) => {
                self.remote = Some(remote);
            }
            Err(e) => {
                tracing::error!("connection failed: {e:#}");
                self.screen = Screen::Lobby;
                self.renderer.draw_lobby(Notice::Error)?;
            }
        }
        Ok(())
    }

    fn start_round(&mut self, opponent: Option<OpponentView>) {
        self.opponent = opponent;
        self.last_snapshot = None;
        self.screen = Screen::Playing;
        self.game.start();
    }

    /// Stop the round and fall back to the lobby with `notice`.
    async fn end_round(&mut self, notice: Notice) -> anyhow::Result<()> {
        self.game.stop().await;
        self.remote = None;
        self.opponent = None;
        self.screen = Screen::Lobby;
        self.renderer.draw_lobby(notice)?;
        Ok(())
    }

    async fn handle_snapshot(&mut self, snapshot: GameSnapshot) -> anyhow::Result<()> {
        if self.screen != Screen::Playing {
            // a stale frame from a round that was just stopped
            return Ok(());
        }
        if let Some(remote) = &self.remote {
            let message = GameMessage::from_snapshot(&self.name, &snapshot);
            if !remote.send(message).await {
                tracing::debug!("frame not sent, the session is closing");
            }
        }
        let game_over = snapshot.game_over;
        self.renderer.draw_playing(&snapshot, self.opponent.as_ref())?;
        self.last_snapshot = Some(snapshot);
        if game_over {
            tracing::info!("local game over");
            self.end_round(Notice::GameOver).await?;
        }
        Ok(())
    }

    async fn handle_remote_event(&mut self, event: RemoteEvent) -> anyhow::Result<()> {
        match event {
            RemoteEvent::Message(message) => match self.screen {
                Screen::Waiting => {
                    if message.is_started {
                        tracing::info!("opponent found, match starting");
                        self.start_round(Some(OpponentView::unknown()));
                    }
                }
                Screen::Playing => {
                    self.game.set_remote_lines(message.lines_clear);
                    let game_over = message.is_game_over;
                    if !message.stack.is_empty() {
                        match wire_to_stack(&message.stack) {
                            Ok(stack) => {
                                self.opponent = Some(OpponentView {
                                    name: message.name,
                                    stack,
                                    lines_cleared: message.lines_clear,
                                });
                            }
                            Err(e) => {
                                tracing::error!("corrupt opponent frame: {e}");
                                return self.end_round(Notice::Error).await;
                            }
                        }
                    }
                    if game_over {
                        tracing::info!("opponent's game is over");
                        return self.end_round(Notice::YouWon).await;
                    }
                    if let Some(snapshot) = self.last_snapshot.clone() {
                        self.renderer.draw_playing(&snapshot, self.opponent.as_ref())?;
                    }
                }
                Screen::Lobby => {}
            },
            RemoteEvent::Closed(reason) => {
                self.remote = None;
                match self.screen {
                    Screen::Waiting => {
                        let notice = if reason.as_deref() == Some(CLOSE_REASON_TIMEOUT) {
                            Notice::NoOpponent
                        } else {
                            Notice::Error
                        };
                        tracing::info!(reason = reason.as_deref(), "wait ended");
                        self.screen = Screen::Lobby;
                        self.renderer.draw_lobby(notice)?;
                    }
                    Screen::Playing => {
                        tracing::info!(reason = reason.as_deref(), "session closed mid-game");
                        self.end_round(Notice::Error).await?;
                    }
                    Screen::Lobby => {}
                }
            }
        }
        Ok(())
    }
}

async fn next_remote_event(events: &Option<flume::Receiver<RemoteEvent>>) -> RemoteEvent {
    match events {
        Some(events) => match events.recv_async().await {
            Ok(event) => event,
            Err(_) => RemoteEvent::Closed(None),
        },
        None => std::future::pending().await,
    }
}
