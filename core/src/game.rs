use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::playfield::{Action, Playfield};
use crate::snapshot::GameSnapshot;

/// Pause between the phases of the line-clear blink.
const BLINK_INTERVAL: Duration = Duration::from_millis(40);
/// Blink phases: even phases blank the full rows, odd phases restore them.
const BLINK_PHASES: usize = 8;

/// Commands accepted by the running game task.
#[derive(Debug, Clone, Copy)]
enum GameCommand {
    Action(Action),
    Stop,
}

/// Handle to the game loop.
///
/// The loop runs in its own task and owns the playfield exclusively; this
/// handle submits actions, reports the opponent's progress and hands out the
/// snapshot channel. Snapshots are single-slot, so a slow consumer slows the
/// loop rather than racing it.
pub struct Game {
    command_tx: flume::Sender<GameCommand>,
    update_tx: flume::Sender<GameSnapshot>,
    update_rx: flume::Receiver<GameSnapshot>,
    remote_lines: Arc<AtomicI32>,
    task: Option<JoinHandle<()>>,
}

impl Game {
    pub fn new() -> Game {
        let (update_tx, update_rx) = flume::bounded(1);
        // replaced on start; sends before the first start are dropped
        let (command_tx, _) = flume::unbounded();
        Game {
            command_tx,
            update_tx,
            update_rx,
            remote_lines: Arc::new(AtomicI32::new(0)),
            task: None,
        }
    }

    /// Start a fresh round in a new task. Any previous round must have been
    /// stopped or have ended.
    pub fn start(&mut self) {
        let (command_tx, command_rx) = flume::unbounded();
        self.command_tx = command_tx;
        self.remote_lines.store(0, Ordering::Relaxed);
        let mut playfield = Playfield::new();
        playfield.set_tetromino();
        let update_tx = self.update_tx.clone();
        let remote_lines = self.remote_lines.clone();
        self.task = Some(tokio::spawn(run(
            playfield,
            command_rx,
            update_tx,
            remote_lines,
        )));
    }

    /// Stop the loop and wait for the task to finish. Pending snapshots are
    /// drained so a blocked publish can complete and observe the stop.
    pub async fn stop(&mut self) {
        let _ = self.command_tx.send(GameCommand::Stop);
        if let Some(task) = self.task.take() {
            while !task.is_finished() {
                let _ = self.update_rx.try_recv();
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            let _ = task.await;
        }
    }

    /// Queue a player action. Dropped when no round is running.
    pub fn action(&self, action: Action) {
        let _ = self.command_tx.send(GameCommand::Action(action));
    }

    /// Record the opponent's cleared lines; feeds the gravity curve.
    pub fn set_remote_lines(&self, lines: i32) {
        self.remote_lines.store(lines, Ordering::Relaxed);
    }

    /// The snapshot channel. Snapshots form a monotonic sequence ending with
    /// a `game_over` one when the round ends on its own.
    pub fn updates(&self) -> flume::Receiver<GameSnapshot> {
        self.update_rx.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Default for Game {
    fn default() -> Game {
        Game::new()
    }
}

/// The loop serialises three inputs: the gravity tick, queued player
/// actions and the stop signal. A tick that cannot move the piece down, or
/// a DropDown action, ends the round.
async fn run(
    mut playfield: Playfield,
    command_rx: flume::Receiver<GameCommand>,
    update_tx: flume::Sender<GameSnapshot>,
    remote_lines: Arc<AtomicI32>,
) {
    if update_tx.send_async(playfield.snapshot()).await.is_err() {
        return;
    }
    let gravity = playfield.gravity_interval(remote_lines.load(Ordering::Relaxed));
    let tick = tokio::time::sleep(gravity);
    tokio::pin!(tick);

    loop {
        let mut round_over = false;
        tokio::select! {
            () = &mut tick => {
                let locked = playfield
                    .current
                    .as_ref()
                    .is_some_and(|piece| playfield.is_collision(0, -1, piece));
                if locked {
                    round_over = true;
                } else {
                    playfield.apply(Action::MoveDown);
                    let gravity =
                        playfield.gravity_interval(remote_lines.load(Ordering::Relaxed));
                    tick.as_mut().reset(tokio::time::Instant::now() + gravity);
                }
            }
            command = command_rx.recv_async() => match command {
                Ok(GameCommand::Action(action)) => {
                    playfield.apply(action);
                    // drop down does not wait for the tick to end the round
                    round_over = action == Action::DropDown;
                }
                Ok(GameCommand::Stop) | Err(_) => return,
            },
        }

        if round_over {
            if !round_end(&mut playfield, &update_tx).await {
                return;
            }
            let gravity = playfield.gravity_interval(remote_lines.load(Ordering::Relaxed));
            tick.as_mut().reset(tokio::time::Instant::now() + gravity);
        }

        if update_tx.send_async(playfield.snapshot()).await.is_err() {
            return;
        }
    }
}

/// Bookkeeping once a piece locks: transfer, clear animation, level,
/// game-over test, next spawn. Returns false when the loop should end.
async fn round_end(playfield: &mut Playfield, update_tx: &flume::Sender<GameSnapshot>) -> bool {
    playfield.to_stack();
    clear_lines(playfield, update_tx).await;
    playfield.set_level();
    if playfield.is_game_over() {
        playfield.game_over = true;
        tracing::debug!(
            lines = playfield.lines_cleared,
            level = playfield.level,
            "game over"
        );
        let _ = update_tx.send_async(playfield.snapshot()).await;
        return false;
    }
    playfield.set_tetromino();
    true
}

/// Eight-phase blink over the full rows, publishing a snapshot after every
/// phase, then the actual removal. The playfield is not locked across the
/// sleeps; consumers render the intermediate snapshots.
async fn clear_lines(playfield: &mut Playfield, update_tx: &flume::Sender<GameSnapshot>) {
    let full = playfield.full_rows();
    if full.is_empty() {
        return;
    }
    let saved: Vec<(usize, crate::playfield::StackRow)> =
        full.iter().map(|&y| (y, playfield.stack[y])).collect();
    for phase in 0..BLINK_PHASES {
        if phase % 2 == 0 {
            for &y in &full {
                playfield.stack[y] = [None; crate::playfield::COLS];
            }
        } else {
            for &(y, row) in &saved {
                playfield.stack[y] = row;
            }
        }
        let _ = update_tx.send_async(playfield.snapshot()).await;
        tokio::time::sleep(BLINK_INTERVAL).await;
    }
    playfield.remove_rows(&full);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playfield::{COLS, ROWS};
    use crate::tetromino::{Shape, Tetromino};

    fn playfield_with(shape: Shape) -> Playfield {
        let mut p = Playfield::new();
        p.current = Some(Tetromino::spawn(shape));
        p.next = Some(Tetromino::spawn(shape));
        p
    }

    #[tokio::test(start_paused = true)]
    async fn blink_publishes_eight_snapshots_then_removes_the_rows() {
        let mut p = playfield_with(Shape::J);
        p.current = None;
        for y in 0..2 {
            for x in 0..COLS {
                p.stack[y][x] = Some(Shape::J);
            }
        }
        p.stack[2][0] = Some(Shape::J);

        let (update_tx, update_rx) = flume::unbounded();
        clear_lines(&mut p, &update_tx).await;

        let snapshots: Vec<GameSnapshot> = update_rx.drain().collect();
        assert_eq!(snapshots.len(), 8);
        // even phases blanked, odd phases restored
        assert!(snapshots[0].stack[0].iter().all(Option::is_none));
        assert!(snapshots[1].stack[0].iter().all(Option::is_some));

        let mut want = [[None; COLS]; ROWS];
        want[0][0] = Some(Shape::J);
        assert_eq!(p.stack, want);
        assert_eq!(p.lines_cleared, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn no_full_rows_publishes_nothing() {
        let mut p = playfield_with(Shape::J);
        p.current = None;
        let (update_tx, update_rx) = flume::unbounded();
        clear_lines(&mut p, &update_tx).await;
        assert!(update_rx.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_down_locks_the_piece_and_spawns_the_next() {
        let playfield = playfield_with(Shape::J);
        let (command_tx, command_rx) = flume::unbounded();
        let (update_tx, update_rx) = flume::unbounded();
        let task = tokio::spawn(run(
            playfield,
            command_rx,
            update_tx,
            Arc::new(AtomicI32::new(0)),
        ));

        let initial = update_rx.recv_async().await.expect("initial snapshot");
        assert_eq!(initial.current.as_ref().map(|t| t.shape), Some(Shape::J));

        command_tx.send(GameCommand::Action(Action::DropDown)).expect("send");
        let after = update_rx.recv_async().await.expect("post-drop snapshot");
        assert_eq!(after.stack[0][3], Some(Shape::J));
        assert_eq!(after.stack[0][4], Some(Shape::J));
        assert_eq!(after.stack[0][5], Some(Shape::J));
        assert_eq!(after.stack[1][3], Some(Shape::J));
        // the old next piece was promoted
        assert_eq!(after.current.as_ref().map(|t| t.shape), Some(Shape::J));
        assert!(!after.game_over);

        command_tx.send(GameCommand::Stop).expect("send stop");
        task.await.expect("task join");
    }

    #[tokio::test(start_paused = true)]
    async fn gravity_tick_moves_the_piece_down() {
        let playfield = playfield_with(Shape::J);
        let (_command_tx, command_rx) = flume::unbounded();
        let (update_tx, update_rx) = flume::unbounded();
        let task = tokio::spawn(run(
            playfield,
            command_rx,
            update_tx,
            Arc::new(AtomicI32::new(0)),
        ));

        let initial = update_rx.recv_async().await.expect("initial snapshot");
        assert_eq!(initial.current.as_ref().map(|t| t.y), Some(19));

        tokio::time::advance(Duration::from_secs(1)).await;
        let ticked = update_rx.recv_async().await.expect("tick snapshot");
        assert_eq!(ticked.current.as_ref().map(|t| t.y), Some(18));

        task.abort();
        let _ = task.await;
    }

    #[tokio::test(start_paused = true)]
    async fn round_ends_in_game_over_when_the_next_piece_cannot_spawn() {
        let mut playfield = playfield_with(Shape::J);
        // settle a column so the locked J blocks the next spawn
        for y in 2..18 {
            playfield.stack[y][3] = Some(Shape::L);
        }
        let (command_tx, command_rx) = flume::unbounded();
        let (update_tx, update_rx) = flume::unbounded();
        let task = tokio::spawn(run(
            playfield,
            command_rx,
            update_tx,
            Arc::new(AtomicI32::new(0)),
        ));

        let _ = update_rx.recv_async().await.expect("initial snapshot");
        command_tx.send(GameCommand::Action(Action::DropDown)).expect("send");

        let mut last = None;
        while let Ok(snapshot) = update_rx.recv_async().await {
            let over = snapshot.game_over;
            last = Some(snapshot);
            if over {
                break;
            }
        }
        let last = last.expect("final snapshot");
        assert!(last.game_over);
        task.await.expect("task join");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_task() {
        let mut game = Game::new();
        game.start();
        let updates = game.updates();
        let _ = updates.recv_async().await.expect("initial snapshot");
        assert!(game.is_running());
        game.stop().await;
        assert!(!game.is_running());
    }
}
