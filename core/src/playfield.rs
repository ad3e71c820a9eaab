use std::time::Duration;

use crate::bag::Bag;
use crate::snapshot::GameSnapshot;
use crate::srs;
use crate::tetromino::{Shape, Tetromino};

/// Playfield width in columns.
pub const COLS: usize = 10;
/// Playfield height in rows. Row 0 is the floor, row 19 the ceiling.
pub const ROWS: usize = 20;

/// One settled row of the stack.
pub type StackRow = [Option<Shape>; COLS];

/// Player-initiated moves on the current tetromino.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveDown,
    DropDown,
    RotateRight,
    RotateLeft,
}

/// The 20x10 playfield plus the current and next tetromino.
///
/// Coordinates follow the guideline: columns 0..9 left to right, rows 0..19
/// bottom to top. A stack cell is set when it holds the shape that settled
/// there. The playfield is mutated only by the game loop task; everything
/// else reads deep-copy snapshots.
#[derive(Debug, Clone)]
pub struct Playfield {
    pub stack: [StackRow; ROWS],
    pub current: Option<Tetromino>,
    pub next: Option<Tetromino>,
    pub level: u32,
    pub lines_cleared: u32,
    pub game_over: bool,
    bag: Bag,
}

impl Playfield {
    pub fn new() -> Playfield {
        Playfield {
            stack: [[None; COLS]; ROWS],
            current: None,
            next: None,
            level: 1,
            lines_cleared: 0,
            game_over: false,
            bag: Bag::new(),
        }
    }

    /// Apply a player action to the current tetromino.
    ///
    /// During the transient between lock-down and the next spawn there is no
    /// current piece and the action is dropped. The ghost row is recomputed
    /// after every action.
    pub fn apply(&mut self, action: Action) {
        if self.current.is_none() {
            return;
        }
        match action {
            Action::MoveLeft => {
                self.try_shift(-1, 0);
            }
            Action::MoveRight => {
                self.try_shift(1, 0);
            }
            Action::MoveDown => {
                self.try_shift(0, -1);
            }
            Action::DropDown => {
                let delta = self.drop_delta();
                self.try_shift(0, delta);
            }
            Action::RotateRight | Action::RotateLeft => self.rotate(action),
        }
        self.refresh_ghost();
    }

    /// True if `piece` displaced by `(dx, dy)` leaves the playfield or
    /// overlaps a settled cell.
    ///
    /// Grid row indices grow downward while playfield rows grow upward, so a
    /// set cell `(ir, ic)` lands on `(piece.y - ir + dy, piece.x + ic + dx)`.
    pub fn is_collision(&self, dx: i32, dy: i32, piece: &Tetromino) -> bool {
        for (ir, row) in piece.grid.iter().enumerate() {
            for (ic, &set) in row.iter().enumerate() {
                if !set {
                    continue;
                }
                let y = piece.y - ir as i32 + dy;
                let x = piece.x + ic as i32 + dx;
                if !(0..ROWS as i32).contains(&y) || !(0..COLS as i32).contains(&x) {
                    return true;
                }
                if self.stack[y as usize][x as usize].is_some() {
                    return true;
                }
            }
        }
        false
    }

    fn try_shift(&mut self, dx: i32, dy: i32) -> bool {
        let Some(piece) = self.current.clone() else {
            return false;
        };
        if self.is_collision(dx, dy, &piece) {
            return false;
        }
        if let Some(current) = self.current.as_mut() {
            current.x += dx;
            current.y += dy;
        }
        true
    }

    /// The largest non-positive dy the current piece can fall without
    /// colliding.
    fn drop_delta(&self) -> i32 {
        let Some(piece) = &self.current else {
            return 0;
        };
        let mut delta = 0;
        while !self.is_collision(0, delta - 1, piece) {
            delta -= 1;
        }
        delta
    }

    fn refresh_ghost(&mut self) {
        let delta = self.drop_delta();
        if let Some(piece) = self.current.as_mut() {
            piece.ghost_y = piece.y + delta;
        }
    }

    /// Rotate the current piece with SRS wall-kick fallback.
    ///
    /// The grid is rotated a quarter turn, then the five kick offsets for
    /// the (shape group, transition) pair are tried in order; the first
    /// non-colliding one is applied. If none fits the piece is untouched.
    /// O does not rotate.
    fn rotate(&mut self, action: Action) {
        let Some(piece) = self.current.clone() else {
            return;
        };
        if piece.shape == Shape::O {
            return;
        }
        let n = piece.grid.len();
        let mut rotated = vec![vec![false; n]; n];
        for (ir, row) in piece.grid.iter().enumerate() {
            for (ic, &set) in row.iter().enumerate() {
                if action == Action::RotateRight {
                    rotated[ic][n - ir - 1] = set;
                } else {
                    rotated[n - ic - 1][ir] = set;
                }
            }
        }
        let to = if action == Action::RotateRight {
            piece.rotation.next()
        } else {
            piece.rotation.prev()
        };
        let trial = Tetromino {
            grid: rotated,
            ..piece.clone()
        };
        for &(dx, dy) in srs::offsets(piece.shape, piece.rotation, to) {
            if self.is_collision(dx, dy, &trial) {
                continue;
            }
            if let Some(current) = self.current.as_mut() {
                current.grid = trial.grid.clone();
                current.x += dx;
                current.y += dy;
                current.rotation = to;
            }
            return;
        }
    }

    /// Transfer the current tetromino onto the stack and clear it.
    pub fn to_stack(&mut self) {
        let Some(piece) = self.current.take() else {
            return;
        };
        for (ir, row) in piece.grid.iter().enumerate() {
            for (ic, &set) in row.iter().enumerate() {
                if !set {
                    continue;
                }
                let y = piece.y - ir as i32;
                let x = piece.x + ic as i32;
                if (0..ROWS as i32).contains(&y) && (0..COLS as i32).contains(&x) {
                    self.stack[y as usize][x as usize] = Some(piece.shape);
                }
            }
        }
    }

    /// Indices of rows whose every cell is set, ascending.
    pub fn full_rows(&self) -> Vec<usize> {
        (0..ROWS)
            .filter(|&y| self.stack[y].iter().all(Option::is_some))
            .collect()
    }

    /// Remove the given rows and append empty rows at the top, keeping 20
    /// rows total. Adds the removed count to `lines_cleared`.
    pub fn remove_rows(&mut self, rows: &[usize]) {
        let mut rows = rows.to_vec();
        rows.sort_unstable();
        // descending, so higher-index removals do not shift lower ones
        for &removed in rows.iter().rev() {
            for y in removed..ROWS - 1 {
                self.stack[y] = self.stack[y + 1];
            }
            self.stack[ROWS - 1] = [None; COLS];
        }
        self.lines_cleared += rows.len() as u32;
    }

    /// Recompute the level from `lines_cleared` under the fixed-goal rule.
    /// The level never decreases, so an externally preset higher level holds
    /// until the line count overtakes it.
    pub fn set_level(&mut self) {
        let lines = self.lines_cleared;
        let level = if lines < 10 {
            1
        } else if lines < 100 {
            (lines / 10) % 10 + 1
        } else {
            lines / 10 + 1
        };
        if level > self.level {
            self.level = level;
        }
    }

    /// True when the next tetromino already collides at its spawn location.
    pub fn is_game_over(&self) -> bool {
        match &self.next {
            Some(next) => self.is_collision(0, 0, next),
            None => false,
        }
    }

    /// Promote the next tetromino to current and draw a fresh next.
    /// On first use both are drawn from the bag.
    pub fn set_tetromino(&mut self) {
        self.current = match self.next.take() {
            Some(next) => Some(next),
            None => Some(Tetromino::spawn(self.bag.draw())),
        };
        self.next = Some(Tetromino::spawn(self.bag.draw()));
        self.refresh_ghost();
    }

    /// Interval between gravity ticks: `(0.8 - 0.007*(t-1))^(t-1)` seconds
    /// with `t = level + remote_lines` and the level clamped to 1..=20
    /// (<https://tetris.wiki/Marathon>). The opponent's cleared lines feed
    /// in as `remote_lines`, so their progress speeds up local gravity.
    pub fn gravity_interval(&self, remote_lines: i32) -> Duration {
        let t = (self.level.clamp(1, 20) as i32 + remote_lines - 1).max(0) as f64;
        let seconds = (0.8 - t * 0.007).max(0.0).powf(t);
        Duration::from_secs_f64(seconds.clamp(0.001, 1.0))
    }

    /// Deep copy of everything a renderer or the wire needs. Safe to read
    /// without holding any lock.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            stack: self.stack,
            current: self.current.clone(),
            next: self.next.clone(),
            level: self.level,
            lines_cleared: self.lines_cleared,
            game_over: self.game_over,
        }
    }
}

impl Default for Playfield {
    fn default() -> Playfield {
        Playfield::new()
    }
}
