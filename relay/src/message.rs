use serde::{Deserialize, Serialize};
use tetris_core::{GameSnapshot, Shape, StackRow, COLS, ROWS};

use crate::error::{RelayError, Result};

/// One frame of the PlayTetris stream.
///
/// Both directions use the same shape. A frame carrying only `name` opens
/// the session; the server answers with `is_started` once pairing completes;
/// afterwards both sides push per-frame updates. The peer consumes only
/// `lines_clear`, `stack` and the two flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_started: bool,
    #[serde(default)]
    pub is_game_over: bool,
    #[serde(default)]
    pub lines_clear: i32,
    /// 20 rows of 10 cells; empty string = empty cell, otherwise the
    /// one-letter shape code.
    #[serde(default)]
    pub stack: Vec<Vec<String>>,
}

impl GameMessage {
    /// The opening handshake frame.
    pub fn hello(name: &str) -> GameMessage {
        GameMessage {
            name: name.to_string(),
            ..GameMessage::default()
        }
    }

    /// The pairing-complete notification sent by the server.
    pub fn started() -> GameMessage {
        GameMessage {
            is_started: true,
            ..GameMessage::default()
        }
    }

    /// A per-frame update built from a local snapshot.
    pub fn from_snapshot(name: &str, snapshot: &GameSnapshot) -> GameMessage {
        GameMessage {
            name: name.to_string(),
            is_started: true,
            is_game_over: snapshot.game_over,
            lines_clear: snapshot.lines_cleared as i32,
            stack: stack_to_wire(snapshot),
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<GameMessage> {
        serde_json::from_str(text).map_err(|e| RelayError::BadMessage(e.to_string()))
    }
}

/// Render a snapshot's stack as wire rows, with the current tetromino
/// painted in so the peer sees the falling piece too.
pub fn stack_to_wire(snapshot: &GameSnapshot) -> Vec<Vec<String>> {
    let mut rows = vec![vec![String::new(); COLS]; ROWS];
    for (y, row) in snapshot.stack.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if let Some(shape) = cell {
                rows[y][x] = shape.code().to_string();
            }
        }
    }
    if let Some(piece) = &snapshot.current {
        for (ir, grid_row) in piece.grid.iter().enumerate() {
            for (ic, &set) in grid_row.iter().enumerate() {
                if !set {
                    continue;
                }
                let y = piece.y - ir as i32;
                let x = piece.x + ic as i32;
                if (0..ROWS as i32).contains(&y) && (0..COLS as i32).contains(&x) {
                    rows[y as usize][x as usize] = piece.shape.code().to_string();
                }
            }
        }
    }
    rows
}

/// Parse wire rows back into a stack. Fails loudly on wrong dimensions or
/// unknown shape codes; such a session is corrupt.
pub fn wire_to_stack(rows: &[Vec<String>]) -> Result<[StackRow; ROWS]> {
    if rows.len() != ROWS {
        return Err(RelayError::BadMessage(format!(
            "expected {ROWS} stack rows, got {}",
            rows.len()
        )));
    }
    let mut stack = [[None; COLS]; ROWS];
    for (y, row) in rows.iter().enumerate() {
        if row.len() != COLS {
            return Err(RelayError::BadMessage(format!(
                "expected {COLS} cells in row {y}, got {}",
                row.len()
            )));
        }
        for (x, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let shape = Shape::from_code(cell)
                .ok_or_else(|| RelayError::BadMessage(format!("unknown shape code {cell:?}")))?;
            stack[y][x] = Some(shape);
        }
    }
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use tetris_core::Tetromino;

    use super::*;

    fn snapshot_with_stack(stack: [StackRow; ROWS]) -> GameSnapshot {
        GameSnapshot {
            stack,
            current: None,
            next: None,
            level: 1,
            lines_cleared: 0,
            game_over: false,
        }
    }

    #[test]
    fn stack_round_trips_through_the_wire() {
        let mut stack = [[None; COLS]; ROWS];
        stack[0][0] = Some(Shape::J);
        stack[5][9] = Some(Shape::I);
        stack[19][4] = Some(Shape::T);
        let wire = stack_to_wire(&snapshot_with_stack(stack));
        assert_eq!(wire_to_stack(&wire).expect("round trip"), stack);
    }

    #[test]
    fn current_tetromino_is_painted_into_the_wire_stack() {
        let mut snapshot = snapshot_with_stack([[None; COLS]; ROWS]);
        let mut piece = Tetromino::spawn(Shape::J);
        piece.y = 1;
        snapshot.current = Some(piece);
        let wire = stack_to_wire(&snapshot);
        assert_eq!(wire[1][3], "J");
        assert_eq!(wire[0][3], "J");
        assert_eq!(wire[0][4], "J");
        assert_eq!(wire[0][5], "J");
        assert_eq!(wire[2][3], "");
    }

    #[test]
    fn unknown_shape_codes_are_rejected() {
        let mut rows = vec![vec![String::new(); COLS]; ROWS];
        rows[3][3] = "X".to_string();
        assert!(matches!(
            wire_to_stack(&rows),
            Err(RelayError::BadMessage(_))
        ));
    }

    #[test]
    fn wrong_dimensions_are_rejected() {
        let rows = vec![vec![String::new(); COLS]; ROWS - 1];
        assert!(matches!(
            wire_to_stack(&rows),
            Err(RelayError::BadMessage(_))
        ));
        let mut rows = vec![vec![String::new(); COLS]; ROWS];
        rows[7].pop();
        assert!(matches!(
            wire_to_stack(&rows),
            Err(RelayError::BadMessage(_))
        ));
    }

    #[test]
    fn json_encoding_round_trips_and_tolerates_missing_fields() {
        let mut snapshot = snapshot_with_stack([[None; COLS]; ROWS]);
        snapshot.lines_cleared = 4;
        let message = GameMessage::from_snapshot("lena", &snapshot);
        let decoded = GameMessage::decode(&message.encode().expect("encode")).expect("decode");
        assert_eq!(decoded, message);

        let bare = GameMessage::decode(r#"{"name":"noName"}"#).expect("decode bare");
        assert_eq!(bare.name, "noName");
        assert!(!bare.is_started);
        assert!(bare.stack.is_empty());
    }
}
