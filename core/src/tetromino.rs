use serde::{Deserialize, Serialize};

/// The seven canonical tetromino shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    I,
    J,
    L,
    O,
    S,
    Z,
    T,
}

impl Shape {
    pub const ALL: [Shape; 7] = [
        Shape::I,
        Shape::J,
        Shape::L,
        Shape::O,
        Shape::S,
        Shape::Z,
        Shape::T,
    ];

    /// One-letter code used on the wire and in rendering.
    pub fn code(self) -> &'static str {
        match self {
            Shape::I => "I",
            Shape::J => "J",
            Shape::L => "L",
            Shape::O => "O",
            Shape::S => "S",
            Shape::Z => "Z",
            Shape::T => "T",
        }
    }

    /// Inverse of [`Shape::code`]. Returns `None` for anything else.
    pub fn from_code(code: &str) -> Option<Shape> {
        match code {
            "I" => Some(Shape::I),
            "J" => Some(Shape::J),
            "L" => Some(Shape::L),
            "O" => Some(Shape::O),
            "S" => Some(Shape::S),
            "Z" => Some(Shape::Z),
            "T" => Some(Shape::T),
            _ => None,
        }
    }
}

/// SRS rotation states, cycling 0 -> R -> 2 -> L -> 0.
///
/// The wall-kick tables are indexed by the (from, to) transition, so the
/// current state travels with the piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rotation {
    R0,
    RR,
    R2,
    RL,
}

impl Rotation {
    /// One step clockwise.
    pub fn next(self) -> Rotation {
        match self {
            Rotation::R0 => Rotation::RR,
            Rotation::RR => Rotation::R2,
            Rotation::R2 => Rotation::RL,
            Rotation::RL => Rotation::R0,
        }
    }

    /// One step counter-clockwise.
    pub fn prev(self) -> Rotation {
        match self {
            Rotation::R0 => Rotation::RL,
            Rotation::RL => Rotation::R2,
            Rotation::R2 => Rotation::RR,
            Rotation::RR => Rotation::R0,
        }
    }
}

/// A falling piece.
///
/// `grid` is a square boolean matrix; `grid[0]` is the piece's top row, so a
/// set cell `(ir, ic)` sits at playfield position `(y - ir, x + ic)`.
/// `ghost_y` is the lowest `y` the piece would reach under straight gravity;
/// it is derived state, recomputed by the playfield after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tetromino {
    pub shape: Shape,
    pub grid: Vec<Vec<bool>>,
    pub x: i32,
    pub y: i32,
    pub ghost_y: i32,
    pub rotation: Rotation,
}

impl Tetromino {
    /// Build a tetromino at its guideline spawn location.
    ///
    /// The I piece spawns one row above the ceiling (y = 20) so that its
    /// empty top grid row sits off-screen; every piece's filled cells start
    /// inside the playfield.
    pub fn spawn(shape: Shape) -> Tetromino {
        let (grid, x, y) = match shape {
            Shape::I => (
                vec![
                    vec![false, false, false, false],
                    vec![true, true, true, true],
                    vec![false, false, false, false],
                    vec![false, false, false, false],
                ],
                3,
                20,
            ),
            Shape::J => (
                vec![
                    vec![true, false, false],
                    vec![true, true, true],
                    vec![false, false, false],
                ],
                3,
                19,
            ),
            Shape::L => (
                vec![
                    vec![false, false, true],
                    vec![true, true, true],
                    vec![false, false, false],
                ],
                3,
                19,
            ),
            Shape::O => (vec![vec![true, true], vec![true, true]], 4, 19),
            Shape::S => (
                vec![
                    vec![false, true, true],
                    vec![true, true, false],
                    vec![false, false, false],
                ],
                3,
                19,
            ),
            Shape::Z => (
                vec![
                    vec![true, true, false],
                    vec![false, true, true],
                    vec![false, false, false],
                ],
                3,
                19,
            ),
            Shape::T => (
                vec![
                    vec![false, true, false],
                    vec![true, true, true],
                    vec![false, false, false],
                ],
                3,
                19,
            ),
        };
        Tetromino {
            shape,
            grid,
            x,
            y,
            ghost_y: y,
            rotation: Rotation::R0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_cycles_through_all_four_states() {
        let mut r = Rotation::R0;
        let forward = [Rotation::RR, Rotation::R2, Rotation::RL, Rotation::R0];
        for want in forward {
            r = r.next();
            assert_eq!(r, want);
        }
        let backward = [Rotation::RL, Rotation::R2, Rotation::RR, Rotation::R0];
        for want in backward {
            r = r.prev();
            assert_eq!(r, want);
        }
    }

    #[test]
    fn spawn_positions_match_guideline() {
        assert_eq!((Tetromino::spawn(Shape::I).x, Tetromino::spawn(Shape::I).y), (3, 20));
        assert_eq!((Tetromino::spawn(Shape::O).x, Tetromino::spawn(Shape::O).y), (4, 19));
        for shape in [Shape::J, Shape::L, Shape::S, Shape::Z, Shape::T] {
            let t = Tetromino::spawn(shape);
            assert_eq!((t.x, t.y), (3, 19));
        }
    }

    #[test]
    fn spawn_grids_have_four_cells_and_square_sides() {
        for shape in Shape::ALL {
            let t = Tetromino::spawn(shape);
            let side = match shape {
                Shape::I => 4,
                Shape::O => 2,
                _ => 3,
            };
            assert_eq!(t.grid.len(), side);
            assert!(t.grid.iter().all(|row| row.len() == side));
            let cells: usize = t
                .grid
                .iter()
                .map(|row| row.iter().filter(|&&c| c).count())
                .sum();
            assert_eq!(cells, 4);
        }
    }

    #[test]
    fn shape_codes_round_trip() {
        for shape in Shape::ALL {
            assert_eq!(Shape::from_code(shape.code()), Some(shape));
        }
        assert_eq!(Shape::from_code(""), None);
        assert_eq!(Shape::from_code("X"), None);
    }
}
