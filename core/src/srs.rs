//! Super Rotation System wall-kick tables.
//!
//! Offsets are `(dx, dy)` with y growing upward, tried in order; the first
//! offset whose trial placement does not collide wins. The I piece has its
//! own table; J, L, S, Z and T share one. O never consults the tables.

use crate::tetromino::{Rotation, Shape};

/// Kick offsets for J, L, S, Z and T, indexed by transition.
const KICKS_JLSTZ: [[(i32, i32); 5]; 8] = [
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)], // 0->R
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],     // R->0
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],     // R->2
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)], // 2->R
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],    // 2->L
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],  // L->2
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],  // L->0
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],    // 0->L
];

/// Kick offsets for the I piece, indexed by transition.
const KICKS_I: [[(i32, i32); 5]; 8] = [
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)], // 0->R
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)], // R->0
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)], // R->2
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)], // 2->R
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)], // 2->L
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)], // L->2
    [(0, 0), (1, 0), (2, 0), (1, -2), (2, -1)],  // L->0
    [(0, 0), (-1, 0), (-2, 0), (-1, 2), (-2, 1)], // 0->L
];

const NO_KICK: [(i32, i32); 1] = [(0, 0)];

fn transition(from: Rotation, to: Rotation) -> Option<usize> {
    use Rotation::*;
    match (from, to) {
        (R0, RR) => Some(0),
        (RR, R0) => Some(1),
        (RR, R2) => Some(2),
        (R2, RR) => Some(3),
        (R2, RL) => Some(4),
        (RL, R2) => Some(5),
        (RL, R0) => Some(6),
        (R0, RL) => Some(7),
        _ => None,
    }
}

/// The ordered kick offsets for rotating `shape` from `from` to `to`.
///
/// Only adjacent transitions exist in SRS; a non-adjacent pair is a
/// programmer error and degrades to the null kick in release builds.
pub fn offsets(shape: Shape, from: Rotation, to: Rotation) -> &'static [(i32, i32)] {
    let Some(i) = transition(from, to) else {
        debug_assert!(false, "non-adjacent rotation transition {from:?} -> {to:?}");
        return &NO_KICK;
    };
    match shape {
        Shape::I => &KICKS_I[i],
        Shape::O => &NO_KICK,
        _ => &KICKS_JLSTZ[i],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jlstz_kicks_match_the_guideline_tables() {
        assert_eq!(
            offsets(Shape::J, Rotation::R0, Rotation::RR),
            &[(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)]
        );
        assert_eq!(
            offsets(Shape::T, Rotation::RR, Rotation::R0),
            &[(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)]
        );
        assert_eq!(
            offsets(Shape::S, Rotation::R2, Rotation::RL),
            &[(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)]
        );
        assert_eq!(
            offsets(Shape::Z, Rotation::RL, Rotation::R2),
            &[(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)]
        );
    }

    #[test]
    fn i_kicks_match_the_guideline_tables() {
        assert_eq!(
            offsets(Shape::I, Rotation::R0, Rotation::RR),
            &[(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)]
        );
        assert_eq!(
            offsets(Shape::I, Rotation::RR, Rotation::R0),
            &[(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)]
        );
        assert_eq!(
            offsets(Shape::I, Rotation::RL, Rotation::R0),
            &[(0, 0), (1, 0), (2, 0), (1, -2), (2, -1)]
        );
    }

    #[test]
    fn o_never_kicks() {
        assert_eq!(offsets(Shape::O, Rotation::R0, Rotation::RR), &[(0, 0)]);
    }
}
