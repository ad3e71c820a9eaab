use rand::Rng;

use crate::tetromino::Shape;

/// 7-bag randomizer.
///
/// Every shape is drawn exactly once per cycle; the pool refills with all
/// seven as soon as it runs dry. The very first draw of a game never returns
/// S, Z or O: such a draw is discarded (removed from the pool, not returned)
/// and the draw repeats until one of I, J, L or T comes up.
#[derive(Debug, Clone)]
pub struct Bag {
    pieces: Vec<Shape>,
    first_draw: bool,
}

impl Bag {
    pub fn new() -> Bag {
        Bag {
            pieces: Shape::ALL.to_vec(),
            first_draw: true,
        }
    }

    /// Shapes left in the current cycle.
    pub fn remaining(&self) -> usize {
        self.pieces.len()
    }

    /// Remove and return a uniformly random shape, refilling first if empty.
    pub fn draw(&mut self) -> Shape {
        if self.pieces.is_empty() {
            self.pieces = Shape::ALL.to_vec();
        }
        let i = rand::rng().random_range(0..self.pieces.len());
        let shape = self.pieces.swap_remove(i);
        if self.first_draw && matches!(shape, Shape::S | Shape::Z | Shape::O) {
            // discarded, not returned
            return self.draw();
        }
        self.first_draw = false;
        shape
    }
}

impl Default for Bag {
    fn default() -> Bag {
        Bag::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn settled_bag() -> Bag {
        Bag {
            pieces: Shape::ALL.to_vec(),
            first_draw: false,
        }
    }

    #[test]
    fn first_draw_is_never_s_z_or_o() {
        for _ in 0..50 {
            let mut bag = Bag::new();
            let shape = bag.draw();
            assert!(
                matches!(shape, Shape::I | Shape::J | Shape::L | Shape::T),
                "wanted I, J, L or T, got {shape:?}"
            );
        }
    }

    #[test]
    fn first_draw_removes_discards_from_the_pool() {
        let mut bag = Bag::new();
        let first = bag.draw();
        // the returned shape plus any discarded S/Z/O all left the pool
        let drawn = 7 - bag.remaining();
        assert!((1..=4).contains(&drawn));
        let mut seen = HashSet::from([first]);
        for _ in 0..bag.remaining() {
            assert!(seen.insert(bag.draw()), "shape repeated within a cycle");
        }
    }

    #[test]
    fn seven_consecutive_draws_cover_every_shape() {
        let mut bag = settled_bag();
        let drawn: HashSet<Shape> = (0..7).map(|_| bag.draw()).collect();
        assert_eq!(drawn.len(), 7);
        assert_eq!(bag.remaining(), 0);
    }

    #[test]
    fn empty_bag_refills_on_the_next_draw() {
        let mut bag = settled_bag();
        for _ in 0..7 {
            bag.draw();
        }
        assert_eq!(bag.remaining(), 0);
        bag.draw();
        assert_eq!(bag.remaining(), 6);
    }
}
