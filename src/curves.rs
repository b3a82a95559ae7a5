// SPDX: CC0-1.0

use crate::{eval::Expr, Number, Point};
use std::sync::Arc;

// a user-placed curve anchor, tagged with the expression that was selected
// when it was placed
#[derive(Clone, Debug)]
pub struct Seed {
    pub point: Point<Number>,
    pub expr: Arc<Expr>,
}

// fixed-capacity ring: placing past capacity wraps the cursor back to the
// first slot and overwrites it (not FIFO eviction)
#[derive(Clone, Debug)]
pub struct CurveSet {
    slots: Vec<Option<Seed>>,
    cursor: usize,
}

impl CurveSet {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "curve capacity must be nonzero");
        Self {
            slots: vec![None; capacity],
            cursor: 0,
        }
    }

    pub fn place(&mut self, seed: Seed) {
        self.slots[self.cursor] = Some(seed);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.cursor = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seed> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(x: Number) -> Seed {
        Seed {
            point: Point { x, y: 0.0 },
            expr: Arc::new(Expr { terms: Vec::new() }),
        }
    }

    #[test]
    fn fills_in_order() {
        let mut set = CurveSet::with_capacity(3);
        assert!(set.is_empty());
        set.place(seed(1.0));
        set.place(seed(2.0));
        assert_eq!(set.len(), 2);
        let xs: Vec<Number> = set.iter().map(|s| s.point.x).collect();
        assert_eq!(xs, vec![1.0, 2.0]);
    }

    #[test]
    fn wraps_to_first_slot() {
        let mut set = CurveSet::with_capacity(3);
        for x in [1.0, 2.0, 3.0, 4.0] {
            set.place(seed(x));
        }
        assert_eq!(set.len(), 3);
        // the fourth insertion overwrote slot 0, in slot order
        let xs: Vec<Number> = set.iter().map(|s| s.point.x).collect();
        assert_eq!(xs, vec![4.0, 2.0, 3.0]);
    }

    #[test]
    fn clear_empties_every_slot() {
        let mut set = CurveSet::with_capacity(2);
        set.place(seed(1.0));
        set.place(seed(2.0));
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        // placement restarts from the first slot
        set.place(seed(5.0));
        let xs: Vec<Number> = set.iter().map(|s| s.point.x).collect();
        assert_eq!(xs, vec![5.0]);
    }
}
