use std::collections::HashMap;

use smithay::utils::{Logical, Point};

/// Last known position of a window, keyed by `(app_id, title)`. Lives as
/// long as the shell process and starts empty.
#[derive(Debug, Default)]
pub struct PlacementMemory {
    positions: HashMap<(String, String), Point<i32, Logical>>,
}

impl PlacementMemory {
    pub fn remember(&mut self, app_id: &str, title: &str, pos: Point<i32, Logical>) {
        self.positions
            .insert((app_id.to_owned(), title.to_owned()), pos);
    }

    pub fn recall(&self, app_id: &str, title: &str) -> Option<Point<i32, Logical>> {
        self.positions
            .get(&(app_id.to_owned(), title.to_owned()))
            .copied()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_app_id_and_title() {
        let mut memory = PlacementMemory::default();
        memory.remember("term", "a", Point::from((1, 2)));
        memory.remember("term", "b", Point::from((3, 4)));
        memory.remember("term", "a", Point::from((5, 6)));

        assert_eq!(memory.recall("term", "a"), Some(Point::from((5, 6))));
        assert_eq!(memory.recall("other", "a"), None);
        assert_eq!(memory.len(), 2);

        memory.clear();
        assert!(memory.is_empty());
    }
}
