use crate::error::{DlaError, Result};
use crate::lattice::Coord;
use rand::Rng;
use std::collections::HashMap;

/// Perimeter cells through which new particles may enter.
///
/// Members live in a dense vector with a coordinate -> slot index so that
/// membership, removal and uniform sampling are all O(1). Order depends only
/// on the removal history, which keeps seeded runs reproducible.
#[derive(Debug, Clone, Default)]
pub struct EntryPointRegistry {
    points: Vec<Coord>,
    slots: HashMap<Coord, usize>,
}

impl EntryPointRegistry {
    /// Every perimeter cell of a `rows` x `cols` lattice, corners counted once
    pub fn build(rows: usize, cols: usize) -> Self {
        let mut points = Vec::with_capacity(2 * cols + 2 * rows.saturating_sub(2));

        // Top and bottom rows
        for col in 0..cols {
            points.push(Coord::new(0, col));
        }
        if rows > 1 {
            for col in 0..cols {
                points.push(Coord::new(rows - 1, col));
            }
        }

        // Left and right columns without the corners
        for row in 1..rows.saturating_sub(1) {
            points.push(Coord::new(row, 0));
            if cols > 1 {
                points.push(Coord::new(row, cols - 1));
            }
        }

        let slots = points.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        Self { points, slots }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.slots.contains_key(&coord)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coord> {
        self.points.iter()
    }

    /// Remove `coord` if present. Returns whether anything was removed.
    pub fn remove(&mut self, coord: Coord) -> bool {
        let Some(slot) = self.slots.remove(&coord) else {
            return false;
        };
        self.points.swap_remove(slot);
        if let Some(&moved) = self.points.get(slot) {
            self.slots.insert(moved, slot);
        }
        true
    }

    /// Uniform draw over the remaining entry points
    pub fn sample_random<R: Rng>(&self, rng: &mut R) -> Result<Coord> {
        if self.points.is_empty() {
            return Err(DlaError::EntryPointsExhausted);
        }
        Ok(self.points[rng.gen_range(0..self.points.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_build_counts() {
        assert_eq!(EntryPointRegistry::build(3, 3).len(), 8);
        assert_eq!(EntryPointRegistry::build(5, 5).len(), 16);
        assert_eq!(EntryPointRegistry::build(5, 7).len(), 20);
        assert_eq!(EntryPointRegistry::build(251, 251).len(), 1000);
    }

    #[test]
    fn test_build_is_exactly_the_perimeter() {
        let registry = EntryPointRegistry::build(5, 7);
        let unique: HashSet<_> = registry.iter().copied().collect();
        assert_eq!(unique.len(), registry.len());
        for c in registry.iter() {
            assert!(c.row == 0 || c.row == 4 || c.col == 0 || c.col == 6);
        }
        assert!(registry.contains(Coord::new(0, 0)));
        assert!(registry.contains(Coord::new(4, 6)));
        assert!(!registry.contains(Coord::new(2, 3)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = EntryPointRegistry::build(5, 5);
        assert!(registry.remove(Coord::new(0, 0)));
        let after_once: HashSet<_> = registry.iter().copied().collect();
        assert!(!registry.remove(Coord::new(0, 0)));
        let after_twice: HashSet<_> = registry.iter().copied().collect();
        assert_eq!(after_once, after_twice);
        assert_eq!(registry.len(), 15);
        assert!(!registry.remove(Coord::new(2, 2)));
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut registry = EntryPointRegistry::build(5, 5);
        let all: Vec<Coord> = registry.iter().copied().collect();
        for (i, coord) in all.iter().enumerate() {
            assert!(registry.remove(*coord));
            assert_eq!(registry.len(), all.len() - i - 1);
            for rest in &all[i + 1..] {
                assert!(registry.contains(*rest));
            }
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sample_random_members_and_exhaustion() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut registry = EntryPointRegistry::build(3, 3);
        for _ in 0..50 {
            let c = registry.sample_random(&mut rng).unwrap();
            assert!(registry.contains(c));
        }
        while let Ok(c) = registry.sample_random(&mut rng) {
            registry.remove(c);
        }
        assert!(registry.is_empty());
        assert_eq!(registry.sample_random(&mut rng), Err(DlaError::EntryPointsExhausted));
    }

    #[test]
    fn test_sample_reproducible() {
        let registry = EntryPointRegistry::build(11, 11);
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(registry.sample_random(&mut a).unwrap(), registry.sample_random(&mut b).unwrap());
        }
    }
}
