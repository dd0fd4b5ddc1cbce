use crate::entry_points::EntryPointRegistry;
use crate::error::{DlaError, Result};
use crate::lattice::{Cell, Coord, Lattice};
use crate::settings::validate_stickiness;
use rand::Rng;
use tracing::trace;

/// How a single walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// A stickiness trial against an occupied neighbor succeeded
    Stuck { at: Coord, steps: u64 },
    /// No empty neighbor was left to move to
    Trapped { at: Coord, steps: u64 },
}

impl WalkOutcome {
    pub fn at(&self) -> Coord {
        match *self {
            WalkOutcome::Stuck { at, .. } | WalkOutcome::Trapped { at, .. } => at,
        }
    }

    pub fn steps(&self) -> u64 {
        match *self {
            WalkOutcome::Stuck { steps, .. } | WalkOutcome::Trapped { steps, .. } => steps,
        }
    }

    pub fn is_trapped(&self) -> bool {
        matches!(self, WalkOutcome::Trapped { .. })
    }
}

/// Lattice random walk with per-contact sticking probability
#[derive(Debug, Clone, Copy)]
pub struct RandomWalker {
    stickiness: f64,
}

impl RandomWalker {
    /// Fails with `InvalidParameter` unless `stickiness` is in (0, 1]
    pub fn new(stickiness: f64) -> Result<Self> {
        validate_stickiness(stickiness)?;
        Ok(Self { stickiness })
    }

    pub fn stickiness(&self) -> f64 {
        self.stickiness
    }

    /// Walk the particle sitting at `start` until it sticks or is boxed in.
    ///
    /// Each step runs one independent trial per occupied neighbor, so cells
    /// with more aggregate contact stick more readily. A particle with no
    /// empty neighbor always sticks, which bounds the walk even for tiny
    /// stickiness values. A particle that ends on any edge of the lattice is
    /// pruned from the entry points.
    pub fn walk<R: Rng>(
        &self,
        lattice: &mut Lattice,
        registry: &mut EntryPointRegistry,
        rng: &mut R,
        start: Coord,
    ) -> Result<WalkOutcome> {
        if !lattice.occupied(start)? {
            return Err(DlaError::ParticleNotPlaced(start));
        }

        let mut current = start;
        let mut steps: u64 = 0;

        loop {
            let mut occupied_neighbors = 0usize;
            let mut empty_neighbors = Vec::with_capacity(8);
            for n in lattice.neighborhood(current)? {
                if lattice.occupied(n)? {
                    occupied_neighbors += 1;
                } else {
                    empty_neighbors.push(n);
                }
            }

            // Every contact gets its own trial, no short-circuit
            let hits = (0..occupied_neighbors)
                .filter(|_| rng.gen::<f64>() < self.stickiness)
                .count();

            if hits > 0 || empty_neighbors.is_empty() {
                if lattice.is_perimeter(current) {
                    registry.remove(current);
                }
                let outcome = if hits > 0 {
                    WalkOutcome::Stuck { at: current, steps }
                } else {
                    WalkOutcome::Trapped { at: current, steps }
                };
                trace!(row = current.row, col = current.col, steps, trapped = outcome.is_trapped(), "particle settled");
                return Ok(outcome);
            }

            let next = empty_neighbors[rng.gen_range(0..empty_neighbors.len())];
            lattice.set(current, Cell::Empty)?;
            lattice.set(next, Cell::Occupied)?;
            current = next;
            steps += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn place(lattice: &mut Lattice, coord: Coord) {
        lattice.set(coord, Cell::Occupied).unwrap();
    }

    #[test]
    fn test_full_stickiness_sticks_on_contact() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut lattice = Lattice::new(3, 3).unwrap();
        let mut registry = EntryPointRegistry::build(3, 3);
        let start = Coord::new(0, 1);
        place(&mut lattice, start);

        let outcome = RandomWalker::new(1.0).unwrap()
            .walk(&mut lattice, &mut registry, &mut rng, start)
            .unwrap();
        assert_eq!(outcome, WalkOutcome::Stuck { at: start, steps: 0 });
        assert!(!registry.contains(start));
        assert_eq!(registry.len(), 7);
        assert_eq!(lattice.occupied_count(), 2);
    }

    #[test]
    fn test_prunes_on_every_edge() {
        // (stuck cell, occupied anchor next to it)
        let cases = [
            (Coord::new(0, 2), Coord::new(1, 2)),
            (Coord::new(4, 2), Coord::new(3, 2)),
            (Coord::new(2, 0), Coord::new(2, 1)),
            (Coord::new(2, 4), Coord::new(2, 3)),
            (Coord::new(4, 4), Coord::new(3, 3)),
        ];
        for (start, anchor) in cases {
            let mut rng = StdRng::seed_from_u64(11);
            let mut lattice = Lattice::new(5, 5).unwrap();
            let mut registry = EntryPointRegistry::build(5, 5);
            place(&mut lattice, anchor);
            place(&mut lattice, start);

            let outcome = RandomWalker::new(1.0).unwrap()
                .walk(&mut lattice, &mut registry, &mut rng, start)
                .unwrap();
            assert_eq!(outcome.at(), start);
            assert!(!registry.contains(start), "{start:?} should be pruned");
            assert_eq!(registry.len(), 15);
        }
    }

    #[test]
    fn test_interior_stick_keeps_registry() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut lattice = Lattice::new(5, 5).unwrap();
        let mut registry = EntryPointRegistry::build(5, 5);
        let start = Coord::new(1, 1);
        place(&mut lattice, start);

        let outcome = RandomWalker::new(1.0).unwrap()
            .walk(&mut lattice, &mut registry, &mut rng, start)
            .unwrap();
        assert_eq!(outcome.at(), start);
        assert_eq!(registry.len(), 16);
    }

    #[test]
    fn test_boxed_in_particle_is_trapped() {
        // A generator pinned near 1.0 makes every stickiness trial fail
        let mut rng = StepRng::new(u64::MAX, 0);
        let mut lattice = Lattice::new(3, 3).unwrap();
        let mut registry = EntryPointRegistry::build(3, 3);
        place(&mut lattice, Coord::new(0, 1));
        place(&mut lattice, Coord::new(1, 0));
        let start = Coord::new(0, 0);
        place(&mut lattice, start);

        let outcome = RandomWalker::new(0.5).unwrap()
            .walk(&mut lattice, &mut registry, &mut rng, start)
            .unwrap();
        assert_eq!(outcome, WalkOutcome::Trapped { at: start, steps: 0 });
        assert!(!registry.contains(start));
    }

    #[test]
    fn test_walk_requires_placed_particle() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut lattice = Lattice::new(5, 5).unwrap();
        let mut registry = EntryPointRegistry::build(5, 5);
        let start = Coord::new(0, 0);
        assert_eq!(
            RandomWalker::new(1.0).unwrap().walk(&mut lattice, &mut registry, &mut rng, start),
            Err(DlaError::ParticleNotPlaced(start))
        );
    }

    #[test]
    fn test_low_stickiness_nets_one_cell_per_walk() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut lattice = Lattice::new(9, 9).unwrap();
        let mut registry = EntryPointRegistry::build(9, 9);
        let walker = RandomWalker::new(0.05).unwrap();

        for k in 1..=20 {
            let before = registry.len();
            let start = registry.sample_random(&mut rng).unwrap();
            place(&mut lattice, start);
            let outcome = walker.walk(&mut lattice, &mut registry, &mut rng, start).unwrap();
            assert!(lattice.occupied(outcome.at()).unwrap());
            assert_eq!(lattice.occupied_count(), 1 + k);
            assert!(registry.len() <= before);
        }
    }

    #[test]
    fn test_walker_rejects_bad_stickiness() {
        for bad in [f64::NAN, 0.0, -0.2, 1.5, f64::INFINITY] {
            assert!(
                matches!(RandomWalker::new(bad), Err(DlaError::InvalidParameter(_))),
                "{bad} should be rejected"
            );
        }
        assert_eq!(RandomWalker::new(1.0).unwrap().stickiness(), 1.0);
    }
}
