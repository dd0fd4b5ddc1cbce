use crate::entry_points::EntryPointRegistry;
use crate::error::Result;
use crate::lattice::{Cell, Coord, Lattice};
use rand::Rng;

/// Place a new particle on a randomly chosen entry point and return its position.
///
/// Fails with `EntryPointsExhausted` once the aggregate has sealed every
/// perimeter cell; the lattice is left untouched in that case.
pub fn inject<R: Rng>(
    lattice: &mut Lattice,
    registry: &EntryPointRegistry,
    rng: &mut R,
) -> Result<Coord> {
    let start = registry.sample_random(rng)?;
    lattice.set(start, Cell::Occupied)?;
    Ok(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DlaError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_inject_marks_perimeter_cell() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut lattice = Lattice::new(5, 5).unwrap();
        let registry = EntryPointRegistry::build(5, 5);

        let at = inject(&mut lattice, &registry, &mut rng).unwrap();
        assert!(lattice.is_perimeter(at));
        assert!(lattice.occupied(at).unwrap());
        assert_eq!(lattice.occupied_count(), 2);
    }

    #[test]
    fn test_inject_exhausted_leaves_lattice_alone() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut lattice = Lattice::new(3, 3).unwrap();
        let registry = EntryPointRegistry::default();

        assert_eq!(inject(&mut lattice, &registry, &mut rng), Err(DlaError::EntryPointsExhausted));
        assert_eq!(lattice.occupied_count(), 1);
    }
}
