use crate::error::{DlaError, Result};
use serde::{Deserialize, Serialize};

/// Moore neighborhood offsets as (row, col) deltas, row-major
const MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// A lattice coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True if the two coordinates touch horizontally, vertically or diagonally
    pub fn is_moore_adjacent(&self, other: &Coord) -> bool {
        self != other && self.row.abs_diff(other.row) <= 1 && self.col.abs_diff(other.col) <= 1
    }
}

impl From<(usize, usize)> for Coord {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Occupied,
}

impl Cell {
    pub fn is_occupied(self) -> bool {
        self == Cell::Occupied
    }
}

/// Square-ish occupancy grid with a permanently occupied center seed
#[derive(Debug, Clone)]
pub struct Lattice {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Lattice {
    /// Create an empty lattice with only the center cell occupied.
    /// Both dimensions must be odd and at least 3.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows < 3 || cols < 3 || rows % 2 == 0 || cols % 2 == 0 {
            return Err(DlaError::InvalidShape(vec![rows, cols]));
        }

        let mut lattice = Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        };
        let center = lattice.center();
        let idx = lattice.index(center);
        lattice.cells[idx] = Cell::Occupied;
        Ok(lattice)
    }

    /// Build from an arbitrary shape slice; anything other than two dimensions is rejected
    pub fn from_shape(shape: &[usize]) -> Result<Self> {
        match *shape {
            [rows, cols] => Self::new(rows, cols),
            _ => Err(DlaError::InvalidShape(shape.to_vec())),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn center(&self) -> Coord {
        Coord::new(self.rows / 2, self.cols / 2)
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    /// True for any cell on row 0, the last row, column 0 or the last column
    pub fn is_perimeter(&self, coord: Coord) -> bool {
        coord.row == 0 || coord.col == 0 || coord.row == self.rows - 1 || coord.col == self.cols - 1
    }

    #[inline]
    fn index(&self, coord: Coord) -> usize {
        coord.row * self.cols + coord.col
    }

    fn check(&self, coord: Coord) -> Result<()> {
        if self.contains(coord) {
            Ok(())
        } else {
            Err(DlaError::OutOfBounds {
                coord,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    pub fn occupied(&self, coord: Coord) -> Result<bool> {
        self.check(coord)?;
        Ok(self.cells[self.index(coord)].is_occupied())
    }

    /// Set a single cell. Clearing the center seed is rejected.
    pub fn set(&mut self, coord: Coord, state: Cell) -> Result<()> {
        self.check(coord)?;
        if state == Cell::Empty && coord == self.center() {
            return Err(DlaError::CenterCleared);
        }
        let idx = self.index(coord);
        self.cells[idx] = state;
        Ok(())
    }

    /// Moore neighborhood of `coord`, clipped to the lattice and excluding `coord` itself.
    /// Yields up to 8 cells in the interior, 5 on an edge and 3 in a corner.
    pub fn neighborhood(&self, coord: Coord) -> Result<Vec<Coord>> {
        self.check(coord)?;
        let max_row = self.rows - 1;
        let max_col = self.cols - 1;

        let mut neighbors = Vec::with_capacity(MOORE_OFFSETS.len());
        for &(dr, dc) in &MOORE_OFFSETS {
            let (Some(row), Some(col)) = (
                coord.row.checked_add_signed(dr),
                coord.col.checked_add_signed(dc),
            ) else {
                continue;
            };
            if row <= max_row && col <= max_col {
                neighbors.push(Coord::new(row, col));
            }
        }
        Ok(neighbors)
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_occupied()).count()
    }

    /// Copy of the current occupancy as 0/1 values
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.iter().map(|c| c.is_occupied() as u8).collect(),
        }
    }
}

/// Row-major 0/1 occupancy copy of a lattice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<u8>,
}

impl Snapshot {
    pub fn get(&self, coord: Coord) -> Option<u8> {
        if coord.row < self.rows && coord.col < self.cols {
            self.cells.get(coord.row * self.cols + coord.col).copied()
        } else {
            None
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[u8]> {
        // A zero-width snapshot has no rows to yield
        self.cells.chunks(self.cols.max(1)).take(if self.cols == 0 { 0 } else { self.rows })
    }

    pub fn to_nested(&self) -> Vec<Vec<u8>> {
        self.rows_iter().map(<[u8]>::to_vec).collect()
    }

    /// Coordinates of every occupied cell in row-major order
    pub fn occupied_coords(&self) -> Vec<Coord> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != 0)
            .take(self.rows * self.cols)
            .map(|(i, _)| Coord::new(i / self.cols, i % self.cols))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_occupies_only_center() {
        for (rows, cols) in [(3, 3), (5, 5), (3, 7), (9, 5), (21, 21)] {
            let lattice = Lattice::new(rows, cols).unwrap();
            assert_eq!(lattice.occupied_count(), 1);
            assert!(lattice.occupied(Coord::new(rows / 2, cols / 2)).unwrap());
        }
    }

    #[test]
    fn test_five_by_five_center() {
        let lattice = Lattice::new(5, 5).unwrap();
        for row in 0..5 {
            for col in 0..5 {
                let expected = row == 2 && col == 2;
                assert_eq!(lattice.occupied(Coord::new(row, col)).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert_eq!(Lattice::new(4, 5).unwrap_err(), DlaError::InvalidShape(vec![4, 5]));
        assert!(matches!(Lattice::new(5, 6), Err(DlaError::InvalidShape(_))));
        assert!(matches!(Lattice::new(1, 1), Err(DlaError::InvalidShape(_))));
        assert!(matches!(Lattice::new(0, 3), Err(DlaError::InvalidShape(_))));
        assert!(matches!(Lattice::from_shape(&[5]), Err(DlaError::InvalidShape(_))));
        assert!(matches!(Lattice::from_shape(&[5, 5, 5]), Err(DlaError::InvalidShape(_))));
        assert!(Lattice::from_shape(&[5, 7]).is_ok());
    }

    #[test]
    fn test_occupied_out_of_bounds() {
        let lattice = Lattice::new(3, 3).unwrap();
        assert!(matches!(
            lattice.occupied(Coord::new(3, 0)),
            Err(DlaError::OutOfBounds { rows: 3, cols: 3, .. })
        ));
        assert!(lattice.occupied(Coord::new(0, 3)).is_err());
    }

    #[test]
    fn test_neighborhood_sizes() {
        let lattice = Lattice::new(5, 5).unwrap();
        assert_eq!(lattice.neighborhood(Coord::new(2, 2)).unwrap().len(), 8);
        assert_eq!(lattice.neighborhood(Coord::new(0, 2)).unwrap().len(), 5);
        assert_eq!(lattice.neighborhood(Coord::new(4, 2)).unwrap().len(), 5);
        assert_eq!(lattice.neighborhood(Coord::new(2, 0)).unwrap().len(), 5);
        assert_eq!(lattice.neighborhood(Coord::new(2, 4)).unwrap().len(), 5);
        assert_eq!(lattice.neighborhood(Coord::new(0, 0)).unwrap().len(), 3);
        assert_eq!(lattice.neighborhood(Coord::new(4, 4)).unwrap().len(), 3);
    }

    #[test]
    fn test_neighborhood_stays_in_bounds() {
        let lattice = Lattice::new(5, 7).unwrap();
        for row in 0..5 {
            for col in 0..7 {
                let here = Coord::new(row, col);
                for n in lattice.neighborhood(here).unwrap() {
                    assert!(lattice.contains(n));
                    assert!(here.is_moore_adjacent(&n));
                }
            }
        }
        assert_eq!(
            lattice.neighborhood(Coord::new(4, 6)).unwrap(),
            vec![Coord::new(3, 5), Coord::new(3, 6), Coord::new(4, 5)]
        );
    }

    #[test]
    fn test_set_and_center_guard() {
        let mut lattice = Lattice::new(3, 3).unwrap();
        lattice.set(Coord::new(0, 0), Cell::Occupied).unwrap();
        assert_eq!(lattice.occupied_count(), 2);
        lattice.set(Coord::new(0, 0), Cell::Empty).unwrap();
        assert_eq!(lattice.occupied_count(), 1);
        assert_eq!(lattice.set(Coord::new(1, 1), Cell::Empty), Err(DlaError::CenterCleared));
        assert!(lattice.set(Coord::new(5, 5), Cell::Occupied).is_err());
    }

    #[test]
    fn test_perimeter() {
        let lattice = Lattice::new(5, 5).unwrap();
        assert!(lattice.is_perimeter(Coord::new(0, 2)));
        assert!(lattice.is_perimeter(Coord::new(4, 2)));
        assert!(lattice.is_perimeter(Coord::new(2, 0)));
        assert!(lattice.is_perimeter(Coord::new(2, 4)));
        assert!(!lattice.is_perimeter(Coord::new(1, 3)));
    }

    #[test]
    fn test_snapshot_shape() {
        let lattice = Lattice::new(3, 5).unwrap();
        let snap = lattice.snapshot();
        assert_eq!(snap.to_nested(), vec![vec![0, 0, 0, 0, 0], vec![0, 0, 1, 0, 0], vec![0, 0, 0, 0, 0]]);
        assert_eq!(snap.occupied_count(), 1);
        assert_eq!(snap.get(Coord::new(1, 2)), Some(1));
        assert_eq!(snap.get(Coord::new(3, 0)), None);
        assert_eq!(snap.occupied_coords(), vec![Coord::new(1, 2)]);
    }

    #[test]
    fn test_malformed_snapshot_does_not_panic() {
        let empty = Snapshot {
            rows: 2,
            cols: 0,
            cells: vec![],
        };
        assert_eq!(empty.rows_iter().count(), 0);
        assert!(empty.to_nested().is_empty());
        assert_eq!(empty.get(Coord::new(0, 0)), None);
        assert!(empty.occupied_coords().is_empty());

        let short = Snapshot {
            rows: 3,
            cols: 3,
            cells: vec![0, 1, 0, 1],
        };
        assert_eq!(short.get(Coord::new(1, 0)), Some(1));
        assert_eq!(short.get(Coord::new(2, 2)), None);
        assert_eq!(short.rows_iter().count(), 2);
        assert_eq!(short.occupied_coords(), vec![Coord::new(0, 1), Coord::new(1, 0)]);
    }
}
