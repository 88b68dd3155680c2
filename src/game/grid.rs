use super::types::Cell;
use crate::error::GameError;
use rand::Rng;

const OCCUPIED: usize = usize::MAX;

/// Tracks which cells of a bounded grid are free.
///
/// Free cells live in a dense list so sampling is a single uniform index
/// draw. `slots` maps every packed cell key (`x * height + y`) to its
/// position in that list, or `OCCUPIED`, which keeps add and remove O(1).
#[derive(Debug, Clone)]
pub struct CellGrid {
    width: i32,
    height: i32,
    free: Vec<usize>,
    slots: Vec<usize>,
}

impl CellGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let capacity = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            free: (0..capacity).collect(),
            slots: (0..capacity).collect(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width && cell.y >= 0 && cell.y < self.height
    }

    pub fn is_free(&self, cell: Cell) -> bool {
        self.key(cell)
            .map(|key| self.slots[key] != OCCUPIED)
            .unwrap_or(false)
    }

    /// Marks `cell` free. Returns whether it was occupied before.
    pub fn add(&mut self, cell: Cell) -> Result<bool, GameError> {
        let key = self.key(cell)?;
        if self.slots[key] != OCCUPIED {
            return Ok(false);
        }
        self.slots[key] = self.free.len();
        self.free.push(key);
        Ok(true)
    }

    /// Marks `cell` occupied. Returns whether it was free before.
    pub fn remove(&mut self, cell: Cell) -> Result<bool, GameError> {
        let key = self.key(cell)?;
        let index = self.slots[key];
        if index == OCCUPIED {
            return Ok(false);
        }
        self.free.swap_remove(index);
        if let Some(&moved) = self.free.get(index) {
            self.slots[moved] = index;
        }
        self.slots[key] = OCCUPIED;
        Ok(true)
    }

    pub fn random_free(&self) -> Option<Cell> {
        self.random_free_with(&mut rand::thread_rng())
    }

    pub fn random_free_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        if self.free.is_empty() {
            return None;
        }
        let key = self.free[rng.gen_range(0..self.free.len())];
        Some(self.cell_at(key))
    }

    /// Samples a free cell and marks it occupied in one step.
    pub fn take_random_free(&mut self) -> Option<Cell> {
        let cell = self.random_free()?;
        self.remove(cell).ok().map(|_| cell)
    }

    fn key(&self, cell: Cell) -> Result<usize, GameError> {
        if !self.contains(cell) {
            return Err(GameError::InvalidArgument(format!(
                "cell ({}, {}) lies outside the {}x{} grid",
                cell.x, cell.y, self.width, self.height
            )));
        }
        Ok(self.pack(cell))
    }

    fn pack(&self, cell: Cell) -> usize {
        (cell.x * self.height + cell.y) as usize
    }

    fn cell_at(&self, key: usize) -> Cell {
        let key = key as i32;
        Cell::new(key / self.height, key % self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn new_grid_is_entirely_free() {
        let grid = CellGrid::new(20, 20);
        assert_eq!(grid.capacity(), 400);
        assert_eq!(grid.free_count(), 400);
        assert!(grid.is_free(Cell::new(0, 0)));
        assert!(grid.is_free(Cell::new(19, 19)));
    }

    #[test]
    fn add_and_remove_report_previous_state() {
        let mut grid = CellGrid::new(4, 4);
        let cell = Cell::new(2, 3);

        assert_eq!(grid.add(cell), Ok(false));
        assert_eq!(grid.remove(cell), Ok(true));
        assert_eq!(grid.remove(cell), Ok(false));
        assert!(!grid.is_free(cell));
        assert_eq!(grid.free_count(), 15);

        assert_eq!(grid.add(cell), Ok(true));
        assert_eq!(grid.add(cell), Ok(false));
        assert!(grid.is_free(cell));
        assert_eq!(grid.free_count(), 16);
    }

    #[test]
    fn out_of_range_cells_fail_without_touching_the_set() {
        let mut grid = CellGrid::new(4, 4);
        for cell in [Cell::new(-1, 0), Cell::new(4, 0), Cell::new(0, -1), Cell::new(0, 4)] {
            assert!(matches!(grid.add(cell), Err(GameError::InvalidArgument(_))));
            assert!(matches!(grid.remove(cell), Err(GameError::InvalidArgument(_))));
            assert!(!grid.is_free(cell));
        }
        assert_eq!(grid.free_count(), 16);
    }

    #[test]
    fn sampling_only_yields_free_cells() {
        let mut grid = CellGrid::new(5, 5);
        for x in 0..5 {
            for y in 0..5 {
                if (x + y) % 2 == 0 {
                    grid.remove(Cell::new(x, y)).unwrap();
                }
            }
        }
        for _ in 0..200 {
            let cell = grid.random_free().expect("free cells remain");
            assert!(grid.is_free(cell));
            assert_eq!((cell.x + cell.y) % 2, 1);
        }
    }

    #[test]
    fn sampling_reaches_every_free_cell() {
        let mut grid = CellGrid::new(3, 3);
        for x in 0..3 {
            grid.remove(Cell::new(x, 0)).unwrap();
        }
        grid.add(Cell::new(1, 0)).unwrap();

        let mut seen = HashSet::new();
        for _ in 0..2000 {
            seen.insert(grid.random_free().unwrap());
        }
        assert_eq!(seen.len(), grid.free_count());
    }

    #[test]
    fn exhausted_grid_yields_none() {
        let mut grid = CellGrid::new(2, 2);
        let mut taken = HashSet::new();
        while let Some(cell) = grid.take_random_free() {
            assert!(taken.insert(cell));
        }
        assert_eq!(taken.len(), 4);
        assert_eq!(grid.free_count(), 0);
        assert!(grid.random_free().is_none());
    }
}
