use crate::{direction::Orientation, Cell, ContentId, VoxelGrid};

use fnv::FnvHashMap;
use glam::IVec3;

/// Hash map backed lattice with unbounded extent. Empty cells are not stored.
#[derive(Clone, Debug, Default)]
pub struct SparseVoxelGrid {
    cells: FnvHashMap<IVec3, Cell>,
}

impl SparseVoxelGrid {
    pub fn new() -> Self {
        SparseVoxelGrid::default()
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IVec3, &Cell)> {
        self.cells.iter()
    }

    /// All non-empty cells in (x, y, z) order, so two grids can be compared exactly.
    pub fn sorted_cells(&self) -> Vec<(IVec3, Cell)> {
        let mut cells: Vec<_> = self.cells.iter().map(|(p, c)| (*p, *c)).collect();
        cells.sort_by_key(|(p, _)| (p.x, p.y, p.z));

        cells
    }
}

impl VoxelGrid for SparseVoxelGrid {
    fn get_cell(&self, point: IVec3) -> Cell {
        self.cells.get(&point).copied().unwrap_or(Cell::EMPTY)
    }

    fn set_cell(&mut self, point: IVec3, content: ContentId, orientation: Orientation) {
        let cell = Cell::new(content, orientation);
        if cell.is_empty() {
            self.cells.remove(&point);
        } else {
            self.cells.insert(point, cell);
        }
    }

    fn clear_all(&mut self) {
        self.cells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EMPTY_CONTENT;

    #[test]
    fn test_set_get_and_clear() {
        let mut grid = SparseVoxelGrid::new();
        let p = IVec3::new(3, -2, 7);
        assert!(grid.is_empty(p));

        grid.set_cell(p, 5, Orientation::Deg180);
        assert_eq!(grid.get_cell(p), Cell::new(5, Orientation::Deg180));
        assert_eq!(grid.len(), 1);

        grid.set_cell(p, EMPTY_CONTENT, Orientation::Deg90);
        assert!(grid.is_empty(p));
        assert!(grid.is_blank());

        grid.set_cell(p, 1, Orientation::Deg0);
        grid.clear_all();
        assert!(grid.is_blank());
    }

    #[test]
    fn test_sorted_cells_are_ordered() {
        let mut grid = SparseVoxelGrid::new();
        grid.set_cell(IVec3::new(1, 0, 0), 1, Orientation::Deg0);
        grid.set_cell(IVec3::new(0, 5, 0), 2, Orientation::Deg0);
        grid.set_cell(IVec3::new(0, 0, 9), 3, Orientation::Deg0);

        let mut contents: Vec<_> = grid.iter().map(|(_, c)| c.content).collect();
        contents.sort_unstable();
        assert_eq!(contents, vec![1, 2, 3]);

        let points: Vec<_> = grid.sorted_cells().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            points,
            vec![
                IVec3::new(0, 0, 9),
                IVec3::new(0, 5, 0),
                IVec3::new(1, 0, 0)
            ]
        );
    }
}
