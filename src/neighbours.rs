use crate::{
    direction::{Direction8, ALL_DIRECTIONS, DIAGONAL_DIRECTIONS, ORTHOGONAL_DIRECTIONS},
    ContentId, VoxelGrid,
};

use glam::IVec3;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NeighbourSet {
    Orthogonal,
    Diagonal,
    /// The full 3x3 ring.
    Ring,
}

impl NeighbourSet {
    pub fn directions(self) -> &'static [Direction8] {
        match self {
            NeighbourSet::Orthogonal => &ORTHOGONAL_DIRECTIONS,
            NeighbourSet::Diagonal => &DIAGONAL_DIRECTIONS,
            NeighbourSet::Ring => &ALL_DIRECTIONS,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Neighbour {
    pub position: IVec3,
    pub direction: Direction8,
    pub content: ContentId,
    pub is_empty: bool,
}

impl Neighbour {
    pub fn offset(&self) -> IVec3 {
        self.direction.offset()
    }
}

/// Horizontal neighbours of `cell` on its own level.
pub fn neighbours<'a, G: VoxelGrid + ?Sized>(
    grid: &'a G,
    cell: IVec3,
    set: NeighbourSet,
) -> impl Iterator<Item = Neighbour> + 'a {
    set.directions().iter().map(move |d| {
        let position = cell + d.offset();
        let content = grid.get_cell(position);

        Neighbour {
            position,
            direction: *d,
            content: content.content,
            is_empty: content.is_empty(),
        }
    })
}

pub fn first_empty<G: VoxelGrid + ?Sized>(
    grid: &G,
    cell: IVec3,
    set: NeighbourSet,
) -> Option<Neighbour> {
    neighbours(grid, cell, set).find(|n| n.is_empty)
}

pub fn count_empty<G: VoxelGrid + ?Sized>(grid: &G, cell: IVec3, set: NeighbourSet) -> usize {
    neighbours(grid, cell, set).filter(|n| n.is_empty).count()
}

/// Emptiness of the 3x3x3 block around a cell, minus the centre column. Level 0 is below the cell,
/// level 1 beside it and level 2 above it; directions are in world space.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Neighbourhood {
    empty: [[bool; 8]; 3],
}

impl Neighbourhood {
    pub fn capture(cell: IVec3, is_empty: impl Fn(IVec3) -> bool) -> Self {
        let mut empty = [[false; 8]; 3];
        for (level, row) in empty.iter_mut().enumerate() {
            let centre = cell + IVec3::Y * (level as i32 - 1);
            for d in ALL_DIRECTIONS.iter() {
                row[d.index()] = is_empty(centre + d.offset());
            }
        }

        Neighbourhood { empty }
    }

    pub fn is_empty(&self, level: usize, dir: Direction8) -> bool {
        self.empty[level][dir.index()]
    }

    pub fn set_empty(&mut self, level: usize, dir: Direction8, value: bool) {
        self.empty[level][dir.index()] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{direction::Orientation, grid::SparseVoxelGrid};

    fn grid_with(points: &[IVec3]) -> SparseVoxelGrid {
        let mut grid = SparseVoxelGrid::new();
        for p in points {
            grid.set_cell(*p, 1, Orientation::Deg0);
        }

        grid
    }

    #[test]
    fn test_orthogonal_query_reports_contents() {
        let grid = grid_with(&[IVec3::new(0, 0, 1), IVec3::new(-1, 0, 0)]);
        let found: Vec<_> = neighbours(&grid, IVec3::ZERO, NeighbourSet::Orthogonal).collect();

        assert_eq!(found.len(), 4);
        assert_eq!(found[0].direction, Direction8::Forward);
        assert!(!found[0].is_empty);
        assert_eq!(found[0].content, 1);
        assert!(found[1].is_empty);
        assert!(!found[3].is_empty);
        assert_eq!(found[3].position, IVec3::new(-1, 0, 0));
    }

    #[test]
    fn test_first_empty_skips_filled() {
        let grid = grid_with(&[IVec3::new(0, 0, 1)]);
        let n = first_empty(&grid, IVec3::ZERO, NeighbourSet::Orthogonal).unwrap();
        assert_eq!(n.direction, Direction8::Right);

        let boxed = grid_with(&[
            IVec3::new(0, 0, 1),
            IVec3::new(1, 0, 0),
            IVec3::new(0, 0, -1),
            IVec3::new(-1, 0, 0),
        ]);
        assert!(first_empty(&boxed, IVec3::ZERO, NeighbourSet::Orthogonal).is_none());
        assert_eq!(count_empty(&boxed, IVec3::ZERO, NeighbourSet::Diagonal), 4);
        assert_eq!(count_empty(&boxed, IVec3::ZERO, NeighbourSet::Ring), 4);
    }

    #[test]
    fn test_neighbourhood_levels() {
        let grid = grid_with(&[IVec3::new(1, -1, 0), IVec3::new(0, 1, -1)]);
        let snapshot = Neighbourhood::capture(IVec3::ZERO, |p| grid.is_empty(p));

        assert!(!snapshot.is_empty(0, Direction8::Right));
        assert!(snapshot.is_empty(1, Direction8::Right));
        assert!(!snapshot.is_empty(2, Direction8::Back));
        assert!(snapshot.is_empty(2, Direction8::Forward));
    }
}
