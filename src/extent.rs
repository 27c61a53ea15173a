use crate::{direction::Direction8, VoxelGrid};

use glam::IVec3;

/// An inclusive, axis-aligned box of lattice points.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Extent {
    min: IVec3,
    max: IVec3,
}

impl Extent {
    pub fn from_corners(a: IVec3, b: IVec3) -> Self {
        Extent {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A one-cell-high strip grown from `origin` along `dir`: `length` cells deep and `outer_width`
    /// cells to either side of the centre line.
    pub fn strip(origin: IVec3, dir: Direction8, outer_width: i32, length: i32) -> Self {
        debug_assert!(dir.is_orthogonal());
        debug_assert!(length > 0 && outer_width >= 0);

        let forward = dir.offset();
        let lateral = dir.turn_right().offset();
        let a = origin - lateral * outer_width;
        let b = origin + forward * (length - 1) + lateral * outer_width;

        Extent::from_corners(a, b)
    }

    pub fn get_minimum(&self) -> IVec3 {
        self.min
    }

    pub fn get_maximum(&self) -> IVec3 {
        self.max
    }

    pub fn contains(&self, p: IVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn volume(&self) -> usize {
        let size = self.max - self.min + IVec3::ONE;

        (size.x * size.y * size.z) as usize
    }

    /// Points in x-major, then y, then z order.
    pub fn iter(&self) -> impl Iterator<Item = IVec3> {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| IVec3::new(x, y, z)))
        })
    }

    pub fn is_clear<G: VoxelGrid + ?Sized>(&self, grid: &G) -> bool {
        self.iter().all(|p| grid.is_empty(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{direction::Orientation, grid::SparseVoxelGrid};

    #[test]
    fn test_strip_is_centered_on_direction() {
        let strip = Extent::strip(IVec3::new(0, 0, 1), Direction8::Forward, 1, 4);
        assert_eq!(strip.get_minimum(), IVec3::new(-1, 0, 1));
        assert_eq!(strip.get_maximum(), IVec3::new(1, 0, 4));
        assert_eq!(strip.volume(), 12);
        assert_eq!(strip.iter().count(), 12);

        let strip = Extent::strip(IVec3::new(5, 2, 0), Direction8::Left, 2, 3);
        assert_eq!(strip.get_minimum(), IVec3::new(3, 2, -2));
        assert_eq!(strip.get_maximum(), IVec3::new(5, 2, 2));
    }

    #[test]
    fn test_contains_and_is_clear() {
        let strip = Extent::strip(IVec3::ZERO, Direction8::Right, 0, 3);
        assert!(strip.contains(IVec3::new(2, 0, 0)));
        assert!(!strip.contains(IVec3::new(3, 0, 0)));
        assert!(!strip.contains(IVec3::new(1, 1, 0)));

        let mut grid = SparseVoxelGrid::new();
        assert!(strip.is_clear(&grid));
        grid.set_cell(IVec3::new(1, 0, 0), 1, Orientation::Deg0);
        assert!(!strip.is_clear(&grid));
    }
}
