use crate::{
    direction::{Direction8, ALL_DIRECTIONS, ORTHOGONAL_DIRECTIONS},
    VoxelGrid,
};

use fnv::FnvHashSet;
use glam::IVec3;

/// Open cells counted outward from a cell in each of the 8 horizontal directions.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Proximity {
    distances: [i32; 8],
}

impl Proximity {
    pub fn new(distances: [i32; 8]) -> Self {
        Proximity { distances }
    }

    /// Walks away from `cell` until leaving the room's floor footprint or hitting a filled cell.
    /// `floor` holds the footprint at `floor_y`; `cell` may be at any elevation above it.
    pub fn measure<G: VoxelGrid + ?Sized>(
        grid: &G,
        floor: &FnvHashSet<IVec3>,
        floor_y: i32,
        cell: IVec3,
    ) -> Self {
        let mut distances = [0; 8];
        for d in ALL_DIRECTIONS.iter() {
            let mut count = 0;
            let mut p = cell + d.offset();
            while floor.contains(&IVec3::new(p.x, floor_y, p.z)) && grid.is_empty(p) {
                count += 1;
                p += d.offset();
            }
            distances[d.index()] = count;
        }

        Proximity { distances }
    }

    pub fn distance(&self, dir: Direction8) -> i32 {
        self.distances[dir.index()]
    }

    /// Open cells on both sides of `dir`'s axis.
    pub fn axis_span(&self, dir: Direction8) -> i32 {
        self.distance(dir) + self.distance(dir.opposite())
    }

    /// The narrowest span through the cell over all four axes.
    pub fn total_dist(&self) -> i32 {
        ALL_DIRECTIONS[..4]
            .iter()
            .map(|d| self.axis_span(*d))
            .min()
            .unwrap_or(0)
    }

    /// 1 when the cell is centred on every axis, falling to 0 as it nears any wall.
    pub fn middle_proximity(&self) -> f32 {
        ALL_DIRECTIONS[..4]
            .iter()
            .map(|d| {
                let (a, b) = (self.distance(*d), self.distance(d.opposite()));
                if a + b == 0 {
                    0.0
                } else {
                    1.0 - (a - b).abs() as f32 / (a + b) as f32
                }
            })
            .fold(1.0, f32::min)
    }
}

/// Chance of accepting a placement at normalized middle proximity `prox` for an object that leans
/// toward the middle with `weight` (1 = centre, 0 = edges).
pub fn placement_probability(weight: f32, prox: f32) -> f32 {
    let p2 = prox * prox;

    weight * p2 + (1.0 - weight) * (1.0 - p2)
}

/// Rejects cells in single-width corridors and cells facing a one-cell gap between two walls, which
/// is what a doorway looks like from the inside.
pub fn passes_corridor_width_test<G: VoxelGrid + ?Sized>(grid: &G, cell: IVec3) -> bool {
    let filled = |d: Direction8| !grid.is_empty(cell + d.offset());
    let (forward, back) = (filled(Direction8::Forward), filled(Direction8::Back));
    let (left, right) = (filled(Direction8::Left), filled(Direction8::Right));

    if left && right && !forward && !back {
        return false;
    }
    if forward && back && !left && !right {
        return false;
    }

    for d in ORTHOGONAL_DIRECTIONS.iter() {
        let front = cell + d.offset();
        let lateral = d.turn_right().offset();
        if grid.is_empty(front) && !grid.is_empty(front + lateral) && !grid.is_empty(front - lateral)
        {
            return false;
        }
    }

    true
}
