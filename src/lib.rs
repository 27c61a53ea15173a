pub mod assets;
pub mod catalog;
pub mod condition;
pub mod direction;
pub mod extent;
pub mod graph;
pub mod grid;
pub mod interior;
pub mod map_types;
pub mod neighbours;
pub mod proximity;
pub mod room;
pub mod sampling;

mod symmetric_map;

pub use glam::IVec3;

use assets::ObjectId;
use direction::Orientation;

/// Tag stored in a grid cell. `EMPTY_CONTENT` is the reset state; every other value is a material
/// registered in the [`catalog::ItemCatalog`].
pub type ContentId = u16;

pub const EMPTY_CONTENT: ContentId = 0;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Cell {
    pub content: ContentId,
    pub orientation: Orientation,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        content: EMPTY_CONTENT,
        orientation: Orientation::Deg0,
    };

    pub fn new(content: ContentId, orientation: Orientation) -> Self {
        Cell {
            content,
            orientation,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content == EMPTY_CONTENT
    }
}

/// Implement this to allow the procedural generation algorithms to read and write your voxel map.
///
/// Lookups are expected to be O(1) over an unbounded, sparse lattice.
pub trait VoxelGrid {
    fn get_cell(&self, point: IVec3) -> Cell;

    fn set_cell(&mut self, point: IVec3, content: ContentId, orientation: Orientation);

    fn clear_all(&mut self);

    fn is_empty(&self, point: IVec3) -> bool {
        self.get_cell(point).is_empty()
    }
}

/// Copies `points` into a vector in (x, y, z) order, so iteration doesn't depend on hashing.
pub fn sorted_points<'a>(points: impl IntoIterator<Item = &'a IVec3>) -> Vec<IVec3> {
    let mut sorted: Vec<IVec3> = points.into_iter().copied().collect();
    sorted.sort_by_key(|p| (p.x, p.y, p.z));

    sorted
}

/// Request to instantiate `prefab` at a lattice point. The caller turns these into entities.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedPrefab {
    pub object: ObjectId,
    pub prefab: String,
    pub position: IVec3,
    pub orientation: Orientation,
    /// Orientation yaw plus cosmetic jitter, in degrees.
    pub yaw: f32,
    /// Cells exclusively claimed by this instance.
    pub cells: Vec<IVec3>,
}
