use crate::{
    catalog::ItemCatalog,
    direction::{Direction8, Orientation, ORTHOGONAL_DIRECTIONS},
    extent::Extent,
    neighbours::{count_empty, first_empty, neighbours, NeighbourSet},
    sampling::{sample_inclusive, sample_index},
    sorted_points, Cell, ContentId, VoxelGrid, EMPTY_CONTENT,
};

use fnv::FnvHashSet;
use glam::IVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Height of a door opening above its threshold.
pub const DOOR_HEIGHT: i32 = 2;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtrusionSpec {
    pub max_iterations: u32,
    pub max_retries: u32,
    /// Cells on either side of a strip's centre line.
    pub outer_width: (i32, i32),
    pub length: (i32, i32),
}

impl Default for ExtrusionSpec {
    fn default() -> Self {
        ExtrusionSpec {
            max_iterations: 4,
            max_retries: 8,
            outer_width: (1, 3),
            length: (3, 8),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct RoomSpec {
    pub height: (i32, i32),
    pub max_doorways: u32,
}

impl Default for RoomSpec {
    fn default() -> Self {
        RoomSpec {
            height: (4, 6),
            max_doorways: 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoomMaterials {
    pub floor: ContentId,
    pub wall: ContentId,
    pub ceiling: ContentId,
}

/// One rectangular extrusion pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Strip {
    pub origin: IVec3,
    pub direction: Direction8,
    pub outer_width: i32,
    pub length: i32,
}

impl Strip {
    pub fn extent(&self) -> Extent {
        Extent::strip(self.origin, self.direction, self.outer_width, self.length)
    }
}

#[derive(Clone, Debug)]
pub struct RoomShape {
    pub doorway: IVec3,
    pub direction: Direction8,
    pub floor: FnvHashSet<IVec3>,
    pub strips: Vec<Strip>,
}

/// An opening in a room's wall. `inner` is the room's floor cell next to it and `outward` points
/// from `inner` through the opening.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Doorway {
    pub position: IVec3,
    pub inner: IVec3,
    pub outward: Direction8,
}

#[derive(Clone, Debug)]
pub struct RoomLayout {
    pub doorway: IVec3,
    pub entry: IVec3,
    pub height: i32,
    /// Walkable cells left after the rim was turned into walls.
    pub floor: FnvHashSet<IVec3>,
    /// Openings carved by this room.
    pub doors: Vec<Doorway>,
    /// Openings of earlier rooms that now lead into this one.
    pub connections: Vec<Doorway>,
}

pub fn initial_direction<G: VoxelGrid + ?Sized>(grid: &G, doorway: IVec3) -> Option<Direction8> {
    first_empty(grid, doorway, NeighbourSet::Orthogonal).map(|n| n.direction)
}

/// Builds one room from `doorway`: extrudes the floor, walls in the rim, mixes materials at seams
/// with older rooms and carves new doors.
///
/// Returns `None` if no floor could be extruded, in which case the grid is untouched.
#[allow(clippy::too_many_arguments)]
pub fn generate_room<G: VoxelGrid + ?Sized, R: Rng + ?Sized>(
    grid: &mut G,
    catalog: &ItemCatalog,
    doorway: IVec3,
    materials: &RoomMaterials,
    height: i32,
    room_spec: &RoomSpec,
    extrusion: &ExtrusionSpec,
    rng: &mut R,
) -> Option<RoomLayout> {
    let shape = extrude_floor(grid, doorway, materials.floor, extrusion, rng)?;
    let RoomShape {
        mut floor,
        strips,
        ..
    } = shape;
    let floor_size = floor.len();

    let walls = synthesize_walls(grid, &mut floor, materials, height);
    let potential_doorways = find_potential_doorways(grid, &walls, &floor, extrusion);
    let connections = mix_boundaries(grid, catalog, &floor, doorway, materials, height);
    let entry = nearest_point(&floor, doorway)?;
    let doors = carve_doors(
        grid,
        potential_doorways,
        room_spec.max_doorways,
        materials.floor,
        rng,
    );

    log::debug!(
        "Room from {:?}: {} strips, {} floor cells ({} walled), {} doors, {} connections",
        doorway,
        strips.len(),
        floor.len(),
        floor_size - floor.len(),
        doors.len(),
        connections.len()
    );

    Some(RoomLayout {
        doorway,
        entry,
        height,
        floor,
        doors,
        connections,
    })
}

/// Grows a connected floor footprint out of `doorway` and writes it into the grid.
pub fn extrude_floor<G: VoxelGrid + ?Sized, R: Rng + ?Sized>(
    grid: &mut G,
    doorway: IVec3,
    floor_material: ContentId,
    spec: &ExtrusionSpec,
    rng: &mut R,
) -> Option<RoomShape> {
    let direction = initial_direction(grid, doorway)?;
    let iterations = sample_inclusive(rng, (1, spec.max_iterations as i32));

    let mut origin = doorway + direction.offset();
    let mut heading = direction;
    let mut floor = FnvHashSet::default();
    let mut strips = Vec::new();
    for pass in 0..iterations {
        let strip = match try_extrude_strip(grid, origin, heading, spec, rng) {
            Some(strip) => strip,
            None if pass == 0 => {
                log::debug!("No room for a first strip at {:?}", doorway);
                return None;
            }
            None => {
                log::debug!("Stopped extruding after {} of {} passes", pass, iterations);
                break;
            }
        };

        for p in strip.extent().iter() {
            grid.set_cell(p, floor_material, Orientation::Deg0);
            floor.insert(p);
        }
        strips.push(strip);

        if pass + 1 < iterations {
            let (next_origin, next_heading) = next_growth(&strip, rng);
            origin = next_origin;
            heading = next_heading;
        }
    }

    Some(RoomShape {
        doorway,
        direction,
        floor,
        strips,
    })
}

fn try_extrude_strip<G: VoxelGrid + ?Sized, R: Rng + ?Sized>(
    grid: &G,
    origin: IVec3,
    direction: Direction8,
    spec: &ExtrusionSpec,
    rng: &mut R,
) -> Option<Strip> {
    for _ in 0..spec.max_retries {
        let strip = Strip {
            origin,
            direction,
            outer_width: sample_inclusive(rng, spec.outer_width),
            length: sample_inclusive(rng, spec.length),
        };
        if strip.extent().is_clear(grid) {
            return Some(strip);
        }
    }

    None
}

/// Picks a heading that doesn't reverse `strip` and the origin of the next strip just outside it.
/// Any strip at least 1 cell wide grown from there touches `strip` along at least 3 cells.
fn next_growth<R: Rng + ?Sized>(strip: &Strip, rng: &mut R) -> (IVec3, Direction8) {
    let options = [
        strip.direction,
        strip.direction.turn_left(),
        strip.direction.turn_right(),
    ];
    let heading = options[sample_index(rng, options.len())];

    let forward = strip.direction.offset();
    let lateral = strip.direction.turn_right().offset();
    if heading == strip.direction {
        let slack = strip.outer_width - 1;
        let shift = sample_inclusive(rng, (-slack, slack));

        (strip.origin + forward * strip.length + lateral * shift, heading)
    } else {
        let side = if heading == strip.direction.turn_right() {
            1
        } else {
            -1
        };
        let row = sample_inclusive(rng, (1, strip.length - 2));

        (
            strip.origin + forward * row + lateral * (side * (strip.outer_width + 1)),
            heading,
        )
    }
}

/// Replaces every floor cell touching the outside with a wall column and caps the rest with a
/// ceiling. Returns the wall cells; they are removed from `floor`.
pub fn synthesize_walls<G: VoxelGrid + ?Sized>(
    grid: &mut G,
    floor: &mut FnvHashSet<IVec3>,
    materials: &RoomMaterials,
    height: i32,
) -> Vec<IVec3> {
    let rim: Vec<IVec3> = sorted_points(floor.iter())
        .into_iter()
        .filter(|p| count_empty(grid, *p, NeighbourSet::Ring) > 0)
        .collect();

    for p in rim.iter() {
        floor.remove(p);
        for y in 0..=height {
            grid.set_cell(*p + IVec3::Y * y, materials.wall, Orientation::Deg0);
        }
    }
    for p in floor.iter() {
        grid.set_cell(*p + IVec3::Y * height, materials.ceiling, Orientation::Deg0);
    }

    rim
}

/// Wall cells with exactly one side facing the outside, floor on the opposite side and enough clear
/// space beyond for the smallest possible room.
pub fn find_potential_doorways<G: VoxelGrid + ?Sized>(
    grid: &G,
    walls: &[IVec3],
    floor: &FnvHashSet<IVec3>,
    spec: &ExtrusionSpec,
) -> Vec<Doorway> {
    walls
        .iter()
        .filter_map(|w| {
            let mut empty = neighbours(grid, *w, NeighbourSet::Orthogonal).filter(|n| n.is_empty);
            let outside = empty.next()?;
            if empty.next().is_some() {
                return None;
            }

            let inner = *w - outside.offset();
            if !floor.contains(&inner) {
                return None;
            }

            let beyond = Extent::strip(
                outside.position,
                outside.direction,
                spec.outer_width.0,
                spec.length.0,
            );
            if !beyond.is_clear(grid) {
                return None;
            }

            Some(Doorway {
                position: *w,
                inner,
                outward: outside.direction,
            })
        })
        .collect()
}

/// Walks the walls around `floor` and reconciles them with neighbouring rooms. Openings left by
/// older rooms become connections; walls shared with an older room get mixed materials.
///
/// Returns the connections, not including `entry_doorway`.
pub fn mix_boundaries<G: VoxelGrid + ?Sized>(
    grid: &mut G,
    catalog: &ItemCatalog,
    floor: &FnvHashSet<IVec3>,
    entry_doorway: IVec3,
    materials: &RoomMaterials,
    height: i32,
) -> Vec<Doorway> {
    let mut connections: Vec<Doorway> = Vec::new();
    for p in sorted_points(floor.iter()) {
        for d in ORTHOGONAL_DIRECTIONS.iter() {
            let n = p + d.offset();
            if floor.contains(&n) {
                continue;
            }

            if grid.is_empty(n + IVec3::Y) {
                if n != entry_doorway && connections.iter().all(|c| c.position != n) {
                    connections.push(Doorway {
                        position: n,
                        inner: p,
                        outward: *d,
                    });
                }
                let lintel = DOOR_HEIGHT + 1..=height;
                build_seam_column(grid, catalog, n, lintel, materials.wall, *d);
            } else if is_foreign_floor(grid, floor, n + d.offset()) {
                build_seam_column(grid, catalog, n, 1..=height, materials.wall, *d);
            } else {
                fill_column(grid, n, 0..=height, materials.wall);
            }
        }
    }

    connections
}

/// Walkable floor of some other room.
fn is_foreign_floor<G: VoxelGrid + ?Sized>(
    grid: &G,
    floor: &FnvHashSet<IVec3>,
    p: IVec3,
) -> bool {
    !floor.contains(&p) && !grid.is_empty(p) && grid.is_empty(p + IVec3::Y)
}

fn build_seam_column<G: VoxelGrid + ?Sized>(
    grid: &mut G,
    catalog: &ItemCatalog,
    base: IVec3,
    levels: RangeInclusive<i32>,
    wall: ContentId,
    towards: Direction8,
) {
    for y in levels {
        let p = base + IVec3::Y * y;
        let existing = grid.get_cell(p);
        let cell = if existing.is_empty() {
            Cell::new(wall, Orientation::Deg0)
        } else if existing.content == wall {
            continue;
        } else {
            catalog.seam(existing.content, wall, towards)
        };
        grid.set_cell(p, cell.content, cell.orientation);
    }
}

fn fill_column<G: VoxelGrid + ?Sized>(
    grid: &mut G,
    base: IVec3,
    levels: RangeInclusive<i32>,
    wall: ContentId,
) {
    for y in levels {
        let p = base + IVec3::Y * y;
        if grid.is_empty(p) {
            grid.set_cell(p, wall, Orientation::Deg0);
        }
    }
}

/// Opens between 1 and `max_doorways` of the candidates. Doors never end up side by side.
pub fn carve_doors<G: VoxelGrid + ?Sized, R: Rng + ?Sized>(
    grid: &mut G,
    mut candidates: Vec<Doorway>,
    max_doorways: u32,
    floor_material: ContentId,
    rng: &mut R,
) -> Vec<Doorway> {
    let count = sample_inclusive(rng, (1, max_doorways as i32));
    let mut doors = Vec::new();
    for _ in 0..count {
        if candidates.is_empty() {
            break;
        }

        let door = candidates.swap_remove(sample_index(rng, candidates.len()));
        open_door(grid, door.position, floor_material);
        candidates.retain(|c| !orthogonally_adjacent(c.position, door.position));
        doors.push(door);
    }

    doors
}

pub fn open_door<G: VoxelGrid + ?Sized>(grid: &mut G, position: IVec3, floor_material: ContentId) {
    grid.set_cell(position, floor_material, Orientation::Deg0);
    for y in 1..=DOOR_HEIGHT {
        grid.set_cell(position + IVec3::Y * y, EMPTY_CONTENT, Orientation::Deg0);
    }
}

pub fn seal_door<G: VoxelGrid + ?Sized>(grid: &mut G, position: IVec3, wall: ContentId) {
    for y in 1..=DOOR_HEIGHT {
        grid.set_cell(position + IVec3::Y * y, wall, Orientation::Deg0);
    }
}

/// True if the opening at `position` leads onto another room's walkable floor when walking
/// `outward` through it.
pub fn opens_into_room<G: VoxelGrid + ?Sized>(
    grid: &G,
    position: IVec3,
    outward: Direction8,
) -> bool {
    let beyond = position + outward.offset();

    !grid.is_empty(beyond) && grid.is_empty(beyond + IVec3::Y)
}

fn orthogonally_adjacent(a: IVec3, b: IVec3) -> bool {
    let d = a - b;

    d.y == 0 && d.x.abs() + d.z.abs() == 1
}

fn nearest_point(points: &FnvHashSet<IVec3>, target: IVec3) -> Option<IVec3> {
    points.iter().copied().min_by_key(|p| {
        let d = *p - target;
        (d.x.abs() + d.y.abs() + d.z.abs(), p.x, p.y, p.z)
    })
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
