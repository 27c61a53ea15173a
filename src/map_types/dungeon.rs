use crate::{
    assets::{AssetLibrary, RoomId},
    direction::Direction8,
    graph::reserve_corridors,
    interior::{furnish_room, InteriorSpec, RoomInterior},
    room::{
        generate_room, opens_into_room, seal_door, Doorway, ExtrusionSpec, RoomSpec, DOOR_HEIGHT,
    },
    sampling::{sample_inclusive, sample_index, small_rng},
    sorted_points, ContentId, PlacedPrefab, VoxelGrid,
};

use fnv::FnvHashSet;
use glam::IVec3;
use rand::{prelude::*, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use stats::OnlineStats;
use std::{collections::VecDeque, ops::Range, thread, time::Duration};
use thiserror::Error;

pub const MAX_GENERATE_TRIES: usize = 200;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SpecError {
    #[error("failed to parse dungeon spec: {0}")]
    Parse(String),
    #[error("{field}: range ({min}, {max}) is inverted")]
    InvertedRange {
        field: &'static str,
        min: i32,
        max: i32,
    },
    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: i64,
        value: i64,
    },
}

/// Everything a generation session needs besides the assets.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DungeonMapSpec {
    pub seed: u64,
    pub max_room_count: usize,
    pub max_generate_tries: usize,
    /// Sleep between the major steps of each room. Only useful for watching generation happen.
    pub step_delay_ms: Option<u64>,
    pub extrusion: ExtrusionSpec,
    pub room: RoomSpec,
    pub interior: InteriorSpec,
}

impl Default for DungeonMapSpec {
    fn default() -> Self {
        DungeonMapSpec {
            seed: 0,
            max_room_count: 8,
            max_generate_tries: MAX_GENERATE_TRIES,
            step_delay_ms: None,
            extrusion: ExtrusionSpec::default(),
            room: RoomSpec::default(),
            interior: InteriorSpec::default(),
        }
    }
}

/// Summary of one committed room.
#[derive(Clone, Debug)]
pub struct RoomSummary {
    pub definition: RoomId,
    /// The opening this room was grown from.
    pub doorway: IVec3,
    pub entry: IVec3,
    pub height: i32,
    pub floor: Vec<IVec3>,
    pub doors: Vec<Doorway>,
    pub connections: Vec<Doorway>,
    pub corridors: Vec<Vec<IVec3>>,
    pub reserved: Vec<IVec3>,
    /// This room's slice of [`DungeonMeta::placements`].
    pub placements: Range<usize>,
}

#[derive(Clone, Debug)]
pub struct DungeonMeta {
    /// Seed of the attempt that succeeded.
    pub seed: u64,
    pub attempts: usize,
    pub rooms: Vec<RoomSummary>,
    pub placements: Vec<PlacedPrefab>,
    /// Doors closed up because nothing was grown from them.
    pub sealed_doors: Vec<IVec3>,
    /// Doors still waiting for a room. Always empty after a successful run.
    pub pending_doors: Vec<IVec3>,
}

impl DungeonMapSpec {
    pub fn from_ron(text: &str) -> Result<Self, SpecError> {
        let spec: DungeonMapSpec =
            ron::de::from_str(text).map_err(|e| SpecError::Parse(e.to_string()))?;
        spec.validate()?;

        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        check_range("extrusion.outer_width", self.extrusion.outer_width)?;
        check_range("extrusion.length", self.extrusion.length)?;
        check_range("room.height", self.room.height)?;

        // A strip must survive wall synthesis with a 3-wide walkable core.
        at_least("extrusion.outer_width", 1, self.extrusion.outer_width.0 as i64)?;
        at_least("extrusion.length", 3, self.extrusion.length.0 as i64)?;
        // Door opening, lintel and ceiling.
        at_least(
            "room.height",
            DOOR_HEIGHT as i64 + 2,
            self.room.height.0 as i64,
        )?;

        at_least(
            "extrusion.max_iterations",
            1,
            self.extrusion.max_iterations as i64,
        )?;
        at_least("extrusion.max_retries", 1, self.extrusion.max_retries as i64)?;
        at_least("room.max_doorways", 1, self.room.max_doorways as i64)?;
        at_least("max_room_count", 1, self.max_room_count as i64)?;
        at_least("max_generate_tries", 1, self.max_generate_tries as i64)?;

        Ok(())
    }

    /// One attempt with `seed`. On success, returns `Some` and the generated voxels are left in
    /// `grid`. On failure the grid is cleared.
    ///
    /// An invalid spec is rejected before anything is written.
    pub fn try_generate<G: VoxelGrid + ?Sized>(
        &self,
        library: &AssetLibrary,
        seed: u64,
        grid: &mut G,
    ) -> Result<Option<DungeonMeta>, SpecError> {
        self.validate()?;

        Ok(self.run_attempt(library, seed, grid))
    }

    /// Retries with fresh seeds until an attempt reaches the room budget. The first attempt uses
    /// `self.seed`, later ones draw from a stream seeded by it, so the whole run is reproducible.
    ///
    /// `Ok(None)` means every attempt fell short; the grid is left cleared.
    pub fn generate<G: VoxelGrid + ?Sized>(
        &self,
        library: &AssetLibrary,
        grid: &mut G,
    ) -> Result<Option<DungeonMeta>, SpecError> {
        self.validate()?;

        let mut seeds = small_rng(self.seed);
        let mut seed = self.seed;
        for attempt in 1..=self.max_generate_tries {
            grid.clear_all();
            if let Some(mut meta) = self.run_attempt(library, seed, grid) {
                meta.attempts = attempt;
                return Ok(Some(meta));
            }
            seed = seeds.gen();
        }

        log::warn!(
            "Failed to generate dungeon after {} tries",
            self.max_generate_tries
        );

        Ok(None)
    }

    fn run_attempt<G: VoxelGrid + ?Sized>(
        &self,
        library: &AssetLibrary,
        seed: u64,
        grid: &mut G,
    ) -> Option<DungeonMeta> {
        log::debug!("Generating dungeon map with seed {}", seed);

        let mut session = GenerationSession::new(self, library, grid, seed);
        if !session.run() {
            log::debug!(
                "Seed {} gave up after {} of {} rooms",
                seed,
                session.rooms.len(),
                self.max_room_count
            );
            session.grid.clear_all();
            return None;
        }

        let sealed_doors = session.post_process();
        log_summary(&session.rooms);

        Some(DungeonMeta {
            seed,
            attempts: 1,
            rooms: session.rooms,
            placements: session.placements,
            sealed_doors,
            pending_doors: session.frontier.iter().map(|d| d.position).collect(),
        })
    }
}

fn check_range(field: &'static str, (min, max): (i32, i32)) -> Result<(), SpecError> {
    if min > max {
        Err(SpecError::InvertedRange { field, min, max })
    } else {
        Ok(())
    }
}

fn at_least(field: &'static str, min: i64, value: i64) -> Result<(), SpecError> {
    if value < min {
        Err(SpecError::TooSmall { field, min, value })
    } else {
        Ok(())
    }
}

fn log_summary(rooms: &[RoomSummary]) {
    let mut floor_sizes = OnlineStats::new();
    let mut furnished = OnlineStats::new();
    for room in rooms.iter() {
        floor_sizes.add(room.floor.len());
        furnished.add(room.placements.len());
    }

    log::info!(
        "Generated {} rooms: mean floor size {:.1}, mean placements {:.1}",
        rooms.len(),
        floor_sizes.mean(),
        furnished.mean()
    );
}

/// An opening waiting for a room to be grown from it.
#[derive(Clone, Copy, Debug)]
struct PendingDoor {
    position: IVec3,
    outward: Direction8,
    /// Wall material to refill the opening with if nothing gets built.
    wall: ContentId,
}

struct GenerationSession<'a, G: VoxelGrid + ?Sized> {
    spec: &'a DungeonMapSpec,
    library: &'a AssetLibrary,
    grid: &'a mut G,
    rng: SmallRng,
    frontier: VecDeque<PendingDoor>,
    seen: FnvHashSet<IVec3>,
    rooms: Vec<RoomSummary>,
    placements: Vec<PlacedPrefab>,
}

impl<'a, G: VoxelGrid + ?Sized> GenerationSession<'a, G> {
    fn new(
        spec: &'a DungeonMapSpec,
        library: &'a AssetLibrary,
        grid: &'a mut G,
        seed: u64,
    ) -> Self {
        GenerationSession {
            spec,
            library,
            grid,
            rng: small_rng(seed),
            frontier: VecDeque::new(),
            seen: FnvHashSet::default(),
            rooms: Vec::new(),
            placements: Vec::new(),
        }
    }

    /// Grows rooms breadth first from the origin. Returns true if the room budget was reached.
    fn run(&mut self) -> bool {
        if !self.grow_room(IVec3::ZERO) {
            return false;
        }

        while self.rooms.len() < self.spec.max_room_count {
            let door = match self.frontier.pop_front() {
                Some(door) => door,
                None => break,
            };

            if !self.grow_room(door.position)
                && !opens_into_room(&*self.grid, door.position, door.outward)
            {
                log::trace!("Sealing dead door at {:?}", door.position);
                seal_door(&mut *self.grid, door.position, door.wall);
            }
        }

        self.rooms.len() >= self.spec.max_room_count
    }

    fn push_door(&mut self, door: &Doorway, wall: ContentId) {
        if self.seen.insert(door.position) {
            self.frontier.push_back(PendingDoor {
                position: door.position,
                outward: door.outward,
                wall,
            });
        }
    }

    fn grow_room(&mut self, doorway: IVec3) -> bool {
        let library = self.library;
        let spec = self.spec;

        let definition_id = RoomId(sample_index(&mut self.rng, library.rooms().len()));
        let definition = library.room(definition_id);
        let height = sample_inclusive(&mut self.rng, spec.room.height);

        let layout = match generate_room(
            &mut *self.grid,
            library.catalog(),
            doorway,
            &definition.materials,
            height,
            &spec.room,
            &spec.extrusion,
            &mut self.rng,
        ) {
            Some(layout) => layout,
            None => return false,
        };
        self.pause();

        for door in layout.doors.iter().chain(layout.connections.iter()) {
            self.push_door(door, definition.materials.wall);
        }

        let targets: Vec<IVec3> = layout
            .doors
            .iter()
            .chain(layout.connections.iter())
            .map(|d| d.inner)
            .collect();
        let corridors = reserve_corridors(&layout.floor, layout.entry, &targets);
        self.pause();

        let interior = RoomInterior {
            floor: &layout.floor,
            floor_y: doorway.y,
            height,
            reserved: &corridors.reserved,
        };
        let placements = furnish_room(
            &*self.grid,
            library,
            definition,
            interior,
            &spec.interior,
            &mut self.rng,
        );
        self.pause();

        let start = self.placements.len();
        self.placements.extend(placements);
        log::debug!(
            "Room {} ({}) grown from {:?}",
            self.rooms.len(),
            definition.name,
            doorway
        );

        self.rooms.push(RoomSummary {
            definition: definition_id,
            doorway,
            entry: layout.entry,
            height,
            floor: sorted_points(layout.floor.iter()),
            doors: layout.doors,
            connections: layout.connections,
            corridors: corridors.paths,
            reserved: sorted_points(corridors.reserved.iter()),
            placements: start..self.placements.len(),
        });

        true
    }

    /// Closes every door left in the frontier that doesn't already lead into a room.
    fn post_process(&mut self) -> Vec<IVec3> {
        let mut sealed = Vec::new();
        while let Some(door) = self.frontier.pop_front() {
            if !opens_into_room(&*self.grid, door.position, door.outward) {
                seal_door(&mut *self.grid, door.position, door.wall);
                sealed.push(door.position);
            }
        }

        sealed
    }

    fn pause(&self) {
        if let Some(ms) = self.spec.step_delay_ms {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_is_valid() {
        assert_eq!(DungeonMapSpec::default().validate(), Ok(()));
    }

    #[test]
    fn test_from_ron_fills_defaults() {
        let spec = DungeonMapSpec::from_ron("(seed: 7, max_room_count: 3)").unwrap();
        assert_eq!(spec.seed, 7);
        assert_eq!(spec.max_room_count, 3);
        assert_eq!(spec.max_generate_tries, MAX_GENERATE_TRIES);
        assert_eq!(spec.interior.attempts_per_candidate, 3);

        let spec = DungeonMapSpec::from_ron("(room: (max_doorways: 2))").unwrap();
        assert_eq!(spec.room.max_doorways, 2);
        assert_eq!(spec.room.height, (4, 6));
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut spec = DungeonMapSpec::default();
        spec.room.height = (6, 4);
        assert_eq!(
            spec.validate(),
            Err(SpecError::InvertedRange {
                field: "room.height",
                min: 6,
                max: 4
            })
        );

        let mut spec = DungeonMapSpec::default();
        spec.extrusion.length = (2, 8);
        assert!(matches!(
            spec.validate(),
            Err(SpecError::TooSmall {
                field: "extrusion.length",
                ..
            })
        ));

        let mut spec = DungeonMapSpec::default();
        spec.room.height = (3, 6);
        assert!(spec.validate().is_err());

        let mut spec = DungeonMapSpec::default();
        spec.max_room_count = 0;
        assert!(spec.validate().is_err());

        assert!(matches!(
            DungeonMapSpec::from_ron("(seed: -1)"),
            Err(SpecError::Parse(_))
        ));
    }
}
