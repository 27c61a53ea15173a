//! Dresses a finished room with interior objects.
//!
//! Every empty cell above the room's floor is tracked in a vacancy map. Candidates are drawn at
//! random and paired with a weighted object; an object is only committed if its height band,
//! proximity weighting, placement budget, clearance and neighbour condition all agree with the
//! cell. Committed objects may grow extensions (chairs around a table) recursively.

use crate::{
    assets::{AssetLibrary, ObjectId, RoomDefinition},
    condition::ConditionSlots,
    direction::Orientation,
    neighbours::Neighbourhood,
    proximity::{passes_corridor_width_test, placement_probability, Proximity},
    sampling::{chance, sample_inclusive_f32, sample_index, sample_weighted},
    sorted_points, PlacedPrefab, VoxelGrid,
};

use fnv::{FnvHashMap, FnvHashSet};
use glam::IVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Cells below this elevation must pass the corridor width test to become candidates.
pub const CORRIDOR_TEST_BELOW: i32 = 3;

const EXACT_TOLERANCE: f32 = 1e-4;
const MIN_TOTAL_DIST: i32 = 2;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct InteriorSpec {
    /// Placement attempts per candidate cell.
    pub attempts_per_candidate: u32,
    pub max_extension_depth: u32,
}

impl Default for InteriorSpec {
    fn default() -> Self {
        InteriorSpec {
            attempts_per_candidate: 3,
            max_extension_depth: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Vacancy {
    /// Free for anything.
    Empty,
    /// Must stay walkable, but may be overhung by an object's semi-clearance.
    SemiEmpty,
}

/// The volume of a committed room that objects are placed into.
#[derive(Clone, Copy, Debug)]
pub struct RoomInterior<'a> {
    pub floor: &'a FnvHashSet<IVec3>,
    pub floor_y: i32,
    pub height: i32,
    /// Corridor clearance reserved for walking.
    pub reserved: &'a FnvHashSet<IVec3>,
}

impl RoomInterior<'_> {
    pub fn contains(&self, p: IVec3) -> bool {
        let elevation = p.y - self.floor_y;

        elevation >= 1
            && elevation < self.height
            && self.floor.contains(&IVec3::new(p.x, self.floor_y, p.z))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Candidate {
    pub cell: IVec3,
    pub elevation: i32,
    pub proximity: Proximity,
}

pub struct PlacementEngine<'a, G: VoxelGrid + ?Sized> {
    grid: &'a G,
    library: &'a AssetLibrary,
    room: &'a RoomDefinition,
    interior: RoomInterior<'a>,
    spec: &'a InteriorSpec,
    vacancy: FnvHashMap<IVec3, Vacancy>,
    occupied: FnvHashSet<IVec3>,
    candidates: Vec<Candidate>,
    counts: FnvHashMap<ObjectId, u32>,
    slots: ConditionSlots,
    placements: Vec<PlacedPrefab>,
}

impl<'a, G: VoxelGrid + ?Sized> PlacementEngine<'a, G> {
    pub fn new(
        grid: &'a G,
        library: &'a AssetLibrary,
        room: &'a RoomDefinition,
        interior: RoomInterior<'a>,
        spec: &'a InteriorSpec,
    ) -> Self {
        let mut vacancy = FnvHashMap::default();
        for p in interior.floor.iter() {
            for elevation in 1..interior.height {
                let cell = *p + IVec3::Y * elevation;
                if !grid.is_empty(cell) {
                    continue;
                }
                let state = if interior.reserved.contains(&cell) {
                    Vacancy::SemiEmpty
                } else {
                    Vacancy::Empty
                };
                vacancy.insert(cell, state);
            }
        }

        PlacementEngine {
            grid,
            library,
            room,
            interior,
            spec,
            vacancy,
            occupied: FnvHashSet::default(),
            candidates: Vec::new(),
            counts: FnvHashMap::default(),
            slots: ConditionSlots::default(),
            placements: Vec::new(),
        }
    }

    pub fn vacancy(&self, p: IVec3) -> Option<Vacancy> {
        self.vacancy.get(&p).copied()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn placements(&self) -> &[PlacedPrefab] {
        &self.placements
    }

    pub fn into_placements(self) -> Vec<PlacedPrefab> {
        self.placements
    }

    pub fn count(&self, object: ObjectId) -> u32 {
        self.counts.get(&object).copied().unwrap_or(0)
    }

    pub fn collect_candidates<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let keep = 1.0 - self.room.chance_of_empty_cell;
        for p in sorted_points(self.interior.floor.iter()) {
            for elevation in 1..self.interior.height {
                let cell = p + IVec3::Y * elevation;
                if self.vacancy(cell) != Some(Vacancy::Empty) {
                    continue;
                }
                if elevation < CORRIDOR_TEST_BELOW && !passes_corridor_width_test(self.grid, cell) {
                    continue;
                }

                let proximity =
                    Proximity::measure(self.grid, self.interior.floor, self.interior.floor_y, cell);
                if chance(rng, keep) {
                    self.candidates.push(Candidate {
                        cell,
                        elevation,
                        proximity,
                    });
                }
            }
        }
    }

    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let library = self.library;
        let room = self.room;
        let interiors = &room.interiors;
        if interiors.is_empty() {
            return;
        }

        let attempts = self.candidates.len() * self.spec.attempts_per_candidate as usize;
        for _ in 0..attempts {
            if self.candidates.is_empty() {
                break;
            }

            let index = sample_index(rng, self.candidates.len());
            let object = match sample_weighted(rng, interiors, |id| {
                library.object(*id).placement_weight
            }) {
                Some(i) => interiors[i],
                None => break,
            };
            let orientation = Orientation::ALL[sample_index(rng, Orientation::ALL.len())];

            self.attempt_candidate(index, object, orientation, rng);
        }
    }

    /// Tries `object` at the candidate's cell, including the proximity checks that only apply to
    /// objects chosen by the room itself.
    fn attempt_candidate<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        object: ObjectId,
        orientation: Orientation,
        rng: &mut R,
    ) -> bool {
        let candidate = self.candidates[index];
        let library = self.library;
        let def = library.object(object);

        if !def.height_band_matches(candidate.elevation, self.interior.height) {
            return false;
        }

        if let Some(weight) = def.weight_to_middle {
            if candidate.proximity.total_dist() < MIN_TOTAL_DIST {
                return false;
            }
            let prox = candidate.proximity.middle_proximity();
            if def.exact {
                if (prox - weight).abs() > EXACT_TOLERANCE {
                    return false;
                }
            } else if !chance(rng, placement_probability(weight, prox)) {
                return false;
            }
        }

        self.try_place(object, candidate.cell, orientation, 0, rng)
    }

    /// Places `object` at `cell` if its budget, clearance, semi-clearance and condition allow it,
    /// then grows its extensions.
    pub fn try_place<R: Rng + ?Sized>(
        &mut self,
        object: ObjectId,
        cell: IVec3,
        orientation: Orientation,
        depth: u32,
        rng: &mut R,
    ) -> bool {
        let library = self.library;
        let def = library.object(object);

        if let Some(max) = def.max_count {
            if self.count(object) >= max {
                return false;
            }
        }

        let clearance: Vec<IVec3> = def
            .clearance
            .iter()
            .map(|o| cell + orientation.rotate(*o))
            .collect();
        if !clearance
            .iter()
            .all(|p| self.vacancy(*p) == Some(Vacancy::Empty))
        {
            return false;
        }

        let semi: Vec<IVec3> = def
            .semi_clearance
            .iter()
            .map(|o| cell + orientation.rotate(*o))
            .collect();
        if !semi
            .iter()
            .all(|p| !self.interior.contains(*p) || self.vacancy.contains_key(p))
        {
            return false;
        }

        if !def.condition.is_trivial() {
            let grid = self.grid;
            let occupied = &self.occupied;
            let snapshot = Neighbourhood::capture(cell, |p| grid.is_empty(p) && !occupied.contains(&p));
            self.slots.load(&snapshot, orientation);
            if !def.condition.evaluate(&self.slots) {
                return false;
            }
        }

        let yaw = orientation.yaw_degrees() + sample_inclusive_f32(rng, def.yaw_jitter);

        for p in clearance.iter() {
            self.vacancy.remove(p);
            self.occupied.insert(*p);
        }
        for p in semi.iter() {
            if let Some(v) = self.vacancy.get_mut(p) {
                *v = Vacancy::SemiEmpty;
            }
        }
        let vacancy = &self.vacancy;
        self.candidates
            .retain(|c| vacancy.get(&c.cell) == Some(&Vacancy::Empty));
        *self.counts.entry(object).or_insert(0) += 1;

        log::trace!("Placed {} at {:?} facing {:?}", def.name, cell, orientation);
        self.placements.push(PlacedPrefab {
            object,
            prefab: def.prefab.clone(),
            position: cell,
            orientation,
            yaw,
            cells: clearance,
        });

        self.place_extensions(object, cell, orientation, depth, rng);

        true
    }

    fn place_extensions<R: Rng + ?Sized>(
        &mut self,
        owner: ObjectId,
        cell: IVec3,
        orientation: Orientation,
        depth: u32,
        rng: &mut R,
    ) {
        if depth >= self.spec.max_extension_depth {
            return;
        }

        let library = self.library;
        for extension in library.object(owner).extensions.iter() {
            for placement in extension.placements.iter() {
                if chance(rng, extension.skip_chance) {
                    continue;
                }
                let child = match sample_weighted(rng, &extension.objects, |id| {
                    library.object(*id).placement_weight
                }) {
                    Some(i) => extension.objects[i],
                    None => continue,
                };

                let at = cell + orientation.rotate(placement.offset);
                let elevation = at.y - self.interior.floor_y;
                if !library
                    .object(child)
                    .height_band_matches(elevation, self.interior.height)
                {
                    continue;
                }

                let child_orientation = orientation.turned(placement.facing.yaw_quarter_turns());
                self.try_place(child, at, child_orientation, depth + 1, rng);
            }
        }
    }
}

/// Runs the whole placement pass for one room.
pub fn furnish_room<G: VoxelGrid + ?Sized, R: Rng + ?Sized>(
    grid: &G,
    library: &AssetLibrary,
    room: &RoomDefinition,
    interior: RoomInterior<'_>,
    spec: &InteriorSpec,
    rng: &mut R,
) -> Vec<PlacedPrefab> {
    let mut engine = PlacementEngine::new(grid, library, room, interior, spec);
    engine.collect_candidates(rng);
    let candidate_count = engine.candidates().len();
    engine.run(rng);

    log::debug!(
        "Furnished {}: {} objects from {} candidates",
        room.name,
        engine.placements().len(),
        candidate_count
    );

    engine.into_placements()
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
