//! Room and interior-object definitions.
//!
//! Definitions are authored as a RON [`AssetManifest`] where objects refer to each other by name.
//! [`AssetLibrary::from_manifest`] loads in two phases: every object is first indexed by name, then
//! all references are resolved to [`ObjectId`]s and conditions are parsed. Objects may therefore
//! reference objects defined later in the file, or each other.

use crate::{
    catalog::{CatalogError, ItemCatalog},
    condition::{Condition, ConditionError},
    direction::Direction8,
    room::RoomMaterials,
};

use fnv::FnvHashMap;
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse asset manifest: {0}")]
    Parse(String),
    #[error("manifest has no room definitions")]
    NoRooms,
    #[error("interior object `{0}` is defined more than once")]
    DuplicateObject(String),
    #[error("`{owner}` references unknown interior object `{name}`")]
    UnknownObject { owner: String, name: String },
    #[error("condition of `{object}` is invalid: {source}")]
    Condition {
        object: String,
        #[source]
        source: ConditionError,
    },
    #[error("`{owner}`: {field} must be within [0, 1], got {value}")]
    Probability {
        owner: String,
        field: &'static str,
        value: f32,
    },
    #[error("`{object}`: height band ({min}, {max}) is inverted")]
    HeightBand { object: String, min: i32, max: i32 },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// What an object's height band is measured from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum HeightReference {
    /// 0 is the first level above the floor.
    Floor,
    /// 0 is half the room height; the band may be negative.
    Middle,
    /// 0 is the last level below the ceiling.
    Ceiling,
}

impl Default for HeightReference {
    fn default() -> Self {
        HeightReference::Floor
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExtensionPlacementDesc {
    pub offset: (i32, i32, i32),
    #[serde(default = "default_facing")]
    pub facing: Direction8,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExtensionDesc {
    pub placements: Vec<ExtensionPlacementDesc>,
    pub objects: Vec<String>,
    #[serde(default)]
    pub skip_chance: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InteriorObjectDesc {
    pub name: String,
    pub prefab: String,
    #[serde(default = "default_weight")]
    pub placement_weight: f32,
    /// `None` means placement doesn't depend on where in the room the cell is.
    #[serde(default)]
    pub weight_to_middle: Option<f32>,
    #[serde(default)]
    pub exact: bool,
    #[serde(default)]
    pub min_height: i32,
    #[serde(default)]
    pub max_height: i32,
    #[serde(default)]
    pub relative: HeightReference,
    #[serde(default)]
    pub max_count: Option<u32>,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub clearance: Vec<(i32, i32, i32)>,
    #[serde(default)]
    pub semi_clearance: Vec<(i32, i32, i32)>,
    /// Degrees.
    #[serde(default)]
    pub yaw_jitter: (f32, f32),
    #[serde(default)]
    pub extensions: Vec<ExtensionDesc>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RoomDefinitionDesc {
    pub name: String,
    pub floor: String,
    pub wall: String,
    pub ceiling: String,
    #[serde(default)]
    pub chance_of_empty_cell: f32,
    #[serde(default)]
    pub interiors: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AssetManifest {
    pub rooms: Vec<RoomDefinitionDesc>,
    #[serde(default)]
    pub objects: Vec<InteriorObjectDesc>,
}

fn default_facing() -> Direction8 {
    Direction8::Forward
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId(pub usize);

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RoomId(pub usize);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExtensionPlacement {
    /// Relative to the owner, in the owner's frame.
    pub offset: IVec3,
    /// Which way the attached object turns relative to its owner.
    pub facing: Direction8,
}

/// Objects that may be attached around an owner once it is placed.
#[derive(Clone, Debug)]
pub struct Extension {
    pub placements: Vec<ExtensionPlacement>,
    pub objects: Vec<ObjectId>,
    pub skip_chance: f32,
}

#[derive(Clone, Debug)]
pub struct InteriorObject {
    pub name: String,
    pub prefab: String,
    pub placement_weight: f32,
    pub weight_to_middle: Option<f32>,
    pub exact: bool,
    pub min_height: i32,
    pub max_height: i32,
    pub relative: HeightReference,
    pub max_count: Option<u32>,
    pub condition: Condition,
    /// Starts with the origin.
    pub clearance: Vec<IVec3>,
    pub semi_clearance: Vec<IVec3>,
    pub yaw_jitter: (f32, f32),
    pub extensions: Vec<Extension>,
}

impl InteriorObject {
    /// `elevation` counts levels above the floor, starting at 1.
    pub fn relative_height(&self, elevation: i32, room_height: i32) -> i32 {
        match self.relative {
            HeightReference::Floor => elevation - 1,
            HeightReference::Middle => elevation - room_height / 2,
            HeightReference::Ceiling => room_height - 1 - elevation,
        }
    }

    pub fn height_band_matches(&self, elevation: i32, room_height: i32) -> bool {
        let h = self.relative_height(elevation, room_height);

        h >= self.min_height && h <= self.max_height
    }
}

#[derive(Clone, Debug)]
pub struct RoomDefinition {
    pub name: String,
    pub materials: RoomMaterials,
    pub chance_of_empty_cell: f32,
    pub interiors: Vec<ObjectId>,
}

pub struct AssetLibrary {
    catalog: ItemCatalog,
    rooms: Vec<RoomDefinition>,
    objects: Vec<InteriorObject>,
    object_index: FnvHashMap<String, ObjectId>,
}

impl AssetLibrary {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path)?;

        Self::from_ron(&text)
    }

    pub fn from_ron(text: &str) -> Result<Self, AssetError> {
        let manifest: AssetManifest =
            ron::de::from_str(text).map_err(|e| AssetError::Parse(e.to_string()))?;

        Self::from_manifest(manifest)
    }

    pub fn from_manifest(manifest: AssetManifest) -> Result<Self, AssetError> {
        if manifest.rooms.is_empty() {
            return Err(AssetError::NoRooms);
        }

        // Phase 1: index every object by name.
        let mut object_index = FnvHashMap::default();
        for (i, desc) in manifest.objects.iter().enumerate() {
            if object_index
                .insert(desc.name.clone(), ObjectId(i))
                .is_some()
            {
                return Err(AssetError::DuplicateObject(desc.name.clone()));
            }
        }

        // Phase 2: resolve references.
        let objects = manifest
            .objects
            .into_iter()
            .map(|desc| resolve_object(desc, &object_index))
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = ItemCatalog::new(
            manifest
                .rooms
                .iter()
                .flat_map(|r| vec![&r.floor, &r.wall, &r.ceiling]),
        )?;

        let rooms = manifest
            .rooms
            .into_iter()
            .map(|desc| resolve_room(desc, &catalog, &object_index))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "Loaded {} room definitions, {} interior objects, {} materials",
            rooms.len(),
            objects.len(),
            catalog.base_count()
        );

        Ok(AssetLibrary {
            catalog,
            rooms,
            objects,
            object_index,
        })
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn rooms(&self) -> &[RoomDefinition] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> &RoomDefinition {
        &self.rooms[id.0]
    }

    pub fn objects(&self) -> &[InteriorObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> &InteriorObject {
        &self.objects[id.0]
    }

    pub fn object_id(&self, name: &str) -> Option<ObjectId> {
        self.object_index.get(name).copied()
    }
}

fn lookup(
    index: &FnvHashMap<String, ObjectId>,
    owner: &str,
    name: &str,
) -> Result<ObjectId, AssetError> {
    index
        .get(name)
        .copied()
        .ok_or_else(|| AssetError::UnknownObject {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
}

fn check_probability(owner: &str, field: &'static str, value: f32) -> Result<(), AssetError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AssetError::Probability {
            owner: owner.to_owned(),
            field,
            value,
        })
    }
}

fn to_ivec3((x, y, z): (i32, i32, i32)) -> IVec3 {
    IVec3::new(x, y, z)
}

fn resolve_object(
    desc: InteriorObjectDesc,
    index: &FnvHashMap<String, ObjectId>,
) -> Result<InteriorObject, AssetError> {
    if let Some(w) = desc.weight_to_middle {
        check_probability(&desc.name, "weight_to_middle", w)?;
    }
    if desc.min_height > desc.max_height {
        return Err(AssetError::HeightBand {
            object: desc.name,
            min: desc.min_height,
            max: desc.max_height,
        });
    }

    let condition = Condition::parse(&desc.condition).map_err(|source| AssetError::Condition {
        object: desc.name.clone(),
        source,
    })?;

    // The object's own cell comes first.
    let mut clearance = vec![IVec3::ZERO];
    for offset in desc.clearance.into_iter().map(to_ivec3) {
        if !clearance.contains(&offset) {
            clearance.push(offset);
        }
    }

    let mut extensions = Vec::with_capacity(desc.extensions.len());
    for ext in desc.extensions {
        check_probability(&desc.name, "skip_chance", ext.skip_chance)?;
        let objects = ext
            .objects
            .iter()
            .map(|name| lookup(index, &desc.name, name))
            .collect::<Result<Vec<_>, _>>()?;
        let placements = ext
            .placements
            .into_iter()
            .map(|p| ExtensionPlacement {
                offset: to_ivec3(p.offset),
                facing: p.facing,
            })
            .collect();

        extensions.push(Extension {
            placements,
            objects,
            skip_chance: ext.skip_chance,
        });
    }

    Ok(InteriorObject {
        name: desc.name,
        prefab: desc.prefab,
        placement_weight: desc.placement_weight,
        weight_to_middle: desc.weight_to_middle,
        exact: desc.exact,
        min_height: desc.min_height,
        max_height: desc.max_height,
        relative: desc.relative,
        max_count: desc.max_count,
        condition,
        clearance,
        semi_clearance: desc.semi_clearance.into_iter().map(to_ivec3).collect(),
        yaw_jitter: desc.yaw_jitter,
        extensions,
    })
}

fn resolve_room(
    desc: RoomDefinitionDesc,
    catalog: &ItemCatalog,
    index: &FnvHashMap<String, ObjectId>,
) -> Result<RoomDefinition, AssetError> {
    check_probability(
        &desc.name,
        "chance_of_empty_cell",
        desc.chance_of_empty_cell,
    )?;

    let interiors = desc
        .interiors
        .iter()
        .map(|name| lookup(index, &desc.name, name))
        .collect::<Result<Vec<_>, _>>()?;

    // The catalog was built from these very names.
    let material = |name: &str| catalog.id(name).unwrap_or_default();
    let materials = RoomMaterials {
        floor: material(&desc.floor),
        wall: material(&desc.wall),
        ceiling: material(&desc.ceiling),
    };

    Ok(RoomDefinition {
        name: desc.name,
        materials,
        chance_of_empty_cell: desc.chance_of_empty_cell,
        interiors,
    })
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"(
        rooms: [
            (
                name: "cellar",
                floor: "flagstone",
                wall: "brick",
                ceiling: "plaster",
                chance_of_empty_cell: 0.5,
                interiors: ["table", "lamp"],
            ),
            (
                name: "crypt",
                floor: "flagstone",
                wall: "granite",
                ceiling: "granite",
                interiors: ["lamp"],
            ),
        ],
        objects: [
            (
                name: "table",
                prefab: "props/table",
                weight_to_middle: Some(0.9),
                clearance: [(1, 0, 0), (0, 0, 0)],
                condition: "!back0 & !forward0",
                extensions: [
                    (
                        placements: [(offset: (0, 0, 1), facing: Back)],
                        objects: ["chair", "table"],
                        skip_chance: 0.25,
                    ),
                ],
            ),
            (
                name: "chair",
                prefab: "props/chair",
                placement_weight: 0.5,
            ),
            (
                name: "lamp",
                prefab: "props/lamp",
                relative: Ceiling,
                max_count: Some(2),
                yaw_jitter: (-10.0, 10.0),
            ),
        ],
    )"#;

    #[test]
    fn test_load_resolves_references_in_two_phases() {
        let library = AssetLibrary::from_ron(MANIFEST).unwrap();
        let table = library.object_id("table").unwrap();
        let chair = library.object_id("chair").unwrap();
        let lamp = library.object_id("lamp").unwrap();

        assert_eq!(library.rooms().len(), 2);
        assert_eq!(library.objects().len(), 3);
        assert_eq!(library.objects()[chair.0].prefab, "props/chair");
        assert_eq!(library.room(RoomId(0)).interiors, vec![table, lamp]);

        let t = library.object(table);
        assert_eq!(t.clearance, vec![IVec3::ZERO, IVec3::new(1, 0, 0)]);
        assert_eq!(t.extensions[0].objects, vec![chair, table]);
        assert_eq!(t.extensions[0].placements[0].facing, Direction8::Back);
        assert_eq!(t.weight_to_middle, Some(0.9));
        assert!(!t.condition.is_trivial());

        let c = library.object(chair);
        assert_eq!(c.placement_weight, 0.5);
        assert!(c.condition.is_trivial());
        assert_eq!(c.relative, HeightReference::Floor);

        assert_eq!(library.object(lamp).max_count, Some(2));
    }

    #[test]
    fn test_materials_are_shared_between_rooms() {
        let library = AssetLibrary::from_ron(MANIFEST).unwrap();
        let catalog = library.catalog();
        assert_eq!(catalog.base_count(), 4);

        let cellar = library.room(RoomId(0)).materials;
        let crypt = library.room(RoomId(1)).materials;
        assert_eq!(cellar.floor, crypt.floor);
        assert_eq!(crypt.wall, crypt.ceiling);
        assert!(catalog.try_get_mixed_id(cellar.wall, crypt.wall).is_some());
    }

    #[test]
    fn test_unknown_reference_is_reported() {
        let text = MANIFEST.replace(r#"["chair", "table"]"#, r#"["stool"]"#);
        match AssetLibrary::from_ron(&text) {
            Err(AssetError::UnknownObject { owner, name }) => {
                assert_eq!(owner, "table");
                assert_eq!(name, "stool");
            }
            other => panic!("unexpected {:?}", other.err()),
        }
    }

    #[test]
    fn test_bad_condition_is_fatal() {
        let text = MANIFEST.replace("!back0 & !forward0", "!back0 & !up0");
        match AssetLibrary::from_ron(&text) {
            Err(AssetError::Condition { object, source }) => {
                assert_eq!(object, "table");
                assert!(matches!(source, ConditionError::UnknownDirection { .. }));
            }
            other => panic!("unexpected {:?}", other.err()),
        }
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        let dup = MANIFEST.replace(r#"name: "chair""#, r#"name: "lamp""#);
        assert!(matches!(
            AssetLibrary::from_ron(&dup),
            Err(AssetError::DuplicateObject(_))
        ));

        let chance = MANIFEST.replace("chance_of_empty_cell: 0.5", "chance_of_empty_cell: 1.5");
        assert!(matches!(
            AssetLibrary::from_ron(&chance),
            Err(AssetError::Probability { .. })
        ));

        assert!(matches!(
            AssetLibrary::from_ron("(rooms: [])"),
            Err(AssetError::NoRooms)
        ));
        assert!(matches!(
            AssetLibrary::from_ron("(rooms: "),
            Err(AssetError::Parse(_))
        ));
    }

    #[test]
    fn test_height_band_frames() {
        let library = AssetLibrary::from_ron(MANIFEST).unwrap();
        let mut object = library.object(library.object_id("lamp").unwrap()).clone();

        // Ceiling band 0..0 in a room of height 4 only admits the top level.
        let admitted: Vec<i32> = (1..4).filter(|e| object.height_band_matches(*e, 4)).collect();
        assert_eq!(admitted, vec![3]);

        object.relative = HeightReference::Floor;
        let admitted: Vec<i32> = (1..4).filter(|e| object.height_band_matches(*e, 4)).collect();
        assert_eq!(admitted, vec![1]);

        object.relative = HeightReference::Middle;
        object.min_height = -1;
        let admitted: Vec<i32> = (1..6).filter(|e| object.height_band_matches(*e, 6)).collect();
        assert_eq!(admitted, vec![2, 3]);
    }
}
