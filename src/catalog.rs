use crate::{
    direction::{Direction8, Orientation},
    symmetric_map::SymmetricMap,
    Cell, ContentId, EMPTY_CONTENT,
};

use fnv::FnvHashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("{0} base materials do not fit in the content id space")]
    TooManyMaterials(usize),
}

/// Maps material names to grid content ids.
///
/// Ids are laid out as: `EMPTY_CONTENT`, then one id per base material in registration order, then
/// one "mixed" id for every unordered pair of base materials. A mixed id stands for the seam where
/// two rooms' walls meet; which half is which is encoded by the cell orientation.
#[derive(Clone, Debug)]
pub struct ItemCatalog {
    names: Vec<String>,
    ids: FnvHashMap<String, ContentId>,
    base_count: usize,
    mixed: SymmetricMap<ContentId, ContentId>,
    components: FnvHashMap<ContentId, (ContentId, ContentId)>,
}

impl ItemCatalog {
    /// Duplicate names are registered once.
    pub fn new<S: AsRef<str>>(
        materials: impl IntoIterator<Item = S>,
    ) -> Result<Self, CatalogError> {
        let mut names = vec![String::from("empty")];
        let mut ids = FnvHashMap::default();
        for m in materials {
            let m = m.as_ref();
            if ids.contains_key(m) {
                continue;
            }
            ids.insert(m.to_owned(), names.len() as ContentId);
            names.push(m.to_owned());
        }

        let base_count = names.len() - 1;
        let total = 1 + base_count + base_count * base_count.saturating_sub(1) / 2;
        if total > ContentId::MAX as usize {
            return Err(CatalogError::TooManyMaterials(base_count));
        }

        let mut mixed = SymmetricMap::new();
        let mut components = FnvHashMap::default();
        for a in 1..=base_count as ContentId {
            for b in a + 1..=base_count as ContentId {
                let id = names.len() as ContentId;
                names.push(format!("{}+{}", names[a as usize], names[b as usize]));
                mixed.insert(a, b, id);
                components.insert(id, (a, b));
            }
        }
        debug_assert_eq!(mixed.len(), names.len() - 1 - base_count);

        Ok(ItemCatalog {
            names,
            ids,
            base_count,
            mixed,
            components,
        })
    }

    pub fn id(&self, name: &str) -> Option<ContentId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: ContentId) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    pub fn base_count(&self) -> usize {
        self.base_count
    }

    /// Total number of ids, including `EMPTY_CONTENT` and all mixed ids.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_base(&self, id: ContentId) -> bool {
        id != EMPTY_CONTENT && (id as usize) <= self.base_count
    }

    pub fn is_mixed(&self, id: ContentId) -> bool {
        self.components.contains_key(&id)
    }

    /// Returns the mixed id for two distinct base materials, and whether `(a, b)` was the reverse
    /// of the catalog's stored order. Identical, empty or already mixed ids miss.
    pub fn try_get_mixed_id(&self, a: ContentId, b: ContentId) -> Option<(ContentId, bool)> {
        if !self.is_base(a) || !self.is_base(b) {
            return None;
        }

        self.mixed.get(a, b).map(|(id, reversed)| (*id, reversed))
    }

    /// Recovers the base materials of a mixed id, in stored order.
    pub fn mixed_components(&self, mixed: ContentId) -> Option<(ContentId, ContentId)> {
        self.components.get(&mixed).copied()
    }

    /// The cell to write where a wall of `incoming` material is built against an `existing` one,
    /// with `towards` pointing from the builder's side into the seam. Falls back to a plain
    /// `incoming` cell when the two can't be mixed.
    pub fn seam(&self, existing: ContentId, incoming: ContentId, towards: Direction8) -> Cell {
        match self.try_get_mixed_id(existing, incoming) {
            Some((id, reversed)) => {
                let orientation = Orientation::facing(towards);
                let orientation = if reversed {
                    orientation.opposite()
                } else {
                    orientation
                };

                Cell::new(id, orientation)
            }
            None => Cell::new(incoming, Orientation::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(vec!["stone", "brick", "moss", "brick"]).unwrap()
    }

    #[test]
    fn test_base_ids_follow_registration_order() {
        let c = catalog();
        assert_eq!(c.base_count(), 3);
        assert_eq!(c.id("stone"), Some(1));
        assert_eq!(c.id("moss"), Some(3));
        assert_eq!(c.name(2), Some("brick"));
        // empty + 3 base + 3 pairs
        assert_eq!(c.len(), 7);
    }

    #[test]
    fn test_mixing_is_symmetric_with_reversed_flag() {
        let c = catalog();
        let (ab, ab_rev) = c.try_get_mixed_id(1, 3).unwrap();
        let (ba, ba_rev) = c.try_get_mixed_id(3, 1).unwrap();

        assert_eq!(ab, ba);
        assert_ne!(ab_rev, ba_rev);
        assert!(c.is_mixed(ab));
        assert_eq!(c.mixed_components(ab), Some((1, 3)));
        assert_eq!(c.name(ab), Some("stone+moss"));
    }

    #[test]
    fn test_identical_empty_and_mixed_ids_miss() {
        let c = catalog();
        let (mixed, _) = c.try_get_mixed_id(1, 2).unwrap();

        assert_eq!(c.try_get_mixed_id(2, 2), None);
        assert_eq!(c.try_get_mixed_id(EMPTY_CONTENT, 2), None);
        assert_eq!(c.try_get_mixed_id(mixed, 3), None);
    }

    #[test]
    fn test_seam_orientation_flips_with_lookup_order() {
        let c = catalog();
        let forward = c.seam(1, 2, Direction8::Right);
        let backward = c.seam(2, 1, Direction8::Right);

        assert_eq!(forward.content, backward.content);
        assert_eq!(forward.orientation, Orientation::Deg270);
        assert_eq!(backward.orientation, Orientation::Deg90);
        assert_eq!(c.seam(2, 2, Direction8::Right), Cell::new(2, Orientation::Deg0));
    }
}
