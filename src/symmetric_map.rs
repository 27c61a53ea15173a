use fnv::FnvHashMap;
use std::hash::Hash;

/// A map keyed by unordered pairs. Lookups also report whether the pair was given in the reverse of
/// its stored (ascending) order.
#[derive(Clone, Debug)]
pub struct SymmetricMap<K, T> {
    map: FnvHashMap<(K, K), T>,
}

impl<K, T> Default for SymmetricMap<K, T> {
    fn default() -> Self {
        SymmetricMap {
            map: FnvHashMap::default(),
        }
    }
}

impl<K: Copy + Ord + Hash, T> SymmetricMap<K, T> {
    pub fn new() -> Self {
        SymmetricMap::default()
    }

    fn order_keys(k1: K, k2: K) -> ((K, K), bool) {
        if k1 > k2 {
            ((k2, k1), true)
        } else {
            ((k1, k2), false)
        }
    }

    pub fn get(&self, k1: K, k2: K) -> Option<(&T, bool)> {
        let (key, reversed) = Self::order_keys(k1, k2);

        self.map.get(&key).map(|v| (v, reversed))
    }

    pub fn insert(&mut self, k1: K, k2: K, value: T) {
        self.map.insert(Self::order_keys(k1, k2).0, value);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_symmetric() {
        let mut map = SymmetricMap::new();
        map.insert(7u16, 3u16, "seam");

        assert_eq!(map.get(3, 7), Some((&"seam", false)));
        assert_eq!(map.get(7, 3), Some((&"seam", true)));
        assert_eq!(map.get(3, 3), None);
        assert_eq!(map.len(), 1);
    }
}
