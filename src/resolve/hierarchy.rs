//! Address hierarchy resolution: climb from the matched object to its country.

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

use crate::error::ReverseError;
use crate::index::PlaceStore;
use crate::models::{IndexedObject, PlaceId};

/// Single level of the hierarchy chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    pub id: PlaceId,
    pub rank_address: u8,
}

impl ChainEntry {
    fn of(object: &IndexedObject) -> Self {
        Self {
            id: object.id,
            rank_address: object.rank_address,
        }
    }
}

/// Containing objects from most specific (the matched object) to least specific.
///
/// `rank_address` is strictly decreasing along the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminHierarchyChain {
    entries: Vec<ChainEntry>,
    truncated: bool,
}

impl AdminHierarchyChain {
    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether climbing stopped at the length limit instead of at the top of the hierarchy.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn ids(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.entries.iter().map(|e| e.id)
    }
}

/// Build the chain for `start`.
///
/// At each step the next level is the parent with the highest `rank_address`
/// still below the current one, taken from the parents of every level visited
/// so far. Levels absent from the data are skipped, never synthesized. When the
/// walk exceeds `max_chain_len` or revisits an object it stops and the partial
/// chain is returned marked as truncated.
pub fn build_chain(
    store: &PlaceStore,
    start: &IndexedObject,
    max_chain_len: usize,
) -> AdminHierarchyChain {
    match climb(store, start, max_chain_len) {
        Ok(entries) => AdminHierarchyChain {
            entries,
            truncated: false,
        },
        Err((entries, err)) => {
            warn!("{}; keeping {} levels", err, entries.len());
            AdminHierarchyChain {
                entries,
                truncated: true,
            }
        }
    }
}

fn climb(
    store: &PlaceStore,
    start: &IndexedObject,
    max_chain_len: usize,
) -> Result<Vec<ChainEntry>, (Vec<ChainEntry>, ReverseError)> {
    let mut entries = vec![ChainEntry::of(start)];
    let mut visited: HashSet<PlaceId> = HashSet::new();
    visited.insert(start.id);

    let mut pool: Vec<PlaceId> = start.parents.clone();
    let mut current_rank = start.rank_address;

    loop {
        let next = pool
            .iter()
            .filter_map(|id| store.get(*id))
            .filter(|p| p.rank_address > 0 && p.rank_address < current_rank)
            .max_by(|a, b| {
                a.rank_address
                    .cmp(&b.rank_address)
                    .then_with(|| b.id.cmp(&a.id))
            });

        let Some(next) = next else {
            return Ok(entries);
        };

        if entries.len() >= max_chain_len || !visited.insert(next.id) {
            let depth = entries.len();
            return Err((
                entries,
                ReverseError::HierarchyCycle {
                    place: start.id,
                    depth,
                },
            ));
        }

        entries.push(ChainEntry::of(next));
        current_rank = next.rank_address;
        pool.extend(next.parents.iter().copied());
    }
}

/// Bounded read-through cache of chains keyed by matched object.
///
/// Evicts in insertion order once full. Purely an optimization: a miss
/// recomputes the same chain.
pub struct ChainCache {
    inner: Mutex<CacheState>,
}

struct CacheState {
    capacity: usize,
    chains: HashMap<PlaceId, Arc<AdminHierarchyChain>>,
    order: VecDeque<PlaceId>,
}

impl ChainCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheState {
                capacity,
                chains: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn get(&self, id: PlaceId) -> Option<Arc<AdminHierarchyChain>> {
        self.inner.lock().chains.get(&id).cloned()
    }

    pub fn insert(&self, id: PlaceId, chain: Arc<AdminHierarchyChain>) {
        let mut state = self.inner.lock();
        if state.capacity == 0 || state.chains.contains_key(&id) {
            return;
        }
        while state.chains.len() >= state.capacity {
            match state.order.pop_front() {
                Some(oldest) => {
                    state.chains.remove(&oldest);
                }
                None => break,
            }
        }
        state.order.push_back(id);
        state.chains.insert(id, chain);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Chain builder with its configured length limit and optional cache.
pub struct HierarchyResolver {
    max_chain_len: usize,
    cache: Option<ChainCache>,
}

impl HierarchyResolver {
    pub fn new(max_chain_len: usize, cache_size: usize) -> Self {
        Self {
            max_chain_len,
            cache: (cache_size > 0).then(|| ChainCache::new(cache_size)),
        }
    }

    pub fn resolve(&self, store: &PlaceStore, start: &IndexedObject) -> Arc<AdminHierarchyChain> {
        if let Some(chain) = self.cache.as_ref().and_then(|c| c.get(start.id)) {
            return chain;
        }

        let chain = Arc::new(build_chain(store, start, self.max_chain_len));
        if let Some(cache) = &self.cache {
            cache.insert(start.id, Arc::clone(&chain));
        }
        chain
    }

    pub fn cache(&self) -> Option<&ChainCache> {
        self.cache.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, CITY, COUNTRY, COUNTY, HOUSE, STATE, STREET, SUBURB};

    #[test]
    fn test_chain_climbs_to_country() {
        let store = fixtures::birmingham_store();
        let house = store.get(HOUSE).unwrap();

        let chain = build_chain(&store, house, 32);
        let ids: Vec<PlaceId> = chain.ids().collect();
        assert_eq!(ids, vec![HOUSE, STREET, SUBURB, CITY, COUNTY, STATE, COUNTRY]);
        assert!(!chain.is_truncated());
        assert!(chain
            .entries()
            .windows(2)
            .all(|w| w[0].rank_address > w[1].rank_address));
    }

    #[test]
    fn test_missing_levels_are_skipped() {
        let mut objects = fixtures::birmingham_objects();
        // The street no longer knows about the suburb, the house only knows its street
        objects[STREET.index()].parents = vec![CITY, COUNTRY];
        objects[HOUSE.index()].parents = vec![STREET];
        let store = PlaceStore::new(objects).unwrap();

        let chain = build_chain(&store, store.get(HOUSE).unwrap(), 32);
        let ids: Vec<PlaceId> = chain.ids().collect();
        assert_eq!(ids, vec![HOUSE, STREET, CITY, COUNTY, STATE, COUNTRY]);
    }

    #[test]
    fn test_parents_of_equal_or_higher_rank_are_ignored() {
        let mut objects = fixtures::birmingham_objects();
        objects[COUNTRY.index()].parents = vec![HOUSE, STATE];
        let store = PlaceStore::new(objects).unwrap();

        let chain = build_chain(&store, store.get(HOUSE).unwrap(), 32);
        assert_eq!(chain.ids().last(), Some(COUNTRY));
        assert!(!chain.is_truncated());
    }

    #[test]
    fn test_length_limit_truncates() {
        let store = fixtures::birmingham_store();
        let chain = build_chain(&store, store.get(HOUSE).unwrap(), 3);

        assert!(chain.is_truncated());
        let ids: Vec<PlaceId> = chain.ids().collect();
        assert_eq!(ids, vec![HOUSE, STREET, SUBURB]);
    }

    #[test]
    fn test_country_has_single_entry_chain() {
        let store = fixtures::birmingham_store();
        let chain = build_chain(&store, store.get(COUNTRY).unwrap(), 32);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_cache_is_bounded() {
        let store = fixtures::birmingham_store();
        let resolver = HierarchyResolver::new(32, 2);

        let first = resolver.resolve(&store, store.get(HOUSE).unwrap());
        let again = resolver.resolve(&store, store.get(HOUSE).unwrap());
        assert!(Arc::ptr_eq(&first, &again));

        resolver.resolve(&store, store.get(STREET).unwrap());
        resolver.resolve(&store, store.get(SUBURB).unwrap());
        let cache = resolver.cache().unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get(HOUSE).is_none());
        assert!(cache.get(SUBURB).is_some());
    }

    #[test]
    fn test_disabled_cache() {
        let store = fixtures::birmingham_store();
        let resolver = HierarchyResolver::new(32, 0);
        let chain = resolver.resolve(&store, store.get(HOUSE).unwrap());
        assert_eq!(chain.len(), 7);
        assert!(resolver.cache().is_none());
    }
}
