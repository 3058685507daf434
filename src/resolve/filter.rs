//! Suitability filter: which objects may be returned as the nearest match.
//!
//! The result is the closest *suitable* object, not the closest object overall.
//! A house number on a neighbouring street can therefore win over an unnamed
//! path right under the coordinate. This is an inherent approximation of the
//! data, not a defect.

use std::cmp::Ordering;

use crate::config::ResolverConfig;
use crate::index::Candidate;
use crate::models::IndexedObject;

/// Distances closer than this are treated as equal.
const DISTANCE_TIE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct SuitabilityFilter {
    min_candidate_rank: u8,
    excluded_categories: Vec<String>,
}

impl SuitabilityFilter {
    pub fn new(min_candidate_rank: u8, excluded_categories: Vec<String>) -> Self {
        Self {
            min_candidate_rank,
            excluded_categories,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(config.min_candidate_rank, config.excluded_categories.clone())
    }

    pub fn is_eligible(&self, object: &IndexedObject) -> bool {
        if object.rank_search == 0 || object.rank_address == 0 {
            return false;
        }
        if object.rank_search < self.min_candidate_rank {
            return false;
        }
        !self
            .excluded_categories
            .iter()
            .any(|pattern| object.matches_category(pattern))
    }

    /// Pick the nearest eligible candidate from an ascending-distance sequence.
    ///
    /// Among eligible candidates at the same distance the most specific one
    /// (highest `rank_address`) wins, then the smallest id. Consumption stops at
    /// the first candidate farther away than the winner.
    pub fn select<'a, I>(&self, candidates: I) -> Option<Candidate<'a>>
    where
        I: IntoIterator<Item = Candidate<'a>>,
    {
        let mut best: Option<Candidate<'a>> = None;

        for candidate in candidates {
            if let Some(current) = best {
                if candidate.distance > current.distance + DISTANCE_TIE_EPSILON {
                    break;
                }
            }
            if !self.is_eligible(candidate.object) {
                continue;
            }
            best = match best {
                Some(current) if prefer(&current, &candidate) != Ordering::Greater => Some(current),
                _ => Some(candidate),
            };
        }

        best
    }
}

/// `Less` when `a` should win over `b`.
fn prefer(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    b.object
        .rank_address
        .cmp(&a.object.rank_address)
        .then_with(|| a.object.id.cmp(&b.object.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, QUERY_LAT, QUERY_LON};
    use crate::index::SpatialIndex;
    use crate::models::{OsmType, PlaceGeometry, PlaceId};
    use geo::Point;
    use std::sync::Arc;

    fn filter() -> SuitabilityFilter {
        SuitabilityFilter::from_config(&ResolverConfig::default())
    }

    fn poi(id: u32, rank_address: u8) -> Arc<IndexedObject> {
        Arc::new(
            IndexedObject::new(
                PlaceId(id),
                OsmType::Node,
                i64::from(id),
                "amenity",
                "bench",
                PlaceGeometry::Point(Point::new(0.0, 0.0)),
            )
            .unwrap()
            .with_ranks(30, rank_address),
        )
    }

    #[test]
    fn test_unranked_and_excluded_objects_are_ineligible() {
        let store = fixtures::birmingham_store();
        let f = filter();

        assert!(!f.is_eligible(store.get(fixtures::FOOTPATH).unwrap()));
        assert!(!f.is_eligible(store.get(fixtures::CITY).unwrap()));
        assert!(f.is_eligible(store.get(fixtures::HOUSE).unwrap()));
        assert!(f.is_eligible(store.get(fixtures::STREET).unwrap()));
    }

    #[test]
    fn test_select_skips_closer_ineligible_objects() {
        let store = fixtures::birmingham_store();
        let index = SpatialIndex::build(&store);
        let f = filter();

        let candidates: Vec<Candidate<'_>> =
            index.nearest(QUERY_LON, QUERY_LAT, 64, 0.05).unwrap().collect();
        let position = |id: PlaceId| candidates.iter().position(|c| c.object.id == id);
        // The unnamed footpath lies right under the coordinate
        assert!(position(fixtures::FOOTPATH).unwrap() < position(fixtures::HOUSE).unwrap());

        let chosen = f.select(candidates.clone()).unwrap();
        assert_eq!(chosen.object.id, fixtures::HOUSE);
    }

    #[test]
    fn test_ties_prefer_specific_then_lower_id() {
        let a = poi(4, 26);
        let b = poi(3, 30);
        let c = poi(2, 30);
        let far = poi(1, 30);
        let candidates = vec![
            Candidate { object: &a, distance: 0.5 },
            Candidate { object: &b, distance: 0.5 },
            Candidate { object: &c, distance: 0.5 },
            Candidate { object: &far, distance: 0.6 },
        ];

        let chosen = filter().select(candidates).unwrap();
        assert_eq!(chosen.object.id, PlaceId(2));
    }

    #[test]
    fn test_select_empty() {
        assert!(filter().select(Vec::new()).is_none());
    }
}
