//! Spatial index for nearest-object and containing-area lookups.

use geo::{Contains, Distance, Euclidean, Point};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::PlaceStore;
use crate::error::{ReverseError, Result};
use crate::models::{IndexedObject, PlaceGeometry};

/// Wrapper for R-tree indexing of place objects
#[derive(Clone)]
pub struct IndexedPlace {
    pub object: Arc<IndexedObject>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPlace {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for IndexedPlace {
    /// Squared planar distance (degrees) to the nearest point of the geometry, 0 inside areas.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d = planar_distance(&self.object.geometry, &Point::new(point[0], point[1]));
        d * d
    }
}

impl IndexedPlace {
    pub fn new(object: Arc<IndexedObject>) -> Self {
        let (min, max) = object.bbox.corners();
        Self {
            object,
            envelope: AABB::from_corners(min, max),
        }
    }
}

/// Distance in degrees from `point` to the closest point of `geometry`.
///
/// Measured in raw WGS84 degrees: longitude is not scaled by latitude.
pub fn planar_distance(geometry: &PlaceGeometry, point: &Point<f64>) -> f64 {
    match geometry {
        PlaceGeometry::Point(p) => Euclidean.distance(*p, *point),
        PlaceGeometry::Line(line) => Euclidean.distance(point, line),
        PlaceGeometry::Area(area) => {
            if area.contains(point) {
                0.0
            } else {
                Euclidean.distance(point, area)
            }
        }
    }
}

/// A nearest-search hit.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub object: &'a Arc<IndexedObject>,
    /// Distance in degrees
    pub distance: f64,
}

/// Immutable R-tree over every indexed object's geometry.
pub struct SpatialIndex {
    tree: RTree<IndexedPlace>,
}

impl SpatialIndex {
    /// Build spatial index from all objects of a store
    pub fn build(store: &PlaceStore) -> Self {
        info!("Building spatial index for {} objects...", store.len());

        let indexed: Vec<IndexedPlace> = store
            .iter()
            .map(|obj| IndexedPlace::new(Arc::clone(obj)))
            .collect();

        let mut by_rank: BTreeMap<u8, usize> = BTreeMap::new();
        for ip in &indexed {
            *by_rank.entry(ip.object.rank_address).or_default() += 1;
        }

        let tree = RTree::bulk_load(indexed);

        info!("Spatial index built with {} entries", tree.size());
        for (rank, count) in &by_rank {
            debug!("  rank_address {}: {} objects", rank, count);
        }

        Self { tree }
    }

    /// Objects in ascending distance from (`lon`, `lat`).
    ///
    /// The sequence is lazy and stops after `max_candidates` objects or at the
    /// first object farther than `max_radius` degrees. Fails with
    /// [`ReverseError::NoCoverage`] when nothing lies within the radius.
    pub fn nearest(
        &self,
        lon: f64,
        lat: f64,
        max_candidates: usize,
        max_radius: f64,
    ) -> Result<impl Iterator<Item = Candidate<'_>> + '_> {
        let mut candidates = self
            .tree
            .nearest_neighbor_iter_with_distance_2(&[lon, lat])
            .take(max_candidates)
            .map(|(ip, d2)| Candidate {
                object: &ip.object,
                distance: d2.sqrt(),
            })
            .take_while(move |c| c.distance <= max_radius)
            .peekable();

        if candidates.peek().is_none() {
            return Err(ReverseError::NoCoverage);
        }
        Ok(candidates)
    }

    /// All area objects whose polygon contains the point.
    pub fn containing(&self, lon: f64, lat: f64) -> Vec<&Arc<IndexedObject>> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        // Use R-tree to get candidates via envelope intersection, then filter with exact containment
        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ip| match &ip.object.geometry {
                PlaceGeometry::Area(area) => area.contains(&point),
                _ => false,
            })
            .map(|ip| &ip.object)
            .collect()
    }

    /// Get total number of indexed objects
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
