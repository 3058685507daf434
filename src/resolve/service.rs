//! Reverse geocoding service: coordinate in, resolved place out.

use geo::Point;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::address::assemble;
use super::filter::SuitabilityFilter;
use super::hierarchy::HierarchyResolver;
use super::locale::resolve_name;
use super::request::ReverseRequest;
use super::simplify::simplify;
use super::zoom::ZoomTable;
use crate::config::ResolverConfig;
use crate::error::{ReverseError, Result};
use crate::index::{planar_distance, PlaceStore, SpatialIndex};
use crate::models::rank::default_importance;
use crate::models::{GeometryFormat, GeometryOutput, IndexedObject, PlaceResult};

/// Resolves reverse queries against an immutable store.
///
/// Shared freely across threads; the only interior mutability is the
/// optional hierarchy chain cache.
pub struct ReverseGeocoder {
    store: PlaceStore,
    index: SpatialIndex,
    filter: SuitabilityFilter,
    hierarchy: HierarchyResolver,
    zoom: ZoomTable,
    max_candidates: usize,
    max_radius_deg: f64,
}

impl ReverseGeocoder {
    pub fn new(store: PlaceStore, config: &ResolverConfig) -> Result<Self> {
        config.validate()?;
        let index = SpatialIndex::build(&store);

        Ok(Self {
            store,
            index,
            filter: SuitabilityFilter::from_config(config),
            hierarchy: HierarchyResolver::new(config.max_chain_len, config.chain_cache_size),
            zoom: ZoomTable::new(&config.zoom_ranks)?,
            max_candidates: config.max_candidates,
            max_radius_deg: config.max_radius_deg,
        })
    }

    /// Load a snapshot written by the ingest pipeline and index it.
    pub fn from_snapshot<P: AsRef<Path>>(path: P, config: &ResolverConfig) -> Result<Self> {
        let (store, header) = PlaceStore::load(&path)?;
        info!(
            "Loaded snapshot {} ({} objects, built {} from {})",
            path.as_ref().display(),
            header.object_count,
            header.created_at,
            header.source_file
        );
        Self::new(store, config)
    }

    pub fn store(&self) -> &PlaceStore {
        &self.store
    }

    /// Resolve one query.
    pub fn resolve(&self, request: &ReverseRequest) -> Result<PlaceResult> {
        request.validate()?;

        let (matched, match_distance) = self.find_match(request.lon, request.lat)?;
        let chain = self.hierarchy.resolve(&self.store, matched);
        let entries = self.zoom.truncate(&chain, request.zoom);

        // Nothing in the chain is general enough for this zoom
        let object = entries
            .first()
            .and_then(|e| self.store.get(e.id))
            .ok_or(ReverseError::NoCoverage)?;

        let distance = if object.id == matched.id {
            match_distance
        } else {
            planar_distance(&object.geometry, &Point::new(request.lon, request.lat))
        };

        debug!(
            "reverse ({}, {}) zoom {}: matched {} ({}={}), result {} at rank {}, {} levels",
            request.lat,
            request.lon,
            request.zoom,
            matched.source_id(),
            matched.category,
            matched.place_type,
            object.source_id(),
            object.rank_address,
            entries.len()
        );

        let address = assemble(&self.store, &entries, &request.languages);
        let name = resolve_name(object, &request.languages);
        let display_name = if address.display_name.is_empty() {
            name.clone().unwrap_or_default()
        } else {
            address.display_name
        };

        Ok(PlaceResult {
            place_id: object.id,
            osm_type: object.osm_type,
            osm_id: object.osm_id,
            category: object.category.clone(),
            place_type: object.place_type.clone(),
            rank_address: object.rank_address,
            rank_search: object.rank_search,
            importance: object
                .importance
                .unwrap_or_else(|| default_importance(object.rank_search)),
            centroid: object.centroid,
            bbox: object.bbox,
            name,
            display_name,
            distance,
            address: request.address_details.then_some(address.lines),
            extra_tags: request.extra_tags.then(|| object.extra_tags.clone()),
            name_details: request.name_details.then(|| object.names.clone()),
            geometry: self.geometry_output(object, request),
            hierarchy_truncated: chain.is_truncated(),
        })
    }

    /// Nearest eligible object, or the tightest area containing the point.
    fn find_match(&self, lon: f64, lat: f64) -> Result<(&Arc<IndexedObject>, f64)> {
        let nearest = match self
            .index
            .nearest(lon, lat, self.max_candidates, self.max_radius_deg)
        {
            Ok(candidates) => self.filter.select(candidates),
            Err(ReverseError::NoCoverage) => None,
            Err(e) => return Err(e),
        };

        if let Some(candidate) = nearest {
            return Ok((candidate.object, candidate.distance));
        }

        let area = self
            .index
            .containing(lon, lat)
            .into_iter()
            .filter(|o| o.rank_address > 0)
            .max_by(|a, b| {
                a.rank_address
                    .cmp(&b.rank_address)
                    .then_with(|| b.id.cmp(&a.id))
            });

        match area {
            Some(area) => {
                debug!(
                    "no eligible object near ({}, {}), using area {}",
                    lat,
                    lon,
                    area.source_id()
                );
                Ok((area, 0.0))
            }
            None => Err(ReverseError::NoCoverage),
        }
    }

    fn geometry_output(
        &self,
        object: &IndexedObject,
        request: &ReverseRequest,
    ) -> Option<GeometryOutput> {
        if request.geometry_format == GeometryFormat::None {
            return None;
        }
        let tolerance = request.effective_tolerance();
        Some(GeometryOutput {
            format: request.geometry_format,
            tolerance,
            geometry: simplify(&object.geometry, tolerance),
        })
    }
}
