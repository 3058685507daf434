//! Parent assignment: which areas and street each object belongs to.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::info;

use revgeo::index::{PlaceStore, SpatialIndex};
use revgeo::models::rank::{RANK_BUILDING, RANK_MINOR_STREET, RANK_STREET};
use revgeo::models::{IndexedObject, PlaceId};

/// Candidates examined when looking for a building's street.
const STREET_CANDIDATES: usize = 256;

/// Highest rank an area may have to be used as an address parent.
const MAX_AREA_RANK: u8 = 25;

/// Fill in `parents` for every object.
///
/// Parents are the address areas containing the object's centroid, most
/// specific first. Building-level objects also get their street, preferring
/// one named like their `addr:street` tag over a merely closer one.
pub fn assign_parents(
    objects: Vec<IndexedObject>,
    street_radius_deg: f64,
) -> Result<Vec<IndexedObject>> {
    let store = PlaceStore::new(objects)?;
    let index = SpatialIndex::build(&store);

    info!("Assigning parents to {} objects...", store.len());
    let pb = ProgressBar::new(store.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let all: Vec<&Arc<IndexedObject>> = store.iter().collect();
    let parents: Vec<Vec<PlaceId>> = all
        .par_iter()
        .map(|obj| {
            let parents = find_parents(&index, obj, street_radius_deg);
            pb.inc(1);
            parents
        })
        .collect();
    pb.finish_with_message("Parents assigned");

    drop(index);
    let mut objects = store.into_objects();
    for (obj, parents) in objects.iter_mut().zip(parents) {
        obj.parents = parents;
    }

    let orphans = objects
        .iter()
        .filter(|o| o.parents.is_empty() && o.rank_address > 4)
        .count();
    info!("{} objects without any parent", orphans);

    Ok(objects)
}

fn find_parents(
    index: &SpatialIndex,
    obj: &IndexedObject,
    street_radius_deg: f64,
) -> Vec<PlaceId> {
    let mut areas: Vec<&Arc<IndexedObject>> = index
        .containing(obj.centroid.lon, obj.centroid.lat)
        .into_iter()
        .filter(|p| {
            p.id != obj.id
                && p.rank_address > 0
                && p.rank_address <= MAX_AREA_RANK
                && p.rank_address < obj.rank_address
        })
        .collect();
    areas.sort_by(|a, b| b.rank_address.cmp(&a.rank_address).then(a.id.cmp(&b.id)));

    let street = (obj.rank_address == RANK_BUILDING)
        .then(|| nearest_street(index, obj, street_radius_deg))
        .flatten();

    street
        .into_iter()
        .chain(areas.into_iter().map(|a| a.id))
        .collect()
}

fn nearest_street(index: &SpatialIndex, obj: &IndexedObject, radius: f64) -> Option<PlaceId> {
    let streets: Vec<&Arc<IndexedObject>> = index
        .nearest(obj.centroid.lon, obj.centroid.lat, STREET_CANDIDATES, radius)
        .ok()?
        .map(|c| c.object)
        .filter(|o| {
            o.category == "highway" && (RANK_STREET..=RANK_MINOR_STREET).contains(&o.rank_address)
        })
        .collect();

    let wanted = obj.address.get("street").map(String::as_str);
    streets
        .iter()
        .find(|s| wanted.is_some() && s.default_name() == wanted)
        .or_else(|| streets.first())
        .map(|s| s.id)
}
