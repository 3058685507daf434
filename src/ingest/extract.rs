//! Classification of OSM objects into indexed places.

use geo::Point;
use osmpbfreader::{OsmObj, Tags};

use revgeo::models::rank::{highway_ranks, place_ranks, POI_KEYS, RANK_BUILDING, RANK_COUNTRY};
use revgeo::models::{AdminLevel, IndexedObject, OsmType, PlaceGeometry, PlaceId, Ranks};

use crate::geometry::GeometryResolver;

/// Tags copied verbatim into `extra_tags`.
const EXTRA_TAG_KEYS: &[&str] = &[
    "website",
    "contact:website",
    "phone",
    "contact:phone",
    "opening_hours",
    "wikipedia",
    "population",
    "capital",
    "wheelchair",
    "cuisine",
    "operator",
    "ele",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: String,
    pub place_type: String,
    pub ranks: Ranks,
}

impl Classification {
    fn new(category: &str, place_type: &str, ranks: Ranks) -> Self {
        Self {
            category: category.to_string(),
            place_type: place_type.to_string(),
            ranks,
        }
    }
}

/// Main tag and ranks of an object, or `None` when it has no place in the index.
pub fn classify(tags: &Tags) -> Option<Classification> {
    let building = Ranks {
        search: RANK_BUILDING,
        address: RANK_BUILDING,
    };

    if tags.contains("boundary", "administrative") {
        let level = tags
            .get("admin_level")
            .and_then(|l| l.parse::<u8>().ok())
            .and_then(AdminLevel::from_osm_level)?;
        // Countries without an ISO code are disputed or historic areas
        if level == AdminLevel::Country && !has_iso_code(tags) {
            return None;
        }
        let rank = level.rank_address();
        return Some(Classification::new(
            "boundary",
            "administrative",
            Ranks {
                search: rank,
                address: rank,
            },
        ));
    }

    if let Some(value) = tags.get("place") {
        return Some(Classification::new("place", value, place_ranks(value)));
    }

    if let Some(value) = tags.get("highway") {
        let ranks = highway_ranks(value, tags.contains_key("name"))?;
        return Some(Classification::new("highway", value, ranks));
    }

    if let Some((key, value)) = POI_KEYS
        .iter()
        .find_map(|key| tags.get(*key).map(|v| (*key, v)))
    {
        return Some(Classification::new(key, value, building));
    }

    if tags.contains_key("addr:housenumber") {
        return Some(Classification::new("place", "house", building));
    }

    None
}

fn has_iso_code(tags: &Tags) -> bool {
    tags.contains_key("ISO3166-1")
        || tags.contains_key("ISO3166-1:alpha2")
        || tags.contains_key("ISO3166-1:alpha3")
}

/// Whether a closed way describes an area rather than a loop of road.
pub fn is_area_way(tags: &Tags) -> bool {
    if tags.contains("area", "no") {
        return false;
    }
    !tags.contains_key("highway") || tags.contains("area", "yes")
}

/// Build the indexed object for an OSM object, with a placeholder id.
///
/// Nameless objects without address tags are skipped.
pub fn extract_object(obj: &OsmObj, resolver: &GeometryResolver) -> Option<IndexedObject> {
    let tags = obj.tags();
    let class = classify(tags)?;

    let (osm_type, osm_id, geometry) = match obj {
        OsmObj::Node(node) => (
            OsmType::Node,
            node.id.0,
            PlaceGeometry::Point(Point::new(node.lon(), node.lat())),
        ),
        OsmObj::Way(way) => {
            let closed = way.nodes.len() >= 4 && way.nodes.first() == way.nodes.last();
            let geometry = if closed && is_area_way(tags) {
                PlaceGeometry::Area(resolver.resolve_area(way.id)?.into())
            } else {
                PlaceGeometry::Line(resolver.resolve_line(way.id)?)
            };
            (OsmType::Way, way.id.0, geometry)
        }
        OsmObj::Relation(rel) => (
            OsmType::Relation,
            rel.id.0,
            PlaceGeometry::Area(resolver.resolve_relation(rel.id)?),
        ),
    };

    let mut object = IndexedObject::new(
        PlaceId(0),
        osm_type,
        osm_id,
        &class.category,
        &class.place_type,
        geometry,
    )?
    .with_ranks(class.ranks.search, class.ranks.address);

    apply_tags(&mut object, tags);
    if object.names.is_empty() && object.address.is_empty() {
        return None;
    }
    Some(object)
}

/// Copy names, address tags, wikidata id and extra tags onto `object`.
pub fn apply_tags(object: &mut IndexedObject, tags: &Tags) {
    for (key, value) in tags.iter() {
        let key = key.as_str();

        if key == "name" {
            object.add_name("", value);
        } else if let Some(lang) = key.strip_prefix("name:") {
            // Only plain language codes, not name:etymology and friends
            if (2..=10).contains(&lang.len())
                && lang
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                && !lang.contains("etymology")
            {
                object.add_name(&lang.to_ascii_lowercase(), value);
            }
        } else if let Some(part) = key.strip_prefix("addr:") {
            object.address.insert(part.to_string(), value.to_string());
        } else if key == "wikidata" {
            object.wikidata_id = Some(value.to_string());
        } else if EXTRA_TAG_KEYS.contains(&key) {
            object.extra_tags.insert(key.to_string(), value.to_string());
        }
    }

    if object.rank_address == RANK_COUNTRY {
        object.country_code = tags
            .get("ISO3166-1:alpha2")
            .or_else(|| tags.get("ISO3166-1"))
            .or_else(|| tags.get("country_code"))
            .map(|c| c.to_ascii_lowercase());
    }
}
