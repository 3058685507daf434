//! Indexed place objects as stored in the immutable snapshot.

use geo::{BoundingRect, Centroid, LineString, MultiPolygon, Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key used in `names` for the untranslated `name` tag.
pub const DEFAULT_NAME_KEY: &str = "default";

/// Type of OSM object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl std::fmt::Display for OsmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsmType::Node => write!(f, "node"),
            OsmType::Way => write!(f, "way"),
            OsmType::Relation => write!(f, "relation"),
        }
    }
}

/// Arena index of an object inside a [`crate::index::PlaceStore`].
///
/// Ids are assigned once at build time and are stable for the lifetime of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub u32);

impl PlaceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl From<Point<f64>> for GeoPoint {
    fn from(p: Point<f64>) -> Self {
        Self {
            lat: p.y(),
            lon: p.x(),
        }
    }
}

/// Bounding box in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBbox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBbox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn from_rect(rect: Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// Corners as `[[min_lon, min_lat], [max_lon, max_lat]]` for R-tree envelopes.
    pub fn corners(&self) -> ([f64; 2], [f64; 2]) {
        ([self.min_lon, self.min_lat], [self.max_lon, self.max_lat])
    }
}

/// Geometry of an indexed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates", rename_all = "lowercase")]
pub enum PlaceGeometry {
    Point(Point<f64>),
    Line(LineString<f64>),
    Area(MultiPolygon<f64>),
}

impl PlaceGeometry {
    pub fn bounding_box(&self) -> Option<GeoBbox> {
        let rect = match self {
            PlaceGeometry::Point(p) => Some(p.bounding_rect()),
            PlaceGeometry::Line(l) => l.bounding_rect(),
            PlaceGeometry::Area(a) => a.bounding_rect(),
        };
        rect.map(GeoBbox::from_rect)
    }

    pub fn centroid(&self) -> Option<GeoPoint> {
        let point = match self {
            PlaceGeometry::Point(p) => Some(*p),
            PlaceGeometry::Line(l) => l.centroid(),
            PlaceGeometry::Area(a) => a.centroid(),
        };
        point.map(GeoPoint::from)
    }
}

/// One real-world feature in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedObject {
    pub id: PlaceId,

    pub osm_type: OsmType,
    pub osm_id: i64,

    /// Main tag key, e.g. `highway`
    pub category: String,
    /// Main tag value, e.g. `residential`
    pub place_type: String,

    pub geometry: PlaceGeometry,
    pub bbox: GeoBbox,
    pub centroid: GeoPoint,

    /// Position in the address hierarchy (4 = country … 30 = building), 0 = not part of addresses
    pub rank_address: u8,
    /// Detail rank used for eligibility, 0 = never assigned
    pub rank_search: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_id: Option<String>,

    /// Multilingual names: {"default": "...", "de": "...", "fr": "..."}
    #[serde(default)]
    pub names: BTreeMap<String, String>,

    /// Address tags without the `addr:` prefix: {"housenumber": "135", "street": "..."}
    #[serde(default)]
    pub address: BTreeMap<String, String>,

    #[serde(default)]
    pub extra_tags: BTreeMap<String, String>,

    /// Objects this one lies within or belongs to (street, suburb, city, ...)
    #[serde(default)]
    pub parents: Vec<PlaceId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl IndexedObject {
    /// Create an object with its derived bbox/centroid and no names or parents.
    ///
    /// Returns `None` for empty geometries.
    pub fn new(
        id: PlaceId,
        osm_type: OsmType,
        osm_id: i64,
        category: &str,
        place_type: &str,
        geometry: PlaceGeometry,
    ) -> Option<Self> {
        let bbox = geometry.bounding_box()?;
        let centroid = geometry.centroid()?;
        Some(Self {
            id,
            osm_type,
            osm_id,
            category: category.to_string(),
            place_type: place_type.to_string(),
            geometry,
            bbox,
            centroid,
            rank_address: 0,
            rank_search: 0,
            importance: None,
            wikidata_id: None,
            names: BTreeMap::new(),
            address: BTreeMap::new(),
            extra_tags: BTreeMap::new(),
            parents: Vec::new(),
            country_code: None,
        })
    }

    pub fn with_ranks(mut self, rank_search: u8, rank_address: u8) -> Self {
        self.rank_search = rank_search;
        self.rank_address = rank_address;
        self
    }

    /// Add a name in a specific language
    pub fn add_name(&mut self, lang: &str, name: &str) {
        let lang = if lang.is_empty() { DEFAULT_NAME_KEY } else { lang };
        self.names.insert(lang.to_string(), name.to_string());
    }

    pub fn default_name(&self) -> Option<&str> {
        self.names.get(DEFAULT_NAME_KEY).map(String::as_str)
    }

    pub fn housenumber(&self) -> Option<&str> {
        self.address.get("housenumber").map(String::as_str)
    }

    /// `"{osm_type}/{osm_id}"`, e.g. `way/90394480`
    pub fn source_id(&self) -> String {
        format!("{}/{}", self.osm_type, self.osm_id)
    }

    /// Whether `category`/`place_type` matches a `class` or `class=type` pattern.
    pub fn matches_category(&self, pattern: &str) -> bool {
        match pattern.split_once('=') {
            Some((class, kind)) => self.category == class && (kind == "*" || self.place_type == kind),
            None => self.category == pattern,
        }
    }
}
