//! Resolved reverse-geocoding answer handed to the output layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::place::{GeoBbox, GeoPoint, OsmType, PlaceGeometry, PlaceId};

/// Geometry output encoding requested by the caller. At most one per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryFormat {
    #[default]
    None,
    GeoJson,
    Kml,
    Svg,
    /// WKT
    Text,
}

impl std::str::FromStr for GeometryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(GeometryFormat::None),
            "geojson" => Ok(GeometryFormat::GeoJson),
            "kml" => Ok(GeometryFormat::Kml),
            "svg" => Ok(GeometryFormat::Svg),
            "text" | "wkt" => Ok(GeometryFormat::Text),
            other => Err(format!("unknown geometry format '{}'", other)),
        }
    }
}

/// One entry of the address breakdown, most specific first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressLine {
    /// Source object; `None` for lines derived from address tags (house number, postcode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<PlaceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_type: Option<OsmType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub osm_id: Option<i64>,
    pub category: String,
    pub place_type: String,
    /// Address component key, e.g. `road`, `city`, `house_number`
    pub kind: String,
    pub name: String,
    pub rank_address: u8,
    /// Whether this line describes the matched object itself
    pub is_matched: bool,
}

/// Requested geometry, possibly simplified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryOutput {
    pub format: GeometryFormat,
    pub tolerance: f64,
    pub geometry: PlaceGeometry,
}

/// The resolved answer to a reverse query.
///
/// Carries every field the XML/JSON/GeoJSON/GeocodeJSON serializers reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceResult {
    pub place_id: PlaceId,
    pub osm_type: OsmType,
    pub osm_id: i64,
    pub category: String,
    pub place_type: String,
    pub rank_address: u8,
    pub rank_search: u8,
    /// Placeholder ranking (0.0 to 1.0) until importance data is loaded
    pub importance: f64,
    pub centroid: GeoPoint,
    pub bbox: GeoBbox,
    /// Localized name of the matched object, if it has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub display_name: String,
    /// Distance from the query coordinate in degrees (0 inside areas)
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<AddressLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_details: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryOutput>,
    /// Set when the address hierarchy had to be cut short
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hierarchy_truncated: bool,
}

impl PlaceResult {
    /// Look up an address component by key, e.g. `"road"`.
    pub fn address_component(&self, kind: &str) -> Option<&str> {
        self.address
            .as_ref()?
            .iter()
            .find(|line| line.kind == kind)
            .map(|line| line.name.as_str())
    }
}
