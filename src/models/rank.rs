//! Address and search rank tables.
//!
//! Ranks place every object on one scale from 2 (continent) to 30 (building).
//! A lower rank is a broader region. `rank_address == 0` means the object never
//! appears in an address.

use serde::{Deserialize, Serialize};

pub const RANK_COUNTRY: u8 = 4;
pub const RANK_STREET: u8 = 26;
pub const RANK_MINOR_STREET: u8 = 27;
pub const RANK_BUILDING: u8 = 30;

/// OSM admin_level mapping to semantic level names.
/// See: https://wiki.openstreetmap.org/wiki/Tag:boundary%3Dadministrative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AdminLevel {
    /// Country (admin_level=2)
    Country,
    /// Macro region / federal district (admin_level=3)
    MacroRegion,
    /// Region / state / province (admin_level=4)
    Region,
    /// Macro county (admin_level=5)
    MacroCounty,
    /// County / district (admin_level=6)
    County,
    /// Local admin / municipality (admin_level=7)
    LocalAdmin,
    /// Locality / city / town / village (admin_level=8)
    Locality,
    /// Borough / city district (admin_level=9)
    Borough,
    /// Suburb (admin_level=10)
    Suburb,
    /// Neighbourhood (admin_level=11)
    Neighbourhood,
}

impl AdminLevel {
    /// Convert OSM admin_level number to AdminLevel
    pub fn from_osm_level(level: u8) -> Option<Self> {
        match level {
            2 => Some(AdminLevel::Country),
            3 => Some(AdminLevel::MacroRegion),
            4 => Some(AdminLevel::Region),
            5 => Some(AdminLevel::MacroCounty),
            6 => Some(AdminLevel::County),
            7 => Some(AdminLevel::LocalAdmin),
            8 => Some(AdminLevel::Locality),
            9 => Some(AdminLevel::Borough),
            10 => Some(AdminLevel::Suburb),
            11 => Some(AdminLevel::Neighbourhood),
            _ => None,
        }
    }

    /// Get the OSM admin_level number
    pub fn to_osm_level(&self) -> u8 {
        match self {
            AdminLevel::Country => 2,
            AdminLevel::MacroRegion => 3,
            AdminLevel::Region => 4,
            AdminLevel::MacroCounty => 5,
            AdminLevel::County => 6,
            AdminLevel::LocalAdmin => 7,
            AdminLevel::Locality => 8,
            AdminLevel::Borough => 9,
            AdminLevel::Suburb => 10,
            AdminLevel::Neighbourhood => 11,
        }
    }

    /// Address rank of a boundary at this level (twice the admin_level, 22 for level 11)
    pub fn rank_address(&self) -> u8 {
        match self {
            AdminLevel::Neighbourhood => 22,
            other => other.to_osm_level() * 2,
        }
    }
}

/// Search and address rank for a tagged object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranks {
    pub search: u8,
    pub address: u8,
}

impl Ranks {
    fn same(rank: u8) -> Self {
        Self {
            search: rank,
            address: rank,
        }
    }
}

/// Ranks for a `place=*` value.
pub fn place_ranks(value: &str) -> Ranks {
    match value {
        "continent" | "ocean" | "sea" => Ranks::same(2),
        "country" => Ranks::same(4),
        "state" | "province" => Ranks::same(8),
        "region" => Ranks::same(10),
        "county" => Ranks::same(12),
        "city" => Ranks::same(16),
        "town" => Ranks {
            search: 18,
            address: 16,
        },
        "borough" => Ranks::same(18),
        "village" => Ranks {
            search: 19,
            address: 16,
        },
        "hamlet" | "suburb" => Ranks::same(20),
        "quarter" | "neighbourhood" | "isolated_dwelling" | "farm" => Ranks::same(22),
        "locality" => Ranks {
            search: 25,
            address: 0,
        },
        "house" => Ranks::same(RANK_BUILDING),
        _ => Ranks::same(25),
    }
}

/// Ranks for a `highway=*` value; unnamed minor ways get no rank.
pub fn highway_ranks(value: &str, named: bool) -> Option<Ranks> {
    match value {
        "motorway" | "trunk" | "primary" | "secondary" | "tertiary" | "residential"
        | "unclassified" | "living_street" | "pedestrian" | "road" => {
            Some(Ranks::same(RANK_STREET))
        }
        "service" | "track" | "path" | "footway" | "cycleway" | "bridleway" | "steps"
            if named =>
        {
            Some(Ranks::same(RANK_MINOR_STREET))
        }
        _ => None,
    }
}

/// Keys whose presence makes an object a building-level feature.
pub const POI_KEYS: &[&str] = &[
    "amenity", "shop", "tourism", "leisure", "office", "building", "historic", "craft",
];

/// Address component key for an object at `rank_address`.
///
/// `place=*` objects use their own type instead (see [`address_kind`]).
pub fn address_kind_for_rank(rank_address: u8) -> Option<&'static str> {
    match rank_address {
        4 => Some("country"),
        5..=9 => Some("state"),
        10..=11 => Some("state_district"),
        12..=13 => Some("county"),
        14..=16 => Some("city"),
        17..=19 => Some("town"),
        20..=21 => Some("suburb"),
        22..=25 => Some("neighbourhood"),
        26..=27 => Some("road"),
        _ => None,
    }
}

/// Address component key for an object, falling back to its own type for building-level objects.
pub fn address_kind<'a>(category: &str, place_type: &'a str, rank_address: u8) -> &'a str {
    const PLACE_KINDS: &[&str] = &[
        "country", "state", "region", "county", "city", "town", "village", "hamlet", "suburb",
        "borough", "quarter", "neighbourhood", "isolated_dwelling", "farm", "city_block",
    ];
    if category == "place" && PLACE_KINDS.contains(&place_type) {
        return place_type;
    }
    address_kind_for_rank(rank_address).unwrap_or(place_type)
}

/// Importance used when no Wikimedia importance is known, falling with detail.
pub fn default_importance(rank_search: u8) -> f64 {
    (0.75 - f64::from(rank_search) / 40.0).max(0.0)
}
