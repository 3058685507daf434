//! Small Birmingham test world shared by resolver tests.

use geo::{coord, LineString, MultiPolygon, Point, Polygon};

use crate::index::PlaceStore;
use crate::models::{IndexedObject, OsmType, PlaceGeometry, PlaceId};

pub const QUERY_LAT: f64 = 52.5487429714954;
pub const QUERY_LON: f64 = -1.81602098644987;

pub const COUNTRY: PlaceId = PlaceId(0);
pub const STATE: PlaceId = PlaceId(1);
pub const COUNTY: PlaceId = PlaceId(2);
pub const CITY: PlaceId = PlaceId(3);
pub const SUBURB: PlaceId = PlaceId(4);
pub const STREET: PlaceId = PlaceId(5);
pub const SERVICE_ROAD: PlaceId = PlaceId(6);
pub const HOUSE: PlaceId = PlaceId(7);
pub const PUB: PlaceId = PlaceId(8);
pub const LIBRARY: PlaceId = PlaceId(9);
pub const FOOTPATH: PlaceId = PlaceId(10);

pub fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::new(vec![
            coord! { x: min_lon, y: min_lat },
            coord! { x: max_lon, y: min_lat },
            coord! { x: max_lon, y: max_lat },
            coord! { x: min_lon, y: max_lat },
            coord! { x: min_lon, y: min_lat },
        ]),
        vec![],
    )
}

fn boundary(
    id: PlaceId,
    osm_id: i64,
    name: &str,
    rank: u8,
    bounds: (f64, f64, f64, f64),
    parents: &[PlaceId],
) -> IndexedObject {
    let polygon = rect(bounds.0, bounds.1, bounds.2, bounds.3);
    let mut obj = IndexedObject::new(
        id,
        OsmType::Relation,
        osm_id,
        "boundary",
        "administrative",
        PlaceGeometry::Area(MultiPolygon::new(vec![polygon])),
    )
    .unwrap()
    .with_ranks(rank, rank);
    obj.add_name("", name);
    obj.parents = parents.to_vec();
    obj
}

fn street(
    id: PlaceId,
    osm_id: i64,
    name: &str,
    kind: &str,
    rank: u8,
    coords: &[(f64, f64)],
) -> IndexedObject {
    let line = LineString::from(coords.to_vec());
    let mut obj = IndexedObject::new(
        id,
        OsmType::Way,
        osm_id,
        "highway",
        kind,
        PlaceGeometry::Line(line),
    )
    .unwrap()
    .with_ranks(rank, rank);
    if !name.is_empty() {
        obj.add_name("", name);
    }
    obj.parents = vec![SUBURB, CITY, COUNTY, STATE, COUNTRY];
    obj
}

/// Country → state → county → city → suburb, two streets, a house, a pub,
/// a library polygon and an unranked footpath.
pub fn birmingham_objects() -> Vec<IndexedObject> {
    let admin_parents = [SUBURB, CITY, COUNTY, STATE, COUNTRY];

    let mut country = boundary(COUNTRY, 62149, "United Kingdom", 4, (-8.0, 49.0, 2.0, 61.0), &[]);
    country.add_name("de", "Vereinigtes Königreich");
    country.add_name("fr", "Royaume-Uni");
    country.country_code = Some("gb".to_string());

    let state = boundary(STATE, 58447, "England", 8, (-6.0, 50.0, 2.0, 56.0), &[COUNTRY]);
    let county = boundary(
        COUNTY,
        88084,
        "West Midlands",
        12,
        (-2.2, 52.3, -1.4, 52.7),
        &[STATE, COUNTRY],
    );
    let city = boundary(
        CITY,
        162378,
        "City of Birmingham",
        16,
        (-2.05, 52.38, -1.7, 52.61),
        &[COUNTY, STATE, COUNTRY],
    );
    let suburb = boundary(
        SUBURB,
        5_000_001,
        "Wylde Green",
        20,
        (-1.83, 52.54, -1.80, 52.56),
        &[CITY, COUNTY, STATE, COUNTRY],
    );

    let pilkington = street(
        STREET,
        90394480,
        "Pilkington Avenue",
        "residential",
        26,
        &[(-1.8175, 52.5488), (-1.8145, 52.5488)],
    );
    let service = street(
        SERVICE_ROAD,
        90394481,
        "Back Lane",
        "service",
        27,
        &[(-1.8175, 52.5470), (-1.8145, 52.5470)],
    );

    let mut house = IndexedObject::new(
        HOUSE,
        OsmType::Node,
        1_000_135,
        "place",
        "house",
        PlaceGeometry::Point(Point::new(-1.8160, 52.54874)),
    )
    .unwrap()
    .with_ranks(30, 30);
    house
        .address
        .insert("housenumber".to_string(), "135".to_string());
    house
        .address
        .insert("street".to_string(), "Pilkington Avenue".to_string());
    house
        .address
        .insert("postcode".to_string(), "B72 1LH".to_string());
    house.parents = std::iter::once(STREET).chain(admin_parents).collect();

    let mut plough = IndexedObject::new(
        PUB,
        OsmType::Node,
        2_000_001,
        "amenity",
        "pub",
        PlaceGeometry::Point(Point::new(-1.8155, 52.5490)),
    )
    .unwrap()
    .with_ranks(30, 30);
    plough.add_name("", "The Plough");
    plough.add_name("de", "Der Pflug");
    plough
        .extra_tags
        .insert("website".to_string(), "https://plough.example".to_string());
    plough.parents = std::iter::once(STREET).chain(admin_parents).collect();

    let library_outline = Polygon::new(
        LineString::from(vec![
            (-1.8170, 52.5476),
            (-1.8166, 52.54761),
            (-1.8162, 52.5476),
            (-1.8162, 52.5480),
            (-1.81661, 52.54802),
            (-1.8170, 52.5480),
            (-1.8170, 52.5476),
        ]),
        vec![],
    );
    let mut library = IndexedObject::new(
        LIBRARY,
        OsmType::Way,
        3_000_001,
        "amenity",
        "library",
        PlaceGeometry::Area(MultiPolygon::new(vec![library_outline])),
    )
    .unwrap()
    .with_ranks(30, 30);
    library.add_name("", "Wylde Green Library");
    library.parents = std::iter::once(SERVICE_ROAD).chain(admin_parents).collect();

    // Not eligible: unnamed path with no rank assignment
    let footpath = street(
        FOOTPATH,
        90394499,
        "",
        "footway",
        0,
        &[(-1.81603, 52.54870), (-1.81601, 52.54878)],
    );

    vec![
        country, state, county, city, suburb, pilkington, service, house, plough, library,
        footpath,
    ]
}

pub fn birmingham_store() -> PlaceStore {
    PlaceStore::new(birmingham_objects()).unwrap()
}
