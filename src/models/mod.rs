//! Core data models for the reverse geocoder.

pub mod place;
pub mod rank;
pub mod result;

pub use place::{
    GeoBbox, GeoPoint, IndexedObject, OsmType, PlaceGeometry, PlaceId, DEFAULT_NAME_KEY,
};
pub use rank::{AdminLevel, Ranks};
pub use result::{AddressLine, GeometryFormat, GeometryOutput, PlaceResult};
