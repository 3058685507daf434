//! Revgeo - reverse geocoding over an OpenStreetMap snapshot
//!
//! This library provides the shared index, resolver and models used by the ingest and query binaries.

pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod resolve;

#[cfg(test)]
mod fixtures;

pub use error::ReverseError;
pub use models::{GeometryFormat, IndexedObject, OsmType, PlaceId, PlaceResult};
pub use resolve::{ReverseGeocoder, ReverseRequest};
