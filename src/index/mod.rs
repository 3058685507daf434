//! Immutable place storage and spatial lookups.
//!
//! Built once from a snapshot and shared read-only by all queries.

mod spatial;
mod store;

pub use spatial::{planar_distance, Candidate, IndexedPlace, SpatialIndex};
pub use store::{write_snapshot, PlaceStore, SnapshotHeader, SNAPSHOT_FORMAT_VERSION};
