//! Error taxonomy for reverse resolution.

use thiserror::Error;

use crate::models::PlaceId;

#[derive(Debug, Error)]
pub enum ReverseError {
    /// No eligible object within the search radius and no area containing the point.
    #[error("Unable to geocode: no OSM data coverage at this location")]
    NoCoverage,

    /// Containment data loops or exceeds the configured chain length.
    #[error("Address hierarchy of place {place} exceeded {depth} levels")]
    HierarchyCycle { place: PlaceId, depth: usize },

    #[error("Only one polygon output format may be requested")]
    ConflictingGeometryFormat,

    #[error("Invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReverseError {
    /// Request-validation failures, rejected before any index query.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            ReverseError::ConflictingGeometryFormat | ReverseError::InvalidCoordinate { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReverseError>;
