//! Reverse query parameters and their validation.

use serde::{Deserialize, Serialize};

use super::locale::parse_accept_language;
use super::zoom::MAX_ZOOM;
use crate::error::ReverseError;
use crate::models::GeometryFormat;

/// One reverse query. Everything the result depends on besides the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseRequest {
    pub lat: f64,
    pub lon: f64,
    /// Detail level 0..=18, clamped when out of range
    pub zoom: i32,
    /// Preferred languages, most preferred first
    pub languages: Vec<String>,
    pub geometry_format: GeometryFormat,
    /// Allowed deviation of the output geometry in degrees
    pub geometry_tolerance: f64,
    pub address_details: bool,
    pub extra_tags: bool,
    pub name_details: bool,
}

impl ReverseRequest {
    /// Request at the most detailed zoom with every option at its default.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            zoom: i32::from(MAX_ZOOM),
            languages: Vec::new(),
            geometry_format: GeometryFormat::None,
            geometry_tolerance: 0.0,
            address_details: true,
            extra_tags: false,
            name_details: false,
        }
    }

    pub fn with_zoom(mut self, zoom: i32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Set languages from an `Accept-Language` style string.
    pub fn with_languages(mut self, accept_language: &str) -> Self {
        self.languages = parse_accept_language(accept_language);
        self
    }

    pub fn with_geometry(mut self, format: GeometryFormat, tolerance: f64) -> Self {
        self.geometry_format = format;
        self.geometry_tolerance = tolerance;
        self
    }

    /// Pick the geometry output from the individual `polygon_*` switches.
    ///
    /// At most one switch may be set.
    pub fn geometry_from_flags(
        polygon_geojson: bool,
        polygon_kml: bool,
        polygon_svg: bool,
        polygon_text: bool,
    ) -> Result<GeometryFormat, ReverseError> {
        let selected: Vec<GeometryFormat> = [
            (polygon_geojson, GeometryFormat::GeoJson),
            (polygon_kml, GeometryFormat::Kml),
            (polygon_svg, GeometryFormat::Svg),
            (polygon_text, GeometryFormat::Text),
        ]
        .into_iter()
        .filter_map(|(set, format)| set.then_some(format))
        .collect();

        match selected.as_slice() {
            [] => Ok(GeometryFormat::None),
            [format] => Ok(*format),
            _ => Err(ReverseError::ConflictingGeometryFormat),
        }
    }

    /// Reject coordinates outside the WGS84 ranges.
    pub fn validate(&self) -> Result<(), ReverseError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        if !lat_ok || !lon_ok {
            return Err(ReverseError::InvalidCoordinate {
                lat: self.lat,
                lon: self.lon,
            });
        }
        Ok(())
    }

    /// Tolerance actually applied to the output geometry.
    pub fn effective_tolerance(&self) -> f64 {
        if self.geometry_tolerance.is_finite() && self.geometry_tolerance > 0.0 {
            self.geometry_tolerance
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = ReverseRequest::new(52.5, -1.8);
        assert_eq!(request.zoom, 18);
        assert!(request.address_details);
        assert!(!request.extra_tags);
        assert!(!request.name_details);
        assert_eq!(request.geometry_format, GeometryFormat::None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_single_polygon_flag() {
        assert_eq!(
            ReverseRequest::geometry_from_flags(false, false, true, false).unwrap(),
            GeometryFormat::Svg
        );
        assert_eq!(
            ReverseRequest::geometry_from_flags(false, false, false, false).unwrap(),
            GeometryFormat::None
        );
    }

    #[test]
    fn test_conflicting_polygon_flags() {
        assert!(matches!(
            ReverseRequest::geometry_from_flags(true, true, false, false),
            Err(ReverseError::ConflictingGeometryFormat)
        ));
        assert!(matches!(
            ReverseRequest::geometry_from_flags(true, true, true, true),
            Err(ReverseError::ConflictingGeometryFormat)
        ));
    }

    #[test]
    fn test_invalid_coordinates() {
        for (lat, lon) in [(90.5, 0.0), (0.0, -180.1), (f64::NAN, 0.0), (0.0, f64::INFINITY)] {
            let err = ReverseRequest::new(lat, lon).validate().unwrap_err();
            assert!(matches!(err, ReverseError::InvalidCoordinate { .. }));
            assert!(err.is_bad_request());
        }
        assert!(ReverseRequest::new(-90.0, 180.0).validate().is_ok());
    }

    #[test]
    fn test_effective_tolerance() {
        let request = ReverseRequest::new(0.0, 0.0);
        let negative = request.clone().with_geometry(GeometryFormat::Kml, -2.0);
        assert_eq!(negative.effective_tolerance(), 0.0);
        let positive = request.with_geometry(GeometryFormat::Kml, 0.01);
        assert_eq!(positive.effective_tolerance(), 0.01);
    }
}
