//! Query server for reverse geocoding.
//!
//! Serves `GET /reverse` over a snapshot written by the ingest pipeline, or
//! answers a single lookup from the command line.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use revgeo::config::Config;
use revgeo::{GeometryFormat, PlaceResult, ReverseError, ReverseGeocoder, ReverseRequest};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Reverse geocoding query server")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot file, overrides the config file
    #[arg(short, long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen address, overrides the config file
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Resolve one coordinate and print the result as JSON
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 18, allow_hyphen_values = true)]
        zoom: i32,
        /// Preferred languages, Accept-Language syntax
        #[arg(long)]
        lang: Option<String>,
        /// One of geojson, kml, svg, text
        #[arg(long)]
        polygon_output: Option<GeometryFormat>,
        /// Simplification tolerance in degrees
        #[arg(long, default_value_t = 0.0)]
        polygon_threshold: f64,
        /// Leave out the address breakdown
        #[arg(long)]
        no_addressdetails: bool,
        #[arg(long)]
        extratags: bool,
        #[arg(long)]
        namedetails: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    let snapshot = args.snapshot.unwrap_or(config.server.snapshot.clone());

    let geocoder = ReverseGeocoder::from_snapshot(&snapshot, &config.resolver)
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;

    match args.command {
        Command::Serve { listen } => {
            let listen = listen.unwrap_or(config.server.listen);
            serve(Arc::new(geocoder), &listen).await
        }
        Command::Reverse {
            lat,
            lon,
            zoom,
            lang,
            polygon_output,
            polygon_threshold,
            no_addressdetails,
            extratags,
            namedetails,
        } => {
            let mut request = ReverseRequest::new(lat, lon)
                .with_zoom(zoom)
                .with_languages(lang.as_deref().unwrap_or_default())
                .with_geometry(polygon_output.unwrap_or_default(), polygon_threshold);
            request.address_details = !no_addressdetails;
            request.extra_tags = extratags;
            request.name_details = namedetails;

            match geocoder.resolve(&request) {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(ReverseError::NoCoverage) => {
                    println!("{}", serde_json::to_string_pretty(&ErrorBody::no_coverage())?)
                }
                Err(e) => return Err(e.into()),
            }
            Ok(())
        }
    }
}

async fn serve(geocoder: Arc<ReverseGeocoder>, listen: &str) -> Result<()> {
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/reverse", get(reverse_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(geocoder);

    let addr: SocketAddr = listen.parse().context("Invalid listen address")?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(geocoder): State<Arc<ReverseGeocoder>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        objects: geocoder.store().len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    objects: usize,
}

#[derive(Deserialize, Debug)]
struct ReverseQueryParams {
    lat: f64,
    lon: f64,
    zoom: Option<i32>,
    /// Preferred languages, takes precedence over the Accept-Language header
    #[serde(rename = "accept-language")]
    accept_language: Option<String>,
    polygon_geojson: Option<String>,
    polygon_kml: Option<String>,
    polygon_svg: Option<String>,
    polygon_text: Option<String>,
    polygon_threshold: Option<f64>,
    addressdetails: Option<String>,
    extratags: Option<String>,
    namedetails: Option<String>,
}

impl ReverseQueryParams {
    fn into_request(self, headers: &HeaderMap) -> Result<ReverseRequest, ReverseError> {
        let format = ReverseRequest::geometry_from_flags(
            flag(&self.polygon_geojson, false),
            flag(&self.polygon_kml, false),
            flag(&self.polygon_svg, false),
            flag(&self.polygon_text, false),
        )?;

        let languages = self.accept_language.as_deref().or_else(|| {
            headers
                .get(ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok())
        });

        let mut request = ReverseRequest::new(self.lat, self.lon)
            .with_languages(languages.unwrap_or_default())
            .with_geometry(format, self.polygon_threshold.unwrap_or(0.0));
        if let Some(zoom) = self.zoom {
            request = request.with_zoom(zoom);
        }
        request.address_details = flag(&self.addressdetails, true);
        request.extra_tags = flag(&self.extratags, false);
        request.name_details = flag(&self.namedetails, false);
        Ok(request)
    }
}

/// Boolean query parameter in the `0`/`1` convention.
fn flag(value: &Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::trim) {
        None | Some("") => default,
        Some(v) => !matches!(v, "0" | "false" | "no"),
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ErrorBody {
    fn no_coverage() -> Self {
        Self {
            error: "Unable to geocode".to_string(),
        }
    }
}

struct ApiError(ReverseError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReverseError::NoCoverage => return Json(ErrorBody::no_coverage()).into_response(),
            e if e.is_bad_request() => StatusCode::BAD_REQUEST,
            e => {
                error!("Reverse geocoding failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Reverse geocoding
async fn reverse_handler(
    State(geocoder): State<Arc<ReverseGeocoder>>,
    headers: HeaderMap,
    Query(params): Query<ReverseQueryParams>,
) -> Result<Json<PlaceResult>, Response> {
    let request = params
        .into_request(&headers)
        .map_err(|e| ApiError(e).into_response())?;

    let result = tokio::task::spawn_blocking(move || geocoder.resolve(&request))
        .await
        .map_err(|e| {
            error!("Reverse task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })?
        .map_err(|e| ApiError(e).into_response())?;

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn params(query: &str) -> ReverseQueryParams {
        let uri: axum::http::Uri = format!("/reverse?{}", query).parse().unwrap();
        Query::<ReverseQueryParams>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_cli_includes_address_by_default() {
        let args = Args::try_parse_from(["query", "reverse", "--lat", "52.5", "--lon", "-1.8"])
            .unwrap();
        match args.command {
            Command::Reverse {
                no_addressdetails, ..
            } => assert!(!no_addressdetails),
            other => panic!("unexpected command {:?}", other),
        }

        let args = Args::try_parse_from([
            "query",
            "reverse",
            "--lat",
            "52.5",
            "--lon",
            "-1.8",
            "--no-addressdetails",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Reverse {
                no_addressdetails: true,
                ..
            }
        ));
    }

    #[test]
    fn test_flag_convention() {
        assert!(flag(&Some("1".to_string()), false));
        assert!(!flag(&Some("0".to_string()), true));
        assert!(flag(&None, true));
        assert!(!flag(&Some(String::new()), false));
    }

    #[test]
    fn test_query_to_request() {
        let request = params("lat=52.5487&lon=-1.8164&zoom=16&polygon_geojson=1&addressdetails=0")
            .into_request(&HeaderMap::new())
            .unwrap();
        assert_eq!(request.zoom, 16);
        assert_eq!(request.geometry_format, GeometryFormat::GeoJson);
        assert!(!request.address_details);
        assert!(request.languages.is_empty());
    }

    #[test]
    fn test_conflicting_polygon_flags() {
        let err = params("lat=1&lon=1&polygon_kml=1&polygon_svg=1")
            .into_request(&HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, ReverseError::ConflictingGeometryFormat));
    }

    #[test]
    fn test_language_parameter_beats_header() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fr"));

        let from_header = params("lat=1&lon=1").into_request(&headers).unwrap();
        assert_eq!(from_header.languages, vec!["fr".to_string()]);

        let from_param = params("lat=1&lon=1&accept-language=de")
            .into_request(&headers)
            .unwrap();
        assert_eq!(from_param.languages, vec!["de".to_string()]);
    }

    #[test]
    fn test_error_status() {
        let response = ApiError(ReverseError::NoCoverage).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let invalid = ReverseError::InvalidCoordinate { lat: 91.0, lon: 0.0 };
        let response = ApiError(invalid).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(ReverseError::Snapshot("corrupt".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
