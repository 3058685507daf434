use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ReverseError;
use crate::models::rank::RANK_BUILDING;

/// Number of zoom levels (0..=18).
pub const ZOOM_LEVELS: usize = 19;

/// Zoom level → most detailed address rank kept.
pub const DEFAULT_ZOOM_RANKS: [u8; ZOOM_LEVELS] = [
    2, 2, 2, // continent / sea
    4, 4, // country
    8, // state
    10, 10, // region
    12, 12, // county
    16, 16, // city
    18, 18, // town / village
    22, 22, // suburb
    26, // major streets
    27, // major and minor streets
    30, // building
];

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub server: ServerConfig,
    pub ingest: IngestConfig,
}

/// Tunables of the resolution pipeline, fixed at construction time.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound on candidates examined per query
    pub max_candidates: usize,
    /// Search radius in degrees
    pub max_radius_deg: f64,
    /// Lowest `rank_search` a nearest candidate may have
    pub min_candidate_rank: u8,
    /// `class` or `class=type` patterns never returned as nearest candidates
    pub excluded_categories: Vec<String>,
    pub max_chain_len: usize,
    /// Chain cache capacity, 0 disables caching
    pub chain_cache_size: usize,
    pub zoom_ranks: Vec<u8>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_candidates: 64,
            max_radius_deg: 0.05,
            min_candidate_rank: 26,
            excluded_categories: vec!["boundary".to_string(), "landuse".to_string()],
            max_chain_len: 32,
            chain_cache_size: 10_000,
            zoom_ranks: DEFAULT_ZOOM_RANKS.to_vec(),
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), ReverseError> {
        if self.zoom_ranks.len() != ZOOM_LEVELS {
            return Err(ReverseError::InvalidConfig(format!(
                "zoom_ranks needs {} entries, got {}",
                ZOOM_LEVELS,
                self.zoom_ranks.len()
            )));
        }
        if self.zoom_ranks.iter().any(|r| *r > RANK_BUILDING) {
            return Err(ReverseError::InvalidConfig(
                "zoom_ranks entries must not exceed 30".to_string(),
            ));
        }
        if self.zoom_ranks.windows(2).any(|w| w[0] > w[1]) {
            return Err(ReverseError::InvalidConfig(
                "zoom_ranks must be non-decreasing".to_string(),
            ));
        }
        if self.max_chain_len == 0 {
            return Err(ReverseError::InvalidConfig(
                "max_chain_len must be at least 1".to_string(),
            ));
        }
        if self.max_candidates == 0 {
            return Err(ReverseError::InvalidConfig(
                "max_candidates must be at least 1".to_string(),
            ));
        }
        if !self.max_radius_deg.is_finite() || self.max_radius_deg <= 0.0 {
            return Err(ReverseError::InvalidConfig(
                "max_radius_deg must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    pub snapshot: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            snapshot: PathBuf::from("places.json.gz"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub importance_file: Option<PathBuf>,
    /// Radius in degrees for attaching buildings to their street
    pub street_radius_deg: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            importance_file: None,
            street_radius_deg: 0.005,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.resolver.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }
}
