//! OSM PBF ingest pipeline.
//!
//! Parses OSM data, classifies places, assigns address parents by
//! point-in-polygon lookup and writes a snapshot for the query server.

mod extract;
mod geometry;
mod importance;
mod parents;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use osmpbfreader::OsmPbfReader;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use revgeo::config::Config;
use revgeo::index::write_snapshot;
use revgeo::models::PlaceId;

use crate::extract::{classify, extract_object};
use crate::geometry::GeometryResolver;
use crate::importance::{apply_importance, load_importance};
use crate::parents::assign_parents;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Build a reverse geocoding snapshot from an OSM PBF file")]
struct Args {
    /// OSM PBF file to import
    #[arg(short, long)]
    file: PathBuf,

    /// Snapshot file to write
    #[arg(short, long, default_value = "places.json.gz")]
    output: PathBuf,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to wikimedia-importance.csv(.gz), overrides the config file
    #[arg(long)]
    importance_file: Option<PathBuf>,

    /// Radius in degrees for attaching buildings to their street
    #[arg(long)]
    street_radius: Option<f64>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;

    info!("Revgeo Ingest Pipeline");
    info!("File: {}", args.file.display());

    let source_file = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.osm.pbf")
        .to_string();

    let importance_path = args.importance_file.or(config.ingest.importance_file);
    let importance_map = match importance_path {
        Some(path) => Some(load_importance(&path)?),
        None => {
            warn!("No importance file given. Using feature-type defaults.");
            None
        }
    };
    let street_radius = args
        .street_radius
        .unwrap_or(config.ingest.street_radius_deg);

    let file = File::open(&args.file).context("Failed to open PBF file")?;
    let mut reader = OsmPbfReader::new(BufReader::new(file));
    let resolver = GeometryResolver::build(&mut reader, |tags| classify(tags).is_some())?;

    info!("Counting objects...");
    reader.rewind()?;
    let total_count = reader.iter().filter(|obj| obj.is_ok()).count() as u64;
    info!("Total OSM objects: {}", total_count);

    let pb = ProgressBar::new(total_count);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    info!("Extracting places...");
    reader.rewind()?;
    let mut objects = Vec::new();
    for obj_result in reader.iter() {
        pb.inc(1);

        let obj = match obj_result {
            Ok(o) => o,
            Err(e) => {
                warn!("Error reading OSM object: {}", e);
                continue;
            }
        };

        if let Some(mut place) = extract_object(&obj, &resolver) {
            place.id = PlaceId(
                u32::try_from(objects.len()).context("Too many objects for 32-bit place ids")?,
            );
            objects.push(place);
        }
    }
    pb.finish_with_message("Extraction complete");
    drop(resolver);
    info!("Extracted {} places", objects.len());

    apply_importance(&mut objects, importance_map.as_ref());
    let objects = assign_parents(objects, street_radius)?;

    let header = write_snapshot(&args.output, &source_file, objects)?;
    info!(
        "Ingestion complete: {} objects written at {}",
        header.object_count, header.created_at
    );

    Ok(())
}
