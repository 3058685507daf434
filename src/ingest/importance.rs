use anyhow::{Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use hashbrown::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use revgeo::models::IndexedObject;

/// Load importance scores from a Wikimedia importance TSV, optionally gzipped.
///
/// Columns: `language type title importance wikidata_id`, with a header row.
pub fn load_importance(path: &Path) -> Result<HashMap<String, f64>> {
    info!("Loading importance data from {}", path.display());

    let file = File::open(path).context("Failed to open importance file")?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let importance_idx = headers
        .iter()
        .position(|h| h == "importance")
        .context("Column 'importance' not found")?;
    let wikidata_idx = headers
        .iter()
        .position(|h| h == "wikidata_id")
        .context("Column 'wikidata_id' not found")?;

    let mut map = HashMap::new();
    for result in csv_reader.records() {
        let record = result?;
        let (Some(qid), Some(score)) = (record.get(wikidata_idx), record.get(importance_idx)) else {
            continue;
        };
        if let Ok(importance) = score.parse::<f64>() {
            // Several language editions share a wikidata id, keep the best
            let entry = map.entry(qid.to_string()).or_insert(importance);
            if importance > *entry {
                *entry = importance;
            }
        }
    }

    info!("Loaded {} importance scores", map.len());
    Ok(map)
}

/// Default importance by feature type, used when no Wikimedia score exists.
pub fn feature_importance(category: &str, place_type: &str) -> f64 {
    match (category, place_type) {
        ("place", "continent" | "ocean") => 0.5,
        ("place", "sea" | "country") => 0.4,
        ("place", "state") => 0.3,
        ("place", "region") => 0.25,
        ("place", "county" | "city") => 0.2,
        ("place", "town") => 0.15,
        ("place", "village" | "suburb") => 0.1,
        ("place", "hamlet" | "farm" | "locality") => 0.05,
        ("highway", "path" | "cycleway" | "footway" | "track") => 0.075,
        ("highway", _) => 0.1,
        ("shop", _) => 0.05,
        ("amenity", "restaurant" | "cafe" | "fast_food" | "bar" | "pub" | "marketplace") => 0.05,
        _ => 0.01,
    }
}

/// Set every object's importance from the scores, falling back to its feature type.
///
/// Administrative boundaries without a score keep no importance so the
/// resolver's rank-based default applies.
pub fn apply_importance(objects: &mut [IndexedObject], scores: Option<&HashMap<String, f64>>) {
    let mut scored = 0usize;
    for obj in objects.iter_mut() {
        let score = obj
            .wikidata_id
            .as_ref()
            .and_then(|qid| scores?.get(qid).copied());
        obj.importance = match score {
            Some(score) => {
                scored += 1;
                Some(score)
            }
            None if obj.category == "boundary" => None,
            None => Some(feature_importance(&obj.category, &obj.place_type)),
        };
    }
    info!("{} of {} objects have a Wikimedia importance", scored, objects.len());
}
