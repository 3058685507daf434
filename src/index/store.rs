//! Arena storage of indexed objects and the snapshot file format.

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{ReverseError, Result};
use crate::models::{IndexedObject, PlaceId};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub object_count: usize,
    /// Source file name the snapshot was built from
    pub source_file: String,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    header: SnapshotHeader,
    objects: Vec<IndexedObject>,
}

/// Immutable arena of all indexed objects, addressed by [`PlaceId`].
pub struct PlaceStore {
    objects: Vec<Arc<IndexedObject>>,
}

impl PlaceStore {
    /// Build a store. Object `i` must carry `PlaceId(i)` and parents must point inside the arena.
    pub fn new(objects: Vec<IndexedObject>) -> Result<Self> {
        let len = objects.len();
        for (pos, obj) in objects.iter().enumerate() {
            if obj.id.index() != pos {
                return Err(ReverseError::Snapshot(format!(
                    "object at position {} has id {}",
                    pos, obj.id
                )));
            }
            if let Some(bad) = obj.parents.iter().find(|p| p.index() >= len) {
                return Err(ReverseError::Snapshot(format!(
                    "object {} references missing parent {}",
                    obj.id, bad
                )));
            }
        }

        Ok(Self {
            objects: objects.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn get(&self, id: PlaceId) -> Option<&Arc<IndexedObject>> {
        self.objects.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<IndexedObject>> {
        self.objects.iter()
    }

    /// Take the objects back out, cloning any that are still shared.
    pub fn into_objects(self) -> Vec<IndexedObject> {
        self.objects.into_iter().map(Arc::unwrap_or_clone).collect()
    }

    /// Load a gzip-compressed JSON snapshot written by [`write_snapshot`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Self, SnapshotHeader)> {
        let path = path.as_ref();
        info!("Loading snapshot from {}", path.display());

        let file = File::open(path)?;
        let reader = BufReader::new(GzDecoder::new(file));
        let snapshot: Snapshot = serde_json::from_reader(reader)
            .map_err(|e| ReverseError::Snapshot(format!("{}: {}", path.display(), e)))?;

        if snapshot.header.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(ReverseError::Snapshot(format!(
                "unsupported format version {}",
                snapshot.header.format_version
            )));
        }
        if snapshot.header.object_count != snapshot.objects.len() {
            return Err(ReverseError::Snapshot(format!(
                "header announces {} objects, found {}",
                snapshot.header.object_count,
                snapshot.objects.len()
            )));
        }

        let store = Self::new(snapshot.objects)?;
        info!(
            "Loaded {} objects (built {})",
            store.len(),
            snapshot.header.created_at
        );
        Ok((store, snapshot.header))
    }
}

/// Write objects as a gzip-compressed JSON snapshot.
pub fn write_snapshot<P: AsRef<Path>>(
    path: P,
    source_file: &str,
    objects: Vec<IndexedObject>,
) -> Result<SnapshotHeader> {
    let header = SnapshotHeader {
        format_version: SNAPSHOT_FORMAT_VERSION,
        created_at: Utc::now(),
        object_count: objects.len(),
        source_file: source_file.to_string(),
    };
    let snapshot = Snapshot {
        header: header.clone(),
        objects,
    };

    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(GzEncoder::new(file, Compression::default()));
    serde_json::to_writer(&mut writer, &snapshot)
        .map_err(|e| ReverseError::Snapshot(e.to_string()))?;
    let encoder = writer
        .into_inner()
        .map_err(|e| ReverseError::Io(e.into_error()))?;
    encoder.finish()?.flush()?;

    info!(
        "Wrote snapshot with {} objects to {}",
        header.object_count,
        path.as_ref().display()
    );
    Ok(header)
}
