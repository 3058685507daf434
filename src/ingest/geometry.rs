use anyhow::Result;
use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use hashbrown::{HashMap, HashSet};
use osmpbfreader::{NodeId, OsmId, OsmObj, OsmPbfReader, RelationId, WayId};
use sled::Db;
use std::io::{Read, Seek};
use tempfile::{Builder, TempDir};
use tracing::info;

/// Member ways of a multipolygon relation, split by role.
#[derive(Debug, Default)]
struct RelationWays {
    outer: Vec<WayId>,
    inner: Vec<WayId>,
}

/// Resolves way and relation geometries from node coordinates kept on disk.
pub struct GeometryResolver {
    node_db: Db,
    way_nodes: HashMap<WayId, Vec<NodeId>>,
    relation_ways: HashMap<RelationId, RelationWays>,
    // Keeps the sled directory alive as long as the resolver
    _dir: TempDir,
}

impl GeometryResolver {
    /// Scan the file, keeping only ways and relations whose tags pass `filter`
    /// (plus the member ways of matching relations).
    pub fn build<R: Read + Seek, F>(reader: &mut OsmPbfReader<R>, filter: F) -> Result<Self>
    where
        F: Fn(&osmpbfreader::Tags) -> bool,
    {
        info!("Building geometry index...");

        let mut needed_ways = HashSet::new();
        let mut needed_nodes = HashSet::new();
        let mut relation_ways = HashMap::new();
        let mut way_nodes = HashMap::new();

        info!("Pass 1/3: Identifying relevant relations...");
        reader.rewind()?;
        for obj in reader.iter() {
            let OsmObj::Relation(rel) = obj? else {
                continue;
            };
            if !is_area_relation(&rel.tags) || !filter(&rel.tags) {
                continue;
            }
            let mut ways = RelationWays::default();
            for member in &rel.refs {
                if let OsmId::Way(way_id) = member.member {
                    match member.role.as_str() {
                        "inner" => ways.inner.push(way_id),
                        "outer" | "" => ways.outer.push(way_id),
                        _ => continue,
                    }
                    needed_ways.insert(way_id);
                }
            }
            relation_ways.insert(rel.id, ways);
        }
        info!("Found {} relevant relations", relation_ways.len());

        info!("Pass 2/3: Identifying relevant ways...");
        reader.rewind()?;
        for obj in reader.iter() {
            if let OsmObj::Way(way) = obj? {
                if needed_ways.contains(&way.id) || filter(&way.tags) {
                    needed_nodes.extend(way.nodes.iter().copied());
                    way_nodes.insert(way.id, way.nodes);
                }
            }
        }
        info!(
            "Found {} relevant ways, referencing {} nodes",
            way_nodes.len(),
            needed_nodes.len()
        );

        info!("Pass 3/3: Storing node coordinates...");
        reader.rewind()?;

        let dir = Builder::new().prefix("revgeo-nodes-").tempdir()?;
        let db = sled::open(dir.path())?;

        let mut stored_count = 0u64;
        for obj in reader.iter() {
            if let OsmObj::Node(node) = obj? {
                if needed_nodes.contains(&node.id) {
                    db.insert(node.id.0.to_be_bytes(), &encode_coord(node.lon(), node.lat()))?;
                    stored_count += 1;
                }
            }
        }
        db.flush()?;
        info!("Stored {} node coordinates", stored_count);

        Ok(Self {
            node_db: db,
            way_nodes,
            relation_ways,
            _dir: dir,
        })
    }

    fn coords(&self, nodes: &[NodeId]) -> Vec<Coord<f64>> {
        nodes
            .iter()
            .filter_map(|nid| match self.node_db.get(nid.0.to_be_bytes()) {
                Ok(Some(bytes)) => decode_coord(&bytes),
                _ => None,
            })
            .collect()
    }

    /// Open geometry of a way
    pub fn resolve_line(&self, way_id: WayId) -> Option<LineString<f64>> {
        let coords = self.coords(self.way_nodes.get(&way_id)?);
        (coords.len() >= 2).then(|| LineString::new(coords))
    }

    /// Closed geometry of a way, closing the ring when needed
    pub fn resolve_area(&self, way_id: WayId) -> Option<Polygon<f64>> {
        let mut ring = self.coords(self.way_nodes.get(&way_id)?);
        if ring.len() < 3 {
            return None;
        }
        if ring.first() != ring.last() {
            ring.push(ring[0]);
        }
        (ring.len() >= 4).then(|| Polygon::new(LineString::new(ring), vec![]))
    }

    /// Multipolygon of a relation; inner rings become holes of the outer polygon containing them
    pub fn resolve_relation(&self, rel_id: RelationId) -> Option<MultiPolygon<f64>> {
        let ways = self.relation_ways.get(&rel_id)?;

        let segments = |ids: &[WayId]| -> Vec<Vec<Coord<f64>>> {
            ids.iter()
                .filter_map(|id| self.way_nodes.get(id))
                .map(|nodes| self.coords(nodes))
                .filter(|coords| coords.len() >= 2)
                .collect()
        };

        let outers = merge_rings_to_polygons(segments(&ways.outer));
        if outers.is_empty() {
            return None;
        }
        let inners = merge_rings_to_polygons(segments(&ways.inner));

        Some(MultiPolygon::new(assign_holes(outers, inners)))
    }
}

fn is_area_relation(tags: &osmpbfreader::Tags) -> bool {
    matches!(
        tags.get("type").map(|t| t.as_str()),
        Some("multipolygon") | Some("boundary")
    )
}

fn encode_coord(lon: f64, lat: f64) -> [u8; 16] {
    let mut value = [0u8; 16];
    value[0..8].copy_from_slice(&lon.to_be_bytes());
    value[8..16].copy_from_slice(&lat.to_be_bytes());
    value
}

fn decode_coord(bytes: &[u8]) -> Option<Coord<f64>> {
    let lon = f64::from_be_bytes(bytes.get(0..8)?.try_into().ok()?);
    let lat = f64::from_be_bytes(bytes.get(8..16)?.try_into().ok()?);
    Some(Coord { x: lon, y: lat })
}

/// Attach every inner ring to the first outer polygon containing it.
fn assign_holes(outers: Vec<Polygon<f64>>, inners: Vec<Polygon<f64>>) -> Vec<Polygon<f64>> {
    let mut holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); outers.len()];
    for inner in inners {
        let Some(first) = inner.exterior().0.first().copied() else {
            continue;
        };
        if let Some(pos) = outers
            .iter()
            .position(|outer| outer.contains(&Point::from(first)))
        {
            holes[pos].push(inner.exterior().clone());
        }
    }

    outers
        .into_iter()
        .zip(holes)
        .map(|(outer, holes)| {
            let (exterior, _) = outer.into_inner();
            Polygon::new(exterior, holes)
        })
        .collect()
}

/// Join way segments end to end into closed rings.
///
/// Segments may be listed in any order and direction. Segments that cannot be
/// closed are dropped.
pub fn merge_rings_to_polygons(rings: Vec<Vec<Coord<f64>>>) -> Vec<Polygon<f64>> {
    let mut result = Vec::new();
    let mut remaining: Vec<Vec<Coord<f64>>> = rings;

    while !remaining.is_empty() {
        let mut current = remaining.remove(0);

        if current.first() == current.last() && current.len() >= 4 {
            result.push(Polygon::new(LineString::new(current), vec![]));
            continue;
        }

        let mut merged = true;
        while merged && !remaining.is_empty() {
            merged = false;

            let current_start = current.first().copied();
            let current_end = current.last().copied();

            for i in 0..remaining.len() {
                let ring_start = remaining[i].first().copied();
                let ring_end = remaining[i].last().copied();

                if current_end == ring_start {
                    let ring = remaining.remove(i);
                    current.extend(ring.into_iter().skip(1));
                } else if current_end == ring_end {
                    let ring = remaining.remove(i);
                    current.extend(ring.into_iter().rev().skip(1));
                } else if current_start == ring_end {
                    let mut ring = remaining.remove(i);
                    ring.pop();
                    ring.extend(current);
                    current = ring;
                } else if current_start == ring_start {
                    let mut ring = remaining.remove(i);
                    ring.reverse();
                    ring.pop();
                    ring.extend(current);
                    current = ring;
                } else {
                    continue;
                }
                merged = true;
                break;
            }
        }

        // Only rings whose ends actually met are areas
        if current.len() >= 4 && current.first() == current.last() {
            result.push(Polygon::new(LineString::new(current), vec![]));
        }
    }

    result
}
