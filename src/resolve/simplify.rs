//! Topology-preserving geometry simplification for polygon output.
//!
//! Uses Ramer–Douglas–Peucker on every line and ring. The kept vertices are a
//! subset of the original ones and every dropped vertex lies within
//! `tolerance` of the segment replacing it, so the Hausdorff distance to the
//! input never exceeds `tolerance`. Running the algorithm again on its own
//! output picks the same split points, which makes it idempotent.
//!
//! Topology is protected by falling back to the original: a ring that would
//! collapse below four coordinates or cross itself is kept as-is, and a
//! polygon whose simplified rings would cross each other (or lose a hole
//! outside the shell) is kept whole. A multipolygon whose simplified parts
//! would touch each other is returned unsimplified.

use geo::{
    BoundingRect, Contains, Coord, Distance, Euclidean, Intersects, Line, LineString,
    MultiPolygon, Point, Polygon,
};

use crate::models::PlaceGeometry;

/// Simplify `geometry` so it deviates at most `tolerance` degrees from the input.
///
/// A tolerance of zero (or any non-positive or non-finite value) returns the
/// geometry unchanged. Points are always returned unchanged.
pub fn simplify(geometry: &PlaceGeometry, tolerance: f64) -> PlaceGeometry {
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return geometry.clone();
    }

    match geometry {
        PlaceGeometry::Point(p) => PlaceGeometry::Point(*p),
        PlaceGeometry::Line(line) => PlaceGeometry::Line(simplify_line(line, tolerance)),
        PlaceGeometry::Area(area) => PlaceGeometry::Area(simplify_multipolygon(area, tolerance)),
    }
}

fn simplify_multipolygon(area: &MultiPolygon<f64>, tolerance: f64) -> MultiPolygon<f64> {
    let polygons: Vec<Polygon<f64>> = area
        .0
        .iter()
        .map(|polygon| simplify_polygon(polygon, tolerance))
        .collect();

    // A shell that lost a notch may now cover a neighbouring island
    let overlapping = polygons.iter().enumerate().any(|(i, a)| {
        polygons[i + 1..].iter().any(|b| {
            let bbox_overlap = match (a.bounding_rect(), b.bounding_rect()) {
                (Some(ra), Some(rb)) => ra.intersects(&rb),
                _ => false,
            };
            bbox_overlap && a.intersects(b)
        })
    });

    if overlapping {
        area.clone()
    } else {
        MultiPolygon::new(polygons)
    }
}

fn simplify_line(line: &LineString<f64>, tolerance: f64) -> LineString<f64> {
    if line.0.len() <= 2 {
        return line.clone();
    }
    LineString::new(rdp(&line.0, tolerance))
}

fn simplify_polygon(polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
    let exterior = simplify_ring(polygon.exterior(), tolerance);
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .map(|ring| simplify_ring(ring, tolerance))
        .collect();

    let shell = Polygon::new(exterior.clone(), vec![]);
    let holes_inside = interiors
        .iter()
        .all(|hole| hole.0.first().map_or(true, |c| shell.contains(&Point::from(*c))));

    let mut rings: Vec<&LineString<f64>> = Vec::with_capacity(interiors.len() + 1);
    rings.push(&exterior);
    rings.extend(interiors.iter());
    let rings_disjoint = rings
        .iter()
        .enumerate()
        .all(|(i, a)| rings[i + 1..].iter().all(|b| !rings_cross(a, b)));

    if holes_inside && rings_disjoint {
        Polygon::new(exterior, interiors)
    } else {
        polygon.clone()
    }
}

fn simplify_ring(ring: &LineString<f64>, tolerance: f64) -> LineString<f64> {
    if ring.0.len() <= 4 || !ring.is_closed() {
        return ring.clone();
    }

    let simplified = LineString::new(rdp(&ring.0, tolerance));
    if simplified.0.len() < 4 || self_intersects(&simplified) {
        ring.clone()
    } else {
        simplified
    }
}

/// Ramer–Douglas–Peucker keeping both endpoints.
fn rdp(coords: &[Coord<f64>], tolerance: f64) -> Vec<Coord<f64>> {
    let mut keep = vec![false; coords.len()];
    keep[0] = true;
    keep[coords.len() - 1] = true;

    let mut stack = vec![(0, coords.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let segment = Line::new(coords[start], coords[end]);

        // First vertex with the largest deviation
        let mut split = start;
        let mut max_distance = 0.0;
        for (i, c) in coords.iter().enumerate().take(end).skip(start + 1) {
            let d = Euclidean.distance(&Point::from(*c), &segment);
            if d > max_distance {
                max_distance = d;
                split = i;
            }
        }

        if max_distance > tolerance {
            keep[split] = true;
            stack.push((start, split));
            stack.push((split, end));
        }
    }

    coords
        .iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(*c))
        .collect()
}

/// Whether two non-adjacent segments of a closed ring touch.
fn self_intersects(ring: &LineString<f64>) -> bool {
    let segments: Vec<Line<f64>> = ring.lines().collect();
    let n = segments.len();

    (0..n).any(|i| {
        (i + 2..n)
            // First and last segment share the closing vertex
            .filter(|&j| !(i == 0 && j == n - 1))
            .any(|j| segments[i].intersects(&segments[j]))
    })
}

fn rings_cross(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    a.lines().any(|la| b.lines().any(|lb| la.intersects(&lb)))
}
