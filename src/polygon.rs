//! Polygons and point-in-polygon classification of grid cells.
//!
//! A [`Polygon`] holds one or more parts. A point is inside the polygon if it
//! is inside any part, where each part uses the even-odd rule. Points exactly
//! on an edge may land on either side, but always on the same side for the
//! same input.
//!
//! Two [`PointClassifier`] implementations exist: [`RayCastingClassifier`] is
//! the plain per-point reference, [`PreparedPolygon`] caches edges and
//! y-extents and evaluates with `ndarray::Zip`. Both share
//! [`edge_crossed`], so their classifications are identical.

use std::path::Path;

use log::debug;
use ndarray::{Array1, Zip};

use crate::config::ClassifierKind;
use crate::error::{Co2Error, Co2Result};
use crate::reader::{parse_float_column, read_csv_as_strings};
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One or more closed rings. The closing vertex is optional.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    parts: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new<P: Into<Point>>(vertices: impl IntoIterator<Item = P>) -> Self {
        Self::multi([vertices])
    }

    pub fn multi<P, R>(parts: impl IntoIterator<Item = R>) -> Self
    where
        P: Into<Point>,
        R: IntoIterator<Item = P>,
    {
        let parts = parts
            .into_iter()
            .map(|ring| {
                let mut ring: Vec<Point> = ring.into_iter().map(Into::into).collect();
                if ring.len() > 1 && ring.first() == ring.last() {
                    ring.pop();
                }
                ring
            })
            .collect();
        Self { parts }
    }

    pub fn parts(&self) -> &[Vec<Point>] {
        &self.parts
    }

    /// Sum of the part areas (shoelace formula).
    pub fn area(&self) -> f64 {
        self.parts
            .iter()
            .map(|ring| {
                let n = ring.len();
                let twice: f64 = (0..n)
                    .map(|i| {
                        let (a, b) = (ring[i], ring[(i + 1) % n]);
                        a.x * b.y - b.x * a.y
                    })
                    .sum();
                twice.abs() / 2.0
            })
            .sum()
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.parts.iter().any(|ring| ring_contains(ring, x, y))
    }

    pub fn classifier(&self, kind: ClassifierKind) -> Box<dyn PointClassifier + '_> {
        match kind {
            ClassifierKind::Prepared => Box::new(PreparedPolygon::new(self)),
            ClassifierKind::Reference => Box::new(RayCastingClassifier::new(self)),
        }
    }
}

/// Whether a horizontal ray from `(x, y)` towards +x crosses the edge `a -> b`.
#[inline]
pub fn edge_crossed(a: Point, b: Point, x: f64, y: f64) -> bool {
    (a.y > y) != (b.y > y) && x < (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x
}

fn ring_contains(ring: &[Point], x: f64, y: f64) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        if edge_crossed(ring[j], ring[i], x, y) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Classify cell centres against a polygon.
pub trait PointClassifier {
    fn classify(&self, x: &Array1<f64>, y: &Array1<f64>) -> Array1<bool>;
}

pub struct RayCastingClassifier<'a> {
    polygon: &'a Polygon,
}

impl<'a> RayCastingClassifier<'a> {
    pub fn new(polygon: &'a Polygon) -> Self {
        Self { polygon }
    }
}

impl PointClassifier for RayCastingClassifier<'_> {
    fn classify(&self, x: &Array1<f64>, y: &Array1<f64>) -> Array1<bool> {
        let mut inside = Array1::from_elem(x.len(), false);
        for i in 0..x.len() {
            inside[i] = self.polygon.contains(x[i], y[i]);
        }
        inside
    }
}

struct PreparedPart {
    edges: Vec<(Point, Point)>,
    min_y: f64,
    max_y: f64,
}

impl PreparedPart {
    fn new(ring: &[Point]) -> Option<Self> {
        if ring.len() < 3 {
            return None;
        }
        let edges = (0..ring.len())
            .map(|i| (ring[(i + ring.len() - 1) % ring.len()], ring[i]))
            .collect();
        let min_y = ring.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = ring.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Some(Self { edges, min_y, max_y })
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        // Outside the y-band no edge straddles the ray.
        if y < self.min_y || y > self.max_y {
            return false;
        }
        self.edges
            .iter()
            .filter(|(a, b)| edge_crossed(*a, *b, x, y))
            .count()
            % 2
            == 1
    }
}

pub struct PreparedPolygon {
    parts: Vec<PreparedPart>,
}

impl PreparedPolygon {
    pub fn new(polygon: &Polygon) -> Self {
        Self {
            parts: polygon
                .parts()
                .iter()
                .filter_map(|ring| PreparedPart::new(ring))
                .collect(),
        }
    }
}

impl PointClassifier for PreparedPolygon {
    fn classify(&self, x: &Array1<f64>, y: &Array1<f64>) -> Array1<bool> {
        Zip::from(x)
            .and(y)
            .map_collect(|&px, &py| self.parts.iter().any(|part| part.contains(px, py)))
    }
}

/// Read a polygon from a CSV file. The header line is skipped and the first
/// two columns are X and Y. A `POLY_ID` column splits the vertices into parts.
pub fn read_polygon(path: &Path) -> Co2Result<Polygon> {
    let df = read_csv_as_strings(path)?;
    let names: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.to_string())
        .collect();
    if names.len() < 2 {
        return Err(Co2Error::InvalidData(format!(
            "Polygon file {} needs at least two columns",
            path.display()
        )));
    }

    let xs = parse_float_column(&df, &names[0], path)?;
    let ys = parse_float_column(&df, &names[1], path)?;
    let vertices = xs.iter().zip(ys.iter()).map(|(&x, &y)| Point { x, y });

    let poly_id = names
        .iter()
        .find(|n| n.eq_ignore_ascii_case(schema::polygon::POLY_ID));
    let polygon = match poly_id {
        Some(id_col) => {
            let ids = df.column(id_col)?.str()?;
            let mut parts: Vec<(String, Vec<Point>)> = Vec::new();
            for (id, vertex) in ids.into_iter().zip(vertices) {
                let id = id.unwrap_or_default().trim().to_string();
                match parts.last_mut() {
                    Some((last, ring)) if *last == id => ring.push(vertex),
                    _ => parts.push((id, vec![vertex])),
                }
            }
            Polygon::multi(parts.into_iter().map(|(_, ring)| ring))
        }
        None => Polygon::new(vertices),
    };
    debug!(
        "Read polygon with {} part(s) from {}",
        polygon.parts().len(),
        path.display()
    );
    Ok(polygon)
}
