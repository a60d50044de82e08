// crates/areadb-core/src/codec/topojson.rs

//! # Topology Export
//!
//! Converts the feature collection into a topology where shared boundary
//! segments are stored once as arcs and geometries reference arcs by index.
//!
//! ## Algorithm
//! 1. **Extract:** every line and polygon ring becomes an indexed line.
//! 2. **Junctions:** a position is a junction when it ends a line, or when
//!    it is reached from different neighbour pairs by different lines.
//! 3. **Cut:** rings are rotated to start at a junction (or, without one,
//!    at their smallest position) and every line is cut at its junctions.
//! 4. **Dedup:** identical arcs are stored once; an arc that matches an
//!    existing one backwards is referenced as `!index` (that is `-index - 1`).
//!
//! Properties and ids are copied unchanged onto the topology objects.

use crate::error::{AreaError, Result};
use crate::geometry::{FeatureCollection, FeatureId, Geometry, Position, Properties};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyOptions {
    /// Grid size for quantized output; `None` keeps exact coordinates.
    pub quantization: Option<u32>,
    /// Key of the single object in `objects`.
    pub object_name: String,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        TopologyOptions {
            quantization: None,
            object_name: "collection".into(),
        }
    }
}

// -----------------------------------------------------------------------------
// OUTPUT MODEL
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    pub objects: BTreeMap<String, TopoGeometry>,
    pub arcs: Vec<Vec<ArcPoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArcPoint {
    Exact([f64; 2]),
    Quantized([i64; 2]),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArcRefs {
    Line(Vec<i64>),
    Rings(Vec<Vec<i64>>),
    Polygons(Vec<Vec<Vec<i64>>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TopoCoordinates {
    One(ArcPoint),
    Many(Vec<ArcPoint>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopoGeometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arcs: Option<ArcRefs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<TopoCoordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometries: Option<Vec<TopoGeometry>>,
    #[serde(skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
}

impl TopoGeometry {
    fn new(kind: &'static str) -> Self {
        TopoGeometry {
            kind,
            id: None,
            arcs: None,
            coordinates: None,
            geometries: None,
            properties: Properties::new(),
        }
    }
}

// -----------------------------------------------------------------------------
// ENTRY POINTS
// -----------------------------------------------------------------------------

pub fn encode(model: &FeatureCollection, options: &TopologyOptions) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&build(model, options)?)?)
}

pub fn build(model: &FeatureCollection, options: &TopologyOptions) -> Result<Topology> {
    let bounds = model.bounds();
    let quantizer = match options.quantization {
        None => Quantizer::Exact,
        Some(n) if n < 2 => {
            return Err(AreaError::InvalidData(format!(
                "quantization must be at least 2, got {n}"
            )))
        }
        Some(n) => {
            let (x0, y0, x1, y1) = bounds
                .map(|b| (b.min_longitude, b.min_latitude, b.max_longitude, b.max_latitude))
                .unwrap_or((0.0, 0.0, 0.0, 0.0));
            let step = |lo: f64, hi: f64| {
                if hi > lo {
                    (hi - lo) / f64::from(n - 1)
                } else {
                    1.0
                }
            };
            Quantizer::Grid {
                x0,
                y0,
                kx: step(x0, x1),
                ky: step(y0, y1),
            }
        }
    };

    // 1. Extract
    let mut lines = Lines::default();
    let shapes: Vec<Shape> = model
        .features
        .iter()
        .map(|f| lines.shape(&f.geometry))
        .collect();

    // 2. Junctions
    let junctions = lines.junctions();

    // 3. Cut + 4. Dedup
    let mut table = ArcTable::default();
    let line_arcs: Vec<Vec<i64>> = lines
        .0
        .iter()
        .map(|line| {
            cut(line, &junctions)
                .into_iter()
                .map(|arc| table.intern(arc))
                .collect()
        })
        .collect();

    tracing::debug!(
        lines = lines.0.len(),
        junctions = junctions.len(),
        arcs = table.arcs.len(),
        "built topology"
    );

    let geometries = model
        .features
        .iter()
        .zip(&shapes)
        .map(|(feature, shape)| {
            let mut g = shape.to_topo(&line_arcs, &quantizer);
            g.id = feature.id.clone();
            g.properties = feature.properties.clone();
            g
        })
        .collect();

    let mut collection = TopoGeometry::new("GeometryCollection");
    collection.geometries = Some(geometries);

    Ok(Topology {
        kind: "Topology",
        bbox: bounds.map(|b| b.to_geojson()),
        transform: quantizer.transform(),
        objects: BTreeMap::from([(options.object_name.clone(), collection)]),
        arcs: table.arcs.iter().map(|arc| quantizer.arc(arc)).collect(),
    })
}

// -----------------------------------------------------------------------------
// EXTRACTION
// -----------------------------------------------------------------------------

type Key = (u64, u64);

fn key(p: &Position) -> Key {
    // -0.0 and 0.0 are the same position.
    let bits = |v: f64| if v == 0.0 { 0f64.to_bits() } else { v.to_bits() };
    (bits(p.x), bits(p.y))
}

struct Line {
    positions: Vec<Position>,
    /// Closed ring of at least four positions.
    ring: bool,
}

#[derive(Default)]
struct Lines(Vec<Line>);

enum Shape {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(usize),
    MultiLineString(Vec<usize>),
    Polygon(Vec<usize>),
    MultiPolygon(Vec<Vec<usize>>),
    Collection(Vec<Shape>),
}

impl Lines {
    fn add(&mut self, positions: &[Position], ring: bool) -> usize {
        let ring = ring && positions.len() >= 4 && positions.first() == positions.last();
        self.0.push(Line {
            positions: positions.to_vec(),
            ring,
        });
        self.0.len() - 1
    }

    fn rings(&mut self, rings: &[Vec<Position>]) -> Vec<usize> {
        rings.iter().map(|r| self.add(r, true)).collect()
    }

    fn shape(&mut self, geometry: &Geometry) -> Shape {
        match geometry {
            Geometry::Point { coordinates } => Shape::Point(*coordinates),
            Geometry::MultiPoint { coordinates } => Shape::MultiPoint(coordinates.clone()),
            Geometry::LineString { coordinates } => Shape::LineString(self.add(coordinates, false)),
            Geometry::MultiLineString { coordinates } => Shape::MultiLineString(
                coordinates.iter().map(|l| self.add(l, false)).collect(),
            ),
            Geometry::Polygon { coordinates } => Shape::Polygon(self.rings(coordinates)),
            Geometry::MultiPolygon { coordinates } => {
                Shape::MultiPolygon(coordinates.iter().map(|p| self.rings(p)).collect())
            }
            Geometry::GeometryCollection { geometries } => {
                Shape::Collection(geometries.iter().map(|g| self.shape(g)).collect())
            }
        }
    }

    fn junctions(&self) -> HashSet<Key> {
        // `None` once a position was seen with two different neighbour pairs.
        let mut neighbours: HashMap<Key, Option<(Key, Key)>> = HashMap::new();
        let mut junctions = HashSet::new();

        let mut record = |p: Key, a: Key, b: Key| {
            let pair = if a <= b { (a, b) } else { (b, a) };
            neighbours
                .entry(p)
                .and_modify(|seen| {
                    if *seen != Some(pair) {
                        *seen = None;
                    }
                })
                .or_insert(Some(pair));
        };

        for line in &self.0 {
            let keys: Vec<Key> = line.positions.iter().map(key).collect();
            if line.ring {
                let open = &keys[..keys.len() - 1];
                let n = open.len();
                for i in 0..n {
                    record(open[i], open[(i + n - 1) % n], open[(i + 1) % n]);
                }
            } else {
                if let (Some(first), Some(last)) = (keys.first(), keys.last()) {
                    junctions.insert(*first);
                    junctions.insert(*last);
                }
                for w in keys.windows(3) {
                    record(w[1], w[0], w[2]);
                }
            }
        }

        junctions.extend(
            neighbours
                .into_iter()
                .filter(|(_, seen)| seen.is_none())
                .map(|(k, _)| k),
        );
        junctions
    }
}

// -----------------------------------------------------------------------------
// CUTTING + DEDUP
// -----------------------------------------------------------------------------

fn cut(line: &Line, junctions: &HashSet<Key>) -> Vec<Vec<Position>> {
    if !line.ring {
        return split(&line.positions, junctions);
    }

    let open = &line.positions[..line.positions.len() - 1];
    let first_junction = open.iter().position(|p| junctions.contains(&key(p)));
    let start = first_junction.unwrap_or_else(|| smallest(open));

    let mut rotated: Vec<Position> = open[start..].iter().chain(&open[..start]).copied().collect();
    rotated.push(rotated[0]);

    if first_junction.is_none() {
        vec![rotated]
    } else {
        split(&rotated, junctions)
    }
}

/// Cuts at every interior junction; the junction ends one arc and starts
/// the next.
fn split(positions: &[Position], junctions: &HashSet<Key>) -> Vec<Vec<Position>> {
    if positions.is_empty() {
        return Vec::new();
    }
    let mut arcs = Vec::new();
    let mut start = 0;
    for i in 1..positions.len().saturating_sub(1) {
        if junctions.contains(&key(&positions[i])) {
            arcs.push(positions[start..=i].to_vec());
            start = i;
        }
    }
    arcs.push(positions[start..].to_vec());
    arcs
}

fn smallest(positions: &[Position]) -> usize {
    positions
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[derive(Default)]
struct ArcTable {
    arcs: Vec<Vec<Position>>,
    index: HashMap<Vec<Key>, usize>,
}

impl ArcTable {
    fn intern(&mut self, arc: Vec<Position>) -> i64 {
        let keys: Vec<Key> = arc.iter().map(key).collect();
        if let Some(&i) = self.index.get(&keys) {
            return i as i64;
        }
        let reversed: Vec<Key> = keys.iter().rev().copied().collect();
        if let Some(&i) = self.index.get(&reversed) {
            return !(i as i64);
        }
        let i = self.arcs.len();
        self.index.insert(keys, i);
        self.arcs.push(arc);
        i as i64
    }
}

// -----------------------------------------------------------------------------
// ENCODING
// -----------------------------------------------------------------------------

enum Quantizer {
    Exact,
    Grid { x0: f64, y0: f64, kx: f64, ky: f64 },
}

impl Quantizer {
    fn transform(&self) -> Option<Transform> {
        match *self {
            Quantizer::Exact => None,
            Quantizer::Grid { x0, y0, kx, ky } => Some(Transform {
                scale: [kx, ky],
                translate: [x0, y0],
            }),
        }
    }

    fn grid(&self, p: &Position) -> [i64; 2] {
        match *self {
            Quantizer::Exact => [0, 0],
            Quantizer::Grid { x0, y0, kx, ky } => [
                ((p.x - x0) / kx).round() as i64,
                ((p.y - y0) / ky).round() as i64,
            ],
        }
    }

    fn point(&self, p: &Position) -> ArcPoint {
        match self {
            Quantizer::Exact => ArcPoint::Exact([p.x, p.y]),
            Quantizer::Grid { .. } => ArcPoint::Quantized(self.grid(p)),
        }
    }

    /// Quantized arcs are delta-encoded and drop repeated grid cells.
    fn arc(&self, arc: &[Position]) -> Vec<ArcPoint> {
        if let Quantizer::Exact = self {
            return arc.iter().map(|p| self.point(p)).collect();
        }
        let mut out = Vec::with_capacity(arc.len());
        let mut previous: Option<[i64; 2]> = None;
        for p in arc {
            let cell = self.grid(p);
            match previous {
                Some(prev) if prev == cell => continue,
                Some(prev) => out.push(ArcPoint::Quantized([cell[0] - prev[0], cell[1] - prev[1]])),
                None => out.push(ArcPoint::Quantized(cell)),
            }
            previous = Some(cell);
        }
        if out.len() == 1 && arc.len() > 1 {
            out.push(ArcPoint::Quantized([0, 0]));
        }
        out
    }
}

impl Shape {
    fn to_topo(&self, line_arcs: &[Vec<i64>], q: &Quantizer) -> TopoGeometry {
        let refs = |ids: &[usize]| arc_refs(line_arcs, ids);
        match self {
            Shape::Point(p) => TopoGeometry {
                coordinates: Some(TopoCoordinates::One(q.point(p))),
                ..TopoGeometry::new("Point")
            },
            Shape::MultiPoint(ps) => TopoGeometry {
                coordinates: Some(TopoCoordinates::Many(ps.iter().map(|p| q.point(p)).collect())),
                ..TopoGeometry::new("MultiPoint")
            },
            Shape::LineString(i) => TopoGeometry {
                arcs: Some(ArcRefs::Line(line_arcs[*i].clone())),
                ..TopoGeometry::new("LineString")
            },
            Shape::MultiLineString(ids) => TopoGeometry {
                arcs: Some(ArcRefs::Rings(refs(ids.as_slice()))),
                ..TopoGeometry::new("MultiLineString")
            },
            Shape::Polygon(ids) => TopoGeometry {
                arcs: Some(ArcRefs::Rings(refs(ids.as_slice()))),
                ..TopoGeometry::new("Polygon")
            },
            Shape::MultiPolygon(polys) => TopoGeometry {
                arcs: Some(ArcRefs::Polygons(polys.iter().map(|ids| refs(ids.as_slice())).collect())),
                ..TopoGeometry::new("MultiPolygon")
            },
            Shape::Collection(parts) => TopoGeometry {
                geometries: Some(parts.iter().map(|s| s.to_topo(line_arcs, q)).collect()),
                ..TopoGeometry::new("GeometryCollection")
            },
        }
    }
}

fn arc_refs(line_arcs: &[Vec<i64>], ids: &[usize]) -> Vec<Vec<i64>> {
    ids.iter().map(|&i| line_arcs[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Feature;

    fn square(x: f64) -> Geometry {
        Geometry::polygon(vec![vec![
            Position::new(x, 0.0),
            Position::new(x + 1.0, 0.0),
            Position::new(x + 1.0, 1.0),
            Position::new(x, 1.0),
            Position::new(x, 0.0),
        ]])
    }

    fn polygon_refs(g: &TopoGeometry) -> Vec<i64> {
        match &g.arcs {
            Some(ArcRefs::Rings(rings)) => rings.concat(),
            other => panic!("unexpected arcs {other:?}"),
        }
    }

    fn features(topology: &Topology) -> &[TopoGeometry] {
        topology.objects["collection"].geometries.as_deref().unwrap()
    }

    #[test]
    fn adjacent_squares_share_one_arc() {
        let model = FeatureCollection::from_features(vec![
            Feature::new(square(0.0)).with_property("name", "west"),
            Feature::new(square(1.0)).with_property("name", "east"),
        ]);
        let topology = build(&model, &TopologyOptions::default()).unwrap();

        // Shared edge + the rest of each square.
        assert_eq!(topology.arcs.len(), 3);

        let west = polygon_refs(&features(&topology)[0]);
        let east = polygon_refs(&features(&topology)[1]);
        let shared: Vec<i64> = west
            .iter()
            .filter(|&&w| east.iter().any(|&e| e == w || e == !w))
            .copied()
            .collect();
        assert_eq!(shared.len(), 1);
        assert!(east.iter().any(|&e| e < 0), "east walks the shared arc backwards");
    }

    #[test]
    fn isolated_ring_is_one_closed_arc() {
        let model = FeatureCollection::from_features(vec![Feature::new(square(5.0))]);
        let topology = build(&model, &TopologyOptions::default()).unwrap();
        assert_eq!(topology.arcs.len(), 1);
        let arc = &topology.arcs[0];
        assert_eq!(arc.len(), 5);
        assert_eq!(arc.first(), arc.last());
    }

    #[test]
    fn properties_and_ids_survive() {
        let mut feature = Feature::new(Geometry::point(3.0, 4.0))
            .with_property("name", "S9")
            .with_property("count", 2i64);
        feature.id = Some(FeatureId::String("a".into()));
        let model = FeatureCollection::from_features(vec![feature.clone()]);

        let topology = build(&model, &TopologyOptions::default()).unwrap();
        let point = &features(&topology)[0];
        assert_eq!(point.properties, feature.properties);
        assert_eq!(point.id, feature.id);
        assert_eq!(point.coordinates, Some(TopoCoordinates::One(ArcPoint::Exact([3.0, 4.0]))));
        assert!(topology.transform.is_none());
    }

    #[test]
    fn line_crossing_a_ring_cuts_it() {
        let model = FeatureCollection::from_features(vec![
            Feature::new(square(0.0)),
            // Ends on the square's corner (1, 1).
            Feature::new(Geometry::line_string(vec![Position::new(1.0, 1.0), Position::new(2.0, 2.0)])),
        ]);
        let topology = build(&model, &TopologyOptions::default()).unwrap();
        // The ring starts at the junction and stays a single arc.
        assert_eq!(topology.arcs.len(), 2);
        assert_eq!(topology.arcs[0][0], ArcPoint::Exact([1.0, 1.0]));
    }

    #[test]
    fn quantized_output_is_delta_encoded() {
        let model = FeatureCollection::from_features(vec![Feature::new(square(0.0))]);
        let topology = build(
            &model,
            &TopologyOptions {
                quantization: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            topology.transform,
            Some(Transform {
                scale: [1.0, 1.0],
                translate: [0.0, 0.0]
            })
        );
        assert_eq!(
            topology.arcs[0],
            vec![
                ArcPoint::Quantized([0, 0]),
                ArcPoint::Quantized([1, 0]),
                ArcPoint::Quantized([0, 1]),
                ArcPoint::Quantized([-1, 0]),
                ArcPoint::Quantized([0, -1]),
            ]
        );
        assert!(build(&model, &TopologyOptions { quantization: Some(1), ..Default::default() }).is_err());
    }

    #[test]
    fn serializes_as_topology_document() {
        let model = FeatureCollection::from_features(vec![Feature::new(square(0.0))]);
        let value: serde_json::Value =
            serde_json::from_slice(&encode(&model, &TopologyOptions::default()).unwrap()).unwrap();
        assert_eq!(value["type"], "Topology");
        assert_eq!(value["bbox"], serde_json::json!([0.0, 0.0, 1.0, 1.0]));
        assert_eq!(value["objects"]["collection"]["type"], "GeometryCollection");
        assert_eq!(
            value["objects"]["collection"]["geometries"][0]["arcs"],
            serde_json::json!([[0]])
        );
    }
}
