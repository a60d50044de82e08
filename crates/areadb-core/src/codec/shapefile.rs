// crates/areadb-core/src/codec/shapefile.rs

//! # Shapefile Export
//!
//! Features are sorted into one layer per shape type; every non-empty
//! layer is written as `.shp` (geometry), `.shx` (index), `.dbf`
//! (attributes), `.prj` (WGS84) and `.cpg` (text encoding), and all parts
//! are bundled into a single zip archive.
//!
//! | Geometry                       | Layer         | Shape type |
//! |--------------------------------|---------------|------------|
//! | Point                          | `points`      | 1          |
//! | MultiPoint                     | `multipoints` | 8          |
//! | LineString, MultiLineString    | `lines`       | 3          |
//! | Polygon, MultiPolygon          | `polygons`    | 5          |
//!
//! Collections are split into their members, which inherit the feature's
//! properties. Polygon outer rings are written clockwise and holes
//! counter-clockwise.

use super::archive::{self, ZipEntry};
use super::dbf;
use crate::error::{AreaError, Result};
use crate::geometry::{FeatureCollection, Geometry, Position, Properties};

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_LEN: usize = 100;

pub const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["Degree",0.017453292519943295]]"#;
const CODE_PAGE: &str = "UTF-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Point = 1,
    PolyLine = 3,
    Polygon = 5,
    MultiPoint = 8,
}

impl ShapeType {
    pub fn layer_name(self) -> &'static str {
        match self {
            ShapeType::Point => "points",
            ShapeType::MultiPoint => "multipoints",
            ShapeType::PolyLine => "lines",
            ShapeType::Polygon => "polygons",
        }
    }
}

enum Shape {
    Point(Position),
    MultiPoint(Vec<Position>),
    Parts(Vec<Vec<Position>>),
}

struct Layer<'a> {
    kind: ShapeType,
    shapes: Vec<Shape>,
    rows: Vec<&'a Properties>,
}

impl<'a> Layer<'a> {
    fn new(kind: ShapeType) -> Self {
        Layer {
            kind,
            shapes: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, shape: Shape, row: &'a Properties) {
        self.shapes.push(shape);
        self.rows.push(row);
    }
}

/// Encodes the collection as a zipped shapefile set.
///
/// Fails with [`AreaError::EmptyCollection`] when no feature has a
/// geometry a shapefile can hold.
pub fn encode(model: &FeatureCollection) -> Result<Vec<u8>> {
    let mut layers = [
        Layer::new(ShapeType::Point),
        Layer::new(ShapeType::MultiPoint),
        Layer::new(ShapeType::PolyLine),
        Layer::new(ShapeType::Polygon),
    ];
    for feature in &model.features {
        sort_into(&mut layers, &feature.geometry, &feature.properties);
    }

    let mut entries = Vec::new();
    for layer in layers.iter().filter(|l| !l.shapes.is_empty()) {
        let name = layer.kind.layer_name();
        let (shp, shx) = write_shapes(layer.kind, &layer.shapes);
        tracing::debug!(layer = name, records = layer.shapes.len(), "wrote shapefile layer");

        entries.push(ZipEntry::new(format!("{name}.shp"), shp));
        entries.push(ZipEntry::new(format!("{name}.shx"), shx));
        entries.push(ZipEntry::new(format!("{name}.dbf"), dbf::write(&layer.rows)));
        entries.push(ZipEntry::new(format!("{name}.prj"), WGS84_PRJ.as_bytes().to_vec()));
        entries.push(ZipEntry::new(format!("{name}.cpg"), CODE_PAGE.as_bytes().to_vec()));
    }

    if entries.is_empty() {
        return Err(AreaError::EmptyCollection { format: "Shapefile" });
    }
    archive::zip(&entries)
}

// Indices into the layer array built by `encode`.
const POINTS: usize = 0;
const MULTIPOINTS: usize = 1;
const LINES: usize = 2;
const POLYGONS: usize = 3;

fn sort_into<'a>(layers: &mut [Layer<'a>; 4], geometry: &Geometry, row: &'a Properties) {
    match geometry {
        Geometry::Point { coordinates } => layers[POINTS].push(Shape::Point(*coordinates), row),
        Geometry::MultiPoint { coordinates } if !coordinates.is_empty() => {
            layers[MULTIPOINTS].push(Shape::MultiPoint(coordinates.clone()), row)
        }
        Geometry::LineString { coordinates } => {
            let parts = non_empty([coordinates.clone()]);
            if !parts.is_empty() {
                layers[LINES].push(Shape::Parts(parts), row);
            }
        }
        Geometry::MultiLineString { coordinates } => {
            let parts = non_empty(coordinates.iter().cloned());
            if !parts.is_empty() {
                layers[LINES].push(Shape::Parts(parts), row);
            }
        }
        Geometry::Polygon { coordinates } => {
            let parts = oriented(coordinates);
            if !parts.is_empty() {
                layers[POLYGONS].push(Shape::Parts(parts), row);
            }
        }
        Geometry::MultiPolygon { coordinates } => {
            let parts: Vec<_> = coordinates.iter().flat_map(|p| oriented(p)).collect();
            if !parts.is_empty() {
                layers[POLYGONS].push(Shape::Parts(parts), row);
            }
        }
        Geometry::GeometryCollection { geometries } => {
            for g in geometries {
                sort_into(layers, g, row);
            }
        }
        Geometry::MultiPoint { .. } => {}
    }
}

fn non_empty(parts: impl IntoIterator<Item = Vec<Position>>) -> Vec<Vec<Position>> {
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Outer ring clockwise, holes counter-clockwise. A polygon whose outer
/// ring is empty yields no parts; its holes are not promoted.
fn oriented(rings: &[Vec<Position>]) -> Vec<Vec<Position>> {
    if rings.first().map_or(true, |outer| outer.is_empty()) {
        return Vec::new();
    }
    rings
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.is_empty())
        .map(|(i, ring)| {
            let mut ring = ring.clone();
            let clockwise = signed_area(&ring) < 0.0;
            if (i == 0) != clockwise {
                ring.reverse();
            }
            ring
        })
        .collect()
}

/// Shoelace sum; positive for counter-clockwise rings.
fn signed_area(ring: &[Position]) -> f64 {
    ring.windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>()
        / 2.0
}

// -----------------------------------------------------------------------------
// .SHP / .SHX
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Extent {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

impl Extent {
    fn of<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Self {
        positions.into_iter().fold(
            Extent {
                xmin: f64::INFINITY,
                ymin: f64::INFINITY,
                xmax: f64::NEG_INFINITY,
                ymax: f64::NEG_INFINITY,
            },
            |e, p| Extent {
                xmin: e.xmin.min(p.x),
                ymin: e.ymin.min(p.y),
                xmax: e.xmax.max(p.x),
                ymax: e.ymax.max(p.y),
            },
        )
    }

    fn union(self, other: Self) -> Self {
        Extent {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        for v in [self.xmin, self.ymin, self.xmax, self.ymax] {
            put_f64_le(out, v);
        }
    }
}

impl Shape {
    fn extent(&self) -> Extent {
        match self {
            Shape::Point(p) => Extent::of([p]),
            Shape::MultiPoint(ps) => Extent::of(ps),
            Shape::Parts(parts) => Extent::of(parts.iter().flatten()),
        }
    }

    fn content(&self, kind: ShapeType) -> Vec<u8> {
        let mut c = Vec::new();
        put_i32_le(&mut c, kind as i32);
        match self {
            Shape::Point(p) => {
                put_f64_le(&mut c, p.x);
                put_f64_le(&mut c, p.y);
            }
            Shape::MultiPoint(ps) => {
                self.extent().write(&mut c);
                put_i32_le(&mut c, ps.len() as i32);
                for p in ps {
                    put_f64_le(&mut c, p.x);
                    put_f64_le(&mut c, p.y);
                }
            }
            Shape::Parts(parts) => {
                self.extent().write(&mut c);
                put_i32_le(&mut c, parts.len() as i32);
                put_i32_le(&mut c, parts.iter().map(Vec::len).sum::<usize>() as i32);
                let mut start = 0;
                for part in parts {
                    put_i32_le(&mut c, start as i32);
                    start += part.len();
                }
                for p in parts.iter().flatten() {
                    put_f64_le(&mut c, p.x);
                    put_f64_le(&mut c, p.y);
                }
            }
        }
        c
    }
}

/// Returns the `.shp` and `.shx` bytes of one layer.
fn write_shapes(kind: ShapeType, shapes: &[Shape]) -> (Vec<u8>, Vec<u8>) {
    let mut body = Vec::new();
    let mut index = Vec::new();

    for (i, shape) in shapes.iter().enumerate() {
        let content = shape.content(kind);
        let offset = HEADER_LEN + body.len();

        // Offsets and lengths are counted in 16-bit words.
        put_i32_be(&mut index, (offset / 2) as i32);
        put_i32_be(&mut index, (content.len() / 2) as i32);

        put_i32_be(&mut body, i as i32 + 1);
        put_i32_be(&mut body, (content.len() / 2) as i32);
        body.extend_from_slice(&content);
    }

    let extent = shapes
        .iter()
        .map(Shape::extent)
        .reduce(Extent::union)
        .unwrap_or(Extent {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 0.0,
            ymax: 0.0,
        });

    let mut shp = header(kind, HEADER_LEN + body.len(), extent);
    shp.extend_from_slice(&body);
    let mut shx = header(kind, HEADER_LEN + index.len(), extent);
    shx.extend_from_slice(&index);
    (shp, shx)
}

fn header(kind: ShapeType, file_len: usize, extent: Extent) -> Vec<u8> {
    let mut h = Vec::with_capacity(HEADER_LEN);
    put_i32_be(&mut h, FILE_CODE);
    h.extend_from_slice(&[0u8; 20]);
    put_i32_be(&mut h, (file_len / 2) as i32);
    put_i32_le(&mut h, VERSION);
    put_i32_le(&mut h, kind as i32);
    extent.write(&mut h);
    // z and m ranges
    h.extend_from_slice(&[0u8; 32]);
    h
}

fn put_i32_be(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn put_i32_le(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_f64_le(out: &mut Vec<u8>, v: f64) {
    out.extend_from_slice(&v.to_le_bytes());
}
