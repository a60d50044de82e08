// crates/areadb-core/src/geometry/mod.rs

//! # Geometry Document Model
//!
//! The canonical feature collection every codec reads from or writes into.
//! Serialization follows the GeoJSON grammar, so the canonical JSON codec is
//! plain `serde_json` over these types.
//!
//! **Structure:** `FeatureCollection` -> `Vec<Feature>` -> (`Geometry`, `Properties`)

pub mod bounds;
pub mod flatten;
pub mod scalar;

pub use bounds::{BoundingBox, Centroid};
pub use scalar::Scalar;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Feature attributes. Keys are unique; ordering is by key so that every
/// encoder sees the same, deterministic order.
pub type Properties = BTreeMap<String, Scalar>;

// -----------------------------------------------------------------------------
// POSITION
// -----------------------------------------------------------------------------

/// A coordinate in `x` (longitude), `y` (latitude) and optional `z` order.
///
/// Serialized as a JSON array of two or three numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y, z: None }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z: Some(z) }
    }

    /// Build from latitude/longitude order, as boundary data is usually quoted.
    pub fn from_lat_lon(latitude: f64, longitude: f64) -> Self {
        Position::new(longitude, latitude)
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f64::is_finite)
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.z {
            Some(z) => [self.x, self.y, z].serialize(serializer),
            None => [self.x, self.y].serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        match values.as_slice() {
            [x, y] => Ok(Position::new(*x, *y)),
            [x, y, z] => Ok(Position::with_z(*x, *y, *z)),
            _ => Err(D::Error::invalid_length(
                values.len(),
                &"a position of 2 or 3 numbers",
            )),
        }
    }
}

// -----------------------------------------------------------------------------
// GEOMETRY
// -----------------------------------------------------------------------------

/// Tagged geometry variant. Polygons hold the outer ring first, then holes;
/// rings are closed (first == last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPoint { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point {
            coordinates: Position::new(x, y),
        }
    }

    pub fn line_string(coordinates: Vec<Position>) -> Self {
        Geometry::LineString { coordinates }
    }

    pub fn polygon(rings: Vec<Vec<Position>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// The GeoJSON type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::LineString { .. } => "LineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }

    /// Every position of the geometry, depth-first.
    pub fn positions(&self) -> Box<dyn Iterator<Item = &Position> + '_> {
        match self {
            Geometry::Point { coordinates } => Box::new(std::iter::once(coordinates)),
            Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
                Box::new(coordinates.iter())
            }
            Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
                Box::new(coordinates.iter().flatten())
            }
            Geometry::MultiPolygon { coordinates } => {
                Box::new(coordinates.iter().flatten().flatten())
            }
            Geometry::GeometryCollection { geometries } => {
                Box::new(geometries.iter().flat_map(|g| g.positions()))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions().next().is_none()
    }

    /// Envelope of all finite positions, `None` if there are none.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_finite(self.positions())
    }
}

// -----------------------------------------------------------------------------
// FEATURES
// -----------------------------------------------------------------------------

/// Optional feature identifier (GeoJSON allows strings or numbers).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(serde_json::Number),
    String(String),
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{n}"),
            FeatureId::String(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    pub geometry: Geometry,
    #[serde(default, deserialize_with = "properties_or_null")]
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Feature {
            id: None,
            bbox: None,
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Scalar> {
        self.properties.get(key)
    }
}

/// `"properties": null` is valid GeoJSON and reads as an empty map.
fn properties_or_null<'de, D>(deserializer: D) -> std::result::Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Properties>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The canonical model handed to exporters and returned by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_features(features: Vec<Feature>) -> Self {
        FeatureCollection {
            bbox: None,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Strict parse of a GeoJSON FeatureCollection.
    ///
    /// Use [`crate::normalize`] for lenient input (bare geometries, features,
    /// unparsable members).
    pub fn from_json_slice(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json_vec(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Extent of every feature ("zoom to features").
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounds())
            .reduce(BoundingBox::union)
    }

    /// Adds `bbox` members to the collection and every non-empty feature.
    pub fn bboxify(&mut self) {
        for feature in &mut self.features {
            feature.bbox = feature.geometry.bounds().map(|b| b.to_geojson());
        }
        self.bbox = self.bounds().map(|b| b.to_geojson());
    }
}

// -----------------------------------------------------------------------------
// RING HELPERS
// -----------------------------------------------------------------------------

/// Closes a ring in place by repeating its first position.
pub fn close_ring(ring: &mut Vec<Position>) {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last()) {
        if first != *last {
            ring.push(first);
        }
    }
}

pub fn is_closed(ring: &[Position]) -> bool {
    ring.first() == ring.last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> Geometry {
        Geometry::polygon(vec![vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(1.0, 1.0),
            Position::new(0.0, 1.0),
            Position::new(0.0, 0.0),
        ]])
    }

    #[test]
    fn geometry_uses_geojson_grammar() {
        let value = serde_json::to_value(Geometry::point(6.1, 52.2)).unwrap();
        assert_eq!(value, json!({"type": "Point", "coordinates": [6.1, 52.2]}));

        let parsed: Geometry =
            serde_json::from_value(json!({"type": "LineString", "coordinates": [[1, 2], [3, 4, 5]]}))
                .unwrap();
        assert_eq!(
            parsed,
            Geometry::line_string(vec![Position::new(1.0, 2.0), Position::with_z(3.0, 4.0, 5.0)])
        );
    }

    #[test]
    fn position_rejects_wrong_arity() {
        let err = serde_json::from_value::<Geometry>(json!({"type": "Point", "coordinates": [1]}));
        assert!(err.is_err());
    }

    #[test]
    fn feature_reads_null_properties_as_empty() {
        let f: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [0, 0]},
            "properties": null
        }))
        .unwrap();
        assert!(f.properties.is_empty());
    }

    #[test]
    fn empty_collection_serializes_with_empty_features() {
        let text = String::from_utf8(FeatureCollection::new().to_json_vec().unwrap()).unwrap();
        assert_eq!(text, r#"{"type":"FeatureCollection","features":[]}"#);
    }

    #[test]
    fn bboxify_sets_feature_and_collection_boxes() {
        let mut fc = FeatureCollection::from_features(vec![
            Feature::new(square()),
            Feature::new(Geometry::point(5.0, -2.0)),
        ]);
        fc.bboxify();
        assert_eq!(fc.features[0].bbox, Some(vec![0.0, 0.0, 1.0, 1.0]));
        assert_eq!(fc.bbox, Some(vec![0.0, -2.0, 5.0, 1.0]));
    }

    #[test]
    fn close_ring_repeats_first_position() {
        let mut ring = vec![Position::new(0.0, 0.0), Position::new(1.0, 0.0), Position::new(1.0, 1.0)];
        close_ring(&mut ring);
        assert_eq!(ring.len(), 4);
        assert!(is_closed(&ring));
        close_ring(&mut ring);
        assert_eq!(ring.len(), 4);
    }
}
