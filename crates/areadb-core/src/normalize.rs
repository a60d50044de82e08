// crates/areadb-core/src/normalize.rs

//! # Import Normalizer
//!
//! Coerces already-parsed input of any importable format into the canonical
//! [`FeatureCollection`]:
//!
//! - a bare geometry or bare feature becomes a one-element collection;
//! - a `GeometryCollection` becomes one sibling feature per member, each
//!   with a copy of the parent's properties;
//! - features whose geometry cannot be used are dropped and counted
//!   ([`Normalized::warning`]) instead of failing the import;
//! - polygon rings are closed.

use crate::error::{AreaError, Result};
use crate::geometry::{
    close_ring, Feature, FeatureCollection, FeatureId, Geometry, Position, Properties, Scalar,
};
use crate::raw::{KmlDocument, KmlGeometry, KmlPolygon, Placemark};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Output of a format-specific reader, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedInput {
    /// Any JSON document following the Feature/Geometry grammar.
    Json(Value),
    /// A parsed KML tree.
    Kml(KmlDocument),
    /// Loose geometries without properties (WKT).
    Geometries(Vec<Geometry>),
}

/// Result of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub collection: FeatureCollection,
    /// Input features that were dropped.
    pub dropped: usize,
}

/// Some input features could not be imported. The import itself succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{dropped} of {total} features could not be imported")]
pub struct ImportPartial {
    pub dropped: usize,
    pub total: usize,
}

impl Normalized {
    fn new(collection: FeatureCollection, dropped: usize) -> Self {
        if dropped > 0 {
            warn!(dropped, kept = collection.len(), "dropped unusable features during import");
        }
        Normalized {
            collection,
            dropped,
        }
    }

    pub fn warning(&self) -> Option<ImportPartial> {
        (self.dropped > 0).then(|| ImportPartial {
            dropped: self.dropped,
            total: self.dropped + self.collection.len(),
        })
    }

    pub fn into_collection(self) -> FeatureCollection {
        self.collection
    }
}

pub fn normalize(input: ParsedInput) -> Result<Normalized> {
    match input {
        ParsedInput::Json(value) => from_json(value),
        ParsedInput::Kml(document) => Ok(from_kml(&document)),
        ParsedInput::Geometries(geometries) => {
            let mut features = Vec::with_capacity(geometries.len());
            let mut dropped = 0;
            for geometry in geometries {
                if !extend_expanded(&mut features, Feature::new(closed(geometry))) {
                    dropped += 1;
                }
            }
            Ok(Normalized::new(FeatureCollection::from_features(features), dropped))
        }
    }
}

// -----------------------------------------------------------------------------
// JSON
// -----------------------------------------------------------------------------

fn from_json(value: Value) -> Result<Normalized> {
    let Value::Object(mut root) = value else {
        return Err(AreaError::malformed("GeoJSON", "root is not an object"));
    };
    let kind = root
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match kind.as_str() {
        "FeatureCollection" => {
            let members = match root.remove("features") {
                Some(Value::Array(members)) => members,
                _ => return Err(AreaError::malformed("GeoJSON", "missing \"features\" array")),
            };
            let mut features = Vec::with_capacity(members.len());
            let mut dropped = 0;
            for (i, member) in members.into_iter().enumerate() {
                let kept = feature_from_json(member)
                    .is_some_and(|feature| extend_expanded(&mut features, feature));
                if !kept {
                    debug!(index = i, "dropping feature without usable geometry");
                    dropped += 1;
                }
            }
            let mut collection = FeatureCollection::from_features(features);
            collection.bbox = root.remove("bbox").and_then(bbox_from_json);
            Ok(Normalized::new(collection, dropped))
        }
        "Feature" => {
            let mut features = Vec::new();
            let kept = feature_from_json(Value::Object(root))
                .is_some_and(|feature| extend_expanded(&mut features, feature));
            Ok(Normalized::new(
                FeatureCollection::from_features(features),
                usize::from(!kept),
            ))
        }
        _ => {
            let geometry = geometry_from_json(Value::Object(root)).ok_or_else(|| {
                AreaError::malformed("GeoJSON", format!("unusable root of type {kind:?}"))
            })?;
            let mut features = Vec::new();
            let kept = extend_expanded(&mut features, Feature::new(geometry));
            Ok(Normalized::new(
                FeatureCollection::from_features(features),
                usize::from(!kept),
            ))
        }
    }
}

fn feature_from_json(value: Value) -> Option<Feature> {
    let Value::Object(mut object) = value else {
        return None;
    };
    if object.get("type").and_then(Value::as_str) != Some("Feature") {
        return None;
    }
    let geometry = geometry_from_json(object.remove("geometry")?)?;

    Some(Feature {
        id: object
            .remove("id")
            .and_then(|id| serde_json::from_value::<FeatureId>(id).ok()),
        bbox: object.remove("bbox").and_then(bbox_from_json),
        geometry,
        properties: match object.remove("properties") {
            Some(Value::Object(map)) => properties_from_json(map),
            _ => Properties::new(),
        },
    })
}

fn geometry_from_json(value: Value) -> Option<Geometry> {
    serde_json::from_value::<Geometry>(value).ok().map(closed)
}

fn properties_from_json(map: Map<String, Value>) -> Properties {
    map.into_iter()
        .map(|(k, v)| (k, Scalar::from_json(v)))
        .collect()
}

fn bbox_from_json(value: Value) -> Option<Vec<f64>> {
    serde_json::from_value(value).ok()
}

// -----------------------------------------------------------------------------
// KML
// -----------------------------------------------------------------------------

fn from_kml(document: &KmlDocument) -> Normalized {
    let mut features = Vec::new();
    let mut dropped = 0;
    for placemark in document.placemarks() {
        let kept = placemark
            .geometry
            .as_ref()
            .and_then(geometry_from_kml)
            .is_some_and(|geometry| {
                let mut feature = Feature::new(closed(geometry));
                feature.properties = placemark_properties(placemark);
                extend_expanded(&mut features, feature)
            });
        if !kept {
            debug!(name = ?placemark.name, "dropping placemark without usable geometry");
            dropped += 1;
        }
    }
    Normalized::new(FeatureCollection::from_features(features), dropped)
}

/// `ExtendedData` values follow the lossless-number rule; `name` and
/// `description` elements are kept as text and take precedence.
fn placemark_properties(placemark: &Placemark) -> Properties {
    let mut properties: Properties = placemark
        .data
        .iter()
        .map(|(k, v)| (k.clone(), Scalar::from_text(v)))
        .collect();
    if let Some(name) = &placemark.name {
        properties.insert("name".into(), Scalar::String(name.clone()));
    }
    if let Some(description) = &placemark.description {
        properties.insert("description".into(), Scalar::String(description.clone()));
    }
    properties
}

fn geometry_from_kml(geometry: &KmlGeometry) -> Option<Geometry> {
    match geometry {
        KmlGeometry::Point(p) => Some(Geometry::Point { coordinates: *p }),
        KmlGeometry::LineString(ps) | KmlGeometry::LinearRing(ps) if !ps.is_empty() => {
            Some(Geometry::line_string(ps.clone()))
        }
        KmlGeometry::LineString(_) | KmlGeometry::LinearRing(_) => None,
        KmlGeometry::Polygon(polygon) => polygon_rings(polygon).map(Geometry::polygon),
        KmlGeometry::MultiGeometry(parts) => {
            let parts: Vec<Geometry> = parts.iter().filter_map(geometry_from_kml).collect();
            if parts.is_empty() {
                None
            } else {
                Some(collapse(parts))
            }
        }
    }
}

fn polygon_rings(polygon: &KmlPolygon) -> Option<Vec<Vec<Position>>> {
    if polygon.outer.is_empty() {
        return None;
    }
    let mut rings = vec![polygon.outer.clone()];
    rings.extend(polygon.inner.iter().filter(|r| !r.is_empty()).cloned());
    Some(rings)
}

/// A `MultiGeometry` of one kind becomes the matching multi geometry;
/// mixed content stays a collection.
fn collapse(parts: Vec<Geometry>) -> Geometry {
    if parts.iter().all(|g| matches!(g, Geometry::Point { .. })) {
        return Geometry::MultiPoint {
            coordinates: parts
                .into_iter()
                .filter_map(|g| match g {
                    Geometry::Point { coordinates } => Some(coordinates),
                    _ => None,
                })
                .collect(),
        };
    }
    if parts.iter().all(|g| matches!(g, Geometry::LineString { .. })) {
        return Geometry::MultiLineString {
            coordinates: parts
                .into_iter()
                .filter_map(|g| match g {
                    Geometry::LineString { coordinates } => Some(coordinates),
                    _ => None,
                })
                .collect(),
        };
    }
    if parts.iter().all(|g| matches!(g, Geometry::Polygon { .. })) {
        return Geometry::MultiPolygon {
            coordinates: parts
                .into_iter()
                .filter_map(|g| match g {
                    Geometry::Polygon { coordinates } => Some(coordinates),
                    _ => None,
                })
                .collect(),
        };
    }
    Geometry::GeometryCollection { geometries: parts }
}

// -----------------------------------------------------------------------------
// SHARED RULES
// -----------------------------------------------------------------------------

/// One feature per collection member (recursively), each carrying the
/// parent's properties. Other features pass through unchanged.
fn expand(feature: Feature) -> Vec<Feature> {
    match feature.geometry {
        Geometry::GeometryCollection { geometries } => geometries
            .into_iter()
            .flat_map(|geometry| {
                expand(Feature {
                    id: None,
                    bbox: None,
                    geometry,
                    properties: feature.properties.clone(),
                })
            })
            .collect(),
        geometry => vec![Feature { geometry, ..feature }],
    }
}

/// Appends the expansion of `feature`; `false` if it expanded to nothing
/// (an empty geometry collection), which counts as a dropped feature.
fn extend_expanded(features: &mut Vec<Feature>, feature: Feature) -> bool {
    let before = features.len();
    features.extend(expand(feature));
    features.len() > before
}

fn closed(mut geometry: Geometry) -> Geometry {
    close_rings(&mut geometry);
    geometry
}

fn close_rings(geometry: &mut Geometry) {
    match geometry {
        Geometry::Polygon { coordinates } => coordinates.iter_mut().for_each(close_ring),
        Geometry::MultiPolygon { coordinates } => coordinates
            .iter_mut()
            .flatten()
            .for_each(close_ring),
        Geometry::GeometryCollection { geometries } => geometries.iter_mut().for_each(close_rings),
        _ => {}
    }
}
