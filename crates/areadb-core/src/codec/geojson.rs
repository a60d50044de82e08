// crates/areadb-core/src/codec/geojson.rs
//! Canonical JSON: the model itself, serialized with `serde_json`.

use crate::error::{AreaError, Result};
use crate::geometry::FeatureCollection;
use crate::normalize::ParsedInput;
use serde_json::Value;

const ROOT_TYPES: [&str; 9] = [
    "FeatureCollection",
    "Feature",
    "Point",
    "LineString",
    "Polygon",
    "MultiPoint",
    "MultiLineString",
    "MultiPolygon",
    "GeometryCollection",
];

/// Serializes the model. An empty collection is valid output
/// (`{"type":"FeatureCollection","features":[]}`).
pub fn encode(model: &FeatureCollection) -> Result<Vec<u8>> {
    model.to_json_vec()
}

/// Parses JSON and checks the root against the Feature/Geometry grammar.
/// Members are validated later by the normalizer, which drops what it
/// cannot use instead of failing the whole import.
pub fn decode(bytes: &[u8]) -> Result<ParsedInput> {
    let value: Value = serde_json::from_slice(bytes)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AreaError::malformed("GeoJSON", "root object has no \"type\""))?;

    if !ROOT_TYPES.contains(&kind) {
        return Err(AreaError::malformed(
            "GeoJSON",
            format!("unknown root type {kind:?}"),
        ));
    }
    if kind == "FeatureCollection" && !value.get("features").is_some_and(Value::is_array) {
        return Err(AreaError::malformed(
            "GeoJSON",
            "FeatureCollection without a \"features\" array",
        ));
    }

    Ok(ParsedInput::Json(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_geometry_roots() {
        let parsed = decode(br#"{"type":"Point","coordinates":[1,2]}"#).unwrap();
        assert!(matches!(parsed, ParsedInput::Json(_)));
    }

    #[test]
    fn rejects_roots_outside_the_grammar() {
        assert!(matches!(
            decode(br#"{"type":"Topology","arcs":[]}"#),
            Err(AreaError::MalformedGeometry { .. })
        ));
        assert!(matches!(
            decode(br#"[1,2,3]"#),
            Err(AreaError::MalformedGeometry { .. })
        ));
        assert!(matches!(
            decode(br#"{"type":"FeatureCollection"}"#),
            Err(AreaError::MalformedGeometry { .. })
        ));
    }

    #[test]
    fn invalid_json_is_a_json_error() {
        assert!(matches!(decode(b"{not json"), Err(AreaError::Json(_))));
    }
}
