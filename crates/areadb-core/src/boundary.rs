// crates/areadb-core/src/boundary.rs

//! # Boundary Extractor
//!
//! Turns one area document into one [`BoundaryRecord`]: the identifier of
//! its first placemark and the bounding box of its first polygon's outer
//! ring.

use crate::error::{AreaError, Result};
use crate::geometry::{BoundingBox, Centroid};
use crate::raw::KmlDocument;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One area boundary.
///
/// The serialized field names (including the `Decription` spelling) are a
/// compatibility contract with previously generated registry files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRecord {
    #[serde(rename = "FileName")]
    pub source_file_name: String,
    #[serde(rename = "Name")]
    pub identifier: String,
    #[serde(rename = "Decription")]
    pub description: String,
    #[serde(rename = "MaxLatitude")]
    pub max_latitude: f64,
    #[serde(rename = "MaxLongitude")]
    pub max_longitude: f64,
    #[serde(rename = "MinLatitude")]
    pub min_latitude: f64,
    #[serde(rename = "MinLongitude")]
    pub min_longitude: f64,
}

impl BoundaryRecord {
    pub fn new(
        identifier: impl Into<String>,
        source_file_name: impl Into<String>,
        description: impl Into<String>,
        bbox: BoundingBox,
    ) -> Self {
        BoundaryRecord {
            source_file_name: source_file_name.into(),
            identifier: identifier.into(),
            description: description.into(),
            max_latitude: bbox.max_latitude,
            max_longitude: bbox.max_longitude,
            min_latitude: bbox.min_latitude,
            min_longitude: bbox.min_longitude,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox {
            max_latitude: self.max_latitude,
            max_longitude: self.max_longitude,
            min_latitude: self.min_latitude,
            min_longitude: self.min_longitude,
        }
    }

    pub fn centroid(&self) -> Centroid {
        self.bbox().centroid()
    }

    /// Exact match against the identifier or the source file name.
    #[inline]
    pub fn matches(&self, key: &str) -> bool {
        key == self.identifier || key == self.source_file_name
    }
}

/// Extracts the boundary of a parsed document.
///
/// `description` and `source_file_name` describe where the document came
/// from; they are not read from its content.
///
/// # Errors
///
/// - [`AreaError::MalformedGeometry`] if there is no placemark, the first
///   placemark has no name, or there is no polygon;
/// - [`AreaError::EmptyRing`] if the first polygon's outer ring is empty;
/// - [`AreaError::InvalidCoordinate`] for non-finite coordinates.
pub fn extract(
    document: &KmlDocument,
    description: &str,
    source_file_name: &str,
) -> Result<BoundaryRecord> {
    let placemark = document
        .first_placemark()
        .ok_or_else(|| AreaError::malformed(source_file_name, "no placemark found"))?;
    let identifier = placemark
        .name
        .as_deref()
        .ok_or_else(|| AreaError::malformed(source_file_name, "first placemark has no name"))?;
    let polygon = document
        .first_polygon()
        .ok_or_else(|| AreaError::malformed(source_file_name, "no polygon found"))?;

    let bbox = BoundingBox::from_positions(&polygon.outer)?.ok_or_else(|| AreaError::EmptyRing {
        context: source_file_name.to_string(),
    })?;

    debug!(
        file = source_file_name,
        identifier,
        description,
        points = polygon.outer.len(),
        "extracted boundary"
    );

    Ok(BoundaryRecord::new(
        identifier,
        source_file_name,
        description,
        bbox,
    ))
}

/// Parses KML text and extracts its boundary. Errors carry the file name.
pub fn extract_from_str(
    text: &str,
    description: &str,
    source_file_name: &str,
) -> Result<BoundaryRecord> {
    KmlDocument::parse(text)
        .and_then(|doc| extract(&doc, description, source_file_name))
        .map_err(|e| e.in_file(source_file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kml(name: &str, coordinates: &str) -> String {
        format!(
            r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document><Placemark>
            <name>{name}</name>
            <Polygon><outerBoundaryIs><LinearRing>
            <coordinates>{coordinates}</coordinates>
            </LinearRing></outerBoundaryIs></Polygon>
            </Placemark></Document></kml>"#
        )
    }

    #[test]
    fn extracts_identifier_and_bbox() {
        let text = kml("42", "6.0,52.0 6.1,52.0 6.1,52.1 6.0,52.1 6.0,52.0");
        let record = extract_from_str(&text, "AREA", "42.kml").unwrap();
        assert_eq!(
            record,
            BoundaryRecord {
                source_file_name: "42.kml".into(),
                identifier: "42".into(),
                description: "AREA".into(),
                max_latitude: 52.1,
                max_longitude: 6.1,
                min_latitude: 52.0,
                min_longitude: 6.0,
            }
        );
        assert!(record.max_latitude >= record.min_latitude);
        assert!(record.max_longitude >= record.min_longitude);
    }

    #[test]
    fn serializes_with_compatibility_field_names() {
        let record = extract_from_str(&kml("S7", "1,2 3,4 1,2"), "SCHALKHAAR", "S7.kml").unwrap();
        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for key in [
            "FileName",
            "Name",
            "Decription",
            "MaxLatitude",
            "MaxLongitude",
            "MinLatitude",
            "MinLongitude",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(keys.len(), 7);
    }

    #[test]
    fn empty_ring_is_an_error_not_a_zero_box() {
        let err = extract_from_str(&kml("1", "  "), "A", "1.kml").unwrap_err();
        assert!(matches!(err, AreaError::EmptyRing { ref context } if context == "1.kml"));
    }

    #[test]
    fn missing_polygon_or_placemark_is_malformed() {
        let no_polygon = r#"<kml><Placemark><name>x</name><Point><coordinates>1,2</coordinates></Point></Placemark></kml>"#;
        assert!(matches!(
            extract_from_str(no_polygon, "A", "x.kml"),
            Err(AreaError::MalformedGeometry { .. })
        ));

        let no_placemark = r#"<kml><Document><name>empty</name></Document></kml>"#;
        assert!(matches!(
            extract_from_str(no_placemark, "A", "y.kml"),
            Err(AreaError::MalformedGeometry { .. })
        ));
    }

    #[test]
    fn non_finite_coordinates_fail() {
        let err = extract_from_str(&kml("n", "1,2 nan,3 1,2"), "A", "n.kml").unwrap_err();
        assert!(matches!(err, AreaError::MalformedGeometry { ref context, .. } if context == "n.kml"));
    }
}
