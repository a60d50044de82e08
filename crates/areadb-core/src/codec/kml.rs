// crates/areadb-core/src/codec/kml.rs

//! # KML Markup
//!
//! Writer: each feature becomes a `Placemark` with `name`/`description`
//! taken from properties, every non-null property as `ExtendedData`, and the
//! geometry in KML form (multi geometries and collections become
//! `MultiGeometry`).
//!
//! Reader: parses into the [`KmlDocument`] tree; conversion to features
//! happens in the normalizer.

use crate::error::{AreaError, Result};
use crate::geometry::{Feature, FeatureCollection, Geometry, Position};
use crate::normalize::ParsedInput;
use crate::raw::KmlDocument;
use quick_xml::escape::escape;
use std::fmt::Write as _;

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmlOptions {
    /// Property written as the placemark `<name>`.
    pub name_field: String,
    /// Property written as the placemark `<description>`.
    pub description_field: String,
    /// `<name>` of the enclosing `<Document>`.
    pub document_name: Option<String>,
}

impl Default for KmlOptions {
    fn default() -> Self {
        KmlOptions {
            name_field: "name".into(),
            description_field: "description".into(),
            document_name: None,
        }
    }
}

// -----------------------------------------------------------------------------
// WRITER
// -----------------------------------------------------------------------------

pub fn encode(model: &FeatureCollection, options: &KmlOptions) -> Result<Vec<u8>> {
    let mut out = String::new();
    out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = write!(out, r#"<kml xmlns="{KML_NAMESPACE}"><Document>"#);
    if let Some(name) = &options.document_name {
        let _ = write!(out, "<name>{}</name>", escape(name.as_str()));
    }
    for feature in &model.features {
        write_placemark(&mut out, feature, options);
    }
    out.push_str("</Document></kml>");
    Ok(out.into_bytes())
}

fn write_placemark(out: &mut String, feature: &Feature, options: &KmlOptions) {
    out.push_str("<Placemark>");

    let text_of = |key: &str| {
        feature
            .property(key)
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
    };
    if let Some(name) = text_of(&options.name_field) {
        let _ = write!(out, "<name>{}</name>", escape(name.as_str()));
    }
    if let Some(description) = text_of(&options.description_field) {
        let _ = write!(out, "<description>{}</description>", escape(description.as_str()));
    }

    let data: Vec<_> = feature.properties.iter().filter(|(_, v)| !v.is_null()).collect();
    if !data.is_empty() {
        out.push_str("<ExtendedData>");
        for (key, value) in data {
            let _ = write!(
                out,
                r#"<Data name="{}"><value>{}</value></Data>"#,
                escape(key.as_str()),
                escape(value.to_string().as_str())
            );
        }
        out.push_str("</ExtendedData>");
    }

    write_geometry(out, &feature.geometry);
    out.push_str("</Placemark>");
}

fn write_geometry(out: &mut String, geometry: &Geometry) {
    match geometry {
        Geometry::Point { coordinates } => {
            out.push_str("<Point><coordinates>");
            write_tuple(out, coordinates);
            out.push_str("</coordinates></Point>");
        }
        Geometry::LineString { coordinates } => write_line(out, coordinates),
        Geometry::Polygon { coordinates } => write_polygon(out, coordinates),
        Geometry::MultiPoint { coordinates } => {
            multi(out, coordinates, |out, p| {
                write_geometry(out, &Geometry::Point { coordinates: *p })
            });
        }
        Geometry::MultiLineString { coordinates } => {
            multi(out, coordinates, |out, line| write_line(out, line));
        }
        Geometry::MultiPolygon { coordinates } => {
            multi(out, coordinates, |out, rings| write_polygon(out, rings));
        }
        Geometry::GeometryCollection { geometries } => {
            multi(out, geometries, write_geometry);
        }
    }
}

fn multi<T>(out: &mut String, parts: &[T], mut part: impl FnMut(&mut String, &T)) {
    out.push_str("<MultiGeometry>");
    for p in parts {
        part(out, p);
    }
    out.push_str("</MultiGeometry>");
}

fn write_line(out: &mut String, positions: &[Position]) {
    out.push_str("<LineString><coordinates>");
    write_tuples(out, positions);
    out.push_str("</coordinates></LineString>");
}

fn write_polygon(out: &mut String, rings: &[Vec<Position>]) {
    out.push_str("<Polygon>");
    for (i, ring) in rings.iter().enumerate() {
        let boundary = if i == 0 { "outerBoundaryIs" } else { "innerBoundaryIs" };
        let _ = write!(out, "<{boundary}><LinearRing><coordinates>");
        write_tuples(out, ring);
        let _ = write!(out, "</coordinates></LinearRing></{boundary}>");
    }
    out.push_str("</Polygon>");
}

fn write_tuples(out: &mut String, positions: &[Position]) {
    for (i, p) in positions.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_tuple(out, p);
    }
}

fn write_tuple(out: &mut String, p: &Position) {
    let _ = write!(out, "{},{}", p.x, p.y);
    if let Some(z) = p.z {
        let _ = write!(out, ",{z}");
    }
}

// -----------------------------------------------------------------------------
// READER
// -----------------------------------------------------------------------------

pub fn decode(bytes: &[u8]) -> Result<ParsedInput> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AreaError::malformed("KML", format!("input is not UTF-8: {e}")))?;
    Ok(ParsedInput::Kml(KmlDocument::parse(text)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::KmlGeometry;

    fn text(model: &FeatureCollection, options: &KmlOptions) -> String {
        String::from_utf8(encode(model, options).unwrap()).unwrap()
    }

    #[test]
    fn writes_placemark_with_name_and_data() {
        let model = FeatureCollection::from_features(vec![Feature::new(Geometry::point(6.1, 52.2))
            .with_property("name", "Schalkhaar & Co")
            .with_property("count", 3i64)]);
        let kml = text(
            &model,
            &KmlOptions {
                document_name: Some("wijken".into()),
                ..Default::default()
            },
        );
        assert!(kml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><kml xmlns="http://www.opengis.net/kml/2.2"><Document><name>wijken</name>"#));
        assert!(kml.contains("<Placemark><name>Schalkhaar &amp; Co</name>"));
        assert!(kml.contains(r#"<Data name="count"><value>3</value></Data>"#));
        assert!(kml.contains("<Point><coordinates>6.1,52.2</coordinates></Point>"));
    }

    #[test]
    fn polygon_holes_become_inner_boundaries() {
        let ring = |d: f64| {
            vec![
                Position::new(d, d),
                Position::new(10.0 - d, d),
                Position::new(10.0 - d, 10.0 - d),
                Position::new(d, d),
            ]
        };
        let model = FeatureCollection::from_features(vec![Feature::new(Geometry::polygon(vec![
            ring(0.0),
            ring(2.0),
        ]))]);
        let kml = text(&model, &KmlOptions::default());
        assert!(kml.contains("<Polygon><outerBoundaryIs><LinearRing><coordinates>0,0 10,0 10,10 0,0</coordinates></LinearRing></outerBoundaryIs><innerBoundaryIs>"));
    }

    #[test]
    fn output_parses_back_into_the_document_tree() {
        let model = FeatureCollection::from_features(vec![Feature::new(Geometry::MultiPoint {
            coordinates: vec![Position::new(1.0, 2.0), Position::with_z(3.0, 4.0, 5.0)],
        })
        .with_property("name", "pair")]);

        let ParsedInput::Kml(doc) = decode(&encode(&model, &KmlOptions::default()).unwrap()).unwrap()
        else {
            panic!("expected a KML document");
        };
        let placemark = doc.first_placemark().unwrap();
        assert_eq!(placemark.name.as_deref(), Some("pair"));
        assert_eq!(
            placemark.geometry,
            Some(KmlGeometry::MultiGeometry(vec![
                KmlGeometry::Point(Position::new(1.0, 2.0)),
                KmlGeometry::Point(Position::with_z(3.0, 4.0, 5.0)),
            ]))
        );
    }

    #[test]
    fn empty_collection_is_an_empty_document() {
        assert_eq!(
            text(&FeatureCollection::new(), &KmlOptions::default()),
            r#"<?xml version="1.0" encoding="UTF-8"?><kml xmlns="http://www.opengis.net/kml/2.2"><Document></Document></kml>"#
        );
    }
}
