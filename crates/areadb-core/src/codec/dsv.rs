// crates/areadb-core/src/codec/dsv.rs
//! Point table export: one CSV row per point position.
//!
//! Columns are the property keys in first-seen order followed by `lon` and
//! `lat`. Only `Point` and `MultiPoint` geometries (also inside collections)
//! produce rows; everything else is skipped.

use crate::error::{AreaError, Result};
use crate::geometry::{FeatureCollection, Geometry, Position};
use std::collections::HashSet;

pub const LON: &str = "lon";
pub const LAT: &str = "lat";

pub fn encode(model: &FeatureCollection) -> Result<Vec<u8>> {
    // 1. Columns
    let mut seen = HashSet::new();
    let mut columns: Vec<&str> = Vec::new();
    for feature in &model.features {
        for key in feature.properties.keys() {
            // The coordinate columns win over a property with the same name.
            if key != LON && key != LAT && seen.insert(key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = columns.clone();
    header.extend([LON, LAT]);
    writer.write_record(&header)?;

    // 2. Rows
    let mut rows = 0usize;
    for feature in &model.features {
        let mut points = Vec::new();
        collect_points(&feature.geometry, &mut points);

        for p in points {
            let mut record: Vec<String> = columns
                .iter()
                .map(|c| {
                    feature
                        .properties
                        .get(*c)
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                })
                .collect();
            record.push(p.x.to_string());
            record.push(p.y.to_string());
            writer.write_record(&record)?;
            rows += 1;
        }
    }
    tracing::debug!(rows, columns = header.len(), "wrote point table");

    writer
        .into_inner()
        .map_err(|e| AreaError::Io(e.into_error()))
}

fn collect_points<'a>(geometry: &'a Geometry, out: &mut Vec<&'a Position>) {
    match geometry {
        Geometry::Point { coordinates } => out.push(coordinates),
        Geometry::MultiPoint { coordinates } => out.extend(coordinates.iter()),
        Geometry::GeometryCollection { geometries } => {
            for g in geometries {
                collect_points(g, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Feature;

    fn text(model: &FeatureCollection) -> String {
        String::from_utf8(encode(model).unwrap()).unwrap()
    }

    #[test]
    fn one_row_per_point_with_property_columns() {
        let model = FeatureCollection::from_features(vec![
            Feature::new(Geometry::point(6.1, 52.2))
                .with_property("name", "S9")
                .with_property("count", 3i64),
            Feature::new(Geometry::MultiPoint {
                coordinates: vec![Position::new(1.0, 2.0), Position::new(3.0, 4.0)],
            })
            .with_property("zone", "BEL, oost"),
        ]);
        assert_eq!(
            text(&model),
            "count,name,zone,lon,lat\n3,S9,,6.1,52.2\n,,\"BEL, oost\",1,2\n,,\"BEL, oost\",3,4\n"
        );
    }

    #[test]
    fn non_point_geometries_are_skipped() {
        let model = FeatureCollection::from_features(vec![
            Feature::new(Geometry::line_string(vec![Position::new(0.0, 0.0), Position::new(1.0, 1.0)])),
            Feature::new(Geometry::GeometryCollection {
                geometries: vec![Geometry::point(7.0, 8.0)],
            }),
        ]);
        assert_eq!(text(&model), "lon,lat\n7,8\n");
    }

    #[test]
    fn coordinate_columns_win_name_collisions() {
        let model = FeatureCollection::from_features(vec![
            Feature::new(Geometry::point(1.0, 2.0)).with_property("lat", "ignored")
        ]);
        assert_eq!(text(&model), "lon,lat\n1,2\n");
    }
}
