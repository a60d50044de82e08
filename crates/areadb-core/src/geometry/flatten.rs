// crates/areadb-core/src/geometry/flatten.rs

//! Splitting multi-geometries into simple ones.

use super::{Feature, FeatureCollection, Geometry};

impl Geometry {
    /// Splits a geometry into its simple parts (`Point`, `LineString`,
    /// `Polygon`). Collections are expanded recursively; simple geometries
    /// come back as a single element.
    pub fn into_simple(self) -> Vec<Geometry> {
        match self {
            Geometry::MultiPoint { coordinates } => coordinates
                .into_iter()
                .map(|coordinates| Geometry::Point { coordinates })
                .collect(),
            Geometry::MultiLineString { coordinates } => coordinates
                .into_iter()
                .map(|coordinates| Geometry::LineString { coordinates })
                .collect(),
            Geometry::MultiPolygon { coordinates } => coordinates
                .into_iter()
                .map(|coordinates| Geometry::Polygon { coordinates })
                .collect(),
            Geometry::GeometryCollection { geometries } => geometries
                .into_iter()
                .flat_map(Geometry::into_simple)
                .collect(),
            simple => vec![simple],
        }
    }

    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Geometry::Point { .. } | Geometry::LineString { .. } | Geometry::Polygon { .. }
        )
    }
}

impl FeatureCollection {
    /// Flattens multi features: one feature per simple geometry, each with a
    /// copy of its parent's properties.
    ///
    /// Features that are already simple are kept untouched. Split parts lose
    /// the parent's `id` and `bbox`, which no longer describe them.
    pub fn flatten(self) -> FeatureCollection {
        let mut features = Vec::with_capacity(self.features.len());
        for feature in self.features {
            if feature.geometry.is_simple() {
                features.push(feature);
                continue;
            }
            let properties = feature.properties;
            features.extend(feature.geometry.into_simple().into_iter().map(|geometry| Feature {
                id: None,
                bbox: None,
                geometry,
                properties: properties.clone(),
            }));
        }
        FeatureCollection {
            bbox: self.bbox,
            features,
        }
    }
}
