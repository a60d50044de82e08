// crates/areadb-core/src/registry/mod.rs

//! # Boundary Registry
//!
//! The ordered list of [`BoundaryRecord`]s, built once from grouped source
//! documents and immutable afterwards. Queries go through
//! [`crate::BoundarySearch`].
//!
//! Build order is the input enumeration order (groups, then files within a
//! group) and is preserved; lookup semantics depend on it.

pub mod search;
pub mod source;
pub mod store;

pub use source::{scan_dir, SourceDocument, SourceGroup};
pub use store::CACHE_SUFFIX;

use crate::boundary::{self, BoundaryRecord};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRegistry {
    records: Vec<BoundaryRecord>,
}

impl BoundaryRegistry {
    /// Builds the registry by extracting every document of every group.
    ///
    /// The first failing document aborts the build; its error carries the
    /// file name. No partially built registry is ever returned.
    ///
    /// # Example
    ///
    /// ```rust
    /// use areadb_core::{BoundaryRegistry, BoundarySearch, SourceDocument, SourceGroup};
    ///
    /// let kml = r#"<kml><Placemark><name>42</name><Polygon><outerBoundaryIs><LinearRing>
    ///     <coordinates>6.0,52.0 6.1,52.0 6.1,52.1 6.0,52.1 6.0,52.0</coordinates>
    ///     </LinearRing></outerBoundaryIs></Polygon></Placemark></kml>"#;
    ///
    /// let registry = BoundaryRegistry::build(vec![SourceGroup {
    ///     description: "AREA".into(),
    ///     documents: vec![SourceDocument::new("42.kml", kml)],
    /// }])
    /// .unwrap();
    ///
    /// let c = registry.lookup("42").unwrap();
    /// assert!((c.latitude - 52.05).abs() < 1e-9);
    /// assert!((c.longitude - 6.05).abs() < 1e-9);
    /// assert!(registry.lookup("43").is_none());
    /// ```
    pub fn build<I>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = SourceGroup>,
    {
        let mut records = Vec::new();
        let mut group_count = 0usize;

        for group in groups {
            group_count += 1;
            for document in &group.documents {
                let record = boundary::extract_from_str(
                    &document.content,
                    &group.description,
                    &document.file_name,
                )?;
                records.push(record);
            }
        }

        info!(
            groups = group_count,
            records = records.len(),
            "built boundary registry"
        );
        Ok(BoundaryRegistry { records })
    }

    /// Wraps already extracted records, keeping their order.
    pub fn from_records(records: Vec<BoundaryRecord>) -> Self {
        BoundaryRegistry { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<BoundaryRecord> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AreaError;
    use crate::BoundarySearch;

    pub(crate) fn area_kml(name: &str, lat: (f64, f64), lon: (f64, f64)) -> String {
        format!(
            "<kml><Document><Placemark><name>{name}</name><Polygon><outerBoundaryIs><LinearRing><coordinates>\
             {x0},{y0} {x1},{y0} {x1},{y1} {x0},{y1} {x0},{y0}\
             </coordinates></LinearRing></outerBoundaryIs></Polygon></Placemark></Document></kml>",
            x0 = lon.0,
            x1 = lon.1,
            y0 = lat.0,
            y1 = lat.1,
        )
    }

    fn group(description: &str, docs: &[(&str, String)]) -> SourceGroup {
        SourceGroup {
            description: description.into(),
            documents: docs
                .iter()
                .map(|(name, content)| SourceDocument::new(*name, content.clone()))
                .collect(),
        }
    }

    #[test]
    fn build_preserves_enumeration_order() {
        let registry = BoundaryRegistry::build(vec![
            group(
                "B",
                &[
                    ("2.kml", area_kml("2", (1.0, 2.0), (1.0, 2.0))),
                    ("1.kml", area_kml("1", (0.0, 1.0), (0.0, 1.0))),
                ],
            ),
            group("A", &[("3.kml", area_kml("3", (5.0, 6.0), (5.0, 6.0)))]),
        ])
        .unwrap();

        let names: Vec<&str> = registry
            .records()
            .iter()
            .map(|r| r.identifier.as_str())
            .collect();
        assert_eq!(names, ["2", "1", "3"]);
        assert_eq!(registry.records()[2].description, "A");
    }

    #[test]
    fn failing_document_aborts_build_with_file_context() {
        let err = BoundaryRegistry::build(vec![group(
            "A",
            &[
                ("ok.kml", area_kml("ok", (0.0, 1.0), (0.0, 1.0))),
                ("bad.kml", "<kml><Placemark><name>x</name></Placemark></kml>".to_string()),
            ],
        )])
        .unwrap_err();
        assert!(
            matches!(err, AreaError::MalformedGeometry { ref context, .. } if context == "bad.kml")
        );
    }
}
