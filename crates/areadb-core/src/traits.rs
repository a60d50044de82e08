// crates/areadb-core/src/traits.rs
use crate::boundary::BoundaryRecord;
use crate::common::RegistryStats;
use crate::geometry::Centroid;

/// Query surface of a boundary registry.
///
/// All lookups are exact string matches against either the record's
/// identifier or its source file name.
pub trait BoundarySearch {
    /// All records, in build order.
    fn records(&self) -> &[BoundaryRecord];

    fn stats(&self) -> RegistryStats;

    /// The record a key resolves to.
    ///
    /// When several records match, the **last** one in build order wins.
    /// Source data does contain duplicates (the same area number in two
    /// groups, or a file whose placemark carries another file's name), and
    /// lookups have always resolved them this way.
    ///
    /// # Example
    ///
    /// ```rust
    /// use areadb_core::{BoundaryRecord, BoundaryRegistry, BoundarySearch, BoundingBox};
    ///
    /// let bbox = BoundingBox { max_latitude: 2.0, max_longitude: 2.0, min_latitude: 0.0, min_longitude: 0.0 };
    /// let registry = BoundaryRegistry::from_records(vec![
    ///     BoundaryRecord::new("S9", "S8.kml", "SCHALKHAAR", bbox),
    ///     BoundaryRecord::new("S9", "S9.kml", "SCHALKHAAR", bbox),
    /// ]);
    /// assert_eq!(registry.find("S9").unwrap().source_file_name, "S9.kml");
    /// ```
    fn find(&self, key: &str) -> Option<&BoundaryRecord> {
        self.records().iter().rev().find(|r| r.matches(key))
    }

    /// Every record matching the key, in build order.
    fn find_all(&self, key: &str) -> Vec<&BoundaryRecord> {
        self.records().iter().filter(|r| r.matches(key)).collect()
    }

    /// Centroid of the matching record's bounding box; `None` on a miss.
    fn lookup(&self, key: &str) -> Option<Centroid> {
        self.find(key).map(BoundaryRecord::centroid)
    }

    /// Records whose description label equals `description`.
    fn records_in(&self, description: &str) -> Vec<&BoundaryRecord> {
        self.records()
            .iter()
            .filter(|r| r.description == description)
            .collect()
    }
}
