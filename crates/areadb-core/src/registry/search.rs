// crates/areadb-core/src/registry/search.rs
use super::BoundaryRegistry;
use crate::boundary::BoundaryRecord;
use crate::common::RegistryStats;
use crate::traits::BoundarySearch;
use std::collections::{HashMap, HashSet};

impl BoundarySearch for BoundaryRegistry {
    fn records(&self) -> &[BoundaryRecord] {
        &self.records
    }

    fn stats(&self) -> RegistryStats {
        let descriptions: HashSet<&str> =
            self.records.iter().map(|r| r.description.as_str()).collect();

        // A key counts once per record even if identifier == file name.
        let mut hits: HashMap<&str, usize> = HashMap::new();
        for r in &self.records {
            *hits.entry(r.identifier.as_str()).or_default() += 1;
            if r.source_file_name != r.identifier {
                *hits.entry(r.source_file_name.as_str()).or_default() += 1;
            }
        }

        RegistryStats {
            records: self.records.len(),
            descriptions: descriptions.len(),
            duplicate_keys: hits.values().filter(|&&n| n > 1).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn record(name: &str, file: &str, description: &str, lat: f64, lon: f64) -> BoundaryRecord {
        BoundaryRecord::new(
            name,
            file,
            description,
            BoundingBox {
                max_latitude: lat + 0.02,
                max_longitude: lon + 0.02,
                min_latitude: lat,
                min_longitude: lon,
            },
        )
    }

    fn registry() -> BoundaryRegistry {
        BoundaryRegistry::from_records(vec![
            record("314", "314.kml", "BEL_SCHRIJF GEBIED", 52.0, 6.0),
            record("BE8", "BE8.kml", "BEL", 52.1, 6.1),
            record("S9", "S8.kml", "SCHALKHAAR", 52.2, 6.2),
            record("S9", "S9.kml", "SCHALKHAAR", 52.3, 6.3),
            record("BE8", "BE8 (2).kml", "BEL", 52.4, 6.4),
        ])
    }

    #[test]
    fn lookup_by_identifier_or_file_name() {
        let r = registry();
        let by_name = r.lookup("314").unwrap();
        let by_file = r.lookup("314.kml").unwrap();
        assert_eq!(by_name, by_file);
        assert!((by_name.latitude - 52.01).abs() < 1e-9);
        assert!((by_name.longitude - 6.01).abs() < 1e-9);
    }

    #[test]
    fn last_match_wins_on_duplicates() {
        let r = registry();
        assert_eq!(r.find("BE8").unwrap().source_file_name, "BE8 (2).kml");
        assert_eq!(r.find("S9").unwrap().source_file_name, "S9.kml");
        // The file name S8.kml still resolves to its own record.
        assert_eq!(r.find("S8.kml").unwrap().identifier, "S9");
        assert_eq!(r.find_all("S9").len(), 2);
    }

    #[test]
    fn lookup_is_deterministic() {
        let r = registry();
        let first = r.lookup("S9");
        for _ in 0..10 {
            assert_eq!(r.lookup("S9"), first);
        }
    }

    #[test]
    fn miss_is_none() {
        let r = registry();
        assert!(r.lookup("999").is_none());
        assert!(r.lookup("").is_none());
        assert!(r.lookup("be8").is_none(), "matching is exact");
    }

    #[test]
    fn stats_count_duplicates() {
        let stats = registry().stats();
        assert_eq!(stats.records, 5);
        assert_eq!(stats.descriptions, 3);
        assert_eq!(stats.duplicate_keys, 2);
        assert_eq!(registry().records_in("BEL").len(), 2);
    }
}
