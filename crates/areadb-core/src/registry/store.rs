// crates/areadb-core/src/registry/store.rs

//! Registry persistence.
//!
//! The interchange form is a single JSON array of records (the file the
//! original exporter wrote). Next to it a bincode cache can be kept so that
//! large registries do not have to be re-parsed on every start.

use super::BoundaryRegistry;
use crate::boundary::BoundaryRecord;
use crate::error::{AreaError, Result};
use crate::io;
use bincode::Options;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[cfg(not(feature = "compact"))]
pub const CACHE_SUFFIX: &str = "bin";
#[cfg(feature = "compact")]
pub const CACHE_SUFFIX: &str = "comp.bin";

/// Upper bound for a cache file, against corrupted length prefixes.
const CACHE_LIMIT: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    Gzip,
    None,
}

impl CompressionMode {
    fn default_for_build() -> Self {
        if cfg!(feature = "compact") {
            CompressionMode::Gzip
        } else {
            CompressionMode::None
        }
    }
}

impl BoundaryRegistry {
    pub fn default_data_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
    }

    pub fn default_registry_filename() -> &'static str {
        "gebiedsgrenzen.json"
    }

    // -------------------------------------------------------------------------
    // JSON
    // -------------------------------------------------------------------------

    /// The registry as one JSON array of records.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.records)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let records: Vec<BoundaryRecord> = serde_json::from_slice(bytes)?;
        Ok(Self::from_records(records))
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        io::write_atomic(path, &self.to_json()?)?;
        info!(path = %path.display(), records = self.len(), "wrote registry");
        Ok(())
    }

    /// Reads a JSON registry (`.json`, or `.json.gz` with `compact`).
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = io::open_stream(path.as_ref())?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_json(&bytes)
    }

    // -------------------------------------------------------------------------
    // BINARY CACHE
    // -------------------------------------------------------------------------

    pub fn save_cache(&self, path: impl AsRef<Path>) -> Result<()> {
        write_cache(path.as_ref(), self, CompressionMode::default_for_build())
    }

    pub fn load_cache(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)
            .map_err(|e| AreaError::NotFound(format!("{}: {}", path.display(), e)))?;
        let bytes = match CompressionMode::default_for_build() {
            CompressionMode::Gzip => gunzip(&raw)?,
            CompressionMode::None => raw,
        };
        Self::from_cache_bytes(&bytes)
    }

    fn from_cache_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::DefaultOptions::new()
            .with_limit(CACHE_LIMIT)
            .allow_trailing_bytes()
            .deserialize(bytes)?)
    }

    /// **Smart Load:** uses a fresh cache next to `json_path` if there is
    /// one, otherwise reads the JSON and refreshes the cache (best effort).
    pub fn load(json_path: impl AsRef<Path>) -> Result<Self> {
        let json_path = json_path.as_ref();
        let cache = io::cache_path(json_path, CACHE_SUFFIX);

        // 1. Check Cache
        if is_cache_fresh(json_path, &cache) {
            match Self::load_cache(&cache) {
                Ok(registry) => {
                    debug!(path = %cache.display(), "loaded registry from cache");
                    return Ok(registry);
                }
                Err(e) => warn!(path = %cache.display(), error = %e, "ignoring unreadable cache"),
            }
        }

        // 2. Parse
        let registry = Self::load_json(json_path)?;

        // 3. Cache
        if let Err(e) = registry.save_cache(&cache) {
            warn!(path = %cache.display(), error = %e, "could not write registry cache");
        }
        Ok(registry)
    }
}

fn is_cache_fresh(json_path: &Path, cache_path: &Path) -> bool {
    let cache_time = match fs::metadata(cache_path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return false,
    };
    match fs::metadata(json_path).and_then(|m| m.modified()) {
        Ok(json_time) => json_time <= cache_time,
        Err(_) => true,
    }
}

/// Writes any serializable value as bincode, optionally gzip-wrapped.
fn write_cache<T: serde::Serialize>(
    path: &Path,
    value: &T,
    compression: CompressionMode,
) -> Result<()> {
    let encoded = bincode::DefaultOptions::new()
        .with_limit(CACHE_LIMIT)
        .serialize(value)?;
    let bytes = match compression {
        CompressionMode::Gzip => gzip(&encoded)?,
        CompressionMode::None => encoded,
    };
    io::write_atomic(path, &bytes)
}

#[cfg(feature = "compact")]
fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

#[cfg(not(feature = "compact"))]
fn gzip(_bytes: &[u8]) -> Result<Vec<u8>> {
    Err(AreaError::InvalidData(
        "Gzip requested but 'compact' disabled".into(),
    ))
}

#[cfg(feature = "compact")]
fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(not(feature = "compact"))]
fn gunzip(_bytes: &[u8]) -> Result<Vec<u8>> {
    Err(AreaError::InvalidData(
        "Gzip requested but 'compact' disabled".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::BoundarySearch;

    fn sample() -> BoundaryRegistry {
        BoundaryRegistry::from_records(vec![BoundaryRecord::new(
            "314",
            "314.kml",
            "BEL_SCHRIJF GEBIED",
            BoundingBox {
                max_latitude: 52.260279897645063,
                max_longitude: 6.2122193723917007,
                min_latitude: 52.2599856194033,
                min_longitude: 6.2114328145980835,
            },
        )])
    }

    #[test]
    fn reads_files_written_by_the_legacy_exporter() {
        let legacy = br#"[{"FileName":"S9.kml","Name":"S9","Decription":"SCHALKHAAR",
            "MaxLatitude":52.266057944642,"MaxLongitude":6.2036705017089844,
            "MinLatitude":52.261172647695439,"MinLongitude":6.1936283111572266}]"#;
        let registry = BoundaryRegistry::from_json(legacy).unwrap();
        assert_eq!(registry.records()[0].identifier, "S9");
        assert!(registry.lookup("S9.kml").is_some());
    }

    #[test]
    fn json_round_trip_is_exact() {
        let registry = sample();
        let again = BoundaryRegistry::from_json(&registry.to_json().unwrap()).unwrap();
        assert_eq!(again, registry);
        let text = String::from_utf8(registry.to_json().unwrap()).unwrap();
        assert!(text.starts_with(r#"[{"FileName":"314.kml","Name":"314","Decription":"#));
    }

    #[test]
    fn load_writes_and_then_uses_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let json = tmp.path().join("gebiedsgrenzen.json");
        sample().save_json(&json).unwrap();

        let first = BoundaryRegistry::load(&json).unwrap();
        let cache = io::cache_path(&json, CACHE_SUFFIX);
        assert!(cache.exists());

        let cached = BoundaryRegistry::load_cache(&cache).unwrap();
        assert_eq!(cached, first);
        assert_eq!(BoundaryRegistry::load(&json).unwrap(), first);
    }

    #[test]
    fn corrupt_cache_falls_back_to_json() {
        let tmp = tempfile::tempdir().unwrap();
        let json = tmp.path().join("r.json");
        sample().save_json(&json).unwrap();
        let cache = io::cache_path(&json, CACHE_SUFFIX);
        fs::write(&cache, b"not a cache").unwrap();

        assert_eq!(BoundaryRegistry::load(&json).unwrap(), sample());
    }

    #[cfg(feature = "compact")]
    #[test]
    fn gzipped_json_is_readable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("r.json.gz");
        fs::write(&path, gzip(&sample().to_json().unwrap()).unwrap()).unwrap();
        assert_eq!(BoundaryRegistry::load_json(&path).unwrap(), sample());
    }
}
