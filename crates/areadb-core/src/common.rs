// crates/areadb-core/src/common.rs
use serde::{Deserialize, Serialize};

/// Simple aggregate statistics for the registry.
///
/// Returned by [`crate::BoundarySearch::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub records: usize,
    /// Distinct description labels (source subdirectories).
    pub descriptions: usize,
    /// Keys (identifier or file name) that match more than one record.
    pub duplicate_keys: usize,
}
