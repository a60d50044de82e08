// crates/areadb-core/src/lib.rs

pub mod boundary; // KML -> bounding box record
pub mod codec; // Export/import dispatch table
pub mod common;
pub mod error;
pub mod geometry; // Canonical feature collection
pub mod io;
pub mod normalize;
pub mod registry;
pub mod traits;
// Raw KML tree (used by the extractor and the KML importer)
#[doc(hidden)]
pub mod raw;

// Re-exports
pub use crate::error::{AreaError, Result};
pub use boundary::{extract, extract_from_str, BoundaryRecord};
pub use codec::{Artifact, Capabilities, Dispatcher, ExportOptions, Format};
pub use common::RegistryStats;
pub use geometry::{
    BoundingBox, Centroid, Feature, FeatureCollection, FeatureId, Geometry, Position, Properties,
    Scalar,
};
pub use normalize::{normalize, ImportPartial, Normalized, ParsedInput};
pub use registry::{scan_dir, BoundaryRegistry, SourceDocument, SourceGroup};
// Export the Search Trait (lookup lives here)
pub use traits::BoundarySearch;
