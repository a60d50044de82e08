//! Workspace convenience crate: re-exports [`areadb_core`] for the demos.
pub use areadb_core::*;
