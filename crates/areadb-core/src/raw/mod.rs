// crates/areadb-core/src/raw/mod.rs

//! # Raw Input
//!
//! Parsed-but-not-yet-interpreted source documents. The boundary extractor
//! and the KML importer both start from the tree defined here.

pub mod kml;
mod xml;

pub use kml::{
    Container, ContainerKind, KmlDocument, KmlElement, KmlGeometry, KmlNode, KmlPolygon, Placemark,
};
