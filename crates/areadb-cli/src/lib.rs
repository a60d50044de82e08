//! areadb-cli
//! ==========
//!
//! Command-line interface for the `areadb-core` boundary registry and
//! format codecs.
//!
//! This crate primarily provides a binary (`areadb`). The library target
//! only carries this overview page. See the README for full usage examples.
//!
//! Quick start
//! -----------
//!
//! ```text
//! areadb --help
//! areadb build ./gebieden --cache
//! areadb lookup 42.kml
//! areadb export --format topojson wijken.geojson --quantize 10000
//! areadb import --format wkt shapes.wkt -o shapes.geojson
//! ```
//!
//! The registry file defaults to `gebiedsgrenzen.json` in the working
//! directory; pass `--registry` or set `AREADB_REGISTRY` to change it.
//!
//! For programmatic access use the [`areadb-core`] crate directly.
//!
#![cfg_attr(docsrs, feature(doc_cfg))]

// No API here; the binary is the deliverable.
