// crates/areadb-core/src/codec/mod.rs

//! # Format Codec Dispatcher
//!
//! A table of named formats, each with a pure exporter
//! (`FeatureCollection -> bytes`) and/or importer (`bytes -> ParsedInput`).
//!
//! | Format    | Export | Import |
//! |-----------|--------|--------|
//! | GeoJSON   | yes    | yes    |
//! | TopoJSON  | yes    | no     |
//! | CSV       | yes    | no     |
//! | KML       | yes    | yes    |
//! | WKT       | yes    | yes    |
//! | Shapefile | yes, needs binary buffers | no |
//!
//! Encoders never write anywhere: the whole artifact is built in memory
//! and only then handed to the caller (see [`Artifact::write_to`]).

pub mod archive;
mod busy;
mod dbf;
pub mod dsv;
pub mod geojson;
pub mod kml;
pub mod shapefile;
pub mod topojson;
pub mod wkt;

pub use busy::{BusyGuard, BusyIndicator, NoBusy};
pub use kml::KmlOptions;
pub use topojson::TopologyOptions;

use crate::error::{AreaError, Result};
use crate::geometry::FeatureCollection;
use crate::io;
use crate::normalize::{normalize, Normalized, ParsedInput};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

// -----------------------------------------------------------------------------
// FORMATS
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    GeoJson,
    TopoJson,
    Csv,
    Kml,
    Wkt,
    Shapefile,
}

impl Format {
    /// Every format, in menu order.
    pub const ALL: [Format; 6] = [
        Format::GeoJson,
        Format::TopoJson,
        Format::Csv,
        Format::Kml,
        Format::Wkt,
        Format::Shapefile,
    ];

    /// Stable lower-case identifier.
    pub fn name(self) -> &'static str {
        match self {
            Format::GeoJson => "geojson",
            Format::TopoJson => "topojson",
            Format::Csv => "csv",
            Format::Kml => "kml",
            Format::Wkt => "wkt",
            Format::Shapefile => "shapefile",
        }
    }

    /// Human-readable label.
    pub fn title(self) -> &'static str {
        match self {
            Format::GeoJson => "GeoJSON",
            Format::TopoJson => "TopoJSON",
            Format::Csv => "CSV",
            Format::Kml => "KML",
            Format::Wkt => "WKT",
            Format::Shapefile => "Shapefile",
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            Format::GeoJson => "map.geojson",
            Format::TopoJson => "map.topojson",
            Format::Csv => "points.csv",
            Format::Kml => "map.kml",
            Format::Wkt => "map.wkt",
            Format::Shapefile => "map.zip",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Format::GeoJson => "application/geo+json",
            Format::TopoJson => "application/json",
            Format::Csv => "text/csv; charset=utf-8",
            Format::Kml => "application/vnd.google-earth.kml+xml",
            Format::Wkt => "text/plain; charset=utf-8",
            Format::Shapefile => "application/zip",
        }
    }

    pub fn can_export(self) -> bool {
        true
    }

    pub fn can_import(self) -> bool {
        matches!(self, Format::GeoJson | Format::Kml | Format::Wkt)
    }

    /// Whether the encoder needs binary buffer support from the host.
    pub fn requires_binary_buffers(self) -> bool {
        matches!(self, Format::Shapefile)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

static FORMAT_ALIASES: Lazy<HashMap<&'static str, Format>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for format in Format::ALL {
        m.insert(format.name(), format);
    }
    m.insert("json", Format::GeoJson);
    m.insert("topo", Format::TopoJson);
    m.insert("dsv", Format::Csv);
    m.insert("shp", Format::Shapefile);
    m.insert("zip", Format::Shapefile);
    m
});

impl FromStr for Format {
    type Err = AreaError;

    /// Case-insensitive; accepts names, titles and common extensions.
    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().trim_start_matches('.').to_ascii_lowercase();
        FORMAT_ALIASES
            .get(key.as_str())
            .copied()
            .ok_or_else(|| AreaError::unsupported(s, "unknown format"))
    }
}

// -----------------------------------------------------------------------------
// CONFIGURATION
// -----------------------------------------------------------------------------

/// What the host environment can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Raw binary buffers are available (required by the shapefile encoder).
    pub binary_buffers: bool,
}

impl Capabilities {
    pub fn full() -> Self {
        Capabilities {
            binary_buffers: true,
        }
    }

    /// A host that can only hand out text.
    pub fn text_only() -> Self {
        Capabilities {
            binary_buffers: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// Caller-supplied metadata for one export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Overrides [`Format::default_file_name`].
    pub file_name: Option<String>,
    /// Document title for markup output.
    pub document_name: Option<String>,
    /// Quantization for topology output (`None` keeps exact coordinates).
    pub quantization: Option<u32>,
}

/// The encoded result of an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Hands the artifact to the file system atomically.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        io::write_atomic(path.as_ref(), &self.bytes)
    }
}

// -----------------------------------------------------------------------------
// DISPATCHER
// -----------------------------------------------------------------------------

pub struct Dispatcher<'a> {
    capabilities: Capabilities,
    busy: &'a dyn BusyIndicator,
}

impl Default for Dispatcher<'_> {
    fn default() -> Self {
        Dispatcher::new(Capabilities::default())
    }
}

impl<'a> Dispatcher<'a> {
    pub fn new(capabilities: Capabilities) -> Self {
        Dispatcher {
            capabilities,
            busy: &NoBusy,
        }
    }

    /// Attaches the indicator that is raised around slow encoders.
    pub fn with_busy_indicator(mut self, busy: &'a dyn BusyIndicator) -> Self {
        self.busy = busy;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Export targets available here. Formats whose capability is missing
    /// are left out entirely rather than listed as disabled.
    pub fn available_exports(&self) -> Vec<Format> {
        Format::ALL
            .into_iter()
            .filter(|f| f.can_export() && self.supports(*f))
            .collect()
    }

    pub fn available_imports(&self) -> Vec<Format> {
        Format::ALL
            .into_iter()
            .filter(|f| f.can_import() && self.supports(*f))
            .collect()
    }

    fn supports(&self, format: Format) -> bool {
        !format.requires_binary_buffers() || self.capabilities.binary_buffers
    }

    /// Encodes a snapshot of the model.
    ///
    /// # Errors
    ///
    /// - [`AreaError::UnsupportedFormat`] when the format needs a capability
    ///   this dispatcher lacks;
    /// - [`AreaError::EmptyCollection`] from encoders that need features;
    /// - any encoder failure, unchanged.
    pub fn export(
        &self,
        format: Format,
        model: &FeatureCollection,
        options: &ExportOptions,
    ) -> Result<Artifact> {
        if !format.can_export() {
            return Err(AreaError::unsupported(format.name(), "export is not available"));
        }
        if !self.supports(format) {
            return Err(AreaError::unsupported(
                format.name(),
                "binary buffers are not available in this environment",
            ));
        }

        let bytes = match format {
            Format::GeoJson => geojson::encode(model)?,
            Format::TopoJson => topojson::encode(
                model,
                &TopologyOptions {
                    quantization: options.quantization,
                    ..Default::default()
                },
            )?,
            Format::Csv => dsv::encode(model)?,
            Format::Kml => kml::encode(
                model,
                &KmlOptions {
                    document_name: options.document_name.clone(),
                    ..Default::default()
                },
            )?,
            Format::Wkt => wkt::encode(model)?,
            Format::Shapefile => {
                let _busy = BusyGuard::acquire(self.busy);
                shapefile::encode(model)?
            }
        };

        info!(
            format = format.name(),
            features = model.len(),
            bytes = bytes.len(),
            "exported feature collection"
        );

        Ok(Artifact {
            file_name: options
                .file_name
                .clone()
                .unwrap_or_else(|| format.default_file_name().to_string()),
            media_type: format.media_type(),
            bytes,
        })
    }

    /// Parses bytes with the format's reader. The result still has to go
    /// through [`normalize`]; see [`Dispatcher::import_normalized`].
    pub fn import(&self, format: Format, bytes: &[u8]) -> Result<ParsedInput> {
        match format {
            Format::GeoJson => geojson::decode(bytes),
            Format::Kml => kml::decode(bytes),
            Format::Wkt => wkt::decode(bytes),
            other => Err(AreaError::unsupported(other.name(), "import is not available")),
        }
    }

    pub fn import_normalized(&self, format: Format, bytes: &[u8]) -> Result<Normalized> {
        let normalized = normalize(self.import(format, bytes)?)?;
        info!(
            format = format.name(),
            features = normalized.collection.len(),
            dropped = normalized.dropped,
            "imported feature collection"
        );
        Ok(normalized)
    }
}

/// Exports with default capabilities and options.
pub fn export(format: Format, model: &FeatureCollection) -> Result<Artifact> {
    Dispatcher::default().export(format, model, &ExportOptions::default())
}

/// Imports and normalizes with default capabilities.
pub fn import(format: Format, bytes: &[u8]) -> Result<Normalized> {
    Dispatcher::default().import_normalized(format, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Feature, Geometry};

    #[test]
    fn parses_names_titles_and_extensions() {
        assert_eq!("GeoJSON".parse::<Format>().unwrap(), Format::GeoJson);
        assert_eq!(".shp".parse::<Format>().unwrap(), Format::Shapefile);
        assert_eq!("dsv".parse::<Format>().unwrap(), Format::Csv);
        assert!(matches!(
            "gpx".parse::<Format>(),
            Err(AreaError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn shapefile_is_absent_without_binary_buffers() {
        let text_only = Dispatcher::new(Capabilities::text_only());
        assert!(!text_only.available_exports().contains(&Format::Shapefile));
        assert_eq!(text_only.available_exports().len(), 5);

        let model = FeatureCollection::from_features(vec![Feature::new(Geometry::point(1.0, 2.0))]);
        let err = text_only
            .export(Format::Shapefile, &model, &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, AreaError::UnsupportedFormat { ref format, .. } if format == "shapefile"));

        assert!(Dispatcher::default()
            .available_exports()
            .contains(&Format::Shapefile));
    }

    #[test]
    fn export_uses_default_or_caller_file_name() {
        let model = FeatureCollection::new();
        let artifact = export(Format::GeoJson, &model).unwrap();
        assert_eq!(artifact.file_name, "map.geojson");

        let named = Dispatcher::default()
            .export(
                Format::GeoJson,
                &model,
                &ExportOptions {
                    file_name: Some("wijk.geojson".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(named.file_name, "wijk.geojson");
    }

    #[test]
    fn export_only_formats_reject_import() {
        for format in [Format::TopoJson, Format::Csv, Format::Shapefile] {
            assert!(matches!(
                Dispatcher::default().import(format, b""),
                Err(AreaError::UnsupportedFormat { .. })
            ));
        }
        assert_eq!(
            Dispatcher::default().available_imports(),
            vec![Format::GeoJson, Format::Kml, Format::Wkt]
        );
    }
}
