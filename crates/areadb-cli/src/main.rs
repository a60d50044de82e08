//! areadb: command-line interface for areadb-core
//!
//! Builds a boundary registry from a directory of KML documents, answers
//! centroid lookups against it, and converts feature collections between
//! the supported formats.
//!
//! Usage examples
//! --------------
//!
//! - Build the registry (one subdirectory per description)
//!   $ areadb build ./gebieden -o gebiedsgrenzen.json --cache
//!
//! - Centroid of an area by identifier or file name
//!   $ areadb lookup 42
//!   $ areadb lookup 42.kml
//!
//! - Convert a GeoJSON file
//!   $ areadb export --format wkt map.geojson
//!   $ areadb export --format shapefile map.geojson -o wijken.zip
//!
//! - Import into canonical GeoJSON
//!   $ areadb import --format kml wijken.kml -o wijken.geojson
//!
//! Logs go to stderr; `RUST_LOG` overrides the `-v` level.
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use areadb_core::codec::{BusyIndicator, Dispatcher};
use areadb_core::io;
use areadb_core::registry::store::CACHE_SUFFIX;
use areadb_core::{BoundaryRegistry, BoundarySearch, Capabilities, ExportOptions, Format};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Reports the slow shapefile path on stderr.
struct StderrBusy;

impl BusyIndicator for StderrBusy {
    fn begin(&self) {
        eprintln!("Packing shapefile archive...");
    }

    fn end(&self) {
        tracing::info!("shapefile archive done");
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn capabilities(text_only: bool) -> Capabilities {
    if text_only {
        Capabilities::text_only()
    } else {
        Capabilities::full()
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    // Registry file (flag, then AREADB_REGISTRY, then the default name)
    let registry_path = args
        .registry
        .unwrap_or_else(|| PathBuf::from(BoundaryRegistry::default_registry_filename()));

    match args.command {
        Commands::Build { dir, output, cache } => {
            let output = output.unwrap_or(registry_path);
            let registry = BoundaryRegistry::build_from_dir(&dir)
                .with_context(|| format!("building registry from {}", dir.display()))?;
            registry
                .save_json(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            if cache {
                let cache_path = io::cache_path(&output, CACHE_SUFFIX);
                registry
                    .save_cache(&cache_path)
                    .with_context(|| format!("writing {}", cache_path.display()))?;
            }
            println!("Wrote {} records to {}", registry.len(), output.display());
        }

        Commands::Lookup { key } => {
            let registry = load(&registry_path)?;
            match registry.lookup(&key) {
                Some(c) => println!("[{}, {}]", c.latitude, c.longitude),
                None => {
                    eprintln!("No area found for: {key}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Records { description } => {
            let registry = load(&registry_path)?;
            let records = match &description {
                Some(d) => registry.records_in(d),
                None => registry.records().iter().collect(),
            };
            for r in records {
                let c = r.centroid();
                println!(
                    "{}\t{}\t{}\t[{}, {}]",
                    r.identifier, r.source_file_name, r.description, c.latitude, c.longitude
                );
            }
        }

        Commands::Stats => {
            let stats = load(&registry_path)?.stats();
            println!("Registry statistics:");
            println!("  Records: {}", stats.records);
            println!("  Descriptions: {}", stats.descriptions);
            println!("  Duplicate keys: {}", stats.duplicate_keys);
        }

        Commands::Formats { text_only } => {
            let dispatcher = Dispatcher::new(capabilities(text_only));
            println!("Export:");
            for f in dispatcher.available_exports() {
                println!("  {:<10} {:<10} {}", f.name(), f.title(), f.default_file_name());
            }
            println!("Import:");
            for f in dispatcher.available_imports() {
                println!("  {:<10} {}", f.name(), f.title());
            }
        }

        Commands::Export {
            format,
            input,
            output,
            name,
            quantize,
            text_only,
        } => {
            let format: Format = format.parse()?;
            let bytes = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let model = areadb_core::codec::import(Format::GeoJson, &bytes)
                .with_context(|| format!("parsing {}", input.display()))?
                .into_collection();

            let busy = StderrBusy;
            let dispatcher = Dispatcher::new(capabilities(text_only)).with_busy_indicator(&busy);
            let options = ExportOptions {
                file_name: None,
                document_name: name,
                quantization: quantize,
            };
            let artifact = dispatcher
                .export(format, &model, &options)
                .with_context(|| format!("exporting {} as {}", input.display(), format))?;

            // Encoded fully in memory; only now touch the destination.
            let target = output.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
            artifact
                .write_to(&target)
                .with_context(|| format!("writing {}", target.display()))?;
            println!("Wrote {} ({} bytes)", target.display(), artifact.bytes.len());
        }

        Commands::Import {
            format,
            input,
            output,
        } => {
            let format: Format = format.parse()?;
            let bytes = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
            let normalized = Dispatcher::default()
                .import_normalized(format, &bytes)
                .with_context(|| format!("importing {} as {}", input.display(), format))?;

            match normalized.warning() {
                Some(warning) => eprintln!("Warning: {warning}"),
                None => println!("Imported {} features.", normalized.collection.len()),
            }

            let artifact = areadb_core::codec::export(Format::GeoJson, &normalized.collection)?;
            let target = output.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
            artifact
                .write_to(&target)
                .with_context(|| format!("writing {}", target.display()))?;
        }
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<BoundaryRegistry> {
    BoundaryRegistry::load(path).with_context(|| format!("loading registry {}", path.display()))
}
