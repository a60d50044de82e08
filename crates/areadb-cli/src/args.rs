use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for areadb
#[derive(Debug, Parser)]
#[command(
    name = "areadb",
    version,
    about = "Build and query area boundary registries; convert feature collections between formats"
)]
pub struct CliArgs {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Registry JSON file (default: gebiedsgrenzen.json)
    #[arg(short = 'r', long = "registry", env = "AREADB_REGISTRY", global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the registry from a directory of KML documents
    Build {
        /// Root directory; each subdirectory is one description group
        dir: PathBuf,

        /// Output file (defaults to the registry path)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Also write the binary cache next to the output
        #[arg(long)]
        cache: bool,
    },

    /// Print the centroid `[lat, lon]` for an identifier or file name
    Lookup {
        /// Identifier (e.g. 42) or source file name (e.g. 42.kml)
        key: String,
    },

    /// List registry records
    Records {
        /// Only records with this description
        #[arg(short = 'd', long = "description")]
        description: Option<String>,
    },

    /// Show a summary of the registry contents
    Stats,

    /// List the available export and import formats
    Formats {
        /// Pretend binary buffers are unavailable
        #[arg(long)]
        text_only: bool,
    },

    /// Export a GeoJSON feature collection to another format
    Export {
        /// Target format (geojson, topojson, csv, kml, wkt, shapefile)
        #[arg(short = 'f', long = "format")]
        format: String,

        /// GeoJSON input file
        input: PathBuf,

        /// Output file (defaults to the format's file name)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Document name for markup output
        #[arg(long)]
        name: Option<String>,

        /// Quantization for topology output
        #[arg(long = "quantize")]
        quantize: Option<u32>,

        /// Pretend binary buffers are unavailable
        #[arg(long)]
        text_only: bool,
    },

    /// Import a file and write it as normalized GeoJSON
    Import {
        /// Source format (geojson, kml, wkt)
        #[arg(short = 'f', long = "format")]
        format: String,

        /// Input file
        input: PathBuf,

        /// Output file (default: map.geojson)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}
