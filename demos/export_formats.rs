//! Export example for areadb-rs
//!
//! Encodes one small feature collection in every available format and
//! imports the text formats back.

use areadb_rs::codec::{self, NoBusy};
use areadb_rs::{
    Capabilities, Dispatcher, ExportOptions, Feature, FeatureCollection, Format, Geometry,
    Position, Result,
};

fn ring(x: f64, y: f64) -> Vec<Position> {
    vec![
        Position::new(x, y),
        Position::new(x + 1.0, y),
        Position::new(x + 1.0, y + 1.0),
        Position::new(x, y + 1.0),
        Position::new(x, y),
    ]
}

fn main() -> Result<()> {
    println!("=== areadb-rs Export Formats Example ===\n");

    let model = FeatureCollection::from_features(vec![
        Feature::new(Geometry::polygon(vec![ring(0.0, 0.0)]))
            .with_property("name", "West")
            .with_property("inwoners", 1200i64),
        Feature::new(Geometry::polygon(vec![ring(1.0, 0.0)]))
            .with_property("name", "Oost")
            .with_property("inwoners", 800i64),
        Feature::new(Geometry::point(0.5, 0.5)).with_property("name", "Kerk"),
    ]);

    // Example 1: Every export the environment allows
    println!("--- Example 1: Export ---");
    let dispatcher = Dispatcher::new(Capabilities::full()).with_busy_indicator(&NoBusy);
    let options = ExportOptions {
        document_name: Some("Wijken".to_string()),
        ..ExportOptions::default()
    };
    for format in dispatcher.available_exports() {
        let artifact = dispatcher.export(format, &model, &options)?;
        println!(
            "  {:<10} {:<16} {:>6} bytes  {}",
            format.name(),
            artifact.file_name,
            artifact.bytes.len(),
            artifact.media_type
        );
    }
    println!();

    // Example 2: Text-only environments lose the shapefile
    println!("--- Example 2: Text-only capabilities ---");
    let text_only = Dispatcher::new(Capabilities::text_only());
    let names: Vec<_> = text_only.available_exports().iter().map(|f| f.name()).collect();
    println!("  available: {}", names.join(", "));
    match text_only.export(Format::Shapefile, &model, &options) {
        Ok(_) => println!("  unexpected shapefile"),
        Err(e) => println!("  shapefile: {e}"),
    }
    println!();

    // Example 3: WKT text
    println!("--- Example 3: WKT ---");
    let wkt = codec::export(Format::Wkt, &model)?;
    println!("{}", String::from_utf8_lossy(&wkt.bytes));
    println!();

    // Example 4: Import round trip
    println!("--- Example 4: Import ---");
    for format in [Format::GeoJson, Format::Kml, Format::Wkt] {
        let artifact = codec::export(format, &model)?;
        let normalized = codec::import(format, &artifact.bytes)?;
        println!(
            "  {:<8} -> {} features (dropped {})",
            format.name(),
            normalized.collection.len(),
            normalized.dropped
        );
    }

    Ok(())
}
