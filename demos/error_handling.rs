//! Error handling example for areadb-rs
//!
//! This example demonstrates the error kinds callers are expected to match on.

use areadb_rs::codec;
use areadb_rs::{extract_from_str, AreaError, FeatureCollection, Format, Result};

fn main() -> Result<()> {
    println!("=== areadb-rs Error Handling Example ===\n");

    // Example 1: Boundary extraction failures
    println!("--- Example 1: Broken KML documents ---");
    let cases = [
        ("empty.kml", "<kml><Document/></kml>"),
        (
            "unnamed.kml",
            "<kml><Placemark><Polygon><outerBoundaryIs><LinearRing><coordinates>1,1 2,2</coordinates></LinearRing></outerBoundaryIs></Polygon></Placemark></kml>",
        ),
        (
            "hollow.kml",
            "<kml><Placemark><name>7</name><Polygon><outerBoundaryIs><LinearRing><coordinates> </coordinates></LinearRing></outerBoundaryIs></Polygon></Placemark></kml>",
        ),
        ("garbage.kml", "<kml><Placemark>"),
    ];
    for (file, text) in cases {
        match extract_from_str(text, "AREA", file) {
            Ok(record) => println!("  {file}: ok ({})", record.identifier),
            Err(AreaError::MalformedGeometry { reason, .. }) => {
                println!("  {file}: malformed ({reason})")
            }
            Err(AreaError::EmptyRing { .. }) => println!("  {file}: empty outer ring"),
            Err(e) => println!("  {file}: {e}"),
        }
    }
    println!();

    // Example 2: Nothing to write
    println!("--- Example 2: Empty exports ---");
    let empty = FeatureCollection::new();
    match codec::export(Format::Wkt, &empty) {
        Err(AreaError::EmptyCollection { format }) => println!("  {format}: nothing to export"),
        other => println!("  unexpected: {other:?}"),
    }
    let geojson = codec::export(Format::GeoJson, &empty)?;
    println!("  GeoJSON: {}", String::from_utf8_lossy(&geojson.bytes));
    println!();

    // Example 3: Unknown or unsupported formats
    println!("--- Example 3: Formats ---");
    match "gpx".parse::<Format>() {
        Ok(f) => println!("  parsed {f}"),
        Err(e) => println!("  {e}"),
    }
    match codec::import(Format::Csv, b"lon,lat\n1,2\n") {
        Ok(_) => println!("  unexpected csv import"),
        Err(e) => println!("  {e}"),
    }
    println!();

    // Example 4: Partial imports are not errors
    println!("--- Example 4: Partial import ---");
    let input = br#"{"type":"FeatureCollection","features":[
        {"type":"Feature","geometry":{"type":"Point","coordinates":[5,52]},"properties":{}},
        {"type":"Feature","geometry":{"type":"Blob"},"properties":{}}
    ]}"#;
    let normalized = codec::import(Format::GeoJson, input)?;
    match normalized.warning() {
        Some(w) => println!("  warning: {w}"),
        None => println!("  all features imported"),
    }

    Ok(())
}
