//! Basic usage example for areadb-rs
//!
//! This example demonstrates how to:
//! - Build a boundary registry from KML documents held in memory
//! - Look up centroids by identifier or file name
//! - Persist the registry and load it back

use areadb_rs::{
    BoundaryRegistry, BoundarySearch, Result, SourceDocument, SourceGroup,
};

fn square_kml(name: &str, lon: f64, lat: f64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document><Placemark>
<name>{name}</name>
<Polygon><outerBoundaryIs><LinearRing><coordinates>
{lon},{lat},0 {lon2},{lat},0 {lon2},{lat2},0 {lon},{lat2},0 {lon},{lat},0
</coordinates></LinearRing></outerBoundaryIs></Polygon>
</Placemark></Document></kml>"#,
        lon2 = lon + 0.1,
        lat2 = lat + 0.1,
    )
}

fn main() -> Result<()> {
    println!("=== areadb-rs Basic Usage Example ===\n");

    // Example 1: Build from in-memory groups
    println!("--- Example 1: Build a registry ---");
    let groups = vec![
        SourceGroup {
            description: "AREA".to_string(),
            documents: vec![
                SourceDocument::new("42.kml", square_kml("42", 6.0, 52.0)),
                SourceDocument::new("43.kml", square_kml("43", 6.1, 52.0)),
            ],
        },
        SourceGroup {
            description: "SCHALKHAAR".to_string(),
            documents: vec![SourceDocument::new("S9.kml", square_kml("S9", 6.2, 52.3))],
        },
    ];
    let registry = BoundaryRegistry::build(groups)?;
    println!("Records: {}", registry.len());
    println!();

    // Example 2: Lookups
    println!("--- Example 2: Centroid lookups ---");
    for key in ["42", "43.kml", "S9", "nope"] {
        match registry.lookup(key) {
            Some(c) => println!("  {key:<8} -> [{:.4}, {:.4}]", c.latitude, c.longitude),
            None => println!("  {key:<8} -> not found"),
        }
    }
    println!();

    // Example 3: Records per description
    println!("--- Example 3: Records in AREA ---");
    for r in registry.records_in("AREA") {
        println!("  {} ({})", r.identifier, r.source_file_name);
    }
    println!();

    // Example 4: Save and reload
    println!("--- Example 4: Persistence ---");
    let dir = std::env::temp_dir().join("areadb-basic-usage");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(BoundaryRegistry::default_registry_filename());
    registry.save_json(&path)?;
    let loaded = BoundaryRegistry::load(&path)?;
    println!("Reloaded {} records from {}", loaded.len(), path.display());
    let stats = loaded.stats();
    println!(
        "  descriptions: {}, duplicate keys: {}",
        stats.descriptions, stats.duplicate_keys
    );

    Ok(())
}
