//! Inspect command implementation.

use serde::Serialize;
use std::path::Path;
use swapdb_core::SubstitutableDatabase;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Backend name.
    pub backend: String,
    /// What the engine is connected to.
    pub target: String,
    /// Database file size in bytes, for the embedded backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// User tables, sorted by name.
    pub tables: Vec<String>,
}

/// Collects the inspection result for an open database.
pub fn inspect(db: &mut SubstitutableDatabase) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let file_size = super::file_size(db);
    let engine = db.connection_mut()?;
    let mut tables = engine.table_names()?;
    tables.sort();

    Ok(InspectResult {
        backend: engine.kind().to_string(),
        target: engine.describe(),
        file_size,
        tables,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = super::open(path)?;
    let result = inspect(&mut db)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("swapdb Database Inspection");
    println!("==========================");
    println!();
    println!("Backend: {}", result.backend);
    println!("Target:  {}", result.target);
    if let Some(size) = result.file_size {
        println!("Size:    {}", super::format_size(size));
    }
    println!();
    println!("Tables ({}):", result.tables.len());
    for table in &result.tables {
        println!("  {table}");
    }
}
