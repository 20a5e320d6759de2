//! Vacuum command implementation.

use std::path::Path;

/// Runs the vacuum command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = super::open(path)?;
    let before = super::file_size(&db);

    db.vacuum()?;

    let description = db.connection()?.describe();
    println!("Vacuumed {description}");
    if let (Some(before), Some(after)) = (before, super::file_size(&db)) {
        println!("  Size before: {}", super::format_size(before));
        println!("  Size after:  {}", super::format_size(after));
    }
    Ok(())
}
