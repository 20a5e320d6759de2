//! CLI command implementations.

pub mod inspect;
pub mod vacuum;

use std::path::Path;
use swapdb_core::{CoreResult, SubstitutableDatabase};

/// Opens the backend the environment selects for `path`, with no schemas.
pub fn open(path: &Path) -> CoreResult<SubstitutableDatabase> {
    SubstitutableDatabase::open(path, Vec::new())
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Size of the embedded database file, if there is one.
fn file_size(db: &SubstitutableDatabase) -> Option<u64> {
    if db.backend_config().is_networked() {
        return None;
    }
    std::fs::metadata(db.path()).ok().map(|m| m.len())
}
