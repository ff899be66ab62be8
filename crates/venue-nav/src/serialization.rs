use crate::error::PersistError;
use crate::graph_state::NavGraph;
use std::path::Path;
use tracing::{debug, warn};

// ------------------------------------------------------------------
// JSON
// ------------------------------------------------------------------

pub fn to_json(graph: &NavGraph) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(graph)?)
}

/// Parse a revision and run the integrity checks. Revisions with
/// structural errors are rejected; warnings are only logged. The grid
/// size is pulled back into its slider range.
pub fn from_json(json: &str) -> Result<NavGraph, PersistError> {
    let mut graph: NavGraph = serde_json::from_str(json)?;
    graph.settings = graph.settings.sanitized();
    let report = graph.validate();
    if !report.is_valid() {
        return Err(PersistError::Invalid(report.errors));
    }
    if !report.warnings.is_empty() {
        warn!(
            revision = %graph.id,
            warnings = report.warnings.len(),
            "revision loaded with warnings"
        );
    }
    Ok(graph)
}

// ------------------------------------------------------------------
// File I/O operations
// ------------------------------------------------------------------

pub fn save_to_file(
    graph: &NavGraph,
    path: &Path,
) -> Result<(), PersistError> {
    let json = to_json(graph)?;
    std::fs::write(path, json)?;
    debug!(path = %path.display(), "saved revision");
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<NavGraph, PersistError> {
    let json = std::fs::read_to_string(path)?;
    let graph = from_json(&json)?;
    debug!(path = %path.display(), nodes = graph.nodes().len(), "loaded revision");
    Ok(graph)
}

/// Read a revision without integrity checks, for tooling that reports
/// on broken files.
pub fn read_unchecked(path: &Path) -> Result<NavGraph, PersistError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
