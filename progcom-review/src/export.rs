//! Assignment upload artifact
//!
//! The upstream's bulk-assignment endpoint accepts a JSON document of the
//! shape `[{"email": str, "proposals": [code, ...]}, ...]`. The document
//! round-trips losslessly so a saved file can be inspected and re-sent.

use std::path::Path;

use serde::{Deserialize, Serialize};

use progcom_common::Result;

/// One reviewer's assignment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub email: String,
    pub proposals: Vec<String>,
}

/// Serialize assignments into the upload shape.
pub fn to_json(assignments: &[Assignment]) -> Result<String> {
    Ok(serde_json::to_string_pretty(assignments)?)
}

/// Parse an upload document back into assignments.
pub fn from_json(json: &str) -> Result<Vec<Assignment>> {
    Ok(serde_json::from_str(json)?)
}

/// Write the upload document to a file.
pub fn save_assignments(assignments: &[Assignment], path: &Path) -> Result<()> {
    std::fs::write(path, to_json(assignments)?)?;
    tracing::info!(path = %path.display(), reviewers = assignments.len(), "assignments saved");
    Ok(())
}

/// Read an upload document from a file.
pub fn load_assignments(path: &Path) -> Result<Vec<Assignment>> {
    let content = std::fs::read_to_string(path)?;
    from_json(&content)
}
