//! Bulk export and import of the medication collection.
//!
//! Export produces a single JSON document holding the full collection.
//! Import is all-or-nothing: the payload must be a JSON array that
//! deserializes completely, otherwise it is rejected wholesale and the
//! existing collection stays untouched.

use crate::{Error, Medication, Result};
use std::path::Path;

/// Serialize the full medication collection to one JSON document
pub fn export_medications(medications: &[Medication]) -> Result<String> {
    Ok(serde_json::to_string_pretty(medications)?)
}

/// Export the collection to a file, creating parent directories as needed
pub fn export_to_file(medications: &[Medication], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, export_medications(medications)?)?;
    tracing::info!("Exported {} medications to {:?}", medications.len(), path);
    Ok(())
}

/// Parse an import payload into a replacement medication collection.
///
/// Only an array-shaped document is accepted; anything else is an
/// `Error::Import` the caller surfaces once to the user.
pub fn import_medications(json: &str) -> Result<Vec<Medication>> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| Error::Import(format!("not valid JSON: {}", e)))?;

    if !value.is_array() {
        return Err(Error::Import(
            "expected a JSON array of medications".into(),
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| Error::Import(format!("malformed medication entry: {}", e)))
}

/// Import a replacement collection from a file
pub fn import_from_file(path: &Path) -> Result<Vec<Medication>> {
    let contents = std::fs::read_to_string(path)?;
    let medications = import_medications(&contents)?;
    tracing::info!("Imported {} medications from {:?}", medications.len(), path);
    Ok(medications)
}
