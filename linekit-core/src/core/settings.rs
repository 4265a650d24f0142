//! Toolkit settings persisted as a JSON file.

use crate::{FieldMap, MatchMode, Result, SubmitOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Persisted toolkit settings. Every key is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// How sublist match values are compared with stored cells.
    pub match_mode: MatchMode,
    /// Options used by `Toolkit::submit_record`.
    pub submit: SubmitOptions,
    /// Record type to the fields that must be non-empty on submit.
    pub mandatory_fields: BTreeMap<String, Vec<String>>,
    /// Record type to values filled into absent fields when sourcing.
    pub sourcing_defaults: BTreeMap<String, FieldMap>,
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Settings {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable settings file {}: {e}", path.display());
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

/// Saves settings to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`crate::LinekitError::Io`] if the directory or file cannot be
/// written, or [`crate::LinekitError::Json`] if serialization fails.
pub fn save_settings<P: AsRef<Path>>(path: P, settings: &Settings) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}
