//! # File I/O Module
//!
//! Reading action catalogs and code profiles, writing run reports:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **Version validation**: Input documents carry a schema version
//! - **Profile validation**: Profiles are checked before use
//!
//! ## File Formats
//!
//! All files are JSON. An input document lists the actions of one structure:
//!
//! ```json
//! {
//!   "schema_version": "0.1.0",
//!   "project": "Warehouse roof",
//!   "actions": [
//!     { "id": "G1", "category": "Permanent" },
//!     { "id": "Q1", "category": "Variable", "psi_group": "H" }
//!   ]
//! }
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use loadcomb_core::file_io::{load_input, save_run};
//! use loadcomb_core::combinations::LimitStateFamily;
//! use loadcomb_core::engine::GenerationContext;
//! use loadcomb_core::factors::preset;
//! use std::path::Path;
//!
//! let input = load_input(Path::new("roof.json"))?;
//! let catalog = input.into_catalog()?.freeze()?;
//! let result = GenerationContext::new(&catalog, preset("en1990")?).run(&LimitStateFamily::ALL);
//! save_run(&result, Path::new("roof.combinations.json"))?;
//! # Ok::<(), loadcomb_core::errors::ComboError>(())
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use semver::Version;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::actions::{Action, ActionCatalog};
use crate::engine::RunResult;
use crate::errors::{ComboError, ComboResult};
use crate::factors::CodeProfile;

/// Current input schema version
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Action definitions of one structure, as supplied by the model builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDocument {
    pub schema_version: String,

    /// Free-text project name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    pub actions: Vec<Action>,
}

impl InputDocument {
    /// Create a document at the current schema version
    pub fn new(actions: Vec<Action>) -> Self {
        InputDocument {
            schema_version: SCHEMA_VERSION.to_string(),
            project: None,
            actions,
        }
    }

    /// Register the actions in document order.
    ///
    /// Actions without a display name are named after their id.
    pub fn into_catalog(self) -> ComboResult<ActionCatalog> {
        ActionCatalog::from_actions(self.actions.into_iter().map(|mut action| {
            if action.name.is_empty() {
                action.name = action.id.clone();
            }
            action
        }))
    }
}

/// Load an input document and check its schema version.
///
/// # Returns
///
/// * `Ok(InputDocument)` - Successfully loaded document
/// * `Err(ComboError::VersionMismatch)` - File version is incompatible
/// * `Err(ComboError::SerializationError)` - Invalid JSON
/// * `Err(ComboError::FileError)` - I/O error
pub fn load_input(path: &Path) -> ComboResult<InputDocument> {
    let input: InputDocument = read_json(path)?;
    validate_version(&input.schema_version)?;
    Ok(input)
}

/// Load a code profile from a JSON file and validate its tables.
pub fn load_profile(path: &Path) -> ComboResult<CodeProfile> {
    let profile: CodeProfile = read_json(path)?;
    profile.validate()?;
    Ok(profile)
}

/// Save a run report (diagnostics and combinations) atomically.
///
/// Writes to a temporary file first, then renames it over the target, so an
/// interrupted save never leaves a truncated report behind.
pub fn save_run(result: &RunResult, path: &Path) -> ComboResult<()> {
    write_json_atomic(result, path)
}

/// Load a previously saved run report.
pub fn load_run(path: &Path) -> ComboResult<RunResult> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ComboResult<T> {
    let mut file = File::open(path).map_err(|e| {
        ComboError::file_error("open", path.display().to_string(), e.to_string())
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        ComboError::file_error("read", path.display().to_string(), e.to_string())
    })?;

    serde_json::from_str(&contents).map_err(|e| ComboError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })
}

fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> ComboResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ComboError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension("json.tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        ComboError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        ComboError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        ComboError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        ComboError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    tracing::debug!(path = %path.display(), bytes = json.len(), "saved");
    Ok(())
}

/// Validate that a file version is compatible with the current schema.
///
/// The major version must match. Before 1.0 a file with a newer minor
/// version is rejected.
fn validate_version(file_version: &str) -> ComboResult<()> {
    let mismatch = || ComboError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file = Version::parse(file_version).map_err(|_| mismatch())?;
    let current = Version::parse(SCHEMA_VERSION).map_err(|_| mismatch())?;

    if file.major != current.major {
        return Err(mismatch());
    }
    if current.major == 0 && file.minor > current.minor {
        return Err(mismatch());
    }
    Ok(())
}
