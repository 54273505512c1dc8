//! Built-in code profiles.
//!
//! Presets are plain profile JSON files under `loadcomb_core/profiles/`,
//! embedded at build time and parsed on first use. Adding a national annex
//! means adding a file; no code changes.
//!
//! | Name        | Code / annex        | Senses (ULS) |
//! |-------------|---------------------|--------------|
//! | `en1990`    | EN 1990 recommended | Exhaustive   |
//! | `en1990-es` | EN 1990 / CTE DB-SE | Uniform      |
//!
//! # Example
//! ```
//! use loadcomb_core::factors::preset;
//!
//! let profile = preset("en1990").unwrap();
//! assert_eq!(profile.code, "EN 1990");
//! assert!(preset("nope").is_err());
//! ```

use once_cell::sync::Lazy;
use rust_embed::RustEmbed;

use super::profile::CodeProfile;
use crate::errors::{ComboError, ComboResult};

#[derive(RustEmbed)]
#[folder = "profiles/"]
struct PresetFiles;

static PRESETS: Lazy<ComboResult<Vec<CodeProfile>>> = Lazy::new(load_presets);

fn load_presets() -> ComboResult<Vec<CodeProfile>> {
    let mut profiles = Vec::new();
    for file in PresetFiles::iter() {
        let embedded = PresetFiles::get(&file).ok_or_else(|| {
            ComboError::file_error("read embedded profile", file.to_string(), "missing from embedded assets")
        })?;
        let profile: CodeProfile =
            serde_json::from_slice(&embedded.data).map_err(|e| ComboError::SerializationError {
                reason: format!("Invalid preset {}: {}", file, e),
            })?;
        profile.validate()?;
        profiles.push(profile);
    }
    profiles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(profiles)
}

/// All built-in profiles, sorted by name
pub fn presets() -> ComboResult<&'static [CodeProfile]> {
    PRESETS.as_deref().map_err(Clone::clone)
}

/// Names of the built-in profiles
pub fn preset_names() -> ComboResult<Vec<&'static str>> {
    Ok(presets()?.iter().map(|p| p.name.as_str()).collect())
}

/// Look up a built-in profile by name.
///
/// # Errors
///
/// `ComboError::UnknownProfile` if no preset has that name.
pub fn preset(name: &str) -> ComboResult<&'static CodeProfile> {
    presets()?
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ComboError::UnknownProfile {
            name: name.to_string(),
        })
}
