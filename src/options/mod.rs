//! Centralized viewer options with TOML preset support.
//!
//! Overlay colors, pointer timing, merge granularity and fast-preview
//! settings are consolidated here. Options serialize to/from TOML so a
//! host can keep named presets on disk.

mod display;
mod interaction;
mod merge;
mod preview;

use std::path::Path;

pub use display::DisplayOptions;
pub use interaction::InteractionOptions;
pub use merge::{MergeOptions, MergeStrategy};
pub use preview::{PreviewOptions, PreviewStrategy};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::StrataError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[merge]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Overlay colors.
    pub display: DisplayOptions,
    /// Pointer timing.
    pub interaction: InteractionOptions,
    /// Merged-geometry batching.
    pub merge: MergeOptions,
    /// Fast-preview proxies.
    pub preview: PreviewOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::Io`] if the file cannot be read and
    /// [`StrataError::OptionsParse`] if it is not valid options TOML.
    pub fn load(path: &Path) -> Result<Self, StrataError> {
        let content = std::fs::read_to_string(path).map_err(StrataError::Io)?;
        toml::from_str(&content)
            .map_err(|e| StrataError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::OptionsParse`] if serialization fails and
    /// [`StrataError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), StrataError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StrataError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StrataError::Io)?;
        }
        std::fs::write(path, content).map_err(StrataError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}
