//! User rendering preferences.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Rendering options chosen by the user.
///
/// Deserialized from the flat JSON object the extension stores, using
/// kebab-case keys. Keys this renderer does not recognize are ignored and
/// missing keys default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Preferences {
    /// Inject an anchor before each heading and slugify fragment links.
    pub header_anchors_enabled: bool,
    /// Typeset `$...$` and `$$...$$` spans.
    pub math_enabled: bool,
    /// Treat single newlines in paragraphs as hard line breaks.
    pub gfm_line_breaks_enabled: bool,
}

impl Preferences {
    /// Parses preferences from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns error if the input is not a JSON object or a recognized key
    /// has a non-boolean value.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse preferences JSON")
    }

    /// Reads preferences from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read preferences: {}", path.display()))?;
        Self::from_json(&json)
    }
}
