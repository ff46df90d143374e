//! Shared test utilities for integration tests.

#![allow(dead_code)]

use anyhow::Result;
use mdhere::{MathMode, MathRenderer, Preferences};
use std::path::{Path, PathBuf};

/// Math backend that wraps the source in a marker element.
///
/// Keeps assertions independent of KaTeX's exact markup.
pub struct MarkerMath;

impl MathRenderer for MarkerMath {
    fn render(&self, expression: &str, mode: MathMode) -> Result<String> {
        Ok(format!(
            "<span data-mode=\"{}\">{}</span>",
            if mode.is_display() { "display" } else { "inline" },
            expression
        ))
    }
}

/// Builds preferences from the three recognized options.
pub fn preferences(anchors: bool, math: bool, breaks: bool) -> Preferences {
    Preferences {
        header_anchors_enabled: anchors,
        math_enabled: math,
        gfm_line_breaks_enabled: breaks,
    }
}

/// Writes file under `dir`, creating parent directories as needed.
///
/// # Errors
///
/// Returns error if directory creation or file write fails
pub fn write_file(dir: &Path, path: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(path);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}
