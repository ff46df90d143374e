//! Command line configuration.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

use crate::preferences::Preferences;

/// Command line configuration for mdhere.
#[derive(Debug, Clone, Parser)]
#[command(name = "mdhere", version, about, long_about = None)]
pub struct Config {
    /// Markdown input file, `-` or absent for stdin
    pub input: Option<PathBuf>,

    /// Output file, stdout when absent
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON preferences file
    #[arg(long)]
    pub prefs: Option<PathBuf>,

    /// Inject heading anchors and slugify fragment links
    #[arg(long)]
    pub header_anchors: bool,

    /// Typeset $...$ and $$...$$ math
    #[arg(long)]
    pub math: bool,

    /// Treat newlines in paragraphs as line breaks
    #[arg(long)]
    pub gfm_line_breaks: bool,

    /// Wrap output in a complete HTML document
    #[arg(long)]
    pub standalone: bool,

    /// Document title for --standalone
    #[arg(long, default_value = "Markdown")]
    pub title: String,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the input or preferences file does not exist.
    pub fn validate(&self) -> Result<()> {
        if let Some(input) = self.input_path() {
            if !input.exists() {
                bail!("Input file does not exist: {}", input.display());
            }
        }

        if let Some(prefs) = &self.prefs {
            if !prefs.exists() {
                bail!("Preferences file does not exist: {}", prefs.display());
            }
        }

        Ok(())
    }

    /// Input file path, `None` when reading stdin.
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_os_str() != "-")
    }

    /// Resolves preferences from the prefs file and command line flags.
    ///
    /// Flags only turn options on; they never disable an option set in the
    /// preferences file.
    ///
    /// # Errors
    ///
    /// Returns error if the preferences file cannot be read or parsed.
    pub fn preferences(&self) -> Result<Preferences> {
        let mut preferences = match &self.prefs {
            Some(path) => Preferences::from_file(path)?,
            None => Preferences::default(),
        };

        preferences.header_anchors_enabled |= self.header_anchors;
        preferences.math_enabled |= self.math;
        preferences.gfm_line_breaks_enabled |= self.gfm_line_breaks;

        Ok(preferences)
    }
}
