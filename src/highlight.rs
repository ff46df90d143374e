//! Syntax highlighting for fenced code blocks with syntect.

use anyhow::{Context, Result};
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// CSS class prefix for highlighted tokens.
///
/// Matches highlight.js stylesheet conventions so existing themes apply.
pub const CLASS_PREFIX: &str = "hljs-";

/// Highlights code for a given language tag.
///
/// Implementations return `Ok(None)` when the language is not known, which
/// tells the renderer to fall back to the escaped original code.
pub trait CodeHighlighter {
    /// Highlights `code` written in `language`.
    ///
    /// # Arguments
    ///
    /// * `code`: Raw code block contents (not HTML escaped)
    /// * `language`: Lower-cased language tag from the fence info string
    ///
    /// # Returns
    ///
    /// HTML with highlighting markup, or `None` for unknown languages
    ///
    /// # Errors
    ///
    /// Returns error if the highlighter fails on a known language
    fn highlight(&self, code: &str, language: &str) -> Result<Option<String>>;
}

/// Highlighter backed by syntect's bundled syntax definitions.
///
/// Produces `<span class="hljs-*">` markup using CSS class names instead
/// of inline styles.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
}

impl SyntectHighlighter {
    /// Creates highlighter with syntect's default syntax set.
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    /// Returns true when a syntax is registered for the language tag.
    pub fn supports(&self, language: &str) -> bool {
        self.syntax_set.find_syntax_by_token(language).is_some()
            || self.syntax_set.find_syntax_by_extension(language).is_some()
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: &str) -> Result<Option<String>> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(language)
            .or_else(|| self.syntax_set.find_syntax_by_extension(language));

        let Some(syntax) = syntax else {
            return Ok(None);
        };

        if code.is_empty() {
            return Ok(Some(String::new()));
        }

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            ClassStyle::SpacedPrefixed {
                prefix: CLASS_PREFIX,
            },
        );

        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .with_context(|| format!("Failed to highlight {} line", language))?;
        }

        Ok(Some(generator.finalize()))
    }
}

/// Highlighter that recognizes no language.
///
/// Every code block renders as escaped plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHighlighter;

impl CodeHighlighter for NoHighlighter {
    fn highlight(&self, _code: &str, _language: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Escapes HTML special characters.
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
