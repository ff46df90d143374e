//! Math typesetting backends.

use anyhow::Result;

use crate::highlight::escape_html;

/// How a math expression is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    /// `$...$`, rendered within the surrounding line.
    Inline,
    /// `$$...$$`, rendered as a centered block.
    Display,
}

impl MathMode {
    /// Source delimiter for this mode.
    pub fn delimiter(&self) -> &'static str {
        match self {
            MathMode::Inline => "$",
            MathMode::Display => "$$",
        }
    }

    /// Returns true for display (block) math.
    pub fn is_display(&self) -> bool {
        matches!(self, MathMode::Display)
    }
}

/// Typesets a single math expression into HTML.
pub trait MathRenderer {
    /// Renders `expression` (without delimiters) in the given mode.
    ///
    /// # Errors
    ///
    /// Returns error if the expression cannot be typeset. Callers fall back
    /// to [`source_fallback`].
    fn render(&self, expression: &str, mode: MathMode) -> Result<String>;
}

/// Escaped, delimited source of an expression.
///
/// Used when typesetting is unavailable or fails so the reader still sees
/// what was written.
pub fn source_fallback(expression: &str, mode: MathMode) -> String {
    let delimiter = mode.delimiter();
    escape_html(&format!("{delimiter}{expression}{delimiter}"))
}

/// Renderer that never typesets and emits the original source.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainMathRenderer;

impl MathRenderer for PlainMathRenderer {
    fn render(&self, expression: &str, mode: MathMode) -> Result<String> {
        Ok(source_fallback(expression, mode))
    }
}

#[cfg(feature = "katex")]
pub use self::katex_backend::KatexRenderer;

#[cfg(feature = "katex")]
mod katex_backend {
    use anyhow::{Result, anyhow};

    use super::{MathMode, MathRenderer};

    /// KaTeX backend producing HTML-only output.
    ///
    /// Pages displaying the output need the KaTeX stylesheet.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct KatexRenderer;

    impl KatexRenderer {
        pub fn new() -> Self {
            Self
        }
    }

    impl MathRenderer for KatexRenderer {
        fn render(&self, expression: &str, mode: MathMode) -> Result<String> {
            let opts = katex::Opts::builder()
                .display_mode(mode.is_display())
                .output_type(katex::OutputType::Html)
                .build()
                .map_err(|e| anyhow!("Invalid KaTeX options: {}", e))?;

            katex::render_with_opts(expression, &opts)
                .map_err(|e| anyhow!("KaTeX failed on {:?}: {}", expression, e))
        }
    }
}

/// Returns the default math backend for this build.
///
/// KaTeX when the `katex` feature is enabled, plain source otherwise.
pub fn default_renderer() -> Box<dyn MathRenderer> {
    #[cfg(feature = "katex")]
    {
        Box::new(KatexRenderer::new())
    }
    #[cfg(not(feature = "katex"))]
    {
        Box::new(PlainMathRenderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_delimiters() {
        // Arrange & Act & Assert
        assert_eq!(MathMode::Inline.delimiter(), "$");
        assert_eq!(MathMode::Display.delimiter(), "$$");
        assert!(MathMode::Display.is_display());
        assert!(!MathMode::Inline.is_display());
    }

    #[test]
    fn test_source_fallback_escapes() {
        // Arrange
        let expression = "a<b";

        // Act
        let html = source_fallback(expression, MathMode::Inline);

        // Assert
        assert_eq!(html, "$a&lt;b$");
    }

    #[test]
    fn test_plain_renderer_display() {
        // Arrange
        let renderer = PlainMathRenderer;

        // Act
        let html = renderer
            .render("x^2", MathMode::Display)
            .expect("Plain renderer never fails");

        // Assert
        assert_eq!(html, "$$x^2$$");
    }

    #[cfg(feature = "katex")]
    #[test]
    fn test_katex_inline() {
        // Arrange
        let renderer = KatexRenderer::new();

        // Act
        let html = renderer
            .render("E = mc^2", MathMode::Inline)
            .expect("KaTeX should render");

        // Assert
        assert!(html.contains("katex"), "Should contain katex markup: {}", html);
        assert!(
            !html.contains("katex-display"),
            "Inline math should not be display mode"
        );
    }

    #[cfg(feature = "katex")]
    #[test]
    fn test_katex_display() {
        // Arrange
        let renderer = KatexRenderer::new();

        // Act
        let html = renderer
            .render(r"\sum_{i=1}^n i", MathMode::Display)
            .expect("KaTeX should render");

        // Assert
        assert!(
            html.contains("katex-display"),
            "Display math should use display mode: {}",
            html
        );
    }

    #[cfg(feature = "katex")]
    #[test]
    fn test_katex_invalid_expression() {
        // Arrange
        let renderer = KatexRenderer::new();

        // Act
        let result = renderer.render(r"\frac{", MathMode::Inline);

        // Assert
        assert!(result.is_err(), "Unbalanced braces should fail");
    }
}
