//! Standalone HTML document wrapper.

use maud::{DOCTYPE, Markup, PreEscaped, html};

/// KaTeX stylesheet matching the HTML produced by the math backend.
pub const KATEX_STYLESHEET: &str = "https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css";

/// highlight.js theme for the `hljs-*` classes on code blocks.
pub const HIGHLIGHT_STYLESHEET: &str =
    "https://cdn.jsdelivr.net/npm/highlight.js@11.9.0/styles/github.min.css";

/// Wraps rendered markdown in a complete HTML document.
///
/// The fragment is inserted without escaping. The KaTeX stylesheet is only
/// linked when the document contains typeset math.
///
/// # Arguments
///
/// * `title`: Document title
/// * `body`: Rendered HTML fragment
/// * `with_math`: Link the KaTeX stylesheet
///
/// # Returns
///
/// Complete HTML document
pub fn standalone_document(title: &str, body: &str, with_math: bool) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href=(HIGHLIGHT_STYLESHEET);
                @if with_math {
                    link rel="stylesheet" href=(KATEX_STYLESHEET);
                }
            }
            body {
                div class="markdown-here-wrapper" {
                    (PreEscaped(body))
                }
            }
        }
    }
}
