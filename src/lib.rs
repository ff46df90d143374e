//! Markdown to HTML rendering for the Markdown Here browser extension.

mod config;
mod highlight;
pub mod logging;
mod markdown;
pub mod math;
pub mod page;
mod preferences;

pub use config::Config;
pub use highlight::{CLASS_PREFIX, CodeHighlighter, NoHighlighter, SyntectHighlighter};
pub use markdown::{
    LinkRewriter, MarkdownRenderer, MathExpression, MathPlaceholders, markdown_render, slugify,
};
pub use math::{MathMode, MathRenderer, PlainMathRenderer};
pub use preferences::Preferences;
