//! Markdown rendering with GitHub Flavored Markdown support.
//!
//! This module renders user markdown using comrak with GFM extensions
//! (tables, strikethrough, autolinks, task lists) and rewrites the parsed
//! document before formatting: scheme insertion for bare link targets,
//! heading anchors, highlighted code blocks and typeset math.

mod links;
mod math;
mod renderer;

pub use links::{LinkRewriter, slugify};
pub use math::{MathExpression, MathPlaceholders};
pub use renderer::{MarkdownRenderer, markdown_render};
