//! Markdown rendering with GitHub Flavored Markdown support.

use anyhow::{Context, Result};
use comrak::nodes::{Ast, AstNode, LineColumn, NodeHtmlBlock, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};
use std::borrow::Cow;
use std::cell::RefCell;
use std::path::Path;
use tracing::{debug, warn};

use super::LinkRewriter;
use super::links::slugify;
use super::math::MathPlaceholders;
use crate::highlight::{CodeHighlighter, SyntectHighlighter, escape_html};
use crate::math::{self, MathRenderer};
use crate::preferences::Preferences;

/// Class prepended to the language class of fenced code blocks.
///
/// highlight.js themes style `.hljs` containers.
const CODE_CLASS_PREFIX: &str = "hljs language-";

/// Renders user markdown to HTML according to [`Preferences`].
///
/// Provides GFM extensions including tables, strikethrough, autolinks,
/// task lists and footnotes, with smart punctuation. Code blocks are
/// highlighted by the configured [`CodeHighlighter`] and math spans are
/// typeset by the configured [`MathRenderer`] when math is enabled.
pub struct MarkdownRenderer<'a> {
    options: Options<'a>,
    preferences: Preferences,
    highlighter: Box<dyn CodeHighlighter>,
    math: Box<dyn MathRenderer>,
}

impl<'a> MarkdownRenderer<'a> {
    /// Creates renderer with syntect highlighting and the default math backend.
    pub fn new(preferences: Preferences) -> Self {
        Self {
            options: comrak_options(&preferences),
            preferences,
            highlighter: Box::new(SyntectHighlighter::new()),
            math: math::default_renderer(),
        }
    }

    /// Replaces the code block highlighter.
    pub fn with_highlighter(mut self, highlighter: impl CodeHighlighter + 'static) -> Self {
        self.highlighter = Box::new(highlighter);
        self
    }

    /// Replaces the math backend.
    pub fn with_math_renderer(mut self, math: impl MathRenderer + 'static) -> Self {
        self.math = Box::new(math);
        self
    }

    /// Preferences this renderer was built with.
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Renders markdown content to HTML string.
    ///
    /// # Arguments
    ///
    /// * `content`: Markdown content to render
    ///
    /// # Returns
    ///
    /// Rendered HTML fragment
    ///
    /// # Errors
    ///
    /// Returns error if HTML formatting fails
    pub fn render(&self, content: &str) -> Result<String> {
        render_with(
            content,
            &self.options,
            &self.preferences,
            self.highlighter.as_ref(),
            self.math.as_ref(),
        )
    }

    /// Renders markdown file at given path.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or rendering fails
    pub fn render_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read markdown file")?;
        self.render(&content)
    }
}

impl<'a> Default for MarkdownRenderer<'a> {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}

/// Renders markdown with borrowed highlighter and math backends.
///
/// One-shot form of [`MarkdownRenderer::render`]: builds parser options from
/// `preferences` for this call only.
///
/// # Errors
///
/// Returns error if HTML formatting fails
pub fn markdown_render(
    content: &str,
    preferences: &Preferences,
    highlighter: &dyn CodeHighlighter,
    math: &dyn MathRenderer,
) -> Result<String> {
    render_with(
        content,
        &comrak_options(preferences),
        preferences,
        highlighter,
        math,
    )
}

/// Builds comrak options for the given preferences.
fn comrak_options<'a>(preferences: &Preferences) -> Options<'a> {
    let mut options = Options::default();

    // Extension options (GFM features)
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    options.parse.smart = true;

    // Users write their own HTML in messages
    options.render.unsafe_ = true;
    options.render.hardbreaks = preferences.gfm_line_breaks_enabled;

    options
}

fn render_with(
    content: &str,
    options: &Options,
    preferences: &Preferences,
    highlighter: &dyn CodeHighlighter,
    math: &dyn MathRenderer,
) -> Result<String> {
    let (source, placeholders) = if preferences.math_enabled {
        let (text, table) = MathPlaceholders::extract(content);
        (Cow::Owned(text), table)
    } else {
        (Cow::Borrowed(content), MathPlaceholders::default())
    };

    let arena = Arena::new();
    let root = parse_document(&arena, &source, options);

    let stats = transform(&arena, root, preferences, highlighter, &placeholders);

    let mut output = Vec::with_capacity(source.len() * 2);
    format_html(root, options, &mut output).context("Failed to format HTML")?;
    let html = String::from_utf8(output).context("Rendered HTML is not valid UTF8")?;

    debug!(
        links = stats.links,
        headings = stats.headings,
        code_blocks = stats.code_blocks,
        math = placeholders.len(),
        "Rendered markdown"
    );

    Ok(placeholders.restore(&html, math))
}

#[derive(Debug, Default)]
struct TransformStats {
    links: usize,
    headings: usize,
    code_blocks: usize,
}

/// Applies link, heading and code block rewrites to the parsed document.
fn transform<'a>(
    arena: &'a Arena<AstNode<'a>>,
    root: &'a AstNode<'a>,
    preferences: &Preferences,
    highlighter: &dyn CodeHighlighter,
    placeholders: &MathPlaceholders,
) -> TransformStats {
    let rewriter = LinkRewriter::new(preferences.header_anchors_enabled);
    let mut stats = TransformStats::default();
    let mut headings = Vec::new();

    for node in root.descendants() {
        let mut data = node.data.borrow_mut();
        let replacement = match &mut data.value {
            NodeValue::Link(link) => {
                if let Some(url) = rewriter.rewrite(&link.url) {
                    link.url = url;
                    stats.links += 1;
                }
                None
            }
            NodeValue::Heading(_) if preferences.header_anchors_enabled => {
                headings.push(node);
                None
            }
            NodeValue::Code(code) => {
                code.literal = placeholders.expand_delimited(&code.literal);
                None
            }
            NodeValue::CodeBlock(block) => {
                stats.code_blocks += 1;
                let code = placeholders.expand_delimited(&block.literal);
                Some(NodeValue::HtmlBlock(NodeHtmlBlock {
                    block_type: 0,
                    literal: code_block_html(&block.info, &code, highlighter),
                }))
            }
            _ => None,
        };

        if let Some(value) = replacement {
            data.value = value;
        }
    }

    for heading in headings {
        let text = placeholders.expand_source(&heading_text(heading));
        let anchor = format!("<a href=\"#\" name=\"{}\"></a>", slugify(&text));
        let (line, column) = {
            let ast = heading.data.borrow();
            (ast.sourcepos.start.line, ast.sourcepos.start.column)
        };
        heading.prepend(arena.alloc(AstNode::new(RefCell::new(Ast::new(
            NodeValue::HtmlInline(anchor),
            LineColumn { line, column },
        )))));
        stats.headings += 1;
    }

    stats
}

/// Collects the plain text of a heading.
fn heading_text<'a>(heading: &'a AstNode<'a>) -> String {
    let mut text = String::new();

    for node in heading.descendants().skip(1) {
        match &node.data.borrow().value {
            NodeValue::Text(t) => text.push_str(t),
            NodeValue::Code(code) => text.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => text.push(' '),
            _ => {}
        }
    }

    text
}

/// Renders a code block as `<pre><code>` with highlighted contents.
///
/// The language is the first word of the info string. It is lower-cased for
/// highlighter lookup and kept as written in the class attribute. Unknown
/// languages and highlighter failures fall back to the escaped code.
fn code_block_html(info: &str, code: &str, highlighter: &dyn CodeHighlighter) -> String {
    let Some(language) = info.split_whitespace().next() else {
        return format!("<pre><code>{}</code></pre>\n", escape_html(code));
    };

    let body = match highlighter.highlight(code, &language.to_lowercase()) {
        Ok(Some(highlighted)) => highlighted,
        Ok(None) => escape_html(code),
        Err(e) => {
            warn!("Highlighting failed for {}, using plain text: {:#}", language, e);
            escape_html(code)
        }
    };

    format!(
        "<pre><code class=\"{}{}\">{}</code></pre>\n",
        CODE_CLASS_PREFIX,
        escape_html(language),
        body
    )
}
