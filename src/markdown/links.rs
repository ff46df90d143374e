//! Link target rewriting and heading slugs.

use std::sync::LazyLock;

use regex::Regex;

static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z_]+").expect("slug regex"));

/// Converts text into an anchor name.
///
/// Lower-cases the text and replaces each run of characters outside
/// `[A-Za-z0-9_]` with a single `-`. Leading and trailing dashes are kept so
/// heading anchors and fragment links computed separately always agree.
///
/// # Examples
///
/// ```
/// use mdhere::slugify;
///
/// assert_eq!(slugify("Getting Started!"), "getting-started-");
/// ```
pub fn slugify(text: &str) -> String {
    NON_WORD_RE
        .replace_all(&text.to_lowercase(), "-")
        .into_owned()
}

/// Rewrites link targets found in user markdown.
///
/// Targets without a scheme are assumed to be web addresses and gain an
/// `http://` prefix. Any `:` counts as a scheme separator, so `host:8080/x`
/// stays as written. Fragment links (`#...`) never gain a scheme; with
/// `slug_fragments` they are slugified to match injected heading anchors.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkRewriter {
    slug_fragments: bool,
}

impl LinkRewriter {
    /// Creates rewriter.
    ///
    /// # Arguments
    ///
    /// * `slug_fragments`: Slugify `#fragment` targets (header anchors enabled)
    pub fn new(slug_fragments: bool) -> Self {
        Self { slug_fragments }
    }

    /// Returns the rewritten target, or `None` when it stays unchanged.
    pub fn rewrite(&self, href: &str) -> Option<String> {
        if href.is_empty() {
            return None;
        }

        if let Some(fragment) = href.strip_prefix('#') {
            if !self.slug_fragments {
                return None;
            }
            let slugged = format!("#{}", slugify(fragment));
            return (slugged != href).then_some(slugged);
        }

        if href.contains(':') {
            return None;
        }

        Some(format!("http://{}", href))
    }
}
