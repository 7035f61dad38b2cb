//! Listing-page hint extraction.
//!
//! Works on raw HTML plus the page URL and never touches the network.
//! Hints come from an ordered list of independent rules; each rule looks at
//! the page on its own and the results are merged left-to-right, first
//! non-empty value per field wins. Stronger sources come first:
//! embedded coordinates, structured metadata, textual patterns, then URL
//! heuristics.

mod breadcrumb;
mod geo;
mod inline;
mod jsonld;
mod patterns;
mod url;

use std::sync::LazyLock;

use regex::Regex;

use crate::text::{collapse_whitespace, decode_entities};
use crate::types::ScrapedHints;

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid regex"));
static NON_TEXT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<head\b.*?</head>|<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>|<!--.*?-->")
        .expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

type HintRule = fn(&ListingPage<'_>) -> ScrapedHints;

/// Extraction rules in precedence order.
const RULES: &[(&str, HintRule)] = &[
    ("jsonld-address", jsonld::address_hints),
    ("inline-address", inline::address_hints),
    ("body-postal-pattern", patterns::body_hints),
    ("title", patterns::title_hints),
    ("breadcrumb", breadcrumb::breadcrumb_hints),
    ("portal-url", url::portal_hints),
    ("url-path", url::path_hints),
];

/// A fetched listing page, pre-digested once for all rules.
pub(crate) struct ListingPage<'a> {
    html: &'a str,
    url: Option<reqwest::Url>,
    /// Visible body text: tags removed, entities decoded, whitespace collapsed.
    text: String,
    title: Option<String>,
}

impl<'a> ListingPage<'a> {
    fn new(html: &'a str, url: &str) -> Self {
        let title = TITLE_RE
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| strip_tags(m.as_str()))
            .filter(|t| !t.is_empty());

        Self {
            html,
            url: reqwest::Url::parse(url.trim()).ok(),
            text: strip_tags(&NON_TEXT_BLOCK_RE.replace_all(html, " ")),
            title,
        }
    }
}

/// Extracts location hints from a listing page.
///
/// When the page embeds a usable coordinate, only
/// [`ScrapedHints::direct_coordinate`] is set and no other rule runs.
/// Otherwise every field is filled by the first rule that produces it;
/// the returned city is already sanitized.
#[must_use]
pub fn extract_hints(html: &str, url: &str) -> ScrapedHints {
    if let Some(coordinate) = geo::find_direct_coordinate(html) {
        tracing::debug!(lat = coordinate.lat, lng = coordinate.lng, "listing embeds coordinates");
        return ScrapedHints {
            direct_coordinate: Some(coordinate),
            ..ScrapedHints::default()
        };
    }

    let page = ListingPage::new(html, url);
    let mut hints = ScrapedHints::default();
    for (name, rule) in RULES {
        if hints.is_complete() {
            break;
        }
        let found = rule(&page);
        if !found.is_empty() {
            tracing::debug!(rule = *name, ?found, "hint rule matched");
        }
        hints.fill_from(found);
    }
    hints
}

/// Removes markup from an HTML fragment and returns its readable text.
fn strip_tags(fragment: &str) -> String {
    collapse_whitespace(&decode_entities(&TAG_RE.replace_all(fragment, " ")))
}

/// `content` of the first `<meta>` whose `property`, `name`, or `itemprop`
/// equals `key` (ASCII case-insensitive).
fn meta_content(html: &str, key: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let matches_key = ["property", "name", "itemprop"]
            .into_iter()
            .filter_map(|attr| extract_attr(tag, attr))
            .any(|value| value.eq_ignore_ascii_case(key));
        if matches_key {
            extract_attr(tag, "content").map(|c| decode_entities(&c))
        } else {
            None
        }
    })
}

fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!(
        r#"(?is)\s{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
        regex::escape(attr)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().trim().to_string())
}

#[cfg(test)]
#[path = "hints_test.rs"]
mod tests;
