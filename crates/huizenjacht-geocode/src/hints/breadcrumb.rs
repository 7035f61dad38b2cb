//! Breadcrumb trails matched against the région / département tables.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::jsonld::jsonld_items;
use super::{strip_tags, ListingPage};
use crate::regions::{lookup_county, lookup_region};
use crate::types::ScrapedHints;

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>").expect("valid regex"));
static BREADCRUMB_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)breadcrumb|fil-ariane|ariane").expect("valid regex"));
/// Trailing `(24)` / `- 24` department numbers and similar decorations.
static CRUMB_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-–(]*\d[\dAB]*\)?\s*$").expect("valid regex"));

/// Bytes scanned after a breadcrumb marker.
const BREADCRUMB_WINDOW: usize = 6000;

/// Rule: JSON-LD `BreadcrumbList` names, then anchor texts.
///
/// When the markup names a breadcrumb container, only anchors close to it
/// are considered; otherwise every anchor on the page is.
pub(super) fn breadcrumb_hints(page: &ListingPage<'_>) -> ScrapedHints {
    let mut labels = jsonld_breadcrumb_names(page.html);
    labels.extend(anchor_texts(breadcrumb_region(page.html)));

    let mut hints = ScrapedHints::default();
    for label in &labels {
        let label = CRUMB_SUFFIX_RE.replace(label, "");
        if hints.county.is_none() {
            hints.county = lookup_county(&label).map(str::to_owned);
        }
        if hints.region.is_none() {
            hints.region = lookup_region(&label).map(str::to_owned);
        }
        if hints.county.is_some() && hints.region.is_some() {
            break;
        }
    }
    hints
}

fn breadcrumb_region(html: &str) -> &str {
    let Some(marker) = BREADCRUMB_MARKER_RE.find(html) else {
        return html;
    };
    let mut end = (marker.start() + BREADCRUMB_WINDOW).min(html.len());
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    &html[marker.start()..end]
}

fn anchor_texts(html: &str) -> impl Iterator<Item = String> + '_ {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| strip_tags(m.as_str()))
        .filter(|text| !text.is_empty())
}

fn jsonld_breadcrumb_names(html: &str) -> Vec<String> {
    jsonld_items(html)
        .iter()
        .filter(|item| item.get("@type").and_then(Value::as_str) == Some("BreadcrumbList"))
        .filter_map(|item| item.get("itemListElement").and_then(Value::as_array))
        .flatten()
        .filter_map(|element| {
            element
                .get("name")
                .or_else(|| element.get("item").and_then(|i| i.get("name")))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .collect()
}
