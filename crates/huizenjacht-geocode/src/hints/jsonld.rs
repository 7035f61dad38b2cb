//! schema.org JSON-LD: postal addresses and the shared script-block reader.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::ListingPage;
use crate::regions::{lookup_county, lookup_region};
use crate::types::ScrapedHints;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

const MAX_JSON_DEPTH: usize = 8;

/// Every top-level JSON-LD item on the page.
///
/// Accepts a top-level object, an array, or an `@graph` container; blocks
/// that fail to parse are skipped.
pub(super) fn jsonld_items(html: &str) -> Vec<Value> {
    let mut items = Vec::new();

    for cap in SCRIPT_RE.captures_iter(html) {
        let Some(json_text) = cap.get(1) else {
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(json_text.as_str().trim()) else {
            continue;
        };

        let mut candidates = match value {
            Value::Array(arr) => arr,
            other => vec![other],
        };

        let graphs: Vec<Value> = candidates
            .iter()
            .filter_map(|item| item.get("@graph").and_then(Value::as_array))
            .flatten()
            .cloned()
            .collect();
        candidates.extend(graphs);
        items.extend(candidates);
    }

    items
}

/// Rule: `PostalAddress` nodes anywhere in the JSON-LD.
pub(super) fn address_hints(page: &ListingPage<'_>) -> ScrapedHints {
    let items = jsonld_items(page.html);
    let mut addresses = Vec::new();
    for item in &items {
        collect_addresses(item, 0, &mut addresses);
    }

    let mut hints = ScrapedHints::default();
    for address in addresses {
        hints.fill_from(address_to_hints(address));
    }
    hints
}

fn collect_addresses<'v>(value: &'v Value, depth: usize, out: &mut Vec<&'v Value>) {
    if depth > MAX_JSON_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            if map.contains_key("addressLocality") || map.contains_key("postalCode") {
                out.push(value);
            }
            for child in map.values() {
                collect_addresses(child, depth + 1, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_addresses(child, depth + 1, out);
            }
        }
        _ => {}
    }
}

fn address_to_hints(address: &Value) -> ScrapedHints {
    let field = |key: &str| -> Option<String> {
        match address.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            // addressRegion is sometimes an AdministrativeArea node.
            Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_owned),
            _ => None,
        }
    };

    let mut hints = ScrapedHints {
        city: field("addressLocality"),
        postal_code: field("postalCode"),
        ..ScrapedHints::default()
    };
    if let Some(raw_region) = field("addressRegion") {
        classify_area(&raw_region, &mut hints);
    }
    hints
}

/// Routes an administrative-area name to `county` or `region`.
///
/// French listings put either a département or a région into
/// `addressRegion`; unknown names are kept as the region.
pub(super) fn classify_area(raw: &str, hints: &mut ScrapedHints) {
    if let Some(county) = lookup_county(raw) {
        hints.county.get_or_insert_with(|| county.to_owned());
        // Names like "Guadeloupe" are both.
        if let Some(region) = lookup_region(raw) {
            hints.region.get_or_insert_with(|| region.to_owned());
        }
    } else if let Some(region) = lookup_region(raw) {
        hints.region.get_or_insert_with(|| region.to_owned());
    } else if !raw.trim().is_empty() {
        hints.region.get_or_insert_with(|| raw.trim().to_owned());
    }
}
