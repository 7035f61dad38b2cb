//! Semi-structured address data: location meta tags and address-like keys
//! in inline JSON (framework hydration blobs, tracking data layers).

use std::sync::LazyLock;

use regex::Regex;

use super::jsonld::classify_area;
use super::{meta_content, ListingPage};
use crate::regions::lookup_county;
use crate::types::ScrapedHints;

static CITY_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"(?:addressLocality|city|cityName|cityLabel|ville|locality)"\s*:\s*"([^"]{2,80})""#)
        .expect("valid regex")
});
static POSTAL_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)"(?:postalCode|postal_code|zipCode|zip_code|zipcode|codePostal|code_postal)"\s*:\s*"?(\d{5})\b"#,
    )
    .expect("valid regex")
});
static REGION_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"(?:addressRegion|region|regionName|regionLabel)"\s*:\s*"([^"]{2,80})""#)
        .expect("valid regex")
});
static COUNTY_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"(?:department|departement|departmentName|departementName|county)"\s*:\s*"([^"]{2,80})""#)
        .expect("valid regex")
});

/// Rule: `og:locality`-style meta tags, then address keys in inline JSON.
pub(super) fn address_hints(page: &ListingPage<'_>) -> ScrapedHints {
    let mut hints = ScrapedHints::default();
    hints.fill_from(meta_hints(page.html));
    hints.fill_from(inline_json_hints(page.html));
    hints
}

fn meta_hints(html: &str) -> ScrapedHints {
    let first_meta = |keys: &[&str]| keys.iter().find_map(|key| meta_content(html, key));

    let mut hints = ScrapedHints {
        city: first_meta(&["og:locality", "business:contact_data:locality"]),
        postal_code: first_meta(&["og:postal-code", "business:contact_data:postal_code"]),
        ..ScrapedHints::default()
    };
    if let Some(region) = first_meta(&["og:region", "business:contact_data:region"]) {
        classify_area(&region, &mut hints);
    }
    hints
}

fn inline_json_hints(html: &str) -> ScrapedHints {
    let mut hints = ScrapedHints {
        city: first_capture(&CITY_KEY_RE, html),
        postal_code: first_capture(&POSTAL_KEY_RE, html),
        ..ScrapedHints::default()
    };
    // Only accept names from the closed list; free-form county keys are too noisy.
    hints.county = COUNTY_KEY_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .find_map(|m| lookup_county(&unescape_json(m.as_str())))
        .map(str::to_owned);
    if let Some(region) = first_capture(&REGION_KEY_RE, html) {
        classify_area(&region, &mut hints);
    }
    hints
}

fn first_capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| unescape_json(m.as_str()))
}

/// Decodes `\u00e9`-style escapes; falls back to the raw text.
fn unescape_json(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_owned())
}
