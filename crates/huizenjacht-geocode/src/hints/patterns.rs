//! Textual patterns in the visible page body and the `<title>`.

use std::sync::LazyLock;

use regex::Regex;

use super::ListingPage;
use crate::types::ScrapedHints;

/// `Carcassonne (11000)`: the run of capitalised words directly before a
/// parenthesised five-digit postal code. Lowercase joiners (`de`, `sur`,
/// `d'`, ...) may sit between the words; any other lowercase word ends the
/// run, so `Belle maison Montferrand (11320)` yields `Montferrand`.
static NAME_POSTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\p{Lu}[\p{L}'’\-]*(?:\s+(?:(?:de|du|des|la|le|les|sur|sous|en|lès|aux?)\s+)*(?:[dl]['’])?\p{Lu}[\p{L}'’\-]*)*)\s*\(\s*(\d{5})\s*\)",
    )
    .expect("valid regex")
});

/// `à Biot`, `in Montferrand`, `près de Sarlat`: a preposition followed by
/// one or more capitalised words.
static PREPOSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|\s)(?:à|À|a|A|in|In|near|Near|près de|Près de|proche de|Proche de)\s+(\p{Lu}[\p{L}'’\-]*(?:\s\p{Lu}[\p{L}'’\-]*)*)",
    )
    .expect("valid regex")
});

/// Rule: first `Name (12345)` occurrence in the body text.
pub(super) fn body_hints(page: &ListingPage<'_>) -> ScrapedHints {
    name_postal_hints(&page.text)
}

/// Rule: the `<title>`, via `Name (12345)` or a preposition pattern.
pub(super) fn title_hints(page: &ListingPage<'_>) -> ScrapedHints {
    let Some(title) = page.title.as_deref() else {
        return ScrapedHints::default();
    };

    let hints = name_postal_hints(title);
    if !hints.is_empty() {
        return hints;
    }

    ScrapedHints {
        city: PREPOSITION_RE
            .captures_iter(title)
            .filter_map(|c| c.get(1))
            .last()
            .map(|m| m.as_str().to_owned()),
        ..ScrapedHints::default()
    }
}

fn name_postal_hints(text: &str) -> ScrapedHints {
    NAME_POSTAL_RE
        .captures(text)
        .map(|caps| ScrapedHints {
            city: caps.get(1).map(|m| m.as_str().to_owned()),
            postal_code: caps.get(2).map(|m| m.as_str().to_owned()),
            ..ScrapedHints::default()
        })
        .unwrap_or_default()
}
