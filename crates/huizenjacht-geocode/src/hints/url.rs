//! Hints recovered from the listing URL alone.

use percent_encoding::percent_decode_str;

use super::ListingPage;
use crate::regions::{lookup_county, lookup_region};
use crate::text::title_case;
use crate::types::ScrapedHints;

/// Path segments that never name a place.
const BOILERPLATE_SEGMENTS: &[&str] = &[
    "annonces",
    "annonce",
    "propriete",
    "proprietes",
    "maison",
    "appartement",
    "house",
    "apartment",
    "france",
    "achat",
    "vente",
    "a-vendre",
    "immobilier",
    "property",
    "listing",
    "ref",
    "id",
    "fr",
    "en",
    "nl",
    "de",
    "es",
    "it",
];

/// Category segments of Spanish portals that sit before the location.
const SPANISH_CATEGORY_SEGMENTS: &[&str] = &[
    "inmueble",
    "comprar",
    "alquiler",
    "venta-viviendas",
    "alquiler-viviendas",
    "vivienda",
    "viviendas",
    "obra-nueva",
    "todas-las-zonas",
];

const PAGE_EXTENSIONS: &[&str] = &[".html", ".htm", ".php", ".aspx", ".asp"];

/// Rule: path conventions of portals that encode the location in the slug.
pub(super) fn portal_hints(page: &ListingPage<'_>) -> ScrapedHints {
    let Some(url) = page.url.as_ref() else {
        return ScrapedHints::default();
    };
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let segments = path_segments(url);

    if host.ends_with("lefigaro.fr") {
        return segments
            .iter()
            .find_map(|s| figaro_area(s))
            .unwrap_or_default();
    }
    if host.ends_with("seloger.com") {
        return ScrapedHints {
            city: segments
                .iter()
                .find_map(|s| s.strip_prefix("ville-"))
                .map(slug_to_name),
            ..ScrapedHints::default()
        };
    }
    if host.contains("immobilienscout24") || host.ends_with("immonet.de") {
        return ScrapedHints {
            city: segments.iter().find_map(|s| {
                let (_, rest) = s.split_once("-in-")?;
                let name = rest.split('-').next()?;
                (!name.is_empty()).then(|| slug_to_name(name))
            }),
            ..ScrapedHints::default()
        };
    }
    if host.contains("idealista.") || host.contains("fotocasa.") {
        return spanish_area(&segments).unwrap_or_default();
    }
    ScrapedHints::default()
}

/// `.../<provincia>/<municipio>/...`: the last two location segments.
fn spanish_area(segments: &[String]) -> Option<ScrapedHints> {
    let places: Vec<&String> = segments
        .iter()
        .filter(|s| !is_boilerplate(s) && !SPANISH_CATEGORY_SEGMENTS.contains(&s.as_str()))
        .filter(|s| s.chars().filter(|c| c.is_alphabetic()).count() > 1)
        .collect();
    let [.., province, municipality] = places.as_slice() else {
        return None;
    };
    Some(ScrapedHints {
        city: Some(slug_to_name(municipality)),
        region: Some(slug_to_name(province)),
        ..ScrapedHints::default()
    })
}

/// `propriete-dordogne-nouvelle-aquitaine-france` → county and region.
fn figaro_area(segment: &str) -> Option<ScrapedHints> {
    let body = segment.strip_prefix("proprietes-").or_else(|| segment.strip_prefix("propriete-"))?;
    let body = body.strip_suffix("-france").unwrap_or(body);

    let whole = ScrapedHints {
        county: lookup_county(body).map(str::to_owned),
        region: lookup_region(body).map(str::to_owned),
        ..ScrapedHints::default()
    };
    if !whole.is_empty() {
        return Some(whole);
    }

    // Département and région slugs are both hyphenated; try every split.
    body.match_indices('-').find_map(|(idx, _)| {
        let county = lookup_county(&body[..idx])?;
        let region = lookup_region(&body[idx + 1..])?;
        Some(ScrapedHints {
            county: Some(county.to_owned()),
            region: Some(region.to_owned()),
            ..ScrapedHints::default()
        })
    })
}

/// Rule: last meaningful path segment, hyphens turned into spaces.
pub(super) fn path_hints(page: &ListingPage<'_>) -> ScrapedHints {
    let Some(url) = page.url.as_ref() else {
        return ScrapedHints::default();
    };

    let city = path_segments(url)
        .into_iter()
        .filter(|s| !is_boilerplate(s))
        .filter(|s| s.chars().any(char::is_alphabetic))
        .last()
        .map(|s| slug_to_name(&s));

    ScrapedHints {
        city,
        ..ScrapedHints::default()
    }
}

/// Lowercased, percent-decoded path segments without page extensions.
fn path_segments(url: &reqwest::Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| {
                    let decoded = percent_decode_str(s).decode_utf8_lossy().to_lowercase();
                    PAGE_EXTENSIONS
                        .iter()
                        .find_map(|ext| decoded.strip_suffix(*ext))
                        .map_or_else(|| decoded.clone(), str::to_owned)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn is_boilerplate(segment: &str) -> bool {
    BOILERPLATE_SEGMENTS.contains(&segment) || segment.chars().all(|c| c.is_ascii_digit())
}

fn slug_to_name(slug: &str) -> String {
    title_case(&slug.replace(['-', '_', '+'], " "))
}
