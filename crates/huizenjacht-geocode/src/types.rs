//! Request, hint, candidate, and result types for place resolution.
//!
//! Everything here lives for a single resolution; nothing is persisted.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::text::{collapse_whitespace, fold, non_blank, sanitize_city};

/// User-supplied search seed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationQuery {
    pub listing_url: Option<String>,
    pub free_address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    /// Falls back to the resolver's default country when absent.
    pub country: Option<String>,
}

impl LocationQuery {
    /// `true` when at least one of URL, address, city, or postal code is non-blank.
    #[must_use]
    pub fn has_search_signal(&self) -> bool {
        [
            &self.listing_url,
            &self.free_address,
            &self.city,
            &self.postal_code,
        ]
        .into_iter()
        .any(|field| non_blank(field.as_deref()).is_some())
    }

    /// Normalized cache key: accent-folded, whitespace-collapsed fields joined by `|`.
    #[must_use]
    pub fn cache_key(&self, default_country: &str) -> String {
        let country = non_blank(self.country.as_deref()).unwrap_or_else(|| default_country.to_owned());
        let url = non_blank(self.listing_url.as_deref()).unwrap_or_default();
        [
            url,
            fold(&collapse_whitespace(self.free_address.as_deref().unwrap_or_default())),
            fold(&collapse_whitespace(self.city.as_deref().unwrap_or_default())),
            collapse_whitespace(self.postal_code.as_deref().unwrap_or_default()),
            fold(&collapse_whitespace(&country)),
        ]
        .join("|")
    }
}

/// A latitude/longitude pair known to be finite and in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Returns `None` unless both values are finite and within ±90 / ±180.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }
}

/// Location fields recovered from a listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedHints {
    pub city: Option<String>,
    pub postal_code: Option<String>,
    /// State or province (a French région).
    pub region: Option<String>,
    /// Sub-region (a French département).
    pub county: Option<String>,
    /// Set only when the page embeds machine-readable coordinates; all other
    /// fields are then left empty.
    pub direct_coordinate: Option<Coordinate>,
}

impl ScrapedHints {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.postal_code.is_none()
            && self.region.is_none()
            && self.county.is_none()
            && self.direct_coordinate.is_none()
    }

    /// `true` once every address field is filled and no later rule can add anything.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.city.is_some()
            && self.postal_code.is_some()
            && self.region.is_some()
            && self.county.is_some()
    }

    /// Merges `other` into `self`, keeping values already present.
    ///
    /// Cities are sanitized on the way in, so a rule that only produced
    /// marketing copy leaves the slot open for weaker rules.
    pub fn fill_from(&mut self, other: ScrapedHints) {
        if self.city.is_none() {
            self.city = other.city.as_deref().and_then(sanitize_city);
        }
        if self.postal_code.is_none() {
            self.postal_code = non_blank(other.postal_code.as_deref());
        }
        if self.region.is_none() {
            self.region = non_blank(other.region.as_deref());
        }
        if self.county.is_none() {
            self.county = non_blank(other.county.as_deref());
        }
        if self.direct_coordinate.is_none() {
            self.direct_coordinate = other.direct_coordinate;
        }
    }
}

/// Merged, sanitized search target used for every geocoder query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedWant {
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub region: Option<String>,
    pub county: Option<String>,
    pub country: String,
    /// Explicit free-text address; only used by free-text variants.
    pub address: Option<String>,
}

impl ResolvedWant {
    /// Builds the target from explicit fields first, scraped hints second.
    #[must_use]
    pub fn merge(query: &LocationQuery, hints: &ScrapedHints, default_country: &str) -> Self {
        // An explicit city that sanitizes to nothing must not hide the hint.
        let city = non_blank(query.city.as_deref())
            .and_then(|c| sanitize_city(&c))
            .or_else(|| hints.city.as_deref().and_then(sanitize_city));
        let postal_code = non_blank(query.postal_code.as_deref())
            .or_else(|| non_blank(hints.postal_code.as_deref()));
        let country = non_blank(query.country.as_deref())
            .unwrap_or_else(|| collapse_whitespace(default_country));

        Self {
            city,
            postal_code,
            region: non_blank(hints.region.as_deref()),
            county: non_blank(hints.county.as_deref()),
            country,
            address: non_blank(query.free_address.as_deref()),
        }
    }

    /// `true` when there is nothing to search on besides the country.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.postal_code.is_none()
            && self.region.is_none()
            && self.county.is_none()
            && self.address.is_none()
    }
}

/// Address breakdown of one geocoder result row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAddress {
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub hamlet: Option<String>,
    pub county: Option<String>,
    pub region: Option<String>,
}

impl CandidateAddress {
    /// First non-empty locality among city, town, village, municipality, hamlet.
    #[must_use]
    pub fn locality(&self) -> Option<&str> {
        [
            &self.city,
            &self.town,
            &self.village,
            &self.municipality,
            &self.hamlet,
        ]
        .into_iter()
        .filter_map(Option::as_deref)
        .find(|s| !s.trim().is_empty())
    }
}

/// One result row from the geocoder, in provider rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    pub address: CandidateAddress,
}

/// Which strategy produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "listing-geo")]
    ListingGeo,
    #[serde(rename = "nominatim-structured")]
    NominatimStructured,
    #[serde(rename = "nominatim-structured-lite")]
    NominatimStructuredLite,
    #[serde(rename = "nominatim-q")]
    NominatimFreeText,
}

impl Source {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::ListingGeo => "listing-geo",
            Source::NominatimStructured => "nominatim-structured",
            Source::NominatimStructuredLite => "nominatim-structured-lite",
            Source::NominatimFreeText => "nominatim-q",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlace {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
    pub source: Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// Every strategy ran without a selectable candidate.
    NotFound,
    /// The overall resolution budget expired.
    Timeout,
}

impl NotFoundReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NotFoundReason::NotFound => "not_found",
            NotFoundReason::Timeout => "timeout",
        }
    }
}

/// Final answer of a resolution.
///
/// Serializes as `{ "ok": true, lat, lng, displayName, source }` or
/// `{ "ok": false, "reason": "not_found" | "timeout" }`.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(ResolvedPlace),
    NotFound(NotFoundReason),
}

impl Resolution {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Resolution::Found(place) => {
                let mut s = serializer.serialize_struct("Resolution", 5)?;
                s.serialize_field("ok", &true)?;
                s.serialize_field("lat", &place.lat)?;
                s.serialize_field("lng", &place.lng)?;
                s.serialize_field("displayName", &place.display_name)?;
                s.serialize_field("source", &place.source)?;
                s.end()
            }
            Resolution::NotFound(reason) => {
                let mut s = serializer.serialize_struct("Resolution", 2)?;
                s.serialize_field("ok", &false)?;
                s.serialize_field("reason", reason.as_str())?;
                s.end()
            }
        }
    }
}
