//! Client for the Nominatim `/search` endpoint, structured and free-text.

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::error::GeocodeError;
use crate::rate_limit::retry_after_rate_limit;
use crate::types::{Candidate, CandidateAddress};

/// Connection settings for [`NominatimClient`].
#[derive(Debug, Clone)]
pub struct NominatimSettings {
    pub base_url: String,
    /// Identifying `User-Agent`; the public instance rejects anonymous clients.
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_secs: u64,
    /// Maximum candidates requested per query.
    pub limit: u32,
    /// Delay before the single retry after a 429; `0` disables the retry.
    pub rate_limit_retry_delay_ms: u64,
}

/// Discrete search fields for a structured query. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredQuery {
    pub city: Option<String>,
    pub postalcode: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
}

impl StructuredQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        [
            ("city", &self.city),
            ("postalcode", &self.postalcode),
            ("county", &self.county),
            ("state", &self.state),
            ("country", &self.country),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value.as_deref()?.trim();
            (!value.is_empty()).then(|| (key, value.to_owned()))
        })
        .collect()
    }

    /// `key=value` pairs joined by `&`, for logs and debug traces.
    #[must_use]
    pub fn describe(&self) -> String {
        self.params()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: serde_json::Value,
    lon: serde_json::Value,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    postcode: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    hamlet: Option<String>,
    county: Option<String>,
    state: Option<String>,
}

impl NominatimPlace {
    /// Rows without parsable coordinates are dropped.
    fn into_candidate(self) -> Option<Candidate> {
        let latitude = coordinate_value(&self.lat)?;
        let longitude = coordinate_value(&self.lon)?;
        let a = self.address;
        Some(Candidate {
            latitude,
            longitude,
            display_name: self.display_name,
            address: CandidateAddress {
                postcode: a.postcode,
                city: a.city,
                town: a.town,
                village: a.village,
                municipality: a.municipality,
                hamlet: a.hamlet,
                county: a.county,
                region: a.state,
            },
        })
    }
}

/// Nominatim sends coordinates as strings; accept numbers too.
fn coordinate_value(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|v| v.is_finite())
}

/// HTTP client for a Nominatim-compatible geocoder.
///
/// Requests `format=jsonv2` with `addressdetails=1` so every candidate
/// carries its address breakdown.
pub struct NominatimClient {
    client: Client,
    search_url: Url,
    accept_language: String,
    limit: u32,
    retry_delay: Option<Duration>,
}

impl NominatimClient {
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`GeocodeError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(settings: &NominatimSettings) -> Result<Self, GeocodeError> {
        let search_url = search_url(&settings.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(&settings.user_agent)
            .build()?;

        Ok(Self {
            client,
            search_url,
            accept_language: settings.accept_language.clone(),
            limit: settings.limit.max(1),
            retry_delay: (settings.rate_limit_retry_delay_ms > 0)
                .then(|| Duration::from_millis(settings.rate_limit_retry_delay_ms)),
        })
    }

    /// Structured search with discrete address fields.
    ///
    /// # Errors
    ///
    /// See [`GeocodeError`]; the resolver treats every variant as "no candidates".
    pub async fn search_structured(
        &self,
        query: &StructuredQuery,
    ) -> Result<Vec<Candidate>, GeocodeError> {
        self.search(query.params()).await
    }

    /// Free-text search with a single `q` string.
    ///
    /// # Errors
    ///
    /// See [`GeocodeError`]; the resolver treats every variant as "no candidates".
    pub async fn search_free_text(&self, q: &str) -> Result<Vec<Candidate>, GeocodeError> {
        self.search(vec![("q", q.to_owned())]).await
    }

    async fn search(
        &self,
        params: Vec<(&'static str, String)>,
    ) -> Result<Vec<Candidate>, GeocodeError> {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("addressdetails", "1")
            .append_pair("limit", &self.limit.to_string())
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));

        retry_after_rate_limit(self.retry_delay, || {
            let url = url.clone();
            async move { self.fetch_candidates(url).await }
        })
        .await
    }

    async fn fetch_candidates(&self, url: Url) -> Result<Vec<Candidate>, GeocodeError> {
        tracing::debug!(url = %url, "geocoder request");
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GeocodeError::RateLimited {
                host: url.host_str().unwrap_or_default().to_owned(),
                retry_after_secs,
            });
        }
        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let places: Vec<NominatimPlace> =
            serde_json::from_str(&body).map_err(|source| GeocodeError::Deserialize {
                context: "nominatim search results".to_owned(),
                source,
            })?;

        Ok(places
            .into_iter()
            .filter_map(NominatimPlace::into_candidate)
            .collect())
    }
}

fn search_url(base_url: &str) -> Result<Url, GeocodeError> {
    let invalid = |reason: String| GeocodeError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason,
    };

    let mut normalized = base_url.trim().to_owned();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let base = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme \"{}\"", base.scheme())));
    }
    base.join("search").map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_params_skip_blank_fields() {
        let query = StructuredQuery {
            city: Some("Biot".to_owned()),
            postalcode: Some("  ".to_owned()),
            country: Some("France".to_owned()),
            ..StructuredQuery::default()
        };
        assert_eq!(query.describe(), "city=Biot&country=France");
    }

    #[test]
    fn search_url_keeps_base_path() {
        let url = search_url("http://127.0.0.1:8080/nominatim").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/nominatim/search");

        let url = search_url("https://nominatim.openstreetmap.org/").unwrap();
        assert_eq!(url.as_str(), "https://nominatim.openstreetmap.org/search");
    }

    #[test]
    fn search_url_rejects_bad_bases() {
        assert!(matches!(
            search_url("ftp://example.com"),
            Err(GeocodeError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            search_url("not a url"),
            Err(GeocodeError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn place_rows_map_state_to_region_and_parse_string_coordinates() {
        let json = r#"[{"lat": "43.6273", "lon": "7.0974", "display_name": "Biot, Alpes-Maritimes",
            "address": {"town": "Biot", "postcode": "06410", "county": "Alpes-Maritimes",
                        "state": "Provence-Alpes-Côte d'Azur"}},
            {"lat": "n/a", "lon": "7.0", "display_name": "broken"}]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(json).unwrap();
        let candidates: Vec<Candidate> = places
            .into_iter()
            .filter_map(NominatimPlace::into_candidate)
            .collect();

        assert_eq!(candidates.len(), 1);
        let biot = &candidates[0];
        assert!((biot.latitude - 43.6273).abs() < 1e-9);
        assert_eq!(biot.address.locality(), Some("Biot"));
        assert_eq!(biot.address.region.as_deref(), Some("Provence-Alpes-Côte d'Azur"));
    }
}
