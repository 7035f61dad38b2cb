//! Place resolution: listing hints, merge, query cascade, tie-break.

use std::sync::Arc;
use std::time::Duration;

use huizenjacht_core::AppConfig;
use serde::Serialize;

use crate::cache::ResolutionCache;
use crate::error::ResolveError;
use crate::hints::extract_hints;
use crate::listing::fetch_listing_html;
use crate::nominatim::{NominatimClient, NominatimSettings};
use crate::queries::{plan_queries, PlannedQuery};
use crate::select::{select_candidate, MatchRule};
use crate::text::non_blank;
use crate::types::{
    LocationQuery, NotFoundReason, Resolution, ResolvedPlace, ResolvedWant, ScrapedHints, Source,
};

/// Everything [`PlaceResolver`] needs besides the cache.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub nominatim: NominatimSettings,
    pub listing_user_agent: String,
    pub listing_timeout_secs: u64,
    /// Country used when the query does not name one.
    pub default_country: String,
    /// Wall-clock budget for one whole resolution.
    pub resolve_timeout: Duration,
}

impl ResolverSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            nominatim: NominatimSettings {
                base_url: config.nominatim_url.clone(),
                user_agent: config.user_agent.clone(),
                accept_language: config.accept_language.clone(),
                timeout_secs: config.request_timeout_secs,
                limit: config.max_candidates,
                rate_limit_retry_delay_ms: config.rate_limit_retry_delay_ms,
            },
            listing_user_agent: config.listing_user_agent.clone(),
            listing_timeout_secs: config.request_timeout_secs,
            default_country: config.default_country.clone(),
            resolve_timeout: Duration::from_secs(config.resolve_timeout_secs),
        }
    }
}

/// One geocoder call made during a resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub strategy: Source,
    pub query: String,
    pub candidates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Internal record of how a resolution went, exposed with `debug=1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionTrace {
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<ScrapedHints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub want: Option<ResolvedWant>,
    pub attempts: Vec<Attempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<MatchRule>,
}

#[derive(Debug, Clone)]
pub struct ResolutionReport {
    pub resolution: Resolution,
    pub trace: ResolutionTrace,
}

/// Resolves a [`LocationQuery`] to a coordinate.
///
/// All outbound calls run strictly one after another. Listing and geocoder
/// failures are absorbed; only an empty query is an error.
pub struct PlaceResolver {
    geocoder: NominatimClient,
    listing_client: reqwest::Client,
    listing_user_agent: String,
    default_country: String,
    resolve_timeout: Duration,
    cache: Option<Arc<ResolutionCache>>,
}

impl PlaceResolver {
    /// Builds the resolver. Pass `None` to run without a cache.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Geocoder`] for an unusable geocoder base URL
    /// and [`ResolveError::ListingClient`] if an HTTP client cannot be built.
    pub fn new(
        settings: ResolverSettings,
        cache: Option<Arc<ResolutionCache>>,
    ) -> Result<Self, ResolveError> {
        let geocoder = NominatimClient::new(&settings.nominatim)?;
        let listing_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.listing_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            geocoder,
            listing_client,
            listing_user_agent: settings.listing_user_agent,
            default_country: settings.default_country,
            resolve_timeout: settings.resolve_timeout,
            cache,
        })
    }

    /// Runs the full resolution for `query`.
    ///
    /// A cache hit returns immediately with `trace.cached` set. Running out
    /// of the overall time budget yields `NotFound(Timeout)`, which is never
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NoQuery`] when neither the explicit fields nor
    /// the listing page give anything to search on.
    pub async fn resolve(&self, query: &LocationQuery) -> Result<ResolutionReport, ResolveError> {
        if !query.has_search_signal() {
            return Err(ResolveError::NoQuery {
                listing_url: None,
                listing_error: None,
            });
        }

        let cache_key = query.cache_key(&self.default_country);
        if let Some(cache) = &self.cache {
            if let Some(resolution) = cache.get(&cache_key).await {
                tracing::debug!(key = %cache_key, "resolution cache hit");
                return Ok(ResolutionReport {
                    resolution,
                    trace: ResolutionTrace {
                        cached: true,
                        ..ResolutionTrace::default()
                    },
                });
            }
        }

        let mut trace = ResolutionTrace::default();
        let outcome = tokio::time::timeout(self.resolve_timeout, self.run(query, &mut trace)).await;
        let resolution = match outcome {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    budget_secs = self.resolve_timeout.as_secs(),
                    attempts = trace.attempts.len(),
                    "resolution timed out"
                );
                Resolution::NotFound(NotFoundReason::Timeout)
            }
        };

        if let Some(cache) = &self.cache {
            cache.insert(cache_key, &resolution).await;
        }
        Ok(ResolutionReport { resolution, trace })
    }

    async fn run(
        &self,
        query: &LocationQuery,
        trace: &mut ResolutionTrace,
    ) -> Result<Resolution, ResolveError> {
        let listing_url = non_blank(query.listing_url.as_deref());
        let hints = match listing_url.as_deref() {
            Some(url) => self.listing_hints(url, trace).await,
            None => ScrapedHints::default(),
        };
        trace.hints = (!hints.is_empty()).then(|| hints.clone());

        if let (Some(coordinate), Some(url)) = (hints.direct_coordinate, listing_url.as_deref()) {
            tracing::info!(url, lat = coordinate.lat, lng = coordinate.lng, "resolved from listing coordinates");
            return Ok(Resolution::Found(ResolvedPlace {
                lat: coordinate.lat,
                lng: coordinate.lng,
                display_name: url.to_owned(),
                source: Source::ListingGeo,
            }));
        }

        let want = ResolvedWant::merge(query, &hints, &self.default_country);
        if want.is_empty() {
            return Err(ResolveError::NoQuery {
                listing_url,
                listing_error: trace.listing_error.clone(),
            });
        }
        trace.want = Some(want.clone());

        for planned in plan_queries(&want) {
            let strategy = planned.source();
            let description = planned.describe();
            let result = match &planned {
                PlannedQuery::Structured { query, .. } => self.geocoder.search_structured(query).await,
                PlannedQuery::FreeText(q) => self.geocoder.search_free_text(q).await,
            };

            let mut attempt = Attempt {
                strategy,
                query: description,
                candidates: 0,
                error: None,
            };
            match result {
                Ok(candidates) => {
                    attempt.candidates = candidates.len();
                    let selected = select_candidate(&candidates, &want);
                    trace.attempts.push(attempt);
                    if let Some((hit, rule)) = selected {
                        tracing::info!(
                            source = %strategy,
                            matched_by = ?rule,
                            display_name = %hit.display_name,
                            "place resolved"
                        );
                        trace.matched_by = Some(rule);
                        return Ok(Resolution::Found(ResolvedPlace {
                            lat: hit.latitude,
                            lng: hit.longitude,
                            display_name: hit.display_name.clone(),
                            source: strategy,
                        }));
                    }
                    tracing::debug!(source = %strategy, "no candidates");
                }
                Err(err) => {
                    tracing::warn!(source = %strategy, error = %err, "geocoder query failed");
                    attempt.error = Some(err.to_string());
                    trace.attempts.push(attempt);
                }
            }
        }

        tracing::info!(attempts = trace.attempts.len(), "no candidate selected");
        Ok(Resolution::NotFound(NotFoundReason::NotFound))
    }

    /// Fetches and scans the listing. A failed fetch still lets the
    /// URL-only rules run.
    async fn listing_hints(&self, url: &str, trace: &mut ResolutionTrace) -> ScrapedHints {
        match fetch_listing_html(&self.listing_client, url, &self.listing_user_agent).await {
            Ok(html) => extract_hints(&html, url),
            Err(err) => {
                tracing::warn!(url, error = %err, "listing fetch failed; using URL hints only");
                trace.listing_error = Some(err.to_string());
                extract_hints("", url)
            }
        }
    }
}
