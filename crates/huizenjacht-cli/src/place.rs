//! Place resolver command handlers for the CLI.
//!
//! Results go to stdout as JSON; logs go to stderr.

use std::time::Duration;

use huizenjacht_core::AppConfig;
use huizenjacht_geocode::{
    extract_hints, fetch_listing_html, sanitize_city, LocationQuery, PlaceResolver,
    ResolutionReport, ResolverSettings,
};

/// Resolve `query` once, without a cache, and print the outcome.
///
/// # Errors
///
/// Returns an error if the resolver cannot be built or the query has nothing
/// to search on. A miss is printed, not returned as an error.
pub(crate) async fn run_resolve(
    config: &AppConfig,
    query: &LocationQuery,
    debug: bool,
) -> anyhow::Result<()> {
    let resolver = PlaceResolver::new(ResolverSettings::from_app_config(config), None)
        .map_err(|e| anyhow::anyhow!("failed to build place resolver: {e}"))?;

    let report = resolver.resolve(query).await?;
    println!("{}", serde_json::to_string_pretty(&report_json(&report, debug)?)?);
    Ok(())
}

/// Resolution as `{ ok, ... }`, with the trace merged in when `debug` is set.
fn report_json(report: &ResolutionReport, debug: bool) -> anyhow::Result<serde_json::Value> {
    let mut out = serde_json::to_value(&report.resolution)?;
    if debug {
        if let (Some(obj), serde_json::Value::Object(trace)) =
            (out.as_object_mut(), serde_json::to_value(&report.trace)?)
        {
            obj.extend(trace);
        }
    }
    Ok(out)
}

/// Fetch `url` and print the hints the extractor finds.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the page cannot be
/// fetched.
pub(crate) async fn run_hints(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let html = fetch_listing_html(&client, url, &config.listing_user_agent).await?;
    tracing::info!(url, bytes = html.len(), "listing fetched");

    let hints = extract_hints(&html, url);
    println!("{}", serde_json::to_string_pretty(&hints)?);
    Ok(())
}

pub(crate) fn run_sanitize(text: &str) {
    match sanitize_city(text) {
        Some(city) => println!("{city}"),
        None => println!("(no city name left after sanitizing)"),
    }
}
