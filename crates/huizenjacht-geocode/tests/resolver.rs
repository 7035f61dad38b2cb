//! Integration tests for `PlaceResolver::resolve`.
//!
//! A single `wiremock` server plays both the listing site and the Nominatim
//! geocoder, so no real network traffic is made.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use huizenjacht_geocode::{
    LocationQuery, MatchRule, NominatimSettings, NotFoundReason, PlaceResolver, ResolutionCache,
    Resolution, ResolveError, ResolverSettings, Source,
};

fn settings(server: &MockServer) -> ResolverSettings {
    ResolverSettings {
        nominatim: NominatimSettings {
            base_url: server.uri(),
            user_agent: "huizenjacht-test/0.1".to_owned(),
            accept_language: "fr".to_owned(),
            timeout_secs: 5,
            limit: 5,
            rate_limit_retry_delay_ms: 1,
        },
        listing_user_agent: "huizenjacht-test/0.1".to_owned(),
        listing_timeout_secs: 5,
        default_country: "France".to_owned(),
        resolve_timeout: Duration::from_secs(10),
    }
}

fn test_resolver(server: &MockServer) -> PlaceResolver {
    PlaceResolver::new(settings(server), None).expect("failed to build test resolver")
}

/// One Nominatim `jsonv2` result row.
fn place(lat: &str, lon: &str, name: &str, address: serde_json::Value) -> serde_json::Value {
    json!({ "lat": lat, "lon": lon, "display_name": name, "address": address })
}

fn html_response(html: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(html.to_owned(), "text/html; charset=utf-8")
}

fn found(resolution: &Resolution) -> (f64, f64, String, Source) {
    match resolution {
        Resolution::Found(place) => (place.lat, place.lng, place.display_name.clone(), place.source),
        Resolution::NotFound(reason) => panic!("expected a hit, got {reason:?}"),
    }
}

// ---------------------------------------------------------------------------
// Listing coordinates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn embedded_coordinates_resolve_without_geocoding() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/annonce/42"))
        .respond_with(html_response(
            r#"<html><head><title>Maison à Biot (06410)</title></head><body>
               <script>window.listing = {"latitude": "43.6", "longitude": "7.0"};</script>
               </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let query = LocationQuery {
        listing_url: Some(format!("{}/annonce/42", server.uri())),
        ..LocationQuery::default()
    };
    let report = test_resolver(&server).resolve(&query).await.unwrap();

    let (lat, lng, _, source) = found(&report.resolution);
    assert!((lat - 43.6).abs() < 1e-9);
    assert!((lng - 7.0).abs() < 1e-9);
    assert_eq!(source, Source::ListingGeo);
    assert!(report.trace.attempts.is_empty());
}

// ---------------------------------------------------------------------------
// Hints feeding the cascade
// ---------------------------------------------------------------------------

#[tokio::test]
async fn title_hints_drive_structured_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/annonce/98765"))
        .respond_with(html_response(
            "<html><head><title>Vente maison à Carcassonne (11000)</title></head><body><p>Belle maison.</p></body></html>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("city", "Carcassonne"))
        .and(query_param("postalcode", "11000"))
        .and(query_param("country", "France"))
        .and(query_param("format", "jsonv2"))
        .and(query_param("addressdetails", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place("43.2130", "2.3491", "Carcassonne, Aude", json!({"city": "Carcassonne", "postcode": "11000"})),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = LocationQuery {
        listing_url: Some(format!("{}/annonce/98765", server.uri())),
        ..LocationQuery::default()
    };
    let report = test_resolver(&server).resolve(&query).await.unwrap();

    let (_, _, name, source) = found(&report.resolution);
    assert_eq!(name, "Carcassonne, Aude");
    assert_eq!(source, Source::NominatimStructured);
    assert_eq!(report.trace.matched_by, Some(MatchRule::Postcode));

    let want = report.trace.want.expect("want recorded");
    assert_eq!(want.city.as_deref(), Some("Carcassonne"));
    assert_eq!(want.postal_code.as_deref(), Some("11000"));
}

#[tokio::test]
async fn cascade_runs_rich_then_lite_then_free_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/annonce/7"))
        .respond_with(html_response(
            r#"<html><head><title>Montferrand (11320)</title></head><body>
               <nav class="breadcrumb"><a href="/occitanie">Occitanie</a><a href="/aude">Aude (11)</a></nav>
               </body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("county", "Aude"))
        .and(query_param("state", "Occitanie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("city", "Montferrand"))
        .and(query_param_is_missing("county"))
        .and(query_param_is_missing("q"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Montferrand, 11320, Aude, Occitanie, France"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place("43.3167", "1.9833", "Montferrand, Aude", json!({"village": "Montferrand", "postcode": "11320"})),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = LocationQuery {
        listing_url: Some(format!("{}/annonce/7", server.uri())),
        ..LocationQuery::default()
    };
    let report = test_resolver(&server).resolve(&query).await.unwrap();

    let (_, _, _, source) = found(&report.resolution);
    assert_eq!(source, Source::NominatimFreeText);

    let strategies: Vec<Source> = report.trace.attempts.iter().map(|a| a.strategy).collect();
    assert_eq!(
        strategies,
        vec![
            Source::NominatimStructured,
            Source::NominatimStructuredLite,
            Source::NominatimFreeText,
        ]
    );

    // Listing fetch first, then the geocoder calls in cascade order.
    let requests = server.received_requests().await.expect("recording enabled");
    let paths: Vec<String> = requests
        .iter()
        .map(|r| {
            let query = r.url.query().unwrap_or_default();
            if query.contains("q=") {
                "free".to_owned()
            } else if query.contains("county=") {
                "rich".to_owned()
            } else if r.url.path() == "/search" {
                "lite".to_owned()
            } else {
                "listing".to_owned()
            }
        })
        .collect();
    assert_eq!(paths, vec!["listing", "rich", "lite", "free"]);
}

#[tokio::test]
async fn failed_listing_fetch_falls_back_to_url_hints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fr/annonces/biot/123"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("city", "Biot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place("43.6273", "7.0974", "Biot", json!({"town": "Biot", "postcode": "06410"})),
        ])))
        .mount(&server)
        .await;

    let query = LocationQuery {
        listing_url: Some(format!("{}/fr/annonces/biot/123", server.uri())),
        ..LocationQuery::default()
    };
    let report = test_resolver(&server).resolve(&query).await.unwrap();

    let (_, _, name, _) = found(&report.resolution);
    assert_eq!(name, "Biot");
    assert!(report.trace.listing_error.is_some());
}

// ---------------------------------------------------------------------------
// Tie-break through the whole pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn postcode_match_wins_over_earlier_city_matches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place("43.58", "7.10", "Biot (wrong postcode)", json!({"city": "Biot", "postcode": "06600"})),
            place("43.62", "7.09", "Biot 06410", json!({"town": "Biot", "postcode": "06410"})),
        ])))
        .mount(&server)
        .await;

    let query = LocationQuery {
        city: Some("Biot".to_owned()),
        postal_code: Some("06410".to_owned()),
        ..LocationQuery::default()
    };
    let report = test_resolver(&server).resolve(&query).await.unwrap();

    let (_, _, name, _) = found(&report.resolution);
    assert_eq!(name, "Biot 06410");
    assert_eq!(report.trace.matched_by, Some(MatchRule::Postcode));
}

#[tokio::test]
async fn equal_city_matches_return_the_first_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("city", "Biot"))
        .and(query_param("country", "France"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place("43.6273", "7.0974", "Biot 06410", json!({"city": "Biot", "postcode": "06410"})),
            place("43.5800", "7.1000", "Biot 06600", json!({"city": "Biot", "postcode": "06600"})),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = LocationQuery {
        city: Some("Biot".to_owned()),
        country: Some("France".to_owned()),
        ..LocationQuery::default()
    };
    let report = test_resolver(&server).resolve(&query).await.unwrap();

    let (_, _, name, source) = found(&report.resolution);
    assert_eq!(name, "Biot 06410");
    assert_eq!(source, Source::NominatimStructured);
    assert_eq!(report.trace.matched_by, Some(MatchRule::City));
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unmatched_postal_code_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let query = LocationQuery {
        postal_code: Some("99999".to_owned()),
        ..LocationQuery::default()
    };
    let report = test_resolver(&server).resolve(&query).await.unwrap();

    assert_eq!(report.resolution, Resolution::NotFound(NotFoundReason::NotFound));
    assert_eq!(report.trace.attempts.len(), 2);
    assert_eq!(report.trace.attempts[1].query, "99999, France");
}

#[tokio::test]
async fn upstream_errors_move_on_to_the_next_strategy() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param_is_missing("q"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Sarlat, France"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place("44.889", "1.216", "Sarlat-la-Canéda", json!({"town": "Sarlat-la-Canéda"})),
        ])))
        .mount(&server)
        .await;

    let query = LocationQuery {
        city: Some("Sarlat".to_owned()),
        ..LocationQuery::default()
    };
    let report = test_resolver(&server).resolve(&query).await.unwrap();

    let (_, _, _, source) = found(&report.resolution);
    assert_eq!(source, Source::NominatimFreeText);
    assert!(report.trace.attempts[0].error.is_some());
    assert_eq!(report.trace.matched_by, Some(MatchRule::FirstResult));
}

#[tokio::test]
async fn rate_limited_request_is_retried_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place("43.6273", "7.0974", "Biot", json!({"town": "Biot"})),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = LocationQuery {
        city: Some("Biot".to_owned()),
        ..LocationQuery::default()
    };
    let report = test_resolver(&server).resolve(&query).await.unwrap();

    let (_, _, _, source) = found(&report.resolution);
    assert_eq!(source, Source::NominatimStructured);
    assert_eq!(report.trace.attempts.len(), 1);
}

#[tokio::test]
async fn empty_query_is_rejected_before_any_request() {
    let server = MockServer::start().await;

    let query = LocationQuery {
        country: Some("France".to_owned()),
        ..LocationQuery::default()
    };
    let err = test_resolver(&server).resolve(&query).await.unwrap_err();

    assert!(matches!(err, ResolveError::NoQuery { .. }));
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn listing_without_hints_is_no_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/123"))
        .respond_with(html_response("<html><body><p>Rien ici.</p></body></html>"))
        .mount(&server)
        .await;

    let query = LocationQuery {
        listing_url: Some(format!("{}/123", server.uri())),
        ..LocationQuery::default()
    };
    let err = test_resolver(&server).resolve(&query).await.unwrap_err();

    match err {
        ResolveError::NoQuery { listing_url, .. } => {
            assert_eq!(listing_url, Some(format!("{}/123", server.uri())));
        }
        other => panic!("expected NoQuery, got {other:?}"),
    }
}

#[tokio::test]
async fn overall_budget_expiry_is_a_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.resolve_timeout = Duration::from_millis(200);
    let cache = Arc::new(ResolutionCache::new(Duration::from_secs(60), 16));
    let resolver = PlaceResolver::new(settings, Some(Arc::clone(&cache))).unwrap();

    let query = LocationQuery {
        city: Some("Biot".to_owned()),
        ..LocationQuery::default()
    };
    let report = resolver.resolve(&query).await.unwrap();

    assert_eq!(report.resolution, Resolution::NotFound(NotFoundReason::Timeout));
    assert!(cache.is_empty().await, "timeouts must not be cached");
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_query_is_served_from_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            place("43.6273", "7.0974", "Biot", json!({"town": "Biot"})),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(ResolutionCache::new(Duration::from_secs(60), 16));
    let resolver = PlaceResolver::new(settings(&server), Some(cache)).unwrap();

    let first = resolver
        .resolve(&LocationQuery {
            city: Some("Biot".to_owned()),
            ..LocationQuery::default()
        })
        .await
        .unwrap();
    let second = resolver
        .resolve(&LocationQuery {
            city: Some("  BIOT ".to_owned()),
            country: Some("france".to_owned()),
            ..LocationQuery::default()
        })
        .await
        .unwrap();

    assert!(!first.trace.cached);
    assert!(second.trace.cached);
    assert_eq!(first.resolution, second.resolution);
}
