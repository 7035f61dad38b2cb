mod geocode;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use huizenjacht_geocode::PlaceResolver;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<PlaceResolver>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn geocode_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/geocode", get(geocode::geocode))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(geocode_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData { status: "ok" },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use huizenjacht_geocode::{NominatimSettings, ResolutionCache, ResolverSettings};
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_settings(base_url: &str) -> ResolverSettings {
        ResolverSettings {
            nominatim: NominatimSettings {
                base_url: base_url.to_owned(),
                user_agent: "huizenjacht-test/0.1".to_owned(),
                accept_language: "fr".to_owned(),
                timeout_secs: 5,
                limit: 5,
                rate_limit_retry_delay_ms: 0,
            },
            listing_user_agent: "huizenjacht-test/0.1".to_owned(),
            listing_timeout_secs: 5,
            default_country: "France".to_owned(),
            resolve_timeout: Duration::from_secs(10),
        }
    }

    fn app_with(settings: ResolverSettings, rate_limit: RateLimitState) -> Router {
        let cache = Arc::new(ResolutionCache::new(Duration::from_secs(60), 32));
        let resolver = PlaceResolver::new(settings, Some(cache)).expect("resolver");
        build_app(
            AppState {
                resolver: Arc::new(resolver),
            },
            rate_limit,
        )
    }

    fn test_app(base_url: &str) -> Router {
        app_with(resolver_settings(base_url), RateLimitState::per_minute(0))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    async fn mount_biot(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("city", "Biot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "lat": "43.6273",
                    "lon": "7.0974",
                    "display_name": "Biot, Alpes-Maritimes",
                    "address": { "town": "Biot", "postcode": "06410" }
                }
            ])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn health_reports_ok_with_request_id() {
        let app = test_app("http://127.0.0.1:9");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "health-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["meta"]["request_id"], "health-1");
    }

    #[tokio::test]
    async fn geocode_without_search_terms_is_bad_request() {
        let app = test_app("http://127.0.0.1:9");
        let response = app
            .oneshot(get("/api/geocode?country=France"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "no_query");
    }

    #[tokio::test]
    async fn geocode_hit_returns_place_with_cache_header() {
        let server = MockServer::start().await;
        mount_biot(&server).await;

        let response = test_app(&server.uri())
            .oneshot(get("/api/geocode?city=Biot&postalCode=06410"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some(geocode_cache_control())
        );
        let json = json_body(response).await;
        assert_eq!(json["displayName"], "Biot, Alpes-Maritimes");
        assert_eq!(json["source"], "nominatim-structured");
        assert!((json["lat"].as_f64().expect("lat") - 43.6273).abs() < 1e-9);
        assert!(json.get("attempts").is_none(), "trace only with debug=1");
    }

    #[tokio::test]
    async fn geocode_debug_includes_trace() {
        let server = MockServer::start().await;
        mount_biot(&server).await;

        let response = test_app(&server.uri())
            .oneshot(get("/api/geocode?city=Biot&debug=1"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["cached"], false);
        assert_eq!(json["matchedBy"], "city");
        assert_eq!(json["attempts"][0]["strategy"], "nominatim-structured");
        assert_eq!(json["want"]["city"], "Biot");
    }

    #[tokio::test]
    async fn geocode_miss_is_not_found_and_cacheable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let response = test_app(&server.uri())
            .oneshot(get("/api/geocode?postalCode=99999"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key(header::CACHE_CONTROL));
        let json = json_body(response).await;
        assert_eq!(json["error"], "not_found");
        assert!(json["message"].is_string());
    }

    #[tokio::test]
    async fn geocode_budget_expiry_is_gateway_timeout() {
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

        let mut settings = resolver_settings(&server.uri());
        settings.resolve_timeout = Duration::from_millis(200);
        let response = app_with(settings, RateLimitState::per_minute(0))
            .oneshot(get("/api/geocode?city=Biot"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(!response.headers().contains_key(header::CACHE_CONTROL));
        let json = json_body(response).await;
        assert_eq!(json["error"], "timeout");
    }

    #[tokio::test]
    async fn geocode_is_rate_limited_but_health_is_not() {
        let app = app_with(
            resolver_settings("http://127.0.0.1:9"),
            RateLimitState::per_minute(1),
        );

        let first = app.clone().oneshot(get("/api/geocode")).await.expect("response");
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);

        let second = app.clone().oneshot(get("/api/geocode")).await.expect("response");
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        let health = app.oneshot(get("/api/v1/health")).await.expect("response");
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = test_app("http://127.0.0.1:9");
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header(header::ORIGIN, "https://huizenjacht.example")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    fn geocode_cache_control() -> &'static str {
        "public, s-maxage=86400, stale-while-revalidate=86400"
    }
}
