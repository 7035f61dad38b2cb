use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use huizenjacht_geocode::{
    LocationQuery, NotFoundReason, Resolution, ResolutionReport, ResolutionTrace, ResolveError,
    Source,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::AppState;

/// Lets a shared cache keep hits and misses for a day.
const CACHE_CONTROL: &str = "public, s-maxage=86400, stale-while-revalidate=86400";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GeocodeParams {
    url: Option<String>,
    address: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    debug: Option<String>,
}

impl GeocodeParams {
    fn wants_debug(&self) -> bool {
        self.debug.as_deref().map(str::trim) == Some("1")
    }

    fn into_query(self) -> LocationQuery {
        LocationQuery {
            listing_url: self.url,
            free_address: self.address,
            city: self.city,
            postal_code: self.postal_code,
            country: self.country,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaceBody {
    lat: f64,
    lng: f64,
    display_name: String,
    source: Source,
    #[serde(flatten)]
    trace: Option<ResolutionTrace>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    listing_error: Option<String>,
    #[serde(flatten)]
    trace: Option<ResolutionTrace>,
}

impl ErrorBody {
    fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            url: None,
            listing_error: None,
            trace: None,
        }
    }
}

/// `GET /api/geocode`
pub(super) async fn geocode(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<GeocodeParams>,
) -> Response {
    let debug = params.wants_debug();
    let query = params.into_query();

    match state.resolver.resolve(&query).await {
        Ok(report) => resolution_response(report, debug),
        Err(ResolveError::NoQuery {
            listing_url,
            listing_error,
        }) => {
            tracing::debug!(request_id = %req_id.0, "geocode request without search terms");
            let body = ErrorBody {
                url: listing_url,
                listing_error,
                ..ErrorBody::new(
                    "no_query",
                    "provide url, address, city or postalCode to search on",
                )
            };
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
        Err(err) => {
            tracing::error!(request_id = %req_id.0, error = %err, "geocode request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("internal_error", "geocoding failed")),
            )
                .into_response()
        }
    }
}

fn resolution_response(report: ResolutionReport, debug: bool) -> Response {
    let trace = debug.then_some(report.trace);

    let mut response = match report.resolution {
        Resolution::Found(place) => Json(PlaceBody {
            lat: place.lat,
            lng: place.lng,
            display_name: place.display_name,
            source: place.source,
            trace,
        })
        .into_response(),
        Resolution::NotFound(NotFoundReason::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                trace,
                ..ErrorBody::new("not_found", "no geocoder result matched the query")
            }),
        )
            .into_response(),
        Resolution::NotFound(NotFoundReason::Timeout) => {
            return (
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorBody {
                    trace,
                    ..ErrorBody::new("timeout", "geocoding took too long")
                }),
            )
                .into_response();
        }
    };

    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL),
    );
    response
}
