use thiserror::Error;

/// Failure while calling the upstream geocoder.
///
/// Every variant is absorbed by the resolver cascade and treated as
/// "this strategy yielded no candidates".
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {host} (retry after {retry_after_secs}s)")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid geocoder base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// Failure while fetching a listing page for hint extraction.
///
/// Never fatal: the resolver continues with the explicit query fields.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("HTTP error fetching listing page: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("listing URL \"{url}\" is not usable: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("listing page is not HTML (content-type \"{content_type}\")")]
    NotHtml { content_type: String },

    #[error("listing page exceeds {max_bytes} bytes")]
    TooLarge { max_bytes: usize },
}

/// Errors that end a resolution before a result can be produced.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither explicit fields nor the listing page gave anything to search on.
    #[error("no usable search input")]
    NoQuery {
        listing_url: Option<String>,
        listing_error: Option<String>,
    },

    #[error("geocoder client setup failed: {0}")]
    Geocoder(#[from] GeocodeError),

    #[error("listing client setup failed: {0}")]
    ListingClient(#[from] reqwest::Error),
}
