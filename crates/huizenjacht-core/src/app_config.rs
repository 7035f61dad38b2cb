use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Base URL of the Nominatim-compatible geocoder.
    pub nominatim_url: String,
    /// Identifying `User-Agent` sent to the geocoder (Nominatim usage policy).
    pub user_agent: String,
    /// `User-Agent` sent when fetching listing pages.
    pub listing_user_agent: String,
    pub accept_language: String,
    pub default_country: String,
    pub request_timeout_secs: u64,
    pub resolve_timeout_secs: u64,
    pub max_candidates: u32,
    /// Fixed delay before the single retry on HTTP 429. `0` disables the retry.
    pub rate_limit_retry_delay_ms: u64,
    /// Resolution cache TTL. `0` disables the cache.
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub api_rate_limit_per_minute: usize,
}
