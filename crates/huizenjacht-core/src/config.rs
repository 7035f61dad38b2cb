use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development config. Tests drive this with a plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("HUIZENJACHT_ENV", "development"))?;
    let bind_addr = parse_addr("HUIZENJACHT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("HUIZENJACHT_LOG_LEVEL", "info");

    let nominatim_url = or_default(
        "HUIZENJACHT_NOMINATIM_URL",
        "https://nominatim.openstreetmap.org/",
    );
    if !(nominatim_url.starts_with("http://") || nominatim_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "HUIZENJACHT_NOMINATIM_URL".to_string(),
            reason: format!("expected an http(s) URL, got \"{nominatim_url}\""),
        });
    }

    let user_agent = or_default(
        "HUIZENJACHT_USER_AGENT",
        "Huizenjacht/1.0 (mailto:you@example.com)",
    );
    let listing_user_agent = or_default(
        "HUIZENJACHT_LISTING_USER_AGENT",
        "Mozilla/5.0 (compatible; HuizenjachtGeocoder/1.0; +https://huizenjacht.vercel.app/)",
    );
    let accept_language = or_default("HUIZENJACHT_ACCEPT_LANGUAGE", "fr,nl,en;q=0.8");
    let default_country = or_default("HUIZENJACHT_DEFAULT_COUNTRY", "France");

    let request_timeout_secs = parse_u64("HUIZENJACHT_REQUEST_TIMEOUT_SECS", "6")?;
    let resolve_timeout_secs = parse_u64("HUIZENJACHT_RESOLVE_TIMEOUT_SECS", "20")?;
    let max_candidates = parse_u32("HUIZENJACHT_MAX_CANDIDATES", "5")?;
    if max_candidates == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "HUIZENJACHT_MAX_CANDIDATES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let rate_limit_retry_delay_ms = parse_u64("HUIZENJACHT_RATE_LIMIT_RETRY_DELAY_MS", "1200")?;
    let cache_ttl_secs = parse_u64("HUIZENJACHT_CACHE_TTL_SECS", "86400")?;
    let cache_max_entries = parse_usize("HUIZENJACHT_CACHE_MAX_ENTRIES", "1024")?;
    let api_rate_limit_per_minute = parse_usize("HUIZENJACHT_API_RATE_LIMIT_PER_MINUTE", "60")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        nominatim_url,
        user_agent,
        listing_user_agent,
        accept_language,
        default_country,
        request_timeout_secs,
        resolve_timeout_secs,
        max_candidates,
        rate_limit_retry_delay_ms,
        cache_ttl_secs,
        cache_max_entries,
        api_rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HUIZENJACHT_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
