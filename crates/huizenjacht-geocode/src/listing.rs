//! Listing page download for hint extraction.

use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT};

use crate::error::ListingError;

/// Pages larger than this are not worth scanning.
pub const MAX_LISTING_BYTES: usize = 5 * 1024 * 1024;

/// Downloads a listing page as text.
///
/// The per-request timeout comes from `client`. Only `http`/`https` URLs are
/// fetched, and responses that declare a non-HTML content type or exceed
/// [`MAX_LISTING_BYTES`] are rejected.
///
/// # Errors
///
/// Returns [`ListingError`] when the URL is unusable, the request fails, the
/// status is not 2xx, or the body is not an acceptable HTML page.
pub async fn fetch_listing_html(
    client: &reqwest::Client,
    url: &str,
    user_agent: &str,
) -> Result<String, ListingError> {
    let parsed = reqwest::Url::parse(url.trim()).map_err(|e| ListingError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ListingError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
        });
    }

    let mut response = client
        .get(parsed)
        .header(USER_AGENT, user_agent)
        .header(ACCEPT, "text/html,application/xhtml+xml")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ListingError::UnexpectedStatus {
            status: response.status().as_u16(),
            url: url.to_owned(),
        });
    }

    if let Some(content_type) = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        if !is_html_content_type(content_type) {
            return Err(ListingError::NotHtml {
                content_type: content_type.to_owned(),
            });
        }
    }

    let declared_len = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > MAX_LISTING_BYTES) {
        return Err(ListingError::TooLarge {
            max_bytes: MAX_LISTING_BYTES,
        });
    }

    // Chunked responses carry no length; enforce the cap while reading.
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > MAX_LISTING_BYTES {
            return Err(ListingError::TooLarge {
                max_bytes: MAX_LISTING_BYTES,
            });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml" || mime == "text/plain"
}
