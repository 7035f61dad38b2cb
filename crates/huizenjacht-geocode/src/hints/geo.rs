//! Machine-readable coordinates embedded in a listing page.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::jsonld::jsonld_items;
use super::meta_content;
use crate::types::Coordinate;

/// `"latitude": "43.6", ... "longitude": 7.0` inside any inline JSON blob.
static LOOSE_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)["']latitude["']\s*:\s*["']?(-?\d{1,3}(?:\.\d+)?)["']?\s*,[^{}]{0,200}?["']longitude["']\s*:\s*["']?(-?\d{1,3}(?:\.\d+)?)["']?"#,
    )
    .expect("valid regex")
});

/// The same pair with `longitude` first; JSON key order is arbitrary.
static LOOSE_PAIR_REVERSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)["']longitude["']\s*:\s*["']?(-?\d{1,3}(?:\.\d+)?)["']?\s*,[^{}]{0,200}?["']latitude["']\s*:\s*["']?(-?\d{1,3}(?:\.\d+)?)["']?"#,
    )
    .expect("valid regex")
});

const MAX_JSON_DEPTH: usize = 8;

/// First valid coordinate found in meta tags, JSON-LD, or loose JSON pairs.
pub(super) fn find_direct_coordinate(html: &str) -> Option<Coordinate> {
    meta_pair(html, "place:location:latitude", "place:location:longitude")
        .or_else(|| meta_pair(html, "og:latitude", "og:longitude"))
        .or_else(|| meta_joined(html, "geo.position", ';'))
        .or_else(|| meta_joined(html, "ICBM", ','))
        .or_else(|| {
            jsonld_items(html)
                .iter()
                .find_map(|item| json_coordinate(item, 0))
        })
        .or_else(|| {
            LOOSE_PAIR_RE.captures_iter(html).find_map(|caps| {
                coordinate_from_strs(caps.get(1)?.as_str(), caps.get(2)?.as_str())
            })
        })
        .or_else(|| {
            LOOSE_PAIR_REVERSED_RE.captures_iter(html).find_map(|caps| {
                coordinate_from_strs(caps.get(2)?.as_str(), caps.get(1)?.as_str())
            })
        })
}

fn meta_pair(html: &str, lat_key: &str, lng_key: &str) -> Option<Coordinate> {
    let lat = meta_content(html, lat_key)?;
    let lng = meta_content(html, lng_key)?;
    coordinate_from_strs(&lat, &lng)
}

/// A single meta value holding both numbers, e.g. `geo.position = "43.6;7.0"`.
fn meta_joined(html: &str, key: &str, separator: char) -> Option<Coordinate> {
    let content = meta_content(html, key)?;
    let (lat, lng) = content.split_once(separator)?;
    coordinate_from_strs(lat, lng)
}

/// Depth-first search for an object carrying `latitude` and `longitude`,
/// which covers schema.org `geo` / `GeoCoordinates` nodes.
fn json_coordinate(value: &Value, depth: usize) -> Option<Coordinate> {
    if depth > MAX_JSON_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            let direct = match (map.get("latitude"), map.get("longitude")) {
                (Some(lat), Some(lng)) => json_number(lat)
                    .zip(json_number(lng))
                    .and_then(|(lat, lng)| usable_coordinate(lat, lng)),
                _ => None,
            };
            direct.or_else(|| map.values().find_map(|v| json_coordinate(v, depth + 1)))
        }
        Value::Array(items) => items.iter().find_map(|v| json_coordinate(v, depth + 1)),
        _ => None,
    }
}

/// Coordinates show up both as numbers and as strings in the wild.
fn json_number(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn coordinate_from_strs(lat: &str, lng: &str) -> Option<Coordinate> {
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;
    usable_coordinate(lat, lng)
}

/// Range-checked coordinate; `0,0` is a placeholder, not a location.
fn usable_coordinate(lat: f64, lng: f64) -> Option<Coordinate> {
    if lat.abs() < f64::EPSILON && lng.abs() < f64::EPSILON {
        return None;
    }
    Coordinate::new(lat, lng)
}
