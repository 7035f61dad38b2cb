//! The ordered list of geocoder queries tried for one [`ResolvedWant`].

use crate::nominatim::StructuredQuery;
use crate::text::{collapse_whitespace, fold};
use crate::types::{ResolvedWant, Source};

/// One step of the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedQuery {
    Structured {
        source: Source,
        query: StructuredQuery,
    },
    FreeText(String),
}

impl PlannedQuery {
    #[must_use]
    pub fn source(&self) -> Source {
        match self {
            PlannedQuery::Structured { source, .. } => *source,
            PlannedQuery::FreeText(_) => Source::NominatimFreeText,
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            PlannedQuery::Structured { query, .. } => query.describe(),
            PlannedQuery::FreeText(q) => q.clone(),
        }
    }
}

/// Builds the cascade: structured-rich, structured-lite, then free-text
/// variants ending with postal code plus country.
///
/// Structured steps need a city or postal code. The lite step is dropped
/// when it would repeat the rich one. Free-text variants that reduce to the
/// country alone, or repeat an earlier variant after folding, are dropped.
#[must_use]
pub fn plan_queries(want: &ResolvedWant) -> Vec<PlannedQuery> {
    let mut plan = Vec::new();

    if want.city.is_some() || want.postal_code.is_some() {
        let lite = StructuredQuery {
            city: want.city.clone(),
            postalcode: want.postal_code.clone(),
            country: Some(want.country.clone()),
            ..StructuredQuery::default()
        };
        let rich = StructuredQuery {
            state: want.region.clone(),
            county: want.county.clone(),
            ..lite.clone()
        };
        let lite_differs = rich != lite;

        plan.push(PlannedQuery::Structured {
            source: Source::NominatimStructured,
            query: rich,
        });
        if lite_differs {
            plan.push(PlannedQuery::Structured {
                source: Source::NominatimStructuredLite,
                query: lite,
            });
        }
    }

    let city = want.city.as_deref();
    let postal = want.postal_code.as_deref();
    let county = want.county.as_deref();
    let region = want.region.as_deref();
    let address = want.address.as_deref();

    let variants: [Vec<Option<&str>>; 4] = [
        vec![city, postal, county, region],
        vec![address, city, county],
        vec![city],
        vec![postal],
    ];

    let mut seen: Vec<String> = Vec::new();
    for parts in variants {
        let parts: Vec<&str> = parts
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            continue;
        }

        let text = collapse_whitespace(&format!("{}, {}", parts.join(", "), want.country));
        let key = dedupe_key(&text);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        plan.push(PlannedQuery::FreeText(text));
    }

    plan
}

/// Folded, punctuation-free form used to spot near-duplicate variants.
fn dedupe_key(text: &str) -> String {
    let stripped: String = fold(text)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_whitespace(&stripped)
}
