//! Tie-break selection of one candidate from a geocoder result list.

use serde::Serialize;

use crate::text::same_place;
use crate::types::{Candidate, ResolvedWant};

/// Which tie-break rule picked the candidate, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchRule {
    Postcode,
    County,
    Region,
    City,
    FirstResult,
}

/// Picks one candidate, preferring the most precise confirmed signal:
/// exact postcode, then county, region, and locality (case- and
/// accent-insensitive), then the provider's first result.
///
/// Within a rule the earliest candidate in provider order wins. Returns
/// `None` only for an empty list.
#[must_use]
pub fn select_candidate<'c>(
    candidates: &'c [Candidate],
    want: &ResolvedWant,
) -> Option<(&'c Candidate, MatchRule)> {
    if let Some(postal_code) = want.postal_code.as_deref().map(str::trim) {
        if let Some(hit) = candidates
            .iter()
            .find(|c| c.address.postcode.as_deref().map(str::trim) == Some(postal_code))
        {
            return Some((hit, MatchRule::Postcode));
        }
    }

    let named_rules: [(MatchRule, Option<&str>, fn(&Candidate) -> Option<&str>); 3] = [
        (MatchRule::County, want.county.as_deref(), county_of),
        (MatchRule::Region, want.region.as_deref(), region_of),
        (MatchRule::City, want.city.as_deref(), locality_of),
    ];
    for (rule, wanted, field) in named_rules {
        let Some(wanted) = wanted else {
            continue;
        };
        if let Some(hit) = candidates
            .iter()
            .find(|c| field(c).is_some_and(|value| same_place(value, wanted)))
        {
            return Some((hit, rule));
        }
    }

    candidates.first().map(|c| (c, MatchRule::FirstResult))
}

fn county_of(c: &Candidate) -> Option<&str> {
    c.address.county.as_deref()
}

fn region_of(c: &Candidate) -> Option<&str> {
    c.address.region.as_deref()
}

fn locality_of(c: &Candidate) -> Option<&str> {
    c.address.locality()
}
