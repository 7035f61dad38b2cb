pub mod cache;
pub mod error;
pub mod hints;
pub mod listing;
pub mod nominatim;
pub mod queries;
pub(crate) mod rate_limit;
pub mod regions;
pub mod resolver;
pub mod select;
pub mod text;
pub mod types;

pub use cache::ResolutionCache;
pub use error::{GeocodeError, ListingError, ResolveError};
pub use hints::extract_hints;
pub use listing::fetch_listing_html;
pub use nominatim::{NominatimClient, NominatimSettings, StructuredQuery};
pub use resolver::{Attempt, PlaceResolver, ResolutionReport, ResolutionTrace, ResolverSettings};
pub use select::{select_candidate, MatchRule};
pub use text::sanitize_city;
pub use types::{
    Candidate, CandidateAddress, Coordinate, LocationQuery, NotFoundReason, Resolution,
    ResolvedPlace, ResolvedWant, ScrapedHints, Source,
};
