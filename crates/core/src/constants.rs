//! Constants used throughout the clindex core crate.
//!
//! Search defaults, geometry constants and validation limits live here so
//! the same values are used by the engine, the stores and the tests.

/// Mean Earth radius in kilometres, used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth radius in kilometres used to convert a surface radius into an
/// angular radius for spherical containment tests.
pub const ANGULAR_EARTH_RADIUS_KM: f64 = 6378.1;

/// Default search radius in kilometres when the caller supplies none.
pub const DEFAULT_RADIUS_KM: f64 = 25.0;

/// Default number of results returned by searches and listings.
pub const DEFAULT_RESULT_LIMIT: usize = 50;

/// Hard cap on the number of results a single call can request.
pub const MAX_RESULT_LIMIT: usize = 100;

/// Attempts made for a version-checked write before giving up.
pub const WRITE_RETRY_ATTEMPTS: usize = 3;

/// Maximum length of a clinic name, in characters.
pub const MAX_NAME_CHARS: usize = 200;

/// Maximum length of a review comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/// Hours shown for a weekday with no configured opening times.
pub const CLOSED: &str = "Closed";

/// Default base URL for the geocoding collaborator.
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Default country restriction for geocoding queries.
pub const DEFAULT_GEOCODE_COUNTRY: &str = "us";

/// Default timeout for geocoding requests, in seconds.
pub const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 10;
