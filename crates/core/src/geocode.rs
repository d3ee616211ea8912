//! Forward geocoding of free-text addresses.
//!
//! The adapter validates the query and folds collaborator failures into the
//! directory error taxonomy; the [`Geocoder`] trait hides the wire. The
//! production implementation talks to a Nominatim-compatible endpoint over
//! blocking HTTP.

use std::sync::Arc;
use std::time::Duration;

use crate::config::GeocodeConfig;
use crate::error::{DirectoryError, DirectoryResult};

/// Failures from the geocoding collaborator, pre-taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// The upstream could not be reached, including timeouts.
    #[error("Geocoding service unreachable: {0}")]
    Transport(String),
    #[error("Geocoding service answered with status {0}")]
    Status(u16),
    #[error("Geocoding service sent a malformed reply: {0}")]
    Malformed(String),
}

/// A successfully resolved place.
#[derive(Debug, Clone, PartialEq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedPlace {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// Turns a free-text query into at most one place.
pub trait Geocoder: Send + Sync {
    /// # Errors
    /// Returns `GeocodeError` when the collaborator cannot answer; a clean
    /// zero-match answer is `Ok(None)`.
    fn search(&self, query: &str) -> Result<Option<GeocodedPlace>, GeocodeError>;
}

/// One record of the Nominatim search reply. Coordinates arrive as decimal
/// strings.
#[derive(serde::Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

/// Blocking [`Geocoder`] against a Nominatim-compatible `/search` endpoint.
pub struct NominatimClient {
    agent: ureq::Agent,
    config: GeocodeConfig,
}

impl NominatimClient {
    pub fn new(config: GeocodeConfig) -> Self {
        // Status codes are handled here, not turned into transport errors.
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .new_agent();
        Self { agent, config }
    }
}

impl Geocoder for NominatimClient {
    fn search(&self, query: &str) -> Result<Option<GeocodedPlace>, GeocodeError> {
        let response = self
            .agent
            .get(&self.config.base_url)
            .header("User-Agent", &self.config.user_agent)
            .query("q", query)
            .query("format", "json")
            .query("limit", "1")
            .query("countrycodes", &self.config.country_codes)
            .query("addressdetails", "1")
            .call()
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(GeocodeError::Status(status));
        }

        let places: Vec<NominatimPlace> = response
            .into_body()
            .read_json()
            .map_err(|e| GeocodeError::Malformed(e.to_string()))?;

        places.into_iter().next().map(parse_place).transpose()
    }
}

fn parse_place(place: NominatimPlace) -> Result<GeocodedPlace, GeocodeError> {
    let latitude = place
        .lat
        .parse::<f64>()
        .map_err(|_| GeocodeError::Malformed(format!("unparsable latitude {:?}", place.lat)))?;
    let longitude = place
        .lon
        .parse::<f64>()
        .map_err(|_| GeocodeError::Malformed(format!("unparsable longitude {:?}", place.lon)))?;
    Ok(GeocodedPlace {
        latitude,
        longitude,
        display_name: place.display_name,
    })
}

/// Query validation and taxonomy mapping in front of a [`Geocoder`].
pub struct GeocodeAdapter {
    geocoder: Arc<dyn Geocoder>,
}

impl GeocodeAdapter {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Resolves a free-text address or place name to coordinates.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the query is valid but matches nothing. The result
    /// feeds nearby searches as the center point.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a blank query, `UpstreamUnavailable` when the
    /// collaborator is unreachable, times out, or answers malformed.
    pub fn geocode(&self, query: &str) -> DirectoryResult<Option<GeocodedPlace>> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(DirectoryError::InvalidArgument(
                "A location query is required".into(),
            ));
        }
        let place = self.geocoder.search(trimmed)?;
        match &place {
            Some(hit) => tracing::debug!("geocoded {:?} to {}", trimmed, hit.display_name),
            None => tracing::debug!("no geocoding match for {:?}", trimmed),
        }
        Ok(place)
    }
}
